pub mod audit;
pub mod replay;
pub mod segmenter;
