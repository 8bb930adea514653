pub mod config;
pub mod experiments;
pub mod meta;
pub mod replaying;
pub mod reporting;
mod shared;
pub mod validation;
