pub mod ledger;
pub mod series;
pub mod statement;
