//! runway-ingest: transaction export parsing (MyMoney CSV) into normalized transactions.

pub mod parsers;
pub mod types;

pub use parsers::mymoney::{parse_mymoney_csv, parse_mymoney_reader};
pub use types::{DropReason, LoadReport, Loaded, RawRow};
