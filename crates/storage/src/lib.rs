#![forbid(unsafe_code)]

mod db;
mod entry;
mod sweeper;

pub use db::Db;
pub use sweeper::ExpirySweeper;
