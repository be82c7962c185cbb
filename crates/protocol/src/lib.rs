#![forbid(unsafe_code)]

mod command;
mod frame;
mod parse;
mod request;

pub use command::Command;
pub use frame::Frame;
pub use parse::Parse;
pub use request::RequestScan;
