#![forbid(unsafe_code)]

mod connection;
pub mod dispatch;
pub mod handler;

pub use connection::Connection;
pub use handler::handle_connection;
