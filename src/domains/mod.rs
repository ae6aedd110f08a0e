pub mod error;
pub mod interface;
mod parsing_context;
pub mod query_io;

pub use error::{IoError, SessionError};
