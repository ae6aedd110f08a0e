pub mod config;
pub mod domains;
pub mod session;

pub use config::{Secret, SessionConfig, TransportSecurity};
pub use domains::SessionError;
pub use session::Session;
