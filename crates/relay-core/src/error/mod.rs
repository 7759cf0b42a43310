//! Error types for the session engine

mod session_error;
mod store_error;

pub use session_error::{ErrorKind, SessionError, SessionResult};
pub use store_error::StoreError;
