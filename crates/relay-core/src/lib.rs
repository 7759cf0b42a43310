//! # relay-core
//!
//! Session engine shared by both protocol adapters: the transport layer, the
//! outbound write queue, the lifecycle state machine, the runtime context, and
//! the boundary traits that adapters hand their data to.
//! This crate knows nothing about IRC or the Discord gateway.

pub mod codec;
pub mod context;
pub mod entities;
pub mod error;
pub mod queue;
pub mod session;
pub mod traits;
pub mod transport;

// Re-export commonly used types at crate root
pub use codec::LineCodec;
pub use context::RuntimeContext;
pub use entities::ChatMessage;
pub use error::{ErrorKind, SessionError, SessionResult, StoreError};
pub use queue::{WriteFailures, WriteQueue};
pub use session::{Lifecycle, SessionState};
pub use traits::{CommandHandler, CommandRegistry, MessageStore, StoreResult};
pub use transport::{Connector, MaybeTlsStream, TransportMode};
