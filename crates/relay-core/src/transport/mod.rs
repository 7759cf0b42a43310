//! Transport layer - name resolution, TCP connect, and optional TLS
//!
//! Each step maps to its own lifecycle state and its own error kind, so a log
//! line always says which stage of establishing a session went wrong.

mod connector;
mod stream;
mod tls;

pub use connector::{Connector, TransportMode};
pub use stream::MaybeTlsStream;
pub use tls::{certificate_fingerprint, client_config, LoggingVerifier};
