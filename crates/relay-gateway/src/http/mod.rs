//! REST helpers: endpoint discovery and channel messages

mod endpoint;
mod rest;

pub use endpoint::{GatewayEndpoint, SessionStartLimit};
pub use rest::{DiscordHttp, USER_AGENT};
