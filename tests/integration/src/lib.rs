//! Integration test utilities for the relay
//!
//! In-process stand-ins for the remote ends: a line-protocol server, a
//! gateway websocket server and the REST discovery endpoint.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
