//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking, polls a shutdown flag)
//! - Fixed worker thread pool fed by a bounded channel
//! - Commands routed through SigninService

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{fmt_bytes, Connection};
