//! Network Module
//!
//! TCP server, per-connection handling, and a blocking client.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per connection
//! - Commands routed through Engine

mod server;
mod connection;
mod client;

pub use server::Server;
pub use connection::Connection;
pub use client::Client;
