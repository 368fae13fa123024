//! Network side of a fly node.
//!
//! - **Server**: serve `Hi from {path}` over TLS with the node's own certificate ([`server::start`])
//! - **Client**: dial another node and read its answer ([`NodeClient`])
//! - **Trust**: pin, trust on first use, or skip verification ([`TrustPolicy`], [`KnownHosts`])
//! - **Config**: listen address, dial port and friends from `config.toml` ([`NodeConfig`])

pub mod client;
pub mod config;
pub mod known_hosts;
pub mod server;
pub mod tls;
pub mod verifier;

pub use client::{DialResponse, NodeClient, NodeClientBuilder};
pub use config::{NodeConfig, DEFAULT_PORT};
pub use known_hosts::KnownHosts;
pub use server::RunningServer;
pub use verifier::{PeerVerifier, TrustPolicy};
