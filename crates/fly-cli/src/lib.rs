//! # fly-cli
//!
//! Command-line front end for fly nodes.
//!
//! ## Features
//!
//! - **Serve**: `fly join` bootstraps a self-signed identity and answers over TLS on 8443
//! - **Dial**: `fly join <host>` fetches a peer's greeting and prints it
//! - **Trust**: peers are pinned by certificate fingerprint after the first contact
//! - **Inspect**: `fly cert` shows where the identity lives and what it contains

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
