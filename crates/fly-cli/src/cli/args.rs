//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::output::OutputFormat;
use fly_core::Fingerprint;

/// Minimal peer-to-peer join utility
///
/// Run `fly join` to serve as a node. Run `fly join <host>` on another
/// machine to reach it.
#[derive(Parser, Debug)]
#[command(name = "fly")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding cert.pem, key.pem and config.toml
    #[arg(long, env = "FLY_CONFIG_DIR", global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve as a node, or dial a node if a host is given
    Join(JoinArgs),

    /// Show this node's certificate
    Cert(CertArgs),

    /// Manage remembered peer fingerprints
    Hosts(HostsArgs),
}

// ============================================================================
// Join command
// ============================================================================

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Peer to dial; serve instead when omitted
    pub host: Option<String>,

    /// Only accept a peer presenting this SHA-256 certificate fingerprint
    #[arg(long, value_name = "SHA256", requires = "host", conflicts_with = "insecure")]
    pub pin: Option<Fingerprint>,

    /// Accept any peer certificate without checking it
    #[arg(long, requires = "host")]
    pub insecure: bool,

    /// Port to dial, or to listen on when serving
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Request path when dialing
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Listen address when serving (overrides config.toml)
    #[arg(long, value_name = "ADDR", conflicts_with = "host")]
    pub listen: Option<SocketAddr>,
}

// ============================================================================
// Cert command
// ============================================================================

#[derive(Args, Debug)]
pub struct CertArgs {
    #[command(subcommand)]
    pub command: Option<CertCommands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertCommands {
    /// Print the certificate and key paths without creating anything
    Path,
    /// Create the identity if needed and describe the certificate
    Show,
    /// Create the identity if needed and print its SHA-256 fingerprint
    Fingerprint,
}

// ============================================================================
// Hosts command
// ============================================================================

#[derive(Args, Debug)]
pub struct HostsArgs {
    #[command(subcommand)]
    pub command: Option<HostsCommands>,
}

#[derive(Subcommand, Debug)]
pub enum HostsCommands {
    /// List known peers and their fingerprints
    List,
    /// Forget a peer so the next dial trusts it afresh
    Forget {
        /// Peer host name or address
        host: String,
    },
}
