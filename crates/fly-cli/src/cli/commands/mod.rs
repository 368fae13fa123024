//! Command implementations.

pub mod cert;
pub mod hosts;
pub mod join;

use std::sync::Arc;

use crate::config::Config;
use crate::output::OutputFormat;
use fly_core::CredentialProvider;

/// Shared context for all commands.
#[derive(Clone)]
pub struct Context {
    /// Resolved configuration directory and settings
    pub config: Config,

    /// Source of this node's certificate and key
    pub credentials: Arc<dyn CredentialProvider>,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("credentials", &self.credentials.paths())
            .field("output_format", &self.output_format)
            .field("verbose", &self.verbose)
            .finish()
    }
}
