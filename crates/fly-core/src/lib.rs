//! Core types for fly nodes.
//!
//! This crate owns everything a node knows about its own identity:
//!
//! - **Credentials**: find or generate the self-signed certificate and key ([`CredentialStore`])
//! - **Fingerprints**: SHA-256 digests used to pin peers ([`Fingerprint`])
//! - **Inspection**: parse a PEM certificate for display ([`CertificateSummary`])
//! - **Errors**: one error type for the whole workspace ([`FlyError`])
//!
//! # Example
//!
//! ```rust,ignore
//! use fly_core::{CredentialStore, Fingerprint};
//!
//! let paths = CredentialStore::new("/home/me/.config/fly").ensure()?;
//! println!("fingerprint: {}", Fingerprint::of_pem_file(&paths.certificate)?);
//! ```

pub mod credentials;
mod error;
pub mod fingerprint;
pub mod inspect;

pub use credentials::{
    CredentialPaths, CredentialProvider, CredentialStore, StaticCredentials, DEFAULT_KEY_BITS,
    MIN_KEY_BITS,
};
pub use error::{FlyError, Result};
pub use fingerprint::Fingerprint;
pub use inspect::CertificateSummary;
