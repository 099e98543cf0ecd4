//! Certificate signing request issuance for platform domains
//!
//! Validates a domain, generates a fresh RSA key pair and a CSR for it, and
//! writes both as PEM files into the key storage directory. Signing happens
//! out of band at a certificate authority.

pub mod csr;
pub mod domain;
pub mod storage;

pub use csr::{
    CsrArtifacts, CsrConfig, CsrError, CsrIssuer, DigestAlgorithm, ErrorKind, KeyType,
    SubjectTemplate,
};
pub use domain::validate_domain;
pub use storage::{KeyStore, DEFAULT_KEY_DIR};
