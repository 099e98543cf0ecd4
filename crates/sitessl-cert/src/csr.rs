//! Private key and certificate signing request generation

use rcgen::{
    CertificateParams, DistinguishedName, DnType, DnValue, Ia5String, KeyPair, PrintableString,
    SanType, SignatureAlgorithm, PKCS_RSA_SHA256,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use crate::domain::validate_domain;
use crate::storage::{ensure_safe_file_stem, KeyStore};

/// OID 1.2.840.113549.1.9.1 (PKCS#9 emailAddress)
const EMAIL_ADDRESS_OID: &[u64] = &[1, 2, 840, 113549, 1, 9, 1];

/// CSR errors
#[derive(Debug, Error)]
pub enum CsrError {
    #[error("Server name cannot be empty")]
    EmptyInput,

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("CSR construction failed: {0}")]
    CsrConstruction(String),

    #[error("Failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to store artifacts under unsafe name: {0}")]
    UnsafePath(String),
}

/// Coarse failure classes callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyInput,
    InvalidDomain,
    KeyGenerationFailure,
    CsrConstructionFailure,
    StorageFailure,
}

impl CsrError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CsrError::EmptyInput => ErrorKind::EmptyInput,
            CsrError::InvalidDomain(_) => ErrorKind::InvalidDomain,
            CsrError::KeyGeneration(_) => ErrorKind::KeyGenerationFailure,
            CsrError::CsrConstruction(_) => ErrorKind::CsrConstructionFailure,
            CsrError::Storage { .. } | CsrError::UnsafePath(_) => ErrorKind::StorageFailure,
        }
    }

    /// True for rejected input, false for system faults
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.kind(), ErrorKind::EmptyInput | ErrorKind::InvalidDomain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
}

/// Parameters every CSR is generated with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrConfig {
    pub digest: DigestAlgorithm,
    pub key_bits: usize,
    pub key_type: KeyType,
}

impl CsrConfig {
    pub const DEFAULT: CsrConfig = CsrConfig {
        digest: DigestAlgorithm::Sha256,
        key_bits: 2048,
        key_type: KeyType::Rsa,
    };

    fn signature_algorithm(&self) -> &'static SignatureAlgorithm {
        match (self.key_type, self.digest) {
            (KeyType::Rsa, DigestAlgorithm::Sha256) => &PKCS_RSA_SHA256,
        }
    }
}

impl Default for CsrConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Subject fields shared by every request. The common name is filled per
/// request from the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectTemplate {
    pub country: &'static str,
    pub state: &'static str,
    pub locality: &'static str,
    pub organization: &'static str,
    pub organizational_unit: &'static str,
    pub email: &'static str,
}

impl SubjectTemplate {
    pub const DEFAULT: SubjectTemplate = SubjectTemplate {
        country: "US",
        state: "Washington",
        locality: "Pullman",
        organization: "Washington State University",
        organizational_unit: "University Communications",
        email: "web.support@wsu.edu",
    };

    /// Build the distinguished name for one request
    pub fn with_common_name(&self, common_name: &str) -> Result<DistinguishedName, CsrError> {
        let country = PrintableString::try_from(self.country)
            .map_err(|e| CsrError::CsrConstruction(format!("country: {}", e)))?;
        let email = Ia5String::try_from(self.email)
            .map_err(|e| CsrError::CsrConstruction(format!("email: {}", e)))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CountryName, DnValue::PrintableString(country));
        dn.push(DnType::StateOrProvinceName, self.state);
        dn.push(DnType::LocalityName, self.locality);
        dn.push(DnType::OrganizationName, self.organization);
        dn.push(DnType::OrganizationalUnitName, self.organizational_unit);
        dn.push(DnType::CommonName, common_name);
        dn.push(
            DnType::CustomDnType(EMAIL_ADDRESS_OID.to_vec()),
            DnValue::Ia5String(email),
        );
        Ok(dn)
    }
}

impl Default for SubjectTemplate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Where the generated pair was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrArtifacts {
    pub domain: String,
    pub key_path: PathBuf,
    pub csr_path: PathBuf,
}

/// Generates a key and CSR per domain and stores them in a [`KeyStore`]
#[derive(Debug, Clone, Default)]
pub struct CsrIssuer {
    store: KeyStore,
    config: CsrConfig,
    subject: SubjectTemplate,
}

impl CsrIssuer {
    pub fn new(store: KeyStore) -> Self {
        Self {
            store,
            config: CsrConfig::DEFAULT,
            subject: SubjectTemplate::DEFAULT,
        }
    }

    pub fn store(&self) -> &KeyStore {
        &self.store
    }

    /// Same as [`CsrIssuer::generate_csr`] for a present server name
    pub fn issue(&self, server_name: &str) -> Result<CsrArtifacts, CsrError> {
        self.generate_csr(Some(server_name))
    }

    /// Generate a private key and matching CSR for `server_name`.
    ///
    /// The name is validated, lowercased and used verbatim as the file stem of
    /// `<domain>.key` and `<domain>.csr`. Existing files for the same domain
    /// are replaced. No key material is returned; read the files instead.
    ///
    /// Names that pass [`validate_domain`] but could escape the key directory,
    /// such as `a..b`, are refused with [`CsrError::UnsafePath`] before any
    /// key is generated.
    pub fn generate_csr(&self, server_name: Option<&str>) -> Result<CsrArtifacts, CsrError> {
        let server_name = match server_name {
            Some(name) if !name.is_empty() => name,
            _ => {
                warn!("CSR requested without a server name");
                return Err(CsrError::EmptyInput);
            }
        };

        if !validate_domain(server_name) {
            warn!("CSR requested for invalid domain {:?}", server_name);
            return Err(CsrError::InvalidDomain(server_name.to_string()));
        }

        let domain = server_name.to_lowercase();
        ensure_safe_file_stem(&domain)?;

        let dn = self.subject.with_common_name(&domain)?;
        let key_pair = self.generate_key_pair()?;

        let mut params = CertificateParams::default();
        params.distinguished_name = dn;
        params.subject_alt_names = vec![SanType::DnsName(
            Ia5String::try_from(domain.as_str())
                .map_err(|e| CsrError::CsrConstruction(e.to_string()))?,
        )];

        let csr_pem = params
            .serialize_request(&key_pair)
            .and_then(|csr| csr.pem())
            .map_err(|e| CsrError::CsrConstruction(e.to_string()))?;
        let key_pem = Zeroizing::new(key_pair.serialize_pem());
        drop(key_pair);

        let (key_path, csr_path) = self
            .store
            .write_pair(&domain, &key_pem, &csr_pem)
            .inspect_err(|e| error!("Failed to store CSR for {}: {}", domain, e))?;

        info!(
            "Generated CSR for {} ({}, {})",
            domain,
            key_path.display(),
            csr_path.display()
        );

        Ok(CsrArtifacts {
            domain,
            key_path,
            csr_path,
        })
    }

    fn generate_key_pair(&self) -> Result<KeyPair, CsrError> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), self.config.key_bits)
            .map_err(|e| CsrError::KeyGeneration(e.to_string()))?;
        let pkcs8 = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CsrError::KeyGeneration(e.to_string()))?;

        KeyPair::from_pem_and_sign_algo(&pkcs8, self.config.signature_algorithm())
            .map_err(|e| CsrError::KeyGeneration(e.to_string()))
    }
}
