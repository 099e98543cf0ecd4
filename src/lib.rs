//! sitessl - SSL bookkeeping for a multi-site hosting platform
//!
//! Re-exports the sitessl crates and bundles them behind [`SslManager`]:
//! CSR issuance for administrator requests, and the default SSL posture
//! applied when the platform creates a site.
//!
//! # Quick Start
//!
//! ```ignore
//! use sitessl::{CsrIssuer, SeaOrmPlatform, SslManager};
//!
//! # async fn example() -> Result<(), sitessl::Error> {
//! let db = sitessl::db::connect("sqlite://./platform.db?mode=rwc").await?;
//! sitessl::db::migrate(&db).await?;
//!
//! let manager = SslManager::new(CsrIssuer::default(), SeaOrmPlatform::new(db));
//!
//! // Tenant creation hook
//! manager.handle_new_site(5, 1, "news.example.edu").await?;
//!
//! // Administrator action
//! let artifacts = manager.generate_csr(Some("news.example.edu"))?;
//! println!("CSR written to {}", artifacts.csr_path.display());
//! # Ok(())
//! # }
//! ```

use thiserror::Error;
use tracing::debug;

pub use sitessl_cert::{
    validate_domain, CsrArtifacts, CsrConfig, CsrError, CsrIssuer, DigestAlgorithm, ErrorKind,
    KeyStore, KeyType, SubjectTemplate, DEFAULT_KEY_DIR,
};
pub use sitessl_policy::{
    ssl_disabled_option_key, NewSiteSslPolicy, OptionStore, Platform, PlatformError,
    PolicyError, SiteContext, SiteContextGuard, SiteDirectory, SiteId, SiteScope, SslDecision,
    UserId,
    PRIMARY_SITE_ID,
};

#[cfg(feature = "db")]
pub use sitessl_platform_db as db;
#[cfg(feature = "db")]
pub use sitessl_platform_db::SeaOrmPlatform;

/// Any failure surfaced by [`SslManager`]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Csr(#[from] CsrError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[cfg(feature = "db")]
    #[error("Database error: {0}")]
    Database(#[from] sitessl_platform_db::sea_orm::DbErr),
}

/// CSR issuance plus the new-site SSL policy for one platform
pub struct SslManager<P> {
    issuer: CsrIssuer,
    policy: NewSiteSslPolicy<P>,
}

impl<P: Platform> SslManager<P> {
    pub fn new(issuer: CsrIssuer, platform: P) -> Self {
        Self {
            issuer,
            policy: NewSiteSslPolicy::new(platform),
        }
    }

    pub fn issuer(&self) -> &CsrIssuer {
        &self.issuer
    }

    pub fn policy(&self) -> &NewSiteSslPolicy<P> {
        &self.policy
    }

    pub fn validate_domain(&self, domain: &str) -> bool {
        validate_domain(domain)
    }

    /// Generate and store a key and CSR for `server_name`
    pub fn generate_csr(&self, server_name: Option<&str>) -> Result<CsrArtifacts, CsrError> {
        self.issuer.generate_csr(server_name)
    }

    /// Site creation hook; call once per new site
    pub async fn handle_new_site(
        &self,
        site_id: SiteId,
        user_id: UserId,
        domain: &str,
    ) -> Result<SslDecision, PolicyError> {
        let scope = SiteScope::new(site_id);
        self.handle_new_site_in(&scope, site_id, user_id, domain)
            .await
    }

    /// Site creation hook for a request that already tracks its site context.
    /// `context` is back on its original site when this returns.
    pub async fn handle_new_site_in<C: SiteContext + ?Sized>(
        &self,
        context: &C,
        site_id: SiteId,
        user_id: UserId,
        domain: &str,
    ) -> Result<SslDecision, PolicyError> {
        let decision = self
            .policy
            .on_new_site_in(context, site_id, user_id, domain)
            .await?;
        debug!("SSL decision for site {}: {:?}", site_id, decision);
        Ok(decision)
    }
}
