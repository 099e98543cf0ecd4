//! Contracts the hosting platform provides to the SSL policy

use async_trait::async_trait;
use thiserror::Error;

/// Site (tenant) identifier assigned by the platform
pub type SiteId = i64;

/// User identifier assigned by the platform
pub type UserId = i64;

/// Failures reported by platform collaborators
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Platform backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Platform error: {0}")]
    Other(String),
}

impl PlatformError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        PlatformError::Backend(Box::new(err))
    }
}

/// Lookup over the platform's site/domain index
#[async_trait]
pub trait SiteDirectory: Send + Sync {
    /// Whether any site other than `exclude` currently owns `domain`
    async fn domain_in_use_by_other(
        &self,
        domain: &str,
        exclude: SiteId,
    ) -> Result<bool, PlatformError>;
}

/// "The site this request is operating on", owned by one request
pub trait SiteContext: Send + Sync {
    fn current_site(&self) -> SiteId;

    fn switch_to_site(&self, site_id: SiteId);
}

/// Options scoped to a site
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Insert or replace `name` for `site_id`
    async fn update_option(
        &self,
        site_id: SiteId,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError>;

    async fn get_option(&self, site_id: SiteId, name: &str)
        -> Result<Option<String>, PlatformError>;
}

/// Everything [`crate::NewSiteSslPolicy`] needs from the platform.
///
/// Implementations are shared between requests and hold no per-request
/// state; the site context travels with each call.
pub trait Platform: SiteDirectory + OptionStore {}

impl<T: SiteDirectory + OptionStore> Platform for T {}
