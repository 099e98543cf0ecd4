//! Default SSL state for new sites

use thiserror::Error;
use tracing::{debug, info};

use crate::context::{SiteContextGuard, SiteScope};
use crate::platform::{Platform, PlatformError, SiteContext, SiteId, UserId};

/// Site whose options hold cross-site configuration
pub const PRIMARY_SITE_ID: SiteId = 1;

/// Option name holding the SSL-disabled flag for `domain`
pub fn ssl_disabled_option_key(domain: &str) -> String {
    format!("{}_ssl_disabled", domain)
}

/// Policy errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Failed to look up sites for domain {domain}: {source}")]
    Query {
        domain: String,
        #[source]
        source: PlatformError,
    },

    #[error("Failed to write SSL flag for domain {domain}: {source}")]
    Write {
        domain: String,
        #[source]
        source: PlatformError,
    },
}

/// Outcome of [`NewSiteSslPolicy::on_new_site`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslDecision {
    /// First site on this domain; flagged as SSL disabled
    FlaggedDisabled,
    /// Domain already belongs to another site; its state is left alone
    Inherited,
}

pub struct NewSiteSslPolicy<P> {
    platform: P,
}

impl<P: Platform> NewSiteSslPolicy<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Handle a site creation event in a fresh request context for `site_id`.
    ///
    /// See [`NewSiteSslPolicy::on_new_site_in`].
    pub async fn on_new_site(
        &self,
        site_id: SiteId,
        user_id: UserId,
        domain: &str,
    ) -> Result<SslDecision, PolicyError> {
        let scope = SiteScope::new(site_id);
        self.on_new_site_in(&scope, site_id, user_id, domain).await
    }

    /// Handle a site creation event from the caller's request `context`.
    ///
    /// If no other site owns `domain`, switches `context` to the primary site,
    /// sets `<domain>_ssl_disabled = 1` there and switches back, whether or
    /// not the write succeeds.
    ///
    /// The lookup and the write are not atomic. Two sites created at the same
    /// time on a brand new domain may both write the flag; both write `1`.
    pub async fn on_new_site_in<C: SiteContext + ?Sized>(
        &self,
        context: &C,
        site_id: SiteId,
        user_id: UserId,
        domain: &str,
    ) -> Result<SslDecision, PolicyError> {
        debug!(
            "New site {} (user {}) on domain {}",
            site_id, user_id, domain
        );

        let in_use = self
            .platform
            .domain_in_use_by_other(domain, site_id)
            .await
            .map_err(|source| PolicyError::Query {
                domain: domain.to_string(),
                source,
            })?;

        if in_use {
            debug!("Domain {} already configured, keeping its SSL state", domain);
            return Ok(SslDecision::Inherited);
        }

        let key = ssl_disabled_option_key(domain);
        {
            let primary = SiteContextGuard::enter(context, PRIMARY_SITE_ID);
            self.platform
                .update_option(primary.site(), &key, "1")
                .await
                .map_err(|source| PolicyError::Write {
                    domain: domain.to_string(),
                    source,
                })?;
        }

        info!("Flagged new domain {} as SSL disabled", domain);
        Ok(SslDecision::FlaggedDisabled)
    }

    /// Whether `domain` is currently flagged as SSL disabled
    pub async fn is_ssl_disabled(&self, domain: &str) -> Result<bool, PolicyError> {
        let value = self
            .platform
            .get_option(PRIMARY_SITE_ID, &ssl_disabled_option_key(domain))
            .await
            .map_err(|source| PolicyError::Query {
                domain: domain.to_string(),
                source,
            })?;

        Ok(value.as_deref() == Some("1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_key() {
        assert_eq!(
            ssl_disabled_option_key("new-tenant.example.com"),
            "new-tenant.example.com_ssl_disabled"
        );
    }
}
