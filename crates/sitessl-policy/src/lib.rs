//! SSL posture for newly created sites
//!
//! Sites created on a domain that no other site uses yet are flagged as SSL
//! disabled in the primary site's options. Sites joining an existing domain
//! inherit whatever state that domain already has.

pub mod context;
pub mod platform;
pub mod policy;

pub use context::{SiteContextGuard, SiteScope};
pub use platform::{
    OptionStore, Platform, PlatformError, SiteContext, SiteDirectory, SiteId, UserId,
};
pub use policy::{
    ssl_disabled_option_key, NewSiteSslPolicy, PolicyError, SslDecision, PRIMARY_SITE_ID,
};
