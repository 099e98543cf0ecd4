//! Per-request site context and scoped switches out of it

use std::sync::atomic::{AtomicI64, Ordering};
use tracing::trace;

use crate::platform::{SiteContext, SiteId};

/// Site context of a single request
#[derive(Debug)]
pub struct SiteScope {
    current: AtomicI64,
}

impl SiteScope {
    pub fn new(site_id: SiteId) -> Self {
        Self {
            current: AtomicI64::new(site_id),
        }
    }
}

impl SiteContext for SiteScope {
    fn current_site(&self) -> SiteId {
        self.current.load(Ordering::SeqCst)
    }

    fn switch_to_site(&self, site_id: SiteId) {
        self.current.store(site_id, Ordering::SeqCst);
    }
}

/// Switches a context into `site_id` on creation and back to the previous
/// site when dropped, including on early return and unwinding.
pub struct SiteContextGuard<'a, C: SiteContext + ?Sized> {
    context: &'a C,
    site: SiteId,
    previous: SiteId,
}

impl<'a, C: SiteContext + ?Sized> SiteContextGuard<'a, C> {
    pub fn enter(context: &'a C, site_id: SiteId) -> Self {
        let previous = context.current_site();
        trace!("Switching site context {} -> {}", previous, site_id);
        context.switch_to_site(site_id);
        Self {
            context,
            site: site_id,
            previous,
        }
    }

    /// Site the guard switched into
    pub fn site(&self) -> SiteId {
        self.site
    }

    /// Site that will be restored on drop
    pub fn previous(&self) -> SiteId {
        self.previous
    }
}

impl<C: SiteContext + ?Sized> Drop for SiteContextGuard<'_, C> {
    fn drop(&mut self) {
        trace!("Restoring site context {}", self.previous);
        self.context.switch_to_site(self.previous);
    }
}
