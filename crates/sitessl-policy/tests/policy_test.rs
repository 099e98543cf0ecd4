//! Tests for the new-site SSL policy using an in-memory platform

use async_trait::async_trait;
use sitessl_policy::{
    ssl_disabled_option_key, NewSiteSslPolicy, OptionStore, PlatformError, PolicyError,
    SiteContext, SiteDirectory, SiteId, SiteScope, SslDecision, PRIMARY_SITE_ID,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Options written, as (target site, option name, value)
type Writes = Vec<(SiteId, String, String)>;

struct FakePlatform {
    sites: Vec<(SiteId, String)>,
    options: Mutex<HashMap<(SiteId, String), String>>,
    writes: Mutex<Writes>,
    fail_query: AtomicBool,
    fail_write: AtomicBool,
}

impl FakePlatform {
    fn new(sites: &[(SiteId, &str)]) -> Self {
        Self {
            sites: sites.iter().map(|(id, d)| (*id, d.to_string())).collect(),
            options: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            fail_query: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
        }
    }

    fn writes(&self) -> Writes {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SiteDirectory for FakePlatform {
    async fn domain_in_use_by_other(
        &self,
        domain: &str,
        exclude: SiteId,
    ) -> Result<bool, PlatformError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(PlatformError::Other("sites table unavailable".to_string()));
        }
        tokio::task::yield_now().await;
        Ok(self
            .sites
            .iter()
            .any(|(id, d)| *id != exclude && d == domain))
    }
}

#[async_trait]
impl OptionStore for FakePlatform {
    async fn update_option(
        &self,
        site_id: SiteId,
        name: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        // Let other requests run between the context switch and the write
        tokio::task::yield_now().await;

        self.writes
            .lock()
            .unwrap()
            .push((site_id, name.to_string(), value.to_string()));

        if self.fail_write.load(Ordering::SeqCst) {
            return Err(PlatformError::Other("options table is read-only".to_string()));
        }

        self.options
            .lock()
            .unwrap()
            .insert((site_id, name.to_string()), value.to_string());
        Ok(())
    }

    async fn get_option(
        &self,
        site_id: SiteId,
        name: &str,
    ) -> Result<Option<String>, PlatformError> {
        Ok(self
            .options
            .lock()
            .unwrap()
            .get(&(site_id, name.to_string()))
            .cloned())
    }
}

#[tokio::test]
async fn test_first_site_on_domain_is_flagged_in_primary_scope() {
    let platform = FakePlatform::new(&[(1, "wsu.edu"), (5, "new-tenant.example.com")]);
    let policy = NewSiteSslPolicy::new(platform);
    let scope = SiteScope::new(5);

    let decision = policy
        .on_new_site_in(&scope, 5, 1, "new-tenant.example.com")
        .await
        .unwrap();

    assert_eq!(decision, SslDecision::FlaggedDisabled);
    assert_eq!(
        policy.platform().writes(),
        vec![(
            PRIMARY_SITE_ID,
            "new-tenant.example.com_ssl_disabled".to_string(),
            "1".to_string()
        )]
    );
    assert_eq!(scope.current_site(), 5);
    assert!(policy
        .is_ssl_disabled("new-tenant.example.com")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_shared_domain_is_left_alone() {
    let platform = FakePlatform::new(&[(3, "shared.example.com"), (6, "shared.example.com")]);
    let policy = NewSiteSslPolicy::new(platform);

    let decision = policy.on_new_site(6, 1, "shared.example.com").await.unwrap();

    assert_eq!(decision, SslDecision::Inherited);
    assert!(policy.platform().writes().is_empty());
    assert!(!policy.is_ssl_disabled("shared.example.com").await.unwrap());
}

#[tokio::test]
async fn test_own_record_does_not_count_as_existing() {
    let platform = FakePlatform::new(&[(8, "solo.example.com")]);
    let policy = NewSiteSslPolicy::new(platform);

    let decision = policy.on_new_site(8, 2, "solo.example.com").await.unwrap();
    assert_eq!(decision, SslDecision::FlaggedDisabled);
}

#[tokio::test]
async fn test_context_restored_when_write_fails() {
    let platform = FakePlatform::new(&[]);
    platform.fail_write.store(true, Ordering::SeqCst);
    let policy = NewSiteSslPolicy::new(platform);
    let scope = SiteScope::new(5);

    let err = policy
        .on_new_site_in(&scope, 5, 1, "new-tenant.example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, PolicyError::Write { ref domain, .. } if domain == "new-tenant.example.com"));
    assert_eq!(policy.platform().writes()[0].0, PRIMARY_SITE_ID);
    assert_eq!(scope.current_site(), 5);
}

#[tokio::test]
async fn test_query_failure_propagates_without_write() {
    let platform = FakePlatform::new(&[]);
    platform.fail_query.store(true, Ordering::SeqCst);
    let policy = NewSiteSslPolicy::new(platform);
    let scope = SiteScope::new(5);

    let err = policy
        .on_new_site_in(&scope, 5, 1, "new-tenant.example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, PolicyError::Query { .. }));
    assert!(policy.platform().writes().is_empty());
    assert_eq!(scope.current_site(), 5);
}

#[tokio::test]
async fn test_flag_key_is_per_domain() {
    let platform = FakePlatform::new(&[]);
    let policy = NewSiteSslPolicy::new(platform);

    policy.on_new_site(2, 1, "a.example.com").await.unwrap();
    policy.on_new_site(3, 1, "b.example.com").await.unwrap();

    let names: Vec<String> = policy
        .platform()
        .writes()
        .into_iter()
        .map(|(_, name, _)| name)
        .collect();
    assert_eq!(
        names,
        vec![
            ssl_disabled_option_key("a.example.com"),
            ssl_disabled_option_key("b.example.com")
        ]
    );
}

#[tokio::test]
async fn test_interleaved_requests_keep_their_own_context() {
    let policy = NewSiteSslPolicy::new(FakePlatform::new(&[]));
    let first = SiteScope::new(5);
    let second = SiteScope::new(6);

    let (a, b) = tokio::join!(
        policy.on_new_site_in(&first, 5, 1, "a.example.com"),
        policy.on_new_site_in(&second, 6, 1, "b.example.com"),
    );

    assert_eq!(a.unwrap(), SslDecision::FlaggedDisabled);
    assert_eq!(b.unwrap(), SslDecision::FlaggedDisabled);
    assert_eq!(first.current_site(), 5);
    assert_eq!(second.current_site(), 6);

    let writes = policy.platform().writes();
    assert_eq!(writes.len(), 2);
    assert!(writes.iter().all(|(site, _, _)| *site == PRIMARY_SITE_ID));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_new_sites_on_shared_policy() {
    let policy = Arc::new(NewSiteSslPolicy::new(FakePlatform::new(&[])));

    let handles: Vec<_> = (10..30)
        .map(|site_id| {
            let policy = Arc::clone(&policy);
            tokio::spawn(async move {
                let scope = SiteScope::new(site_id);
                let domain = format!("site{}.example.com", site_id);
                let decision = policy
                    .on_new_site_in(&scope, site_id, 1, &domain)
                    .await
                    .unwrap();
                (decision, scope.current_site(), site_id)
            })
        })
        .collect();

    for handle in handles {
        let (decision, restored, site_id) = handle.await.unwrap();
        assert_eq!(decision, SslDecision::FlaggedDisabled);
        assert_eq!(restored, site_id);
    }

    let writes = policy.platform().writes();
    assert_eq!(writes.len(), 20);
    assert!(writes.iter().all(|(site, _, _)| *site == PRIMARY_SITE_ID));
    for site_id in 10..30 {
        assert!(policy
            .is_ssl_disabled(&format!("site{}.example.com", site_id))
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn test_on_new_site_uses_a_fresh_context() {
    let policy = NewSiteSslPolicy::new(FakePlatform::new(&[]));

    policy.on_new_site(5, 1, "c.example.com").await.unwrap();

    assert_eq!(
        policy.platform().writes(),
        vec![(
            PRIMARY_SITE_ID,
            ssl_disabled_option_key("c.example.com"),
            "1".to_string()
        )]
    );
}
