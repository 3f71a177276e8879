use super::*;
use crate::test_support::MockTransport;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vibe_core::query::{KeyFilter, QueryKey};
use vibe_core::query_key;
use vibe_core::transport::{ApiRequest, Method, TransportExt};
use vibe_core::{Result, SyncError};

const ITEMS: &str = "/api/v1/items";
const OTHER: &str = "/api/v1/other";

type Items = Vec<String>;

fn items_key() -> QueryKey {
    query_key!["items", "list"]
}

fn fetch(
    transport: &Arc<MockTransport>,
    path: &'static str,
) -> impl Fn() -> BoxFuture<'static, Result<Items>> + Send + Sync + 'static {
    let transport = Arc::clone(transport);
    move || {
        let transport = Arc::clone(&transport);
        async move { transport.send_json::<Items>(ApiRequest::get(path)).await }.boxed()
    }
}

/// Lets spawned fetches run to completion.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn setup() -> (QueryCache, Arc<MockTransport>) {
    (QueryCache::default(), MockTransport::new())
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_reads_share_one_request() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a", "b"]));
    let gate = transport.hold(Method::Get, ITEMS);
    let policy = cache.default_policy();

    let first = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(first.is_pending());
    assert!(first.is_fetching);
    let second = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(second.is_fetching);

    let a = tokio::spawn({
        let cache = cache.clone();
        let fetcher = fetch(&transport, ITEMS);
        async move { cache.ensure(items_key(), policy, fetcher).await }
    });
    let b = tokio::spawn({
        let cache = cache.clone();
        let fetcher = fetch(&transport, ITEMS);
        async move { cache.ensure(items_key(), policy, fetcher).await }
    });

    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    gate.release();
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*a, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    let settled = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(!settled.is_fetching);
    assert_eq!(settled.value().map(Vec::len), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_read_is_idle_and_offline() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache.default_policy().enabled(false);

    let result = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(result.is_idle());
    assert!(!result.is_fetching);
    assert!(result.value.is_none());

    let err = cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Disabled { .. }));

    settle().await;
    assert_eq!(transport.total_calls(), 0);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_while_revalidate() {
    let (cache, transport) = setup();
    transport.once_json(Method::Get, ITEMS, json!(["v1"]));
    transport.on_json(Method::Get, ITEMS, json!(["v2"]));
    let policy = cache.default_policy();

    let value = cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();
    assert_eq!(*value, vec!["v1".to_string()]);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let fresh = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(!fresh.is_fetching);
    assert!(!fresh.is_stale);
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    let stale = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(stale.is_fetching);
    assert!(stale.is_stale);
    assert_eq!(stale.value(), Some(&vec!["v1".to_string()]));

    settle().await;
    let refreshed = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(!refreshed.is_fetching);
    assert_eq!(refreshed.value(), Some(&vec!["v2".to_string()]));
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_previous_value() {
    let (cache, transport) = setup();
    transport.once_json(Method::Get, ITEMS, json!(["v1"]));
    transport.on(
        Method::Get,
        ITEMS,
        Err(SyncError::Server {
            status: 500,
            message: "boom".to_string(),
        }),
    );
    let policy = cache.default_policy();

    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    let err = cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Server { status: 500, .. }));

    let result = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(result.is_stale_error());
    assert_eq!(result.value(), Some(&vec!["v1".to_string()]));
    // Staleness is measured from the failed attempt, so no retry yet
    assert!(!result.is_fetching);
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_refetches_only_subscribed_keys() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    transport.on_json(Method::Get, OTHER, json!(["b"]));
    let policy = cache.default_policy();
    let other_key = query_key!["items", "other"];

    let _subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    cache
        .ensure(other_key.clone(), policy, fetch(&transport, OTHER))
        .await
        .unwrap();
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);
    assert_eq!(transport.calls(Method::Get, OTHER), 1);

    cache.invalidate(&KeyFilter::Prefix(query_key!["items"]));
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
    assert_eq!(transport.calls(Method::Get, OTHER), 1);

    let lazy = cache.read(other_key, policy, fetch(&transport, OTHER));
    assert!(lazy.is_stale);
    assert!(lazy.is_fetching);
    settle().await;
    assert_eq!(transport.calls(Method::Get, OTHER), 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_during_flight_refetches_after_completion() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let gate = transport.hold(Method::Get, ITEMS);
    let policy = cache.default_policy();

    let subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    cache.invalidate(&KeyFilter::Exact(items_key()));
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    gate.release();
    settle().await;
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
    assert_eq!(subscription.current().value().map(Vec::len), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_refetch_interval_tied_to_subscribers() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache
        .default_policy()
        .refetch_every(Duration::from_secs(30));

    let subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);

    tokio::time::sleep(Duration::from_secs(30)).await;
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 3);

    drop(subscription);
    assert!(!cache.has_subscribers(&items_key()));
    tokio::time::sleep(Duration::from_secs(90)).await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 3);
}

#[tokio::test(start_paused = true)]
async fn test_schedule_survives_while_one_subscriber_remains() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache
        .default_policy()
        .refetch_every(Duration::from_secs(10));

    let first = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    let _second = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;
    drop(first);

    tokio::time::sleep(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_subscription_observes_updates() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache.default_policy();

    let mut subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    assert!(subscription.current().is_pending());

    assert!(subscription.changed().await);
    assert_eq!(
        subscription.current().value(),
        Some(&vec!["a".to_string()])
    );
}

#[tokio::test(start_paused = true)]
async fn test_purge_discards_in_flight_results() {
    let (cache, transport) = setup();
    transport.once_json(Method::Get, ITEMS, json!(["before"]));
    transport.on_json(Method::Get, ITEMS, json!(["after"]));
    let policy = cache.default_policy();

    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    let gate = transport.hold(Method::Get, ITEMS);
    let waiting = tokio::spawn({
        let cache = cache.clone();
        let fetcher = fetch(&transport, ITEMS);
        async move { cache.ensure(items_key(), policy, fetcher).await }
    });
    settle().await;

    cache.purge();
    gate.release();
    assert_eq!(waiting.await.unwrap().unwrap_err(), SyncError::Cancelled);

    let after = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(after.value.is_none());
    assert!(after.is_pending());
    settle().await;
    let after = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert_eq!(after.value(), Some(&vec!["after".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn test_purge_refetches_live_keys() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache.default_policy();

    let subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;

    cache.purge();
    let purged = subscription.current();
    assert!(purged.value.is_none());
    assert!(purged.is_fetching);

    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
    assert!(subscription.current().value.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_clear_cancels_schedules() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache
        .default_policy()
        .refetch_every(Duration::from_secs(30));

    let _subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;

    cache.clear();
    assert!(cache.is_empty());
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);
}

#[tokio::test(start_paused = true)]
async fn test_evict_emits_event() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache.default_policy();
    let mut events = cache.events();

    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();
    assert_eq!(events.recv().await.unwrap(), CacheEvent::Updated(items_key()));

    cache.evict(&items_key());
    assert_eq!(events.recv().await.unwrap(), CacheEvent::Evicted(items_key()));
    assert!(cache.cached::<Items>(&items_key()).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_type_mismatch_is_an_error() {
    let cache = QueryCache::default();
    let policy = cache.default_policy();
    let key = query_key!["settings"];

    cache
        .ensure(key.clone(), policy, || async { Ok("text".to_string()) })
        .await
        .unwrap();

    let read = cache.read(key.clone(), policy, || async { Ok(7u32) });
    assert!(matches!(read.error, Some(SyncError::TypeMismatch { .. })));

    let err = cache
        .ensure(key, policy, || async { Ok(7u32) })
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::TypeMismatch { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_is_escalated() {
    let cache = QueryCache::default();
    let escalations = Arc::new(AtomicUsize::new(0));
    cache.set_unauthorized_handler({
        let escalations = Arc::clone(&escalations);
        Arc::new(move || {
            escalations.fetch_add(1, Ordering::SeqCst);
        })
    });
    let policy = cache.default_policy();

    let err = cache
        .ensure(items_key(), policy, || async {
            Err::<Items, _>(SyncError::unauthorized("expired"))
        })
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(escalations.load(Ordering::SeqCst), 1);

    let err = cache
        .mutate(async { Err::<(), _>(SyncError::unauthorized("expired")) })
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(escalations.load(Ordering::SeqCst), 2);

    let validation = cache
        .mutate(async { Err::<(), _>(SyncError::from_response(400, "nope")) })
        .await;
    assert!(validation.is_err());
    assert_eq!(escalations.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_mutate_and_invalidate_only_after_success() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache.default_policy();
    let filters = [KeyFilter::Exact(items_key())];

    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();

    let failed = cache
        .mutate_and_invalidate(
            async { Err::<(), _>(SyncError::from_response(409, r#"{"detail":"taken"}"#)) },
            &filters,
        )
        .await;
    assert_eq!(failed.unwrap_err().user_message(), "taken");
    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);

    cache
        .mutate_and_invalidate(async { Ok(()) }, &filters)
        .await
        .unwrap();
    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_read_hides_cached_value() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache.default_policy();

    cache
        .ensure(items_key(), policy, fetch(&transport, ITEMS))
        .await
        .unwrap();

    let result = cache.read(items_key(), policy.enabled(false), fetch(&transport, ITEMS));
    assert!(result.is_idle());
    assert!(result.value.is_none());
    assert_eq!(transport.calls(Method::Get, ITEMS), 1);
}

#[tokio::test(start_paused = true)]
async fn test_handle_from_before_clear_leaves_new_subscriber_alone() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    let policy = cache
        .default_policy()
        .refetch_every(Duration::from_secs(1));

    let previous = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;
    cache.clear();

    let _current = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    settle().await;
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);

    drop(previous);
    assert!(cache.has_subscribers(&items_key()));

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    settle().await;
    assert!(transport.calls(Method::Get, ITEMS) >= 4);
}

#[tokio::test(start_paused = true)]
async fn test_discard_drops_values_and_keeps_subscriptions() {
    let (cache, transport) = setup();
    transport.on_json(Method::Get, ITEMS, json!(["a"]));
    transport.on_json(Method::Get, OTHER, json!(["z"]));
    let policy = cache.default_policy();
    let other_key = query_key!["items", "other"];

    let _subscription = cache.subscribe(items_key(), policy, fetch(&transport, ITEMS));
    cache
        .ensure(other_key.clone(), policy, fetch(&transport, OTHER))
        .await
        .unwrap();
    settle().await;
    assert!(cache.cached::<Items>(&items_key()).is_some());

    let gate = transport.hold(Method::Get, ITEMS);
    cache.discard(&KeyFilter::Prefix(query_key!["items"]));

    let result = cache.read(items_key(), policy, fetch(&transport, ITEMS));
    assert!(result.value.is_none());
    assert!(result.is_fetching);
    assert!(cache.cached::<Items>(&other_key).is_none());
    assert_eq!(cache.len(), 1);
    assert!(cache.has_subscribers(&items_key()));

    gate.release();
    settle().await;
    assert_eq!(cache.cached::<Items>(&items_key()).map(|v| v.len()), Some(1));
    assert_eq!(transport.calls(Method::Get, ITEMS), 2);
}
