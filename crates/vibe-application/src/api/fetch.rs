use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use vibe_core::Result;
use vibe_core::transport::{ApiRequest, Transport, TransportExt};

/// Cache fetcher issuing `request` and decoding its JSON body as `T`.
pub(crate) fn fetch_json<T>(
    transport: &Arc<dyn Transport>,
    request: ApiRequest,
) -> impl Fn() -> BoxFuture<'static, Result<T>> + Send + Sync + 'static
where
    T: DeserializeOwned + Send + 'static,
{
    let transport = Arc::clone(transport);
    move || {
        let transport = Arc::clone(&transport);
        let request = request.clone();
        async move { transport.send_json::<T>(request).await }.boxed()
    }
}
