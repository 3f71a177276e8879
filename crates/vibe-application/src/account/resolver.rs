//! Active account resolution.
//!
//! The active account lives on the server. This resolver mirrors it through
//! the cache, keyed per user, and only ever changes it by writing to the
//! server first.

use crate::api::fetch::fetch_json;
use crate::keys;
use crate::query::QueryCache;
use crate::session::SessionManager;
use std::sync::Arc;
use vibe_core::Result;
use vibe_core::account::{
    AccountList, AccountSummary, ActiveAccount, SetActiveAccountRequest, UpdatePrefixRequest,
};
use vibe_core::query::{CachedResult, KeyFilter, QueryPolicy, QueryStatus};
use vibe_core::routes;
use vibe_core::transport::{ApiRequest, Transport, TransportExt};

pub struct ActiveAccountResolver {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    session: Arc<SessionManager>,
}

impl ActiveAccountResolver {
    pub fn new(transport: Arc<dyn Transport>, cache: QueryCache, session: Arc<SessionManager>) -> Self {
        Self {
            transport,
            cache,
            session,
        }
    }

    fn policy(&self) -> QueryPolicy {
        self.cache
            .default_policy()
            .enabled(self.session.is_authenticated())
    }

    /// Non-blocking read of the active pointer; idle unless authenticated.
    ///
    /// A cached pointer to an account missing from the cached account list
    /// is never shown; the result reads as pending instead.
    pub fn read(&self) -> CachedResult<ActiveAccount> {
        let Some(identity) = self.session.identity() else {
            return CachedResult::idle();
        };
        let mut result = self.cache.read(
            keys::accounts_active(&identity),
            self.policy(),
            fetch_json::<ActiveAccount>(&self.transport, ApiRequest::get(routes::ACCOUNTS_ACTIVE_GET)),
        );

        let unlisted = result
            .value()
            .and_then(ActiveAccount::account_id)
            .is_some_and(|id| !self.is_listed(id));
        if unlisted {
            result.value = None;
            result.status = QueryStatus::Pending;
        }
        result
    }

    /// False only when a cached account list lacks `account_id`.
    fn is_listed(&self, account_id: &str) -> bool {
        self.cache
            .cached::<AccountList>(&keys::accounts_list())
            .is_none_or(|list| list.contains(account_id))
    }

    /// Non-blocking read of the linked account list.
    pub fn accounts_query(&self) -> CachedResult<AccountList> {
        self.cache.read(keys::accounts_list(), self.policy(), self.accounts_fetcher())
    }

    /// Awaits the linked account list.
    pub async fn accounts(&self) -> Result<Arc<AccountList>> {
        self.cache
            .ensure(keys::accounts_list(), self.policy(), self.accounts_fetcher())
            .await
    }

    fn accounts_fetcher(
        &self,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<AccountList>> + Send + Sync + 'static
    {
        fetch_json::<AccountList>(&self.transport, ApiRequest::get(routes::ACCOUNTS_LIST))
    }

    /// Resolves the active account against the server.
    ///
    /// Returns `None` when not authenticated or nothing is selected. A
    /// pointer to an account missing from the account list is stale: the
    /// active key is invalidated and `None` returned.
    pub async fn get_active(&self) -> Result<Option<AccountSummary>> {
        let Some(identity) = self.session.identity() else {
            return Ok(None);
        };
        let key = keys::accounts_active(&identity);

        let active = self
            .cache
            .ensure(
                key.clone(),
                self.policy(),
                fetch_json::<ActiveAccount>(
                    &self.transport,
                    ApiRequest::get(routes::ACCOUNTS_ACTIVE_GET),
                ),
            )
            .await?;
        let Some(account_id) = active.account_id() else {
            return Ok(None);
        };

        // The cached list may predate the account; confirm with a fresh one
        let listed = self.is_listed(account_id) || self.accounts().await?.contains(account_id);
        if !listed {
            tracing::debug!(
                "[ActiveAccount] Active account {} is not in the account list, resetting",
                account_id
            );
            self.cache.invalidate(&KeyFilter::Exact(key));
            return Ok(None);
        }

        Ok(active.account.clone())
    }

    /// Selects `account_id` (or clears the selection with `None`).
    ///
    /// The server is written first; the cached pointer is only invalidated
    /// once that succeeds, so a failure leaves the previous value in place.
    pub async fn set_active(&self, account_id: Option<&str>) -> Result<()> {
        let request = ApiRequest::post(routes::ACCOUNTS_ACTIVE_SET).with_json(&SetActiveAccountRequest {
            account_id: account_id.map(str::to_string),
        })?;

        self.cache
            .mutate_and_invalidate(
                self.transport.send_unit(request),
                &[KeyFilter::Prefix(keys::accounts_active_all())],
            )
            .await?;
        tracing::debug!("[ActiveAccount] Active account set to {:?}", account_id);
        Ok(())
    }

    /// Unlinks an account; the list and every active pointer are re-fetched.
    ///
    /// Cached pointers are dropped outright, since they may name the removed
    /// account.
    pub async fn remove_account(&self, account_id: &str) -> Result<()> {
        self.cache
            .mutate_and_invalidate(
                self.transport
                    .send_unit(ApiRequest::post(routes::account_remove(account_id))),
                &[KeyFilter::Prefix(keys::accounts())],
            )
            .await?;
        self.cache
            .discard(&KeyFilter::Prefix(keys::accounts_active_all()));
        Ok(())
    }

    pub async fn update_prefix(&self, account_id: &str, prefix: &str) -> Result<()> {
        let request = ApiRequest::post(routes::ACCOUNTS_PREFIX).with_json(&UpdatePrefixRequest {
            account_id: account_id.to_string(),
            prefix: prefix.to_string(),
        })?;
        self.cache
            .mutate_and_invalidate(
                self.transport.send_unit(request),
                &[KeyFilter::Exact(keys::accounts_list())],
            )
            .await
    }

    /// Asks the server to refresh an account's upstream token and library.
    pub async fn refresh(&self, account_id: &str) -> Result<()> {
        self.cache
            .mutate(
                self.transport
                    .send_unit(ApiRequest::post(routes::account_refresh(account_id))),
            )
            .await
    }
}
