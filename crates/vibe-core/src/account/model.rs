//! Linked account domain model.

use serde::{Deserialize, Serialize};

/// A linked streaming account as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlists_count: Option<u32>,
    /// Token expiry (ISO 8601 format)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<String>,
}

/// Envelope of the account list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AccountList {
    #[serde(default)]
    pub accounts: Vec<AccountSummary>,
}

impl AccountList {
    pub fn contains(&self, account_id: &str) -> bool {
        self.accounts.iter().any(|a| a.id == account_id)
    }

    pub fn find(&self, account_id: &str) -> Option<&AccountSummary> {
        self.accounts.iter().find(|a| a.id == account_id)
    }
}

/// Envelope of the active-account endpoint; `account` is null when nothing is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActiveAccount {
    #[serde(default)]
    pub account: Option<AccountSummary>,
}

impl ActiveAccount {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.id.as_str())
    }
}

/// Body of the set-active request; a null id clears the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetActiveAccountRequest {
    pub account_id: Option<String>,
}

/// Body of the prefix update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePrefixRequest {
    pub account_id: String,
    pub prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_list_tolerates_missing_fields() {
        let list: AccountList = serde_json::from_str(
            r#"{"accounts": [{"id": "a1", "display_name": "Main", "status": "healthy"}]}"#,
        )
        .unwrap();
        assert!(list.contains("a1"));
        assert!(!list.contains("a2"));
        assert!(list.find("a1").unwrap().email.is_none());
    }

    #[test]
    fn test_active_account_null() {
        let active: ActiveAccount = serde_json::from_str(r#"{"account": null}"#).unwrap();
        assert!(active.account_id().is_none());
        let active: ActiveAccount = serde_json::from_str("{}").unwrap();
        assert_eq!(active, ActiveAccount::none());
    }

    #[test]
    fn test_set_active_serializes_null() {
        let body = serde_json::to_value(SetActiveAccountRequest { account_id: None }).unwrap();
        assert_eq!(body, serde_json::json!({"account_id": null}));
    }
}
