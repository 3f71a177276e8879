//! Account domain module.

mod model;

pub use model::{
    AccountList, AccountSummary, ActiveAccount, SetActiveAccountRequest, UpdatePrefixRequest,
};
