//! `DealAuditEntry`-related definitions.

use common::DateTime;
use derive_more::From;
use juniper::graphql_object;
use service::domain;

use crate::{api, Context};

/// Immutable record of an action taken against a `Deal`.
#[derive(Clone, Debug, From)]
pub struct AuditEntry(domain::deal::Audit);

/// Immutable record of an action taken against a `Deal`.
#[graphql_object(name = "DealAuditEntry", context = Context)]
impl AuditEntry {
    /// Tag of the recorded action.
    #[must_use]
    pub fn action(&self) -> &str {
        self.0.action.as_ref()
    }

    /// Free-form details of the recorded action.
    #[must_use]
    pub fn meta(&self) -> &str {
        self.0.meta.as_ref()
    }

    /// `User` who performed the action, if it wasn't system-triggered.
    #[must_use]
    pub fn actor(&self) -> Option<api::User> {
        #[expect(
            unsafe_code,
            reason = "recorded actor is always an existing `User`"
        )]
        self.0
            .actor_id
            .map(|id| unsafe { api::User::new_unchecked(id) })
    }

    /// `DateTime` when the action was recorded.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}
