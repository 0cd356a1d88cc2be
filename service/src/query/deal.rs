//! [`Query`] collection related to a single [`Deal`].

use common::operations::By;

use crate::domain::{deal, Deal};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Deal`] by its [`deal::Id`].
pub type ById = DatabaseQuery<By<Option<Deal>, deal::Id>>;

/// Queries all [`deal::Document`]s of a [`Deal`], newest first.
pub type Documents = DatabaseQuery<By<Vec<deal::Document>, deal::Id>>;

/// Queries a single [`deal::Document`] by its ID.
pub type DocumentById =
    DatabaseQuery<By<Option<deal::Document>, deal::document::Id>>;

/// Queries the [`deal::Contract`] of a [`Deal`], if attached.
pub type Contract = DatabaseQuery<By<Option<deal::Contract>, deal::Id>>;

/// Queries all [`deal::contract::Signed`] copies of a [`deal::Contract`].
pub type SignedCopies =
    DatabaseQuery<By<Vec<deal::contract::Signed>, deal::contract::Id>>;

/// Queries the [`deal::Audit`] trail of a [`Deal`], newest first.
pub type AuditTrail = DatabaseQuery<By<Vec<deal::Audit>, deal::Id>>;
