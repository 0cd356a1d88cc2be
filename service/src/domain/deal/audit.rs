//! [`Audit`] definitions.

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{deal, user};
#[cfg(doc)]
use crate::domain::{Deal, User};

/// Immutable record of an action taken against a [`Deal`].
///
/// Entries are append-only: nothing ever updates or deletes them, except the
/// administrative cascade removing the whole [`Deal`].
#[derive(Clone, Debug)]
pub struct Audit {
    /// ID of this [`Audit`] entry.
    pub id: Id,

    /// ID of the [`Deal`] this entry describes.
    pub deal_id: deal::Id,

    /// ID of the [`User`] who performed the action.
    ///
    /// [`None`] for system-triggered actions.
    pub actor_id: Option<user::Id>,

    /// [`Action`] tag of this entry.
    pub action: Action,

    /// Free-form [`Meta`] describing the action details.
    pub meta: Meta,

    /// [`DateTime`] when this entry was recorded.
    pub created_at: CreationDateTime,
}

/// ID of an [`Audit`] entry.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    derive_more::FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Tag of an action recorded in an [`Audit`] entry.
///
/// Free-form by design, with well-known values provided as constructors.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Action(String);

impl Action {
    /// A [`Deal`] was created by a reservation.
    #[must_use]
    pub fn deal_created() -> Self {
        Self("deal_created".into())
    }

    /// The tenant chose the rental period.
    #[must_use]
    pub fn dates_set() -> Self {
        Self("dates_set".into())
    }

    /// The rental period was confirmed.
    #[must_use]
    pub fn dates_confirmed() -> Self {
        Self("dates_confirmed".into())
    }

    /// An administrator changed the [`Deal`] status.
    #[must_use]
    pub fn status_change() -> Self {
        Self("status_change".into())
    }

    /// An administrator canceled the [`Deal`].
    #[must_use]
    pub fn deal_canceled() -> Self {
        Self("deal_canceled".into())
    }

    /// A party uploaded a [`deal::Document`].
    #[must_use]
    pub fn doc_upload() -> Self {
        Self("doc_upload".into())
    }

    /// An administrator reviewed a [`deal::Document`].
    #[must_use]
    pub fn doc_review() -> Self {
        Self("doc_review".into())
    }

    /// An unsigned [`deal::Contract`] was generated and attached.
    #[must_use]
    pub fn contract_attached() -> Self {
        Self("contract_attached".into())
    }

    /// An unsigned [`deal::Contract`] was attached automatically on a status
    /// transition.
    #[must_use]
    pub fn contract_attached_auto() -> Self {
        Self("contract_attached_auto".into())
    }

    /// A party uploaded a signed [`deal::Contract`] copy.
    #[must_use]
    pub fn contract_signed_upload() -> Self {
        Self("contract_signed_upload".into())
    }

    /// Creates a new [`Action`] if the given `action` is valid.
    #[must_use]
    pub fn new(action: impl Into<String>) -> Option<Self> {
        let action = action.into();
        Self::check(&action).then_some(Self(action))
    }

    /// Checks whether the given `action` is a valid [`Action`].
    fn check(action: impl AsRef<str>) -> bool {
        let action = action.as_ref();
        !action.is_empty() && action.len() <= 64
    }
}

impl FromStr for Action {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Action`")
    }
}

/// Free-form details of an [`Audit`] entry.
#[derive(AsRef, Clone, Debug, Default, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Meta(String);

impl Meta {
    /// Creates a new [`Meta`] with the provided details.
    #[must_use]
    pub fn new(meta: impl Into<String>) -> Self {
        Self(meta.into())
    }
}

/// [`DateTime`] when an [`Audit`] entry was recorded.
pub type CreationDateTime = DateTimeOf<(Audit, unit::Creation)>;
