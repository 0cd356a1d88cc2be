//! `DealDocument`-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, api::scalar, Context};

use super::Party;

/// Uploaded file evidencing one requirement of a `Deal`.
#[derive(Clone, Debug, From)]
pub struct Document(domain::deal::Document);

/// Uploaded file evidencing one requirement of a `Deal`.
#[graphql_object(name = "DealDocument", context = Context)]
impl Document {
    /// Unique identifier of this `DealDocument`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `DealParty` this `DealDocument` evidences requirements of.
    #[must_use]
    pub fn party(&self) -> Party {
        self.0.party.into()
    }

    /// Code of the requirement this `DealDocument` evidences.
    #[must_use]
    pub fn code(&self) -> Code {
        self.0.code.clone().into()
    }

    /// Path of the stored file.
    #[must_use]
    pub fn file(&self) -> String {
        self.0.file.to_string()
    }

    /// Review status of this `DealDocument`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Administrator's note left on review.
    #[must_use]
    pub fn note(&self) -> Option<Note> {
        self.0.note.clone().map(Into::into)
    }

    /// `User` who uploaded this `DealDocument`.
    #[must_use]
    pub fn uploader(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "`DealDocument` existence guarantees its uploader \
                      existence"
        )]
        unsafe {
            api::User::new_unchecked(self.0.uploader_id)
        }
    }

    /// `DateTime` when this `DealDocument` was uploaded.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `DealDocument` was reviewed.
    #[must_use]
    pub fn reviewed_at(&self) -> Option<DateTime> {
        self.0.reviewed_at.map(|at| at.coerce())
    }

    /// Administrator who reviewed this `DealDocument`.
    #[must_use]
    pub fn reviewed_by(&self) -> Option<api::User> {
        #[expect(
            unsafe_code,
            reason = "review record guarantees the reviewer existence"
        )]
        self.0
            .reviewed_by
            .map(|id| unsafe { api::User::new_unchecked(id) })
    }
}

/// Unique identifier of a `DealDocument`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::deal::document::Id)]
#[into(domain::deal::document::Id)]
#[graphql(name = "DealDocumentId", transparent)]
pub struct Id(Uuid);

/// Review status of a `DealDocument`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DealDocumentStatus")]
pub enum Status {
    /// Awaits an administrator's review.
    Pending,

    /// Accepted by an administrator.
    Approved,

    /// Rejected by an administrator.
    Rejected,
}

impl From<domain::deal::document::Status> for Status {
    fn from(status: domain::deal::document::Status) -> Self {
        use domain::deal::document::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Approved => Self::Approved,
            S::Rejected => Self::Rejected,
        }
    }
}

/// Administrator's decision on a `DealDocument` review.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DealDocumentReviewDecision")]
pub enum ReviewDecision {
    /// Accept the `DealDocument`.
    Approved,

    /// Reject the `DealDocument`.
    Rejected,
}

impl From<ReviewDecision> for domain::deal::document::ReviewDecision {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::Approved,
            ReviewDecision::Rejected => Self::Rejected,
        }
    }
}

/// Open string code of a `DealDocument` requirement.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealDocumentCode",
    with = scalar::Via::<domain::deal::document::Code>,
)]
pub struct Code(domain::deal::document::Code);

/// Administrator's note on a `DealDocument` review.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealDocumentNote",
    with = scalar::Via::<domain::deal::document::Note>,
)]
pub struct Note(domain::deal::document::Note);
