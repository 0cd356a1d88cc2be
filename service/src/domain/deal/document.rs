//! [`Document`] definitions.

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{deal, user};
#[cfg(doc)]
use crate::domain::{Deal, User};

use super::{sanitize_file_name, FilePath, Party};

/// Uploaded file evidencing one requirement of a [`Deal`] (a passport scan,
/// a proof of income, and so on).
#[derive(Clone, Debug)]
pub struct Document {
    /// ID of this [`Document`].
    pub id: Id,

    /// ID of the [`Deal`] this [`Document`] belongs to.
    pub deal_id: deal::Id,

    /// ID of the [`User`] who uploaded this [`Document`].
    pub uploader_id: user::Id,

    /// [`Party`] this [`Document`] evidences requirements of.
    pub party: Party,

    /// [`Code`] of the requirement this [`Document`] evidences.
    pub code: Code,

    /// Path of the stored file.
    pub file: FilePath,

    /// Review [`Status`] of this [`Document`].
    pub status: Status,

    /// Administrator's note left on review.
    pub note: Option<Note>,

    /// [`DateTime`] when this [`Document`] was uploaded.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Document`] was reviewed.
    ///
    /// Set together with [`Document::reviewed_by`] only.
    pub reviewed_at: Option<ReviewDateTime>,

    /// ID of the administrator who reviewed this [`Document`].
    pub reviewed_by: Option<user::Id>,
}

/// ID of a [`Document`].
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

define_kind! {
    #[doc = "Review status of a [`Document`]."]
    enum Status {
        #[doc = "Awaits an administrator's review."]
        Pending = 1,

        #[doc = "Accepted by an administrator."]
        Approved = 2,

        #[doc = "Rejected by an administrator."]
        Rejected = 3,
    }
}

define_kind! {
    #[doc = "Administrator's decision on a [`Document`] review."]
    enum ReviewDecision {
        #[doc = "Accept the [`Document`]."]
        Approved = 1,

        #[doc = "Reject the [`Document`]."]
        Rejected = 2,
    }
}

impl From<ReviewDecision> for Status {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => Self::Approved,
            ReviewDecision::Rejected => Self::Rejected,
        }
    }
}

/// Open string code of a [`Document`] requirement.
///
/// Kept extensible on purpose: the service only requires a well-formed code,
/// while the known set is a UI concern.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Code(String);

impl Code {
    /// [`Code`]s a tenant is expected to provide.
    pub const KNOWN_TENANT: &'static [&'static str] =
        &["passport", "visa_or_residence", "income_proof", "extra"];

    /// [`Code`]s a landlord is expected to provide.
    pub const KNOWN_LANDLORD: &'static [&'static str] =
        &["ownership_proof", "landlord_id", "extra"];

    /// Creates a new [`Code`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        Self::check(&code).then_some(Self(code))
    }

    /// Checks whether the given `code` is a valid [`Code`].
    fn check(code: impl AsRef<str>) -> bool {
        let code = code.as_ref();
        !code.is_empty()
            && code.len() <= 64
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    /// Returns [`Code`]s the provided [`Party`] is expected to provide.
    #[must_use]
    pub fn known_for(party: Party) -> &'static [&'static str] {
        match party {
            Party::Tenant => Self::KNOWN_TENANT,
            Party::Landlord => Self::KNOWN_LANDLORD,
        }
    }
}

impl FromStr for Code {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Code`")
    }
}

/// Administrator's note on a [`Document`] review.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Note(String);

impl Note {
    /// Creates a new [`Note`] if the given `note` is valid.
    #[must_use]
    pub fn new(note: impl Into<String>) -> Option<Self> {
        let note = note.into();
        Self::check(&note).then_some(Self(note))
    }

    /// Checks whether the given `note` is a valid [`Note`].
    fn check(note: impl AsRef<str>) -> bool {
        let note = note.as_ref();
        !note.trim().is_empty() && note.len() <= 2048
    }
}

impl FromStr for Note {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Note`")
    }
}

/// Composes a collision-resistant stored file name for a [`Document`].
///
/// Embeds the [`Party`], the [`Code`] and the upload timestamp, so repeated
/// uploads of the same requirement never overwrite each other.
#[must_use]
pub fn stored_file_name(
    party: Party,
    code: &Code,
    at: CreationDateTime,
    original: &str,
) -> String {
    format!(
        "{}_{code}_{}_{}",
        party.to_string().to_lowercase(),
        at.unix_timestamp(),
        sanitize_file_name(original),
    )
}

/// [`DateTime`] when a [`Document`] was uploaded.
pub type CreationDateTime = DateTimeOf<(Document, unit::Creation)>;

/// Marker type indicating a [`Document`] review.
#[derive(Clone, Copy, Debug)]
pub struct Review;

/// [`DateTime`] when a [`Document`] was reviewed.
pub type ReviewDateTime = DateTimeOf<(Document, Review)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::deal::Party;

    use super::{stored_file_name, Code, ReviewDecision, Status};

    #[test]
    fn code_accepts_known_and_custom_values() {
        for code in Code::KNOWN_TENANT.iter().chain(Code::KNOWN_LANDLORD) {
            assert!(Code::new(*code).is_some(), "rejected known `{code}`");
        }
        assert!(Code::new("utility_bill_2024").is_some());

        assert!(Code::new("").is_none());
        assert!(Code::new("Passport").is_none());
        assert!(Code::new("proof of income").is_none());
        assert!(Code::new("a".repeat(65)).is_none());
    }

    #[test]
    fn decision_maps_into_status() {
        assert_eq!(Status::from(ReviewDecision::Approved), Status::Approved);
        assert_eq!(Status::from(ReviewDecision::Rejected), Status::Rejected);
    }

    #[test]
    fn stored_names_embed_party_code_and_timestamp() {
        let at = DateTime::now().coerce();
        let code = Code::new("passport").unwrap();

        let name = stored_file_name(Party::Tenant, &code, at, "scan 1.pdf");

        assert!(name.starts_with("tenant_passport_"));
        assert!(name.ends_with("_scan_1.pdf"));
        assert!(name.contains(&at.unix_timestamp().to_string()));
    }
}
