//! [`Contract`] definitions.

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use crate::domain::{deal, user, Listing, User};
#[cfg(doc)]
use crate::domain::Deal;

use super::{sanitize_file_name, FilePath, Party, Period};

/// Unsigned rental agreement artifact attached to a [`Deal`].
///
/// At most one exists per [`Deal`]; parties upload their signed counter
/// copies separately as [`Signed`] records.
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// ID of the [`Deal`] this [`Contract`] belongs to.
    pub deal_id: deal::Id,

    /// Path of the stored unsigned artifact.
    pub unsigned_file: FilePath,

    /// [`Digest`] of the unsigned artifact bytes at creation time.
    pub digest: Digest,

    /// [`DateTime`] when this [`Contract`] was attached.
    pub created_at: CreationDateTime,

    /// ID of the [`User`] who attached this [`Contract`].
    pub created_by: user::Id,
}

/// ID of a [`Contract`].
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

/// SHA-256 digest of stored artifact bytes, hex-encoded.
///
/// Recorded for tamper evidence: the system never validates signature
/// contents, only that stored bytes can be re-checked against the digest.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Digest(String);

impl Digest {
    /// Computes the [`Digest`] of the provided bytes.
    #[must_use]
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(Sha256::digest(bytes.as_ref())))
    }

    /// Creates a new [`Digest`] if the given `digest` is a valid hex-encoded
    /// SHA-256 value.
    #[must_use]
    pub fn new(digest: impl Into<String>) -> Option<Self> {
        let digest = digest.into();
        Self::check(&digest).then_some(Self(digest))
    }

    /// Checks whether the given `digest` is a valid [`Digest`].
    fn check(digest: impl AsRef<str>) -> bool {
        let digest = digest.as_ref();
        digest.len() == 64
            && digest
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }
}

impl FromStr for Digest {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Digest`")
    }
}

/// One [`Party`]'s uploaded signed counter copy of a [`Contract`].
///
/// At most one exists per ([`Contract`], [`Party`]) pair: a re-upload
/// replaces the previous record in place.
#[derive(Clone, Debug)]
pub struct Signed {
    /// ID of this [`Signed`] record.
    pub id: SignedId,

    /// ID of the [`Contract`] this copy counter-signs.
    pub contract_id: Id,

    /// [`Party`] who signed this copy.
    pub party: Party,

    /// Path of the stored signed file.
    pub file: FilePath,

    /// [`Digest`] of the signed file bytes.
    pub digest: Digest,

    /// [`DateTime`] when this copy was uploaded.
    pub uploaded_at: UploadDateTime,

    /// ID of the [`User`] who uploaded this copy.
    pub uploader_id: user::Id,
}

/// ID of a [`Signed`] record.
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
pub struct SignedId(Uuid);

impl SignedId {
    /// Creates a new random [`SignedId`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Composes a stored file name for an unsigned [`Contract`] artifact.
///
/// The `extension` depends on the attachment path: a copied template keeps
/// its own, a composed agreement is plain text.
#[must_use]
pub fn unsigned_file_name(at: CreationDateTime, extension: &str) -> String {
    format!("contract_unsigned_{}.{extension}", at.unix_timestamp())
}

/// Composes a stored file name for a [`Signed`] counter copy.
#[must_use]
pub fn signed_file_name(
    party: Party,
    at: UploadDateTime,
    original: &str,
) -> String {
    format!(
        "contract_signed_{}_{}_{}",
        party.to_string().to_lowercase(),
        at.unix_timestamp(),
        sanitize_file_name(original),
    )
}

/// Source data of an unsigned rental agreement.
///
/// [`Agreement::compose`] is the single rendering path: it is deterministic
/// over its inputs and requires no external artifacts, so attaching a
/// generated contract either succeeds or fails loudly before any state
/// changes.
#[derive(Debug)]
pub struct Agreement<'a> {
    /// ID of the [`Deal`] the agreement is for.
    pub deal_id: deal::Id,

    /// [`Listing`] being rented.
    pub listing: &'a Listing,

    /// [`User`] renting the [`Listing`].
    pub tenant: &'a User,

    /// [`User`] owning the [`Listing`].
    pub landlord: &'a User,

    /// Confirmed rental [`Period`].
    pub period: Period,
}

impl Agreement<'_> {
    /// Renders this [`Agreement`] into unsigned artifact bytes.
    ///
    /// Identical inputs always produce identical bytes, which makes the
    /// recorded [`Digest`] reproducible.
    #[must_use]
    pub fn compose(&self) -> Vec<u8> {
        let Self {
            deal_id,
            listing,
            tenant,
            landlord,
            period,
        } = self;

        let mut out = String::new();
        let mut line = |s: &str| {
            out.push_str(s);
            out.push('\n');
        };

        line("RENTAL AGREEMENT");
        line("================");
        line("");
        line(&format!("Deal: {deal_id}"));
        line(&format!("Listing: {} ({})", listing.title, listing.city));
        line(&format!(
            "Tenant: {} <{}>",
            tenant.name,
            tenant.email.as_ref().map_or("-", AsRef::as_ref),
        ));
        line(&format!(
            "Landlord: {} <{}>",
            landlord.name,
            landlord.email.as_ref().map_or("-", AsRef::as_ref),
        ));
        line(&format!("Period: {period}"));
        line(&format!("Monthly rent: {}", listing.price));
        line("");
        line("The parties sign this agreement manually and upload their");
        line("signed copies back to the platform.");

        out.into_bytes()
    }
}

/// [`DateTime`] when a [`Contract`] was attached.
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

/// Marker type indicating a [`Signed`] copy upload.
#[derive(Clone, Copy, Debug)]
pub struct Upload;

/// [`DateTime`] when a [`Signed`] copy was uploaded.
pub type UploadDateTime = DateTimeOf<(Signed, Upload)>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::domain::{deal, listing, user, Listing, User};

    use super::{Agreement, Digest};

    #[test]
    fn digest_is_deterministic_over_bytes() {
        let a = Digest::of(b"signed copy");
        let b = Digest::of(b"signed copy");
        let c = Digest::of(b"another copy");

        // Identical bytes produce an identical digest, different bytes don't.
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(AsRef::<str>::as_ref(&a).len(), 64);
    }

    #[test]
    fn digest_validates_hex_form() {
        let digest = Digest::of(b"x").to_string();
        assert!(Digest::new(digest).is_some());

        assert!(Digest::new("abc").is_none());
        assert!(Digest::new("G".repeat(64)).is_none());
    }

    fn user(name: &str, role: user::Role) -> User {
        User {
            id: user::Id::new(),
            name: user::Name::new(name).unwrap(),
            login: user::Login::new(name).unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new("secret").unwrap(),
            ),
            role,
            email: None,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[test]
    fn agreement_composition_is_deterministic() {
        let tenant = user("tenant", user::Role::Tenant);
        let landlord = user("landlord", user::Role::Landlord);
        let listing = Listing {
            id: listing::Id::new(),
            owner_id: landlord.id,
            title: listing::Title::new("Sunny flat").unwrap(),
            city: listing::City::new("Berlin").unwrap(),
            kind: listing::Kind::Apartment,
            price: "950EUR".parse::<Money>().unwrap(),
            description: None,
            created_at: DateTime::now().coerce(),
        };
        let agreement = Agreement {
            deal_id: deal::Id::new(),
            listing: &listing,
            tenant: &tenant,
            landlord: &landlord,
            period: deal::Period::new(
                "2025-06-01".parse().unwrap(),
                "2025-07-01".parse().unwrap(),
            )
            .unwrap(),
        };

        let first = agreement.compose();
        let second = agreement.compose();
        assert_eq!(first, second);
        assert_eq!(Digest::of(&first), Digest::of(&second));

        let text = String::from_utf8(first).unwrap();
        assert!(text.contains("Sunny flat"));
        assert!(text.contains("Berlin"));
        assert!(text.contains("2025-06-01 -> 2025-07-01"));
        assert!(text.contains("950EUR"));
    }
}
