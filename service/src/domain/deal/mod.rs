//! [`Deal`] definitions.

pub mod audit;
pub mod contract;
pub mod document;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{listing, user, Actor};
#[cfg(doc)]
use crate::domain::{Listing, User};

pub use self::{audit::Audit, contract::Contract, document::Document};

/// Admin-mediated rental deal between a tenant and a landlord over a
/// [`Listing`].
///
/// Not an instant booking: a [`Deal`] moves through reservation, document
/// collection, contract signing and payment under administrator control.
#[derive(Clone, Debug)]
pub struct Deal {
    /// ID of this [`Deal`].
    pub id: Id,

    /// ID of the [`Listing`] this [`Deal`] is about.
    pub listing_id: listing::Id,

    /// ID of the [`User`] renting the [`Listing`].
    pub tenant_id: user::Id,

    /// ID of the [`User`] owning the [`Listing`].
    pub landlord_id: user::Id,

    /// ID of the [`User`] who created this [`Deal`].
    pub created_by: user::Id,

    /// Current [`Status`] of this [`Deal`].
    pub status: Status,

    /// First day of the rental period, once chosen by the tenant.
    pub start_date: Option<Date>,

    /// Last day of the rental period, once chosen by the tenant.
    pub end_date: Option<Date>,

    /// Indicator whether the landlord has confirmed the rental period.
    ///
    /// May only be `true` while both dates are set: any date change resets
    /// it.
    pub dates_confirmed: bool,

    /// ID of the administrator assigned to this [`Deal`], if any.
    pub admin_id: Option<user::Id>,

    /// Free-form note the tenant left when reserving.
    pub tenant_note: Option<TenantNote>,

    /// [`DateTime`] when this [`Deal`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Deal`] was last updated.
    pub updated_at: UpdateDateTime,
}

impl Deal {
    /// Returns the [`Party`] the provided [`Actor`] acts as on this [`Deal`],
    /// if any.
    ///
    /// An administrator is not a [`Party`]: party-scoped operations require
    /// the matching participant itself.
    #[must_use]
    pub fn party_of(&self, actor: &Actor) -> Option<Party> {
        match actor.role {
            user::Role::Tenant if actor.id == self.tenant_id => {
                Some(Party::Tenant)
            }
            user::Role::Landlord if actor.id == self.landlord_id => {
                Some(Party::Landlord)
            }
            user::Role::Tenant | user::Role::Landlord | user::Role::Admin => {
                None
            }
        }
    }

    /// Indicates whether the provided [`Actor`] may read this [`Deal`].
    #[must_use]
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        actor.is_admin()
            || actor.id == self.tenant_id
            || actor.id == self.landlord_id
    }

    /// Returns the rental [`Period`] of this [`Deal`], once both dates are
    /// set.
    #[must_use]
    pub fn period(&self) -> Option<Period> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Period::new(start, end),
            (Some(_) | None, _) => None,
        }
    }

    /// Refreshes the [`UpdateDateTime`] of this [`Deal`].
    pub fn touch(&mut self) {
        self.updated_at = common::DateTime::now().coerce();
    }
}

/// ID of a [`Deal`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
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
    #[doc = "Lifecycle status of a [`Deal`]."]
    enum Status {
        #[doc = "[`Listing`] is reserved, nothing has been submitted yet."]
        Reserved = 1,

        #[doc = "At least one [`Document`] is uploaded, more are awaited."]
        DocsPending = 2,

        #[doc = "An administrator considers the documents sufficient."]
        DocsVerified = 3,

        #[doc = "Unsigned [`Contract`] is attached, signatures are awaited."]
        ReadyToSign = 4,

        #[doc = "Both parties signed, payment is awaited."]
        ReadyToPay = 5,

        #[doc = "Payment is recorded."]
        Paid = 6,

        #[doc = "The rental is completed."]
        Completed = 7,

        #[doc = "The [`Deal`] is canceled."]
        Canceled = 8,
    }
}

define_kind! {
    #[doc = "One of the two participants of a [`Deal`]."]
    enum Party {
        #[doc = "The [`User`] renting the [`Listing`]."]
        Tenant = 1,

        #[doc = "The [`User`] owning the [`Listing`]."]
        Landlord = 2,
    }
}

/// Rental period of a [`Deal`], guaranteed to be non-empty.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display("{start} -> {end}")]
pub struct Period {
    /// First day of the rental.
    pub start: Date,

    /// Last day of the rental.
    pub end: Date,
}

impl Period {
    /// Creates a new [`Period`] if `start` is strictly before `end`.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }
}

/// Free-form note a tenant leaves when reserving a [`Listing`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct TenantNote(String);

impl TenantNote {
    /// Creates a new [`TenantNote`] if the given `note` is valid.
    #[must_use]
    pub fn new(note: impl Into<String>) -> Option<Self> {
        let note = note.into();
        Self::check(&note).then_some(Self(note))
    }

    /// Checks whether the given `note` is a valid [`TenantNote`].
    fn check(note: impl AsRef<str>) -> bool {
        let note = note.as_ref();
        !note.trim().is_empty() && note.len() <= 2048
    }
}

impl std::str::FromStr for TenantNote {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `TenantNote`")
    }
}

/// Relative path of a stored blob belonging to a [`Deal`].
///
/// Always scoped under the `deals/{deal_id}/` namespace of the blob storage.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct FilePath(String);

impl FilePath {
    /// Creates a new [`FilePath`] pointing at `file_name` inside the
    /// namespace of the [`Deal`] with the provided ID.
    #[must_use]
    pub fn deal_scoped(deal_id: Id, file_name: impl AsRef<str>) -> Self {
        Self(format!("deals/{deal_id}/{}", file_name.as_ref()))
    }
}

/// Sanitizes a client-provided file name for embedding into a stored one.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`, replacing everything else
/// (path separators included) with `_`.
#[must_use]
pub(crate) fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// [`DateTime`] when a [`Deal`] was created.
pub type CreationDateTime = DateTimeOf<(Deal, unit::Creation)>;

/// [`DateTime`] when a [`Deal`] was last updated.
pub type UpdateDateTime = DateTimeOf<(Deal, unit::Update)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{listing, user, Actor};

    use super::{sanitize_file_name, Deal, Party, Period, Status};

    fn deal(tenant: user::Id, landlord: user::Id) -> Deal {
        Deal {
            id: super::Id::new(),
            listing_id: listing::Id::new(),
            tenant_id: tenant,
            landlord_id: landlord,
            created_by: tenant,
            status: Status::Reserved,
            start_date: None,
            end_date: None,
            dates_confirmed: false,
            admin_id: None,
            tenant_note: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn party_matches_role_and_id() {
        let tenant_id = user::Id::new();
        let landlord_id = user::Id::new();
        let deal = deal(tenant_id, landlord_id);

        let tenant = Actor {
            id: tenant_id,
            role: user::Role::Tenant,
        };
        let landlord = Actor {
            id: landlord_id,
            role: user::Role::Landlord,
        };
        let admin = Actor {
            id: user::Id::new(),
            role: user::Role::Admin,
        };
        let stranger = Actor {
            id: user::Id::new(),
            role: user::Role::Tenant,
        };

        assert_eq!(deal.party_of(&tenant), Some(Party::Tenant));
        assert_eq!(deal.party_of(&landlord), Some(Party::Landlord));
        assert_eq!(deal.party_of(&admin), None);
        assert_eq!(deal.party_of(&stranger), None);

        // Matching ID with a mismatched role is not enough.
        let impostor = Actor {
            id: tenant_id,
            role: user::Role::Landlord,
        };
        assert_eq!(deal.party_of(&impostor), None);
    }

    #[test]
    fn visibility_covers_participants_and_admins() {
        let tenant_id = user::Id::new();
        let landlord_id = user::Id::new();
        let deal = deal(tenant_id, landlord_id);

        assert!(deal.is_visible_to(&Actor {
            id: tenant_id,
            role: user::Role::Tenant,
        }));
        assert!(deal.is_visible_to(&Actor {
            id: landlord_id,
            role: user::Role::Landlord,
        }));
        assert!(deal.is_visible_to(&Actor {
            id: user::Id::new(),
            role: user::Role::Admin,
        }));
        assert!(!deal.is_visible_to(&Actor {
            id: user::Id::new(),
            role: user::Role::Tenant,
        }));
    }

    #[test]
    fn period_requires_both_dates_in_order() {
        let mut deal = deal(user::Id::new(), user::Id::new());
        assert_eq!(deal.period(), None);

        deal.start_date = Some("2025-06-01".parse().unwrap());
        assert_eq!(deal.period(), None);

        deal.end_date = Some("2025-07-01".parse().unwrap());
        assert!(deal.period().is_some());

        deal.end_date = Some("2025-05-01".parse().unwrap());
        assert_eq!(deal.period(), None);
    }

    #[test]
    fn period_rejects_empty_range() {
        let day = "2025-06-01".parse().unwrap();
        assert_eq!(Period::new(day, day), None);
    }

    #[test]
    fn status_round_trips_via_strings() {
        use std::str::FromStr as _;

        for status in [
            Status::Reserved,
            Status::DocsPending,
            Status::DocsVerified,
            Status::ReadyToSign,
            Status::ReadyToPay,
            Status::Paid,
            Status::Completed,
            Status::Canceled,
        ] {
            assert_eq!(Status::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(Status::from_str("SIGNED").is_err());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("passport.pdf"), "passport.pdf");
        assert_eq!(
            sanitize_file_name("../../../etc/passwd"),
            ".._.._.._etc_passwd",
        );
        assert_eq!(sanitize_file_name("my scan (1).png"), "my_scan__1_.png");
    }
}
