//! `DealContract`-related definitions.

use common::{DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

use super::Party;

/// Unsigned rental agreement artifact attached to a `Deal`.
#[derive(Clone, Debug, From)]
pub struct Contract(domain::deal::Contract);

/// Unsigned rental agreement artifact attached to a `Deal`.
#[graphql_object(name = "DealContract", context = Context)]
impl Contract {
    /// Unique identifier of this `DealContract`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Path of the stored unsigned artifact.
    #[must_use]
    pub fn unsigned_file(&self) -> String {
        self.0.unsigned_file.to_string()
    }

    /// SHA-256 digest of the unsigned artifact bytes.
    #[must_use]
    pub fn digest(&self) -> Digest {
        self.0.digest.clone().into()
    }

    /// `DateTime` when this `DealContract` was attached.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `User` who attached this `DealContract`.
    #[must_use]
    pub fn created_by(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "`DealContract` existence guarantees its creator \
                      existence"
        )]
        unsafe {
            api::User::new_unchecked(self.0.created_by)
        }
    }

    /// Signed counter copies uploaded by the parties.
    pub async fn signed_copies(
        &self,
        ctx: &Context,
    ) -> Result<Vec<SignedCopy>, Error> {
        ctx.service()
            .execute(query::deal::SignedCopies::by(self.0.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|copies| copies.into_iter().map(Into::into).collect())
    }
}

/// One party's uploaded signed counter copy of a `DealContract`.
#[derive(Clone, Debug, From)]
pub struct SignedCopy(domain::deal::contract::Signed);

/// One party's uploaded signed counter copy of a `DealContract`.
#[graphql_object(name = "DealContractSignedCopy", context = Context)]
impl SignedCopy {
    /// `DealParty` who signed this copy.
    #[must_use]
    pub fn party(&self) -> Party {
        self.0.party.into()
    }

    /// Path of the stored signed file.
    #[must_use]
    pub fn file(&self) -> String {
        self.0.file.to_string()
    }

    /// SHA-256 digest of the signed file bytes.
    #[must_use]
    pub fn digest(&self) -> Digest {
        self.0.digest.clone().into()
    }

    /// `DateTime` when this copy was uploaded.
    #[must_use]
    pub fn uploaded_at(&self) -> DateTime {
        self.0.uploaded_at.coerce()
    }

    /// `User` who uploaded this copy.
    #[must_use]
    pub fn uploader(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "signed copy existence guarantees its uploader existence"
        )]
        unsafe {
            api::User::new_unchecked(self.0.uploader_id)
        }
    }
}

/// Unique identifier of a `DealContract`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::deal::contract::Id)]
#[into(domain::deal::contract::Id)]
#[graphql(name = "DealContractId", transparent)]
pub struct Id(Uuid);

/// SHA-256 digest of stored artifact bytes, hex-encoded.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealContractDigest",
    with = scalar::Via::<domain::deal::contract::Digest>,
)]
pub struct Digest(domain::deal::contract::Digest);
