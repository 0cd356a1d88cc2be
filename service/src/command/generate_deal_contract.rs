//! [`Command`] for generating the unsigned [`deal::Contract`] of a [`Deal`].

use std::collections::HashMap;

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
    },
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        deal::{self, contract},
        listing, user, Actor, Deal, Listing, User,
    },
    infra::{
        database,
        storage::{self, Location, Store},
        Database, Storage,
    },
    Service,
};

use super::Command;

/// [`Command`] for generating the unsigned [`deal::Contract`] of a [`Deal`].
///
/// Renders the agreement deterministically from the [`Deal`] data through
/// the single bundled compositor. Overwriting an existing
/// [`deal::Contract`] always discards previously recorded signed copies: a
/// new unsigned artifact invalidates prior signatures.
#[derive(Clone, Copy, Debug)]
pub struct GenerateDealContract {
    /// ID of the [`Deal`] to generate the [`deal::Contract`] for.
    pub deal_id: deal::Id,

    /// [`Actor`] generating the [`deal::Contract`].
    pub actor: Actor,
}

impl<Db, St> Command<GenerateDealContract> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<user::Id, User>, [user::Id; 2]>>,
            Ok = HashMap<user::Id, User>,
            Err = Traced<database::Error>,
        > + Database<Insert<deal::Audit>, Ok = (), Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<Deal, deal::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<deal::Contract>, deal::Id>>,
            Ok = Option<deal::Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<contract::Signed, contract::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<deal::Contract>, Err = Traced<database::Error>>
        + Database<Update<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    St: Storage<Store, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = deal::Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GenerateDealContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GenerateDealContract { deal_id, actor } = cmd;

        let deal = self
            .database()
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        if !actor.is_admin() && deal.party_of(&actor).is_none() {
            return Err(tracerr::new!(E::NotParticipant(actor.id)));
        }

        let period = deal
            .period()
            .filter(|_| deal.dates_confirmed)
            .ok_or(E::DatesNotConfirmed(deal_id))
            .map_err(tracerr::wrap!())?;

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(deal.listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(deal.listing_id))
            .map_err(tracerr::wrap!())?;

        let users = self
            .database()
            .execute(Select(By::new([deal.tenant_id, deal.landlord_id])))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let tenant = users
            .get(&deal.tenant_id)
            .ok_or(E::UserNotExists(deal.tenant_id))
            .map_err(tracerr::wrap!())?;
        let landlord = users
            .get(&deal.landlord_id)
            .ok_or(E::UserNotExists(deal.landlord_id))
            .map_err(tracerr::wrap!())?;

        let bytes = contract::Agreement {
            deal_id: deal.id,
            listing: &listing,
            tenant,
            landlord,
            period,
        }
        .compose();

        let created_at = DateTime::now().coerce();
        let unsigned_file = deal::FilePath::deal_scoped(
            deal.id,
            contract::unsigned_file_name(created_at, "txt"),
        );
        let digest = contract::Digest::of(&bytes);

        // The blob lands in the storage before the record is committed, so a
        // failed transaction can only orphan a file, never a record.
        self.storage()
            .execute(Store {
                location: Location::from(&unsigned_file),
                bytes,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Deal`.
        tx.execute(Lock(By::new(deal.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::<Option<deal::Contract>, _>::new(deal.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let generated = deal::Contract {
            id: existing
                .as_ref()
                .map_or_else(contract::Id::new, |e| e.id),
            deal_id: deal.id,
            unsigned_file,
            digest,
            created_at,
            created_by: actor.id,
        };

        if existing.is_some() {
            // The new unsigned artifact voids all recorded signatures.
            tx.execute(Delete(By::<contract::Signed, _>::new(generated.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Insert(generated.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;
        deal.touch();
        tx.execute(Update(deal))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.record_audit(
            deal_id,
            Some(actor.id),
            deal::audit::Action::contract_attached(),
            deal::audit::Meta::new(format!("sha256={}", generated.digest)),
        )
        .await;

        Ok(generated)
    }
}

/// Error of [`GenerateDealContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Rental period of the [`Deal`] is not confirmed yet.
    #[display(
        "`Deal(id: {_0})` has no confirmed rental period to contract upon"
    )]
    DatesNotConfirmed(#[error(not(source))] deal::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// [`Listing`] of the [`Deal`] does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// [`Actor`] is neither a participant of the [`Deal`] nor an
    /// administrator.
    #[display("`User(id: {_0})` is not a participant of the `Deal`")]
    NotParticipant(#[error(not(source))] user::Id),

    /// Blob [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("`Storage` operation failed: {_0}")]
    #[from]
    Storage(storage::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
