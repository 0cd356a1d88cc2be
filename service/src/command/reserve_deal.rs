//! [`Command`] for reserving a [`Listing`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{deal, listing, user, Actor, Deal, Listing},
    infra::{database, Database},
    read::deal::Active,
    Service,
};

use super::Command;

/// [`Command`] for reserving a [`Listing`], opening a new [`Deal`].
///
/// Reservation is idempotent: while a non-canceled [`Deal`] between the same
/// participants over the same [`Listing`] exists, reserving again returns it
/// instead of opening another one.
#[derive(Clone, Debug)]
pub struct ReserveDeal {
    /// ID of the [`Listing`] to reserve.
    pub listing_id: listing::Id,

    /// [`Actor`] reserving the [`Listing`].
    pub actor: Actor,

    /// Optional note for the landlord and administrators.
    pub note: Option<deal::TenantNote>,
}

impl<Db, St> Command<ReserveDeal> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<Option<Active<Deal>>, (listing::Id, user::Id, user::Id)>,
            >,
            Ok = Option<Active<Deal>>,
            Err = Traced<database::Error>,
        > + Database<Insert<deal::Audit>, Ok = (), Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<Option<Active<Deal>>, (listing::Id, user::Id, user::Id)>,
            >,
            Ok = Option<Active<Deal>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Deal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ReserveDeal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReserveDeal {
            listing_id,
            actor,
            note,
        } = cmd;

        if actor.role != user::Role::Tenant {
            return Err(tracerr::new!(E::NotTenant(actor.id)));
        }

        let listing = self
            .database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())?;
        if listing.owner_id == actor.id {
            return Err(tracerr::new!(E::OwnListing(listing_id)));
        }

        let participants = (listing.id, actor.id, listing.owner_id);
        if let Some(Active(existing)) = self
            .database()
            .execute(Select(By::<Option<Active<Deal>>, _>::new(participants)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Ok(existing);
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reservations of the same `Listing`.
        tx.execute(Lock(By::new(listing.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(Active(existing)) = tx
            .execute(Select(By::<Option<Active<Deal>>, _>::new(participants)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Ok(existing);
        }

        let deal = Deal {
            id: deal::Id::new(),
            listing_id: listing.id,
            tenant_id: actor.id,
            landlord_id: listing.owner_id,
            created_by: actor.id,
            status: deal::Status::Reserved,
            start_date: None,
            end_date: None,
            dates_confirmed: false,
            admin_id: None,
            tenant_note: note,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(deal.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.record_audit(
            deal.id,
            Some(actor.id),
            deal::audit::Action::deal_created(),
            deal::audit::Meta::new(format!("listing_id={listing_id}")),
        )
        .await;

        Ok(deal)
    }
}

/// Error of [`ReserveDeal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Only a tenant may reserve a [`Listing`].
    #[display("`User(id: {_0})` is not a tenant")]
    NotTenant(#[error(not(source))] user::Id),

    /// A [`Listing`] cannot be reserved by its own landlord.
    #[display("`Listing(id: {_0})` belongs to the reserving `User`")]
    OwnListing(#[error(not(source))] listing::Id),
}
