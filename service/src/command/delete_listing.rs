//! [`Command`] for deleting a [`Listing`] with all its [`Deal`]s.

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, user, Actor, Deal, Listing},
    infra::{
        database,
        storage::{self, Location, Purge},
        Database, Storage,
    },
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Listing`] with every [`Deal`] opened over
/// it.
///
/// Administrative cleanup: deletes the [`Listing`] row (its [`Deal`]s,
/// their documents, contracts, signed copies and audit trails cascade with
/// it), then purges each [`Deal`]'s blob namespace. Record deletion commits
/// first: a failed purge only orphans files, which is acceptable, while
/// records pointing at missing files are not.
#[derive(Clone, Copy, Debug)]
pub struct DeleteListing {
    /// ID of the [`Listing`] to delete.
    pub listing_id: listing::Id,

    /// [`Actor`] deleting the [`Listing`].
    pub actor: Actor,
}

impl<Db, St> Command<DeleteListing> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Listing>, listing::Id>>,
            Ok = Option<Listing>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Deal>, listing::Id>>,
            Ok = Vec<Deal>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Listing, listing::Id>>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<Listing, listing::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    St: Storage<Purge, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteListing { listing_id, actor } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin(actor.id)));
        }

        self.database()
            .execute(Select(By::<Option<Listing>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ListingNotExists(listing_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let deals = self
            .database()
            .execute(Select(By::<Vec<Deal>, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reservations of the deleted `Listing`.
        tx.execute(Lock(By::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Delete(By::<Listing, _>::new(listing_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        for deal in deals {
            if let Err(e) = self
                .storage()
                .execute(Purge(Location::deal_namespace(deal.id)))
                .await
            {
                tracing::warn!(
                    "failed to purge blobs of `Deal(id: {})`: {e}",
                    deal.id,
                );
            }
        }

        Ok(())
    }
}

/// Error of [`DeleteListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Listing`] with the provided ID does not exist.
    #[display("`Listing(id: {_0})` does not exist")]
    ListingNotExists(#[error(not(source))] listing::Id),

    /// Only an administrator may delete a [`Listing`].
    #[display("`User(id: {_0})` is not an administrator")]
    NotAdmin(#[error(not(source))] user::Id),
}
