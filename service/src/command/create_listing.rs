//! [`Command`] for creating a new [`Listing`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{listing, user, Actor, Listing},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Listing`].
#[derive(Clone, Debug)]
pub struct CreateListing {
    /// [`Actor`] publishing the [`Listing`].
    pub actor: Actor,

    /// [`listing::Title`] of a new [`Listing`].
    pub title: listing::Title,

    /// [`listing::City`] of a new [`Listing`].
    pub city: listing::City,

    /// [`listing::Kind`] of a new [`Listing`].
    pub kind: listing::Kind,

    /// Monthly rent price of a new [`Listing`].
    pub price: Money,

    /// [`listing::Description`] of a new [`Listing`].
    pub description: Option<listing::Description>,
}

impl<Db, St> Command<CreateListing> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Listing>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Listing;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateListing,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateListing {
            actor,
            title,
            city,
            kind,
            price,
            description,
        } = cmd;

        if actor.role != user::Role::Landlord {
            return Err(tracerr::new!(E::NotLandlord(actor.id)));
        }

        let listing = Listing {
            id: listing::Id::new(),
            owner_id: actor.id,
            title,
            city,
            kind,
            price,
            description,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(listing.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(listing)
    }
}

/// Error of [`CreateListing`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Only a landlord may publish a [`Listing`].
    #[display("`User(id: {_0})` is not a landlord")]
    NotLandlord(#[error(not(source))] user::Id),
}
