//! [`Command`] for choosing the rental period of a [`Deal`].

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{deal, user, Actor, Deal},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for choosing the rental [`deal::Period`] of a [`Deal`].
///
/// Choosing dates always withdraws a previously given landlord confirmation,
/// even when the chosen period is the same.
#[derive(Clone, Copy, Debug)]
pub struct SetDealDates {
    /// ID of the [`Deal`] to set the period on.
    pub deal_id: deal::Id,

    /// [`Actor`] choosing the period.
    pub actor: Actor,

    /// First day of the rental.
    pub start: Date,

    /// Last day of the rental.
    pub end: Date,
}

impl<Db, St> Command<SetDealDates> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<Insert<deal::Audit>, Ok = (), Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<Deal, deal::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<Update<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Deal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SetDealDates) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetDealDates {
            deal_id,
            actor,
            start,
            end,
        } = cmd;

        let deal = self
            .database()
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        if deal.party_of(&actor) != Some(deal::Party::Tenant) {
            return Err(tracerr::new!(E::NotDealTenant(actor.id)));
        }

        let period = deal::Period::new(start, end)
            .ok_or(E::InvalidPeriod { start, end })
            .map_err(tracerr::wrap!())?;

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

        let mut deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        deal.start_date = Some(period.start);
        deal.end_date = Some(period.end);
        // A changed period invalidates any prior confirmation.
        deal.dates_confirmed = false;
        deal.touch();

        tx.execute(Update(deal.clone()))
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
            deal::audit::Action::dates_set(),
            deal::audit::Meta::new(period.to_string()),
        )
        .await;

        Ok(deal)
    }
}

/// Error of [`SetDealDates`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// Provided dates don't form a valid [`deal::Period`].
    #[display("`{start}` is not before `{end}`")]
    InvalidPeriod {
        /// Provided first day of the rental.
        start: Date,

        /// Provided last day of the rental.
        end: Date,
    },

    /// Only the tenant of the [`Deal`] may choose its dates.
    #[display("`User(id: {_0})` is not the tenant of the `Deal`")]
    NotDealTenant(#[error(not(source))] user::Id),
}
