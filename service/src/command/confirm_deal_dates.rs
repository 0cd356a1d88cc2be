//! [`Command`] for confirming the rental period of a [`Deal`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{deal, user, Actor, Deal},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for confirming the rental [`deal::Period`] of a [`Deal`].
///
/// The landlord of the [`Deal`] confirms the period the tenant chose; an
/// administrator may confirm on the landlord's behalf.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmDealDates {
    /// ID of the [`Deal`] to confirm the period of.
    pub deal_id: deal::Id,

    /// [`Actor`] confirming the period.
    pub actor: Actor,
}

impl<Db, St> Command<ConfirmDealDates> for Service<Db, St>
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

    async fn execute(
        &self,
        cmd: ConfirmDealDates,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmDealDates { deal_id, actor } = cmd;

        let deal = self
            .database()
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        if !actor.is_admin()
            && deal.party_of(&actor) != Some(deal::Party::Landlord)
        {
            return Err(tracerr::new!(E::NotDealLandlord(actor.id)));
        }

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

        if deal.period().is_none() {
            return Err(tracerr::new!(E::DatesNotSet(deal_id)));
        }

        deal.dates_confirmed = true;
        deal.touch();

        tx.execute(Update(deal.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let by = if actor.is_admin() { "admin" } else { "landlord" };
        self.record_audit(
            deal.id,
            Some(actor.id),
            deal::audit::Action::dates_confirmed(),
            deal::audit::Meta::new(format!("by={by}")),
        )
        .await;

        Ok(deal)
    }
}

/// Error of [`ConfirmDealDates`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Rental period of the [`Deal`] is not chosen yet.
    #[display("`Deal(id: {_0})` has no rental period to confirm")]
    DatesNotSet(#[error(not(source))] deal::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// Only the landlord of the [`Deal`] or an administrator may confirm its
    /// rental period.
    #[display("`User(id: {_0})` is not the landlord of the `Deal`")]
    NotDealLandlord(#[error(not(source))] user::Id),
}
