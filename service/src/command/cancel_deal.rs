//! [`Command`] for canceling a [`Deal`].

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

/// [`Command`] for canceling a [`Deal`].
///
/// Legal from any state: cancellation is the administrator's escape hatch.
#[derive(Clone, Debug)]
pub struct CancelDeal {
    /// ID of the [`Deal`] to cancel.
    pub deal_id: deal::Id,

    /// [`Actor`] canceling the [`Deal`].
    pub actor: Actor,

    /// Reason of the cancellation, recorded in the audit trail.
    pub reason: Option<String>,
}

impl<Db, St> Command<CancelDeal> for Service<Db, St>
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

    async fn execute(&self, cmd: CancelDeal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelDeal {
            deal_id,
            actor,
            reason,
        } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin(actor.id)));
        }

        self.database()
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Deal`.
        tx.execute(Lock(By::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;
        let old = deal.status;

        deal.status = deal::Status::Canceled;
        deal.admin_id = Some(actor.id);
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
            deal::audit::Action::deal_canceled(),
            deal::audit::Meta::new(format!(
                "{old} -> {}; reason={}",
                deal::Status::Canceled,
                reason.as_deref().unwrap_or(""),
            )),
        )
        .await;

        Ok(deal)
    }
}

/// Error of [`CancelDeal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// Only an administrator may cancel a [`Deal`].
    #[display("`User(id: {_0})` is not an administrator")]
    NotAdmin(#[error(not(source))] user::Id),
}
