//! [`Command`] for changing the lifecycle status of a [`Deal`].

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
        user, Actor, Deal,
    },
    infra::{
        database,
        storage::{self, Exists, Load, Location, Store},
        Database, Storage,
    },
    Service,
};

use super::Command;

/// [`Command`] for changing the lifecycle [`deal::Status`] of a [`Deal`].
///
/// Moving into [`deal::Status::ReadyToSign`] requires a confirmed rental
/// period and attaches the unsigned [`deal::Contract`] from the stored
/// template within the same transaction: when attachment fails, the whole
/// transition is aborted and no status change persists.
#[derive(Clone, Copy, Debug)]
pub struct SetDealStatus {
    /// ID of the [`Deal`] to change the status of.
    pub deal_id: deal::Id,

    /// [`Actor`] changing the status.
    pub actor: Actor,

    /// [`deal::Status`] to transition the [`Deal`] into.
    pub status: deal::Status,
}

impl<Db, St> Command<SetDealStatus> for Service<Db, St>
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
    St: Storage<Exists, Ok = bool, Err = Traced<storage::Error>>
        + Storage<Load, Ok = Vec<u8>, Err = Traced<storage::Error>>
        + Storage<Store, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = Deal;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SetDealStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SetDealStatus {
            deal_id,
            actor,
            status,
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

        let mut attached = None;
        if status == deal::Status::ReadyToSign {
            if !deal.dates_confirmed || deal.period().is_none() {
                return Err(tracerr::new!(E::DatesNotConfirmed(deal_id)));
            }
            attached = Some(self.attach_from_template(&tx, &deal, actor).await?);
        }

        deal.status = status;
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

        if let Some(contract) = attached {
            self.record_audit(
                deal.id,
                Some(actor.id),
                deal::audit::Action::contract_attached_auto(),
                deal::audit::Meta::new(format!("sha256={}", contract.digest)),
            )
            .await;
        }
        self.record_audit(
            deal.id,
            Some(actor.id),
            deal::audit::Action::status_change(),
            deal::audit::Meta::new(format!("{old} -> {status}")),
        )
        .await;

        Ok(deal)
    }
}

impl<Db, St> Service<Db, St> {
    /// Ensures the [`Deal`] has an unsigned [`deal::Contract`] attached,
    /// copying the stored template artifact when it doesn't.
    ///
    /// A [`deal::Contract`] whose unsigned artifact is still present in the
    /// storage is returned as-is. A record whose artifact went missing is
    /// repaired in place, discarding signed copies recorded for it: they
    /// counter-signed bytes nobody can check anymore.
    async fn attach_from_template<Tx>(
        &self,
        tx: &Tx,
        deal: &Deal,
        actor: Actor,
    ) -> Result<deal::Contract, Traced<ExecutionError>>
    where
        Tx: Database<
                Select<By<Option<deal::Contract>, deal::Id>>,
                Ok = Option<deal::Contract>,
                Err = Traced<database::Error>,
            > + Database<
                Delete<By<contract::Signed, contract::Id>>,
                Err = Traced<database::Error>,
            > + Database<Insert<deal::Contract>, Err = Traced<database::Error>>,
        St: Storage<Exists, Ok = bool, Err = Traced<storage::Error>>
            + Storage<Load, Ok = Vec<u8>, Err = Traced<storage::Error>>
            + Storage<Store, Ok = (), Err = Traced<storage::Error>>,
    {
        use ExecutionError as E;

        let existing = tx
            .execute(Select(By::<Option<deal::Contract>, _>::new(deal.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(contract) = &existing {
            let intact = self
                .storage()
                .execute(Exists(Location::from(&contract.unsigned_file)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if intact {
                return Ok(contract.clone());
            }
        }

        let template = Location::contract_template();
        if !self
            .storage()
            .execute(Exists(template.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
        {
            return Err(tracerr::new!(E::TemplateMissing));
        }
        let bytes = self
            .storage()
            .execute(Load(template))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let created_at = DateTime::now().coerce();
        let unsigned_file = deal::FilePath::deal_scoped(
            deal.id,
            contract::unsigned_file_name(created_at, "pdf"),
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

        let contract = deal::Contract {
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
            // Repairing a broken record: its signed copies are void now.
            tx.execute(Delete(By::<contract::Signed, _>::new(contract.id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(contract)
    }
}

/// Error of [`SetDealStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Rental period of the [`Deal`] is not confirmed yet.
    #[display(
        "`Deal(id: {_0})` cannot be ready to sign without a confirmed \
         rental period"
    )]
    DatesNotConfirmed(#[error(not(source))] deal::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// Only an administrator may change a [`Deal`] status.
    #[display("`User(id: {_0})` is not an administrator")]
    NotAdmin(#[error(not(source))] user::Id),

    /// Blob [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("`Storage` operation failed: {_0}")]
    #[from]
    Storage(storage::Error),

    /// Contract template artifact is absent from the storage.
    #[display("contract template artifact is absent from the storage")]
    TemplateMissing,
}
