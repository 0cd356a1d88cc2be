//! [`Command`] for uploading a signed [`deal::Contract`] copy.

use common::{
    operations::{
        By, Commit, Insert, Lock, Select, Transact, Transacted, Update,
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
        storage::{self, Location, Store},
        Database, Storage,
    },
    Service,
};

use super::Command;

/// [`Command`] for uploading a [`contract::Signed`] counter copy of the
/// [`deal::Contract`].
///
/// A party re-uploading its copy replaces the previous record in place: at
/// most one [`contract::Signed`] exists per ([`deal::Contract`],
/// [`deal::Party`]) pair.
#[derive(Clone, Debug)]
pub struct UploadSignedDealContract {
    /// ID of the [`Deal`] whose [`deal::Contract`] is counter-signed.
    pub deal_id: deal::Id,

    /// [`Actor`] uploading the signed copy.
    pub actor: Actor,

    /// [`deal::Party`] the copy is signed by.
    pub party: deal::Party,

    /// Original name of the uploaded file.
    pub file_name: String,

    /// Bytes of the uploaded file.
    pub bytes: Vec<u8>,
}

impl<Db, St> Command<UploadSignedDealContract> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<deal::Contract>, deal::Id>>,
            Ok = Option<deal::Contract>,
            Err = Traced<database::Error>,
        > + Database<Insert<deal::Audit>, Ok = (), Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<Deal, deal::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<Insert<contract::Signed>, Err = Traced<database::Error>>
        + Database<Update<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    St: Storage<Store, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = contract::Signed;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UploadSignedDealContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UploadSignedDealContract {
            deal_id,
            actor,
            party,
            file_name,
            bytes,
        } = cmd;

        let deal = self
            .database()
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        if deal.party_of(&actor) != Some(party) {
            return Err(tracerr::new!(E::NotDealParty(actor.id)));
        }

        let contract = self
            .database()
            .execute(Select(By::<Option<deal::Contract>, _>::new(deal.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotGenerated(deal_id))
            .map_err(tracerr::wrap!())?;

        if file_name.is_empty() || bytes.is_empty() {
            return Err(tracerr::new!(E::EmptyFile));
        }

        let uploaded_at = DateTime::now().coerce();
        let file = deal::FilePath::deal_scoped(
            deal.id,
            contract::signed_file_name(party, uploaded_at, &file_name),
        );
        let digest = contract::Digest::of(&bytes);

        // The blob lands in the storage before the record is committed, so a
        // failed transaction can only orphan a file, never a record.
        self.storage()
            .execute(Store {
                location: Location::from(&file),
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

        let signed = contract::Signed {
            id: contract::SignedId::new(),
            contract_id: contract.id,
            party,
            file,
            digest,
            uploaded_at,
            uploader_id: actor.id,
        };
        // Upserts over the (contract, party) pair, replacing a prior copy.
        tx.execute(Insert(signed.clone()))
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
            deal::audit::Action::contract_signed_upload(),
            deal::audit::Meta::new(format!(
                "party={}; sha256={}",
                party.to_string().to_lowercase(),
                signed.digest,
            )),
        )
        .await;

        Ok(signed)
    }
}

/// Error of [`UploadSignedDealContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`deal::Contract`] of the [`Deal`] is not generated yet.
    #[display("`Deal(id: {_0})` has no contract to counter-sign")]
    ContractNotGenerated(#[error(not(source))] deal::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// No file content was provided.
    #[display("no file content was provided")]
    EmptyFile,

    /// [`Actor`] is not the claimed [`deal::Party`] of the [`Deal`].
    #[display("`User(id: {_0})` is not the claimed party of the `Deal`")]
    NotDealParty(#[error(not(source))] user::Id),

    /// Blob [`Storage`] error.
    ///
    /// [`Storage`]: crate::infra::Storage
    #[display("`Storage` operation failed: {_0}")]
    #[from]
    Storage(storage::Error),
}
