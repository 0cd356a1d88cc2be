//! [`Command`] for uploading a [`deal::Document`].

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
        deal::{self, document},
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

/// [`Command`] for uploading a [`deal::Document`] evidencing one requirement
/// of a [`Deal`].
///
/// The first upload moves a freshly reserved [`Deal`] into
/// [`deal::Status::DocsPending`]; no other status is touched.
#[derive(Clone, Debug)]
pub struct UploadDealDocument {
    /// ID of the [`Deal`] to attach the [`deal::Document`] to.
    pub deal_id: deal::Id,

    /// [`Actor`] uploading the [`deal::Document`].
    pub actor: Actor,

    /// [`deal::Party`] the [`deal::Document`] evidences requirements of.
    pub party: deal::Party,

    /// [`document::Code`] of the evidenced requirement.
    pub code: document::Code,

    /// Original name of the uploaded file.
    pub file_name: String,

    /// Bytes of the uploaded file.
    pub bytes: Vec<u8>,
}

impl<Db, St> Command<UploadDealDocument> for Service<Db, St>
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
        > + Database<Insert<deal::Document>, Err = Traced<database::Error>>
        + Database<Update<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    St: Storage<Store, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = deal::Document;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UploadDealDocument,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UploadDealDocument {
            deal_id,
            actor,
            party,
            code,
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
        if file_name.is_empty() || bytes.is_empty() {
            return Err(tracerr::new!(E::EmptyFile));
        }

        let created_at = DateTime::now().coerce();
        let file = deal::FilePath::deal_scoped(
            deal.id,
            document::stored_file_name(party, &code, created_at, &file_name),
        );

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

        let mut deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        let document = deal::Document {
            id: document::Id::new(),
            deal_id: deal.id,
            uploader_id: actor.id,
            party,
            code: code.clone(),
            file: file.clone(),
            status: document::Status::Pending,
            note: None,
            created_at,
            reviewed_at: None,
            reviewed_by: None,
        };
        tx.execute(Insert(document.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if deal.status == deal::Status::Reserved {
            deal.status = deal::Status::DocsPending;
        }
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
            deal::audit::Action::doc_upload(),
            deal::audit::Meta::new(format!("type={code},file={file}")),
        )
        .await;

        Ok(document)
    }
}

/// Error of [`UploadDealDocument`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
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
