//! [`Command`] for reviewing a [`deal::Document`].

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
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for reviewing a [`deal::Document`].
///
/// Review never advances the [`Deal`] status: an administrator moves it to
/// [`deal::Status::DocsVerified`] explicitly once the whole set satisfies
/// them.
#[derive(Clone, Debug)]
pub struct ReviewDealDocument {
    /// ID of the [`deal::Document`] to review.
    pub document_id: document::Id,

    /// [`Actor`] reviewing the [`deal::Document`].
    pub actor: Actor,

    /// [`document::ReviewDecision`] taken.
    pub decision: document::ReviewDecision,

    /// Optional note for the uploader.
    pub note: Option<document::Note>,
}

impl<Db, St> Command<ReviewDealDocument> for Service<Db, St>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<deal::Document>, document::Id>>,
            Ok = Option<deal::Document>,
            Err = Traced<database::Error>,
        > + Database<Insert<deal::Audit>, Ok = (), Err = Traced<database::Error>>,
    Transacted<Db>: Database<Lock<By<Deal, deal::Id>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<Update<deal::Document>, Err = Traced<database::Error>>
        + Database<Update<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = deal::Document;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ReviewDealDocument,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReviewDealDocument {
            document_id,
            actor,
            decision,
            note,
        } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin(actor.id)));
        }

        let mut document = self
            .database()
            .execute(Select(By::<Option<deal::Document>, _>::new(document_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DocumentNotExists(document_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Deal`.
        tx.execute(Lock(By::new(document.deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(document.deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::DealNotExists(document.deal_id))
            .map_err(tracerr::wrap!())?;

        // All review fields are set together, or not at all.
        document.status = decision.into();
        document.note = note;
        document.reviewed_at = Some(DateTime::now().coerce());
        document.reviewed_by = Some(actor.id);

        deal.admin_id = Some(actor.id);
        deal.touch();

        tx.execute(Update(document.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Update(deal))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        self.record_audit(
            document.deal_id,
            Some(actor.id),
            deal::audit::Action::doc_review(),
            deal::audit::Meta::new(format!(
                "doc_id={document_id}, decision={}",
                decision.to_string().to_lowercase(),
            )),
        )
        .await;

        Ok(document)
    }
}

/// Error of [`ReviewDealDocument`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] of the reviewed [`deal::Document`] does not exist.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// [`deal::Document`] with the provided ID does not exist.
    #[display("`Document(id: {_0})` does not exist")]
    DocumentNotExists(#[error(not(source))] document::Id),

    /// Only an administrator may review a [`deal::Document`].
    #[display("`User(id: {_0})` is not an administrator")]
    NotAdmin(#[error(not(source))] user::Id),
}
