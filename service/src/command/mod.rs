//! [`Command`] definition.

pub mod authorize_user_session;
pub mod cancel_deal;
pub mod confirm_deal_dates;
pub mod create_listing;
pub mod create_user;
pub mod create_user_session;
pub mod delete_listing;
pub mod generate_deal_contract;
pub mod reserve_deal;
pub mod review_deal_document;
pub mod set_deal_dates;
pub mod set_deal_status;
pub mod upload_deal_document;
pub mod upload_signed_deal_contract;

use common::{operations::Insert, DateTime};
use tracerr::Traced;

use crate::{
    domain::{deal, user},
    infra::{database, Database},
    Service,
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, cancel_deal::CancelDeal,
    confirm_deal_dates::ConfirmDealDates, create_listing::CreateListing,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_listing::DeleteListing,
    generate_deal_contract::GenerateDealContract, reserve_deal::ReserveDeal,
    review_deal_document::ReviewDealDocument, set_deal_dates::SetDealDates,
    set_deal_status::SetDealStatus, upload_deal_document::UploadDealDocument,
    upload_signed_deal_contract::UploadSignedDealContract,
};

impl<Db, St> Service<Db, St> {
    /// Records a [`deal::Audit`] entry, swallowing any persistence failure.
    ///
    /// Auditing is a secondary effect: it runs outside the primary
    /// transaction and its failure must never abort the business operation
    /// that triggered it, so errors are only logged here.
    pub(crate) async fn record_audit(
        &self,
        deal_id: deal::Id,
        actor_id: Option<user::Id>,
        action: deal::audit::Action,
        meta: deal::audit::Meta,
    ) where
        Db: Database<
            Insert<deal::Audit>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    {
        let entry = deal::Audit {
            id: deal::audit::Id::new(),
            deal_id,
            actor_id,
            action,
            meta,
            created_at: DateTime::now().coerce(),
        };
        if let Err(e) = self.database().execute(Insert(entry)).await {
            tracing::warn!("failed to record `deal::Audit` entry: {e}");
        }
    }
}
