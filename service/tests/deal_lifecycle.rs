//! End-to-end checks of the deal lifecycle against in-memory infrastructure.
//!
//! Commands are generic over the `Database`/`Storage` operation traits, so
//! the whole lifecycle is drivable without a running Postgres: the `mem`
//! module implements the same operations over hash maps.

mod mem;

use common::Handler as _;
use service::{
    command::{
        self, CancelDeal, ConfirmDealDates, GenerateDealContract,
        ReserveDeal, ReviewDealDocument, SetDealDates, SetDealStatus,
        UploadDealDocument, UploadSignedDealContract,
    },
    domain::{deal, user},
};

use self::mem::TestBed;

#[tokio::test]
async fn reserving_own_listing_is_rejected() {
    let bed = TestBed::new();
    let service = bed.service();

    // The landlord also owning a tenant account over their own listing.
    let owner_tenant = bed.seed_user("owner", user::Role::Tenant);
    let listing_id = bed.seed_listing(owner_tenant.id);

    let result = service
        .execute(ReserveDeal {
            listing_id,
            actor: mem::actor(&owner_tenant),
            note: None,
        })
        .await;

    assert!(matches!(
        result.unwrap_err().as_ref(),
        command::reserve_deal::ExecutionError::OwnListing(_),
    ));
    assert_eq!(bed.deal_count(), 0);
}

#[tokio::test]
async fn reserving_requires_the_tenant_role() {
    let bed = TestBed::new();
    let service = bed.service();

    let result = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: mem::actor(&bed.landlord()),
            note: None,
        })
        .await;

    assert!(matches!(
        result.unwrap_err().as_ref(),
        command::reserve_deal::ExecutionError::NotTenant(_),
    ));
    assert_eq!(bed.deal_count(), 0);
}

#[tokio::test]
async fn repeated_reservation_returns_the_same_deal() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());

    let first = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();
    let second = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.status, deal::Status::Reserved);
    assert_eq!(bed.deal_count(), 1);
    // The idempotent retry records no second creation entry.
    assert_eq!(bed.audit_actions(first.id), vec!["deal_created"]);
}

#[tokio::test]
async fn canceled_deal_unblocks_re_reservation() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());
    let admin = mem::actor(&bed.admin());

    let first = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();
    let canceled = service
        .execute(CancelDeal {
            deal_id: first.id,
            actor: admin,
            reason: Some("listing withdrawn".into()),
        })
        .await
        .unwrap();
    assert_eq!(canceled.status, deal::Status::Canceled);

    let second = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(bed.deal_count(), 2);
}

#[tokio::test]
async fn setting_dates_always_withdraws_confirmation() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());
    let landlord = mem::actor(&bed.landlord());

    let deal = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();

    let start = "2025-06-01".parse().unwrap();
    let end = "2025-07-01".parse().unwrap();

    // Inverted period is rejected before any mutation.
    let inverted = service
        .execute(SetDealDates {
            deal_id: deal.id,
            actor: tenant,
            start: end,
            end: start,
        })
        .await;
    assert!(matches!(
        inverted.unwrap_err().as_ref(),
        command::set_deal_dates::ExecutionError::InvalidPeriod { .. },
    ));

    // Only the tenant of the deal may choose dates.
    let by_landlord = service
        .execute(SetDealDates {
            deal_id: deal.id,
            actor: landlord,
            start,
            end,
        })
        .await;
    assert!(matches!(
        by_landlord.unwrap_err().as_ref(),
        command::set_deal_dates::ExecutionError::NotDealTenant(_),
    ));

    let dated = service
        .execute(SetDealDates {
            deal_id: deal.id,
            actor: tenant,
            start,
            end,
        })
        .await
        .unwrap();
    assert!(!dated.dates_confirmed);

    let confirmed = service
        .execute(ConfirmDealDates {
            deal_id: deal.id,
            actor: landlord,
        })
        .await
        .unwrap();
    assert!(confirmed.dates_confirmed);

    // Re-choosing the very same period still drops the confirmation.
    let re_dated = service
        .execute(SetDealDates {
            deal_id: deal.id,
            actor: tenant,
            start,
            end,
        })
        .await
        .unwrap();
    assert!(!re_dated.dates_confirmed);
}

#[tokio::test]
async fn confirmation_requires_chosen_dates() {
    let bed = TestBed::new();
    let service = bed.service();

    let deal = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: mem::actor(&bed.tenant()),
            note: None,
        })
        .await
        .unwrap();

    for confirming in [bed.landlord(), bed.admin()] {
        let result = service
            .execute(ConfirmDealDates {
                deal_id: deal.id,
                actor: mem::actor(&confirming),
            })
            .await;
        assert!(matches!(
            result.unwrap_err().as_ref(),
            command::confirm_deal_dates::ExecutionError::DatesNotSet(_),
        ));
    }
}

#[tokio::test]
async fn ready_to_sign_is_gated_on_confirmed_dates() {
    let bed = TestBed::new();
    let service = bed.service();
    let admin = mem::actor(&bed.admin());

    let deal = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: mem::actor(&bed.tenant()),
            note: None,
        })
        .await
        .unwrap();

    let premature = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await;
    assert!(matches!(
        premature.unwrap_err().as_ref(),
        command::set_deal_status::ExecutionError::DatesNotConfirmed(_),
    ));
    assert_eq!(bed.deal(deal.id).status, deal::Status::Reserved);
    assert!(bed.contract(deal.id).is_none());
}

#[tokio::test]
async fn missing_template_aborts_the_whole_transition() {
    let bed = TestBed::without_template();
    let service = bed.service();
    let admin = mem::actor(&bed.admin());

    let deal = bed.reserved_deal_with_confirmed_dates(&service).await;

    let result = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await;

    assert!(matches!(
        result.unwrap_err().as_ref(),
        command::set_deal_status::ExecutionError::TemplateMissing,
    ));
    // The deal never lands in `ReadyToSign` without a contract.
    assert_ne!(bed.deal(deal.id).status, deal::Status::ReadyToSign);
    assert!(bed.contract(deal.id).is_none());
}

#[tokio::test]
async fn auto_attachment_is_idempotent() {
    let bed = TestBed::new();
    let service = bed.service();
    let admin = mem::actor(&bed.admin());

    let deal = bed.reserved_deal_with_confirmed_dates(&service).await;

    let _ = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await
        .unwrap();
    let first = bed.contract(deal.id).unwrap();

    // Re-entering `ReadyToSign` reuses the attached contract as-is.
    let _ = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await
        .unwrap();
    let second = bed.contract(deal.id).unwrap();

    assert_eq!(bed.contract_count(), 1);
    assert_eq!(first.id, second.id);
    assert_eq!(first.digest, second.digest);
    assert_eq!(first.unsigned_file, second.unsigned_file);
}

#[tokio::test]
async fn signed_copy_upload_replaces_the_previous_one() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());
    let admin = mem::actor(&bed.admin());

    let deal = bed.reserved_deal_with_confirmed_dates(&service).await;

    // No contract exists yet, nothing to counter-sign.
    let premature = service
        .execute(UploadSignedDealContract {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            file_name: "signed.pdf".into(),
            bytes: b"signed by tenant".to_vec(),
        })
        .await;
    assert!(matches!(
        premature.unwrap_err().as_ref(),
        command::upload_signed_deal_contract::ExecutionError::ContractNotGenerated(_),
    ));

    let _ = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await
        .unwrap();

    // A landlord cannot upload a copy on the tenant's behalf.
    let mismatched = service
        .execute(UploadSignedDealContract {
            deal_id: deal.id,
            actor: mem::actor(&bed.landlord()),
            party: deal::Party::Tenant,
            file_name: "signed.pdf".into(),
            bytes: b"signed by tenant".to_vec(),
        })
        .await;
    assert!(matches!(
        mismatched.unwrap_err().as_ref(),
        command::upload_signed_deal_contract::ExecutionError::NotDealParty(_),
    ));

    let first = service
        .execute(UploadSignedDealContract {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            file_name: "signed.pdf".into(),
            bytes: b"signed by tenant".to_vec(),
        })
        .await
        .unwrap();
    let second = service
        .execute(UploadSignedDealContract {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            file_name: "signed-fixed.pdf".into(),
            bytes: b"signed by tenant, fixed".to_vec(),
        })
        .await
        .unwrap();

    let contract = bed.contract(deal.id).unwrap();
    let copies = bed.signed_copies(contract.id);
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].digest, second.digest);
    assert_eq!(copies[0].file, second.file);
    assert_ne!(first.digest, second.digest);
}

#[tokio::test]
async fn regeneration_discards_recorded_signed_copies() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());
    let admin = mem::actor(&bed.admin());

    let deal = bed.reserved_deal_with_confirmed_dates(&service).await;
    let _ = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await
        .unwrap();
    let _ = service
        .execute(UploadSignedDealContract {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            file_name: "signed.pdf".into(),
            bytes: b"signed by tenant".to_vec(),
        })
        .await
        .unwrap();

    let regenerated = service
        .execute(GenerateDealContract {
            deal_id: deal.id,
            actor: admin,
        })
        .await
        .unwrap();

    assert_eq!(bed.contract_count(), 1);
    assert!(bed.signed_copies(regenerated.id).is_empty());
}

#[tokio::test]
async fn full_lifecycle_walkthrough() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());
    let landlord = mem::actor(&bed.landlord());
    let admin = mem::actor(&bed.admin());

    // Tenant reserves the listing.
    let deal = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: deal::TenantNote::new("relocating in June"),
        })
        .await
        .unwrap();
    assert_eq!(deal.status, deal::Status::Reserved);

    // First document upload advances the deal automatically.
    let document = service
        .execute(UploadDealDocument {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            code: deal::document::Code::new("passport").unwrap(),
            file_name: "passport.pdf".into(),
            bytes: b"passport scan".to_vec(),
        })
        .await
        .unwrap();
    assert_eq!(document.status, deal::document::Status::Pending);
    assert_eq!(bed.deal(deal.id).status, deal::Status::DocsPending);

    // Admin approves the document; the deal status stays untouched.
    let reviewed = service
        .execute(ReviewDealDocument {
            document_id: document.id,
            actor: admin,
            decision: deal::document::ReviewDecision::Approved,
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(reviewed.status, deal::document::Status::Approved);
    assert!(reviewed.reviewed_at.is_some());
    assert_eq!(reviewed.reviewed_by, Some(admin.id));
    assert_eq!(bed.deal(deal.id).status, deal::Status::DocsPending);
    assert_eq!(bed.deal(deal.id).admin_id, Some(admin.id));

    // Tenant chooses the period, the landlord confirms it.
    let dated = service
        .execute(SetDealDates {
            deal_id: deal.id,
            actor: tenant,
            start: "2025-06-01".parse().unwrap(),
            end: "2025-07-01".parse().unwrap(),
        })
        .await
        .unwrap();
    assert!(!dated.dates_confirmed);
    let confirmed = service
        .execute(ConfirmDealDates {
            deal_id: deal.id,
            actor: landlord,
        })
        .await
        .unwrap();
    assert!(confirmed.dates_confirmed);

    // Admin moves the deal to signing; the contract attaches on the way.
    let signing = service
        .execute(SetDealStatus {
            deal_id: deal.id,
            actor: admin,
            status: deal::Status::ReadyToSign,
        })
        .await
        .unwrap();
    assert_eq!(signing.status, deal::Status::ReadyToSign);

    let contract = bed.contract(deal.id).unwrap();
    assert_eq!(AsRef::<str>::as_ref(&contract.digest).len(), 64);
    assert!(bed.blob_exists(&contract.unsigned_file));

    let actions = bed.audit_actions(deal.id);
    let attach_pos = actions
        .iter()
        .position(|a| a == "contract_attached_auto")
        .unwrap();
    let change_pos = actions
        .iter()
        .position(|a| a == "status_change")
        .unwrap();
    assert!(attach_pos < change_pos);

    // Tenant uploads the very template bytes back: identical bytes must
    // produce the identical digest.
    let signed = service
        .execute(UploadSignedDealContract {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            file_name: "agreement.pdf".into(),
            bytes: mem::TEMPLATE_BYTES.to_vec(),
        })
        .await
        .unwrap();
    assert_eq!(signed.party, deal::Party::Tenant);
    assert_eq!(signed.digest, contract.digest);

    // Admin advances through payment to completion.
    for status in [
        deal::Status::ReadyToPay,
        deal::Status::Paid,
        deal::Status::Completed,
    ] {
        let advanced = service
            .execute(SetDealStatus {
                deal_id: deal.id,
                actor: admin,
                status,
            })
            .await
            .unwrap();
        assert_eq!(advanced.status, status);
    }

    // Every successful mutation left its trace.
    let actions = bed.audit_actions(deal.id);
    for expected in [
        "deal_created",
        "doc_upload",
        "doc_review",
        "dates_set",
        "dates_confirmed",
        "contract_attached_auto",
        "status_change",
        "contract_signed_upload",
    ] {
        assert!(
            actions.iter().any(|a| a == expected),
            "no `{expected}` entry in {actions:?}",
        );
    }
    assert_eq!(
        actions.iter().filter(|a| *a == "status_change").count(),
        4,
    );
}

#[tokio::test]
async fn document_upload_validates_party_and_content() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());

    let deal = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();

    // Claiming the landlord party with a tenant account is rejected.
    let mismatched = service
        .execute(UploadDealDocument {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Landlord,
            code: deal::document::Code::new("ownership_proof").unwrap(),
            file_name: "deed.pdf".into(),
            bytes: b"deed".to_vec(),
        })
        .await;
    assert!(matches!(
        mismatched.unwrap_err().as_ref(),
        command::upload_deal_document::ExecutionError::NotDealParty(_),
    ));

    // An empty upload is rejected before anything is stored.
    let empty = service
        .execute(UploadDealDocument {
            deal_id: deal.id,
            actor: tenant,
            party: deal::Party::Tenant,
            code: deal::document::Code::new("passport").unwrap(),
            file_name: "passport.pdf".into(),
            bytes: vec![],
        })
        .await;
    assert!(matches!(
        empty.unwrap_err().as_ref(),
        command::upload_deal_document::ExecutionError::EmptyFile,
    ));

    assert!(bed.documents(deal.id).is_empty());
    assert_eq!(bed.deal(deal.id).status, deal::Status::Reserved);
}

#[tokio::test]
async fn cancellation_is_admin_only_and_audited() {
    let bed = TestBed::new();
    let service = bed.service();
    let tenant = mem::actor(&bed.tenant());

    let deal = service
        .execute(ReserveDeal {
            listing_id: bed.listing_id(),
            actor: tenant,
            note: None,
        })
        .await
        .unwrap();

    let by_tenant = service
        .execute(CancelDeal {
            deal_id: deal.id,
            actor: tenant,
            reason: None,
        })
        .await;
    assert!(matches!(
        by_tenant.unwrap_err().as_ref(),
        command::cancel_deal::ExecutionError::NotAdmin(_),
    ));

    let canceled = service
        .execute(CancelDeal {
            deal_id: deal.id,
            actor: mem::actor(&bed.admin()),
            reason: Some("duplicate request".into()),
        })
        .await
        .unwrap();
    assert_eq!(canceled.status, deal::Status::Canceled);

    let trail = bed.audit_entries(deal.id);
    let entry = trail
        .iter()
        .find(|e| AsRef::<str>::as_ref(&e.action) == "deal_canceled")
        .unwrap();
    assert!(AsRef::<str>::as_ref(&entry.meta).contains("reason=duplicate request"));
    assert!(AsRef::<str>::as_ref(&entry.meta).starts_with("RESERVED -> CANCELED"));
}
