//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{
    command,
    domain::{deal, user},
    Command as _,
};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

/// Resolves the [`deal::Party`] the authenticated [`Session`] acts as.
fn party_of(session: &Session) -> Result<deal::Party, Error> {
    match session.role {
        user::Role::Tenant => Ok(deal::Party::Tenant),
        user::Role::Landlord => Ok(deal::Party::Landlord),
        user::Role::Admin => Err(api::PrivilegeError::Party.into()),
    }
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another
    ///                      `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUser",
            email = ?email,
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            role = ?role,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        role: api::user::Role,
        email: Option<api::user::Email>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                name: name.into(),
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                role: role.into(),
                email: email.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            role: output.user.role,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any
    ///                         `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            role: output.user.role,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new `Listing` with the provided details.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_LANDLORD` - the authenticated `User` is not a landlord.
    #[tracing::instrument(
        skip_all,
        fields(
            city = %city,
            gql.name = "createListing",
            kind = ?kind,
            otel.name = Self::SPAN_NAME,
            title = %title,
        ),
    )]
    pub async fn create_listing(
        title: api::listing::Title,
        city: api::listing::City,
        kind: api::listing::Kind,
        price: Money,
        description: Option<api::listing::Description>,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::CreateListing {
                actor,
                title: title.into(),
                city: city.into(),
                kind: kind.into(),
                price,
                description: description.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Listing` with every `Deal` opened over it.
    ///
    /// Administrative cleanup: uploaded documents, contracts and audit
    /// trails of the affected `Deal`s are removed irreversibly.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the authenticated `User` is not an administrator;
    /// - `LISTING_NOT_EXISTS` - `Listing` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteListing",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_listing(
        id: api::listing::Id,
        ctx: &Context,
    ) -> Result<bool, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::DeleteListing {
                listing_id: id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| true)
    }

    /// Reserves the `Listing`, opening a new `Deal`.
    ///
    /// Reserving an already reserved `Listing` returns the existing `Deal`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_TENANT` - the authenticated `User` is not a tenant;
    /// - `OWN_LISTING` - the `Listing` belongs to the authenticated `User`;
    /// - `LISTING_NOT_EXISTS` - `Listing` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "reserveDeal",
            listing_id = %listing_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reserve_deal(
        listing_id: api::listing::Id,
        note: Option<api::deal::TenantNote>,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::ReserveDeal {
                listing_id: listing_id.into(),
                actor,
                note: note.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Chooses the rental period of the `Deal`.
    ///
    /// Always resets the landlord's confirmation, even for an unchanged
    /// period.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DEAL_TENANT` - the authenticated `User` is not the tenant of
    ///                       the `Deal`;
    /// - `INVALID_PERIOD` - provided dates don't form a valid period;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %deal_id,
            end = %end,
            gql.name = "setDealDates",
            otel.name = Self::SPAN_NAME,
            start = %start,
        ),
    )]
    pub async fn set_deal_dates(
        deal_id: api::deal::Id,
        start: Date,
        end: Date,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::SetDealDates {
                deal_id: deal_id.into(),
                actor,
                start,
                end,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Confirms the rental period of the `Deal`.
    ///
    /// The landlord confirms the period the tenant chose; an administrator
    /// may confirm on the landlord's behalf.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DEAL_LANDLORD` - the authenticated `User` is neither the
    ///                         landlord of the `Deal` nor an administrator;
    /// - `DATES_NOT_SET` - the rental period is not chosen yet;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %deal_id,
            gql.name = "confirmDealDates",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_deal_dates(
        deal_id: api::deal::Id,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::ConfirmDealDates {
                deal_id: deal_id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Transitions the `Deal` into the provided `DealStatus`.
    ///
    /// Moving into `READY_TO_SIGN` requires a confirmed rental period and
    /// attaches the unsigned `DealContract` from the stored template; a
    /// failed attachment aborts the whole transition.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the authenticated `User` is not an administrator;
    /// - `DATES_NOT_CONFIRMED` - the rental period is not confirmed yet;
    /// - `TEMPLATE_MISSING` - the contract template artifact is absent from
    ///                        the storage;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %deal_id,
            gql.name = "setDealStatus",
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn set_deal_status(
        deal_id: api::deal::Id,
        status: api::deal::Status,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::SetDealStatus {
                deal_id: deal_id.into(),
                actor,
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `Deal`.
    ///
    /// Legal from any state; the reason is recorded in the audit trail.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the authenticated `User` is not an administrator;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %deal_id,
            gql.name = "cancelDeal",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_deal(
        deal_id: api::deal::Id,
        reason: Option<String>,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::CancelDeal {
                deal_id: deal_id.into(),
                actor,
                reason,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Uploads a `DealDocument` evidencing one requirement of the `Deal`.
    ///
    /// The party is derived from the authenticated `User` role. The first
    /// upload moves a freshly reserved `Deal` into `DOCS_PENDING`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DEAL_PARTY` - the authenticated `User` is not a party of the
    ///                      `Deal`;
    /// - `EMPTY_FILE` - no file content was provided;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            code = %code,
            deal_id = %deal_id,
            file_name = %file_name,
            gql.name = "uploadDealDocument",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn upload_deal_document(
        deal_id: api::deal::Id,
        code: api::deal::document::Code,
        file_name: String,
        file: api::scalar::Base64Bytes,
        ctx: &Context,
    ) -> Result<api::deal::Document, Error> {
        let session = ctx.current_session().await?;
        let actor = ctx.actor().await?;
        let party = party_of(&session).map_err(ctx.error())?;

        ctx.service()
            .execute(command::UploadDealDocument {
                deal_id: deal_id.into(),
                actor,
                party,
                code: code.into(),
                file_name,
                bytes: file.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reviews the `DealDocument`.
    ///
    /// Approving documents never advances the `Deal` status by itself:
    /// moving to `DOCS_VERIFIED` stays an explicit `setDealStatus` call.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the authenticated `User` is not an administrator;
    /// - `DOCUMENT_NOT_EXISTS` - `DealDocument` with the provided ID does
    ///                           not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            decision = ?decision,
            document_id = %document_id,
            gql.name = "reviewDealDocument",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn review_deal_document(
        document_id: api::deal::document::Id,
        decision: api::deal::document::ReviewDecision,
        note: Option<api::deal::document::Note>,
        ctx: &Context,
    ) -> Result<api::deal::Document, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::ReviewDealDocument {
                document_id: document_id.into(),
                actor,
                decision: decision.into(),
                note: note.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Generates the unsigned `DealContract` from the `Deal` data.
    ///
    /// Regenerating discards previously uploaded signed copies: a new
    /// unsigned artifact invalidates prior signatures.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DEAL_PARTICIPANT` - the authenticated `User` is neither a
    ///                            participant of the `Deal` nor an
    ///                            administrator;
    /// - `DATES_NOT_CONFIRMED` - the rental period is not confirmed yet;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %deal_id,
            gql.name = "generateDealContract",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn generate_deal_contract(
        deal_id: api::deal::Id,
        ctx: &Context,
    ) -> Result<api::deal::Contract, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::GenerateDealContract {
                deal_id: deal_id.into(),
                actor,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Uploads a signed counter copy of the `DealContract`.
    ///
    /// The party is derived from the authenticated `User` role. A repeated
    /// upload replaces the previous copy of that party.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_DEAL_PARTY` - the authenticated `User` is not a party of the
    ///                      `Deal`;
    /// - `CONTRACT_NOT_GENERATED` - the `Deal` has no contract yet;
    /// - `EMPTY_FILE` - no file content was provided;
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %deal_id,
            file_name = %file_name,
            gql.name = "uploadSignedDealContract",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn upload_signed_deal_contract(
        deal_id: api::deal::Id,
        file_name: String,
        file: api::scalar::Base64Bytes,
        ctx: &Context,
    ) -> Result<api::deal::contract::SignedCopy, Error> {
        let session = ctx.current_session().await?;
        let actor = ctx.actor().await?;
        let party = party_of(&session).map_err(ctx.error())?;

        ctx.service()
            .execute(command::UploadSignedDealContract {
                deal_id: deal_id.into(),
                actor,
                party,
                file_name,
                bytes: file.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum SessionError {
        #[code = "LOGIN_OCCUPIED"]
        #[status = BAD_REQUEST]
        #[message = "Provided `UserLogin` is occupied by another `User`"]
        LoginOccupied,

        #[code = "WRONG_CREDENTIALS"]
        #[status = FORBIDDEN]
        #[message = "Provided credentials does not match any `User`"]
        WrongCredentials,
    }
}

define_error! {
    enum ListingMutationError {
        #[code = "NOT_LANDLORD"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a landlord"]
        NotLandlord,
    }
}

define_error! {
    enum ReserveError {
        #[code = "NOT_TENANT"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a tenant"]
        NotTenant,

        #[code = "OWN_LISTING"]
        #[status = BAD_REQUEST]
        #[message = "Own `Listing` cannot be reserved"]
        OwnListing,
    }
}

define_error! {
    enum DatesError {
        #[code = "NOT_DEAL_TENANT"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be the tenant of the `Deal`"]
        NotDealTenant,

        #[code = "NOT_DEAL_LANDLORD"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be the landlord of the `Deal`"]
        NotDealLandlord,

        #[code = "INVALID_PERIOD"]
        #[status = BAD_REQUEST]
        #[message = "Provided dates don't form a valid rental period"]
        InvalidPeriod,

        #[code = "DATES_NOT_SET"]
        #[status = PRECONDITION_FAILED]
        #[message = "Rental period of the `Deal` is not chosen yet"]
        NotSet,

        #[code = "DATES_NOT_CONFIRMED"]
        #[status = PRECONDITION_FAILED]
        #[message = "Rental period of the `Deal` is not confirmed yet"]
        NotConfirmed,
    }
}

define_error! {
    enum ContractError {
        #[code = "TEMPLATE_MISSING"]
        #[status = FAILED_DEPENDENCY]
        #[message = "Contract template artifact is absent from the storage"]
        TemplateMissing,

        #[code = "CONTRACT_NOT_GENERATED"]
        #[status = PRECONDITION_FAILED]
        #[message = "The `Deal` has no contract to counter-sign yet"]
        NotGenerated,

        #[code = "NOT_DEAL_PARTICIPANT"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be a participant of the `Deal`"]
        NotParticipant,
    }
}

define_error! {
    enum UploadError {
        #[code = "EMPTY_FILE"]
        #[status = BAD_REQUEST]
        #[message = "No file content was provided"]
        EmptyFile,
    }
}

define_error! {
    enum DocumentError {
        #[code = "DOCUMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`DealDocument` does not exist"]
        NotExists,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(SessionError::LoginOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) | Self::UserNotExists(_) => None,
            Self::WrongCredentials => {
                Some(SessionError::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotLandlord(_) => {
                Some(ListingMutationError::NotLandlord.into())
            }
        }
    }
}

impl AsError for command::delete_listing::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => {
                Some(api::query::ListingError::NotExists.into())
            }
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
        }
    }
}

impl AsError for command::reserve_deal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ListingNotExists(_) => {
                Some(api::query::ListingError::NotExists.into())
            }
            Self::NotTenant(_) => Some(ReserveError::NotTenant.into()),
            Self::OwnListing(_) => Some(ReserveError::OwnListing.into()),
        }
    }
}

impl AsError for command::set_deal_dates::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::InvalidPeriod { .. } => {
                Some(DatesError::InvalidPeriod.into())
            }
            Self::NotDealTenant(_) => Some(DatesError::NotDealTenant.into()),
        }
    }
}

impl AsError for command::confirm_deal_dates::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::DatesNotSet(_) => Some(DatesError::NotSet.into()),
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::NotDealLandlord(_) => {
                Some(DatesError::NotDealLandlord.into())
            }
        }
    }
}

impl AsError for command::set_deal_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::DatesNotConfirmed(_) => {
                Some(DatesError::NotConfirmed.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
            Self::Storage(e) => e.try_as_error(),
            Self::TemplateMissing => {
                Some(ContractError::TemplateMissing.into())
            }
        }
    }
}

impl AsError for command::cancel_deal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
        }
    }
}

impl AsError for command::upload_deal_document::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::EmptyFile => Some(UploadError::EmptyFile.into()),
            Self::NotDealParty(_) => Some(api::PrivilegeError::Party.into()),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::review_deal_document::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::DocumentNotExists(_) => {
                Some(DocumentError::NotExists.into())
            }
            Self::NotAdmin(_) => Some(api::PrivilegeError::Admin.into()),
        }
    }
}

impl AsError for command::generate_deal_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::DatesNotConfirmed(_) => {
                Some(DatesError::NotConfirmed.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::ListingNotExists(_) | Self::UserNotExists(_) => None,
            Self::NotParticipant(_) => {
                Some(ContractError::NotParticipant.into())
            }
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::upload_signed_deal_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ContractNotGenerated(_) => {
                Some(ContractError::NotGenerated.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::EmptyFile => Some(UploadError::EmptyFile.into()),
            Self::NotDealParty(_) => Some(api::PrivilegeError::Party.into()),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}
