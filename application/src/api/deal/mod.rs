//! [`Deal`]-related definitions.

pub mod audit;
pub mod contract;
pub mod document;

use std::future;

use common::{Date, DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

pub use self::{
    audit::AuditEntry, contract::Contract, document::Document,
};

/// Admin-mediated rental deal between a tenant and a landlord.
#[derive(Clone, Debug)]
pub struct Deal {
    /// ID of this [`Deal`].
    id: Id,

    /// Underlying [`domain::Deal`].
    deal: OnceCell<domain::Deal>,
}

impl From<domain::Deal> for Deal {
    fn from(deal: domain::Deal) -> Self {
        Self {
            id: deal.id.into(),
            deal: OnceCell::new_with(Some(deal)),
        }
    }
}

impl Deal {
    /// Creates a new [`Deal`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Deal`] with the provided ID exists,
    /// otherwise accessing this [`Deal`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            deal: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Deal`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Deal`] doesn't exist.
    async fn deal(&self, ctx: &Context) -> Result<&domain::Deal, Error> {
        let id = self.id.into();
        self.deal
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::deal::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|d| {
                        future::ready(d.ok_or_else(|| {
                            api::query::DealError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// Admin-mediated rental deal between a tenant and a landlord.
#[graphql_object(context = Context)]
impl Deal {
    /// Unique identifier of this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Listing` this `Deal` is about.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.listing",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn listing(&self, ctx: &Context) -> Result<api::Listing, Error> {
        let listing_id = self.deal(ctx).await?.listing_id;

        #[expect(
            unsafe_code,
            reason = "`Deal` existence guarantees its `Listing` existence"
        )]
        Ok(unsafe { api::Listing::new_unchecked(listing_id) })
    }

    /// `User` renting the `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.tenant",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn tenant(&self, ctx: &Context) -> Result<api::User, Error> {
        let tenant_id = self.deal(ctx).await?.tenant_id;

        #[expect(
            unsafe_code,
            reason = "`Deal` existence guarantees its tenant existence"
        )]
        Ok(unsafe { api::User::new_unchecked(tenant_id) })
    }

    /// `User` owning the `Listing`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.landlord",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn landlord(&self, ctx: &Context) -> Result<api::User, Error> {
        let landlord_id = self.deal(ctx).await?.landlord_id;

        #[expect(
            unsafe_code,
            reason = "`Deal` existence guarantees its landlord existence"
        )]
        Ok(unsafe { api::User::new_unchecked(landlord_id) })
    }

    /// Current lifecycle status of this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.deal(ctx).await?.status.into())
    }

    /// First day of the rental period, once chosen by the tenant.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.startDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn start_date(&self, ctx: &Context) -> Result<Option<Date>, Error> {
        Ok(self.deal(ctx).await?.start_date)
    }

    /// Last day of the rental period, once chosen by the tenant.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.endDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn end_date(&self, ctx: &Context) -> Result<Option<Date>, Error> {
        Ok(self.deal(ctx).await?.end_date)
    }

    /// Indicator whether the landlord has confirmed the rental period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.datesConfirmed",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn dates_confirmed(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.deal(ctx).await?.dates_confirmed)
    }

    /// Administrator assigned to this `Deal`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.admin",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn admin(&self, ctx: &Context) -> Result<Option<api::User>, Error> {
        let admin_id = self.deal(ctx).await?.admin_id;

        #[expect(
            unsafe_code,
            reason = "assigned administrator is always an existing `User`"
        )]
        Ok(admin_id.map(|id| unsafe { api::User::new_unchecked(id) }))
    }

    /// Free-form note the tenant left when reserving.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.tenantNote",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn tenant_note(
        &self,
        ctx: &Context,
    ) -> Result<Option<TenantNote>, Error> {
        Ok(self.deal(ctx).await?.tenant_note.clone().map(Into::into))
    }

    /// `DateTime` when this `Deal` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.deal(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Deal` was last updated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.deal(ctx).await?.updated_at.coerce())
    }

    /// Uploaded `DealDocument`s of this `Deal`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.documents",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn documents(
        &self,
        ctx: &Context,
    ) -> Result<Vec<Document>, Error> {
        ctx.service()
            .execute(query::deal::Documents::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|docs| docs.into_iter().map(Into::into).collect())
    }

    /// Audit trail of this `Deal`, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.auditTrail",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn audit_trail(
        &self,
        ctx: &Context,
    ) -> Result<Vec<AuditEntry>, Error> {
        ctx.service()
            .execute(query::deal::AuditTrail::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|entries| entries.into_iter().map(Into::into).collect())
    }

    /// Unsigned `DealContract` of this `Deal`, once attached.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.contract",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn contract(
        &self,
        ctx: &Context,
    ) -> Result<Option<Contract>, Error> {
        ctx.service()
            .execute(query::deal::Contract::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| c.map(Into::into))
    }
}

/// Unique identifier of a `Deal`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::deal::Id)]
#[into(domain::deal::Id)]
#[graphql(name = "DealId", transparent)]
pub struct Id(Uuid);

/// Lifecycle status of a `Deal`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DealStatus")]
pub enum Status {
    /// `Listing` is reserved, nothing has been submitted yet.
    Reserved,

    /// At least one `DealDocument` is uploaded, more are awaited.
    DocsPending,

    /// An administrator considers the documents sufficient.
    DocsVerified,

    /// Unsigned `DealContract` is attached, signatures are awaited.
    ReadyToSign,

    /// Both parties signed, payment is awaited.
    ReadyToPay,

    /// Payment is recorded.
    Paid,

    /// The rental is completed.
    Completed,

    /// The `Deal` is canceled.
    Canceled,
}

impl From<domain::deal::Status> for Status {
    fn from(status: domain::deal::Status) -> Self {
        use domain::deal::Status as S;
        match status {
            S::Reserved => Self::Reserved,
            S::DocsPending => Self::DocsPending,
            S::DocsVerified => Self::DocsVerified,
            S::ReadyToSign => Self::ReadyToSign,
            S::ReadyToPay => Self::ReadyToPay,
            S::Paid => Self::Paid,
            S::Completed => Self::Completed,
            S::Canceled => Self::Canceled,
        }
    }
}

impl From<Status> for domain::deal::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Reserved => Self::Reserved,
            Status::DocsPending => Self::DocsPending,
            Status::DocsVerified => Self::DocsVerified,
            Status::ReadyToSign => Self::ReadyToSign,
            Status::ReadyToPay => Self::ReadyToPay,
            Status::Paid => Self::Paid,
            Status::Completed => Self::Completed,
            Status::Canceled => Self::Canceled,
        }
    }
}

/// One of the two participants of a `Deal`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "DealParty")]
pub enum Party {
    /// The `User` renting the `Listing`.
    Tenant,

    /// The `User` owning the `Listing`.
    Landlord,
}

impl From<domain::deal::Party> for Party {
    fn from(party: domain::deal::Party) -> Self {
        use domain::deal::Party as P;
        match party {
            P::Tenant => Self::Tenant,
            P::Landlord => Self::Landlord,
        }
    }
}

impl From<Party> for domain::deal::Party {
    fn from(party: Party) -> Self {
        match party {
            Party::Tenant => Self::Tenant,
            Party::Landlord => Self::Landlord,
        }
    }
}

/// Free-form note a tenant leaves when reserving a `Listing`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealTenantNote",
    with = scalar::Via::<domain::deal::TenantNote>,
)]
pub struct TenantNote(domain::deal::TenantNote);

pub mod list {
    //! Definitions related to the [`Deal`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use crate::{api::scalar, AsError, Context, Error};

    use super::Deal;

    /// Cursor for the `Deal` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(super::Id, read::deal::list::Cursor)]
    #[graphql(
        name = "DealListCursor",
        with = scalar::Via::<read::deal::list::Cursor>,
    )]
    pub struct Cursor(pub read::deal::list::Cursor);

    /// Edge in the [`Deal`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::deal::list::Edge);

    /// Edge in the `Deal` list.
    #[graphql_object(name = "DealListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `DealListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `DealListEdge`.
        #[must_use]
        pub fn node(&self) -> Deal {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Deal` \
                          existence"
            )]
            unsafe {
                Deal::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Deal`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::deal::list::Connection`].
        pub(crate) conn: read::deal::list::Connection,

        /// Filter the [`Connection`] was selected with.
        pub(crate) filter: read::deal::list::Filter,
    }

    /// Connection of the `Deal` list.
    #[graphql_object(name = "DealListConnection", context = Context)]
    impl Connection {
        /// Edges in this `DealListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.conn.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.conn.page_info(),
                start_cursor: self.conn.edges.first().map(|e| e.cursor.into()),
                end_cursor: self.conn.edges.last().map(|e| e.cursor.into()),
                filter: self.filter,
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::deal::list::PageInfo`].
        info: read::deal::list::PageInfo,

        /// Start cursor of the page.
        start_cursor: Option<Cursor>,

        /// End cursor of the page.
        end_cursor: Option<Cursor>,

        /// Filter the page was selected with.
        filter: read::deal::list::Filter,
    }

    /// Information about a `DealListConnection` page.
    #[graphql_object(name = "DealListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.info.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.info.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> &Option<Cursor> {
            &self.start_cursor
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> &Option<Cursor> {
            &self.end_cursor
        }

        /// Total `Deal`s count matching the filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::deals::TotalCount::by(self.filter))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
