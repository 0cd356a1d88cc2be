//! GraphQL [`Query`]s definitions.

use common::pagination;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Default number of nodes in a list page.
    const DEFAULT_PAGE_SIZE: i32 = 20;
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "me",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn me(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;

        #[expect(
            unsafe_code,
            reason = "authenticated `User` is guaranteed to exist"
        )]
        Ok(unsafe { api::User::new_unchecked(my_id) })
    }

    /// Returns the `Listing` with the provided ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LISTING_NOT_EXISTS` - `Listing` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "listing",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn listing(
        id: api::listing::Id,
        ctx: &Context,
    ) -> Result<api::Listing, Error> {
        ctx.service()
            .execute(query::listing::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .map(Into::into)
            .ok_or_else(|| ctx.error()(ListingError::NotExists.into()))
    }

    /// Returns the `Deal` with the provided ID.
    ///
    /// Visible to administrators and the `Deal` participants only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEAL_NOT_EXISTS` - `Deal` with the provided ID does not exist;
    /// - `DEAL_ACCESS_DENIED` - authenticated `User` is not a participant of
    ///                          the `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deal",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn deal(
        id: api::deal::Id,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let actor = ctx.actor().await?;

        let deal = ctx
            .service()
            .execute(query::deal::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ctx.error()(DealError::NotExists.into()))?;

        if !deal.is_visible_to(&actor) {
            return Err(ctx.error()(DealError::AccessDenied.into()));
        }

        Ok(deal.into())
    }

    /// Lists `Deal`s the authenticated `User` participates in.
    ///
    /// Administrators list all `Deal`s. The list is optionally narrowed to
    /// a single `DealStatus`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deals",
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn deals(
        first: Option<i32>,
        after: Option<api::deal::list::Cursor>,
        last: Option<i32>,
        before: Option<api::deal::list::Cursor>,
        status: Option<api::deal::Status>,
        ctx: &Context,
    ) -> Result<api::deal::list::Connection, Error> {
        let actor = ctx.actor().await?;

        let arguments = pagination::Arguments::new(
            first,
            after.map(|c| c.0),
            last,
            before.map(|c| c.0),
            Self::DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| ctx.error()(api::PaginationError::Ambiguous.into()))?;

        let filter = read::deal::list::Filter {
            participant: (!actor.is_admin()).then_some(actor.id),
            status: status.map(Into::into),
        };

        let conn = ctx
            .service()
            .execute(query::deals::List::by(read::deal::list::Selector {
                arguments,
                filter,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(api::deal::list::Connection { conn, filter })
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` does not exist"]
        NotExists,
    }
}

define_error! {
    enum ListingError {
        #[code = "LISTING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Listing` does not exist"]
        NotExists,
    }
}

define_error! {
    enum DealError {
        #[code = "DEAL_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Deal` does not exist"]
        NotExists,

        #[code = "DEAL_ACCESS_DENIED"]
        #[status = FORBIDDEN]
        #[message = "`Deal` is not accessible to the authenticated `User`"]
        AccessDenied,
    }
}
