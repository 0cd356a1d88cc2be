//! [`Deal`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{deal, listing, user, Deal},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::{self, deal::Active},
};

/// Restores a [`Deal`] from the provided [`Row`].
fn from_row(row: &Row) -> Deal {
    Deal {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        tenant_id: row.get("tenant_id"),
        landlord_id: row.get("landlord_id"),
        created_by: row.get("created_by"),
        status: row.get("status"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        dates_confirmed: row.get("dates_confirmed"),
        admin_id: row.get("admin_id"),
        tenant_note: row.get("tenant_note"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Columns selected to restore a [`Deal`].
const COLUMNS: &str = "\
    id, listing_id, tenant_id, landlord_id, created_by, \
    status, start_date, end_date, dates_confirmed, \
    admin_id, tenant_note, \
    created_at, updated_at";

impl<C> Database<Select<By<Option<Deal>, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Deal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Deal>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: deal::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deals \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C>
    Database<
        Select<By<Option<Active<Deal>>, (listing::Id, user::Id, user::Id)>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Active<Deal>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Active<Deal>>, (listing::Id, user::Id, user::Id)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (listing_id, tenant_id, landlord_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deals \
             WHERE listing_id = $1::UUID \
                   AND tenant_id = $2::UUID \
                   AND landlord_id = $3::UUID \
                   AND status <> $4::INT2 \
             LIMIT 1",
        );
        Ok(self
            .query_opt(
                &sql,
                &[
                    &listing_id,
                    &tenant_id,
                    &landlord_id,
                    &deal::Status::Canceled,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(|row| Active(from_row(row))))
    }
}

impl<C> Database<Select<By<Vec<Deal>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Deal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Deal>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let listing_id: listing::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deals \
             WHERE listing_id = $1::UUID",
        );
        Ok(self
            .query(&sql, &[&listing_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Deal>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Deal>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(deal): Insert<Deal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(deal)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Deal>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(deal): Update<Deal>,
    ) -> Result<Self::Ok, Self::Err> {
        let Deal {
            id,
            listing_id,
            tenant_id,
            landlord_id,
            created_by,
            status,
            start_date,
            end_date,
            dates_confirmed,
            admin_id,
            tenant_note,
            created_at,
            updated_at,
        } = deal;

        const SQL: &str = "\
            INSERT INTO deals (\
                id, listing_id, tenant_id, landlord_id, created_by, \
                status, start_date, end_date, dates_confirmed, \
                admin_id, tenant_note, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT2, $7::DATE, $8::DATE, $9::BOOL, \
                $10::UUID, $11::TEXT, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                dates_confirmed = EXCLUDED.dates_confirmed, \
                admin_id = EXCLUDED.admin_id, \
                tenant_note = EXCLUDED.tenant_note, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &listing_id,
                &tenant_id,
                &landlord_id,
                &created_by,
                &status,
                &start_date,
                &end_date,
                &dates_confirmed,
                &admin_id,
                &tenant_note,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Deal, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Deal, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: deal::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO deals_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<Select<By<read::deal::list::Page, read::deal::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::deal::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::deal::list::Page, read::deal::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::deal::list::Selector {
            arguments,
            filter:
                read::deal::list::Filter {
                    participant,
                    status,
                },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let participant_idx = participant.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM deals \
             WHERE true \
                   {cursor} \
                   {participant_filtering} \
                   {status_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx
                .map(|i| {
                    format!(
                        "AND id {} ${i}::UUID",
                        arguments.kind().operator(),
                    )
                })
                .unwrap_or_default(),
            participant_filtering = participant_idx
                .map(|i| {
                    format!(
                        "AND (tenant_id = ${i}::UUID \
                              OR landlord_id = ${i}::UUID)",
                    )
                })
                .unwrap_or_default(),
            status_filtering = status_idx
                .map(|i| format!("AND status = ${i}::INT2"))
                .unwrap_or_default(),
            order = arguments.kind().order().sql(),
        );

        let mut rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        rows.truncate(arguments.limit());

        let edges = rows.into_iter().map(|row| {
            let id: deal::Id = row.get("id");
            (id, id)
        });

        Ok(read::deal::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<By<read::deal::list::TotalCount, read::deal::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::deal::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::deal::list::TotalCount, read::deal::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::deal::list::Filter {
            participant,
            status,
        } = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let participant_idx = participant.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });

        let sql = format!(
            "SELECT COUNT(*)::INT4 AS total \
             FROM deals \
             WHERE true \
                   {participant_filtering} \
                   {status_filtering}",
            participant_filtering = participant_idx
                .map(|i| {
                    format!(
                        "AND (tenant_id = ${i}::UUID \
                              OR landlord_id = ${i}::UUID)",
                    )
                })
                .unwrap_or_default(),
            status_filtering = status_idx
                .map(|i| format!("AND status = ${i}::INT2"))
                .unwrap_or_default(),
        );

        let row = self
            .query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(row
            .map(|row| row.get::<_, i32>("total"))
            .unwrap_or_default()
            .into())
    }
}
