//! [`Audit`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::deal::{self, Audit},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Bound on the [`Audit`] trail length returned for a single [`deal::Deal`].
///
/// [`deal::Deal`]: crate::domain::Deal
const TRAIL_LIMIT: i64 = 200;

impl<C> Database<Select<By<Vec<Audit>, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Audit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Audit>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let deal_id: deal::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, deal_id, actor_id, \
                   action, meta, \
                   created_at \
            FROM deal_audit \
            WHERE deal_id = $1::UUID \
            ORDER BY created_at DESC \
            LIMIT $2::INT8";
        Ok(self
            .query(SQL, &[&deal_id, &TRAIL_LIMIT])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Audit {
                id: row.get("id"),
                deal_id: row.get("deal_id"),
                actor_id: row.get("actor_id"),
                action: row.get("action"),
                meta: row.get("meta"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

impl<C> Database<Insert<Audit>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(audit): Insert<Audit>,
    ) -> Result<Self::Ok, Self::Err> {
        let Audit {
            id,
            deal_id,
            actor_id,
            action,
            meta,
            created_at,
        } = audit;

        // Append-only: no `ON CONFLICT` clause on purpose.
        const SQL: &str = "\
            INSERT INTO deal_audit (\
                id, deal_id, actor_id, \
                action, meta, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::VARCHAR, $5::TEXT, \
                $6::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&id, &deal_id, &actor_id, &action, &meta, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
