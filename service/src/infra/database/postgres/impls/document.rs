//! [`Document`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::deal::{self, document, Document},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Restores a [`Document`] from the provided [`Row`].
fn from_row(row: &Row) -> Document {
    Document {
        id: row.get("id"),
        deal_id: row.get("deal_id"),
        uploader_id: row.get("uploader_id"),
        party: row.get("party"),
        code: row.get("code"),
        file: row.get("file"),
        status: row.get("status"),
        note: row.get("note"),
        created_at: row.get("created_at"),
        reviewed_at: row.get("reviewed_at"),
        reviewed_by: row.get("reviewed_by"),
    }
}

/// Columns selected to restore a [`Document`].
const COLUMNS: &str = "\
    id, deal_id, uploader_id, party, code, file, \
    status, note, \
    created_at, reviewed_at, reviewed_by";

impl<C> Database<Select<By<Option<Document>, document::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Document>, document::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: document::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deal_documents \
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

impl<C> Database<Select<By<Vec<Document>, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Document>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let deal_id: deal::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM deal_documents \
             WHERE deal_id = $1::UUID \
             ORDER BY created_at DESC",
        );
        Ok(self
            .query(&sql, &[&deal_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Document>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Document>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(document): Insert<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(document))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Document>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(document): Update<Document>,
    ) -> Result<Self::Ok, Self::Err> {
        let Document {
            id,
            deal_id,
            uploader_id,
            party,
            code,
            file,
            status,
            note,
            created_at,
            reviewed_at,
            reviewed_by,
        } = document;

        const SQL: &str = "\
            INSERT INTO deal_documents (\
                id, deal_id, uploader_id, party, code, file, \
                status, note, \
                created_at, reviewed_at, reviewed_by\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT2, $5::VARCHAR, \
                $6::VARCHAR, \
                $7::INT2, $8::TEXT, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ, $11::UUID\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET status = EXCLUDED.status, \
                note = EXCLUDED.note, \
                reviewed_at = EXCLUDED.reviewed_at, \
                reviewed_by = EXCLUDED.reviewed_by";
        self.exec(
            SQL,
            &[
                &id,
                &deal_id,
                &uploader_id,
                &party,
                &code,
                &file,
                &status,
                &note,
                &created_at,
                &reviewed_at,
                &reviewed_by,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
