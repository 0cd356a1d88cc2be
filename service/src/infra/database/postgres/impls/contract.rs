//! [`Contract`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::deal::{self, contract, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Contract>, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let deal_id: deal::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, deal_id, \
                   unsigned_file, digest, \
                   created_at, created_by \
            FROM deal_contracts \
            WHERE deal_id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&deal_id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Contract {
                id: row.get("id"),
                deal_id: row.get("deal_id"),
                unsigned_file: row.get("unsigned_file"),
                digest: row.get("digest"),
                created_at: row.get("created_at"),
                created_by: row.get("created_by"),
            }))
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            deal_id,
            unsigned_file,
            digest,
            created_at,
            created_by,
        } = contract;

        // At most one `Contract` per `Deal`: regenerating overwrites the row.
        const SQL: &str = "\
            INSERT INTO deal_contracts (\
                id, deal_id, \
                unsigned_file, digest, \
                created_at, created_by\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::VARCHAR, \
                $5::TIMESTAMPTZ, $6::UUID\
            ) \
            ON CONFLICT (deal_id) DO UPDATE \
            SET unsigned_file = EXCLUDED.unsigned_file, \
                digest = EXCLUDED.digest, \
                created_at = EXCLUDED.created_at, \
                created_by = EXCLUDED.created_by";
        self.exec(
            SQL,
            &[&id, &deal_id, &unsigned_file, &digest, &created_at, &created_by],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<contract::Signed>, contract::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<contract::Signed>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<contract::Signed>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, contract_id, party, \
                   file, digest, \
                   uploaded_at, uploader_id \
            FROM deal_contract_signed \
            WHERE contract_id = $1::UUID";
        Ok(self
            .query(SQL, &[&contract_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| contract::Signed {
                id: row.get("id"),
                contract_id: row.get("contract_id"),
                party: row.get("party"),
                file: row.get("file"),
                digest: row.get("digest"),
                uploaded_at: row.get("uploaded_at"),
                uploader_id: row.get("uploader_id"),
            })
            .collect())
    }
}

impl<C> Database<Insert<contract::Signed>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(signed): Insert<contract::Signed>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract::Signed {
            id,
            contract_id,
            party,
            file,
            digest,
            uploaded_at,
            uploader_id,
        } = signed;

        // At most one signed copy per (`Contract`, `Party`): a re-upload
        // replaces the previous record in place.
        const SQL: &str = "\
            INSERT INTO deal_contract_signed (\
                id, contract_id, party, \
                file, digest, \
                uploaded_at, uploader_id\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::INT2, \
                $4::VARCHAR, $5::VARCHAR, \
                $6::TIMESTAMPTZ, $7::UUID\
            ) \
            ON CONFLICT (contract_id, party) DO UPDATE \
            SET file = EXCLUDED.file, \
                digest = EXCLUDED.digest, \
                uploaded_at = EXCLUDED.uploaded_at, \
                uploader_id = EXCLUDED.uploader_id";
        self.exec(
            SQL,
            &[
                &id,
                &contract_id,
                &party,
                &file,
                &digest,
                &uploaded_at,
                &uploader_id,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<contract::Signed, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<contract::Signed, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM deal_contract_signed \
            WHERE contract_id = $1::UUID";
        self.exec(SQL, &[&contract_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
