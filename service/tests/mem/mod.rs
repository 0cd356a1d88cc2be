//! In-memory `Database`/`Storage` implementations driving the lifecycle
//! tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Update,
    },
    DateTime, Handler, Money,
};
use service::{
    command::{ConfirmDealDates, ReserveDeal, SetDealDates},
    domain::{
        deal::{self, contract, document},
        listing, user, Actor, Deal, Listing, User,
    },
    infra::{
        database,
        storage::{self, Exists, Load, Location, Store},
    },
    read::deal::Active,
    Command as _, Config, Service,
};
use tracerr::Traced;

/// Bytes of the seeded contract template artifact.
pub const TEMPLATE_BYTES: &[u8] = b"%PDF-1.4 rental agreement template";

/// Builds an [`Actor`] acting as the provided [`User`].
pub fn actor(user: &User) -> Actor {
    Actor {
        id: user.id,
        role: user.role,
    }
}

/// Shared state of the in-memory database.
#[derive(Debug, Default)]
struct State {
    users: HashMap<user::Id, User>,
    listings: HashMap<listing::Id, Listing>,
    deals: HashMap<deal::Id, Deal>,
    documents: HashMap<document::Id, deal::Document>,
    contracts: HashMap<contract::Id, deal::Contract>,
    signed: Vec<contract::Signed>,
    audit: Vec<deal::Audit>,
}

/// In-memory database implementing the same operations as the Postgres
/// client.
///
/// Transactions are flattened: every operation applies immediately, which is
/// enough for the single-writer flows under test.
#[derive(Clone, Debug, Default)]
pub struct Mem(Arc<Mutex<State>>);

impl Mem {
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }
}

impl Handler<Transact> for Mem {
    type Ok = Mem;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Handler<Commit> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Deal, deal::Id>>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Deal, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Lock<By<Listing, listing::Id>>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Listing, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Option<Listing>, listing::Id>>> for Mem {
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().listings.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<Deal>, deal::Id>>> for Mem {
    type Ok = Option<Deal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Deal>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().deals.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<Active<Deal>>, (listing::Id, user::Id, user::Id)>>>
    for Mem
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
        Ok(self
            .state()
            .deals
            .values()
            .find(|d| {
                d.listing_id == listing_id
                    && d.tenant_id == tenant_id
                    && d.landlord_id == landlord_id
                    && d.status != deal::Status::Canceled
            })
            .cloned()
            .map(Active))
    }
}

impl Handler<Select<By<Option<deal::Document>, document::Id>>> for Mem {
    type Ok = Option<deal::Document>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<deal::Document>, document::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().documents.get(&by.into_inner()).cloned())
    }
}

impl Handler<Select<By<Option<deal::Contract>, deal::Id>>> for Mem {
    type Ok = Option<deal::Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<deal::Contract>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deal_id = by.into_inner();
        Ok(self
            .state()
            .contracts
            .values()
            .find(|c| c.deal_id == deal_id)
            .cloned())
    }
}

impl Handler<Select<By<HashMap<user::Id, User>, [user::Id; 2]>>> for Mem {
    type Ok = HashMap<user::Id, User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<user::Id, User>, [user::Id; 2]>>,
    ) -> Result<Self::Ok, Self::Err> {
        let state = self.state();
        Ok(by
            .into_inner()
            .into_iter()
            .filter_map(|id| state.users.get(&id).cloned().map(|u| (id, u)))
            .collect())
    }
}

impl Handler<Insert<Deal>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(deal): Insert<Deal>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().deals.insert(deal.id, deal));
        Ok(())
    }
}

impl Handler<Update<Deal>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(deal): Update<Deal>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().deals.insert(deal.id, deal));
        Ok(())
    }
}

impl Handler<Insert<deal::Document>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(document): Insert<deal::Document>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().documents.insert(document.id, document));
        Ok(())
    }
}

impl Handler<Update<deal::Document>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(document): Update<deal::Document>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().documents.insert(document.id, document));
        Ok(())
    }
}

impl Handler<Insert<deal::Contract>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<deal::Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        // Mirrors the `(deal_id)` upsert of the SQL implementation.
        state.contracts.retain(|_, c| c.deal_id != contract.deal_id);
        drop(state.contracts.insert(contract.id, contract));
        Ok(())
    }
}

impl Handler<Insert<contract::Signed>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(signed): Insert<contract::Signed>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        // Mirrors the `(contract_id, party)` upsert of the SQL
        // implementation.
        state
            .signed
            .retain(|s| {
                s.contract_id != signed.contract_id || s.party != signed.party
            });
        state.signed.push(signed);
        Ok(())
    }
}

impl Handler<Delete<By<contract::Signed, contract::Id>>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<contract::Signed, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let contract_id = by.into_inner();
        self.state().signed.retain(|s| s.contract_id != contract_id);
        Ok(())
    }
}

impl Handler<Insert<deal::Audit>> for Mem {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(audit): Insert<deal::Audit>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().audit.push(audit);
        Ok(())
    }
}

/// In-memory blob storage.
#[derive(Clone, Debug, Default)]
pub struct MemStorage(Arc<Mutex<HashMap<String, Vec<u8>>>>);

impl Handler<Store> for MemStorage {
    type Ok = ();
    type Err = Traced<storage::Error>;

    async fn execute(&self, op: Store) -> Result<Self::Ok, Self::Err> {
        let Store { location, bytes } = op;
        let key = (location.as_ref() as &str).to_owned();
        drop(self.0.lock().unwrap().insert(key, bytes));
        Ok(())
    }
}

impl Handler<Load> for MemStorage {
    type Ok = Vec<u8>;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Load(location): Load,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .lock()
            .unwrap()
            .get(location.as_ref() as &str)
            .cloned()
            .ok_or_else(|| {
                tracerr::new!(storage::Error::from(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such blob",
                )))
            })
    }
}

impl Handler<Exists> for MemStorage {
    type Ok = bool;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Exists(location): Exists,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .contains_key(location.as_ref() as &str))
    }
}

/// Pre-seeded in-memory environment for driving a deal lifecycle.
#[derive(Debug)]
pub struct TestBed {
    db: Mem,
    storage: MemStorage,
    tenant: User,
    landlord: User,
    admin: User,
    listing_id: listing::Id,
}

impl TestBed {
    /// Creates a new [`TestBed`] with a tenant, a landlord with one listing,
    /// an administrator and the contract template in place.
    pub fn new() -> Self {
        let bed = Self::without_template();
        drop(bed.storage.0.lock().unwrap().insert(
            Location::CONTRACT_TEMPLATE.to_owned(),
            TEMPLATE_BYTES.to_vec(),
        ));
        bed
    }

    /// Creates a new [`TestBed`] whose storage misses the contract template.
    pub fn without_template() -> Self {
        let db = Mem::default();
        let storage = MemStorage::default();

        let mut bed = Self {
            db,
            storage,
            tenant: seed_user_record("tenant", user::Role::Tenant),
            landlord: seed_user_record("landlord", user::Role::Landlord),
            admin: seed_user_record("admin", user::Role::Admin),
            listing_id: listing::Id::new(),
        };
        for user in [&bed.tenant, &bed.landlord, &bed.admin] {
            drop(bed.db.state().users.insert(user.id, user.clone()));
        }
        bed.listing_id = bed.seed_listing(bed.landlord.id);
        bed
    }

    /// Builds a [`Service`] over this [`TestBed`]'s infrastructure.
    pub fn service(&self) -> Service<Mem, MemStorage> {
        Service::new(
            Config {
                jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                    b"test",
                ),
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    b"test",
                ),
            },
            self.db.clone(),
            self.storage.clone(),
        )
    }

    /// Seeds a new [`User`] with the provided login and [`user::Role`].
    pub fn seed_user(&self, login: &str, role: user::Role) -> User {
        let user = seed_user_record(login, role);
        drop(self.db.state().users.insert(user.id, user.clone()));
        user
    }

    /// Seeds a new [`Listing`] owned by the provided [`User`].
    pub fn seed_listing(&self, owner_id: user::Id) -> listing::Id {
        let listing = Listing {
            id: listing::Id::new(),
            owner_id,
            title: listing::Title::new("Sunny flat").unwrap(),
            city: listing::City::new("Berlin").unwrap(),
            kind: listing::Kind::Apartment,
            price: "950EUR".parse::<Money>().unwrap(),
            description: None,
            created_at: DateTime::now().coerce(),
        };
        let id = listing.id;
        drop(self.db.state().listings.insert(id, listing));
        id
    }

    /// Drives a fresh [`Deal`] up to a confirmed rental period.
    pub async fn reserved_deal_with_confirmed_dates(
        &self,
        service: &Service<Mem, MemStorage>,
    ) -> Deal {
        let deal = service
            .execute(ReserveDeal {
                listing_id: self.listing_id,
                actor: actor(&self.tenant),
                note: None,
            })
            .await
            .unwrap();
        let _ = service
            .execute(SetDealDates {
                deal_id: deal.id,
                actor: actor(&self.tenant),
                start: "2025-06-01".parse().unwrap(),
                end: "2025-07-01".parse().unwrap(),
            })
            .await
            .unwrap();
        service
            .execute(ConfirmDealDates {
                deal_id: deal.id,
                actor: actor(&self.landlord),
            })
            .await
            .unwrap()
    }

    /// Returns the seeded tenant.
    pub fn tenant(&self) -> User {
        self.tenant.clone()
    }

    /// Returns the seeded landlord.
    pub fn landlord(&self) -> User {
        self.landlord.clone()
    }

    /// Returns the seeded administrator.
    pub fn admin(&self) -> User {
        self.admin.clone()
    }

    /// Returns ID of the seeded [`Listing`].
    pub fn listing_id(&self) -> listing::Id {
        self.listing_id
    }

    /// Returns the current number of [`Deal`]s.
    pub fn deal_count(&self) -> usize {
        self.db.state().deals.len()
    }

    /// Returns the [`Deal`] with the provided ID.
    pub fn deal(&self, id: deal::Id) -> Deal {
        self.db.state().deals.get(&id).cloned().unwrap()
    }

    /// Returns the [`deal::Contract`] of the provided [`Deal`], if any.
    pub fn contract(&self, deal_id: deal::Id) -> Option<deal::Contract> {
        self.db
            .state()
            .contracts
            .values()
            .find(|c| c.deal_id == deal_id)
            .cloned()
    }

    /// Returns the current number of [`deal::Contract`]s.
    pub fn contract_count(&self) -> usize {
        self.db.state().contracts.len()
    }

    /// Returns all [`contract::Signed`] copies of the provided contract.
    pub fn signed_copies(
        &self,
        contract_id: contract::Id,
    ) -> Vec<contract::Signed> {
        self.db
            .state()
            .signed
            .iter()
            .filter(|s| s.contract_id == contract_id)
            .cloned()
            .collect()
    }

    /// Returns all [`deal::Document`]s of the provided [`Deal`].
    pub fn documents(&self, deal_id: deal::Id) -> Vec<deal::Document> {
        self.db
            .state()
            .documents
            .values()
            .filter(|d| d.deal_id == deal_id)
            .cloned()
            .collect()
    }

    /// Returns [`deal::Audit`] entries of the provided [`Deal`] in
    /// chronological order.
    pub fn audit_entries(&self, deal_id: deal::Id) -> Vec<deal::Audit> {
        self.db
            .state()
            .audit
            .iter()
            .filter(|a| a.deal_id == deal_id)
            .cloned()
            .collect()
    }

    /// Returns action tags of the provided [`Deal`]'s audit trail in
    /// chronological order.
    pub fn audit_actions(&self, deal_id: deal::Id) -> Vec<String> {
        self.audit_entries(deal_id)
            .into_iter()
            .map(|a| a.action.to_string())
            .collect()
    }

    /// Indicates whether a blob exists at the provided path.
    pub fn blob_exists(&self, path: &deal::FilePath) -> bool {
        self.storage
            .0
            .lock()
            .unwrap()
            .contains_key(path.as_ref() as &str)
    }
}

/// Builds a [`User`] record with the provided login and [`user::Role`].
fn seed_user_record(login: &str, role: user::Role) -> User {
    User {
        id: user::Id::new(),
        name: user::Name::new(login).unwrap(),
        login: user::Login::new(login).unwrap(),
        password_hash: user::PasswordHash::new(
            &user::Password::new("secret").unwrap(),
        ),
        role,
        email: None,
        created_at: DateTime::now().coerce(),
        deleted_at: None,
    }
}
