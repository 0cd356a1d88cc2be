//! Filesystem [`Storage`] implementation.

use std::{io, path::PathBuf};

use tracerr::Traced;

use crate::infra::storage::{self, Exists, Load, Location, Purge, Store};

use super::Storage;

/// [`Storage`] keeping blobs in a filesystem directory tree.
///
/// Every [`Location`] resolves to a path under the configured root, so the
/// whole store stays addressable by relative paths recorded in the database.
#[derive(Clone, Debug)]
pub struct Fs {
    /// Root directory of this [`Fs`] storage.
    root: PathBuf,
}

impl Fs {
    /// Creates a new [`Fs`] storage rooted at the provided directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the provided [`Location`] against the root of this [`Fs`].
    fn resolve(&self, location: &Location) -> PathBuf {
        self.root.join(AsRef::<str>::as_ref(location))
    }
}

impl Storage<Store> for Fs {
    type Ok = ();
    type Err = Traced<storage::Error>;

    async fn execute(&self, op: Store) -> Result<Self::Ok, Self::Err> {
        let Store { location, bytes } = op;

        let path = self.resolve(&location);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(tracerr::from_and_wrap!(=> storage::Error))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(tracerr::from_and_wrap!(=> storage::Error))
    }
}

impl Storage<Load> for Fs {
    type Ok = Vec<u8>;
    type Err = Traced<storage::Error>;

    async fn execute(&self, Load(location): Load) -> Result<Self::Ok, Self::Err> {
        tokio::fs::read(self.resolve(&location))
            .await
            .map_err(tracerr::from_and_wrap!(=> storage::Error))
    }
}

impl Storage<Exists> for Fs {
    type Ok = bool;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Exists(location): Exists,
    ) -> Result<Self::Ok, Self::Err> {
        match tokio::fs::metadata(self.resolve(&location)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(tracerr::new!(storage::Error::from(e))),
        }
    }
}

impl Storage<Purge> for Fs {
    type Ok = ();
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Purge(location): Purge,
    ) -> Result<Self::Ok, Self::Err> {
        match tokio::fs::remove_dir_all(self.resolve(&location)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(tracerr::new!(storage::Error::from(e))),
        }
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::deal;

    use super::{Exists, Fs, Load, Location, Purge, Storage as _, Store};

    fn storage(case: &str) -> Fs {
        let root = std::env::temp_dir()
            .join("deal-storage-tests")
            .join(case)
            .join(uuid::Uuid::new_v4().to_string());
        Fs::new(root)
    }

    #[tokio::test]
    async fn stores_and_loads_deal_scoped_blobs() {
        let fs = storage("store-load");
        let deal_id = deal::Id::new();
        let path = deal::FilePath::deal_scoped(deal_id, "passport.pdf");

        fs.execute(Store {
            location: Location::from(&path),
            bytes: b"scan".to_vec(),
        })
        .await
        .unwrap();

        assert!(fs.execute(Exists(Location::from(&path))).await.unwrap());
        assert_eq!(
            fs.execute(Load(Location::from(&path))).await.unwrap(),
            b"scan",
        );
    }

    #[tokio::test]
    async fn missing_blob_does_not_exist() {
        let fs = storage("missing");
        let location = Location::new("deals/nowhere/contract.pdf");

        assert!(!fs.execute(Exists(location.clone())).await.unwrap());
        assert!(fs.execute(Load(location)).await.is_err());
    }

    #[tokio::test]
    async fn purge_removes_whole_namespace_and_is_idempotent() {
        let fs = storage("purge");
        let deal_id = deal::Id::new();
        let path = deal::FilePath::deal_scoped(deal_id, "contract.pdf");

        fs.execute(Store {
            location: Location::from(&path),
            bytes: b"unsigned".to_vec(),
        })
        .await
        .unwrap();

        let namespace = Location::deal_namespace(deal_id);
        fs.execute(Purge(namespace.clone())).await.unwrap();
        assert!(!fs.execute(Exists(Location::from(&path))).await.unwrap());

        // Purging again is a no-op.
        fs.execute(Purge(namespace)).await.unwrap();
    }
}
