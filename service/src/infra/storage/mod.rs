//! Blob [`Storage`]-related implementations.

pub mod fs;

use derive_more::{AsRef, Display, Error as StdError, From};

use crate::domain::deal;

pub use self::fs::Fs;

/// Blob storage operation.
pub use common::Handler as Storage;

/// [`Storage`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Filesystem error.
    #[display("filesystem operation failed: {_0}")]
    Io(std::io::Error),
}

/// Relative location of a blob inside a [`Storage`].
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str, String)]
pub struct Location(String);

impl Location {
    /// Location of the bundled contract template artifact.
    pub const CONTRACT_TEMPLATE: &'static str =
        "templates/rental_agreement.pdf";

    /// Creates a new [`Location`] from the provided relative path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the [`Location`] of the contract template artifact.
    #[must_use]
    pub fn contract_template() -> Self {
        Self(Self::CONTRACT_TEMPLATE.into())
    }

    /// Returns the [`Location`] of the whole namespace of the [`deal::Deal`]
    /// with the provided ID.
    ///
    /// [`deal::Deal`]: crate::domain::Deal
    #[must_use]
    pub fn deal_namespace(deal_id: deal::Id) -> Self {
        Self(format!("deals/{deal_id}"))
    }
}

impl From<&deal::FilePath> for Location {
    fn from(path: &deal::FilePath) -> Self {
        Self(AsRef::<str>::as_ref(path).to_owned())
    }
}

/// Operation to store a blob at a [`Location`], creating missing parent
/// directories and overwriting any existing blob.
#[derive(Clone, Debug)]
pub struct Store {
    /// [`Location`] to store the blob at.
    pub location: Location,

    /// Bytes of the blob.
    pub bytes: Vec<u8>,
}

/// Operation to load blob bytes from a [`Location`].
#[derive(Clone, Debug)]
pub struct Load(pub Location);

/// Operation to check whether a blob exists at a [`Location`].
#[derive(Clone, Debug)]
pub struct Exists(pub Location);

/// Operation to recursively remove everything under a [`Location`].
///
/// Removing a missing [`Location`] is a no-op.
#[derive(Clone, Debug)]
pub struct Purge(pub Location);
