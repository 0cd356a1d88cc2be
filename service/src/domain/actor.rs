//! [`Actor`] definitions.

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{Deal, User};

/// Authenticated [`User`] performing an operation.
///
/// Carries everything authorization rules need, so every check is a pure
/// function of an [`Actor`] and the affected [`Deal`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor {
    /// ID of the authenticated [`User`].
    pub id: user::Id,

    /// [`user::Role`] of the authenticated [`User`].
    pub role: user::Role,
}

impl Actor {
    /// Indicates whether this [`Actor`] is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == user::Role::Admin
    }
}
