//! [`Deal`] read model definitions.

#[cfg(doc)]
use crate::domain::Deal;

/// Wrapper around a [`Deal`] indicating that it is not canceled.
///
/// Only a canceled [`Deal`] stops counting towards the
/// one-active-deal-per-participants rule: a completed one still blocks
/// re-reservation.
#[derive(Clone, Debug)]
pub struct Active<T>(pub T);

pub mod list {
    //! [`Deal`]s list definitions.

    use std::ops;

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{deal, user};
    #[cfg(doc)]
    use crate::domain::{Deal, User};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = deal::Id;

    /// Cursor pointing to a specific [`Deal`] in a list.
    pub type Cursor = deal::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the [`User`] who must participate in the [`Deal`] as its
        /// tenant or landlord.
        ///
        /// [`None`] lists all [`Deal`]s (administrators only).
        pub participant: Option<user::Id>,

        /// [`deal::Status`] to narrow the list to.
        pub status: Option<deal::Status>,
    }

    /// Total count of [`Deal`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);

    impl ops::Div for TotalCount {
        type Output = f64;

        fn div(self, rhs: Self) -> Self::Output {
            f64::from(self.0) / f64::from(rhs.0)
        }
    }
}
