//! [`Query`] collection related to multiple [`Deal`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Deal, Query};
use crate::read;

use super::DatabaseQuery;

/// Queries a list of [`Deal`]s.
pub type List =
    DatabaseQuery<By<read::deal::list::Page, read::deal::list::Selector>>;

/// Queries total count of [`Deal`]s matching a filter.
pub type TotalCount =
    DatabaseQuery<By<read::deal::list::TotalCount, read::deal::list::Filter>>;
