//! Domain entities definitions.

pub mod actor;
pub mod deal;
pub mod listing;
pub mod user;

pub use self::{
    actor::Actor, deal::Deal, listing::Listing, user::User,
};
