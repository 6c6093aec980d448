//! Route fixtures
//!
//! Canned responses substituted for backend calls during a scenario, the
//! glob patterns that select them, and the typed bodies they carry.

mod pattern;
pub mod schema;
mod table;

pub use pattern::UrlPattern;
pub use table::{
    Fixture, FixtureAction, FixtureBody, FixtureResponse, FixtureTable, Resolution,
};
