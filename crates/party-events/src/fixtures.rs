//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // party-events = { path = "../party-events", features = ["test-fixtures"] }
//!
//! use party_events::fixtures;
//!
//! let catalog = fixtures::sample_catalog();
//! let (a, b) = fixtures::similar_pair();
//! ```

use crate::{Catalog, Entity, EntityId};

/// Returns the bundled sample catalog.
///
/// Contains 12 universities across 6 countries, ranks 1-10 plus two
/// outliers (14 and 28) for rank-distance cases.
pub fn sample_catalog() -> Catalog {
    Catalog::sample().expect("Bundled sample catalog should parse")
}

/// Returns a specific entity by ID from the sample catalog.
pub fn get_entity(id: &str) -> Option<Entity> {
    sample_catalog().get(&EntityId::from(id)).cloned()
}

/// Two entities that share a country and a tag and are close in rank.
pub fn similar_pair() -> (Entity, Entity) {
    (
        Entity::new("alpha", 1, "Alpha University", "Boston", "USA")
            .with_tags(["Physics", "Law"]),
        Entity::new("beta", 2, "Beta Institute", "Austin", "USA").with_tags(["Physics", "Art"]),
    )
}

/// Two entities with nothing in common.
pub fn dissimilar_pair() -> (Entity, Entity) {
    (
        Entity::new("gamma", 3, "Gamma College", "Lyon", "France").with_tags(["Music"]),
        Entity::new("delta", 40, "Delta Polytechnic", "Osaka", "Japan").with_tags(["Robotics"]),
    )
}

/// A two-entity catalog built from [`similar_pair`].
pub fn pair_catalog() -> Catalog {
    let (a, b) = similar_pair();
    Catalog::new(vec![a, b]).expect("Fixture pair should be a valid catalog")
}
