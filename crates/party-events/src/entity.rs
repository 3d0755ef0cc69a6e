//! Catalog Types
//!
//! The static entity records the party is populated from. The simulation only
//! ever reads these; nothing in the core mutates a catalog after loading.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Stable identifier of a catalog entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Where an entity is based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

/// One catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub rank: u32,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    pub location: Location,
    #[serde(default)]
    pub description: String,
    /// Free-text tags used for similarity and conversation content
    #[serde(default, alias = "majors")]
    pub tags: Vec<String>,
}

impl Entity {
    /// Creates a record with no description or tags.
    pub fn new(
        id: impl Into<String>,
        rank: u32,
        name: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            id: EntityId::new(id),
            rank,
            short_name: name.clone(),
            name,
            location: Location {
                city: city.into(),
                country: country.into(),
            },
            description: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Name used on labels; falls back to the full name.
    pub fn label(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }

    pub fn same_country(&self, other: &Entity) -> bool {
        self.location.country == other.location.country
    }

    pub fn rank_delta(&self, other: &Entity) -> u32 {
        self.rank.abs_diff(other.rank)
    }

    /// Tags both entities carry, in this entity's order.
    pub fn shared_tags<'a>(&'a self, other: &'a Entity) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| other.tags.contains(tag))
            .map(String::as_str)
    }
}

/// Errors that can occur while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error reading catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate entity id in catalog: {0}")]
    DuplicateId(EntityId),
    #[error("catalog contains no entities")]
    Empty,
}

/// Ordered, read-only list of entities.
#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Arc<[Entity]>,
}

impl Catalog {
    /// Builds a catalog, rejecting empty input and duplicate ids.
    pub fn new(entities: Vec<Entity>) -> Result<Self, CatalogError> {
        if entities.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for entity in &entities {
            if !seen.insert(&entity.id) {
                return Err(CatalogError::DuplicateId(entity.id.clone()));
            }
        }
        Ok(Self {
            entities: entities.into(),
        })
    }

    /// Parses a JSON array of entity records.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let entities: Vec<Entity> = serde_json::from_str(json)?;
        Self::new(entities)
    }

    /// The bundled twelve-entity university catalog.
    pub fn sample() -> Result<Self, CatalogError> {
        Self::from_json_str(include_str!("../data/sample_catalog.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}
