//! Entity Store - hero attribute table keyed by name
//!
//! CSV → cleaned rows → `Roster` (canonical schema + heroes in source order)
//!
//! Rows with a missing or non-numeric required value are dropped, never
//! repaired. Duplicate names are resolved last-write-wins: the later row's
//! values replace the earlier ones while the hero keeps its first position.

mod export;
mod hero;
mod loader;
pub mod schema;

pub use export::write_clean_table;
pub use hero::Hero;
pub use loader::{load_roster, read_roster, LoadStats};
pub use schema::{AttributeSchema, CoreAttribute};

use rustc_hash::FxHashMap;

use crate::error::{CoreError, LoadError, Result};

#[derive(Debug, Clone)]
pub struct Roster {
    schema: AttributeSchema,
    heroes: Vec<Hero>,
    /// Name → position in `heroes`
    index: FxHashMap<String, usize>,
}

impl Roster {
    /// Create an empty roster over `schema`
    pub fn new(schema: AttributeSchema) -> Self {
        Self {
            schema,
            heroes: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Build a roster in memory, applying the same duplicate policy as the loader
    pub fn from_heroes(
        schema: AttributeSchema,
        heroes: impl IntoIterator<Item = Hero>,
    ) -> std::result::Result<Self, LoadError> {
        let mut roster = Self::new(schema);
        for hero in heroes {
            if hero.values().len() != roster.schema.width() {
                return Err(LoadError::SchemaWidth {
                    name: hero.name.clone(),
                    expected: roster.schema.width(),
                    found: hero.values().len(),
                });
            }
            roster.insert(hero);
        }
        Ok(roster)
    }

    /// Insert a hero. Returns `true` when an existing hero of the same name was replaced.
    pub(crate) fn insert(&mut self, hero: Hero) -> bool {
        match self.index.get(&hero.name) {
            Some(&pos) => {
                self.heroes[pos] = hero;
                true
            }
            None => {
                self.index.insert(hero.name.clone(), self.heroes.len());
                self.heroes.push(hero);
                false
            }
        }
    }

    pub fn schema(&self) -> &AttributeSchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Hero> {
        self.index.get(name).map(|&pos| &self.heroes[pos])
    }

    /// Exact, case-sensitive lookup
    pub fn require(&self, name: &str) -> Result<&Hero> {
        self.get(name).ok_or_else(|| CoreError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn heroes(&self) -> &[Hero] {
        &self.heroes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hero> {
        self.heroes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.heroes.iter().map(|h| h.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}
