/// Table specifications used by language pack files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::language::LanguageError;
use crate::core::name::NameError;
use crate::core::weighted::{equal_weights, WeightedSet};

/// Shared tables may reference each other; deeper chains are treated as cycles.
const MAX_SHARED_DEPTH: usize = 16;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown shared table '{name}'")]
    UnknownTable { name: String },
    #[error("shared table '{name}' references itself")]
    TableCycle { name: String },
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error(transparent)]
    Name(#[from] NameError),
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// A weighted string table as written in a pack file.
///
/// ```ron
/// Equal(terms: ["a", "e", "i"], blank: false)
/// Concat([Shared("adjectives"), Weighted([("grim", 2.0)])])
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TableSpec {
    Weighted(Vec<(String, f64)>),
    /// Every term at the same weight, optionally preceded by a blank entry.
    Equal {
        terms: Vec<String>,
        #[serde(default = "one")]
        weight: f64,
        #[serde(default = "yes")]
        blank: bool,
    },
    Shared(String),
    Concat(Vec<TableSpec>),
}

impl TableSpec {
    pub fn resolve(&self, shared: &SharedTables) -> Result<WeightedSet<String>, SchemaError> {
        self.resolve_at(shared, 0)
    }

    fn resolve_at(
        &self,
        shared: &SharedTables,
        depth: usize,
    ) -> Result<WeightedSet<String>, SchemaError> {
        match self {
            Self::Weighted(pairs) => Ok(WeightedSet::from_pairs(pairs.iter().cloned())),
            Self::Equal {
                terms,
                weight,
                blank,
            } => Ok(equal_weights(terms.iter().cloned(), *weight, *blank)),
            Self::Shared(name) => {
                if depth >= MAX_SHARED_DEPTH {
                    return Err(SchemaError::TableCycle { name: name.clone() });
                }
                shared
                    .get(name)
                    .ok_or_else(|| SchemaError::UnknownTable { name: name.clone() })?
                    .resolve_at(shared, depth + 1)
            }
            Self::Concat(specs) => {
                let mut set = WeightedSet::new();
                for spec in specs {
                    set = set + spec.resolve_at(shared, depth)?;
                }
                Ok(set)
            }
        }
    }
}

/// Named tables reused across packs, loaded from `defaults.ron`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedTables {
    tables: BTreeMap<String, TableSpec>,
}

impl SharedTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: TableSpec) {
        self.tables.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
