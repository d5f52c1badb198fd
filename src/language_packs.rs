/// Language pack registry: maps a short language key to a built language,
/// its name composers and a description.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::core::language::Language;
use crate::core::name::NameComposer;
use crate::schema::language_def::LanguageDef;
use crate::schema::name_def::NameComposerDef;
use crate::schema::tables::{SchemaError, SharedTables};

/// File holding the shared tables, both embedded and in pack directories.
pub const DEFAULTS_FILE: &str = "defaults.ron";

// ---------------------------------------------------------------------------
// Built-in packs, compiled into the library
// ---------------------------------------------------------------------------
mod data {
    pub const DEFAULTS: &str = include_str!("../language_data/defaults.ron");

    pub const PACKS: &[(&str, &str)] = &[
        ("abyssal", include_str!("../language_data/abyssal.ron")),
        ("celestial", include_str!("../language_data/celestial.ron")),
        ("common", include_str!("../language_data/common.ron")),
        ("draconic", include_str!("../language_data/draconic.ron")),
        ("druidic", include_str!("../language_data/druidic.ron")),
        ("dwarvish", include_str!("../language_data/dwarvish.ron")),
        ("elvish", include_str!("../language_data/elvish.ron")),
        ("gnomish", include_str!("../language_data/gnomish.ron")),
        ("halfling", include_str!("../language_data/halfling.ron")),
        ("infernal", include_str!("../language_data/infernal.ron")),
        ("lizardfolk", include_str!("../language_data/lizardfolk.ron")),
        ("orcish", include_str!("../language_data/orcish.ron")),
        ("undercommon", include_str!("../language_data/undercommon.ron")),
    ];
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("language pack '{key}': {source}")]
    Pack {
        key: String,
        #[source]
        source: Box<RegistryError>,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("unknown language '{key}'; available: {}", .known.join(", "))]
    UnknownLanguage { key: String, known: Vec<String> },
}

/// A pack file as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagePackDef {
    pub description: String,
    pub language: LanguageDef,
    pub name: NameComposerDef,
    /// Falls back to `name` when absent.
    #[serde(default)]
    pub noble_name: Option<NameComposerDef>,
}

impl LanguagePackDef {
    pub fn build(&self, key: &str, shared: &SharedTables) -> Result<LanguagePack, SchemaError> {
        let language = self.language.build(shared)?;
        let name = self.name.build(&language, shared)?;
        let noble_name = self
            .noble_name
            .as_ref()
            .map(|def| def.build(&language, shared))
            .transpose()?;
        Ok(LanguagePack {
            key: key.to_string(),
            description: self.description.clone(),
            language,
            name,
            noble_name,
        })
    }
}

/// One registered language.
#[derive(Debug, Clone)]
pub struct LanguagePack {
    pub key: String,
    pub description: String,
    pub language: Language,
    pub name: NameComposer,
    noble_name: Option<NameComposer>,
}

impl LanguagePack {
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        language: Language,
        name: NameComposer,
        noble_name: Option<NameComposer>,
    ) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            language,
            name,
            noble_name,
        }
    }

    /// The noble composer, or the ordinary one when the pack has none.
    pub fn noble_name(&self) -> &NameComposer {
        self.noble_name.as_ref().unwrap_or(&self.name)
    }

    pub fn has_noble_variant(&self) -> bool {
        self.noble_name.is_some()
    }
}

/// Registry of language packs, keyed and iterated in key order.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    shared: SharedTables,
    packs: BTreeMap<String, LanguagePack>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry whose packs resolve `Shared(..)` against `shared`.
    pub fn with_shared_tables(shared: SharedTables) -> Self {
        Self {
            shared,
            packs: BTreeMap::new(),
        }
    }

    /// Every pack shipped with the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        let shared: SharedTables = ron::from_str(data::DEFAULTS)?;
        let mut registry = Self::with_shared_tables(shared);
        for (key, source) in data::PACKS {
            registry.load_from_ron(key, source)?;
        }
        Ok(registry)
    }

    /// Every `*.ron` pack in `dir`, sharing the tables in its `defaults.ron`
    /// (if present).
    pub fn load_dir(dir: &Path) -> Result<Self, RegistryError> {
        let defaults = dir.join(DEFAULTS_FILE);
        let shared = if defaults.is_file() {
            ron::from_str(&std::fs::read_to_string(&defaults)?)?
        } else {
            SharedTables::new()
        };
        let mut registry = Self::with_shared_tables(shared);

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "ron"))
            .filter(|path| path.file_name().is_some_and(|name| name != DEFAULTS_FILE))
            .collect();
        paths.sort();
        for path in paths {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let contents = std::fs::read_to_string(&path)?;
            registry.load_from_ron(key, &contents)?;
        }
        Ok(registry)
    }

    /// Parse, build and register one pack. Errors name the offending key.
    pub fn load_from_ron(&mut self, key: &str, input: &str) -> Result<(), RegistryError> {
        let wrap = |source: RegistryError| RegistryError::Pack {
            key: key.to_string(),
            source: Box::new(source),
        };
        let def: LanguagePackDef = ron::from_str(input).map_err(|e| wrap(e.into()))?;
        let pack = def
            .build(key, &self.shared)
            .map_err(|e| wrap(e.into()))?;
        self.register(pack);
        Ok(())
    }

    pub fn register(&mut self, pack: LanguagePack) {
        debug!(
            "Registered language pack '{}' (noble variant: {})",
            pack.key,
            pack.has_noble_variant()
        );
        self.packs.insert(pack.key.clone(), pack);
    }

    pub fn get(&self, key: &str) -> Option<&LanguagePack> {
        self.packs.get(key)
    }

    /// Like [`get`](Self::get), but unknown keys are an error listing the
    /// available ones.
    pub fn require(&self, key: &str) -> Result<&LanguagePack, RegistryError> {
        self.get(key).ok_or_else(|| RegistryError::UnknownLanguage {
            key: key.to_string(),
            known: self.keys().map(str::to_string).collect(),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.packs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguagePack> {
        self.packs.values()
    }

    pub fn shared_tables(&self) -> &SharedTables {
        &self.shared
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }
}
