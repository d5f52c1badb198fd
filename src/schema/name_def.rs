/// Serializable name composer definition, as written in a pack file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::casing::Casing;
use crate::core::language::Language;
use crate::core::name::{NameComposer, PartSource, PartTables};
use crate::core::syllable::{NameSet, NameTemplate};
use crate::schema::language_def::{build_syllables, SyllableDef};
use crate::schema::tables::{SchemaError, SharedTables, TableSpec};

fn unit_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameTemplateDef {
    pub template: NameTemplate,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

/// Data form of [`PartSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PartDef {
    Base(String),
    Table(TableSpec),
    Grapheme(String),
    Literal(String),
    Concat(Vec<PartDef>),
    Cased(Casing, Box<PartDef>),
    Remove { chars: String, source: Box<PartDef> },
    /// The nested composer shares the pack's language.
    Place {
        composer: Box<NameComposerDef>,
        part: String,
    },
}

impl PartDef {
    pub fn build(
        &self,
        language: &Language,
        shared: &SharedTables,
    ) -> Result<PartSource, SchemaError> {
        Ok(match self {
            Self::Base(part) => PartSource::Base(part.to_lowercase()),
            Self::Table(spec) => PartSource::Table(spec.resolve(shared)?),
            Self::Grapheme(grapheme) => PartSource::Grapheme(grapheme.clone()),
            Self::Literal(text) => PartSource::Literal(text.clone()),
            Self::Concat(defs) => PartSource::Concat(
                defs.iter()
                    .map(|def| def.build(language, shared))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Cased(casing, def) => {
                PartSource::Cased(*casing, Box::new(def.build(language, shared)?))
            }
            Self::Remove { chars, source } => PartSource::Remove {
                chars: chars.clone(),
                source: Box::new(source.build(language, shared)?),
            },
            Self::Place { composer, part } => PartSource::Place {
                composer: Box::new(composer.build(language, shared)?),
                part: part.clone(),
            },
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameComposerDef {
    pub templates: Vec<NameTemplateDef>,
    /// Replaces the language's syllables for name words.
    #[serde(default)]
    pub syllables: Option<Vec<SyllableDef>>,
    #[serde(default)]
    pub minimum_grapheme_count: Option<usize>,
    #[serde(default)]
    pub strip_affixes: bool,
    #[serde(default)]
    pub names: Option<TableSpec>,
    #[serde(default)]
    pub surnames: Option<TableSpec>,
    #[serde(default)]
    pub nicknames: Option<TableSpec>,
    #[serde(default)]
    pub adjectives: Option<TableSpec>,
    #[serde(default)]
    pub titles: Option<TableSpec>,
    #[serde(default)]
    pub counts: Option<TableSpec>,
    #[serde(default)]
    pub affixes: Option<TableSpec>,
    #[serde(default)]
    pub suffixes: Option<TableSpec>,
    /// Part handler overrides, keyed by part type.
    #[serde(default)]
    pub parts: BTreeMap<String, PartDef>,
}

impl NameComposerDef {
    pub fn build(
        &self,
        language: &Language,
        shared: &SharedTables,
    ) -> Result<NameComposer, SchemaError> {
        let table = |spec: &Option<TableSpec>| spec.as_ref().map(|s| s.resolve(shared)).transpose();
        let tables = PartTables {
            names: table(&self.names)?,
            surnames: table(&self.surnames)?,
            nicknames: table(&self.nicknames)?,
            adjectives: table(&self.adjectives)?,
            titles: table(&self.titles)?,
            counts: table(&self.counts)?,
            affixes: table(&self.affixes)?,
            suffixes: table(&self.suffixes)?,
        };
        let templates = NameSet::from_pairs(
            self.templates
                .iter()
                .map(|def| (def.template.clone(), def.weight)),
        );

        let mut builder = NameComposer::builder(language)
            .templates(templates)
            .tables(tables);
        if self.strip_affixes {
            builder = builder.strip_affixes();
        }
        if let Some(syllables) = &self.syllables {
            builder = builder.syllables(build_syllables(syllables));
        }
        if let Some(count) = self.minimum_grapheme_count {
            builder = builder.minimum_grapheme_count(count);
        }
        for (part, def) in &self.parts {
            builder = builder.part(part, def.build(language, shared)?);
        }
        Ok(builder.build()?)
    }
}
