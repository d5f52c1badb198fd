/// Name composition: assembles full names from name templates, a private
/// copy of a language, and optional per-part tables.

use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

use crate::core::casing::{title_case, Casing};
use crate::core::language::{Language, LanguageError};
use crate::core::syllable::{NameSet, SyllableSet};
use crate::core::weighted::{WeightedError, WeightedSet};

/// Part types with a built-in behaviour.
pub const BASE_PARTS: [&str; 9] = [
    "adjective",
    "affix",
    "count",
    "initial",
    "name",
    "nickname",
    "surname",
    "the",
    "title",
];

#[derive(Debug, Error)]
pub enum NameError {
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error("{table}: {source}")]
    Weighted {
        table: String,
        #[source]
        source: WeightedError,
    },
    #[error("no handler found for name part '{name}'; supported parts: {}", .known.join(", "))]
    UnknownNamePart { name: String, known: Vec<String> },
    #[error("nested name composer produced no '{part}'")]
    MissingPart { part: String },
}

/// One generated name.
///
/// `parts` maps each part type to the values generated for it, in template
/// order; empty parts are omitted everywhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Name {
    parts: FxHashMap<String, Vec<String>>,
    fullname: String,
}

impl Name {
    pub fn get(&self, part: &str) -> &[String] {
        self.parts.get(part).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, part: &str) -> Option<&str> {
        self.get(part).first().map(String::as_str)
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    fn push(&mut self, part: &str, value: String) {
        if !self.fullname.is_empty() {
            self.fullname.push(' ');
        }
        self.fullname.push_str(&value);
        self.parts.entry(part.to_string()).or_default().push(value);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname)
    }
}

pub type PartFn = dyn Fn(&NameComposer, &mut StdRng) -> Result<String, NameError> + Send + Sync;

#[derive(Clone)]
pub struct CustomPart {
    name: String,
    generate: Arc<PartFn>,
}

impl fmt::Debug for CustomPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPart").field("name", &self.name).finish()
    }
}

/// Where the value of a name part comes from.
#[derive(Debug, Clone)]
pub enum PartSource {
    /// The built-in behaviour of a base part, e.g. `Base("surname")`.
    Base(String),
    Table(WeightedSet<String>),
    /// One resolved grapheme of the composer's language.
    Grapheme(String),
    Literal(String),
    Concat(Vec<PartSource>),
    Cased(Casing, Box<PartSource>),
    /// Drop every occurrence of `chars` from the inner value.
    Remove { chars: String, source: Box<PartSource> },
    /// First value of `part` in a name from a nested composer.
    Place { composer: Box<NameComposer>, part: String },
    Custom(CustomPart),
}

impl PartSource {
    pub fn custom(
        name: impl Into<String>,
        generate: impl Fn(&NameComposer, &mut StdRng) -> Result<String, NameError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self::Custom(CustomPart {
            name: name.into(),
            generate: Arc::new(generate),
        })
    }

    fn generate(&self, composer: &NameComposer, rng: &mut StdRng) -> Result<String, NameError> {
        match self {
            Self::Base(part) => composer.base_part(part, rng),
            Self::Table(table) => sample("part table", Some(table), rng),
            Self::Grapheme(grapheme) => Ok(composer.language.resolve(grapheme, rng)?),
            Self::Literal(text) => Ok(text.clone()),
            Self::Concat(sources) => {
                let mut out = String::new();
                for source in sources {
                    out.push_str(&source.generate(composer, rng)?);
                }
                Ok(out)
            }
            Self::Cased(casing, source) => Ok(casing.apply(&source.generate(composer, rng)?)),
            Self::Remove { chars, source } => {
                let value = source.generate(composer, rng)?;
                Ok(value.chars().filter(|c| !chars.contains(*c)).collect())
            }
            Self::Place { composer: nested, part } => {
                let name = nested.generate_name(rng)?;
                name.first(part)
                    .map(str::to_string)
                    .ok_or_else(|| NameError::MissingPart { part: part.clone() })
            }
            Self::Custom(custom) => (custom.generate)(composer, rng),
        }
    }

    /// Part types this source delegates to through `Base`.
    fn base_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Base(part) => out.push(part),
            Self::Concat(sources) => sources.iter().for_each(|s| s.base_references(out)),
            Self::Cased(_, source) | Self::Remove { source, .. } => source.base_references(out),
            _ => {}
        }
    }
}

/// Empty or absent tables produce an empty value.
fn sample(
    table: &str,
    set: Option<&WeightedSet<String>>,
    rng: &mut StdRng,
) -> Result<String, NameError> {
    match set {
        Some(set) if !set.is_empty() => {
            set.random(rng)
                .cloned()
                .map_err(|source| NameError::Weighted {
                    table: table.to_string(),
                    source,
                })
        }
        _ => Ok(String::new()),
    }
}

/// Optional tables consulted by the base parts.
#[derive(Debug, Clone, Default)]
pub struct PartTables {
    pub names: Option<WeightedSet<String>>,
    pub surnames: Option<WeightedSet<String>>,
    pub nicknames: Option<WeightedSet<String>>,
    pub adjectives: Option<WeightedSet<String>>,
    pub titles: Option<WeightedSet<String>>,
    pub counts: Option<WeightedSet<String>>,
    pub affixes: Option<WeightedSet<String>>,
    pub suffixes: Option<WeightedSet<String>>,
}

/// Composes names for one language.
///
/// Owns a private clone of its language, so syllable or minimum-count
/// tweaks never leak into the shared definition.
#[derive(Debug, Clone)]
pub struct NameComposer {
    language: Language,
    templates: NameSet,
    tables: PartTables,
    parts: FxHashMap<String, PartSource>,
}

/// Builder for constructing a `NameComposer`.
pub struct NameComposerBuilder {
    language: Language,
    templates: NameSet,
    syllables: Option<SyllableSet>,
    minimum_grapheme_count: Option<usize>,
    strip_affixes: bool,
    tables: PartTables,
    parts: FxHashMap<String, PartSource>,
}

impl NameComposerBuilder {
    pub fn templates(mut self, templates: NameSet) -> Self {
        self.templates = templates;
        self
    }

    /// Use a different syllable set for name words.
    pub fn syllables(mut self, syllables: SyllableSet) -> Self {
        self.syllables = Some(syllables);
        self
    }

    pub fn minimum_grapheme_count(mut self, count: usize) -> Self {
        self.minimum_grapheme_count = Some(count);
        self
    }

    /// Drop the language's prefix and suffix tables.
    pub fn strip_affixes(mut self) -> Self {
        self.strip_affixes = true;
        self
    }

    pub fn tables(mut self, tables: PartTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn names(mut self, set: WeightedSet<String>) -> Self {
        self.tables.names = Some(set);
        self
    }

    pub fn surnames(mut self, set: WeightedSet<String>) -> Self {
        self.tables.surnames = Some(set);
        self
    }

    pub fn nicknames(mut self, set: WeightedSet<String>) -> Self {
        self.tables.nicknames = Some(set);
        self
    }

    pub fn adjectives(mut self, set: WeightedSet<String>) -> Self {
        self.tables.adjectives = Some(set);
        self
    }

    pub fn titles(mut self, set: WeightedSet<String>) -> Self {
        self.tables.titles = Some(set);
        self
    }

    pub fn counts(mut self, set: WeightedSet<String>) -> Self {
        self.tables.counts = Some(set);
        self
    }

    pub fn affixes(mut self, set: WeightedSet<String>) -> Self {
        self.tables.affixes = Some(set);
        self
    }

    pub fn suffixes(mut self, set: WeightedSet<String>) -> Self {
        self.tables.suffixes = Some(set);
        self
    }

    /// Override (or add) the handler for a part type.
    pub fn part(mut self, name: &str, source: PartSource) -> Self {
        self.parts.insert(name.to_lowercase(), source);
        self
    }

    pub fn build(self) -> Result<NameComposer, NameError> {
        let mut language = self.language;
        if self.strip_affixes {
            language = language.without_affixes();
        }
        if let Some(syllables) = self.syllables {
            language = language.with_syllables(syllables)?;
        }
        if let Some(count) = self.minimum_grapheme_count {
            language = language.with_minimum_grapheme_count(count)?;
        }
        if self.templates.is_empty() {
            return Err(NameError::Weighted {
                table: "name templates".to_string(),
                source: WeightedError::Empty,
            });
        }
        Ok(NameComposer {
            language,
            templates: self.templates,
            tables: self.tables,
            parts: self.parts,
        })
    }
}

impl NameComposer {
    pub fn builder(language: &Language) -> NameComposerBuilder {
        NameComposerBuilder {
            language: language.clone(),
            templates: NameSet::new(),
            syllables: None,
            minimum_grapheme_count: None,
            strip_affixes: false,
            tables: PartTables::default(),
            parts: FxHashMap::default(),
        }
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn templates(&self) -> &NameSet {
        &self.templates
    }

    pub fn tables(&self) -> &PartTables {
        &self.tables
    }

    /// Every part type this composer can resolve, sorted.
    pub fn known_parts(&self) -> Vec<String> {
        let mut known: Vec<String> = BASE_PARTS.iter().map(|p| p.to_string()).collect();
        known.extend(self.parts.keys().cloned());
        known.sort();
        known.dedup();
        known
    }

    /// Part types named by templates or `Base` overrides that nothing handles.
    pub fn unresolved_parts(&self) -> Vec<String> {
        let known = self.known_parts();
        let mut base: Vec<&str> = Vec::new();
        for source in self.parts.values() {
            source.base_references(&mut base);
        }
        let mut missing: Vec<String> = self
            .templates
            .members()
            .iter()
            .flat_map(|t| t.alternatives())
            .filter(|p| !known.iter().any(|k| k == p))
            .map(str::to_lowercase)
            .chain(
                base.into_iter()
                    .map(str::to_lowercase)
                    .filter(|p| !BASE_PARTS.contains(&p.as_str())),
            )
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Resolve one part type, honouring overrides. Names match lower-case.
    pub fn part(&self, name: &str, rng: &mut StdRng) -> Result<String, NameError> {
        let name = name.to_lowercase();
        match self.parts.get(&name) {
            Some(source) => source.generate(self, rng),
            None => self.base_part(&name, rng),
        }
    }

    /// The built-in behaviour of a part type, ignoring overrides.
    pub fn base_part(&self, name: &str, rng: &mut StdRng) -> Result<String, NameError> {
        let t = &self.tables;
        match name.to_lowercase().as_str() {
            "name" => {
                let value = match t.names.as_ref().filter(|s| !s.is_empty()) {
                    Some(names) => sample("names", Some(names), rng)?,
                    None => self.language.generate_word(rng)?,
                };
                Ok(title_case(&value))
            }
            "surname" => {
                let mut value = match t.surnames.as_ref().filter(|s| !s.is_empty()) {
                    Some(surnames) => sample("surnames", Some(surnames), rng)?,
                    None => self.language.generate_word(rng)?,
                };
                value.push_str(&sample("suffixes", t.suffixes.as_ref(), rng)?);
                if value.chars().count() == 1 {
                    value.push('.');
                }
                Ok(title_case(&value))
            }
            "adjective" => Ok(title_case(&sample("adjectives", t.adjectives.as_ref(), rng)?)),
            "title" => Ok(title_case(&sample("titles", t.titles.as_ref(), rng)?)),
            "nickname" => {
                let value = sample("nicknames", t.nicknames.as_ref(), rng)?;
                if value.is_empty() {
                    Ok(value)
                } else {
                    Ok(format!("\"{}\"", title_case(&value)))
                }
            }
            "affix" => sample("affixes", t.affixes.as_ref(), rng),
            "count" => sample("counts", t.counts.as_ref(), rng),
            "the" => Ok("the".to_string()),
            "initial" => Ok(String::new()),
            other => Err(NameError::UnknownNamePart {
                name: other.to_string(),
                known: self.known_parts(),
            }),
        }
    }

    fn generate_name(&self, rng: &mut StdRng) -> Result<Name, NameError> {
        let template = self
            .templates
            .random(rng)
            .map_err(|source| NameError::Weighted {
                table: "name templates".to_string(),
                source,
            })?;
        let parts: Vec<String> = template.parts(rng).collect();
        let mut name = Name::default();
        for part in parts {
            let value = self.part(&part, rng)?;
            let value = value.trim();
            if !value.is_empty() {
                name.push(&part, value.to_string());
            }
        }
        trace!("{}: name {}", self.language.name(), name.fullname);
        Ok(name)
    }

    /// Generate `count` names.
    pub fn name(&self, count: usize, rng: &mut StdRng) -> Result<Vec<Name>, NameError> {
        (0..count).map(|_| self.generate_name(rng)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::syllable::{NameTemplate, Syllable};
    use crate::core::weighted::equal_weights;
    use rand::SeedableRng;

    fn language() -> Language {
        Language::builder("test")
            .vowels(equal_weights(["a", "e", "o"], 1.0, false))
            .consonants(equal_weights(["k", "r", "t", "m"], 1.0, false))
            .syllables(SyllableSet::from_pairs([
                (Syllable::new("consonant,vowel,consonant").unwrap(), 1.0),
                (Syllable::new("vowel").unwrap(), 0.5),
            ]))
            .build()
            .unwrap()
    }

    fn templates(pairs: &[(&str, f64)]) -> NameSet {
        NameSet::from_pairs(pairs.iter().map(|(t, w)| (NameTemplate::new(t).unwrap(), *w)))
    }

    #[test]
    fn name_the_title() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("name,the,title", 1.0)]))
            .names(equal_weights(["Rok"], 1.0, false))
            .titles(equal_weights(["Lord"], 1.0, false))
            .nicknames(WeightedSet::new())
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let names = composer.name(1, &mut rng).unwrap();
        assert_eq!(names[0].fullname(), "Rok the Lord");
        assert_eq!(names[0].first("the"), Some("the"));
    }

    #[test]
    fn empty_parts_are_elided() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("adjective,name,nickname,surname,initial", 1.0)]))
            .adjectives(equal_weights(["bold"], 1.0, true))
            .nicknames(WeightedSet::new())
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for name in composer.name(100, &mut rng).unwrap() {
            let full = name.fullname();
            assert!(!full.contains("  "), "{full}");
            assert_eq!(full, full.trim());
            assert!(name.get("nickname").is_empty());
            assert!(name.get("initial").is_empty());
            let joined: Vec<&str> = ["adjective", "name", "surname"]
                .iter()
                .flat_map(|p| name.get(p))
                .map(String::as_str)
                .collect();
            assert_eq!(full, joined.join(" "));
        }
    }

    #[test]
    fn generated_names_are_title_cased() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("name,surname", 1.0)]))
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        for name in composer.name(50, &mut rng).unwrap() {
            for part in ["name", "surname"] {
                let value = name.first(part).unwrap();
                assert!(value.chars().next().unwrap().is_uppercase(), "{value}");
            }
        }
    }

    #[test]
    fn single_letter_surname_gets_a_period() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("surname", 1.0)]))
            .surnames(equal_weights(["q"], 1.0, false))
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(composer.name(1, &mut rng).unwrap()[0].fullname(), "Q.");
    }

    #[test]
    fn surname_takes_suffix() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("surname", 1.0)]))
            .surnames(equal_weights(["iron"], 1.0, false))
            .suffixes(equal_weights(["fist"], 1.0, false))
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(composer.name(1, &mut rng).unwrap()[0].fullname(), "Ironfist");
    }

    #[test]
    fn nickname_is_quoted() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("nickname", 1.0)]))
            .nicknames(equal_weights(["the bold"], 1.0, false))
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            composer.name(1, &mut rng).unwrap()[0].fullname(),
            "\"The Bold\""
        );
    }

    #[test]
    fn overrides_layer_on_base_parts() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("name,surname", 1.0)]))
            .names(equal_weights(["thrain"], 1.0, false))
            .surnames(equal_weights(["oak"], 1.0, false))
            .part(
                "surname",
                PartSource::Concat(vec![
                    PartSource::Base("surname".to_string()),
                    PartSource::Literal("son".to_string()),
                ]),
            )
            .part(
                "name",
                PartSource::Cased(
                    Casing::Lower,
                    Box::new(PartSource::Remove {
                        chars: "h".to_string(),
                        source: Box::new(PartSource::Base("name".to_string())),
                    }),
                ),
            )
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(composer.name(1, &mut rng).unwrap()[0].fullname(), "train Oakson");
    }

    #[test]
    fn place_takes_part_from_nested_composer() {
        let lang = language();
        let place = NameComposer::builder(&lang)
            .templates(templates(&[("affix,name", 1.0)]))
            .affixes(equal_weights(["el"], 1.0, false))
            .names(equal_weights(["dor"], 1.0, false))
            .build()
            .unwrap();
        let composer = NameComposer::builder(&lang)
            .templates(templates(&[("surname", 1.0)]))
            .part(
                "surname",
                PartSource::Place {
                    composer: Box::new(place.clone()),
                    part: "name".to_string(),
                },
            )
            .part(
                "home",
                PartSource::Place {
                    composer: Box::new(place),
                    part: "count".to_string(),
                },
            )
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(composer.name(1, &mut rng).unwrap()[0].fullname(), "Dor");
        assert!(matches!(
            composer.part("home", &mut rng),
            Err(NameError::MissingPart { .. })
        ));
    }

    #[test]
    fn grapheme_and_custom_parts() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("clan,name", 1.0)]))
            .names(equal_weights(["ka"], 1.0, false))
            .part(
                "clan",
                PartSource::custom("clan", |composer, rng| {
                    let c = composer.language().resolve("consonant", rng)?;
                    Ok(format!("{}'", c.to_uppercase()))
                }),
            )
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let name = &composer.name(1, &mut rng).unwrap()[0];
        let clan = name.first("clan").unwrap();
        assert!(["K'", "R'", "T'", "M'"].contains(&clan), "{clan}");
        assert!(name.fullname().ends_with(" Ka"));
    }

    #[test]
    fn part_names_match_case_insensitively() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("name,surname", 1.0)]))
            .names(equal_weights(["rok"], 1.0, false))
            .surnames(equal_weights(["oak"], 1.0, false))
            .part(
                "Epithet",
                PartSource::Concat(vec![
                    PartSource::Base("Surname".to_string()),
                    PartSource::Literal("son".to_string()),
                ]),
            )
            .build()
            .unwrap();
        assert!(composer.unresolved_parts().is_empty());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(composer.part("Name", &mut rng).unwrap(), "Rok");
        assert_eq!(composer.base_part("SURNAME", &mut rng).unwrap(), "Oak");
        assert_eq!(composer.part("EPITHET", &mut rng).unwrap(), "Oakson");
    }

    #[test]
    fn unknown_part_is_an_error() {
        let composer = NameComposer::builder(&language())
            .templates(templates(&[("name,epithet", 1.0)]))
            .build()
            .unwrap();
        assert_eq!(composer.unresolved_parts(), vec!["epithet"]);
        let mut rng = StdRng::seed_from_u64(0);
        let err = composer.name(1, &mut rng).unwrap_err();
        assert!(matches!(err, NameError::UnknownNamePart { ref name, .. } if name == "epithet"));
        assert!(err.to_string().contains("adjective, affix, count"));
    }

    #[test]
    fn private_language_copy() {
        let lang = language();
        let composer = NameComposer::builder(&lang)
            .templates(templates(&[("name", 1.0)]))
            .syllables(SyllableSet::from_pairs([(
                Syllable::new("consonant,vowel,consonant").unwrap(),
                1.0,
            )]))
            .minimum_grapheme_count(3)
            .build()
            .unwrap();
        assert_eq!(composer.language().minimum_grapheme_count(), 3);
        assert_eq!(lang.minimum_grapheme_count(), 1);
        assert_eq!(lang.syllables().len(), 2);

        let invalid = NameComposer::builder(&lang)
            .templates(templates(&[("name", 1.0)]))
            .minimum_grapheme_count(3)
            .build();
        assert!(matches!(
            invalid,
            Err(NameError::Language(LanguageError::InsufficientGraphemes { .. }))
        ));
    }
}
