/// Serializable language definition, as written in a pack file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::language::{Language, DEFAULT_GRAPHEME_ATTEMPTS};
use crate::core::resolver::GraphemeSource;
use crate::core::rules::{Rule, RuleSet};
use crate::core::syllable::{Syllable, SyllableSet};
use crate::schema::tables::{SchemaError, SharedTables, TableSpec};

fn one() -> usize {
    1
}

fn unit_weight() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

fn default_attempts() -> u32 {
    DEFAULT_GRAPHEME_ATTEMPTS
}

/// A syllable template, optionally repeated, with its selection weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyllableDef {
    pub template: Syllable,
    #[serde(default = "one")]
    pub repeat: usize,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

pub fn build_syllables(defs: &[SyllableDef]) -> SyllableSet {
    SyllableSet::from_pairs(
        defs.iter()
            .map(|def| (def.template.repeat(def.repeat), def.weight)),
    )
}

/// Data form of [`GraphemeSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphemeDef {
    Vowel,
    Consonant,
    Prefix,
    Suffix,
    Table(TableSpec),
    Literal(String),
    Sequence(Vec<GraphemeDef>),
}

impl GraphemeDef {
    pub fn build(&self, shared: &SharedTables) -> Result<GraphemeSource, SchemaError> {
        Ok(match self {
            Self::Vowel => GraphemeSource::Vowel,
            Self::Consonant => GraphemeSource::Consonant,
            Self::Prefix => GraphemeSource::Prefix,
            Self::Suffix => GraphemeSource::Suffix,
            Self::Table(spec) => GraphemeSource::Table(spec.resolve(shared)?),
            Self::Literal(text) => GraphemeSource::Literal(text.clone()),
            Self::Sequence(defs) => GraphemeSource::Sequence(
                defs.iter()
                    .map(|def| def.build(shared))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// `defaults: true` starts from [`RuleSet::default_rules`] and unions
/// `extra` in; `defaults: false` uses `extra` alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesDef {
    #[serde(default = "yes")]
    pub defaults: bool,
    #[serde(default)]
    pub extra: Vec<Rule>,
}

impl Default for RulesDef {
    fn default() -> Self {
        Self {
            defaults: true,
            extra: Vec::new(),
        }
    }
}

impl RulesDef {
    pub fn build(&self) -> RuleSet {
        let extra = RuleSet::from_rules(self.extra.iter().cloned());
        if self.defaults {
            RuleSet::default_rules().union(&extra)
        } else {
            extra
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageDef {
    pub name: String,
    pub vowels: TableSpec,
    pub consonants: TableSpec,
    #[serde(default)]
    pub prefixes: Option<TableSpec>,
    #[serde(default)]
    pub suffixes: Option<TableSpec>,
    pub syllables: Vec<SyllableDef>,
    #[serde(default)]
    pub rules: RulesDef,
    #[serde(default = "one")]
    pub minimum_grapheme_count: usize,
    #[serde(default = "default_attempts")]
    pub grapheme_attempts: u32,
    /// Extra or rebound grapheme types.
    #[serde(default)]
    pub graphemes: BTreeMap<String, GraphemeDef>,
}

impl LanguageDef {
    pub fn build(&self, shared: &SharedTables) -> Result<Language, SchemaError> {
        let resolve_opt = |spec: &Option<TableSpec>| spec.as_ref().map(|s| s.resolve(shared)).transpose();

        let mut builder = Language::builder(&self.name)
            .vowels(self.vowels.resolve(shared)?)
            .consonants(self.consonants.resolve(shared)?)
            .prefixes(resolve_opt(&self.prefixes)?)
            .suffixes(resolve_opt(&self.suffixes)?)
            .syllables(build_syllables(&self.syllables))
            .rules(self.rules.build())
            .minimum_grapheme_count(self.minimum_grapheme_count)
            .grapheme_attempts(self.grapheme_attempts);
        for (name, def) in &self.graphemes {
            builder = builder.grapheme(name, def.build(shared)?);
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::LanguageError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const STOPS: &str = r#"#![enable(implicit_some)]
        (
            name: "stops",
            vowels: Equal(terms: ["a"], blank: false),
            consonants: Shared("consonants"),
            suffixes: Weighted([("'", 1.0)]),
            syllables: [
                (template: "consonant,vowel", repeat: 2),
            ],
            rules: (extra: [NoRepeatedStart(consonants: "k", length: 2)]),
            graphemes: {
                "vowel": Sequence([Literal("-"), Vowel]),
            },
        )
    "#;

    fn shared() -> SharedTables {
        let mut shared = SharedTables::new();
        shared.insert(
            "consonants",
            TableSpec::Equal {
                terms: vec!["k".to_string()],
                weight: 1.0,
                blank: false,
            },
        );
        shared
    }

    #[test]
    fn builds_language_from_ron() {
        let def: LanguageDef = ron::from_str(STOPS).unwrap();
        let lang = def.build(&shared()).unwrap();
        assert_eq!(lang.name(), "stops");
        assert_eq!(lang.rules().len(), 5);
        assert_eq!(lang.syllables().members()[0].len(), 4);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(lang.word(1, &mut rng).unwrap(), vec!["k-ak-a'".to_string()]);
    }

    #[test]
    fn rules_without_defaults() {
        let rules = RulesDef {
            defaults: false,
            extra: vec![Rule::MustHaveVowel],
        };
        assert_eq!(rules.build().len(), 1);
    }

    #[test]
    fn construction_errors_surface() {
        let mut def: LanguageDef = ron::from_str(STOPS).unwrap();
        def.minimum_grapheme_count = 5;
        assert!(matches!(
            def.build(&shared()),
            Err(SchemaError::Language(LanguageError::InsufficientGraphemes { .. }))
        ));
        def.minimum_grapheme_count = 1;
        def.consonants = TableSpec::Shared("missing".to_string());
        assert!(matches!(
            def.build(&shared()),
            Err(SchemaError::UnknownTable { .. })
        ));
    }

    #[test]
    fn bad_template_fails_to_parse() {
        let bad = STOPS.replace("consonant,vowel", "consonant,consonant");
        assert!(ron::from_str::<LanguageDef>(&bad).is_err());
    }
}
