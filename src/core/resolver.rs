/// Grapheme resolution: maps grapheme type names used in syllable
/// templates to the source that fills them.

use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::language::{Language, LanguageError};
use crate::core::weighted::WeightedSet;

pub type GraphemeFn = dyn Fn(&Language, &mut StdRng) -> Result<String, LanguageError> + Send + Sync;

/// A grapheme generator supplied in code.
#[derive(Clone)]
pub struct CustomGrapheme {
    name: String,
    generate: Arc<GraphemeFn>,
}

impl fmt::Debug for CustomGrapheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomGrapheme").field("name", &self.name).finish()
    }
}

/// Where the text for one grapheme slot comes from.
#[derive(Debug, Clone)]
pub enum GraphemeSource {
    Vowel,
    Consonant,
    Prefix,
    Suffix,
    Table(WeightedSet<String>),
    Literal(String),
    /// Concatenation of several sources, e.g. stop + vowel + stop.
    Sequence(Vec<GraphemeSource>),
    Custom(CustomGrapheme),
}

impl GraphemeSource {
    pub fn custom(
        name: impl Into<String>,
        generate: impl Fn(&Language, &mut StdRng) -> Result<String, LanguageError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self::Custom(CustomGrapheme {
            name: name.into(),
            generate: Arc::new(generate),
        })
    }

    pub fn generate(&self, language: &Language, rng: &mut StdRng) -> Result<String, LanguageError> {
        match self {
            Self::Vowel => sample("vowels", language.vowels(), rng),
            Self::Consonant => sample("consonants", language.consonants(), rng),
            Self::Prefix => match language.prefixes() {
                Some(prefixes) => sample("prefixes", prefixes, rng),
                None => Err(LanguageError::MissingTable("prefixes")),
            },
            Self::Suffix => match language.suffixes() {
                Some(suffixes) => sample("suffixes", suffixes, rng),
                None => Err(LanguageError::MissingTable("suffixes")),
            },
            Self::Table(table) => sample("grapheme table", table, rng),
            Self::Literal(text) => Ok(text.clone()),
            Self::Sequence(sources) => {
                let mut out = String::new();
                for source in sources {
                    out.push_str(&source.generate(language, rng)?);
                }
                Ok(out)
            }
            Self::Custom(custom) => (custom.generate)(language, rng),
        }
    }
}

fn sample(
    table: &'static str,
    set: &WeightedSet<String>,
    rng: &mut StdRng,
) -> Result<String, LanguageError> {
    set.random(rng)
        .cloned()
        .map_err(|source| LanguageError::Weighted { table, source })
}

/// Grapheme type name -> source table. Names are matched lower-case.
#[derive(Debug, Clone)]
pub struct GraphemeResolver {
    handlers: FxHashMap<String, GraphemeSource>,
}

impl Default for GraphemeResolver {
    fn default() -> Self {
        let mut resolver = Self {
            handlers: FxHashMap::default(),
        };
        resolver.register("vowel", GraphemeSource::Vowel);
        resolver.register("consonant", GraphemeSource::Consonant);
        resolver.register("prefix", GraphemeSource::Prefix);
        resolver.register("suffix", GraphemeSource::Suffix);
        resolver
    }
}

impl GraphemeResolver {
    /// Bind a grapheme type, replacing any existing binding.
    pub fn register(&mut self, name: &str, source: GraphemeSource) {
        self.handlers.insert(name.to_lowercase(), source);
    }

    pub fn get(&self, name: &str) -> Option<&GraphemeSource> {
        self.handlers.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Known grapheme type names, sorted.
    pub fn known(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn resolve(
        &self,
        language: &Language,
        name: &str,
        rng: &mut StdRng,
    ) -> Result<String, LanguageError> {
        match self.get(name) {
            Some(source) => source.generate(language, rng),
            None => Err(LanguageError::UnknownGrapheme {
                name: name.to_lowercase(),
                known: self.known(),
            }),
        }
    }
}
