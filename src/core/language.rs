/// Language engine: builds words from syllable templates, grapheme
/// sources and validation rules.
///
/// Word construction:
///
/// 1. Sample a syllable template and expand it into grapheme type names,
///    resampling while the sequence is structurally invalid (too short,
///    or one type repeated three times in a row).
/// 2. Resolve every grapheme type to text and concatenate.
/// 3. Validate against the rule set; on failure go back to 1. Ten failed
///    candidates in a row is an error: the language is misconfigured.
/// 4. Prepend a prefix and append a suffix when the language has them.

use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::casing::capitalize;
use crate::core::resolver::{GraphemeResolver, GraphemeSource};
use crate::core::rules::RuleSet;
use crate::core::syllable::{SyllableSet, TemplateError};
use crate::core::weighted::{WeightedError, WeightedSet};

/// Failed candidates allowed per word before giving up.
pub const WORD_ATTEMPTS: u32 = 10;
/// Default number of syllable samples allowed per candidate.
pub const DEFAULT_GRAPHEME_ATTEMPTS: u32 = 1000;

const TERMINALS: [char; 3] = ['?', '!', '.'];

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("{table}: {source}")]
    Weighted {
        table: &'static str,
        #[source]
        source: WeightedError,
    },
    #[error("syllable '{syllable}' does not define enough graphemes ({required} required)")]
    InsufficientGraphemes { syllable: String, required: usize },
    #[error("minimum grapheme count must be at least 1")]
    InvalidMinimumGraphemeCount,
    #[error("grapheme attempt budget must be at least 1")]
    InvalidGraphemeAttempts,
    #[error(
        "exhausted all {attempts} attempts to create a valid word; last attempt: '{last_attempt}' \
         (enable debug logging to see which rules are failing)"
    )]
    ImprobableTemplate { attempts: u32, last_attempt: String },
    #[error("no handler found for grapheme template '{name}'; supported handlers: {}", .known.join(", "))]
    UnknownGrapheme { name: String, known: Vec<String> },
    #[error("language has no {0} table")]
    MissingTable(&'static str),
}

/// A language definition and its word generator.
///
/// Cloning is cheap enough to hand a private copy to each name composer,
/// which may then swap syllables or tune the grapheme minimum without
/// touching the shared definition.
#[derive(Debug, Clone)]
pub struct Language {
    name: String,
    vowels: WeightedSet<String>,
    consonants: WeightedSet<String>,
    prefixes: Option<WeightedSet<String>>,
    suffixes: Option<WeightedSet<String>>,
    syllables: SyllableSet,
    rules: RuleSet,
    minimum_grapheme_count: usize,
    grapheme_attempts: u32,
    resolver: GraphemeResolver,
}

/// Builder for constructing a `Language`.
pub struct LanguageBuilder {
    name: String,
    vowels: WeightedSet<String>,
    consonants: WeightedSet<String>,
    prefixes: Option<WeightedSet<String>>,
    suffixes: Option<WeightedSet<String>>,
    syllables: SyllableSet,
    rules: RuleSet,
    minimum_grapheme_count: usize,
    grapheme_attempts: u32,
    resolver: GraphemeResolver,
}

impl LanguageBuilder {
    pub fn vowels(mut self, vowels: WeightedSet<String>) -> Self {
        self.vowels = vowels;
        self
    }

    pub fn consonants(mut self, consonants: WeightedSet<String>) -> Self {
        self.consonants = consonants;
        self
    }

    pub fn prefixes(mut self, prefixes: Option<WeightedSet<String>>) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn suffixes(mut self, suffixes: Option<WeightedSet<String>>) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn syllables(mut self, syllables: SyllableSet) -> Self {
        self.syllables = syllables;
        self
    }

    /// Replace the rule set. Defaults to [`RuleSet::default_rules`].
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn minimum_grapheme_count(mut self, count: usize) -> Self {
        self.minimum_grapheme_count = count;
        self
    }

    pub fn grapheme_attempts(mut self, attempts: u32) -> Self {
        self.grapheme_attempts = attempts;
        self
    }

    /// Bind an extra grapheme type, or rebind a default one.
    pub fn grapheme(mut self, name: &str, source: GraphemeSource) -> Self {
        self.resolver.register(name, source);
        self
    }

    pub fn build(self) -> Result<Language, LanguageError> {
        if self.vowels.is_empty() {
            return Err(LanguageError::Weighted {
                table: "vowels",
                source: WeightedError::Empty,
            });
        }
        if self.grapheme_attempts == 0 {
            return Err(LanguageError::InvalidGraphemeAttempts);
        }
        let language = Language {
            name: self.name,
            vowels: self.vowels,
            consonants: self.consonants,
            prefixes: self.prefixes,
            suffixes: self.suffixes,
            syllables: self.syllables,
            rules: self.rules,
            minimum_grapheme_count: self.minimum_grapheme_count,
            grapheme_attempts: self.grapheme_attempts,
            resolver: self.resolver,
        };
        language.validate_syllable_set()?;
        debug!(
            "Built language '{}' ({} syllables, {} rules)",
            language.name,
            language.syllables.len(),
            language.rules.len()
        );
        Ok(language)
    }
}

impl Language {
    pub fn builder(name: impl Into<String>) -> LanguageBuilder {
        LanguageBuilder {
            name: name.into(),
            vowels: WeightedSet::new(),
            consonants: WeightedSet::new(),
            prefixes: None,
            suffixes: None,
            syllables: SyllableSet::new(),
            rules: RuleSet::default_rules(),
            minimum_grapheme_count: 1,
            grapheme_attempts: DEFAULT_GRAPHEME_ATTEMPTS,
            resolver: GraphemeResolver::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vowels(&self) -> &WeightedSet<String> {
        &self.vowels
    }

    pub fn consonants(&self) -> &WeightedSet<String> {
        &self.consonants
    }

    pub fn prefixes(&self) -> Option<&WeightedSet<String>> {
        self.prefixes.as_ref()
    }

    pub fn suffixes(&self) -> Option<&WeightedSet<String>> {
        self.suffixes.as_ref()
    }

    pub fn syllables(&self) -> &SyllableSet {
        &self.syllables
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn minimum_grapheme_count(&self) -> usize {
        self.minimum_grapheme_count
    }

    pub fn resolver(&self) -> &GraphemeResolver {
        &self.resolver
    }

    /// Copy with a different syllable set, re-checked against the minimum.
    pub fn with_syllables(mut self, syllables: SyllableSet) -> Result<Self, LanguageError> {
        self.syllables = syllables;
        self.validate_syllable_set()?;
        Ok(self)
    }

    /// Copy with a different grapheme minimum, re-checked against the syllables.
    pub fn with_minimum_grapheme_count(mut self, count: usize) -> Result<Self, LanguageError> {
        self.minimum_grapheme_count = count;
        self.validate_syllable_set()?;
        Ok(self)
    }

    /// Copy with the prefix and suffix tables removed.
    pub fn without_affixes(mut self) -> Self {
        self.prefixes = None;
        self.suffixes = None;
        self
    }

    fn validate_syllable_set(&self) -> Result<(), LanguageError> {
        if self.minimum_grapheme_count == 0 {
            return Err(LanguageError::InvalidMinimumGraphemeCount);
        }
        if self.syllables.is_empty() {
            return Err(LanguageError::Weighted {
                table: "syllables",
                source: WeightedError::Empty,
            });
        }
        for syllable in self.syllables.members() {
            if syllable.len() < self.minimum_grapheme_count {
                return Err(LanguageError::InsufficientGraphemes {
                    syllable: syllable.to_string(),
                    required: self.minimum_grapheme_count,
                });
            }
        }
        Ok(())
    }

    /// Grapheme types referenced by the syllable set that have no handler.
    pub fn unresolved_graphemes(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .syllables
            .members()
            .iter()
            .flat_map(|s| s.alternatives())
            .filter(|name| !self.resolver.contains(name))
            .map(str::to_string)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// True if `word` is possible in this language.
    pub fn validate(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        match self.rules.first_failure(self, word) {
            Some(rule) => {
                debug!("{} rejected by rule {}", word, rule.name());
                false
            }
            None => true,
        }
    }

    /// Structural check on a grapheme type sequence, before any text is chosen.
    pub fn validate_graphemes(&self, graphemes: &[String]) -> bool {
        if graphemes.len() < self.minimum_grapheme_count {
            debug!(
                "Grapheme sequence {:?} shorter than {}",
                graphemes, self.minimum_grapheme_count
            );
            return false;
        }
        let mut run = 0;
        let mut last: Option<&str> = None;
        for g in graphemes {
            if last == Some(g.as_str()) {
                run += 1;
                if run == 3 {
                    debug!("Grapheme sequence {:?} repeats '{}' three times", graphemes, g);
                    return false;
                }
            } else {
                run = 1;
            }
            last = Some(g.as_str());
        }
        true
    }

    /// Resolve one grapheme type to text.
    pub fn resolve(&self, grapheme: &str, rng: &mut StdRng) -> Result<String, LanguageError> {
        self.resolver.resolve(self, grapheme, rng)
    }

    fn sample_graphemes(&self, rng: &mut StdRng) -> Result<Vec<String>, LanguageError> {
        let mut last = Vec::new();
        for _ in 0..self.grapheme_attempts {
            let syllable = self
                .syllables
                .random(rng)
                .map_err(|source| LanguageError::Weighted {
                    table: "syllables",
                    source,
                })?;
            let graphemes: Vec<String> = syllable.graphemes(rng).collect();
            if self.validate_graphemes(&graphemes) {
                return Ok(graphemes);
            }
            last = graphemes;
        }
        Err(LanguageError::ImprobableTemplate {
            attempts: self.grapheme_attempts,
            last_attempt: last.join(","),
        })
    }

    /// Generate one word.
    pub fn generate_word(&self, rng: &mut StdRng) -> Result<String, LanguageError> {
        let mut candidate = String::new();
        let mut attempts = 0;
        while !self.validate(&candidate) {
            if attempts == WORD_ATTEMPTS {
                return Err(LanguageError::ImprobableTemplate {
                    attempts,
                    last_attempt: candidate,
                });
            }
            let graphemes = self.sample_graphemes(rng)?;
            candidate.clear();
            for grapheme in &graphemes {
                candidate.push_str(&self.resolve(grapheme, rng)?);
            }
            attempts += 1;
        }
        if self.prefixes.is_some() {
            candidate = self.resolve("prefix", rng)? + &candidate;
        }
        if self.suffixes.is_some() {
            candidate.push_str(&self.resolve("suffix", rng)?);
        }
        trace!("{}: {} after {} attempts", self.name, candidate, attempts);
        Ok(candidate)
    }

    /// Generate `count` independent words.
    pub fn word(&self, count: usize, rng: &mut StdRng) -> Result<Vec<String>, LanguageError> {
        (0..count).map(|_| self.generate_word(rng)).collect()
    }

    /// A paragraph of pseudo-text built from `count` words.
    ///
    /// Words are grouped into phrases of one to twelve words. Phrases are
    /// joined by a comma, or (one time in three) by terminal punctuation
    /// and a capitalized phrase. Zero words yields an empty string.
    pub fn text(&self, count: usize, rng: &mut StdRng) -> Result<String, LanguageError> {
        let mut phrases = Vec::new();
        let mut phrase: Vec<String> = Vec::new();
        for word in self.word(count, rng)? {
            phrase.push(word);
            if phrase.len() >= rng.gen_range(1..=12) {
                phrases.push(phrase.join(" "));
                phrase.clear();
            }
        }
        if !phrase.is_empty() {
            phrases.push(phrase.join(" "));
        }

        let mut phrases = phrases.into_iter();
        let Some(first) = phrases.next() else {
            return Ok(String::new());
        };
        let mut paragraph = capitalize(&first);
        for phrase in phrases {
            if rng.gen_ratio(1, 3) {
                paragraph.push(terminal(rng));
                paragraph.push(' ');
                paragraph.push_str(&capitalize(&phrase));
            } else {
                paragraph.push_str(", ");
                paragraph.push_str(&phrase);
            }
        }
        paragraph.push(terminal(rng));
        Ok(paragraph)
    }
}

fn terminal(rng: &mut StdRng) -> char {
    TERMINALS[rng.gen_range(0..TERMINALS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::Rule;
    use crate::core::syllable::Syllable;
    use crate::core::weighted::equal_weights;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn syllables(templates: &[(&str, f64)]) -> SyllableSet {
        SyllableSet::from_pairs(
            templates
                .iter()
                .map(|(t, w)| (Syllable::new(t).unwrap(), *w)),
        )
    }

    fn ka() -> Language {
        Language::builder("ka")
            .vowels(WeightedSet::from_pairs([("a".to_string(), 1.0)]))
            .consonants(WeightedSet::from_pairs([("k".to_string(), 1.0)]))
            .syllables(syllables(&[("consonant,vowel", 1.0)]))
            .minimum_grapheme_count(2)
            .build()
            .unwrap()
    }

    fn common() -> Language {
        Language::builder("common")
            .vowels(equal_weights(["a", "e", "i", "o", "u"], 1.0, false))
            .consonants(equal_weights(["b", "d", "k", "l", "m", "n", "r", "s", "t", "th"], 1.0, false))
            .syllables(syllables(&[
                ("consonant,vowel", 1.0),
                ("consonant,vowel,consonant", 0.5),
                ("vowel|consonant,vowel,consonant,vowel", 0.75),
            ]))
            .build()
            .unwrap()
    }

    #[test]
    fn only_one_possible_word() {
        let lang = ka();
        let mut rng = StdRng::seed_from_u64(99);
        assert_eq!(lang.word(1, &mut rng).unwrap(), vec!["ka".to_string()]);
    }

    #[test]
    fn word_count_and_validity() {
        let lang = common();
        let mut rng = StdRng::seed_from_u64(1);
        let words = lang.word(200, &mut rng).unwrap();
        assert_eq!(words.len(), 200);
        for w in &words {
            assert!(!w.is_empty());
            assert!(lang.validate(w), "{w} should validate");
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let lang = common();
        let a = lang.word(20, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = lang.word(20, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn generation_does_not_touch_tables() {
        let lang = common();
        let before = format!("{:?}", lang);
        let mut rng = StdRng::seed_from_u64(2);
        lang.word(1, &mut rng).unwrap();
        lang.word(1, &mut rng).unwrap();
        assert_eq!(before, format!("{:?}", lang));
    }

    #[test]
    fn always_failing_rule_exhausts_ten_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lang = Language::builder("never")
            .vowels(equal_weights(["a"], 1.0, false))
            .consonants(equal_weights(["k"], 1.0, false))
            .syllables(syllables(&[("consonant,vowel", 1.0)]))
            .rules(RuleSet::from_rules([Rule::custom("never", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            })]))
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = lang.word(1, &mut rng).unwrap_err();
        match &err {
            LanguageError::ImprobableTemplate {
                attempts,
                last_attempt,
            } => {
                assert_eq!(*attempts, 10);
                assert_eq!(last_attempt, "ka");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("'ka'"));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn insufficient_graphemes_fails_at_construction() {
        let err = Language::builder("short")
            .vowels(equal_weights(["a"], 1.0, false))
            .consonants(equal_weights(["k"], 1.0, false))
            .syllables(syllables(&[("consonant,vowel", 1.0), ("vowel", 1.0)]))
            .minimum_grapheme_count(2)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LanguageError::InsufficientGraphemes { required: 2, .. }
        ));
    }

    #[test]
    fn zero_minimum_rejected() {
        let err = Language::builder("zero")
            .vowels(equal_weights(["a"], 1.0, false))
            .syllables(syllables(&[("vowel", 1.0)]))
            .minimum_grapheme_count(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, LanguageError::InvalidMinimumGraphemeCount));
    }

    #[test]
    fn with_minimum_revalidates() {
        let lang = common();
        assert!(lang.clone().with_minimum_grapheme_count(2).is_ok());
        assert!(lang.clone().with_minimum_grapheme_count(3).is_err());
        assert_eq!(lang.minimum_grapheme_count(), 1);
    }

    #[test]
    fn grapheme_sequence_checks() {
        let lang = ka().with_minimum_grapheme_count(2).unwrap();
        let seq = |s: &str| s.split(',').map(str::to_string).collect::<Vec<_>>();
        assert!(lang.validate_graphemes(&seq("consonant,vowel")));
        assert!(lang.validate_graphemes(&seq("vowel,vowel,consonant,vowel,vowel")));
        assert!(!lang.validate_graphemes(&seq("vowel")));
        assert!(!lang.validate_graphemes(&seq("consonant,vowel,vowel,vowel")));
    }

    #[test]
    fn unbounded_repetition_hits_grapheme_budget() {
        let lang = Language::builder("stutter")
            .vowels(equal_weights(["a"], 1.0, false))
            .syllables(syllables(&[("vowel,vowel,vowel", 1.0)]))
            .grapheme_attempts(5)
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        match lang.word(1, &mut rng) {
            Err(LanguageError::ImprobableTemplate {
                attempts,
                last_attempt,
            }) => {
                assert_eq!(attempts, 5);
                assert_eq!(last_attempt, "vowel,vowel,vowel");
            }
            other => panic!("expected ImprobableTemplate, got {other:?}"),
        }
    }

    #[test]
    fn unknown_grapheme_in_template() {
        let lang = Language::builder("glottal")
            .vowels(equal_weights(["a"], 1.0, false))
            .syllables(syllables(&[("glottal_stop,vowel", 1.0)]))
            .build()
            .unwrap();
        assert_eq!(lang.unresolved_graphemes(), vec!["glottal_stop"]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            lang.word(1, &mut rng),
            Err(LanguageError::UnknownGrapheme { ref name, .. }) if name == "glottal_stop"
        ));

        let fixed = Language::builder("glottal")
            .vowels(equal_weights(["a"], 1.0, false))
            .syllables(syllables(&[("glottal_stop,vowel", 1.0)]))
            .grapheme("glottal_stop", GraphemeSource::Literal("'".to_string()))
            .build()
            .unwrap();
        assert!(fixed.unresolved_graphemes().is_empty());
        assert_eq!(fixed.word(1, &mut rng).unwrap(), vec!["'a".to_string()]);
    }

    #[test]
    fn prefix_and_suffix_wrap_validated_word() {
        let lang = Language::builder("affixed")
            .vowels(WeightedSet::from_pairs([("a".to_string(), 1.0)]))
            .consonants(WeightedSet::from_pairs([("k".to_string(), 1.0)]))
            .prefixes(Some(equal_weights(["t'"], 1.0, false)))
            .suffixes(Some(equal_weights(["ith"], 1.0, false)))
            .syllables(syllables(&[("consonant,vowel", 1.0)]))
            .build()
            .unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(lang.word(1, &mut rng).unwrap(), vec!["t'kaith".to_string()]);
        assert!(lang.clone().without_affixes().prefixes().is_none());
    }

    #[test]
    fn text_shape() {
        let lang = common();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = lang.text(30, &mut rng).unwrap();
            let first = text.chars().next().unwrap();
            let last = text.chars().last().unwrap();
            assert!(first.is_uppercase(), "{text}");
            assert!(TERMINALS.contains(&last), "{text}");
            assert!(!text.contains("  "), "{text}");
        }
    }

    #[test]
    fn text_capitalizes_past_leading_punctuation() {
        let lang = Language::builder("glottal")
            .vowels(equal_weights(["a", "e"], 1.0, false))
            .consonants(equal_weights(["k", "t"], 1.0, false))
            .syllables(syllables(&[("vowel,consonant", 1.0)]))
            .grapheme(
                "vowel",
                GraphemeSource::Sequence(vec![
                    GraphemeSource::Literal("'".to_string()),
                    GraphemeSource::Vowel,
                ]),
            )
            .build()
            .unwrap();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let text = lang.text(40, &mut rng).unwrap();
            assert!(text.starts_with('\''), "{text}");
            for sentence in text.split(|c| TERMINALS.contains(&c)) {
                let Some(letter) = sentence.chars().find(|c| c.is_alphabetic()) else {
                    continue;
                };
                assert!(letter.is_uppercase(), "{text}");
            }
        }
    }

    #[test]
    fn text_of_nothing_is_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(common().text(0, &mut rng).unwrap(), "");
    }
}
