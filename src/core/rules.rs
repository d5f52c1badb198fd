/// Word validation rules.
///
/// A rule is a pure predicate over `(language, word)`. Built-in rules are
/// plain data so language packs can declare them in RON; anything else can
/// be supplied as a [`Rule::Custom`] closure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::language::Language;

/// Lower-case vowels of the base alphabet.
pub const LATIN_VOWELS: &str = "aeiou";
/// Lower-case consonants of the base alphabet.
pub const LATIN_CONSONANTS: &str = "bcdfghjklmnpqrstvwxz";

/// Character class a [`Rule::MaxContiguous`] rule counts runs of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alphabet {
    Vowels,
    Consonants,
    /// Every character appearing in the language's vowel graphemes.
    LanguageVowels,
    Chars(String),
}

impl Alphabet {
    fn contains(&self, language: &Language, c: char) -> bool {
        match self {
            Self::Vowels => LATIN_VOWELS.contains(c),
            Self::Consonants => LATIN_CONSONANTS.contains(c),
            Self::LanguageVowels => language.vowels().members().iter().any(|v| v.contains(c)),
            Self::Chars(chars) => chars.contains(c),
        }
    }
}

pub type RuleFn = dyn Fn(&Language, &str) -> bool + Send + Sync;

/// A named predicate supplied in code.
#[derive(Clone)]
pub struct CustomRule {
    name: String,
    predicate: Arc<RuleFn>,
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Rule {
    /// The word contains at least one of the language's vowel graphemes.
    MustHaveVowel,
    /// No run of characters from `alphabet` longer than `max`.
    MaxContiguous { alphabet: Alphabet, max: usize },
    /// The word is not one character repeated over its whole length.
    NotSingleRepeatedChar,
    /// A word opening with two consonants must open with a permitted
    /// cluster. A doubled opening consonant is rejected unless listed in
    /// `allow_doubled`.
    StartingClusters {
        consonants: String,
        permitted: Vec<String>,
        #[serde(default)]
        allow_doubled: String,
    },
    /// The first `length` characters may not all be the same consonant.
    NoRepeatedStart { consonants: String, length: usize },
    /// Every pair of adjacent consonants must appear in `permitted`.
    ConsonantSequences {
        consonants: String,
        permitted: Vec<String>,
    },
    #[serde(skip)]
    Custom(CustomRule),
}

impl Rule {
    pub fn custom(
        name: impl Into<String>,
        predicate: impl Fn(&Language, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Custom(CustomRule {
            name: name.into(),
            predicate: Arc::new(predicate),
        })
    }

    /// Stable identifier, used for de-duplication and diagnostics.
    pub fn name(&self) -> String {
        match self {
            Self::MustHaveVowel => "must_have_vowel".to_string(),
            Self::MaxContiguous { alphabet, max } => {
                format!("max_contiguous({alphabet:?}, {max})")
            }
            Self::NotSingleRepeatedChar => "not_single_repeated_char".to_string(),
            Self::StartingClusters { consonants, .. } => {
                format!("starting_clusters({consonants})")
            }
            Self::NoRepeatedStart { length, .. } => format!("no_repeated_start({length})"),
            Self::ConsonantSequences { consonants, .. } => {
                format!("consonant_sequences({consonants})")
            }
            Self::Custom(custom) => custom.name.clone(),
        }
    }

    pub fn check(&self, language: &Language, word: &str) -> bool {
        match self {
            Self::MustHaveVowel => language
                .vowels()
                .members()
                .iter()
                .any(|v| !v.is_empty() && word.contains(v.as_str())),
            Self::MaxContiguous { alphabet, max } => {
                let mut run = 0;
                for c in word.chars() {
                    if alphabet.contains(language, c) {
                        run += 1;
                        if run > *max {
                            return false;
                        }
                    } else {
                        run = 0;
                    }
                }
                true
            }
            Self::NotSingleRepeatedChar => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => word.chars().count() == 1 || chars.any(|c| c != first),
                    None => true,
                }
            }
            Self::StartingClusters {
                consonants,
                permitted,
                allow_doubled,
            } => {
                let mut chars = word.chars();
                let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
                    return true;
                };
                if !consonants.contains(first) || !consonants.contains(second) {
                    return true;
                }
                if first == second && !allow_doubled.contains(first) {
                    return false;
                }
                let cluster: String = [first, second].iter().collect();
                permitted.iter().any(|p| *p == cluster)
            }
            Self::NoRepeatedStart { consonants, length } => {
                let head: Vec<char> = word.chars().take(*length).collect();
                if head.len() < *length || *length < 2 {
                    return true;
                }
                let all_consonants = head.iter().all(|c| consonants.contains(*c));
                !(all_consonants && head.iter().all(|c| *c == head[0]))
            }
            Self::ConsonantSequences {
                consonants,
                permitted,
            } => {
                let chars: Vec<char> = word.chars().collect();
                let mut i = 0;
                while i + 1 < chars.len() {
                    if consonants.contains(chars[i]) && consonants.contains(chars[i + 1]) {
                        let pair: String = chars[i..i + 2].iter().collect();
                        if !permitted.iter().any(|p| *p == pair) {
                            return false;
                        }
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                true
            }
            Self::Custom(custom) => (custom.predicate)(language, word),
        }
    }
}

/// The rule set a language validates candidate words against.
///
/// Rule sets are values: extending one produces a new set and never touches
/// the set it was built from.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least one vowel, no three contiguous vowels or consonants, and not
    /// a single repeated character.
    pub fn default_rules() -> Self {
        Self::from_rules([
            Rule::MustHaveVowel,
            Rule::MaxContiguous {
                alphabet: Alphabet::Vowels,
                max: 2,
            },
            Rule::MaxContiguous {
                alphabet: Alphabet::Consonants,
                max: 2,
            },
            Rule::NotSingleRepeatedChar,
        ])
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        rules.into_iter().fold(Self::new(), Self::with)
    }

    /// Add a rule, replacing any existing rule of the same name.
    pub fn with(mut self, rule: Rule) -> Self {
        let name = rule.name();
        self.rules.retain(|r| r.name() != name);
        self.rules.push(rule);
        self
    }

    pub fn union(&self, other: &RuleSet) -> RuleSet {
        other.rules.iter().cloned().fold(self.clone(), Self::with)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// The first rule the word fails, if any.
    pub fn first_failure(&self, language: &Language, word: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| !rule.check(language, word))
    }
}
