/// Syllable and name templates.
///
/// A template is one or more comma-separated slots; each slot is a
/// pipe-separated list of grapheme (or name part) types, one of which is
/// chosen uniformly at random every time the template is expanded.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Mul;
use thiserror::Error;

use crate::core::weighted::WeightedSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("invalid syllable template '{template}': syllables must have at least one vowel in the template")]
    MissingVowel { template: String },
    #[error("template '{template}' has an empty slot")]
    EmptySlot { template: String },
}

/// Weighted set of syllables a language draws whole-word templates from.
pub type SyllableSet = WeightedSet<Syllable>;

/// Weighted set of name templates.
pub type NameSet = WeightedSet<NameTemplate>;

fn parse_slots(template: &str) -> Result<Vec<Vec<String>>, TemplateError> {
    let mut slots = Vec::new();
    for slot in template.split(',') {
        let alternatives: Vec<String> = slot
            .split('|')
            .map(|alt| alt.trim().to_lowercase())
            .filter(|alt| !alt.is_empty())
            .collect();
        if alternatives.is_empty() {
            return Err(TemplateError::EmptySlot {
                template: template.to_string(),
            });
        }
        slots.push(alternatives);
    }
    Ok(slots)
}

fn join_repeated(template: &str, count: usize) -> String {
    vec![template; count.max(1)].join(",")
}

/// Lazily expands a template, yielding one type name per slot.
pub struct SlotIter<'a> {
    slots: std::slice::Iter<'a, Vec<String>>,
    rng: &'a mut StdRng,
}

impl Iterator for SlotIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let slot = self.slots.next()?;
        slot.choose(&mut *self.rng).cloned()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

/// One syllable template. Must offer `vowel` in at least one slot.
///
/// ```text
/// vowel|consonant,vowel,consonant|vowel
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Syllable {
    template: String,
    slots: Vec<Vec<String>>,
}

impl Syllable {
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let slots = parse_slots(template)?;
        let has_vowel = slots
            .iter()
            .flatten()
            .any(|alternative| alternative.contains("vowel"));
        if !has_vowel {
            return Err(TemplateError::MissingVowel {
                template: template.to_string(),
            });
        }
        Ok(Self {
            template: template.to_string(),
            slots,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of grapheme slots this syllable expands to.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().flatten().map(String::as_str)
    }

    /// `count` copies of this template joined with commas. A count of zero
    /// is treated as one, so the result always keeps its vowel.
    pub fn repeat(&self, count: usize) -> Syllable {
        let template = join_repeated(&self.template, count);
        let mut slots = Vec::with_capacity(self.slots.len() * count.max(1));
        for _ in 0..count.max(1) {
            slots.extend(self.slots.iter().cloned());
        }
        Syllable { template, slots }
    }

    /// Expand into grapheme type names, one per slot. Each call draws a
    /// fresh, independent sequence.
    pub fn graphemes<'a>(&'a self, rng: &'a mut StdRng) -> SlotIter<'a> {
        SlotIter {
            slots: self.slots.iter(),
            rng,
        }
    }
}

impl Mul<usize> for Syllable {
    type Output = Syllable;

    fn mul(self, count: usize) -> Syllable {
        self.repeat(count)
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl TryFrom<String> for Syllable {
    type Error = TemplateError;

    fn try_from(template: String) -> Result<Self, Self::Error> {
        Syllable::new(&template)
    }
}

impl From<Syllable> for String {
    fn from(syllable: Syllable) -> Self {
        syllable.template
    }
}

/// An ordered list of name part types, e.g. `adjective,name,surname`.
///
/// Shares the slot syntax of [`Syllable`] but has no vowel requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NameTemplate {
    template: String,
    slots: Vec<Vec<String>>,
}

impl NameTemplate {
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            template: template.to_string(),
            slots: parse_slots(template)?,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().flatten().map(String::as_str)
    }

    pub fn parts<'a>(&'a self, rng: &'a mut StdRng) -> SlotIter<'a> {
        SlotIter {
            slots: self.slots.iter(),
            rng,
        }
    }
}

impl fmt::Display for NameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl TryFrom<String> for NameTemplate {
    type Error = TemplateError;

    fn try_from(template: String) -> Result<Self, Self::Error> {
        NameTemplate::new(&template)
    }
}

impl From<NameTemplate> for String {
    fn from(template: NameTemplate) -> Self {
        template.template
    }
}
