/// Casing helpers shared by text and name generation.

use serde::{Deserialize, Serialize};

/// Casing applied to a generated name part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Casing {
    /// Every alphabetic run starts upper-case: `t'kar` -> `T'Kar`.
    Title,
    /// First character upper-case, the rest lower-case.
    Capitalize,
    Lower,
}

impl Casing {
    pub fn apply(&self, s: &str) -> String {
        match self {
            Self::Title => title_case(s),
            Self::Capitalize => capitalize(s),
            Self::Lower => s.to_lowercase(),
        }
    }
}

/// Upper-case the first alphabetic character and lower-case the rest.
/// Leading punctuation is kept as is: `'so'sa` -> `'So'sa`.
pub fn capitalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut seen_letter = false;
    for c in s.chars() {
        if seen_letter {
            out.extend(c.to_lowercase());
        } else if c.is_alphabetic() {
            out.extend(c.to_uppercase());
            seen_letter = true;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
