//! fanlang: procedural fantasy-language generation.
//!
//! Builds pronounceable words, paragraphs of pseudo-text and structured
//! personal names from declarative language packs: weighted phoneme
//! tables, syllable templates, validation rules and name templates.

pub mod core;
pub mod language_packs;
pub mod schema;
