pub mod casing;
pub mod language;
pub mod name;
pub mod resolver;
pub mod rules;
pub mod syllable;
pub mod weighted;
