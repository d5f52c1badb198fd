pub mod language_def;
pub mod name_def;
pub mod tables;
