//! WASM bindings for fanlang, backing the in-browser language sampler.

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use fanlang::language_packs::{LanguagePack, LanguageRegistry};

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct LanguageInfo {
    key: String,
    description: String,
    has_noble_variant: bool,
}

fn js_error(context: &str, e: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// LanguageSampler, the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct LanguageSampler {
    registry: LanguageRegistry,
    rng: StdRng,
}

#[wasm_bindgen]
impl LanguageSampler {
    /// Load the built-in language packs with a seeded generator.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<LanguageSampler, JsError> {
        let registry =
            LanguageRegistry::builtin().map_err(|e| js_error("Language pack error", e))?;
        Ok(LanguageSampler {
            registry,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Restart the generator from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Return a JSON array of `{ key, description, has_noble_variant }`.
    pub fn list_languages(&self) -> Result<String, JsError> {
        let languages: Vec<LanguageInfo> = self
            .registry
            .iter()
            .map(|pack| LanguageInfo {
                key: pack.key.clone(),
                description: pack.description.clone(),
                has_noble_variant: pack.has_noble_variant(),
            })
            .collect();
        serde_json::to_string(&languages)
            .map_err(|e| js_error("Serialization error", e))
    }

    /// Return a JSON array of `count` words.
    pub fn words(&mut self, language: &str, count: usize) -> Result<String, JsError> {
        let pack = find_pack(&self.registry, language)?;
        let words = pack
            .language
            .word(count, &mut self.rng)
            .map_err(|e| js_error("Generation error", e))?;
        serde_json::to_string(&words).map_err(|e| js_error("Serialization error", e))
    }

    /// Return a paragraph of `count` words as plain text.
    pub fn text(&mut self, language: &str, count: usize) -> Result<String, JsError> {
        let pack = find_pack(&self.registry, language)?;
        pack.language
            .text(count, &mut self.rng)
            .map_err(|e| js_error("Generation error", e))
    }

    /// Return a JSON array of `{ parts, fullname }`, where `parts` maps each
    /// part type to its generated values.
    pub fn names(&mut self, language: &str, count: usize, noble: bool) -> Result<String, JsError> {
        let pack = find_pack(&self.registry, language)?;
        let composer = if noble { pack.noble_name() } else { &pack.name };
        let names = composer
            .name(count, &mut self.rng)
            .map_err(|e| js_error("Generation error", e))?;
        serde_json::to_string(&names).map_err(|e| js_error("Serialization error", e))
    }
}

fn find_pack<'a>(registry: &'a LanguageRegistry, language: &str) -> Result<&'a LanguagePack, JsError> {
    registry
        .require(language)
        .map_err(|e| js_error("Unknown language", e))
}
