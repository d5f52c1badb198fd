/// Pack linter: validates language pack files and smoke-tests generation.
///
/// Usage: pack_linter <pack_dir> [--samples <n>] [--seed <n>]

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use fanlang::core::name::NameComposer;
use fanlang::language_packs::{LanguagePack, LanguageRegistry, DEFAULTS_FILE};
use fanlang::schema::tables::SharedTables;

#[derive(Parser)]
#[command(name = "pack_linter")]
#[command(about = "Validate language pack files and smoke-test generation")]
struct Cli {
    /// Directory holding *.ron language packs (and optionally defaults.ron)
    pack_dir: PathBuf,

    /// Words and names to generate per pack
    #[arg(long, default_value = "200")]
    samples: usize,

    #[arg(long, default_value = "0")]
    seed: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if !cli.pack_dir.is_dir() {
        eprintln!("ERROR: Path '{}' is not a directory", cli.pack_dir.display());
        process::exit(1);
    }

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let shared = load_shared(&cli, &mut errors);
    let mut registry = LanguageRegistry::with_shared_tables(shared);

    // Load packs one at a time so a broken file doesn't hide the others.
    let mut paths: Vec<PathBuf> = match std::fs::read_dir(&cli.pack_dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("ron"))
            .filter(|path| path.file_name().and_then(|s| s.to_str()) != Some(DEFAULTS_FILE))
            .collect(),
        Err(e) => {
            eprintln!("ERROR: Failed to read '{}': {}", cli.pack_dir.display(), e);
            process::exit(1);
        }
    };
    paths.sort();

    for path in &paths {
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|contents| {
                registry
                    .load_from_ron(key, &contents)
                    .map_err(|e| e.to_string())
            });
        match loaded {
            Ok(()) => println!("  Loaded: {}", path.display()),
            Err(e) => errors.push(e),
        }
    }

    println!("Loaded {} language packs", registry.len());

    let mut rng = StdRng::seed_from_u64(cli.seed);
    for pack in registry.iter() {
        lint_pack(pack, cli.samples, &mut rng, &mut errors, &mut warnings);
    }
    lint_shared(&registry, &paths, &mut warnings);

    // Print report
    println!("\n=== Language Pack Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_shared(cli: &Cli, errors: &mut Vec<String>) -> SharedTables {
    let path = cli.pack_dir.join(DEFAULTS_FILE);
    if !path.is_file() {
        return SharedTables::new();
    }
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|contents| ron::from_str(&contents).map_err(|e| e.to_string()));
    match parsed {
        Ok(shared) => {
            println!("  Loaded: {}", path.display());
            shared
        }
        Err(e) => {
            errors.push(format!("{}: {}", path.display(), e));
            SharedTables::new()
        }
    }
}

fn lint_pack(
    pack: &LanguagePack,
    samples: usize,
    rng: &mut StdRng,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let key = &pack.key;
    let language = &pack.language;

    for grapheme in language.unresolved_graphemes() {
        errors.push(format!(
            "Language '{}' uses grapheme type '{}' with no handler",
            key, grapheme
        ));
    }

    if language.syllables().len() < 2 {
        warnings.push(format!(
            "Language '{}' has only {} syllable template (variety will be low)",
            key,
            language.syllables().len()
        ));
    }

    match language.word(samples, rng) {
        Ok(words) => {
            let mut unique = words.clone();
            unique.sort();
            unique.dedup();
            if !words.is_empty() && unique.len() * 4 < words.len() {
                warnings.push(format!(
                    "Language '{}' produced only {} distinct words out of {}",
                    key,
                    unique.len(),
                    words.len()
                ));
            }
        }
        Err(e) => errors.push(format!("Language '{}' failed to generate words: {}", key, e)),
    }

    let mut composers: Vec<(&str, &NameComposer)> = vec![("name", &pack.name)];
    if pack.has_noble_variant() {
        composers.push(("noble_name", pack.noble_name()));
    }
    for (label, composer) in composers {
        for part in composer.unresolved_parts() {
            errors.push(format!(
                "Language '{}' {} template uses unknown part '{}'",
                key, label, part
            ));
        }
        if let Err(e) = composer.name(samples, rng) {
            errors.push(format!(
                "Language '{}' {} failed to generate names: {}",
                key, label, e
            ));
        }
    }
}

/// Shared tables no pack file mentions are probably stale.
fn lint_shared(registry: &LanguageRegistry, paths: &[PathBuf], warnings: &mut Vec<String>) {
    let sources: Vec<String> = paths
        .iter()
        .filter_map(|path| std::fs::read_to_string(path).ok())
        .collect();
    let shared = registry.shared_tables();
    for name in shared.names() {
        let reference = format!("Shared(\"{}\")", name);
        let used = sources.iter().any(|s| s.contains(&reference))
            || shared
                .names()
                .filter_map(|other| shared.get(other))
                .any(|spec| format!("{:?}", spec).contains(&format!("Shared(\"{}\")", name)));
        if !used {
            warnings.push(format!("Shared table '{}' is never referenced", name));
        }
    }
}
