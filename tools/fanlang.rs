/// fanlang: generate words, text and names in fantasy languages.
///
/// Usage: fanlang [--language <key>] [--seed <n>] [--pack-dir <dir>] <words|text|names|list>

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fanlang::core::name::Name;
use fanlang::language_packs::{LanguagePack, LanguageRegistry};

#[derive(Parser)]
#[command(name = "fanlang")]
#[command(about = "Generate words, text and names in procedurally built fantasy languages")]
#[command(long_about = None)]
struct Cli {
    /// Language pack key (see `fanlang list`)
    #[arg(short, long, global = true, default_value = "common")]
    language: String,

    /// Seed for reproducible output
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Load packs from this directory instead of the built-in ones
    #[arg(long, global = true, env = "FANLANG_LANGUAGE_PACK", value_name = "DIR")]
    pack_dir: Option<PathBuf>,

    /// Log which rules reject candidate words (also enabled by DEBUG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print random words
    Words {
        #[arg(short, long, default_value = "50")]
        count: usize,
    },
    /// Print a paragraph of pseudo-text
    Text {
        /// Number of words in the paragraph
        #[arg(short, long, default_value = "50")]
        count: usize,
    },
    /// Print full names
    Names {
        #[arg(short, long, default_value = "50")]
        count: usize,

        /// Use the language's noble name generator
        #[arg(long)]
        noble: bool,
    },
    /// List available languages with a short sample of each
    List,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug || std::env::var_os("DEBUG").is_some() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = match &cli.pack_dir {
        Some(dir) => LanguageRegistry::load_dir(dir)
            .with_context(|| format!("Failed to load language packs from {dir:?}"))?,
        None => LanguageRegistry::builtin().context("Failed to load built-in language packs")?,
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match cli.command {
        Commands::Words { count } => {
            let pack = registry.require(&cli.language)?;
            for word in pack.language.word(count, &mut rng)? {
                println!("{word}");
            }
        }
        Commands::Text { count } => {
            let pack = registry.require(&cli.language)?;
            println!("{}", pack.language.text(count, &mut rng)?);
        }
        Commands::Names { count, noble } => {
            let pack = registry.require(&cli.language)?;
            let composer = if noble { pack.noble_name() } else { &pack.name };
            for name in composer.name(count, &mut rng)? {
                println!("{name}");
            }
        }
        Commands::List => {
            for pack in registry.iter() {
                print_sample(pack, &mut rng)
                    .with_context(|| format!("Failed to generate a sample for '{}'", pack.key))?;
            }
        }
    }
    Ok(())
}

fn print_sample(pack: &LanguagePack, rng: &mut StdRng) -> anyhow::Result<()> {
    println!("{}", pack.key);
    println!("  {}", pack.description);
    println!("  Text:  {}", pack.language.text(12, rng)?);
    println!("  Names: {}", join_names(&pack.name.name(3, rng)?));
    if pack.has_noble_variant() {
        println!("  Noble: {}", join_names(&pack.noble_name().name(3, rng)?));
    }
    println!();
    Ok(())
}

fn join_names(names: &[Name]) -> String {
    names
        .iter()
        .map(Name::fullname)
        .collect::<Vec<_>>()
        .join(", ")
}
