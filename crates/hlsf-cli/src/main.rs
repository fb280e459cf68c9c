mod config;
mod provider;
mod runner;
mod server;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hlsf_core::export_json;
use hlsf_store::{CooccurrenceStore, StateStore, Store};
use tokio::sync::Mutex;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "hlsf", about = "HLSF space-field engine CLI and HTTP front end")]
struct Cli {
    /// Settings file (defaults to hlsf.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine on a prompt and write the package and answer
    Run {
        /// Prompt text
        prompt: String,

        #[arg(long, default_value = "out/space_field.json")]
        json_out: PathBuf,

        #[arg(long, default_value = "out/answer.txt")]
        text_out: PathBuf,

        #[arg(long)]
        seed: Option<u64>,

        /// Text generator (openai_compat | mock)
        #[arg(long)]
        provider: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        /// Refinement passes (at least 1)
        #[arg(long)]
        passes: Option<u32>,

        /// Never call a text generator
        #[arg(long)]
        no_llm: bool,
    },

    /// Serve the browser UI and JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,
    },

    /// Show persisted state
    Stats {
        /// Also list the words most often seen alongside this token
        #[arg(long)]
        token: Option<String>,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

fn open_store(data_dir: &Path) -> Result<Store> {
    hlsf_store::open_in(Some(data_dir)).context("failed to open HLSF store")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let data_dir = config::data_dir();
    let settings = Settings::load(cli.config.as_deref(), &data_dir)?;

    match cli.command {
        Commands::Run {
            prompt,
            json_out,
            text_out,
            seed,
            provider,
            model,
            base_url,
            passes,
            no_llm,
        } => {
            let mut settings = settings;
            if let Some(seed) = seed {
                settings.pipeline.seed = seed;
            }
            if no_llm {
                settings.llm.enabled = false;
            }
            if let Some(provider) = provider {
                settings.llm.provider = provider;
            }
            if let Some(model) = model {
                settings.llm.model = model;
            }
            if let Some(base_url) = base_url {
                settings.llm.base_url = base_url;
            }
            if let Some(passes) = passes {
                settings.llm.passes = passes.max(1);
            }
            cmd_run(&data_dir, &settings, &prompt, &json_out, &text_out).await
        }
        Commands::Serve { host, port } => cmd_serve(&data_dir, settings, &host, port).await,
        Commands::Stats { token, limit } => cmd_stats(&data_dir, token.as_deref(), limit),
    }
}

fn shared(store: Store) -> Arc<Mutex<dyn StateStore>> {
    Arc::new(Mutex::new(store))
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

async fn cmd_run(
    data_dir: &Path,
    settings: &Settings,
    prompt: &str,
    json_out: &Path,
    text_out: &Path,
) -> Result<()> {
    let store = shared(open_store(data_dir)?);
    let outcome = runner::execute(prompt, settings, &store).await?;

    let json = export_json(&outcome.package).context("failed to serialize package")?;
    write_output(json_out, &json)?;
    write_output(text_out, &outcome.answer)?;

    println!("Wrote {} and {}", json_out.display(), text_out.display());
    Ok(())
}

async fn cmd_serve(data_dir: &Path, settings: Settings, host: &str, port: u16) -> Result<()> {
    let store = shared(open_store(data_dir)?);
    tracing::info!("data directory: {}", data_dir.display());
    server::serve(host, port, server::AppState::new(settings, store)).await
}

fn cmd_stats(data_dir: &Path, token: Option<&str>, limit: usize) -> Result<()> {
    let store = open_store(data_dir)?;
    let model = store
        .load_cooccurrence()
        .context("failed to load co-occurrence model")?;
    let glyphs = store.glyph_count().context("failed to count glyphs")?;

    println!("Runs recorded:      {}", model.runs);
    println!("Co-occurring pairs: {}", model.pairs.len());
    println!("Cached glyphs:      {glyphs}");

    if let Some(token) = token {
        let partners = model.top_partners(token, limit);
        println!();
        if partners.is_empty() {
            println!("No partners recorded for {token:?}");
        } else {
            println!("Top partners of {token:?}:");
            for (partner, count) in partners {
                println!("  {partner:<24} {count}");
            }
        }
    }
    Ok(())
}
