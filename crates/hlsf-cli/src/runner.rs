use anyhow::{Context, Result};
use hlsf_core::llm::{expansion_request, extract_json, glyph_request, parse_glyph_indices, refine_request};
use hlsf_core::{
    ChosenGlyphs, Collaborators, ExpansionPair, ExpansionSource, GENERATOR_TRACE, GeneratedExpansions,
    GlyphBank, GlyphSelector, HashedGlyphs, HeuristicExpansions, HlsfError, OFFLINE_TRACE, Package,
    SpaceFieldRun, compose_answer, tokenize, universe,
};
use hlsf_store::{StateStore, load_or_generate_bank, record_run};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::provider::Provider;

pub struct RunOutcome {
    pub package: Package,
    pub answer: String,
}

/// One prompt end to end: expansions, glyphs, the space field, an answer,
/// then the co-occurrence update. The store lock is only held for the
/// synchronous load and save steps.
pub async fn execute(prompt: &str, settings: &Settings, store: &Mutex<dyn StateStore>) -> Result<RunOutcome> {
    let tokens = tokenize(prompt);
    if tokens.is_empty() {
        return Err(HlsfError::EmptyInput.into());
    }

    let provider = Provider::from_settings(&settings.llm)?;
    let seed = settings.pipeline.seed;

    let generated = match &provider {
        Some(p) => {
            let reply = p
                .chat(&expansion_request(prompt, &tokens))
                .await
                .context("expansion request failed")?;
            let parsed = GeneratedExpansions::from_payload(&payload(&reply));
            tracing::debug!(provider = p.name(), generated = parsed.len(), "expansions received");
            Some(parsed)
        }
        None => None,
    };

    let items = universe(&tokens, &expansion_pairs(&tokens, generated.as_ref()));

    let bank = {
        let guard = store.lock().await;
        load_or_generate_bank(&*guard, settings.glyph_count, seed)
            .context("failed to load glyph bank")?
    };

    let chosen = match &provider {
        Some(p) => {
            let reply = p
                .chat(&glyph_request(prompt, &items, &bank.categories, bank.len(), seed))
                .await
                .context("glyph selection request failed")?;
            Some(ChosenGlyphs {
                indices: parse_glyph_indices(&payload(&reply)),
                fallback: HashedGlyphs { seed },
            })
        }
        None => None,
    };

    let run = build_field(&tokens, generated.as_ref(), chosen.as_ref(), &bank, settings)?;
    if !run.attention.converged {
        tracing::warn!(
            iterations = run.attention.iterations,
            max_iter = settings.pipeline.max_iter,
            "attention did not converge, using best estimate"
        );
    }

    let answer = match &provider {
        Some(p) => refine(p, prompt, &run, settings.llm.passes).await?,
        None => compose_answer(prompt, &run.threads, &run.field.graph),
    };

    let trace = if provider.is_some() { GENERATOR_TRACE } else { OFFLINE_TRACE };
    let mut package = Package::from_run(&run, trace);
    package.version = settings.version.clone();

    let model = {
        let guard = store.lock().await;
        record_run(&*guard, &run.tokens).context("failed to record co-occurrence")?
    };

    tracing::info!(
        tokens = package.stats.tokens,
        expansions = package.stats.expansions,
        edges = package.stats.edges,
        triangles = package.stats.triangles,
        threads = package.threads.len(),
        iterations = package.stats.iterations,
        runs = model.runs,
        "space field built"
    );

    Ok(RunOutcome { package, answer })
}

fn payload(reply: &str) -> Value {
    extract_json(reply).unwrap_or_else(|| {
        tracing::debug!("generator reply carried no JSON, using defaults");
        Value::Null
    })
}

fn expansion_pairs(tokens: &[String], generated: Option<&GeneratedExpansions>) -> Vec<ExpansionPair> {
    let source: &dyn ExpansionSource = match generated {
        Some(g) => g,
        None => &HeuristicExpansions,
    };
    tokens.iter().map(|t| source.expansions(t)).collect()
}

fn build_field(
    tokens: &[String],
    generated: Option<&GeneratedExpansions>,
    chosen: Option<&ChosenGlyphs>,
    bank: &GlyphBank,
    settings: &Settings,
) -> Result<SpaceFieldRun> {
    let hashed = HashedGlyphs { seed: settings.pipeline.seed };
    let expansions: &dyn ExpansionSource = match generated {
        Some(g) => g,
        None => &HeuristicExpansions,
    };
    let glyphs: &dyn GlyphSelector = match chosen {
        Some(c) => c,
        None => &hashed,
    };
    let collab = Collaborators { expansions, glyphs, bank };
    hlsf_core::run(tokens, collab, &settings.pipeline).context("failed to build space field")
}

/// `passes` rounds, each handed the previous answer; the first starts empty.
async fn refine(provider: &Provider, prompt: &str, run: &SpaceFieldRun, passes: u32) -> Result<String> {
    let mut previous = String::new();
    for pass in 0..passes.max(1) {
        previous = provider
            .chat(&refine_request(prompt, &previous, &run.tokens, &run.expansions))
            .await
            .with_context(|| format!("refinement pass {} failed", pass + 1))?;
    }
    Ok(previous.trim().to_string())
}
