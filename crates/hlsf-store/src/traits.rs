//! Load/save contracts for the two pieces of state that outlive a run.

use hlsf_core::{CooccurrenceModel, GlyphBank};

use crate::error::Result;

pub trait GlyphBankStore {
    /// The stored bank, but only if it holds exactly `n` glyphs and was
    /// generated from `seed`.
    fn load_glyph_bank(&self, n: usize, seed: u64) -> Result<Option<GlyphBank>>;
    fn save_glyph_bank(&self, bank: &GlyphBank, seed: u64) -> Result<()>;
}

pub trait CooccurrenceStore {
    /// The stored model, or an empty one.
    fn load_cooccurrence(&self) -> Result<CooccurrenceModel>;
    fn save_cooccurrence(&self, model: &CooccurrenceModel) -> Result<()>;
}

/// Everything a run persists, behind one object-safe bound.
pub trait StateStore: GlyphBankStore + CooccurrenceStore + Send {}

impl<T: GlyphBankStore + CooccurrenceStore + Send> StateStore for T {}

/// Reuse a cached bank of the right size and seed, otherwise generate and
/// cache one in its place.
pub fn load_or_generate_bank<S: GlyphBankStore + ?Sized>(
    store: &S,
    n: usize,
    seed: u64,
) -> Result<GlyphBank> {
    if let Some(bank) = store.load_glyph_bank(n, seed)? {
        tracing::debug!(n, seed, "glyph bank loaded from store");
        return Ok(bank);
    }
    let bank = GlyphBank::generate(n, seed);
    store.save_glyph_bank(&bank, seed)?;
    tracing::info!(n, seed, "generated glyph bank");
    Ok(bank)
}

/// Fold one run's tokens into the stored co-occurrence model.
pub fn record_run<S: CooccurrenceStore + ?Sized>(
    store: &S,
    tokens: &[String],
) -> Result<CooccurrenceModel> {
    let mut model = store.load_cooccurrence()?;
    model.update(tokens);
    store.save_cooccurrence(&model)?;
    tracing::debug!(runs = model.runs, pairs = model.pairs.len(), "co-occurrence updated");
    Ok(model)
}
