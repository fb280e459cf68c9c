use std::sync::{Mutex, MutexGuard, PoisonError};

use hlsf_core::{CooccurrenceModel, GlyphBank};

use crate::error::Result;
use crate::traits::{CooccurrenceStore, GlyphBankStore};

/// Process-local store for tests and stateless runs. Nothing touches disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    bank: Mutex<Option<(u64, GlyphBank)>>,
    cooccurrence: Mutex<CooccurrenceModel>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlyphBankStore for MemoryStore {
    fn load_glyph_bank(&self, n: usize, seed: u64) -> Result<Option<GlyphBank>> {
        Ok(guard(&self.bank)
            .as_ref()
            .filter(|(stored_seed, bank)| *stored_seed == seed && bank.len() == n && n > 0)
            .map(|(_, bank)| bank.clone()))
    }

    fn save_glyph_bank(&self, bank: &GlyphBank, seed: u64) -> Result<()> {
        *guard(&self.bank) = Some((seed, bank.clone()));
        Ok(())
    }
}

impl CooccurrenceStore for MemoryStore {
    fn load_cooccurrence(&self) -> Result<CooccurrenceModel> {
        Ok(guard(&self.cooccurrence).clone())
    }

    fn save_cooccurrence(&self, model: &CooccurrenceModel) -> Result<()> {
        *guard(&self.cooccurrence) = model.clone();
        Ok(())
    }
}
