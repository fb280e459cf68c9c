use std::path::Path;

use rusqlite::{Connection, params};

use hlsf_core::{CooccurrenceModel, GlyphBank, GlyphCategory};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::traits::{CooccurrenceStore, GlyphBankStore};

const RUNS_KEY: &str = "cooccurrence_runs";
const BANK_SEED_KEY: &str = "glyph_bank_seed";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).ok();
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        set_metadata_on(&self.conn, key, value)
    }

    /// Glyph rows currently stored, regardless of the requested bank size.
    pub fn glyph_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM glyphs", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Seed the stored bank was generated from. Absent for banks saved
    /// before the seed was recorded.
    fn bank_seed(&self) -> Result<Option<u64>> {
        self.get_metadata(BANK_SEED_KEY)?
            .map(|v| {
                v.parse().map_err(|_| {
                    StoreError::InvalidData(format!("{BANK_SEED_KEY} is not a seed: {v:?}"))
                })
            })
            .transpose()
    }

    fn load_categories(&self) -> Result<Vec<GlyphCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, semantics, start_idx, end_idx FROM glyph_categories ORDER BY ord",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(GlyphCategory {
                    name: row.get(0)?,
                    semantics: row.get(1)?,
                    start: row.get::<_, i64>(2)? as usize,
                    end: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(rows)
    }
}

fn set_metadata_on(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

fn single_char(idx: i64, text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(StoreError::InvalidData(format!(
            "glyph {idx} is not a single character: {text:?}"
        ))),
    }
}

impl GlyphBankStore for Store {
    fn load_glyph_bank(&self, n: usize, seed: u64) -> Result<Option<GlyphBank>> {
        if n == 0 || self.glyph_count()? != n || self.bank_seed()? != Some(seed) {
            return Ok(None);
        }
        let mut stmt = self.conn.prepare("SELECT idx, glyph FROM glyphs ORDER BY idx")?;
        let rows: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<_, _>>()?;
        let glyphs = rows
            .iter()
            .map(|(idx, text)| single_char(*idx, text))
            .collect::<Result<Vec<char>>>()?;

        Ok(Some(GlyphBank {
            glyphs,
            categories: self.load_categories()?,
        }))
    }

    fn save_glyph_bank(&self, bank: &GlyphBank, seed: u64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch("DELETE FROM glyphs; DELETE FROM glyph_categories;")?;
        {
            let mut insert = tx.prepare("INSERT INTO glyphs (idx, glyph) VALUES (?1, ?2)")?;
            for (idx, glyph) in bank.glyphs.iter().enumerate() {
                insert.execute(params![idx as i64, glyph.to_string()])?;
            }
            let mut insert = tx.prepare(
                "INSERT INTO glyph_categories (ord, name, semantics, start_idx, end_idx)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (ord, cat) in bank.categories.iter().enumerate() {
                insert.execute(params![
                    ord as i64,
                    cat.name,
                    cat.semantics,
                    cat.start as i64,
                    cat.end as i64
                ])?;
            }
        }
        set_metadata_on(&tx, BANK_SEED_KEY, &seed.to_string())?;
        tx.commit()?;
        tracing::debug!(glyphs = bank.len(), seed, "glyph bank saved");
        Ok(())
    }
}

impl CooccurrenceStore for Store {
    fn load_cooccurrence(&self) -> Result<CooccurrenceModel> {
        let runs = match self.get_metadata(RUNS_KEY)? {
            Some(v) => v
                .parse()
                .map_err(|_| StoreError::InvalidData(format!("{RUNS_KEY} is not a count: {v:?}")))?,
            None => 0,
        };
        let mut stmt = self.conn.prepare("SELECT pair, count FROM cooccurrence")?;
        let pairs = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?.max(0) as u64))
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(CooccurrenceModel { runs, pairs })
    }

    fn save_cooccurrence(&self, model: &CooccurrenceModel) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch("DELETE FROM cooccurrence;")?;
        {
            let mut insert = tx.prepare("INSERT INTO cooccurrence (pair, count) VALUES (?1, ?2)")?;
            for (pair, count) in &model.pairs {
                insert.execute(params![pair, *count as i64])?;
            }
        }
        set_metadata_on(&tx, RUNS_KEY, &model.runs.to_string())?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{load_or_generate_bank, record_run};

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_metadata_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get_metadata("missing").unwrap(), None);
        store.set_metadata("k", "v").unwrap();
        assert_eq!(store.get_metadata("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_glyph_bank_save_load() {
        let store = Store::open_in_memory().unwrap();
        let bank = GlyphBank::generate(120, 777);
        store.save_glyph_bank(&bank, 777).unwrap();

        let loaded = store.load_glyph_bank(120, 777).unwrap().unwrap();
        assert_eq!(loaded, bank);
    }

    #[test]
    fn test_glyph_bank_size_mismatch_is_a_miss() {
        let store = Store::open_in_memory().unwrap();
        store.save_glyph_bank(&GlyphBank::generate(50, 1), 1).unwrap();
        assert!(store.load_glyph_bank(60, 1).unwrap().is_none());
        assert!(Store::open_in_memory().unwrap().load_glyph_bank(0, 1).unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_previous_bank() {
        let store = Store::open_in_memory().unwrap();
        store.save_glyph_bank(&GlyphBank::generate(80, 1), 1).unwrap();
        let second = GlyphBank::generate(40, 2);
        store.save_glyph_bank(&second, 2).unwrap();
        assert_eq!(store.glyph_count().unwrap(), 40);
        assert_eq!(store.load_glyph_bank(40, 2).unwrap().unwrap(), second);
    }

    #[test]
    fn test_load_or_generate_caches_per_seed() {
        let store = Store::open_in_memory().unwrap();
        let first = load_or_generate_bank(&store, 300, 9).unwrap();
        assert_eq!(load_or_generate_bank(&store, 300, 9).unwrap(), first);

        let reseeded = load_or_generate_bank(&store, 300, 10).unwrap();
        assert_eq!(reseeded, GlyphBank::generate(300, 10));
        assert_ne!(reseeded, first);
        assert!(store.load_glyph_bank(300, 9).unwrap().is_none());
        assert_eq!(store.load_glyph_bank(300, 10).unwrap(), Some(reseeded));
    }

    #[test]
    fn test_bank_without_recorded_seed_is_a_miss() {
        let store = Store::open_in_memory().unwrap();
        store.save_glyph_bank(&GlyphBank::generate(20, 5), 5).unwrap();
        store.conn().execute("DELETE FROM metadata WHERE key = ?1", [BANK_SEED_KEY]).unwrap();
        assert!(store.load_glyph_bank(20, 5).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_glyph_row() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute("INSERT INTO glyphs (idx, glyph) VALUES (0, 'ab')", [])
            .unwrap();
        store.set_metadata(BANK_SEED_KEY, "1").unwrap();
        assert!(matches!(
            store.load_glyph_bank(1, 1),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_cooccurrence_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.load_cooccurrence().unwrap(), CooccurrenceModel::new());

        record_run(&store, &toks(&["a", "b"])).unwrap();
        let model = record_run(&store, &toks(&["a", "b", "c"])).unwrap();
        assert_eq!(model.runs, 2);

        let loaded = store.load_cooccurrence().unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.count("a", "b"), 2);
        assert_eq!(loaded.count("c", "a"), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hlsf.db");
        {
            let store = Store::open(&path).unwrap();
            store.save_glyph_bank(&GlyphBank::generate(25, 3), 3).unwrap();
            record_run(&store, &toks(&["x", "y"])).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.glyph_count().unwrap(), 25);
        assert_eq!(store.load_glyph_bank(25, 3).unwrap(), Some(GlyphBank::generate(25, 3)));
        assert_eq!(store.load_cooccurrence().unwrap().runs, 1);
    }
}
