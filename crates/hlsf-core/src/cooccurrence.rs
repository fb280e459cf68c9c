use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Running token co-occurrence counts across pipeline runs.
///
/// Keys are `"a|b"` for every ordered pair of distinct positions in a run's
/// token list, so repeated tokens also count against themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooccurrenceModel {
    pub runs: u64,
    pub pairs: BTreeMap<String, u64>,
}

pub fn pair_key(a: &str, b: &str) -> String {
    format!("{a}|{b}")
}

impl CooccurrenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one run over `tokens`.
    pub fn update(&mut self, tokens: &[String]) {
        self.runs += 1;
        for (i, a) in tokens.iter().enumerate() {
            for (j, b) in tokens.iter().enumerate() {
                if i == j {
                    continue;
                }
                *self.pairs.entry(pair_key(a, b)).or_default() += 1;
            }
        }
    }

    pub fn count(&self, a: &str, b: &str) -> u64 {
        self.pairs.get(&pair_key(a, b)).copied().unwrap_or(0)
    }

    /// Most frequent partners of `token`, highest count first.
    pub fn top_partners(&self, token: &str, limit: usize) -> Vec<(String, u64)> {
        let prefix = format!("{token}|");
        let mut partners: Vec<(String, u64)> = self
            .pairs
            .iter()
            .filter_map(|(key, &count)| key.strip_prefix(&prefix).map(|b| (b.to_string(), count)))
            .collect();
        partners.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        partners.truncate(limit);
        partners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_update_counts_ordered_pairs() {
        let mut model = CooccurrenceModel::new();
        model.update(&toks(&["a", "b", "c"]));
        assert_eq!(model.runs, 1);
        assert_eq!(model.pairs.len(), 6);
        assert_eq!(model.count("a", "b"), 1);
        assert_eq!(model.count("b", "a"), 1);
        assert_eq!(model.count("a", "a"), 0);
    }

    #[test]
    fn test_repeated_tokens_pair_with_themselves() {
        let mut model = CooccurrenceModel::new();
        model.update(&toks(&["x", "x"]));
        assert_eq!(model.count("x", "x"), 2);
    }

    #[test]
    fn test_runs_accumulate() {
        let mut model = CooccurrenceModel::new();
        model.update(&toks(&["a", "b"]));
        model.update(&toks(&["a", "b"]));
        model.update(&[]);
        assert_eq!(model.runs, 3);
        assert_eq!(model.count("a", "b"), 2);
    }

    #[test]
    fn test_top_partners() {
        let mut model = CooccurrenceModel::new();
        model.update(&toks(&["a", "b", "c"]));
        model.update(&toks(&["a", "c"]));
        let top = model.top_partners("a", 1);
        assert_eq!(top, vec![("c".to_string(), 2)]);
    }
}
