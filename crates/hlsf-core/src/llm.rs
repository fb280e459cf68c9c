//! Request shaping and response parsing for text-generator collaborators.
//!
//! Nothing here talks to a network. Callers hand the [`ChatRequest`] to
//! whatever transport they use and feed the reply text back through the
//! parsers, which recover from malformed output with local defaults.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::expansion::{ExpansionPair, value_to_f64};
use crate::glyph::GlyphCategory;
use crate::tokenizer::is_wordlike;

pub const TASK_EXPANSIONS: &str = "adjacency_expansions";
pub const TASK_GLYPHS: &str = "glyph_selection";
pub const TASK_REFINE: &str = "refine_answer";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// The JSON task body carried by the last user message, if any.
    pub fn task_body(&self) -> Option<Value> {
        let user = self.messages.iter().rev().find(|m| m.role == "user")?;
        extract_json(&user.content)
    }
}

fn request(system: &str, body: Value, temperature: f64, max_tokens: u32) -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::system(system), ChatMessage::user(body.to_string())],
        temperature,
        max_tokens,
    }
}

/// Ask for one semantic and one associative expansion per word-like token.
pub fn expansion_request(prompt: &str, tokens: &[String]) -> ChatRequest {
    let wanted: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| is_wordlike(t))
        .collect();
    request(
        "You are an assistant that returns STRICT JSON for programmatic use. Do not include chain-of-thought. No commentary.",
        json!({
            "task": TASK_EXPANSIONS,
            "prompt": prompt,
            "tokens": wanted,
            "k": 2,
            "instructions": "For each token, output 'semantic' and 'associative' expansions with weights in [0,1]. JSON only."
        }),
        0.1,
        1000,
    )
}

/// Ask for a glyph index per string, describing only category metadata.
/// `seed` is the run's seed, passed along for generators that hash.
pub fn glyph_request(
    prompt: &str,
    items: &[String],
    categories: &[GlyphCategory],
    bank_size: usize,
    seed: u64,
) -> ChatRequest {
    request(
        "Return STRICT JSON only. No explanations.",
        json!({
            "task": TASK_GLYPHS,
            "prompt": prompt,
            "tokens": items,
            "categories": categories,
            "bank_size": bank_size,
            "seed": seed,
            "instructions": "Pick an integer index for each token that best matches category semantics; JSON only."
        }),
        0.0,
        1000,
    )
}

/// One refinement pass. Each pass returns the full answer, never reasoning.
pub fn refine_request(
    prompt: &str,
    previous_answer: &str,
    tokens: &[String],
    expansions: &[ExpansionPair],
) -> ChatRequest {
    let mut seen = HashSet::new();
    let listed: Vec<Value> = tokens
        .iter()
        .zip(expansions)
        .filter(|&(token, _)| seen.insert(token.as_str()))
        .map(|(token, pair)| {
            json!({
                "token": token,
                "semantic": pair[0].text,
                "associative": pair[1].text,
            })
        })
        .collect();
    request(
        "You produce a crisp, user-facing answer. Do NOT reveal internal reasoning. Output is plain text, no JSON.",
        json!({
            "task": TASK_REFINE,
            "prompt": prompt,
            "previous_answer": previous_answer,
            "expansions": listed,
            "instructions": "Return the FINAL answer only; incorporate expansions; keep it clear and useful."
        }),
        0.2,
        800,
    )
}

/// Parse `text` as JSON, or else the first balanced `{...}` block that
/// parses. Braces inside JSON strings are not special-cased.
pub fn extract_json(text: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str(text) {
        return Some(v);
    }
    let mut start = None;
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if start.is_some() => {
                depth -= 1;
                if depth == 0 {
                    let from = start.take().unwrap_or(0);
                    if let Ok(v) = serde_json::from_str(&text[from..=i]) {
                        return Some(v);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// `{"glyph_indices": [{token, index}]}` → token → raw index.
/// Entries without a token are skipped; a missing index reads as 0.
pub fn parse_glyph_indices(payload: &Value) -> HashMap<String, i64> {
    payload
        .get("glyph_indices")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let token = entry.get("token")?.as_str()?;
            let index = entry
                .get("index")
                .and_then(value_to_f64)
                .map(|f| f as i64)
                .unwrap_or(0);
            Some((token.to_string(), index))
        })
        .collect()
}
