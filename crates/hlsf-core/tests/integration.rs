//! Integration tests across the engine:
//! tokenize → embed → build → propagate → extract → package.

use std::collections::{BTreeSet, HashMap};

use approx::assert_relative_eq;
use hlsf_core::{
    Attention, AttentionParams, Collaborators, GlyphBank, Graph, HashedGlyphs, HeuristicExpansions,
    HlsfError, Node, OFFLINE_TRACE, Package, PipelineConfig, export_json, extract_threads,
    import_json, propagate, rescale, run_prompt,
};
use proptest::prelude::*;

fn graph_of(ids: &[&str], edges: &[(&str, &str, f64)]) -> Graph {
    let mut g = Graph::new();
    for id in ids {
        g.add_node(Node::token(*id, *id, 50.0, [0.0, 0.0])).unwrap();
    }
    for (a, b, k) in edges {
        g.add_edge(a, b, *k).unwrap();
    }
    g
}

fn params(restart: f64) -> AttentionParams {
    AttentionParams {
        restart,
        ..Default::default()
    }
}

fn members(thread: &hlsf_core::Thread) -> BTreeSet<String> {
    thread
        .tokens
        .iter()
        .chain(&thread.expansions)
        .cloned()
        .collect()
}

/// Two disconnected edges seeded at one end each split into two threads.
#[test]
fn two_components_two_threads() {
    let g = graph_of(&["A", "B", "C", "D"], &[("A", "B", 0.4), ("C", "D", 0.4)]);
    let attention = propagate(&g, &["A", "C"], &AttentionParams::default());
    let threads = extract_threads(&g, &attention, 0.01);

    assert_eq!(threads.len(), 2);
    let sets: Vec<BTreeSet<String>> = threads.iter().map(members).collect();
    let ab: BTreeSet<String> = ["A", "B"].iter().map(|s| s.to_string()).collect();
    let cd: BTreeSet<String> = ["C", "D"].iter().map(|s| s.to_string()).collect();
    assert!(sets.contains(&ab));
    assert!(sets.contains(&cd));

    let total: f64 = threads.iter().map(|t| t.score).sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-6);
    assert_relative_eq!(threads[0].score, 0.5, epsilon = 1e-6);
}

#[test]
fn isolated_seed_holds_all_mass() {
    let g = graph_of(&["solo"], &[]);
    let attention = propagate(&g, &["solo"], &AttentionParams::default());
    assert_relative_eq!(attention.get("solo").unwrap(), 1.0, epsilon = 1e-15);
    assert_eq!(attention.iterations, 1);
    assert!(attention.converged);
}

#[test]
fn identical_scores_rescale_to_midpoint() {
    let scores = HashMap::from([("a".to_string(), 1.0), ("b".to_string(), 1.0)]);
    let values = rescale(&scores);
    assert_eq!(values["a"], 50.0);
    assert_eq!(values["b"], 50.0);
}

/// On A–B–C seeded at A, the far end never outranks either closer node.
/// A ≥ B additionally needs enough restart mass to outweigh B's two inflows.
#[test]
fn attention_decays_along_path() {
    let g = graph_of(&["A", "B", "C"], &[("A", "B", 0.5), ("B", "C", 0.5)]);

    for r in [0.15, 0.3, 0.5, 0.9] {
        let att = propagate(&g, &["A"], &params(r));
        let (a, b, c) = (
            att.get("A").unwrap(),
            att.get("B").unwrap(),
            att.get("C").unwrap(),
        );
        assert!(a >= c, "r = {r}");
        assert!(b >= c, "r = {r}");
        if r >= 0.27 {
            assert!(a >= b, "r = {r}");
        }
    }

    // Below the crossover the middle node collects more than the seed.
    let att = propagate(&g, &["A"], &params(0.15));
    assert!(att.get("B").unwrap() > att.get("A").unwrap());
}

#[test]
fn soft_iteration_cap() {
    let g = graph_of(&["A", "B", "C"], &[("A", "B", 1.0), ("B", "C", 1.0)]);
    let p = AttentionParams {
        restart: 0.01,
        tolerance: 1e-15,
        max_iter: 3,
    };
    let att = propagate(&g, &["A"], &p);
    assert_eq!(att.iterations, 3);
    assert!(!att.converged);
    assert_relative_eq!(att.total(), 1.0, epsilon = 1e-12);
}

fn collab_parts() -> (GlyphBank, HashedGlyphs) {
    (GlyphBank::generate(200, 777), HashedGlyphs { seed: 777 })
}

#[test]
fn pipeline_is_deterministic() {
    let (bank, selector) = collab_parts();
    let collab = Collaborators {
        expansions: &HeuristicExpansions,
        glyphs: &selector,
        bank: &bank,
    };
    let prompt = "Explain how a pendulum transfers energy between forms.";
    let cfg = PipelineConfig::default();
    let first = run_prompt(prompt, collab, &cfg).unwrap();
    let second = run_prompt(prompt, collab, &cfg).unwrap();

    assert_eq!(first.embeddings, second.embeddings);
    assert_eq!(first.values, second.values);
    assert_eq!(first.field.graph.nodes(), second.field.graph.nodes());
    assert_eq!(first.field.graph.edges(), second.field.graph.edges());
    assert_eq!(first.attention, second.attention);
    assert_eq!(first.threads, second.threads);
    assert_eq!(first.glyphs, second.glyphs);

    let a = export_json(&Package::from_run(&first, OFFLINE_TRACE)).unwrap();
    let b = export_json(&Package::from_run(&second, OFFLINE_TRACE)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn seed_changes_values_not_structure() {
    let (bank, selector) = collab_parts();
    let collab = Collaborators {
        expansions: &HeuristicExpansions,
        glyphs: &selector,
        bank: &bank,
    };
    let prompt = "space field vector";
    let a = run_prompt(prompt, collab, &PipelineConfig::default()).unwrap();
    let b = run_prompt(
        prompt,
        collab,
        &PipelineConfig {
            seed: 1,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(a.embeddings, b.embeddings);
    assert_ne!(a.values, b.values);
    assert_eq!(a.field.graph.len(), b.field.graph.len());
}

#[test]
fn empty_prompt_is_rejected() {
    let (bank, selector) = collab_parts();
    let collab = Collaborators {
        expansions: &HeuristicExpansions,
        glyphs: &selector,
        bank: &bank,
    };
    let err = run_prompt("", collab, &PipelineConfig::default()).err();
    assert_eq!(err, Some(HlsfError::EmptyInput));
}

#[test]
fn package_survives_json() {
    let (bank, selector) = collab_parts();
    let collab = Collaborators {
        expansions: &HeuristicExpansions,
        glyphs: &selector,
        bank: &bank,
    };
    let run = run_prompt("Glyphs → arrows ∧ shapes!", collab, &PipelineConfig::default()).unwrap();
    let pkg = Package::from_run(&run, OFFLINE_TRACE);
    let json = export_json(&pkg).unwrap();
    let back = import_json(&json).unwrap();
    assert_eq!(back, pkg);

    let graph = back.space_field.to_graph().unwrap();
    assert_eq!(graph.nodes(), run.field.graph.nodes());
}

// --- Property tests ---

prop_compose! {
    fn arb_graph()(n in 1usize..12)
        (edges in prop::collection::vec((0..n, 0..n, 0.0f64..2.0), 0..24), n in Just(n))
        -> Graph
    {
        let mut g = Graph::new();
        for i in 0..n {
            g.add_node(Node::token(format!("n{i}"), format!("w{i}"), 50.0, [0.0, 0.0])).unwrap();
        }
        for (a, b, k) in edges {
            if a != b {
                g.add_edge(&format!("n{a}"), &format!("n{b}"), k).unwrap();
            }
        }
        g
    }
}

fn seeds_for(g: &Graph, mask: &[bool]) -> Vec<String> {
    g.nodes()
        .iter()
        .zip(mask.iter().cycle())
        .filter(|&(_, keep)| *keep)
        .map(|(n, _)| n.id.clone())
        .collect()
}

proptest! {
    #[test]
    fn attention_is_a_distribution(
        g in arb_graph(),
        mask in prop::collection::vec(any::<bool>(), 1..12),
        restart in 0.05f64..0.95,
    ) {
        let seeds = seeds_for(&g, &mask);
        let att = propagate(&g, &seeds, &params(restart));
        prop_assert_eq!(att.len(), g.len());
        for (_, p) in att.iter() {
            prop_assert!(p >= 0.0);
        }
        prop_assert!((att.total() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn raising_threshold_never_grows_threads(
        g in arb_graph(),
        restart in 0.05f64..0.95,
        lo in 0.0f64..0.3,
        bump in 0.0f64..0.3,
    ) {
        let seeds: Vec<String> = g.nodes().iter().take(1).map(|n| n.id.clone()).collect();
        let att = propagate(&g, &seeds, &params(restart));
        let count = |m: f64| -> usize {
            extract_threads(&g, &att, m).iter().map(|t| t.size()).sum()
        };
        prop_assert!(count(lo + bump) <= count(lo));
    }

    #[test]
    fn thread_extraction_is_idempotent(g in arb_graph(), min_weight in 0.0f64..0.2) {
        let seeds: Vec<String> = g.nodes().iter().map(|n| n.id.clone()).collect();
        let att = propagate(&g, &seeds, &AttentionParams::default());
        prop_assert_eq!(
            extract_threads(&g, &att, min_weight),
            extract_threads(&g, &att, min_weight)
        );
    }

    #[test]
    fn threads_partition_retained_nodes(g in arb_graph(), min_weight in 0.0f64..0.2) {
        let att: Attention = g
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), 1.0 / (i + 1) as f64))
            .collect();
        let threads = extract_threads(&g, &att, min_weight);
        let mut seen = BTreeSet::new();
        for t in &threads {
            for id in members(t) {
                prop_assert!(seen.insert(id));
            }
        }
        let retained = g.nodes().iter().filter(|n| att.get(&n.id).unwrap() >= min_weight).count();
        prop_assert_eq!(seen.len(), retained);
        for pair in threads.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
