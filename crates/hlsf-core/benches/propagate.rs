use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hlsf_core::{
    AttentionParams, Collaborators, GlyphBank, Graph, HashedGlyphs, HeuristicExpansions, Node,
    PipelineConfig, extract_threads, propagate, run_prompt,
};

/// Ring of `n` nodes with a chord every tenth node.
fn ring(n: usize) -> Graph {
    let mut g = Graph::new();
    for i in 0..n {
        g.add_node(Node::token(format!("n{i}"), format!("w{i}"), 50.0, [0.0, 0.0]))
            .unwrap();
    }
    for i in 0..n {
        let w = 0.1 + (i % 7) as f64 / 10.0;
        g.add_edge(&format!("n{i}"), &format!("n{}", (i + 1) % n), w)
            .unwrap();
        if i % 10 == 0 && n > 20 {
            g.add_edge(&format!("n{i}"), &format!("n{}", (i + n / 2) % n), 0.3)
                .unwrap();
        }
    }
    g
}

fn bench_propagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagate");
    let params = AttentionParams::default();

    for n in [30, 300, 3000] {
        let g = ring(n);
        let seeds: Vec<String> = (0..n).step_by(3).map(|i| format!("n{i}")).collect();
        group.bench_with_input(BenchmarkId::new("ring", n), &g, |b, g| {
            b.iter(|| propagate(black_box(g), &seeds, &params));
        });
    }

    group.finish();
}

fn bench_extract_threads(c: &mut Criterion) {
    let g = ring(3000);
    let att = propagate(&g, &["n0"], &AttentionParams::default());
    c.bench_function("extract_threads/ring_3000", |b| {
        b.iter(|| extract_threads(black_box(&g), &att, 1e-4));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let bank = GlyphBank::generate(1000, 777);
    let selector = HashedGlyphs { seed: 777 };
    let collab = Collaborators {
        expansions: &HeuristicExpansions,
        glyphs: &selector,
        bank: &bank,
    };
    let prompt = "Explain how a space field engine spreads attention across token glyphs \
                  and their semantic and associative expansions.";
    let cfg = PipelineConfig::default();
    c.bench_function("pipeline/prompt", |b| {
        b.iter(|| run_prompt(black_box(prompt), collab, &cfg).unwrap());
    });
}

criterion_group!(benches, bench_propagate, bench_extract_threads, bench_pipeline);
criterion_main!(benches);
