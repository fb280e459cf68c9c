use crate::graph::Graph;
use crate::threads::Thread;

const MAX_THREADS: usize = 5;
const MAX_ADJACENCIES: usize = 6;

fn texts<'a>(graph: &'a Graph, ids: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
    ids.iter()
        .filter_map(|id| graph.get(id))
        .map(|node| node.text.as_str())
        .filter(|text| !text.is_empty())
}

/// Offline verbalization of the top threads.
/// Lists each thread's salience, focus tokens and first few adjacencies.
pub fn compose_answer(prompt: &str, threads: &[Thread], graph: &Graph) -> String {
    let mut lines = vec![
        format!("Prompt: {prompt}"),
        String::new(),
        "Answer (HLSF baseline):".to_string(),
    ];

    if threads.is_empty() {
        lines.push("- No salient threads found; providing succinct summary of tokens.".to_string());
        return lines.join("\n");
    }

    for thread in threads.iter().take(MAX_THREADS) {
        lines.push(format!("- Thread {} (salience {:.3}):", thread.id, thread.score));
        let focus: Vec<&str> = texts(graph, &thread.tokens).collect();
        let adjacent: Vec<&str> = texts(graph, &thread.expansions).take(MAX_ADJACENCIES).collect();
        if !focus.is_empty() {
            lines.push(format!("  • Focus tokens: {}", focus.join(", ")));
        }
        if !adjacent.is_empty() {
            lines.push(format!("  • Adjacencies: {}", adjacent.join(", ")));
        }
        lines.push(
            "  • Synthesis: relates focus tokens via their adjacencies into a cohesive explanation."
                .to_string(),
        );
    }
    lines.push(String::new());
    lines.push("This is a baseline externalization; enable LLM for refined drafting.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;

    fn graph() -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::token("t0", "pendulum", 50.0, [0.0, 0.0])).unwrap();
        g.add_node(Node::expansion("t0_e1", "t0", "oscillator", 50.0, [0.0, 0.0], 0.8))
            .unwrap();
        g
    }

    fn thread(id: &str, score: f64) -> Thread {
        Thread {
            id: id.to_string(),
            score,
            tokens: vec!["t0".to_string()],
            expansions: vec!["t0_e1".to_string()],
        }
    }

    #[test]
    fn test_no_threads() {
        let answer = compose_answer("Why?", &[], &graph());
        assert!(answer.starts_with("Prompt: Why?"));
        assert!(answer.contains("No salient threads found"));
    }

    #[test]
    fn test_thread_lines() {
        let answer = compose_answer("Explain a pendulum.", &[thread("th0", 0.51234)], &graph());
        assert!(answer.contains("- Thread th0 (salience 0.512):"));
        assert!(answer.contains("  • Focus tokens: pendulum"));
        assert!(answer.contains("  • Adjacencies: oscillator"));
        assert!(answer.ends_with("enable LLM for refined drafting."));
    }

    #[test]
    fn test_caps_thread_count() {
        let threads: Vec<Thread> = (0..8).map(|i| thread(&format!("th{i}"), 0.1)).collect();
        let answer = compose_answer("p", &threads, &graph());
        assert!(answer.contains("th4"));
        assert!(!answer.contains("th5"));
    }
}
