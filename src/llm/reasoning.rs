//! Reasoning-trace cleanup.
//!
//! Local reasoning models interleave `<think>…</think>` spans with the
//! answer. Those spans must never reach a caller — the router would try to
//! parse them as a label, and users would see the model arguing with itself.

use std::sync::LazyLock;

use regex::Regex;

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid reasoning-span regex"));

/// Strip all `<think>…</think>` spans and trim the remainder.
///
/// An unterminated opening tag drops everything from the tag onward — a
/// truncated trace is still a trace.
pub fn strip_reasoning(text: &str) -> String {
    let stripped = THINK_SPAN.replace_all(text, "");
    let stripped = match stripped.find("<think>") {
        Some(idx) => &stripped[..idx],
        None => &stripped,
    };
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_plain_text_through() {
        assert_eq!(strip_reasoning("PLANNER"), "PLANNER");
    }

    #[test]
    fn strips_single_span() {
        let input = "<think>the user wants a task created</think>PLANNER";
        assert_eq!(strip_reasoning(input), "PLANNER");
    }

    #[test]
    fn strips_multiple_spans_across_lines() {
        let input = "<think>first\nthoughts</think>Answer part one.\n<think>more</think>Part two.";
        assert_eq!(strip_reasoning(input), "Answer part one.\nPart two.");
    }

    #[test]
    fn drops_unterminated_trace() {
        let input = "The answer is 42.<think>but wait";
        assert_eq!(strip_reasoning(input), "The answer is 42.");
    }
}
