//! Routing policy — decides which provider serves a completion.
//!
//! Rule order: certain task hints are unconditionally cloud-bound; otherwise
//! the approximate token count of the prompt against the configured threshold
//! decides. Local is the default.

/// The two interchangeable provider slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Local,
    Cloud,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

/// Task-type hint passed with every completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskHint {
    #[default]
    General,
    /// Intent classification — needs the most deterministic model available.
    Routing,
    DeepReasoning,
    Coding,
    LongContext,
    Creative,
    Budget,
    ResearchHeavy,
    CareerAnalysis,
    CodeReviewDeep,
}

impl TaskHint {
    /// Hints that always route to the cloud provider regardless of prompt
    /// size. Everything except plain conversation.
    pub fn cloud_mandatory(&self) -> bool {
        !matches!(self, Self::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Routing => "routing",
            Self::DeepReasoning => "deep_reasoning",
            Self::Coding => "coding",
            Self::LongContext => "long_context",
            Self::Creative => "creative",
            Self::Budget => "budget",
            Self::ResearchHeavy => "research_heavy",
            Self::CareerAnalysis => "career_analysis",
            Self::CodeReviewDeep => "code_review_deep",
        }
    }

    /// Parse a caller-supplied task type, defaulting to `General`.
    pub fn parse(s: &str) -> Self {
        match s {
            "routing" => Self::Routing,
            "deep_reasoning" => Self::DeepReasoning,
            "coding" => Self::Coding,
            "long_context" => Self::LongContext,
            "creative" => Self::Creative,
            "budget" => Self::Budget,
            "research_heavy" => Self::ResearchHeavy,
            "career_analysis" => Self::CareerAnalysis,
            "code_review_deep" => Self::CodeReviewDeep,
            _ => Self::General,
        }
    }
}

/// Approximate token count. Word count scaled by 4/3 — close enough for a
/// threshold decision, with no tokenizer dependency.
pub fn approx_tokens(text: &str) -> usize {
    text.split_whitespace().count() * 4 / 3
}

/// Decide the provider for a prompt.
pub fn route(prompt: &str, hint: TaskHint, local_token_threshold: usize) -> ProviderKind {
    if hint.cloud_mandatory() {
        tracing::debug!(task = hint.as_str(), "Router → cloud (task hint)");
        return ProviderKind::Cloud;
    }

    let tokens = approx_tokens(prompt);
    if tokens > local_token_threshold {
        tracing::debug!(tokens, threshold = local_token_threshold, "Router → cloud (tokens)");
        return ProviderKind::Cloud;
    }

    tracing::debug!(tokens, task = hint.as_str(), "Router → local");
    ProviderKind::Local
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_general_prompt_stays_local() {
        assert_eq!(route("hello there", TaskHint::General, 2000), ProviderKind::Local);
    }

    #[test]
    fn cloud_mandatory_hints_override_size() {
        assert_eq!(route("hi", TaskHint::Routing, 2000), ProviderKind::Cloud);
        assert_eq!(route("hi", TaskHint::Coding, 2000), ProviderKind::Cloud);
        assert_eq!(route("hi", TaskHint::ResearchHeavy, 2000), ProviderKind::Cloud);
    }

    #[test]
    fn long_prompt_goes_to_cloud() {
        let long = "word ".repeat(3000);
        assert_eq!(route(&long, TaskHint::General, 2000), ProviderKind::Cloud);
    }

    #[test]
    fn token_estimate_scales_word_count() {
        assert_eq!(approx_tokens(""), 0);
        assert_eq!(approx_tokens("one two three"), 4);
    }

    #[test]
    fn hint_parse_round_trips() {
        for hint in [
            TaskHint::General,
            TaskHint::Routing,
            TaskHint::Coding,
            TaskHint::CareerAnalysis,
        ] {
            assert_eq!(TaskHint::parse(hint.as_str()), hint);
        }
        assert_eq!(TaskHint::parse("whatever"), TaskHint::General);
    }
}
