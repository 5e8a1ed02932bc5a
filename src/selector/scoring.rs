//! Multi-factor relevance scoring
//!
//! Each component is capped independently; the raw sum is divided by
//! [`MAX_RAW_SCORE`] so every score lands in [0, 1].

use crate::discovery::canonical::canonical_id;
use crate::discovery::ResourceCost;
use crate::selector::types::{Intent, SelectableCapability, ToolContext, ToolRelevanceScore, UsageStat};
use chrono::{DateTime, Utc};

pub const MAX_BASE_PRIORITY: f64 = 40.0;
pub const MAX_CONTEXT_MATCH: f64 = 30.0;
pub const MAX_QUERY_MATCH: f64 = 20.0;
pub const MAX_USAGE_FREQUENCY: f64 = 15.0;
pub const MAX_SUCCESS_RATE: f64 = 10.0;
pub const CATEGORY_MATCH_BONUS: f64 = 10.0;
pub const DYNAMIC_BONUS: f64 = 5.0;
pub const MAX_EFFICIENCY_BONUS: f64 = 5.0;

/// Sum of every component cap
pub const MAX_RAW_SCORE: f64 = MAX_BASE_PRIORITY
    + MAX_CONTEXT_MATCH
    + MAX_QUERY_MATCH
    + MAX_USAGE_FREQUENCY
    + MAX_SUCCESS_RATE
    + CATEGORY_MATCH_BONUS
    + DYNAMIC_BONUS
    + MAX_EFFICIENCY_BONUS;

/// Success-rate contribution for capabilities with no history
const NEUTRAL_SUCCESS: f64 = 5.0;

/// Categories and keywords that suit each intent
fn intent_affinity(intent: Intent) -> (&'static [&'static str], &'static [&'static str]) {
    match intent {
        Intent::Discovery => (
            &["data", "productivity"],
            &["search", "list", "get", "find", "read", "fetch", "lookup"],
        ),
        Intent::Execution => (
            &["communication", "development", "ai"],
            &["send", "create", "update", "run", "execute", "post", "write"],
        ),
        Intent::Validation => (
            &["utility"],
            &["validate", "check", "filter", "verify", "compare", "condition"],
        ),
        Intent::Analysis => (
            &["data", "ai"],
            &["aggregate", "summar", "analy", "report", "sort", "transform", "sql"],
        ),
        Intent::Troubleshooting => (
            &["utility", "development"],
            &["error", "log", "debug", "retry", "wait", "stop", "monitor"],
        ),
    }
}

/// Per-capability signals that come from the selector's history
#[derive(Debug, Clone, Copy)]
pub struct ScoringSignals<'a> {
    pub usage: Option<&'a UsageStat>,
    /// Previously selected for the same intent
    pub learned: bool,
    pub now: DateTime<Utc>,
    pub decay_hours: f64,
}

/// Score one capability against a context
pub fn score_capability(
    capability: &SelectableCapability,
    context: &ToolContext,
    signals: ScoringSignals<'_>,
) -> ToolRelevanceScore {
    let mut reasons = Vec::new();

    let base = (capability.priority as f64 * 0.4).min(MAX_BASE_PRIORITY);
    reasons.push(format!("priority {}", capability.priority));

    let context_match = context_score(capability, context, signals.learned, &mut reasons);
    let query_match = query_score(capability, context, &mut reasons);
    let usage_frequency = usage_score(signals, &mut reasons);

    let success = match signals.usage.and_then(UsageStat::success_rate) {
        Some(rate) => {
            reasons.push(format!("success rate {:.0}%", rate * 100.0));
            rate * MAX_SUCCESS_RATE
        }
        None => NEUTRAL_SUCCESS,
    };

    let category_bonus = match &context.category {
        Some(category) if category.eq_ignore_ascii_case(&capability.category) => {
            reasons.push(format!("category '{}'", capability.category));
            CATEGORY_MATCH_BONUS
        }
        _ => 0.0,
    };

    let dynamic_bonus = if capability.dynamic {
        reasons.push("discovered at runtime".to_string());
        DYNAMIC_BONUS
    } else {
        0.0
    };

    let efficiency_bonus = match capability.cost {
        ResourceCost::Low => MAX_EFFICIENCY_BONUS,
        ResourceCost::Medium => 2.0,
        ResourceCost::High => 0.0,
    };

    let raw = base
        + context_match
        + query_match
        + usage_frequency
        + success
        + category_bonus
        + dynamic_bonus
        + efficiency_bonus;

    ToolRelevanceScore {
        capability_id: capability.id.clone(),
        score: (raw / MAX_RAW_SCORE).clamp(0.0, 1.0),
        reasons,
        category: capability.category.clone(),
        context_match: context_match / MAX_CONTEXT_MATCH,
        usage_frequency: usage_frequency / MAX_USAGE_FREQUENCY,
        success_rate: success / MAX_SUCCESS_RATE,
    }
}

fn context_score(
    capability: &SelectableCapability,
    context: &ToolContext,
    learned: bool,
    reasons: &mut Vec<String>,
) -> f64 {
    let mut score = 0.0;

    if let Some(intent) = context.intent {
        let (categories, keywords) = intent_affinity(intent);
        if categories.contains(&capability.category.as_str()) {
            score += 15.0;
            reasons.push(format!("{} suits {} intent", capability.category, intent));
        }

        let haystack = format!(
            "{} {} {}",
            capability.id.to_lowercase(),
            capability.title.to_lowercase(),
            capability.description.to_lowercase()
        );
        let hits = keywords.iter().filter(|k| haystack.contains(*k)).count();
        if hits > 0 {
            score += (hits as f64 * 5.0).min(15.0);
            reasons.push(format!("{} {} keyword(s)", hits, intent));
        }
    }

    if context
        .relevant_node_types
        .iter()
        .any(|hint| canonical_id(hint).eq_ignore_ascii_case(&capability.id))
    {
        score += 20.0;
        reasons.push("requested node type".to_string());
    }

    if context.workflow_context && matches!(capability.category.as_str(), "trigger" | "utility") {
        score += 5.0;
    }

    if context.previous_tools.iter().any(|t| t == &capability.id) {
        score += 5.0;
        reasons.push("used earlier in session".to_string());
    }

    if learned {
        score += 5.0;
        reasons.push("learned from past selections".to_string());
    }

    score.min(MAX_CONTEXT_MATCH)
}

fn query_score(capability: &SelectableCapability, context: &ToolContext, reasons: &mut Vec<String>) -> f64 {
    let query = match context.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return 0.0,
    };

    let id = capability.id.to_lowercase();
    let title = capability.title.to_lowercase();
    if query == id || query == title {
        reasons.push("exact name match".to_string());
        return MAX_QUERY_MATCH;
    }

    let description = capability.description.to_lowercase();
    let mut score: f64 = 0.0;
    for term in context.query_terms() {
        if id.contains(&term) {
            score += 8.0;
        } else if title.contains(&term) {
            score += 5.0;
        } else if description.contains(&term) {
            score += 2.0;
        }
    }

    if score > 0.0 {
        reasons.push("query terms match".to_string());
    }
    score.min(MAX_QUERY_MATCH)
}

fn usage_score(signals: ScoringSignals<'_>, reasons: &mut Vec<String>) -> f64 {
    let usage = match signals.usage {
        Some(u) if u.call_count > 0 => u,
        _ => return 0.0,
    };

    let frequency = (5.0 * (1.0 + usage.call_count as f64).ln()).min(MAX_USAGE_FREQUENCY);
    let hours_since = (signals.now - usage.last_used).num_seconds().max(0) as f64 / 3600.0;
    let decay = (-hours_since / signals.decay_hours).exp();

    reasons.push(format!("used {} time(s)", usage.call_count));
    frequency * decay
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn capability(id: &str, priority: u8) -> SelectableCapability {
        SelectableCapability {
            id: id.to_string(),
            title: id.to_string(),
            description: format!("The {} node", id),
            category: "utility".to_string(),
            priority,
            dynamic: false,
            cost: ResourceCost::Medium,
        }
    }

    fn signals(usage: Option<&UsageStat>) -> ScoringSignals<'_> {
        ScoringSignals {
            usage,
            learned: false,
            now: Utc::now(),
            decay_hours: 24.0,
        }
    }

    #[test]
    fn test_max_raw_score() {
        assert_eq!(MAX_RAW_SCORE, 135.0);
    }

    #[test]
    fn test_higher_priority_scores_higher() {
        let context = ToolContext::default();
        let a = score_capability(&capability("a", 90), &context, signals(None));
        let b = score_capability(&capability("b", 10), &context, signals(None));
        assert!(a.score > b.score);
    }

    #[test]
    fn test_score_is_normalized_at_extremes() {
        let mut best = capability("slack", 100);
        best.category = "communication".to_string();
        best.dynamic = true;
        best.cost = ResourceCost::Low;

        let usage = UsageStat {
            capability_id: "slack".to_string(),
            call_count: 10_000,
            success_count: 10_000,
            last_used: Utc::now(),
        };
        let context = ToolContext {
            query: Some("slack".to_string()),
            category: Some("communication".to_string()),
            intent: Some(Intent::Execution),
            relevant_node_types: vec!["n8n-nodes-base.slack".to_string()],
            workflow_context: true,
            previous_tools: vec!["slack".to_string()],
            ..ToolContext::default()
        };

        let mut strong = signals(Some(&usage));
        strong.learned = true;
        let score = score_capability(&best, &context, strong);
        assert!(score.score <= 1.0);
        assert!(score.score > 0.95);
        assert_eq!(score.context_match, 1.0);

        let mut worst = capability("x", 0);
        worst.cost = ResourceCost::High;
        let failing = UsageStat {
            capability_id: "x".to_string(),
            call_count: 3,
            success_count: 0,
            last_used: Utc::now() - Duration::days(365),
        };
        let score = score_capability(&worst, &ToolContext::default(), signals(Some(&failing)));
        assert!(score.score >= 0.0);
        assert_eq!(score.success_rate, 0.0);
    }

    #[test]
    fn test_query_prefers_identifier_over_description() {
        let context = ToolContext::with_query("postgres rows");
        let mut by_id = capability("postgres", 50);
        by_id.description = "Database".to_string();
        let mut by_description = capability("mysql", 50);
        by_description.description = "Like postgres".to_string();

        let id_score = score_capability(&by_id, &context, signals(None));
        let description_score = score_capability(&by_description, &context, signals(None));
        assert!(id_score.score > description_score.score);
    }

    #[test]
    fn test_usage_decays_with_age() {
        let recent = UsageStat {
            capability_id: "a".to_string(),
            call_count: 5,
            success_count: 5,
            last_used: Utc::now(),
        };
        let old = UsageStat {
            last_used: Utc::now() - Duration::hours(72),
            ..recent.clone()
        };
        let cap = capability("a", 50);
        let context = ToolContext::default();
        let fresh = score_capability(&cap, &context, signals(Some(&recent)));
        let stale = score_capability(&cap, &context, signals(Some(&old)));
        assert!(fresh.usage_frequency > stale.usage_frequency);
        assert_eq!(fresh.success_rate, 1.0);
    }
}
