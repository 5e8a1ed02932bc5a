//! Context-aware tool selection
//!
//! [`ToolSelector`] owns usage statistics and learned intent patterns. A call to
//! [`ToolSelector::select`] snapshots both and ranks capabilities with the pure
//! [`rank`] function, so no lock is held while scoring.

use crate::error::Result;
use crate::selector::scoring::{score_capability, ScoringSignals};
use crate::selector::types::{
    Intent, SelectableCapability, Selection, SelectorConfig, ToolContext, ToolRelevanceScore, UsageStat,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Ranks capabilities and learns from outcomes
#[derive(Debug)]
pub struct ToolSelector {
    config: SelectorConfig,
    usage: RwLock<HashMap<String, UsageStat>>,
    patterns: RwLock<HashMap<Intent, VecDeque<String>>>,
}

impl ToolSelector {
    pub fn new(config: SelectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            usage: RwLock::new(HashMap::new()),
            patterns: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Score every capability against `context` and return the bounded, ordered subset
    pub async fn select(&self, available: &[SelectableCapability], context: &ToolContext) -> Selection {
        let usage = self.usage.read().await.clone();
        let learned: HashSet<String> = match context.intent {
            Some(intent) => self
                .patterns
                .read()
                .await
                .get(&intent)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default(),
            None => HashSet::new(),
        };

        let selection = rank(available, context, &usage, &learned, &self.config, Utc::now());
        debug!(
            "Selected {} of {} capabilities: {}",
            selection.items.len(),
            available.len(),
            selection.reasoning
        );
        selection
    }

    /// Record the outcome of one invocation
    pub async fn record_outcome(&self, capability_id: &str, success: bool) {
        let mut usage = self.usage.write().await;
        let stat = usage
            .entry(capability_id.to_string())
            .or_insert_with(|| UsageStat::new(capability_id));
        stat.call_count += 1;
        if success {
            stat.success_count += 1;
        }
        stat.last_used = Utc::now();

        prune_usage(&mut usage, self.config.max_tracked_capabilities);
    }

    /// Remember which capabilities were chosen for the context's intent
    pub async fn learn_context_pattern(&self, context: &ToolContext, selected_ids: &[String]) {
        let Some(intent) = context.intent else {
            return;
        };
        if selected_ids.is_empty() {
            return;
        }

        let mut patterns = self.patterns.write().await;
        let learned = patterns.entry(intent).or_default();
        for id in selected_ids {
            learned.retain(|existing| existing != id);
            learned.push_back(id.clone());
        }
        while learned.len() > self.config.max_patterns_per_intent {
            learned.pop_front();
        }
    }

    /// Warm-start usage statistics, keeping the more recent record on conflict
    pub async fn seed_usage(&self, stats: Vec<UsageStat>) {
        let count = stats.len();
        let mut usage = self.usage.write().await;
        for stat in stats {
            match usage.get(&stat.capability_id) {
                Some(existing) if existing.last_used >= stat.last_used => {}
                _ => {
                    usage.insert(stat.capability_id.clone(), stat);
                }
            }
        }
        prune_usage(&mut usage, self.config.max_tracked_capabilities);
        info!("📈 Seeded selector with {} usage records ({} tracked)", count, usage.len());
    }

    /// Current usage statistics, ordered by capability id
    pub async fn usage_stats(&self) -> Vec<UsageStat> {
        let mut stats: Vec<UsageStat> = self.usage.read().await.values().cloned().collect();
        stats.sort_by(|a, b| a.capability_id.cmp(&b.capability_id));
        stats
    }

    /// Capabilities learned for an intent, oldest first
    pub async fn learned_patterns(&self, intent: Intent) -> Vec<String> {
        self.patterns
            .read()
            .await
            .get(&intent)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Drop least-recently-used stats down to 90% of the ceiling (at least one) once it is exceeded
fn prune_usage(usage: &mut HashMap<String, UsageStat>, ceiling: usize) {
    if usage.len() <= ceiling {
        return;
    }

    let target = (ceiling * 9 / 10).max(1);
    let mut by_recency: Vec<(DateTime<Utc>, String)> = usage
        .values()
        .map(|stat| (stat.last_used, stat.capability_id.clone()))
        .collect();
    by_recency.sort();

    let excess = usage.len() - target;
    for (_, id) in by_recency.into_iter().take(excess) {
        usage.remove(&id);
    }
    debug!("Pruned {} usage records", excess);
}

/// Number of items to return when the caller gives no explicit maximum
pub fn adaptive_count(context: &ToolContext, config: &SelectorConfig) -> usize {
    let base: i64 = match context.intent {
        Some(Intent::Discovery) => 15,
        Some(Intent::Analysis) => 12,
        Some(Intent::Troubleshooting) => 10,
        Some(Intent::Execution) => 8,
        Some(Intent::Validation) => 6,
        None => 10,
    };

    let words = context.query_word_count();
    let adjustment = if words > 10 {
        3
    } else if words > 5 {
        2
    } else if words > 0 && words <= 2 {
        -2
    } else {
        0
    };

    (base + adjustment).clamp(config.min_count as i64, config.max_count as i64) as usize
}

/// Rank `available` against `context` using a snapshot of history
pub fn rank(
    available: &[SelectableCapability],
    context: &ToolContext,
    usage: &HashMap<String, UsageStat>,
    learned: &HashSet<String>,
    config: &SelectorConfig,
    now: DateTime<Utc>,
) -> Selection {
    if available.is_empty() {
        return Selection::empty("No capabilities available");
    }

    let threshold = context
        .score_threshold
        .unwrap_or(config.score_threshold)
        .clamp(0.0, 1.0);
    let limit = context.max_tools.unwrap_or_else(|| adaptive_count(context, config));

    let mut scored: Vec<ToolRelevanceScore> = available
        .iter()
        .map(|capability| {
            score_capability(
                capability,
                context,
                ScoringSignals {
                    usage: usage.get(&capability.id),
                    learned: learned.contains(&capability.id),
                    now,
                    decay_hours: config.usage_decay_hours,
                },
            )
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.capability_id.cmp(&b.capability_id))
    });

    let best = scored.first().map(|s| s.score).unwrap_or(0.0);
    let evaluated = scored.len();
    let mut passing: Vec<ToolRelevanceScore> = scored.into_iter().filter(|s| s.score >= threshold).collect();
    passing.truncate(limit);

    if passing.is_empty() {
        if config.fallback_to_top_priority && limit > 0 {
            return priority_fallback(available, context, usage, learned, config, now, limit, threshold);
        }
        return Selection::empty(format!(
            "No capability met threshold {:.2} ({} evaluated, best score {:.2})",
            threshold, evaluated, best
        ));
    }

    let items: Vec<String> = passing.iter().map(|s| s.capability_id.clone()).collect();
    let total_score = passing.iter().map(|s| s.score).sum();
    let top: Vec<&str> = items.iter().take(3).map(String::as_str).collect();
    let reasoning = format!(
        "Selected {} of {} capabilities at threshold {:.2} (limit {}); top: {}",
        items.len(),
        evaluated,
        threshold,
        limit,
        top.join(", ")
    );

    Selection {
        items,
        scores: passing,
        total_score,
        reasoning,
        fallback_used: false,
    }
}

#[allow(clippy::too_many_arguments)]
fn priority_fallback(
    available: &[SelectableCapability],
    context: &ToolContext,
    usage: &HashMap<String, UsageStat>,
    learned: &HashSet<String>,
    config: &SelectorConfig,
    now: DateTime<Utc>,
    limit: usize,
    threshold: f64,
) -> Selection {
    let mut by_priority: Vec<&SelectableCapability> = available.iter().collect();
    by_priority.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));
    by_priority.truncate(config.min_count.min(limit));

    let scores: Vec<ToolRelevanceScore> = by_priority
        .iter()
        .map(|capability| {
            score_capability(
                capability,
                context,
                ScoringSignals {
                    usage: usage.get(&capability.id),
                    learned: learned.contains(&capability.id),
                    now,
                    decay_hours: config.usage_decay_hours,
                },
            )
        })
        .collect();

    Selection {
        items: by_priority.iter().map(|c| c.id.clone()).collect(),
        total_score: scores.iter().map(|s| s.score).sum(),
        scores,
        reasoning: format!(
            "No capability met threshold {:.2}; fell back to the {} highest-priority capabilities",
            threshold,
            by_priority.len()
        ),
        fallback_used: true,
    }
}
