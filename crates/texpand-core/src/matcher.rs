//! Trigger matching against the typed buffer.
//!
//! A [`TriggerSnapshot`] is an immutable, pre-sorted view of the active
//! triggers. Literal keywords are tried longest first; regex triggers are only
//! consulted when no literal matched.

use crate::buffer::{fold_char, TypedBuffer};
use crate::models::{ActiveTrigger, TriggerSpec};
use regex::Regex;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::warn;

/// One trigger as held by a snapshot
#[derive(Debug)]
pub struct Trigger {
    pub spec: TriggerSpec,
    pub template: String,
    folded: Vec<char>,
}

struct CompiledPattern {
    regex: Regex,
    trigger: Arc<Trigger>,
}

/// Outcome of a successful match
#[derive(Debug, Clone)]
pub struct TriggerMatch {
    pub trigger: Arc<Trigger>,
    /// Number of typed characters the expansion replaces
    pub matched_length: usize,
}

#[derive(Default)]
pub struct TriggerSnapshot {
    literals: Vec<Arc<Trigger>>,
    patterns: Vec<CompiledPattern>,
}

impl TriggerSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from the triggers a source reported.
    ///
    /// Invalid regex triggers and empty keywords are dropped with a warning;
    /// they never affect the remaining triggers.
    pub fn build(triggers: Vec<ActiveTrigger>) -> Self {
        let mut literals = Vec::new();
        let mut patterns = Vec::new();

        for ActiveTrigger { spec, template } in triggers {
            if spec.keyword.is_empty() {
                warn!(trigger = %spec.id, "Skipping trigger with empty keyword");
                continue;
            }

            if spec.is_regex {
                match anchored(&spec.keyword) {
                    Ok(regex) => patterns.push(CompiledPattern {
                        regex,
                        trigger: Arc::new(Trigger {
                            spec,
                            template,
                            folded: Vec::new(),
                        }),
                    }),
                    Err(e) => {
                        warn!(trigger = %spec.id, "Skipping invalid trigger pattern: {}", e);
                    }
                }
            } else {
                let folded = spec.keyword.chars().map(fold_char).collect();
                literals.push(Arc::new(Trigger {
                    spec,
                    template,
                    folded,
                }));
            }
        }

        // Stable sorts keep source order among equals
        literals.sort_by_key(|t| (Reverse(t.folded.len()), Reverse(t.spec.priority)));
        patterns.sort_by_key(|p| Reverse(p.trigger.spec.priority));

        Self { literals, patterns }
    }

    /// Check that a regex keyword compiles the way the matcher compiles it
    pub fn validate_pattern(pattern: &str) -> Result<(), regex::Error> {
        anchored(pattern).map(|_| ())
    }

    pub fn len(&self) -> usize {
        self.literals.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the trigger the buffer currently ends with, if any
    pub fn find_match(&self, buffer: &TypedBuffer) -> Option<TriggerMatch> {
        if buffer.is_empty() {
            return None;
        }

        if let Some(trigger) = self
            .literals
            .iter()
            .find(|t| buffer.ends_with_ignore_case(&t.folded))
        {
            return Some(TriggerMatch {
                trigger: Arc::clone(trigger),
                matched_length: trigger.folded.len(),
            });
        }

        if self.patterns.is_empty() {
            return None;
        }

        let text = buffer.as_string();
        self.patterns.iter().find_map(|pattern| {
            let found = pattern.regex.find(&text)?;
            let matched_length = text[found.start()..].chars().count();
            (matched_length > 0).then(|| TriggerMatch {
                trigger: Arc::clone(&pattern.trigger),
                matched_length,
            })
        })
    }
}

/// Anchored so a match is always a suffix of the buffer
fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?:{})\\z", pattern))
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
