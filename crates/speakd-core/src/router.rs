//! Source router — per-source admission filtering and voice resolution.
//!
//! Every submission is routed through a named source (falling back to
//! `default`), which carries the queue priority, an optional voice, and
//! optional regex admission filters. Filters are compiled once here;
//! matching is case-insensitive and linear-time, so a hostile pattern
//! cannot stall admission.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};

use crate::catalog::VoiceCatalog;
use crate::config::{DEFAULT_SOURCE, SourceConfig};
use crate::queue::{SpeechQueue, UtteranceSpec};

/// Upper bound on a compiled filter automaton. Patterns over this limit
/// fail to compile and degrade to non-matching.
const FILTER_SIZE_LIMIT: usize = 1 << 20;

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Whether the utterance was handed to the queue.
    pub admitted: bool,

    /// The queue-assigned request id, when admitted.
    pub id: Option<String>,
}

impl Submission {
    fn rejected() -> Self {
        Self {
            admitted: false,
            id: None,
        }
    }
}

struct CompiledSource {
    voice: Option<String>,
    priority: i32,
    filters: Option<FilterSet>,
}

/// Compiled admission patterns for one source.
///
/// `configured` counts the patterns the operator wrote, including any that
/// failed to compile: a non-empty configured list with zero usable patterns
/// must reject everything, not admit everything.
struct FilterSet {
    patterns: Vec<Regex>,
    configured: usize,
}

impl FilterSet {
    fn compile(source_name: &str, patterns: &[String]) -> Self {
        let compiled = patterns
            .iter()
            .filter_map(|pattern| {
                match RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .size_limit(FILTER_SIZE_LIMIT)
                    .build()
                {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        tracing::warn!(
                            source = source_name,
                            pattern,
                            error = %e,
                            "filter pattern does not compile, treating as non-matching"
                        );
                        None
                    }
                }
            })
            .collect();
        Self {
            patterns: compiled,
            configured: patterns.len(),
        }
    }

    /// Admit iff the list is effectively empty or any pattern matches.
    fn admits(&self, text: &str) -> bool {
        if self.configured == 0 {
            return true;
        }
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

/// Routes submissions to the speech queue.
pub struct SourceRouter {
    sources: HashMap<String, CompiledSource>,
    catalog: VoiceCatalog,
    queue: SpeechQueue,
}

impl SourceRouter {
    /// Compile the configured sources. Invalid filter patterns are logged
    /// and degraded per pattern; they never fail construction.
    pub fn new(
        sources: &HashMap<String, SourceConfig>,
        catalog: VoiceCatalog,
        queue: SpeechQueue,
    ) -> Self {
        let compiled = sources
            .iter()
            .map(|(name, config)| {
                (
                    name.clone(),
                    CompiledSource {
                        voice: config.voice.clone(),
                        priority: config.priority,
                        filters: config
                            .filters
                            .as_deref()
                            .map(|patterns| FilterSet::compile(name, patterns)),
                    },
                )
            })
            .collect();
        Self {
            sources: compiled,
            catalog,
            queue,
        }
    }

    /// Filter, resolve, and enqueue one utterance.
    ///
    /// Rejects when the text trims to empty, when neither the named source
    /// nor `default` is configured, or when the source's filters match
    /// nothing. Otherwise returns the queue's request id.
    pub fn submit(
        &self,
        text: &str,
        source_name: Option<&str>,
        voice_override: Option<&str>,
    ) -> Submission {
        let text = text.trim();
        if text.is_empty() {
            return Submission::rejected();
        }

        let (resolved_name, source) = match self.resolve_source(source_name) {
            Some(found) => found,
            None => {
                tracing::warn!(
                    source = source_name.unwrap_or(DEFAULT_SOURCE),
                    "no matching source and no 'default' configured, rejecting"
                );
                return Submission::rejected();
            }
        };

        if let Some(filters) = &source.filters
            && !filters.admits(text)
        {
            tracing::debug!(source = resolved_name, "utterance did not match source filters");
            return Submission::rejected();
        }

        let requested_voice = voice_override
            .filter(|v| !v.is_empty())
            .or(source.voice.as_deref());
        let voice_id = self.catalog.resolve(requested_voice);

        let id = self.queue.enqueue(UtteranceSpec {
            text: text.to_owned(),
            voice_id,
            priority: source.priority,
            source: resolved_name.to_owned(),
        });
        Submission {
            admitted: true,
            id: Some(id),
        }
    }

    /// The named source if configured, else `default`, else nothing.
    fn resolve_source<'a>(&self, name: Option<&'a str>) -> Option<(&'a str, &CompiledSource)> {
        if let Some(name) = name
            && let Some(source) = self.sources.get(name)
        {
            return Some((name, source));
        }
        self.sources
            .get(DEFAULT_SOURCE)
            .map(|source| (DEFAULT_SOURCE, source))
    }
}
