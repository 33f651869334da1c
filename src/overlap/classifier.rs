/*!
 * Overlap classifier.
 *
 * Rewrites the values of a target tier from the overlap regions it shares
 * with a source tier. Only the values change; bounds are never touched.
 */

use log::{debug, info, warn};
use serde::Serialize;

use crate::document::AnnotationDocument;
use crate::errors::{AlignError, WithDocument};
use crate::overlap::mapping::ValueMapper;

/// One value rewrite on the target tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rewrite {
    pub start_ms: u64,
    pub end_ms: u64,
    pub old_value: String,
    pub new_value: String,
    /// Classification value of the region that caused it
    pub region_value: String,
}

/// Outcome of one classification run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationReport {
    /// Rewrites in region order
    pub rewrites: Vec<Rewrite>,
    /// Overlap regions skipped because their value is silence
    pub silence_skipped: usize,
    /// Overlap regions whose mapping left the value unchanged
    pub unmapped: usize,
    /// Silence prefixes that matched no region
    pub unmatched_prefixes: Vec<String>,
    /// Mapping rules that matched no region
    pub unmatched_rules: Vec<String>,
}

impl ClassificationReport {
    /// Number of distinct target annotations rewritten
    pub fn rewritten_annotations(&self) -> usize {
        let mut spans: Vec<(u64, u64)> = self.rewrites.iter().map(|r| (r.start_ms, r.end_ms)).collect();
        spans.sort_unstable();
        spans.dedup();
        spans.len()
    }
}

/// Reclassifies target annotations by the source values overlapping them
#[derive(Debug, Clone)]
pub struct OverlapClassifier<M> {
    silence_prefixes: Vec<String>,
    mapper: M,
}

impl<M: ValueMapper> OverlapClassifier<M> {
    pub fn new<S: Into<String>>(silence_prefixes: impl IntoIterator<Item = S>, mapper: M) -> Self {
        Self {
            silence_prefixes: silence_prefixes.into_iter().map(Into::into).collect(),
            mapper,
        }
    }

    pub fn silence_prefixes(&self) -> &[String] {
        &self.silence_prefixes
    }

    fn is_silence(&self, value: &str) -> bool {
        self.silence_prefixes.iter().any(|p| value.starts_with(p.as_str()))
    }

    /// Rewrite `target` values from its overlaps with `source`.
    ///
    /// Later regions win when two regions resolve to the same target
    /// annotation. On error the document is left as it was.
    pub fn classify(
        &self,
        document: &mut AnnotationDocument,
        target: &str,
        source: &str,
    ) -> Result<ClassificationReport, AlignError> {
        let id = document.id().to_string();
        if target == source {
            return Err(AlignError::InvalidRequest {
                document: id,
                reason: format!("cannot classify tier '{}' against itself", target),
            });
        }
        if document.intervals(source).in_document(&id)?.is_empty() {
            return Err(AlignError::EmptyReferenceTier {
                document: id,
                tier: source.to_string(),
            });
        }

        let regions = document
            .decompose_gaps_and_overlaps(source, target)
            .in_document(&id)?;
        let mut working = document.clone();
        let mut report = ClassificationReport::default();
        let mut seen_values: Vec<&str> = Vec::new();

        for region in &regions {
            let Some(value) = region.classification() else {
                continue;
            };
            seen_values.push(value);

            if self.is_silence(value) {
                report.silence_skipped += 1;
                continue;
            }

            let midpoint = region.midpoint();
            let (start_ms, end_ms) = working
                .find_annotation_containing(target, midpoint)
                .in_document(&id)?
                .map(|a| a.span())
                .ok_or_else(|| AlignError::NoContainingAnnotation {
                    document: id.clone(),
                    tier: target.to_string(),
                    source_tier: source.to_string(),
                    time_ms: midpoint,
                    start_ms: region.start_ms,
                    end_ms: region.end_ms,
                })?;

            match self.mapper.map_value(value) {
                Some(new_value) => {
                    let old_value = working
                        .replace_value(target, midpoint, new_value.clone())
                        .in_document(&id)?;
                    debug!(
                        "{}: {}-{}ms '{}' -> '{}' (region {}-{}ms '{}')",
                        document.id(),
                        start_ms,
                        end_ms,
                        old_value,
                        new_value,
                        region.start_ms,
                        region.end_ms,
                        value
                    );
                    report.rewrites.push(Rewrite {
                        start_ms,
                        end_ms,
                        old_value,
                        new_value,
                        region_value: value.to_string(),
                    });
                }
                None => report.unmapped += 1,
            }
        }

        report.unmatched_prefixes = self
            .silence_prefixes
            .iter()
            .filter(|p| !seen_values.iter().any(|v| v.starts_with(p.as_str())))
            .cloned()
            .collect();
        report.unmatched_rules = self.mapper.unmatched_rules(&seen_values);

        for prefix in &report.unmatched_prefixes {
            warn!("{}: silence prefix '{}' matched no overlap region", document.id(), prefix);
        }
        for rule in &report.unmatched_rules {
            warn!("{}: mapping rule '{}' matched no overlap region", document.id(), rule);
        }

        info!(
            "{}: {} regions, {} rewrites on '{}', {} silence regions skipped",
            document.id(),
            regions.len(),
            report.rewrites.len(),
            target,
            report.silence_skipped
        );

        *document = working;
        Ok(report)
    }
}
