/*!
 * Overlap detection and reclassification between two interval tiers.
 *
 * - `decomposition`: gap-and-overlap regions of two tiers
 * - `mapping`: value mapping rules
 * - `classifier`: rewrites target values from overlap regions
 */

pub mod classifier;
pub mod decomposition;
pub mod mapping;

pub use classifier::{ClassificationReport, OverlapClassifier, Rewrite};
pub use decomposition::{Coverage, Region, decompose};
pub use mapping::{PatternRule, ValueMapper, ValueMapping};

use crate::document::AnnotationDocument;
use crate::errors::AlignError;

/// Rewrite `primary` values from the regions it shares with `secondary`
pub fn classify_overlap<M: ValueMapper>(
    document: &mut AnnotationDocument,
    primary: &str,
    secondary: &str,
    silence_prefixes: &[&str],
    mapping: M,
) -> Result<ClassificationReport, AlignError> {
    OverlapClassifier::new(silence_prefixes.iter().copied(), mapping).classify(document, primary, secondary)
}
