/*!
 * Flat-to-hierarchical tier conversion.
 *
 * Each flat child tier is replaced by a referential tier of the same name.
 * Every child interval becomes an annotation attached to the parent
 * annotation containing the interval's midpoint.
 */

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::document::{AnnotationDocument, AnnotationId, StructuralType, TierSpec};
use crate::errors::{AlignError, DocumentError, WithDocument};
use crate::interval;

/// Result of converting one child tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedTier {
    pub name: String,
    pub annotations: usize,
    /// Parent annotations that received more than one child annotation
    pub shared_parents: usize,
}

/// Outcome of one hierarchization
#[derive(Debug, Clone, Default, Serialize)]
pub struct HierarchyReport {
    pub parent_tier: String,
    pub tiers: Vec<ConvertedTier>,
}

impl HierarchyReport {
    pub fn total_annotations(&self) -> usize {
        self.tiers.iter().map(|t| t.annotations).sum()
    }
}

/// Turn flat `child_tiers` into referential tiers under `parent_tier`.
///
/// `child_type` is registered as a non-time-alignable symbolic association
/// unless a structural type of that name already exists. On error the
/// document is left as it was.
pub fn hierarchize<S: AsRef<str>>(
    document: &mut AnnotationDocument,
    parent_tier: &str,
    child_tiers: &[S],
    child_type: &str,
) -> Result<HierarchyReport, AlignError> {
    let invalid = |reason: String| AlignError::InvalidRequest {
        document: document.id().to_string(),
        reason,
    };

    let mut names = HashSet::new();
    for child in child_tiers.iter().map(AsRef::as_ref) {
        if child == parent_tier {
            return Err(invalid(format!("tier '{}' cannot be its own parent", child)));
        }
        if !names.insert(child) {
            return Err(invalid(format!("child tier '{}' listed twice", child)));
        }
    }

    // the parent must be a timed tier
    document.intervals(parent_tier).in_document(document.id())?;

    let mut working = document.clone();
    if working.structural_type(child_type).is_none() {
        working.add_structural_type(StructuralType::symbolic_association(child_type));
    }

    let mut report = HierarchyReport {
        parent_tier: parent_tier.to_string(),
        tiers: Vec::new(),
    };

    for child in child_tiers.iter().map(AsRef::as_ref) {
        let converted = convert_tier(&mut working, parent_tier, child, child_type)?;
        if converted.shared_parents > 0 {
            warn!(
                "{}: {} annotations on '{}' share a parent with another annotation",
                working.id(),
                converted.shared_parents,
                child
            );
        }
        report.tiers.push(converted);
    }

    info!(
        "{}: attached {} annotations from {} tiers to '{}'",
        working.id(),
        report.total_annotations(),
        report.tiers.len(),
        parent_tier
    );

    *document = working;
    Ok(report)
}

fn convert_tier(
    document: &mut AnnotationDocument,
    parent_tier: &str,
    child: &str,
    child_type: &str,
) -> Result<ConvertedTier, AlignError> {
    let id = document.id().to_string();
    let flat = match document.tier(child).in_document(&id)?.intervals() {
        Some(intervals) => intervals.to_vec(),
        None => {
            return Err(DocumentError::WrongTierKind {
                tier: child.to_string(),
                expected: "an independent tier",
            }
            .in_document(id));
        }
    };

    document.remove_tier(child).in_document(&id)?;
    document
        .add_tier(
            child,
            TierSpec::Referential {
                parent: parent_tier.to_string(),
                structural_type: child_type.to_string(),
            },
        )
        .in_document(&id)?;

    let mut per_parent: HashMap<AnnotationId, usize> = HashMap::new();
    for annotation in &flat {
        let midpoint = annotation.midpoint();
        let parent_id = document
            .find_annotation_containing(parent_tier, midpoint)
            .in_document(&id)?
            .map(|p| p.id)
            .ok_or_else(|| AlignError::NoContainingAnnotation {
                document: id.clone(),
                tier: parent_tier.to_string(),
                source_tier: child.to_string(),
                time_ms: midpoint,
                start_ms: annotation.start_ms,
                end_ms: annotation.end_ms,
            })?;

        document
            .add_ref_annotation(child, parent_tier, midpoint, annotation.value.clone())
            .in_document(&id)?;
        *per_parent.entry(parent_id).or_default() += 1;
    }

    debug!(
        "{}: '{}' converted, {} annotations starting at {}",
        document.id(),
        child,
        flat.len(),
        flat.first()
            .map(|a| interval::format_offset(a.start_ms))
            .unwrap_or_else(|| "empty".to_string())
    );

    Ok(ConvertedTier {
        name: child.to_string(),
        annotations: flat.len(),
        shared_parents: per_parent.values().filter(|&&n| n > 1).map(|n| n - 1).sum(),
    })
}
