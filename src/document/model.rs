/*!
 * Core annotation document types.
 *
 * A document is an ordered list of uniquely named tiers. Independent tiers
 * hold sorted, non-overlapping intervals; referential tiers hold annotations
 * that point at one annotation of their parent tier and take their timing
 * from it.
 */

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::DocumentError;
use crate::interval::{self, Timed};
use crate::overlap::decomposition::{self, Region};

/// Document-wide annotation identifier
pub type AnnotationId = u64;

/// Interval annotation on an independent tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalAnnotation {
    pub id: AnnotationId,
    pub start_ms: u64,
    pub end_ms: u64,
    pub value: String,
}

impl IntervalAnnotation {
    /// Span as a `(start, end)` pair
    pub fn span(&self) -> (u64, u64) {
        (self.start_ms, self.end_ms)
    }

    /// Midpoint of the annotation, floor division
    pub fn midpoint(&self) -> u64 {
        interval::midpoint(self.start_ms, self.end_ms)
    }
}

impl Timed for IntervalAnnotation {
    fn start_ms(&self) -> u64 {
        self.start_ms
    }

    fn end_ms(&self) -> u64 {
        self.end_ms
    }
}

/// Annotation on a referential tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefAnnotation {
    pub id: AnnotationId,
    /// Id of the annotation on the parent tier
    pub parent_id: AnnotationId,
    pub value: String,
}

/// Association constraint of a structural type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// One-to-one association with the parent annotation, no own timing
    SymbolicAssociation,
}

/// Named tier type that referential tiers are declared with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralType {
    pub name: String,
    pub constraint: Constraint,
    #[serde(default)]
    pub time_alignable: bool,
}

impl StructuralType {
    /// Non-time-alignable symbolic association type
    pub fn symbolic_association(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: Constraint::SymbolicAssociation,
            time_alignable: false,
        }
    }
}

/// Clock a document's offsets are measured against
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    /// Identifier of the recording the offsets refer to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,

    /// Offset of time zero within the recording
    #[serde(default)]
    pub origin_ms: i64,
}

/// What kind of tier to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierSpec {
    Independent,
    Referential {
        parent: String,
        structural_type: String,
    },
}

/// Annotations held by a tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierContent {
    Independent {
        annotations: Vec<IntervalAnnotation>,
    },
    Referential {
        parent: String,
        structural_type: String,
        annotations: Vec<RefAnnotation>,
    },
}

/// Named channel of annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    name: String,
    content: TierContent,
}

impl Tier {
    fn new(name: String, spec: TierSpec) -> Self {
        let content = match spec {
            TierSpec::Independent => TierContent::Independent {
                annotations: Vec::new(),
            },
            TierSpec::Referential {
                parent,
                structural_type,
            } => TierContent::Referential {
                parent,
                structural_type,
                annotations: Vec::new(),
            },
        };
        Self { name, content }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &TierContent {
        &self.content
    }

    pub fn is_independent(&self) -> bool {
        matches!(self.content, TierContent::Independent { .. })
    }

    /// Parent tier name for referential tiers
    pub fn parent(&self) -> Option<&str> {
        match &self.content {
            TierContent::Referential { parent, .. } => Some(parent),
            TierContent::Independent { .. } => None,
        }
    }

    /// Structural type name for referential tiers
    pub fn structural_type(&self) -> Option<&str> {
        match &self.content {
            TierContent::Referential {
                structural_type, ..
            } => Some(structural_type),
            TierContent::Independent { .. } => None,
        }
    }

    /// Intervals of an independent tier, sorted by start
    pub fn intervals(&self) -> Option<&[IntervalAnnotation]> {
        match &self.content {
            TierContent::Independent { annotations } => Some(annotations),
            TierContent::Referential { .. } => None,
        }
    }

    /// Annotations of a referential tier in insertion order
    pub fn references(&self) -> Option<&[RefAnnotation]> {
        match &self.content {
            TierContent::Referential { annotations, .. } => Some(annotations),
            TierContent::Independent { .. } => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.content {
            TierContent::Independent { annotations } => annotations.len(),
            TierContent::Referential { annotations, .. } => annotations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Time-aligned annotation document for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    /// Identifier used in diagnostics, usually the file stem
    #[serde(default)]
    id: String,

    #[serde(default)]
    timeline: Timeline,

    #[serde(default)]
    structural_types: Vec<StructuralType>,

    #[serde(default)]
    tiers: Vec<Tier>,

    #[serde(skip)]
    next_id: AnnotationId,
}

impl AnnotationDocument {
    /// Create an empty document
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeline: Timeline::default(),
            structural_types: Vec::new(),
            tiers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn set_timeline(&mut self, timeline: Timeline) {
        self.timeline = timeline;
    }

    pub fn tiers(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn tier_names(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn has_tier(&self, name: &str) -> bool {
        self.tiers.iter().any(|t| t.name == name)
    }

    pub fn tier(&self, name: &str) -> Result<&Tier, DocumentError> {
        self.tiers
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| DocumentError::TierNotFound {
                tier: name.to_string(),
            })
    }

    fn tier_mut(&mut self, name: &str) -> Result<&mut Tier, DocumentError> {
        self.tiers
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| DocumentError::TierNotFound {
                tier: name.to_string(),
            })
    }

    /// Sorted intervals of an independent tier
    pub fn intervals(&self, name: &str) -> Result<&[IntervalAnnotation], DocumentError> {
        self.tier(name)?
            .intervals()
            .ok_or_else(|| DocumentError::WrongTierKind {
                tier: name.to_string(),
                expected: "an independent tier",
            })
    }

    fn intervals_mut(&mut self, name: &str) -> Result<&mut Vec<IntervalAnnotation>, DocumentError> {
        match &mut self.tier_mut(name)?.content {
            TierContent::Independent { annotations } => Ok(annotations),
            TierContent::Referential { .. } => Err(DocumentError::WrongTierKind {
                tier: name.to_string(),
                expected: "an independent tier",
            }),
        }
    }

    /// `(start, end, value)` for every annotation of a tier.
    ///
    /// Referential annotations report the span of their parent annotation.
    pub fn annotation_data(&self, name: &str) -> Result<Vec<(u64, u64, String)>, DocumentError> {
        let tier = self.tier(name)?;
        match &tier.content {
            TierContent::Independent { annotations } => Ok(annotations
                .iter()
                .map(|a| (a.start_ms, a.end_ms, a.value.clone()))
                .collect()),
            TierContent::Referential {
                parent,
                annotations,
                ..
            } => {
                let parent_intervals = self.intervals(parent)?;
                annotations
                    .iter()
                    .map(|r| {
                        parent_intervals
                            .iter()
                            .find(|p| p.id == r.parent_id)
                            .map(|p| (p.start_ms, p.end_ms, r.value.clone()))
                            .ok_or_else(|| DocumentError::DanglingReference {
                                tier: name.to_string(),
                                id: r.id,
                                parent_id: r.parent_id,
                            })
                    })
                    .collect()
            }
        }
    }

    /// Annotation of an independent tier by id, used to resolve the parent
    /// of a referential annotation
    pub fn annotation_by_id(&self, tier: &str, id: AnnotationId) -> Result<Option<&IntervalAnnotation>, DocumentError> {
        Ok(self.intervals(tier)?.iter().find(|a| a.id == id))
    }

    pub fn structural_types(&self) -> &[StructuralType] {
        &self.structural_types
    }

    pub fn structural_type(&self, name: &str) -> Option<&StructuralType> {
        self.structural_types.iter().find(|t| t.name == name)
    }

    /// Register a structural type, replacing any type of the same name
    pub fn add_structural_type(&mut self, structural_type: StructuralType) {
        match self
            .structural_types
            .iter_mut()
            .find(|t| t.name == structural_type.name)
        {
            Some(existing) => *existing = structural_type,
            None => self.structural_types.push(structural_type),
        }
    }

    /// Append an empty tier
    pub fn add_tier(&mut self, name: &str, spec: TierSpec) -> Result<(), DocumentError> {
        if self.has_tier(name) {
            return Err(DocumentError::DuplicateTier {
                tier: name.to_string(),
            });
        }

        if let TierSpec::Referential {
            parent,
            structural_type,
        } = &spec
        {
            if self.structural_type(structural_type).is_none() {
                return Err(DocumentError::UnknownStructuralType {
                    name: structural_type.clone(),
                });
            }
            // midpoint lookups need a timed parent
            self.intervals(parent)?;
        }

        debug!("{}: adding tier '{}'", self.id, name);
        self.tiers.push(Tier::new(name.to_string(), spec));
        Ok(())
    }

    /// Remove a tier and return it
    pub fn remove_tier(&mut self, name: &str) -> Result<Tier, DocumentError> {
        let idx = self
            .tiers
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| DocumentError::TierNotFound {
                tier: name.to_string(),
            })?;

        if let Some(child) = self.tiers.iter().find(|t| t.parent() == Some(name)) {
            return Err(DocumentError::ParentInUse {
                tier: name.to_string(),
                child: child.name.clone(),
            });
        }

        debug!("{}: removing tier '{}'", self.id, name);
        Ok(self.tiers.remove(idx))
    }

    /// Rename a tier, keeping child tiers attached
    pub fn rename_tier(&mut self, old: &str, new: &str) -> Result<(), DocumentError> {
        if old == new {
            return self.tier(old).map(|_| ());
        }
        if self.has_tier(new) {
            return Err(DocumentError::DuplicateTier {
                tier: new.to_string(),
            });
        }

        self.tier_mut(old)?.name = new.to_string();
        for tier in &mut self.tiers {
            if let TierContent::Referential { parent, .. } = &mut tier.content {
                if parent == old {
                    *parent = new.to_string();
                }
            }
        }
        Ok(())
    }

    /// Insert an interval into an independent tier, keeping it sorted
    pub fn add_annotation(
        &mut self,
        tier: &str,
        start_ms: u64,
        end_ms: u64,
        value: impl Into<String>,
    ) -> Result<AnnotationId, DocumentError> {
        if start_ms > end_ms {
            return Err(DocumentError::InvalidInterval {
                tier: tier.to_string(),
                start_ms,
                end_ms,
            });
        }

        let id = self.next_id;
        let annotations = self.intervals_mut(tier)?;
        let idx = annotations.partition_point(|a| a.span() <= (start_ms, end_ms));

        // sorted and disjoint, so only the neighbours can conflict
        let neighbours = idx.checked_sub(1).into_iter().chain(Some(idx));
        for n in neighbours {
            if let Some(existing) = annotations.get(n) {
                if interval::conflicts(existing.span(), (start_ms, end_ms)) {
                    return Err(DocumentError::OverlappingInterval {
                        tier: tier.to_string(),
                        start_ms,
                        end_ms,
                        existing_start_ms: existing.start_ms,
                        existing_end_ms: existing.end_ms,
                    });
                }
            }
        }

        annotations.insert(
            idx,
            IntervalAnnotation {
                id,
                start_ms,
                end_ms,
                value: value.into(),
            },
        );
        self.next_id += 1;
        Ok(id)
    }

    /// Attach an annotation to the parent annotation containing `anchor_ms`
    pub fn add_ref_annotation(
        &mut self,
        tier: &str,
        parent_tier: &str,
        anchor_ms: u64,
        value: impl Into<String>,
    ) -> Result<AnnotationId, DocumentError> {
        match self.tier(tier)?.parent() {
            Some(parent) if parent == parent_tier => {}
            Some(parent) => {
                return Err(DocumentError::ParentMismatch {
                    tier: tier.to_string(),
                    actual: parent.to_string(),
                    requested: parent_tier.to_string(),
                });
            }
            None => {
                return Err(DocumentError::WrongTierKind {
                    tier: tier.to_string(),
                    expected: "a referential tier",
                });
            }
        }

        let parent_id = self
            .find_annotation_containing(parent_tier, anchor_ms)?
            .map(|p| p.id)
            .ok_or_else(|| DocumentError::NoAnnotationAt {
                tier: parent_tier.to_string(),
                time_ms: anchor_ms,
            })?;

        let id = self.next_id;
        if let TierContent::Referential { annotations, .. } = &mut self.tier_mut(tier)?.content {
            annotations.push(RefAnnotation {
                id,
                parent_id,
                value: value.into(),
            });
        }
        self.next_id += 1;
        Ok(id)
    }

    /// Annotation of an independent tier containing `time_ms`
    pub fn find_annotation_containing(
        &self,
        tier: &str,
        time_ms: u64,
    ) -> Result<Option<&IntervalAnnotation>, DocumentError> {
        let annotations = self.intervals(tier)?;
        Ok(interval::find_containing(annotations, time_ms).map(|idx| &annotations[idx]))
    }

    /// Remove the annotation at `time_ms`.
    ///
    /// On an independent tier this removes the containing interval together
    /// with every referential annotation attached to it. On a referential
    /// tier it removes the annotations attached to the parent annotation at
    /// that time. Returns the number of annotations removed.
    pub fn remove_annotation(&mut self, tier: &str, time_ms: u64) -> Result<usize, DocumentError> {
        let no_annotation = || DocumentError::NoAnnotationAt {
            tier: tier.to_string(),
            time_ms,
        };

        match self.tier(tier)?.parent().map(str::to_string) {
            None => {
                let annotations = self.intervals_mut(tier)?;
                let idx = interval::find_containing(annotations, time_ms).ok_or_else(no_annotation)?;
                let removed = annotations.remove(idx);
                Ok(1 + self.drop_references_to(tier, removed.id))
            }
            Some(parent) => {
                let parent_id = self
                    .find_annotation_containing(&parent, time_ms)?
                    .map(|p| p.id)
                    .ok_or_else(no_annotation)?;
                let mut removed = 0;
                if let TierContent::Referential { annotations, .. } = &mut self.tier_mut(tier)?.content {
                    let before = annotations.len();
                    annotations.retain(|r| r.parent_id != parent_id);
                    removed = before - annotations.len();
                }
                if removed == 0 {
                    return Err(no_annotation());
                }
                Ok(removed)
            }
        }
    }

    fn drop_references_to(&mut self, parent_tier: &str, parent_id: AnnotationId) -> usize {
        let mut removed = 0;
        for tier in &mut self.tiers {
            if let TierContent::Referential {
                parent,
                annotations,
                ..
            } = &mut tier.content
            {
                if parent == parent_tier {
                    let before = annotations.len();
                    annotations.retain(|r| r.parent_id != parent_id);
                    removed += before - annotations.len();
                }
            }
        }
        removed
    }

    /// Replace the value of the interval containing `time_ms`.
    ///
    /// Bounds are untouched. Returns the previous value.
    pub fn replace_value(
        &mut self,
        tier: &str,
        time_ms: u64,
        value: impl Into<String>,
    ) -> Result<String, DocumentError> {
        let annotations = self.intervals_mut(tier)?;
        let idx = interval::find_containing(annotations, time_ms).ok_or_else(|| {
            DocumentError::NoAnnotationAt {
                tier: tier.to_string(),
                time_ms,
            }
        })?;
        Ok(std::mem::replace(&mut annotations[idx].value, value.into()))
    }

    /// Copy an independent tier of another document into this one
    pub fn import_tier(
        &mut self,
        other: &AnnotationDocument,
        source: &str,
        target: &str,
    ) -> Result<usize, DocumentError> {
        let intervals = other.intervals(source)?;
        self.add_tier(target, TierSpec::Independent)?;
        for a in intervals {
            self.add_annotation(target, a.start_ms, a.end_ms, a.value.clone())?;
        }
        debug!(
            "{}: imported {} annotations from '{}:{}' as '{}'",
            self.id,
            intervals.len(),
            other.id,
            source,
            target
        );
        Ok(intervals.len())
    }

    /// Gap-and-overlap decomposition of `source` against `target`.
    ///
    /// Regions carry the value of the covering `source` annotation.
    pub fn decompose_gaps_and_overlaps(&self, source: &str, target: &str) -> Result<Vec<Region>, DocumentError> {
        Ok(decomposition::decompose(
            self.intervals(source)?,
            self.intervals(target)?,
        ))
    }

    /// Check tier invariants and reset the id allocator after loading
    pub(crate) fn restore(&mut self) -> Result<(), DocumentError> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        let mut annotation_count = 0;

        for tier in &self.tiers {
            if !names.insert(tier.name.as_str()) {
                return Err(DocumentError::DuplicateTier {
                    tier: tier.name.clone(),
                });
            }
            match &tier.content {
                TierContent::Independent { annotations } => {
                    for (i, a) in annotations.iter().enumerate() {
                        if a.start_ms > a.end_ms {
                            return Err(DocumentError::InvalidInterval {
                                tier: tier.name.clone(),
                                start_ms: a.start_ms,
                                end_ms: a.end_ms,
                            });
                        }
                        if let Some(prev) = i.checked_sub(1).map(|p| &annotations[p]) {
                            if prev.span() > a.span() || interval::conflicts(prev.span(), a.span()) {
                                return Err(DocumentError::OverlappingInterval {
                                    tier: tier.name.clone(),
                                    start_ms: a.start_ms,
                                    end_ms: a.end_ms,
                                    existing_start_ms: prev.start_ms,
                                    existing_end_ms: prev.end_ms,
                                });
                            }
                        }
                        ids.insert(a.id);
                        annotation_count += 1;
                    }
                }
                TierContent::Referential {
                    structural_type,
                    annotations,
                    ..
                } => {
                    if self.structural_type(structural_type).is_none() {
                        return Err(DocumentError::UnknownStructuralType {
                            name: structural_type.clone(),
                        });
                    }
                    for r in annotations {
                        ids.insert(r.id);
                        annotation_count += 1;
                    }
                }
            }
        }

        for tier in &self.tiers {
            if let TierContent::Referential { parent, .. } = &tier.content {
                self.intervals(parent)?;
                // resolves every reference or reports the first dangling one
                self.annotation_data(&tier.name)?;
            }
        }

        if ids.len() < annotation_count {
            return Err(DocumentError::Codec(format!(
                "duplicate annotation ids in document '{}'",
                self.id
            )));
        }

        self.next_id = ids.iter().max().map_or(1, |max| max + 1);
        Ok(())
    }
}

impl Default for AnnotationDocument {
    fn default() -> Self {
        Self::new("")
    }
}
