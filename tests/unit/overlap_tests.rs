/*!
 * Tests for overlap decomposition and reclassification
 */

use tieralign::document::AnnotationDocument;
use tieralign::errors::{AlignError, DocumentError};
use tieralign::overlap::{Coverage, OverlapClassifier, PatternRule, ValueMapping, classify_overlap};
use crate::common;

const SILENCE: &[&str] = &["P", "G"];

/// Document with a `label` primary tier and an `ipa` secondary tier
fn labelled(primary: &[(u64, u64, &str)], secondary: &[(u64, u64, &str)]) -> AnnotationDocument {
    let mut document = common::document_with_tier("rec01", "label", primary);
    common::add_tier(&mut document, "ipa", secondary);
    document
}

fn corpus_mapping() -> ValueMapping {
    ValueMapping::new().with_rule("W12", "TIC").with_default("TIC(+crosstalk?)")
}

#[test]
fn test_classify_withMappedCodeOnBoundary_shouldRewriteLaterAnnotation() {
    common::init_logger();
    let mut document = labelled(&[(0, 1000, "TALK"), (1000, 2000, "TALK")], &[(500, 1500, "W12")]);

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, ValueMapping::new().with_rule("W12", "TIC"))
        .unwrap();

    assert_eq!(
        common::data(&document, "label"),
        common::triples(&[(0, 1000, "TALK"), (1000, 2000, "TIC")])
    );
    assert_eq!(report.rewrites.len(), 1);
    assert_eq!(report.rewrites[0].region_value, "W12");
    assert_eq!(report.rewrites[0].old_value, "TALK");
    assert_eq!((report.rewrites[0].start_ms, report.rewrites[0].end_ms), (1000, 2000));
}

#[test]
fn test_classify_withUnmappedCode_shouldUseDefault() {
    let mut document = labelled(&[(0, 1000, "TALK"), (1000, 2000, "TALK")], &[(500, 1500, "W45")]);

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping()).unwrap();

    assert_eq!(
        common::data(&document, "label"),
        common::triples(&[(0, 1000, "TALK"), (1000, 2000, "TIC(+crosstalk?)")])
    );
    assert_eq!(report.unmatched_rules, vec!["W12".to_string()]);
}

#[test]
fn test_classify_withSilenceRegion_shouldLeaveDocumentUnchanged() {
    let mut document = labelled(&[(0, 2000, "TALK")], &[(0, 1000, "P1")]);
    let before = common::data(&document, "label");

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping()).unwrap();

    assert_eq!(common::data(&document, "label"), before);
    assert!(report.rewrites.is_empty());
    assert_eq!(report.silence_skipped, 1);
    assert_eq!(report.unmatched_prefixes, vec!["G".to_string()]);
}

#[test]
fn test_classify_shouldPreserveBoundariesAndCount() {
    let primary = [(0, 700, "A"), (700, 1500, "B"), (1600, 2600, "C"), (3000, 3100, "D")];
    let mut document = labelled(&primary, &[(100, 600, "W1"), (800, 2000, "W12"), (2900, 3050, "G3")]);

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping()).unwrap();

    let spans: Vec<(u64, u64)> = document.intervals("label").unwrap().iter().map(|a| a.span()).collect();
    assert_eq!(spans, vec![(0, 700), (700, 1500), (1600, 2600), (3000, 3100)]);
    assert_eq!(report.silence_skipped, 1);
    assert_eq!(report.rewrites.len(), 3);
    assert_eq!(report.unmatched_prefixes, vec!["P".to_string()]);
}

/// Two regions resolving to the same annotation: the later one wins
#[test]
fn test_classify_withTwoRegionsOnOneAnnotation_shouldKeepLastValue() {
    let mut document = labelled(&[(0, 2000, "TALK")], &[(100, 500, "W12"), (800, 1200, "W99")]);

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping()).unwrap();

    assert_eq!(common::data(&document, "label"), common::triples(&[(0, 2000, "TIC(+crosstalk?)")]));
    assert_eq!(report.rewrites.len(), 2);
    assert_eq!(report.rewritten_annotations(), 1);
}

#[test]
fn test_classify_withSourceOutsideTarget_shouldIgnoreNonOverlapRegions() {
    let mut document = labelled(&[(1000, 2000, "TALK")], &[(0, 500, "W12"), (2500, 3000, "W12")]);

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping()).unwrap();

    assert_eq!(common::data(&document, "label"), common::triples(&[(1000, 2000, "TALK")]));
    assert!(report.rewrites.is_empty());
    assert_eq!(report.silence_skipped, 0);
}

#[test]
fn test_classify_withClosureReturningNone_shouldCountUnmapped() {
    let mut document = labelled(&[(0, 1000, "TALK"), (1000, 2000, "TALK")], &[(100, 400, "W12"), (1200, 1400, "X")]);
    let mapper = |value: &str| value.starts_with('W').then(|| format!("TIC:{}", value));

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, mapper).unwrap();

    assert_eq!(
        common::data(&document, "label"),
        common::triples(&[(0, 1000, "TIC:W12"), (1000, 2000, "TALK")])
    );
    assert_eq!(report.unmapped, 1);
    assert!(report.unmatched_rules.is_empty());
}

#[test]
fn test_classify_withPatternRule_shouldApplyAfterExactRules() {
    let mut document = labelled(&[(0, 1000, "TALK"), (1000, 2000, "TALK")], &[(100, 400, "W12"), (1200, 1400, "O7")]);
    let mapping = ValueMapping::new()
        .with_rule("W12", "TIC")
        .with_pattern(PatternRule::new("^W", "never").unwrap())
        .with_pattern(PatternRule::new("^O[0-9]+$", "OTHER").unwrap());

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, mapping).unwrap();

    assert_eq!(
        common::data(&document, "label"),
        common::triples(&[(0, 1000, "TIC"), (1000, 2000, "OTHER")])
    );
    // "^W" matches W12 even though the exact rule took precedence
    assert!(report.unmatched_rules.is_empty());
}

#[test]
fn test_classify_withUnusedPattern_shouldReportIt() {
    let mut document = labelled(&[(0, 1000, "TALK")], &[(100, 400, "W12")]);
    let mapping = corpus_mapping().with_pattern(PatternRule::new("^Z", "Z").unwrap());

    let report = classify_overlap(&mut document, "label", "ipa", SILENCE, mapping).unwrap();

    assert_eq!(report.unmatched_rules, vec!["/^Z/".to_string()]);
}

#[test]
fn test_classify_withEmptySource_shouldFail() {
    let mut document = labelled(&[(0, 1000, "TALK")], &[]);

    let result = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping());

    assert!(matches!(result, Err(AlignError::EmptyReferenceTier { ref tier, .. }) if tier == "ipa"));
}

#[test]
fn test_classify_withMissingTier_shouldFail() {
    let mut document = labelled(&[(0, 1000, "TALK")], &[(100, 400, "W12")]);

    let result = classify_overlap(&mut document, "missing", "ipa", SILENCE, corpus_mapping());

    assert!(matches!(
        result,
        Err(AlignError::Document { source: DocumentError::TierNotFound { ref tier }, .. }) if tier == "missing"
    ));
}

#[test]
fn test_classify_withMissingTier_shouldNameDocument() {
    let mut document = common::document_with_tier("rec79", "label", &[(0, 1000, "TALK")]);

    let error = classify_overlap(&mut document, "label", "ipa", SILENCE, corpus_mapping()).unwrap_err();

    assert_eq!(error.to_string(), "rec79: Tier 'ipa' not found");
}

#[test]
fn test_classify_withSameTier_shouldFail() {
    let mut document = labelled(&[(0, 1000, "TALK")], &[(100, 400, "W12")]);

    let result = classify_overlap(&mut document, "label", "label", SILENCE, corpus_mapping());

    assert!(matches!(result, Err(AlignError::InvalidRequest { .. })));
}

#[test]
fn test_classifier_shouldBeReusableAcrossDocuments() {
    let classifier = OverlapClassifier::new(["P", "G"], corpus_mapping());
    assert_eq!(classifier.silence_prefixes(), &["P".to_string(), "G".to_string()]);

    for id in ["a", "b"] {
        let mut document = labelled(&[(0, 1000, "TALK")], &[(100, 400, "W12")]);
        document.set_id(id);
        let report = classifier.classify(&mut document, "label", "ipa").unwrap();
        assert_eq!(report.rewrites.len(), 1);
        assert_eq!(common::data(&document, "label"), common::triples(&[(0, 1000, "TIC")]));
    }
}

#[test]
fn test_decompose_shouldCoverCombinedTimeline() {
    let document = labelled(&[(0, 1000, "TALK"), (1000, 2000, "TALK")], &[(500, 1500, "W12"), (2500, 3000, "P1")]);

    let regions = document.decompose_gaps_and_overlaps("ipa", "label").unwrap();

    let shape: Vec<(u64, u64, Coverage, Option<&str>)> = regions
        .iter()
        .map(|r| (r.start_ms, r.end_ms, r.coverage, r.classification()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (0, 500, Coverage::TargetOnly, None),
            (500, 1500, Coverage::Overlap, Some("W12")),
            (1500, 2000, Coverage::TargetOnly, None),
            (2000, 2500, Coverage::Gap, None),
            (2500, 3000, Coverage::SourceOnly, None),
        ]
    );
    assert!(regions.iter().all(|r| r.duration_ms() > 0));
    assert!(regions.windows(2).all(|w| w[0].end_ms == w[1].start_ms));
}

#[test]
fn test_decompose_withTouchingSourceAnnotations_shouldSplitRegions() {
    let document = labelled(&[(0, 2000, "TALK")], &[(0, 1000, "W1"), (1000, 2000, "W2")]);

    let regions = document.decompose_gaps_and_overlaps("ipa", "label").unwrap();

    let values: Vec<Option<&str>> = regions.iter().map(|r| r.classification()).collect();
    assert_eq!(values, vec![Some("W1"), Some("W2")]);
}
