/*!
 * Tests for flat-to-hierarchical tier conversion
 */

use anyhow::Result;
use tieralign::document::{AnnotationDocument, StructuralType, TierSpec};
use tieralign::errors::{AlignError, DocumentError};
use tieralign::hierarchize;
use crate::common;

fn utterances() -> AnnotationDocument {
    common::document_with_tier("rec01", "label", &[(0, 1000, "U1"), (1000, 2000, "U2")])
}

/// Value of the parent annotation each child annotation is attached to
fn parent_values(document: &AnnotationDocument, child: &str, parent: &str) -> Vec<(String, String)> {
    document
        .tier(child)
        .unwrap()
        .references()
        .unwrap()
        .iter()
        .map(|r| {
            let parent = document.annotation_by_id(parent, r.parent_id).unwrap().unwrap();
            (parent.value.clone(), r.value.clone())
        })
        .collect()
}

#[test]
fn test_hierarchize_withFlatChild_shouldAttachToMidpointParent() -> Result<()> {
    common::init_logger();
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello"), (1300, 1600, "world")]);

    let report = hierarchize(&mut document, "label", &["ENG"], "ac_prob")?;

    let tier = document.tier("ENG")?;
    assert!(!tier.is_independent());
    assert_eq!(tier.parent(), Some("label"));
    assert_eq!(tier.structural_type(), Some("ac_prob"));
    assert_eq!(
        parent_values(&document, "ENG", "label"),
        vec![
            ("U1".to_string(), "hello".to_string()),
            ("U2".to_string(), "world".to_string())
        ]
    );
    assert_eq!(
        common::data(&document, "ENG"),
        common::triples(&[(0, 1000, "hello"), (1000, 2000, "world")])
    );
    assert_eq!(report.total_annotations(), 2);
    assert_eq!(report.tiers[0].shared_parents, 0);
    Ok(())
}

#[test]
fn test_hierarchize_shouldRegisterSymbolicAssociation() -> Result<()> {
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello")]);

    hierarchize(&mut document, "label", &["ENG"], "ac_prob")?;

    let structural_type = document.structural_type("ac_prob").unwrap();
    assert_eq!(structural_type, &StructuralType::symbolic_association("ac_prob"));
    assert!(!structural_type.time_alignable);
    Ok(())
}

#[test]
fn test_hierarchize_withOrphanAnnotation_shouldReportTimeRange() {
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello"), (2100, 2300, "orphan")]);

    let result = hierarchize(&mut document, "label", &["ENG"], "ac_prob");

    match result {
        Err(error @ AlignError::NoContainingAnnotation { .. }) => {
            assert!(error.is_containment());
            let message = error.to_string();
            assert!(message.contains("rec01"));
            assert!(message.contains("2200ms"));
            assert!(message.contains("2100-2300ms"));
            assert!(message.contains("'ENG'"));
        }
        other => panic!("expected containment error, got {:?}", other),
    }
}

#[test]
fn test_hierarchize_onError_shouldLeaveDocumentUnchanged() {
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello")]);
    common::add_tier(&mut document, "TIC", &[(2100, 2300, "orphan")]);

    let result = hierarchize(&mut document, "label", &["ENG", "TIC"], "ac_prob");

    assert!(result.is_err());
    assert!(document.tier("ENG").unwrap().is_independent());
    assert!(document.tier("TIC").unwrap().is_independent());
    assert!(document.structural_type("ac_prob").is_none());
}

#[test]
fn test_hierarchize_withMissingChild_shouldFail() {
    let mut document = utterances();

    let result = hierarchize(&mut document, "label", &["ENG"], "ac_prob");

    assert!(matches!(
        result,
        Err(AlignError::Document { source: DocumentError::TierNotFound { ref tier }, .. }) if tier == "ENG"
    ));
}

#[test]
fn test_hierarchize_withMissingChild_shouldNameDocument() {
    let mut document = common::document_with_tier("rec78", "label", &[(0, 1000, "U1")]);

    let error = hierarchize(&mut document, "label", &["ENG"], "ac_prob").unwrap_err();

    let message = error.to_string();
    assert!(message.contains("rec78"), "{}", message);
    assert!(message.contains("'ENG'"), "{}", message);
}

#[test]
fn test_hierarchize_withChildEqualToParent_shouldFail() {
    let mut document = utterances();

    let result = hierarchize(&mut document, "label", &["label"], "ac_prob");

    assert!(matches!(result, Err(AlignError::InvalidRequest { .. })));
}

#[test]
fn test_hierarchize_withDuplicateChild_shouldFail() {
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello")]);

    let result = hierarchize(&mut document, "label", &["ENG", "ENG"], "ac_prob");

    assert!(matches!(result, Err(AlignError::InvalidRequest { .. })));
    assert!(document.tier("ENG").unwrap().is_independent());
}

#[test]
fn test_hierarchize_twice_shouldRejectReferentialChild() -> Result<()> {
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello")]);
    hierarchize(&mut document, "label", &["ENG"], "ac_prob")?;
    let converted = common::data(&document, "ENG");

    let result = hierarchize(&mut document, "label", &["ENG"], "ac_prob");

    assert!(matches!(
        result,
        Err(AlignError::Document { source: DocumentError::WrongTierKind { .. }, .. })
    ));
    assert_eq!(common::data(&document, "ENG"), converted);
    Ok(())
}

#[test]
fn test_hierarchize_withReferentialParent_shouldFail() -> Result<()> {
    let mut document = utterances();
    document.add_structural_type(StructuralType::symbolic_association("ac_prob"));
    document.add_tier(
        "notes",
        TierSpec::Referential {
            parent: "label".to_string(),
            structural_type: "ac_prob".to_string(),
        },
    )?;
    common::add_tier(&mut document, "ENG", &[(100, 300, "hello")]);

    let result = hierarchize(&mut document, "notes", &["ENG"], "ac_prob");

    assert!(matches!(
        result,
        Err(AlignError::Document { source: DocumentError::WrongTierKind { ref tier, .. }, .. }) if tier == "notes"
    ));
    Ok(())
}

#[test]
fn test_hierarchize_withSeveralChildrenPerParent_shouldCountSharedParents() -> Result<()> {
    let mut document = utterances();
    common::add_tier(
        &mut document,
        "ENG",
        &[(100, 300, "one"), (400, 600, "two"), (700, 900, "three"), (1200, 1400, "four")],
    );

    let report = hierarchize(&mut document, "label", &["ENG"], "ac_prob")?;

    assert_eq!(report.tiers[0].annotations, 4);
    assert_eq!(report.tiers[0].shared_parents, 2);
    let attached: Vec<String> = parent_values(&document, "ENG", "label").into_iter().map(|(p, _)| p).collect();
    assert_eq!(attached, vec!["U1", "U1", "U1", "U2"]);
    Ok(())
}

/// Every converted annotation's parent contains the flat annotation's midpoint
#[test]
fn test_hierarchize_shouldKeepMidpointsInsideParents() -> Result<()> {
    let mut document = common::document_with_tier(
        "rec02",
        "label",
        &[(0, 700, "A"), (700, 1500, "B"), (1600, 2600, "C")],
    );
    let flat = [(0, 300, "x"), (650, 800, "y"), (1500, 1800, "z"), (2500, 2600, "w")];
    common::add_tier(&mut document, "TIC", &flat);

    hierarchize(&mut document, "label", &["TIC"], "ac_prob")?;

    let parents = common::data(&document, "TIC");
    assert_eq!(parents.len(), flat.len());
    for ((start, end, value), (parent_start, parent_end, attached)) in flat.iter().zip(&parents) {
        let midpoint = start + (end - start) / 2;
        assert!(*parent_start <= midpoint && midpoint <= *parent_end);
        assert_eq!(attached, value);
    }
    Ok(())
}

#[test]
fn test_hierarchize_withEmptyChild_shouldProduceEmptyReferentialTier() -> Result<()> {
    let mut document = utterances();
    common::add_tier(&mut document, "ENG", &[]);

    let report = hierarchize(&mut document, "label", &["ENG"], "ac_prob")?;

    assert_eq!(report.total_annotations(), 0);
    assert!(!document.tier("ENG")?.is_independent());
    assert!(document.tier("ENG")?.is_empty());
    Ok(())
}

/// Flat document with two child tiers, rebuilt from scratch on every call
fn flat_snapshot() -> AnnotationDocument {
    let mut document = common::document_with_tier(
        "rec03",
        "label",
        &[(0, 1000, "U1"), (1000, 2000, "U2"), (2000, 3500, "U3")],
    );
    common::add_tier(
        &mut document,
        "ENG",
        &[(100, 300, "hello"), (400, 900, "there"), (1200, 1900, "world"), (2100, 3400, "again")],
    );
    common::add_tier(&mut document, "TIC", &[(0, 1000, "laugh"), (2500, 2700, "cough")]);
    document
}

/// Parent id and value of each referential annotation, in tier order
fn references(document: &AnnotationDocument, child: &str) -> Vec<(u64, String)> {
    document
        .tier(child)
        .unwrap()
        .references()
        .unwrap()
        .iter()
        .map(|r| (r.parent_id, r.value.clone()))
        .collect()
}

#[test]
fn test_hierarchize_onIdenticalSnapshots_shouldProduceIdenticalResults() -> Result<()> {
    let mut first = flat_snapshot();
    let mut second = flat_snapshot();

    let first_report = hierarchize(&mut first, "label", &["ENG", "TIC"], "ac_prob")?;
    let second_report = hierarchize(&mut second, "label", &["ENG", "TIC"], "ac_prob")?;

    assert_eq!(first_report.total_annotations(), second_report.total_annotations());
    for child in ["ENG", "TIC"] {
        assert_eq!(parent_values(&first, child, "label"), parent_values(&second, child, "label"));
        assert_eq!(references(&first, child), references(&second, child));
        assert_eq!(common::data(&first, child), common::data(&second, child));
    }
    assert_eq!(
        parent_values(&first, "ENG", "label"),
        vec![
            ("U1".to_string(), "hello".to_string()),
            ("U1".to_string(), "there".to_string()),
            ("U2".to_string(), "world".to_string()),
            ("U3".to_string(), "again".to_string())
        ]
    );
    Ok(())
}
