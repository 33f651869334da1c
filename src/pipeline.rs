/*!
 * Per-document restructuring pipeline.
 *
 * A primary document and a secondary document holding the transcription
 * tier go through overlap classification, then hierarchization, and the
 * result is written to the output directory. Documents are processed one at
 * a time; a document that fails any step is never written.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::app_config::{Config, FailurePolicy, TimelineCheck};
use crate::document::{AnnotationDocument, DocumentCodec, JsonCodec};
use crate::errors::{AlignError, WithDocument};
use crate::file_utils::FileManager;
use crate::hierarchy::{self, HierarchyReport};
use crate::overlap::{ClassificationReport, OverlapClassifier, ValueMapping};

/// Input files for one recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    /// Document holding the primary tier and the flat child tiers
    pub primary: PathBuf,
    /// Document holding the transcription tier
    pub secondary: PathBuf,
}

impl DocumentPair {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }
}

/// A document that went through both stages
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub output_path: PathBuf,
    /// Intermediate document after overlap classification, if written
    pub overlap_path: Option<PathBuf>,
    pub classification: ClassificationReport,
    pub hierarchy: HierarchyReport,
}

/// A document rejected for manual correction
#[derive(Debug, Clone)]
pub struct RejectedDocument {
    pub primary: PathBuf,
    pub reason: String,
}

/// Outcome of a corpus run
#[derive(Debug, Clone, Default)]
pub struct CorpusReport {
    pub processed: Vec<ProcessedDocument>,
    pub rejected: Vec<RejectedDocument>,
}

/// Compare the clocks of two documents.
///
/// Differing origins are always a mismatch. Differing media identifiers are
/// a mismatch in strict mode and a warning in lenient mode. An undeclared
/// media identifier is not compared.
pub fn check_timelines(
    primary: &AnnotationDocument,
    secondary: &AnnotationDocument,
    mode: TimelineCheck,
) -> Result<(), AlignError> {
    if mode == TimelineCheck::Off {
        return Ok(());
    }

    let mismatch = |reason: String| AlignError::TimelineMismatch {
        document: primary.id().to_string(),
        other: secondary.id().to_string(),
        reason,
    };

    let (a, b) = (primary.timeline(), secondary.timeline());
    if a.origin_ms != b.origin_ms {
        return Err(mismatch(format!("origin {}ms vs {}ms", a.origin_ms, b.origin_ms)));
    }

    if let (Some(media_a), Some(media_b)) = (&a.media, &b.media) {
        if media_a != media_b {
            let reason = format!("media '{}' vs '{}'", media_a, media_b);
            match mode {
                TimelineCheck::Strict => return Err(mismatch(reason)),
                _ => warn!("{}: timeline differs from '{}': {}", primary.id(), secondary.id(), reason),
            }
        }
    }

    Ok(())
}

/// Restructuring pipeline built from a validated configuration
pub struct Pipeline {
    config: Config,
    classifier: OverlapClassifier<ValueMapping>,
    codec: Box<dyn DocumentCodec>,
}

impl Pipeline {
    /// Create a pipeline reading and writing JSON documents
    pub fn new(config: Config) -> Result<Self> {
        Self::with_codec(config, Box::new(JsonCodec::pretty()))
    }

    /// Create a pipeline with a custom document codec
    pub fn with_codec(config: Config, codec: Box<dyn DocumentCodec>) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let classifier = OverlapClassifier::new(
            config.overlap.silence_prefixes.iter().cloned(),
            config.value_mapping()?,
        );
        Ok(Self {
            config,
            classifier,
            codec,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Overlap stage on in-memory documents.
    ///
    /// Renames the primary source tier if configured, imports the secondary
    /// tier, classifies, then removes the transient and dropped tiers.
    pub fn apply_overlap_stage(
        &self,
        primary: &mut AnnotationDocument,
        secondary: &AnnotationDocument,
    ) -> Result<ClassificationReport, AlignError> {
        let overlap = &self.config.overlap;
        check_timelines(primary, secondary, self.config.timeline_check)?;

        let id = primary.id().to_string();
        let mut working = primary.clone();
        if let Some(source) = &overlap.primary_source_tier {
            if working.has_tier(source) {
                working.rename_tier(source, &overlap.primary_tier).in_document(&id)?;
            }
        }

        working
            .import_tier(secondary, &overlap.secondary_source_tier, &overlap.transient_tier)
            .in_document(&id)?;
        let report = self
            .classifier
            .classify(&mut working, &overlap.primary_tier, &overlap.transient_tier)?;

        working.remove_tier(&overlap.transient_tier).in_document(&id)?;
        for tier in &overlap.drop_tiers {
            if working.has_tier(tier) {
                working.remove_tier(tier).in_document(&id)?;
            } else {
                debug!("{}: tier '{}' to drop is not present", working.id(), tier);
            }
        }

        *primary = working;
        Ok(report)
    }

    /// Hierarchization stage on an in-memory document
    pub fn apply_hierarchy_stage(&self, document: &mut AnnotationDocument) -> Result<HierarchyReport, AlignError> {
        let settings = &self.config.hierarchy;
        hierarchy::hierarchize(
            document,
            &settings.parent_tier,
            &settings.child_tiers,
            &settings.child_type,
        )
    }

    /// Run both stages for one document pair and write the results
    pub fn process(&self, pair: &DocumentPair) -> Result<ProcessedDocument> {
        let start_time = Instant::now();
        let output = &self.config.output;

        let output_path = FileManager::output_path(&pair.primary, &output.output_dir);
        let overlap_path = output
            .overlap_dir
            .as_ref()
            .map(|dir| FileManager::output_path(&pair.primary, dir));
        for path in std::iter::once(&output_path).chain(overlap_path.as_ref()) {
            self.check_collision(path)?;
        }

        let mut document = AnnotationDocument::load_with(&pair.primary, self.codec.as_ref())
            .with_context(|| format!("Failed to load primary document: {}", pair.primary.display()))?;
        let secondary = AnnotationDocument::load_with(&pair.secondary, self.codec.as_ref())
            .with_context(|| format!("Failed to load secondary document: {}", pair.secondary.display()))?;

        let classification = self.apply_overlap_stage(&mut document, &secondary)?;
        let intermediate = overlap_path.as_ref().map(|_| document.clone());

        let hierarchy = self.apply_hierarchy_stage(&mut document)?;

        // nothing is written until both stages succeeded
        if let (Some(path), Some(intermediate)) = (&overlap_path, &intermediate) {
            intermediate.save_with(path, self.codec.as_ref())?;
            debug!("{}: overlap stage saved to {}", document.id(), path.display());
        }
        document.save_with(&output_path, self.codec.as_ref())?;

        info!(
            "{}: output saved to {} in {:.2}s",
            document.id(),
            output_path.display(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(ProcessedDocument {
            document_id: document.id().to_string(),
            output_path,
            overlap_path,
            classification,
            hierarchy,
        })
    }

    /// Process document pairs in order, applying the configured failure policy
    pub fn run_corpus(&self, pairs: &[DocumentPair]) -> Result<CorpusReport> {
        let mut report = CorpusReport::default();

        for (i, pair) in pairs.iter().enumerate() {
            debug!("Document {}/{}: {}", i + 1, pairs.len(), pair.primary.display());
            match self.process(pair) {
                Ok(processed) => report.processed.push(processed),
                Err(e) => match self.config.output.failure_policy {
                    FailurePolicy::FailFast => {
                        return Err(e.context(format!("Rejected document: {}", pair.primary.display())));
                    }
                    FailurePolicy::Skip => {
                        error!("Rejected {}: {:#}", pair.primary.display(), e);
                        report.rejected.push(RejectedDocument {
                            primary: pair.primary.clone(),
                            reason: format!("{:#}", e),
                        });
                    }
                },
            }
        }

        info!(
            "Finished: {} documents processed, {} rejected",
            report.processed.len(),
            report.rejected.len()
        );
        Ok(report)
    }

    fn check_collision(&self, path: &Path) -> Result<()> {
        if FileManager::file_exists(path) {
            if !self.config.output.overwrite {
                return Err(anyhow!(
                    "Output file already exists: {} (enable output.overwrite to replace it)",
                    path.display()
                ));
            }
            warn!("Overwriting existing output file: {}", path.display());
        }
        Ok(())
    }
}
