use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::overlap::ValueMapping;

/// Configuration module
/// Tier names, silence prefixes, the value mapping table and output
/// locations are injected through this configuration rather than hard coded.
/// Represents the restructuring configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Overlap classification stage
    #[serde(default)]
    pub overlap: OverlapConfig,

    /// Hierarchization stage
    #[serde(default)]
    pub hierarchy: HierarchyConfig,

    /// Output locations and failure handling
    #[serde(default)]
    pub output: OutputConfig,

    /// How strictly the two documents' timelines are compared
    #[serde(default)]
    pub timeline_check: TimelineCheck,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Overlap classification settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OverlapConfig {
    // @field: Tier whose values are rewritten
    #[serde(default = "default_primary_tier")]
    pub primary_tier: String,

    // @field: Tier renamed to primary_tier on load, if present
    #[serde(default = "default_primary_source_tier")]
    pub primary_source_tier: Option<String>,

    // @field: Tier read from the secondary document
    #[serde(default = "default_secondary_source_tier")]
    pub secondary_source_tier: String,

    // @field: Name the secondary tier gets while it lives in the primary document
    #[serde(default = "default_transient_tier")]
    pub transient_tier: String,

    // @field: Tiers removed after classification
    #[serde(default = "default_drop_tiers")]
    pub drop_tiers: Vec<String>,

    // @field: Value prefixes marking non-speech regions
    #[serde(default = "default_silence_prefixes")]
    pub silence_prefixes: Vec<String>,

    // @field: Replacement values
    #[serde(default)]
    pub mapping: MappingConfig,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            primary_tier: default_primary_tier(),
            primary_source_tier: default_primary_source_tier(),
            secondary_source_tier: default_secondary_source_tier(),
            transient_tier: default_transient_tier(),
            drop_tiers: default_drop_tiers(),
            silence_prefixes: default_silence_prefixes(),
            mapping: MappingConfig::default(),
        }
    }
}

/// Value mapping table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MappingConfig {
    /// Exact classification value to replacement
    #[serde(default = "default_mapping_rules")]
    pub rules: BTreeMap<String, String>,

    /// Regex rules tried in order after exact rules
    #[serde(default)]
    pub patterns: Vec<PatternRuleConfig>,

    /// Replacement for values no rule matches; `None` leaves them unchanged
    #[serde(default = "default_mapping_default")]
    pub default: Option<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            rules: default_mapping_rules(),
            patterns: Vec::new(),
            default: default_mapping_default(),
        }
    }
}

/// Regex mapping rule
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PatternRuleConfig {
    pub pattern: String,
    pub value: String,
}

/// Hierarchization settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HierarchyConfig {
    // @field: Anchor tier
    #[serde(default = "default_primary_tier")]
    pub parent_tier: String,

    // @field: Flat tiers converted to referential tiers
    #[serde(default = "default_child_tiers")]
    pub child_tiers: Vec<String>,

    // @field: Structural type of the converted tiers
    #[serde(default = "default_child_type")]
    pub child_type: String,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            parent_tier: default_primary_tier(),
            child_tiers: default_child_tiers(),
            child_type: default_child_type(),
        }
    }
}

/// What a corpus run does with a rejected document
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first rejected document
    #[default]
    FailFast,
    /// Log the rejection and continue with the next document
    Skip,
}

/// Timeline compatibility mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimelineCheck {
    /// Differing media identifiers or origins are errors
    #[default]
    Strict,
    /// Differing media identifiers only warn
    Lenient,
    /// No check
    Off,
}

/// Output settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    // @field: Directory for final documents
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    // @field: Directory for documents after overlap classification
    #[serde(default)]
    pub overlap_dir: Option<PathBuf>,

    // @field: Replace existing output files
    #[serde(default)]
    pub overwrite: bool,

    // @field: Rejected document handling
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            overlap_dir: None,
            overwrite: false,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_primary_tier() -> String {
    "label".to_string()
}

fn default_primary_source_tier() -> Option<String> {
    Some("default-lt".to_string())
}

fn default_secondary_source_tier() -> String {
    "IPA Transcription".to_string()
}

fn default_transient_tier() -> String {
    "ipa".to_string()
}

fn default_drop_tiers() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_silence_prefixes() -> Vec<String> {
    vec!["P".to_string(), "G".to_string()]
}

fn default_mapping_rules() -> BTreeMap<String, String> {
    BTreeMap::from([("W12".to_string(), "TIC".to_string())])
}

fn default_mapping_default() -> Option<String> {
    Some("TIC(+crosstalk?)".to_string())
}

fn default_child_tiers() -> Vec<String> {
    vec!["ENG".to_string(), "TIC".to_string()]
}

fn default_child_type() -> String {
    "ac_prob".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/unflat")
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Apply the configured log level to the global logger
    pub fn apply_log_level(&self) {
        log::set_max_level(self.log_level.to_level_filter());
    }

    /// Build the value mapping described by the configuration
    pub fn value_mapping(&self) -> Result<ValueMapping> {
        ValueMapping::from_config(&self.overlap.mapping)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let overlap = &self.overlap;
        let hierarchy = &self.hierarchy;

        for (field, name) in [
            ("overlap.primary_tier", &overlap.primary_tier),
            ("overlap.secondary_source_tier", &overlap.secondary_source_tier),
            ("overlap.transient_tier", &overlap.transient_tier),
            ("hierarchy.parent_tier", &hierarchy.parent_tier),
            ("hierarchy.child_type", &hierarchy.child_type),
        ] {
            if name.trim().is_empty() {
                return Err(anyhow!("{} must not be empty", field));
            }
        }

        if overlap.transient_tier == overlap.primary_tier {
            return Err(anyhow!(
                "Transient tier '{}' must differ from the primary tier",
                overlap.transient_tier
            ));
        }
        if overlap.drop_tiers.contains(&overlap.primary_tier) {
            return Err(anyhow!("Primary tier '{}' cannot be dropped", overlap.primary_tier));
        }
        if overlap.silence_prefixes.iter().any(|p| p.is_empty()) {
            return Err(anyhow!("Silence prefixes must not be empty strings"));
        }

        let mut seen = HashSet::new();
        for child in &hierarchy.child_tiers {
            if child.trim().is_empty() {
                return Err(anyhow!("Child tier names must not be empty"));
            }
            if child == &hierarchy.parent_tier {
                return Err(anyhow!("Tier '{}' cannot be its own parent", child));
            }
            if !seen.insert(child.as_str()) {
                return Err(anyhow!("Child tier '{}' listed twice", child));
            }
        }

        if self.output.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("output.output_dir is required"));
        }
        if self.output.overlap_dir.as_ref() == Some(&self.output.output_dir) {
            return Err(anyhow!(
                "output.overlap_dir must differ from output.output_dir ({})",
                self.output.output_dir.display()
            ));
        }

        self.value_mapping().context("Invalid value mapping")?;

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            overlap: OverlapConfig::default(),
            hierarchy: HierarchyConfig::default(),
            output: OutputConfig::default(),
            timeline_check: TimelineCheck::default(),
            log_level: LogLevel::default(),
        }
    }
}
