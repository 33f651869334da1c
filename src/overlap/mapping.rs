/*!
 * Value mapping rules for overlap reclassification.
 *
 * A mapping turns the classification value of an overlap region into the
 * replacement value for the target annotation, or leaves it unchanged.
 */

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;

use crate::app_config::MappingConfig;

/// Maps a classification value to a replacement value
pub trait ValueMapper {
    /// Replacement for `value`, or `None` to leave the annotation unchanged
    fn map_value(&self, value: &str) -> Option<String>;

    /// Rules that match none of `values`; empty when the mapper has no named rules
    fn unmatched_rules(&self, _values: &[&str]) -> Vec<String> {
        Vec::new()
    }
}

impl<F> ValueMapper for F
where
    F: Fn(&str) -> Option<String>,
{
    fn map_value(&self, value: &str) -> Option<String> {
        self(value)
    }
}

/// Regex rule applied after exact rules
#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern: Regex,
    value: String,
}

impl PatternRule {
    pub fn new(pattern: &str, value: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid mapping pattern: {}", pattern))?;
        Ok(Self {
            pattern,
            value: value.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Table-driven mapping: exact rules, then pattern rules in order, then the default
#[derive(Debug, Clone, Default)]
pub struct ValueMapping {
    exact: BTreeMap<String, String>,
    patterns: Vec<PatternRule>,
    default: Option<String>,
}

impl ValueMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from configuration, compiling pattern rules
    pub fn from_config(config: &MappingConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| PatternRule::new(&p.pattern, p.value.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            exact: config.rules.clone(),
            patterns,
            default: config.default.clone(),
        })
    }

    pub fn with_rule(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.exact.insert(from.into(), to.into());
        self
    }

    pub fn with_pattern(mut self, rule: PatternRule) -> Self {
        self.patterns.push(rule);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl ValueMapper for ValueMapping {
    fn map_value(&self, value: &str) -> Option<String> {
        if let Some(mapped) = self.exact.get(value) {
            return Some(mapped.clone());
        }
        if let Some(rule) = self.patterns.iter().find(|r| r.pattern.is_match(value)) {
            return Some(rule.value.clone());
        }
        self.default.clone()
    }

    fn unmatched_rules(&self, values: &[&str]) -> Vec<String> {
        let exact = self
            .exact
            .keys()
            .filter(|key| !values.contains(&key.as_str()))
            .cloned();
        let patterns = self
            .patterns
            .iter()
            .filter(|rule| !values.iter().any(|v| rule.pattern.is_match(v)))
            .map(|rule| format!("/{}/", rule.pattern()));
        exact.chain(patterns).collect()
    }
}
