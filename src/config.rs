//! Run configuration for window scoring.
//!
//! [`ScoreConfig`] collects every option recognized by the scoring command.
//! It is validated once, before any input is opened.

use crate::genome::GenomeTable;
use crate::scoring::Scheme;
use std::path::PathBuf;
use thiserror::Error;

/// Default sliding window width.
pub const DEFAULT_WIDTH: u64 = 50;

/// Default sliding window step.
pub const DEFAULT_STEP: u64 = 50;

/// Default attribute tag holding locus identifiers.
pub const DEFAULT_TAG: &str = "ID";

/// Problems with the options themselves, found before processing starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("window width must be greater than zero")]
    ZeroWidth,

    #[error("window step must be greater than zero")]
    ZeroStep,

    #[error("merging on feature '{0}' requires an annotation file")]
    MergeWithoutAnnotation(String),

    #[error("locus identifier tag must not be empty")]
    EmptyTag,

    #[error("unknown scoring scheme '{0}' (expected meth, average, sum or seq)")]
    UnknownScheme(String),

    #[error("unknown reference genome '{0}' (expected arabidopsis or rice)")]
    UnknownGenome(String),
}

/// Options for one scoring run.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    pub width: u64,
    pub step: u64,
    pub scheme: Scheme,
    /// Sum scorer: report the record count as the score.
    pub reverse: bool,
    /// Annotation file defining one window per locus.
    pub annotation: Option<PathBuf>,
    /// Attribute tag naming the locus of an annotation record.
    pub tag: String,
    /// Sub-feature folded onto its parent locus, e.g. `exon`.
    pub merge: Option<String>,
    /// Sort each sequence's records and search them in memory.
    pub sort: bool,
    /// Emit placeholder rows for windows without data.
    pub no_skip: bool,
    /// Output feature column override.
    pub feature: Option<String>,
    /// Sequence lengths bounding sliding windows.
    pub lengths: Option<GenomeTable>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreConfig {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            step: DEFAULT_STEP,
            scheme: Scheme::Methylation,
            reverse: false,
            annotation: None,
            tag: DEFAULT_TAG.to_string(),
            merge: None,
            sort: true,
            no_skip: false,
            feature: None,
            lengths: None,
        }
    }

    pub fn with_width(mut self, width: u64) -> Self {
        self.width = width;
        self
    }

    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_annotation(mut self, path: impl Into<PathBuf>) -> Self {
        self.annotation = Some(path.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Merge mode: windows come from loci only, one coordinate per step.
    pub fn with_merge(mut self, feature: impl Into<String>) -> Self {
        self.merge = Some(feature.into());
        self.width = 1;
        self.step = 1;
        self
    }

    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_no_skip(mut self, no_skip: bool) -> Self {
        self.no_skip = no_skip;
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    pub fn with_lengths(mut self, lengths: GenomeTable) -> Self {
        self.lengths = Some(lengths);
        self
    }

    /// Check option combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(feature) = &self.merge {
            if self.annotation.is_none() {
                return Err(ConfigError::MergeWithoutAnnotation(feature.clone()));
            }
        }
        if self.annotation.is_none() {
            if self.width == 0 {
                return Err(ConfigError::ZeroWidth);
            }
            if self.step == 0 {
                return Err(ConfigError::ZeroStep);
            }
        }
        if self.annotation.is_some() && self.tag.trim().is_empty() {
            return Err(ConfigError::EmptyTag);
        }
        Ok(())
    }

    /// Value of the output feature column.
    pub fn feature_label(&self) -> String {
        match (&self.feature, &self.annotation) {
            (Some(label), _) => label.clone(),
            (None, Some(_)) => "locus".to_string(),
            (None, None) => format!("w{}", self.width),
        }
    }
}
