//! Flatten configuration, validation, and error types.
//!
//! [`FlattenConfig`] is the input to [`Flattener::new`](crate::Flattener::new).
//! [`validate()`](FlattenConfig::validate) checks it up front, so a
//! misconfigured flattener fails once at construction and never per record.
//! The config deserializes from any serde format with every field optional.

use std::error::Error;
use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use plait_core::FlattenError;

use crate::select::Pattern;

/// Default nesting limit for flatten, select, and unflatten.
///
/// Equal to the deepest schema a schema document carries, so every record
/// the engine accepts by default can also ship its schema.
pub const DEFAULT_MAX_DEPTH: usize = plait_schema::MAX_DOCUMENT_DEPTH;

/// Most nodes a single unflatten replay may build.
pub const DEFAULT_MAX_NODES: usize = 1 << 24;

/// Default separator between rendered path segments.
pub const DEFAULT_SEPARATOR: &str = ".";

// ── OutputKind ─────────────────────────────────────────────────────

/// Shape of a flatten result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Leaf values in traversal order.
    #[default]
    List,
    /// Leaf values keyed by minimal path.
    Dict,
    /// Sub-records matched by the configured selector.
    Selection,
}

// ── NonNumericalPolicy ─────────────────────────────────────────────

/// What to do with leaves that are not numbers.
///
/// Strings, booleans, nulls, and byte blobs are non-numerical. Tensor
/// elements are always numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonNumericalPolicy {
    /// Emit them like any other leaf.
    #[default]
    Allow,
    /// Fail with [`FlattenError::NonNumericalValue`].
    Forbid,
    /// Drop them from the output.
    Ignore,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`FlattenConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The separator is the empty string.
    EmptySeparator,
    /// `max_depth` is zero.
    ZeroDepth,
    /// The selector did not parse.
    Pattern(FlattenError),
    /// A selector is configured but the output kind is not `selection`.
    SelectorWithoutSelection {
        /// The configured output kind.
        output: OutputKind,
    },
    /// The output kind is `selection` but no selector is configured.
    MissingSelector,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySeparator => write!(f, "separator must not be empty"),
            Self::ZeroDepth => write!(f, "max_depth must be at least 1"),
            Self::Pattern(e) => write!(f, "selector: {e}"),
            Self::SelectorWithoutSelection { output } => {
                write!(f, "selector is set but output is {output:?}, not Selection")
            }
            Self::MissingSelector => write!(f, "selection output requires a selector"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FlattenError> for ConfigError {
    fn from(e: FlattenError) -> Self {
        Self::Pattern(e)
    }
}

// ── FlattenConfig ──────────────────────────────────────────────────

/// Complete configuration for a [`Flattener`](crate::Flattener).
///
/// Every field has a default, so `FlattenConfig::default()` flattens to a
/// leaf list and an empty JSON object deserializes to the same thing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlattenConfig {
    /// Result shape. Default: `list`.
    pub output: OutputKind,
    /// Joins path segments in dict keys and splits selector text. Default: `"."`.
    pub separator: String,
    /// Handling of non-numerical leaves. Default: `allow`.
    pub non_numerical: NonNumericalPolicy,
    /// Mapping field names skipped entirely, at any depth.
    pub ignore: IndexSet<String>,
    /// Selector pattern such as `steps.*.action`. Required for `selection`.
    pub selector: Option<String>,
    /// Maximum nesting depth. Default: 256.
    pub max_depth: usize,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        Self {
            output: OutputKind::List,
            separator: DEFAULT_SEPARATOR.to_owned(),
            non_numerical: NonNumericalPolicy::Allow,
            ignore: IndexSet::new(),
            selector: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FlattenConfig {
    /// Leaf-list output with defaults.
    pub fn list() -> Self {
        Self::default()
    }

    /// Minimal-path dict output with defaults.
    pub fn dict() -> Self {
        Self::default().with_output(OutputKind::Dict)
    }

    /// Selection output for `selector`.
    pub fn selection(selector: impl Into<String>) -> Self {
        Self::default()
            .with_output(OutputKind::Selection)
            .with_selector(selector)
    }

    /// Set the output kind.
    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    /// Set the path separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the non-numerical policy.
    pub fn with_non_numerical(mut self, policy: NonNumericalPolicy) -> Self {
        self.non_numerical = policy;
        self
    }

    /// Add a field name to the ignore set.
    pub fn ignoring(mut self, name: impl Into<String>) -> Self {
        self.ignore.insert(name.into());
        self
    }

    /// Set the selector pattern.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile_selector().map(|_| ())
    }

    /// Validate and parse the selector, if any.
    pub(crate) fn compile_selector(&self) -> Result<Option<Pattern>, ConfigError> {
        if self.separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        match (&self.selector, self.output) {
            (None, OutputKind::Selection) => Err(ConfigError::MissingSelector),
            (None, _) => Ok(None),
            (Some(_), output @ (OutputKind::List | OutputKind::Dict)) => {
                Err(ConfigError::SelectorWithoutSelection { output })
            }
            (Some(text), OutputKind::Selection) => {
                Ok(Some(Pattern::parse(text, &self.separator)?))
            }
        }
    }
}
