//! Analysis configuration
//!
//! A single mode selector chooses the value domain at startup; the taint
//! policy tables name the source, sink and string-combinator methods matched
//! case-insensitively against fully-qualified method names. Configurations
//! validate before use and load from YAML for team-shared policy files.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::shared::models::MethodRef;

/// Hard ceiling on configurable step budgets
const MAX_STEP_BUDGET: usize = 100_000_000;

/// Default fixpoint round budget
pub const DEFAULT_STEP_BUDGET: usize = 1_000_000;

/// Value-domain selector
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Sign domain: divide-by-zero, array bounds, assertion reachability
    #[default]
    Sign,
    /// Taint domain: source-to-sink information flow
    Taint,
}

/// Role a fully-qualified method name plays under the taint policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyRole {
    Source,
    Sink,
    Combinator,
}

/// Default taint-source patterns (user-input readers)
pub fn default_source_patterns() -> Vec<String> {
    vec![
        "readline".to_string(),
        "nextline".to_string(),
        "nextint".to_string(),
        "getparameter".to_string(),
        "readinput".to_string(),
    ]
}

/// Default sink patterns (query executors)
pub fn default_sink_patterns() -> Vec<String> {
    vec![
        "executequery".to_string(),
        "executeupdate".to_string(),
        "sink".to_string(),
    ]
}

/// Default string-combinator patterns (concatenation, builder append)
pub fn default_combinator_patterns() -> Vec<String> {
    vec![
        "makeconcatwithconstants".to_string(),
        "concat".to_string(),
        "append".to_string(),
        "format".to_string(),
        "join".to_string(),
    ]
}

static DEFAULT_POLICY: Lazy<TaintPolicy> = Lazy::new(|| {
    TaintPolicy::new(
        default_source_patterns(),
        default_sink_patterns(),
        default_combinator_patterns(),
    )
});

/// The three policy tables. Patterns are stored case-folded; a method
/// matches when its case-folded `class.name` contains the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTaintPolicy")]
pub struct TaintPolicy {
    sources: Vec<String>,
    sinks: Vec<String>,
    combinators: Vec<String>,
}

/// Serde-facing shape of the policy tables, folded on conversion
#[derive(Debug, Clone, Deserialize)]
struct RawTaintPolicy {
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    sinks: Vec<String>,
    #[serde(default)]
    combinators: Vec<String>,
}

impl From<RawTaintPolicy> for TaintPolicy {
    fn from(raw: RawTaintPolicy) -> Self {
        TaintPolicy::new(raw.sources, raw.sinks, raw.combinators)
    }
}

impl TaintPolicy {
    pub fn new(sources: Vec<String>, sinks: Vec<String>, combinators: Vec<String>) -> Self {
        let fold = |v: Vec<String>| v.into_iter().map(|p| p.to_lowercase()).collect();
        Self {
            sources: fold(sources),
            sinks: fold(sinks),
            combinators: fold(combinators),
        }
    }

    /// Classify an invocation target. Sources take precedence over sinks,
    /// sinks over combinators.
    pub fn classify(&self, method: &MethodRef) -> Option<PolicyRole> {
        let name = method.qualified_name().to_lowercase();
        if Self::matches(&self.sources, &name) {
            Some(PolicyRole::Source)
        } else if Self::matches(&self.sinks, &name) {
            Some(PolicyRole::Sink)
        } else if Self::matches(&self.combinators, &name) {
            Some(PolicyRole::Combinator)
        } else {
            None
        }
    }

    fn matches(patterns: &[String], folded_name: &str) -> bool {
        patterns.iter().any(|p| folded_name.contains(p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty() && self.combinators.is_empty()
    }
}

impl Default for TaintPolicy {
    fn default() -> Self {
        DEFAULT_POLICY.clone()
    }
}

/// Top-level analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Value-domain selector
    #[serde(default)]
    pub mode: AnalysisMode,

    /// Fixpoint round budget; the safety net against non-termination bugs
    #[serde(default = "default_budget")]
    pub step_budget: usize,

    /// Taint policy tables (consulted in taint mode only)
    #[serde(default)]
    pub policy: TaintPolicy,
}

fn default_budget() -> usize {
    DEFAULT_STEP_BUDGET
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            step_budget: DEFAULT_STEP_BUDGET,
            policy: TaintPolicy::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn with_mode(mode: AnalysisMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Range checks plus cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if self.step_budget == 0 {
            return Err(AnalysisError::config("step_budget must be positive"));
        }
        if self.step_budget > MAX_STEP_BUDGET {
            return Err(AnalysisError::config(format!(
                "step_budget {} exceeds maximum {}",
                self.step_budget, MAX_STEP_BUDGET
            )));
        }
        if self.mode == AnalysisMode::Taint && self.policy.is_empty() {
            return Err(AnalysisError::config(
                "taint mode requires at least one policy pattern",
            ));
        }
        Ok(())
    }

    /// Load and validate a YAML configuration file
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}
