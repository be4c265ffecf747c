use crate::model::Bureau;
use serde::{Deserialize, Serialize};

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Critical,
    Important,
    Info,
}

/// Records which extraction strategy produced the field set for one
/// (account, bureau) pair. Lets tests assert on strategy selection without
/// depending on log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyMatch {
    pub account_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bureau: Option<Bureau>,
    pub strategy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    pub message: String,
    pub severity: TraceSeverity,
}

/// Structured diagnostics returned alongside the parse result.
///
/// Soft misses (a strategy finding nothing, a bureau with no column) are
/// warnings here, never errors: the parser degrades field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseTrace {
    pub trace_schema_version: String,
    pub strategies: Vec<StrategyMatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TraceWarning>,
}

impl Default for ParseTrace {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            strategies: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ParseTrace {
    pub fn note_strategy(&mut self, account_name: &str, bureau: Option<Bureau>, strategy: &str) {
        self.strategies.push(StrategyMatch {
            account_name: account_name.to_string(),
            bureau,
            strategy: strategy.to_string(),
        });
    }

    pub fn warn(&mut self, account_name: Option<&str>, message: String, severity: TraceSeverity) {
        self.warnings.push(TraceWarning {
            account_name: account_name.map(|s| s.to_string()),
            message,
            severity,
        });
    }

    /// Strategy that matched for a given account/bureau, if any.
    pub fn strategy_for(&self, account_name: &str, bureau: Bureau) -> Option<&str> {
        self.strategies
            .iter()
            .find(|s| s.account_name == account_name && s.bureau == Some(bureau))
            .map(|s| s.strategy.as_str())
    }
}
