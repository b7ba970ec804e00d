// ⚙️ Audit Configuration - Settings as Data
// Loaded from JSON; every field falls back to the audit workbook defaults

use crate::error::{AuditError, Result};
use crate::rules::normalize_token;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// LABEL STYLE
// ============================================================================

/// Which set of headers the derived columns get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// `missing_due_date_flag`, `overdue_days`, ...
    #[default]
    English,
    /// Headers of the audit workbook (`KHÔNG NHẬP NGÀY ĐẾN HẠN TKHQ`, ...)
    Vietnamese,
}

impl FromStr for LabelStyle {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(LabelStyle::English),
            "vietnamese" | "vi" => Ok(LabelStyle::Vietnamese),
            other => Err(AuditError::Config(format!("unknown label style: {other}"))),
        }
    }
}

// ============================================================================
// AUDIT CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Tokens meaning "extension", matched against the normalised reference number
    #[serde(default = "default_extension_tokens")]
    pub extension_tokens: Vec<String>,

    /// Overdue days strictly above this raise the long-overdue flag
    #[serde(default = "default_overdue_threshold")]
    pub overdue_threshold_days: i64,

    /// Cell value for a raised flag
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Try day/month/year before month/day/year for ambiguous dates
    #[serde(default)]
    pub day_first: bool,

    #[serde(default)]
    pub labels: LabelStyle,
}

fn default_extension_tokens() -> Vec<String> {
    vec!["giahan".to_string()]
}

fn default_overdue_threshold() -> i64 {
    90
}

fn default_marker() -> String {
    "X".to_string()
}

impl Default for AuditConfig {
    fn default() -> Self {
        AuditConfig {
            extension_tokens: default_extension_tokens(),
            overdue_threshold_days: default_overdue_threshold(),
            marker: default_marker(),
            day_first: false,
            labels: LabelStyle::default(),
        }
    }
}

impl AuditConfig {
    /// Load config from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AuditError::Config(format!("failed to read {}: {e}", path.as_ref().display()))
        })?;

        Self::from_json(&content)
    }

    /// Parse config from a JSON string, normalising tokens and validating
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: AuditConfig = serde_json::from_str(json)
            .map_err(|e| AuditError::Config(format!("failed to parse config JSON: {e}")))?;

        config.extension_tokens = config
            .extension_tokens
            .iter()
            .map(|t| normalize_token(t))
            .filter(|t| !t.is_empty())
            .collect();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extension_tokens.iter().all(|t| t.is_empty()) {
            return Err(AuditError::Config(
                "extension_tokens must contain at least one non-blank token".to_string(),
            ));
        }
        if self.overdue_threshold_days < 0 {
            return Err(AuditError::Config(format!(
                "overdue_threshold_days must not be negative, got {}",
                self.overdue_threshold_days
            )));
        }
        if self.marker.is_empty() {
            return Err(AuditError::Config("marker must not be empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_audit_workbook() {
        let config = AuditConfig::default();

        assert_eq!(config.extension_tokens, vec!["giahan".to_string()]);
        assert_eq!(config.overdue_threshold_days, 90);
        assert_eq!(config.marker, "X");
        assert!(!config.day_first);
        assert_eq!(config.labels, LabelStyle::English);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = AuditConfig::from_json("{}").unwrap();
        assert_eq!(config, AuditConfig::default());
    }

    #[test]
    fn test_tokens_are_normalised_on_load() {
        let config = AuditConfig::from_json(
            r#"{ "extension_tokens": ["Gia Hạn", "  EXT "], "labels": "vietnamese" }"#,
        )
        .unwrap();

        assert_eq!(config.extension_tokens, vec!["giahạn".to_string(), "ext".to_string()]);
        assert_eq!(config.labels, LabelStyle::Vietnamese);
    }

    #[test]
    fn test_rejects_blank_tokens() {
        let err = AuditConfig::from_json(r#"{ "extension_tokens": ["   "] }"#).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let err = AuditConfig::from_json(r#"{ "overdue_threshold_days": -1 }"#).unwrap_err();
        assert!(err.to_string().contains("overdue_threshold_days"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(AuditConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_label_style_from_str() {
        assert_eq!("vi".parse::<LabelStyle>().unwrap(), LabelStyle::Vietnamese);
        assert_eq!("English".parse::<LabelStyle>().unwrap(), LabelStyle::English);
        assert!("klingon".parse::<LabelStyle>().is_err());
    }
}
