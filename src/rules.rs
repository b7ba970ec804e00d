// 🏷️ Declaration Rules - Rules as ordered pure functions
// Five derived fields per record; rule 2 (overdue days) feeds rules 3 and 4

use crate::config::{AuditConfig, LabelStyle};
use crate::record::Declaration;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// AUDIT CONTEXT
// ============================================================================

/// Reference date shared by every record of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub audit_date: NaiveDate,
}

impl AuditContext {
    pub fn new(audit_date: NaiveDate) -> Self {
        AuditContext { audit_date }
    }
}

// ============================================================================
// RULE FUNCTIONS
// ============================================================================

/// Rule 1: due date absent or unparseable
pub fn missing_due_date(decl: &Declaration<'_>) -> bool {
    decl.due_date.is_none()
}

/// Rule 2: whole days past due, only for unfiled declarations and only when positive
pub fn overdue_days(decl: &Declaration<'_>, audit_date: NaiveDate) -> Option<i64> {
    let due = decl.due_date?;
    if decl.received_date.is_some() {
        return None;
    }

    let days = (audit_date - due).num_days();
    (days > 0).then_some(days)
}

/// Rule 3
pub fn overdue_unfiled(days: Option<i64>) -> bool {
    matches!(days, Some(d) if d > 0)
}

/// Rule 4: strictly more than `threshold` days overdue
pub fn overdue_over(days: Option<i64>, threshold: i64) -> bool {
    matches!(days, Some(d) if d > threshold)
}

/// Rule 5: an extension date is recorded, or the reference number carries an extension token
pub fn extension_raised(decl: &Declaration<'_>, tokens: &[String]) -> bool {
    if decl.audit_date2.is_present() {
        return true;
    }

    match decl.ref_no.text() {
        Some(text) => {
            let normalized = normalize_token(text);
            tokens
                .iter()
                .any(|token| !token.is_empty() && normalized.contains(token.as_str()))
        }
        None => false,
    }
}

/// Lower-case and drop every whitespace character
pub fn normalize_token(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// DERIVED RULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivedRule {
    MissingDueDate,
    OverdueDays,
    OverdueUnfiled,
    OverdueOverThreshold,
    Extension,
}

impl DerivedRule {
    /// Evaluation order, which is also the order of the appended columns
    pub const ORDER: [DerivedRule; 5] = [
        DerivedRule::MissingDueDate,
        DerivedRule::OverdueDays,
        DerivedRule::OverdueUnfiled,
        DerivedRule::OverdueOverThreshold,
        DerivedRule::Extension,
    ];

    /// Column header for this rule
    pub fn label(&self, style: LabelStyle, threshold: i64) -> String {
        match (style, self) {
            (LabelStyle::English, DerivedRule::MissingDueDate) => "missing_due_date_flag".to_string(),
            (LabelStyle::English, DerivedRule::OverdueDays) => "overdue_days".to_string(),
            (LabelStyle::English, DerivedRule::OverdueUnfiled) => "overdue_unfiled_flag".to_string(),
            (LabelStyle::English, DerivedRule::OverdueOverThreshold) => {
                format!("overdue_over_{}_flag", threshold)
            }
            (LabelStyle::English, DerivedRule::Extension) => "extension_flag".to_string(),

            (LabelStyle::Vietnamese, DerivedRule::MissingDueDate) => {
                "KHÔNG NHẬP NGÀY ĐẾN HẠN TKHQ".to_string()
            }
            (LabelStyle::Vietnamese, DerivedRule::OverdueDays) => "SỐ NGÀY QUÁ HẠN TKHQ".to_string(),
            (LabelStyle::Vietnamese, DerivedRule::OverdueUnfiled) => {
                "QUÁ HẠN CHƯA NHẬP TKHQ".to_string()
            }
            (LabelStyle::Vietnamese, DerivedRule::OverdueOverThreshold) => {
                format!("QUÁ HẠN > {} NGÀY CHƯA NHẬP TKHQ", threshold)
            }
            (LabelStyle::Vietnamese, DerivedRule::Extension) => {
                "CÓ PHÁT SINH GIA HẠN TKHQ".to_string()
            }
        }
    }

    /// True if `header` is a derived label in either style, for any threshold
    pub fn is_derived_label(header: &str) -> bool {
        const THRESHOLD_AFFIXES: [(&str, &str); 2] = [
            ("overdue_over_", "_flag"),
            ("QUÁ HẠN > ", " NGÀY CHƯA NHẬP TKHQ"),
        ];

        let fixed = [LabelStyle::English, LabelStyle::Vietnamese].into_iter().any(|style| {
            DerivedRule::ORDER
                .iter()
                .filter(|rule| **rule != DerivedRule::OverdueOverThreshold)
                .any(|rule| rule.label(style, 0) == header)
        });

        fixed
            || THRESHOLD_AFFIXES.iter().any(|(prefix, suffix)| {
                header
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(suffix))
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
            })
    }
}

// ============================================================================
// DERIVED FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedFields {
    pub missing_due_date: bool,
    pub overdue_days: Option<i64>,
    pub overdue_unfiled: bool,
    pub overdue_over_threshold: bool,
    pub extension: bool,
}

impl DerivedFields {
    /// Cell text for one derived column: the marker or empty, days or empty
    pub fn render(&self, rule: DerivedRule, marker: &str) -> String {
        let flag = |raised: bool| if raised { marker.to_string() } else { String::new() };

        match rule {
            DerivedRule::MissingDueDate => flag(self.missing_due_date),
            DerivedRule::OverdueDays => self
                .overdue_days
                .map(|d| d.to_string())
                .unwrap_or_default(),
            DerivedRule::OverdueUnfiled => flag(self.overdue_unfiled),
            DerivedRule::OverdueOverThreshold => flag(self.overdue_over_threshold),
            DerivedRule::Extension => flag(self.extension),
        }
    }
}

// ============================================================================
// RULE ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct RuleEngine {
    extension_tokens: Vec<String>,
    overdue_threshold_days: i64,
}

impl RuleEngine {
    pub fn new(config: &AuditConfig) -> Self {
        RuleEngine {
            extension_tokens: config
                .extension_tokens
                .iter()
                .map(|t| normalize_token(t))
                .collect(),
            overdue_threshold_days: config.overdue_threshold_days,
        }
    }

    /// Apply one rule; later rules may read fields set by earlier ones
    fn apply(
        &self,
        rule: DerivedRule,
        decl: &Declaration<'_>,
        ctx: &AuditContext,
        fields: &mut DerivedFields,
    ) {
        match rule {
            DerivedRule::MissingDueDate => fields.missing_due_date = missing_due_date(decl),
            DerivedRule::OverdueDays => fields.overdue_days = overdue_days(decl, ctx.audit_date),
            DerivedRule::OverdueUnfiled => fields.overdue_unfiled = overdue_unfiled(fields.overdue_days),
            DerivedRule::OverdueOverThreshold => {
                fields.overdue_over_threshold =
                    overdue_over(fields.overdue_days, self.overdue_threshold_days)
            }
            DerivedRule::Extension => {
                fields.extension = extension_raised(decl, &self.extension_tokens)
            }
        }
    }

    /// Evaluate all rules for one record, in `DerivedRule::ORDER`
    pub fn evaluate(&self, decl: &Declaration<'_>, ctx: &AuditContext) -> DerivedFields {
        let mut fields = DerivedFields::default();
        for rule in DerivedRule::ORDER {
            self.apply(rule, decl, ctx, &mut fields);
        }
        fields
    }

    pub fn overdue_threshold_days(&self) -> i64 {
        self.overdue_threshold_days
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&AuditConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
