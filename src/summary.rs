// 📊 Audit Summary - flag counts for one run

use crate::rules::DerivedFields;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub audit_date: NaiveDate,
    pub total_rows: usize,
    pub missing_due_date: usize,
    pub overdue_unfiled: usize,
    pub overdue_over_threshold: usize,
    pub extension: usize,
    pub max_overdue_days: Option<i64>,
}

impl AuditSummary {
    pub fn new(audit_date: NaiveDate) -> Self {
        AuditSummary {
            audit_date,
            total_rows: 0,
            missing_due_date: 0,
            overdue_unfiled: 0,
            overdue_over_threshold: 0,
            extension: 0,
            max_overdue_days: None,
        }
    }

    pub fn record(&mut self, fields: &DerivedFields) {
        self.total_rows += 1;
        self.missing_due_date += usize::from(fields.missing_due_date);
        self.overdue_unfiled += usize::from(fields.overdue_unfiled);
        self.overdue_over_threshold += usize::from(fields.overdue_over_threshold);
        self.extension += usize::from(fields.extension);
        self.max_overdue_days = self.max_overdue_days.max(fields.overdue_days);
    }

    /// Rows that raised at least one review flag
    pub fn has_findings(&self) -> bool {
        self.missing_due_date + self.overdue_unfiled + self.extension > 0
    }
}

impl fmt::Display for AuditSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Audit {}: {} rows, {} missing due date, {} overdue unfiled ({} over threshold), {} extensions",
            self.audit_date,
            self.total_rows,
            self.missing_due_date,
            self.overdue_unfiled,
            self.overdue_over_threshold,
            self.extension
        )?;
        if let Some(max) = self.max_overdue_days {
            write!(f, ", max {} days overdue", max)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_flags() {
        let mut summary = AuditSummary::new(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());

        summary.record(&DerivedFields {
            overdue_days: Some(150),
            overdue_unfiled: true,
            overdue_over_threshold: true,
            ..DerivedFields::default()
        });
        summary.record(&DerivedFields {
            overdue_days: Some(10),
            overdue_unfiled: true,
            extension: true,
            ..DerivedFields::default()
        });
        summary.record(&DerivedFields {
            missing_due_date: true,
            ..DerivedFields::default()
        });

        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.missing_due_date, 1);
        assert_eq!(summary.overdue_unfiled, 2);
        assert_eq!(summary.overdue_over_threshold, 1);
        assert_eq!(summary.extension, 1);
        assert_eq!(summary.max_overdue_days, Some(150));
        assert!(summary.has_findings());
    }

    #[test]
    fn test_display() {
        let mut summary = AuditSummary::new(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        assert!(!summary.has_findings());
        assert_eq!(
            summary.to_string(),
            "Audit 2025-05-31: 0 rows, 0 missing due date, 0 overdue unfiled (0 over threshold), 0 extensions"
        );

        summary.record(&DerivedFields {
            overdue_days: Some(3),
            overdue_unfiled: true,
            ..DerivedFields::default()
        });
        assert!(summary.to_string().ends_with(", max 3 days overdue"));
    }
}
