// 🧩 Table Assembler
// Runs the rule engine over every row and appends the derived columns
//
// The input table is never modified: a new table is returned, or an error
// before any row is evaluated.

use crate::config::AuditConfig;
use crate::dates::DateNormalizer;
use crate::error::Result;
use crate::record::{
    Declaration, DeclarationColumns, DECLARATION_DUE_DATE, DECLARATION_RECEIVED_DATE,
};
use crate::rules::{AuditContext, DerivedRule, RuleEngine};
use crate::summary::AuditSummary;
use crate::table::Table;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub table: Table,
    pub summary: AuditSummary,
}

pub struct Assembler {
    config: AuditConfig,
    engine: RuleEngine,
    normalizer: DateNormalizer,
}

impl Assembler {
    pub fn new(config: AuditConfig) -> Self {
        Assembler {
            engine: RuleEngine::new(&config),
            normalizer: DateNormalizer::new(config.day_first),
            config,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Headers of the derived columns, in append order
    pub fn derived_labels(&self) -> Vec<String> {
        DerivedRule::ORDER
            .iter()
            .map(|rule| rule.label(self.config.labels, self.config.overdue_threshold_days))
            .collect()
    }

    /// Annotate every row of `input` against the audit date
    pub fn annotate(&self, input: &Table, ctx: &AuditContext) -> Result<AuditOutcome> {
        let labels = self.derived_labels();

        // Output of an earlier run, under any label style or threshold:
        // drop stale derived columns so they are recomputed
        let stale: Vec<String> = input
            .headers
            .iter()
            .filter(|header| DerivedRule::is_derived_label(header))
            .cloned()
            .collect();
        let source = if stale.is_empty() {
            input.clone()
        } else {
            warn!(columns = ?stale, "replacing derived columns already present in input");
            input.without_columns(&stale)
        };

        let columns = DeclarationColumns::resolve(&source)?;

        info!(
            rows = source.row_count(),
            audit_date = %ctx.audit_date,
            "annotating declarations"
        );

        let mut summary = AuditSummary::new(ctx.audit_date);
        let mut headers = source.headers.clone();
        headers.extend(labels);

        let mut rows = Vec::with_capacity(source.row_count());
        for (line, row) in source.rows.iter().enumerate() {
            let decl = Declaration::from_row(&columns, row, &self.normalizer);
            self.log_unparsed_dates(line, row, &columns, &decl);

            let fields = self.engine.evaluate(&decl, ctx);
            summary.record(&fields);

            let mut out = row.clone();
            out.extend(
                DerivedRule::ORDER
                    .iter()
                    .map(|rule| fields.render(*rule, &self.config.marker)),
            );
            rows.push(out);
        }

        info!(%summary, "annotation complete");

        Ok(AuditOutcome {
            table: Table::new(headers, rows),
            summary,
        })
    }

    fn log_unparsed_dates(
        &self,
        line: usize,
        row: &[String],
        columns: &DeclarationColumns,
        decl: &Declaration<'_>,
    ) {
        let checks = [
            (DECLARATION_DUE_DATE, columns.due_date, decl.due_date.is_some()),
            (
                DECLARATION_RECEIVED_DATE,
                columns.received_date,
                decl.received_date.is_some(),
            ),
        ];

        for (name, idx, parsed) in checks {
            let raw = row.get(idx).map(String::as_str).unwrap_or("").trim();
            if !parsed && !raw.is_empty() {
                debug!(row = line + 1, column = name, value = raw, "unparseable date treated as absent");
            }
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
