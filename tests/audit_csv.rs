// End-to-end: CSV bytes in, annotated CSV bytes out

use chrono::NaiveDate;
use tkhq_audit::{
    read_table, table_to_bytes, Assembler, AuditConfig, AuditContext, AuditError, LabelStyle,
};

const EXPORT: &str = "\
STT,DECLARATION_REF_NO,DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE,AMOUNT
1,TK-0001,2025-01-01,,1200000
2,TK-0002,,2025-03-02,540000
3,TK-0003,2025-05-01,2025-05-10,99000
4,TK-GIA HAN-001,2025-05-31,,15000
5,tk 0005 gia han,2025-04-20 00:00:00,,800
";

fn audit_date() -> AuditContext {
    AuditContext::new(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap())
}

fn annotate(input: &str, config: AuditConfig) -> Result<String, AuditError> {
    let table = read_table(input.as_bytes(), b',')?;
    let outcome = Assembler::new(config).annotate(&table, &audit_date())?;
    let bytes = table_to_bytes(&outcome.table, b',')?;
    Ok(String::from_utf8(bytes).unwrap())
}

#[test]
fn annotates_export_end_to_end() {
    let output = annotate(EXPORT, AuditConfig::default()).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(
        lines,
        vec![
            "STT,DECLARATION_REF_NO,DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE,AMOUNT,\
             missing_due_date_flag,overdue_days,overdue_unfiled_flag,overdue_over_90_flag,extension_flag",
            "1,TK-0001,2025-01-01,,1200000,,150,X,X,",
            "2,TK-0002,,2025-03-02,540000,X,,,,",
            "3,TK-0003,2025-05-01,2025-05-10,99000,,,,,",
            "4,TK-GIA HAN-001,2025-05-31,,15000,,,,,X",
            "5,tk 0005 gia han,2025-04-20 00:00:00,,800,,41,X,,X",
        ]
    );
}

#[test]
fn output_reads_back_with_same_rows() {
    let output = annotate(EXPORT, AuditConfig::default()).unwrap();
    let input = read_table(EXPORT.as_bytes(), b',').unwrap();
    let reread = read_table(output.as_bytes(), b',').unwrap();

    assert_eq!(reread.row_count(), input.row_count());
    assert_eq!(&reread.headers[..input.column_count()], input.headers.as_slice());
}

#[test]
fn rerunning_on_output_changes_nothing() {
    let once = annotate(EXPORT, AuditConfig::default()).unwrap();
    let twice = annotate(&once, AuditConfig::default()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn missing_received_date_column_fails_whole_run() {
    let err = annotate(
        "DECLARATION_DUE_DATE,AMOUNT\n2025-01-01,10\n",
        AuditConfig::default(),
    )
    .unwrap_err();

    assert!(err.is_structural());
    assert_eq!(
        err.to_string(),
        "missing required column(s): DECLARATION_RECEIVED_DATE"
    );
}

#[test]
fn vietnamese_report_headers() {
    let config = AuditConfig {
        labels: LabelStyle::Vietnamese,
        ..AuditConfig::default()
    };
    let output = annotate(EXPORT, config).unwrap();
    let header = output.lines().next().unwrap();

    assert!(header.ends_with(
        "KHÔNG NHẬP NGÀY ĐẾN HẠN TKHQ,SỐ NGÀY QUÁ HẠN TKHQ,QUÁ HẠN CHƯA NHẬP TKHQ,\
         QUÁ HẠN > 90 NGÀY CHƯA NHẬP TKHQ,CÓ PHÁT SINH GIA HẠN TKHQ"
    ));
}

#[test]
fn config_file_settings_apply() {
    let config = AuditConfig::from_json(
        r#"{ "overdue_threshold_days": 30, "marker": "Y", "extension_tokens": ["ext"] }"#,
    )
    .unwrap();

    let output = annotate(
        "DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE,DECLARATION_REF_NO\n\
         2025-04-20,,REF EXT\n",
        config,
    )
    .unwrap();

    assert_eq!(output.lines().nth(1), Some("2025-04-20,,REF EXT,,41,Y,Y,Y"));
    assert!(output.starts_with(
        "DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE,DECLARATION_REF_NO,\
         missing_due_date_flag,overdue_days,overdue_unfiled_flag,overdue_over_30_flag,extension_flag"
    ));
}
