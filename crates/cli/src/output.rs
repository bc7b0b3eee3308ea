use crate::error::CliError;
use engine_runtime::MigrationReport;
use tracing::{info, warn};

fn generate_report_json(report: &MigrationReport) -> Result<String, CliError> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

pub async fn write_report(report: &MigrationReport, path: &str) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    tokio::fs::write(path, report_json).await?;
    info!(path, "Summary written");
    Ok(())
}

pub fn print_report(report: &MigrationReport) -> Result<(), CliError> {
    let report_json = generate_report_json(report)?;
    println!("{report_json}");
    Ok(())
}

/// Logs one line per table plus the run totals.
pub fn log_summary(report: &MigrationReport) {
    for table in &report.imported {
        info!(
            table = %table.table,
            rows = table.rows,
            chunks = table.chunks,
            attempts = table.attempts,
            "Imported"
        );
    }
    for table in &report.failed {
        warn!(table = %table.table, chunk = ?table.chunk, error = %table.error, "Failed");
    }

    let elapsed = report.finished_at - report.started_at;
    info!(
        imported = report.imported.len(),
        failed = report.failed.len(),
        rows = report.metrics.rows_imported,
        bytes = report.metrics.bytes_imported,
        retries = report.metrics.retries,
        elapsed_ms = elapsed.num_milliseconds(),
        "Run summary"
    );
}
