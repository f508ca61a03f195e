use super::engine::{Outcome, RecordResult};
use crate::error::Result;
use indicatif::HumanDuration;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// The single summary line every share gets.
pub fn log_result(result: &RecordResult, dry_run: bool) {
    match &result.outcome {
        Outcome::Skipped(reason) => {
            info!("RECORD: {} SKIPPED: {} ({:?})", result.share_id, reason, result.path)
        }
        Outcome::Updated { plan, .. } => info!(
            "RECORD: {} {}UPDATE SET item_source={} item_target={} file_source={} file_target={}",
            result.share_id,
            if dry_run { "DRY RUN " } else { "" },
            plan.item_source,
            plan.item_target,
            plan.file_source,
            plan.file_target
        ),
        Outcome::Failed(err) => error!(
            "RECORD: {} FAILED (file_source {:?}): {}",
            result.share_id, result.file_source, err
        ),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[RecordResult]) -> Self {
        let mut summary = BatchSummary {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.outcome {
                Outcome::Skipped(_) => summary.skipped += 1,
                Outcome::Updated { .. } => summary.updated += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    // Plain text: the file layer writes messages as they are.
    pub fn message(&self, elapsed: Duration) -> String {
        format!(
            "{} shares in {}: {} updated, {} skipped, {} failed",
            self.total,
            HumanDuration(elapsed),
            self.updated,
            self.skipped,
            self.failed
        )
    }

    pub fn log(&self, elapsed: Duration, dry_run: bool) {
        info!("{}", self.message(elapsed));
        info!("Success. Dry run: {}", dry_run);
    }
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    share_id: i64,
    file_source: Option<i64>,
    path: Option<&'a str>,
    outcome: &'static str,
    detail: String,
    new_item_source: Option<&'a str>,
    new_item_target: Option<&'a str>,
    new_file_source: Option<i64>,
    new_file_target: Option<&'a str>,
    dry_run: bool,
    finished_at: String,
}

impl<'a> ReportRow<'a> {
    fn new(result: &'a RecordResult, dry_run: bool) -> Self {
        let mut row = ReportRow {
            share_id: result.share_id,
            file_source: result.file_source,
            path: result.path.as_deref(),
            outcome: "",
            detail: String::new(),
            new_item_source: None,
            new_item_target: None,
            new_file_source: None,
            new_file_target: None,
            dry_run,
            finished_at: result.finished_at.to_rfc3339(),
        };
        match &result.outcome {
            Outcome::Skipped(reason) => {
                row.outcome = "skipped";
                row.detail = reason.to_string();
            }
            Outcome::Updated {
                plan,
                version_folder,
            } => {
                row.outcome = "updated";
                row.detail = version_folder.clone();
                row.new_item_source = Some(&plan.item_source);
                row.new_item_target = Some(&plan.item_target);
                row.new_file_source = Some(plan.file_source);
                row.new_file_target = Some(&plan.file_target);
            }
            Outcome::Failed(err) => {
                row.outcome = "failed";
                row.detail = err.to_string();
            }
        }
        row
    }
}

/// Write one CSV row per share. Returns the number of rows written.
pub fn write_csv(path: &Path, results: &[RecordResult], dry_run: bool) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    for result in results {
        writer.serialize(ReportRow::new(result, dry_run))?;
    }
    writer.flush()?;
    Ok(results.len())
}
