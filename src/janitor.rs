use crate::models::CleanupReport;
use std::io::ErrorKind;
use std::path::Path;

pub fn sweep(output_dir: &Path) -> CleanupReport {
    let mut report = CleanupReport::default();
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            tracing::debug!(dir = %output_dir.display(), "output directory absent, nothing to clean");
            return report;
        }
        Err(error) => {
            tracing::warn!(dir = %output_dir.display(), error = %error, "failed to list output directory");
            report.failed += 1;
            return report;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_file = entry.file_type().map(|kind| kind.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "failed to remove artifact");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        dir = %output_dir.display(),
        removed = report.removed,
        failed = report.failed,
        "cleaned output directory"
    );
    report
}
