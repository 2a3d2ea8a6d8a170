use tracing::info;

use smting_types::models::{Report, ReportReason};

use crate::clock::Clock;
use crate::error::{CoreError, ValidationError};
use crate::store::{ProfileStore, ReportStore};

/// File a report against another user.
pub fn file_report(
    reports: &dyn ReportStore,
    profiles: &dyn ProfileStore,
    clock: &dyn Clock,
    reporter_id: &str,
    reported_id: &str,
    reason: ReportReason,
) -> Result<Report, CoreError> {
    if reporter_id == reported_id {
        return Err(ValidationError::SelfTarget.into());
    }
    if profiles.get_profile(reported_id)?.is_none() {
        return Err(CoreError::ProfileNotFound(reported_id.to_string()));
    }
    let report = reports.insert_report(reporter_id, reported_id, reason, clock.now())?;
    info!(report = %report.id, reported = reported_id, reason = %reason, "Report filed");
    Ok(report)
}
