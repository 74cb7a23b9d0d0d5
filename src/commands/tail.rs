use log::info;

use crate::error::{GcbError, Result};
use crate::providers::cloudbuild::{CloudBuild, JobId};
use crate::providers::runner::CommandRunner;

/// Streams the log of `job_id`, or of the newest running job when none is given.
///
/// The id is validated before the log stream is contacted.
pub async fn run<R: CommandRunner>(builds: &CloudBuild<'_, R>, job_id: Option<&str>) -> Result<()> {
    let raw = match job_id {
        Some(id) => id.to_string(),
        None => builds
            .first_running()
            .await?
            .ok_or(GcbError::NoRunningJobs)?,
    };

    let id = JobId::parse(&raw)?;
    info!("Streaming log for job {id}");
    builds.stream_log(&id).await
}
