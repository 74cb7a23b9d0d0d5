pub mod list;
pub mod manifest;
pub mod preflight;
pub mod staged;
pub mod submit;
pub mod tail;

use crate::config::Settings;
use crate::error::Result;
use crate::providers::account;
use crate::providers::runner::CommandRunner;

/// The project jobs run in: the configured one, else gcloud's active project.
pub async fn resolve_project<R: CommandRunner>(settings: &Settings, runner: &R) -> Result<String> {
    if let Some(project) = &settings.project {
        return Ok(project.clone());
    }

    account::configured_project(runner).await
}
