use log::debug;

use crate::error::Result;
use crate::providers::runner::{display_command, CommandOutput, CommandRunner};

const GSUTIL: &str = "gsutil";

/// A staged build directory, e.g. `gs://kubernetes-release-gcb/stage/v1.19.0-beta.2.1+abc/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBuild {
    pub path: String,
}

impl StagedBuild {
    /// The version segment of the path, when it follows the stage layout.
    pub fn version(&self) -> Option<&str> {
        let (_, rest) = self.path.split_once("/stage/")?;
        rest.split('/').find(|segment| !segment.is_empty())
    }
}

/// Object listings through `gsutil ls`.
pub struct Storage<'a, R: CommandRunner> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> Storage<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Lists the staged builds under `gs://<bucket>/stage`, in the order gsutil returns them.
    pub async fn staged_builds(&self, bucket: &str) -> Result<Vec<StagedBuild>> {
        let args = vec!["ls".to_string(), format!("gs://{bucket}/stage")];
        let output = self.runner.output(GSUTIL, &args).await?;

        if matched_nothing(&output) {
            debug!("No staged builds in gs://{bucket}/stage");
            return Ok(Vec::new());
        }

        let stdout = output.into_stdout(&display_command(GSUTIL, &args))?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| StagedBuild {
                path: line.to_string(),
            })
            .collect())
    }
}

/// gsutil exits non-zero for an empty prefix; that is an empty listing, not a failure.
fn matched_nothing(output: &CommandOutput) -> bool {
    !output.success && output.stderr.contains("matched no objects")
}
