use log::{debug, info};

use super::parse::{self, JobId, SubmissionReceipt};
use super::types::BuildJob;
use crate::error::{GcbError, Result};
use crate::providers::runner::{display_command, CommandRunner};
use crate::substitutions::SubstitutionSet;

const GCLOUD: &str = "gcloud";

/// A build submission as handed to `gcloud builds submit`.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Job-definition file, relative to the tool repository checkout.
    pub config_path: String,
    pub substitutions: SubstitutionSet,
    pub disk_size: u32,
    pub machine_type: String,
    /// Queue the job and return immediately instead of streaming its log.
    pub asynchronous: bool,
}

impl BuildRequest {
    fn args(&self, project: &str) -> Result<Vec<String>> {
        let mut args = vec![
            "builds".to_string(),
            "submit".to_string(),
            "--no-source".to_string(),
            format!("--config={}", self.config_path),
            format!("--substitutions={}", self.substitutions.to_arg()?),
            format!("--disk-size={}", self.disk_size),
            format!("--machine-type={}", self.machine_type),
            format!("--project={project}"),
        ];
        if self.asynchronous {
            args.push("--async".to_string());
        }
        Ok(args)
    }
}

/// Cloud Build access through the `gcloud builds` command group.
pub struct CloudBuild<'a, R: CommandRunner> {
    runner: &'a R,
    project: String,
}

impl<'a, R: CommandRunner> CloudBuild<'a, R> {
    pub fn new(runner: &'a R, project: impl Into<String>) -> Self {
        Self {
            runner,
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    async fn gcloud(&self, args: Vec<String>) -> Result<String> {
        let command = display_command(GCLOUD, &args);
        self.runner
            .output(GCLOUD, &args)
            .await?
            .into_stdout(&command)
    }

    /// Most recent jobs first, as ordered by the service.
    pub async fn list(&self, limit: usize, filter: Option<&str>) -> Result<Vec<BuildJob>> {
        let mut args = vec![
            "builds".to_string(),
            "list".to_string(),
            format!("--limit={limit}"),
            "--format=json".to_string(),
            format!("--project={}", self.project),
        ];
        if let Some(filter) = filter {
            args.push(format!("--filter={filter}"));
        }

        let jobs = parse::parse_job_list(&self.gcloud(args).await?)?;
        debug!("Listed {} jobs", jobs.len());
        Ok(jobs)
    }

    pub async fn describe(&self, id: &str) -> Result<BuildJob> {
        let args = vec![
            "builds".to_string(),
            "describe".to_string(),
            id.to_string(),
            "--format=json".to_string(),
            format!("--project={}", self.project),
        ];
        parse::parse_job(&self.gcloud(args).await?)
    }

    /// Id of the newest job still in the WORKING state, if any.
    pub async fn first_running(&self) -> Result<Option<String>> {
        let jobs = self.list(1, Some("status=WORKING")).await?;
        Ok(jobs.into_iter().next().map(|job| job.id))
    }

    /// Forwards the job's log to the console until the stream ends.
    pub async fn stream_log(&self, id: &JobId) -> Result<()> {
        let args = vec![
            "builds".to_string(),
            "log".to_string(),
            "--stream".to_string(),
            id.to_string(),
            format!("--project={}", self.project),
        ];
        self.attach(args).await
    }

    /// Queues the build and returns what could be parsed from gcloud's response.
    pub async fn submit(&self, request: &BuildRequest) -> Result<SubmissionReceipt> {
        let args = request.args(&self.project)?;
        let command = display_command(GCLOUD, &args);
        info!("Submitting: {command}");

        let output = self.runner.output(GCLOUD, &args).await?.check(&command)?;
        Ok(parse::parse_submission(&output.stdout, &output.stderr))
    }

    /// Submits the build and stays attached to its log until it completes.
    pub async fn submit_attended(&self, request: &BuildRequest) -> Result<()> {
        let args = request.args(&self.project)?;
        info!("Submitting (attended): {}", display_command(GCLOUD, &args));
        self.attach(args).await
    }

    async fn attach(&self, args: Vec<String>) -> Result<()> {
        if self.runner.attach(GCLOUD, &args).await? {
            Ok(())
        } else {
            Err(GcbError::CommandFailed {
                command: display_command(GCLOUD, &args),
                stderr: "exited with a non-zero status (see output above)".to_string(),
            })
        }
    }
}
