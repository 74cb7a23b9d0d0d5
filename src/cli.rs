use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::io;
use std::path::PathBuf;

use crate::commands::submit::{JobKind, SubmitOptions, Submitter};
use crate::commands::{self, list, manifest, preflight, staged, tail};
use crate::config::{Config, Overrides, Settings};
use crate::output::TerminalPrompt;
use crate::providers::account;
use crate::providers::cloudbuild::CloudBuild;
use crate::providers::releases::ReleaseRegistry;
use crate::providers::runner::SystemRunner;
use crate::providers::storage::Storage;
use crate::providers::toolchain::ToolchainLookup;

#[derive(Parser)]
#[command(name = "gcbmgr")]
#[command(author, version, about = "Submit, list and stream release jobs on Google Cloud Build", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cloud project to run jobs in [default: gcloud's configured project]
    #[arg(long, global = true, env = "GCB_PROJECT")]
    project: Option<String>,

    /// Project-wide staging bucket
    #[arg(long, global = true, env = "GCB_BUCKET")]
    bucket: Option<String>,

    #[arg(long, global = true, env = "GCB_MOCK_BUCKET_PREFIX", hide = true)]
    mock_bucket_prefix: Option<String>,

    /// Configuration file [default: ./gcbmgr.{toml,json,yaml,yml}]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Work against production resources instead of the per-operator mock ones
    #[arg(long, global = true, default_value_t = false)]
    nomock: bool,

    /// Stay attached to the submitted job's log until it completes
    #[arg(long, global = true, default_value_t = false)]
    attended: bool,

    /// Disk size in GB for submitted jobs [default: 300 for stage, 100 for release]
    #[arg(long, global = true, env = "GCB_DISK_SIZE")]
    disk_size: Option<u32>,

    #[arg(long, global = true, env = "TOOL_ORG", hide = true)]
    tool_org: Option<String>,

    #[arg(long, global = true, env = "TOOL_REPO", hide = true)]
    tool_repo: Option<String>,

    #[arg(long, global = true, env = "TOOL_BRANCH", hide = true)]
    tool_branch: Option<String>,

    /// Mirror log records to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the most recent jobs
    List {
        /// Only show jobs in this state (working, success, failure, cancelled)
        status: Option<String>,
    },

    /// Show published releases and staged builds
    Staged,

    /// Stream a job's log [default: the newest running job]
    #[command(alias = "stream")]
    Tail { job_id: Option<String> },

    /// Submit a stage job
    Stage {
        #[command(flatten)]
        args: SubmitArgs,

        /// Build from the branch head instead of the last green build
        #[arg(long, default_value_t = false)]
        build_at_head: bool,
    },

    /// Submit a release job for a previously staged build
    Release {
        #[command(flatten)]
        args: SubmitArgs,
    },

    /// Summarize a release manifest file
    Manifest { path: PathBuf },
}

#[derive(Args)]
struct SubmitArgs {
    /// Branch to build from, e.g. master or release-1.18
    branch: Option<String>,

    /// Exact version to build; required for release
    #[arg(long)]
    buildversion: Option<String>,

    #[arg(long, default_value_t = false)]
    official: bool,

    #[arg(long, default_value_t = false)]
    rc: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            project: self.project.clone(),
            bucket: self.bucket.clone(),
            mock_bucket_prefix: self.mock_bucket_prefix.clone(),
            disk_size: self.disk_size,
            tool_org: self.tool_org.clone(),
            tool_repo: self.tool_repo.clone(),
            tool_branch: self.tool_branch.clone(),
            nomock: self.nomock,
            attended: self.attended,
        }
    }

    fn submit_options(
        settings: &Settings,
        kind: JobKind,
        args: &SubmitArgs,
        build_at_head: bool,
    ) -> SubmitOptions {
        SubmitOptions {
            kind,
            branch: args.branch.clone(),
            buildversion: args.buildversion.clone(),
            build_at_head,
            official: args.official,
            rc: args.rc,
            nomock: settings.nomock,
            attended: settings.attended,
        }
    }

    async fn execute_submit(&self, settings: &Settings, opts: SubmitOptions) -> Result<()> {
        opts.validate()?;

        let upstream = &settings.upstream;
        let toolchain = ToolchainLookup::new(
            &upstream.raw_base_url,
            &upstream.repo,
            &upstream.baseline_branch,
        )?;
        let submitter = Submitter {
            settings,
            runner: &SystemRunner,
            toolchain: &toolchain,
            prompt: &TerminalPrompt,
        };

        submitter
            .submit(&opts, &mut io::stdout())
            .await
            .with_context(|| format!("{} submission failed", opts.kind.as_str()))
    }

    async fn execute_staged(&self, settings: &Settings) -> Result<()> {
        let runner = SystemRunner;

        let operator_tag = if settings.nomock {
            None
        } else {
            let account = account::active_account(&runner).await?;
            Some(account::operator_tag(&account, &settings.corporate_domain))
        };
        let buckets = staged::stage_buckets(settings, operator_tag.as_deref());

        let upstream = &settings.upstream;
        let registry = ReleaseRegistry::new(&upstream.storage_base_url, &upstream.release_bucket)?;
        let storage = Storage::new(&runner);

        staged::run(&storage, &registry, &buckets, &mut io::stdout()).await?;
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        if let Commands::Manifest { path } = &self.command {
            return manifest::run(path, &mut io::stdout());
        }

        let config = Config::load(self.config.as_deref())?;
        let settings = Settings::resolve(config, self.overrides());
        info!(
            "Running in {} mode",
            if settings.nomock { "nomock" } else { "mock" }
        );

        preflight::require_binaries(&preflight::REQUIRED_BINARIES)?;

        let runner = SystemRunner;
        match &self.command {
            Commands::List { status } => {
                let filter = list::parse_status_filter(status.as_deref())?;
                let project = commands::resolve_project(&settings, &runner).await?;
                list::run(&CloudBuild::new(&runner, project), filter, &mut io::stdout()).await?;
            }
            Commands::Tail { job_id } => {
                let project = commands::resolve_project(&settings, &runner).await?;
                tail::run(&CloudBuild::new(&runner, project), job_id.as_deref()).await?;
            }
            Commands::Staged => self.execute_staged(&settings).await?,
            Commands::Stage {
                args,
                build_at_head,
            } => {
                let opts = Self::submit_options(&settings, JobKind::Stage, args, *build_at_head);
                self.execute_submit(&settings, opts).await?;
            }
            Commands::Release { args } => {
                let opts = Self::submit_options(&settings, JobKind::Release, args, false);
                self.execute_submit(&settings, opts).await?;
            }
            // Loaded before any configuration or pre-flight check.
            Commands::Manifest { .. } => {}
        }

        Ok(())
    }
}
