use std::io::Write;

use log::{debug, info, warn};

use crate::commands::preflight::{self, RepoState};
use crate::commands::resolve_project;
use crate::config::Settings;
use crate::error::{GcbError, Result};
use crate::output::{accent, highlight, mode_label, muted, success, Prompt};
use crate::providers::account;
use crate::providers::cloudbuild::{BuildRequest, CloudBuild, SubmissionReceipt};
use crate::providers::runner::CommandRunner;
use crate::providers::toolchain::ToolchainLookup;
use crate::substitutions::SubstitutionSet;

/// Build point used when neither a version nor HEAD was requested; the job
/// then discovers its own candidate.
pub const BUILD_POINT_SENTINEL: &str = "find_green_build";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Stage,
    Release,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Release => "release",
        }
    }

    /// Job-definition file the submission references.
    pub fn job_definition(self) -> &'static str {
        match self {
            Self::Stage => "gcb/stage/cloudbuild.yaml",
            Self::Release => "gcb/release/cloudbuild.yaml",
        }
    }
}

/// Everything the operator asked for on the command line.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub kind: JobKind,
    pub branch: Option<String>,
    pub buildversion: Option<String>,
    pub build_at_head: bool,
    pub official: bool,
    pub rc: bool,
    pub nomock: bool,
    pub attended: bool,
}

impl SubmitOptions {
    /// Local checks that must pass before any external service is contacted.
    ///
    /// Returns the branch to build.
    pub fn validate(&self) -> Result<&str> {
        let branch = self
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| GcbError::Precondition("a branch must be set".to_string()))?;

        if self.official && self.rc {
            return Err(GcbError::Config(
                "--official and --rc are mutually exclusive".to_string(),
            ));
        }

        if self.kind == JobKind::Release && self.buildversion().is_none() {
            return Err(GcbError::Config(
                "release requires an explicit --buildversion".to_string(),
            ));
        }

        Ok(branch)
    }

    fn buildversion(&self) -> Option<&str> {
        self.buildversion
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// The source reference the job builds from.
    ///
    /// An explicit version wins (with `+` made tag-safe), then HEAD, then the
    /// candidate-discovery sentinel.
    pub fn build_point(&self) -> String {
        if let Some(version) = self.buildversion() {
            version.replace('+', "-")
        } else if self.build_at_head {
            "HEAD".to_string()
        } else {
            BUILD_POINT_SENTINEL.to_string()
        }
    }

    fn mode(&self) -> &'static str {
        if self.nomock {
            "nomock"
        } else {
            "mock"
        }
    }
}

/// Lookups resolved from external services for one submission.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub operator_tag: String,
    pub cross_version: String,
}

pub fn compose_substitutions(
    opts: &SubmitOptions,
    branch: &str,
    resolved: &Resolved,
    settings: &Settings,
) -> SubstitutionSet {
    let mut set = SubstitutionSet::new();

    set.insert("_RELEASE_BRANCH", branch);
    set.insert("_TYPE", opts.kind.as_str());
    set.insert(
        "_BUILDVERSION",
        opts.buildversion()
            .map(|v| format!("--buildversion={v}"))
            .unwrap_or_default(),
    );
    set.insert_flag(
        "_BUILD_AT_HEAD",
        opts.kind == JobKind::Stage && opts.build_at_head,
        "--build-at-head",
    );
    set.insert("_BUILDPOINT", opts.build_point());
    set.insert_flag("_NOMOCK", opts.nomock, "--nomock");
    set.insert("_NOMOCK_TAG", opts.mode());
    set.insert_flag("_OFFICIAL", opts.official, "--official");
    set.insert(
        "_OFFICIAL_TAG",
        if opts.official { "official" } else { "unofficial" },
    );
    set.insert_flag("_RC", opts.rc, "--rc");
    set.insert("_RC_TAG", if opts.rc { "rc" } else { "norc" });
    set.insert("_GCP_USER_TAG", resolved.operator_tag.as_str());
    set.insert("_KUBE_CROSS_VERSION", resolved.cross_version.as_str());
    set.insert("_TOOL_ORG", settings.tool.org.as_str());
    set.insert("_TOOL_REPO", settings.tool.repo.as_str());
    set.insert("_TOOL_BRANCH", settings.tool.branch.as_str());

    set
}

pub fn build_request(
    opts: &SubmitOptions,
    substitutions: SubstitutionSet,
    settings: &Settings,
) -> BuildRequest {
    BuildRequest {
        config_path: opts.kind.job_definition().to_string(),
        substitutions,
        disk_size: settings.disk_size(opts.kind),
        machine_type: settings.machine_type.clone(),
        asynchronous: !opts.attended,
    }
}

/// Submits stage and release jobs.
pub struct Submitter<'a, R: CommandRunner, P: Prompt> {
    pub settings: &'a Settings,
    pub runner: &'a R,
    pub toolchain: &'a ToolchainLookup,
    pub prompt: &'a P,
}

impl<'a, R: CommandRunner, P: Prompt> Submitter<'a, R, P> {
    fn confirm_release(&self, opts: &SubmitOptions, branch: &str) -> Result<()> {
        if opts.kind != JobKind::Release || !opts.nomock {
            return Ok(());
        }

        let question = format!("Really submit a --nomock release job against {branch}?");
        if self.prompt.confirm(&question)? {
            Ok(())
        } else {
            Err(GcbError::Precondition(
                "release not confirmed, nothing was submitted".to_string(),
            ))
        }
    }

    async fn check_repo_state(&self, opts: &SubmitOptions) -> Result<()> {
        match preflight::repo_state(self.runner).await? {
            RepoState::Dirty(changes) if opts.nomock => Err(GcbError::Precondition(format!(
                "working tree has {changes} uncommitted change(s), commit or stash before a --nomock submission"
            ))),
            RepoState::Dirty(changes) => {
                warn!("Working tree has {changes} uncommitted change(s)");
                Ok(())
            }
            RepoState::Clean | RepoState::NotARepository => Ok(()),
        }
    }

    pub async fn submit(&self, opts: &SubmitOptions, out: &mut dyn Write) -> Result<()> {
        let branch = opts.validate()?;
        self.confirm_release(opts, branch)?;
        self.check_repo_state(opts).await?;

        let project = resolve_project(self.settings, self.runner).await?;
        let builds = CloudBuild::new(self.runner, project);
        let account = account::active_account(self.runner).await?;
        let resolved = Resolved {
            operator_tag: account::operator_tag(&account, &self.settings.corporate_domain),
            cross_version: self.toolchain.cross_version(branch).await?,
        };

        let substitutions = compose_substitutions(opts, branch, &resolved, self.settings);
        debug!("Composed {} substitutions", substitutions.len());
        info!(
            "Submitting {} job for {branch} ({}, build point {})",
            opts.kind.as_str(),
            opts.mode(),
            substitutions.get("_BUILDPOINT").unwrap_or_default()
        );
        let request = build_request(opts, substitutions, self.settings);

        if opts.attended {
            builds.submit_attended(&request).await?;
            writeln!(out, "{} {} job for {branch} finished.", success("✔"), opts.kind.as_str())?;
            return Ok(());
        }

        let receipt = builds.submit(&request).await?;
        print_follow_up(out, opts, branch, &receipt)?;
        Ok(())
    }
}

fn print_follow_up(
    out: &mut dyn Write,
    opts: &SubmitOptions,
    branch: &str,
    receipt: &SubmissionReceipt,
) -> Result<()> {
    let Some(id) = &receipt.job_id else {
        warn!("Could not find a job id in the submission response");
        writeln!(out, "{}", receipt.raw)?;
        return Ok(());
    };

    writeln!(
        out,
        "{} Submitted {} job {} for {branch} ({})\n",
        success("✔"),
        opts.kind.as_str(),
        accent(id),
        mode_label(opts.nomock)
    )?;
    writeln!(out, "  {} gcbmgr tail {id}", muted("To tail this job:"))?;
    if let Some(url) = &receipt.log_url {
        writeln!(out, "  {} {}", muted("To view this build:"), highlight(url))?;
    }
    Ok(())
}
