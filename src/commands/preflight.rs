use log::debug;

use crate::error::{GcbError, Result};
use crate::providers::runner::CommandRunner;

/// External binaries every Cloud Build command drives.
pub const REQUIRED_BINARIES: [&str; 2] = ["gcloud", "gsutil"];

/// Fails with the first of `binaries` that cannot be found on `PATH`.
pub fn require_binaries(binaries: &[&str]) -> Result<()> {
    for binary in binaries {
        match which::which(binary) {
            Ok(path) => debug!("Found {binary} at {}", path.display()),
            Err(_) => return Err(GcbError::MissingBinary((*binary).to_string())),
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoState {
    Clean,
    /// Number of uncommitted changes.
    Dirty(usize),
    NotARepository,
}

/// State of the working tree the tool was started from.
pub async fn repo_state<R: CommandRunner>(runner: &R) -> Result<RepoState> {
    let args = vec!["status".to_string(), "--porcelain".to_string()];
    let output = match runner.output("git", &args).await {
        Ok(output) => output,
        Err(GcbError::Io(e)) => {
            debug!("git is not available: {e}");
            return Ok(RepoState::NotARepository);
        }
        Err(e) => return Err(e),
    };

    if !output.success {
        debug!("Not inside a git repository: {}", output.stderr.trim());
        return Ok(RepoState::NotARepository);
    }

    let changes = output.stdout.lines().filter(|l| !l.trim().is_empty()).count();
    Ok(if changes == 0 {
        RepoState::Clean
    } else {
        RepoState::Dirty(changes)
    })
}
