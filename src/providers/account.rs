use log::debug;

use crate::error::{GcbError, Result};
use crate::providers::runner::{display_command, CommandRunner};

/// The account gcloud is currently authenticated as.
pub async fn active_account<R: CommandRunner>(runner: &R) -> Result<String> {
    let args = vec![
        "auth".to_string(),
        "list".to_string(),
        "--filter=status:ACTIVE".to_string(),
        "--format=value(account)".to_string(),
    ];
    let stdout = runner
        .output("gcloud", &args)
        .await?
        .into_stdout(&display_command("gcloud", &args))?;

    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            GcbError::Precondition(
                "no active gcloud account, run `gcloud auth login` first".to_string(),
            )
        })
}

/// The project gcloud is configured to use when none was given explicitly.
pub async fn configured_project<R: CommandRunner>(runner: &R) -> Result<String> {
    let args = vec![
        "config".to_string(),
        "get-value".to_string(),
        "project".to_string(),
    ];
    let stdout = runner
        .output("gcloud", &args)
        .await?
        .into_stdout(&display_command("gcloud", &args))?;

    let project = stdout.trim();
    if project.is_empty() || project == "(unset)" {
        return Err(GcbError::Config(
            "no cloud project set, pass --project or run `gcloud config set project <id>`"
                .to_string(),
        ));
    }

    debug!("Using gcloud configured project {project}");
    Ok(project.to_string())
}

/// Derives the tag-safe operator name attached to every submitted job.
///
/// Accounts in the corporate domain lose their domain; any other account
/// keeps it with `@` spelled out. Dots are not allowed in tags or bucket
/// segments and become hyphens.
pub fn operator_tag(account: &str, corporate_domain: &str) -> String {
    let account = account.trim().to_lowercase();
    let corporate_suffix = format!("@{}", corporate_domain.to_lowercase());

    let tag = match account.strip_suffix(&corporate_suffix) {
        Some(user) => user.to_string(),
        None => account.replace('@', "-at-"),
    };

    tag.replace('.', "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::runner::fake::FakeRunner;

    mod operator_tag {
        use super::*;

        #[test]
        fn strips_corporate_domain() {
            assert_eq!(operator_tag("jane@google.com", "google.com"), "jane");
        }

        #[test]
        fn spells_out_foreign_domains() {
            assert_eq!(
                operator_tag("jane@example.com", "google.com"),
                "jane-at-example-com"
            );
        }

        #[test]
        fn lowercases_and_replaces_dots() {
            assert_eq!(operator_tag("Jane.Doe@Google.com", "google.com"), "jane-doe");
        }

        #[test]
        fn subdomain_of_corporate_domain_is_foreign() {
            assert_eq!(
                operator_tag("jane@mail.google.com", "google.com"),
                "jane-at-mail-google-com"
            );
        }
    }

    #[tokio::test]
    async fn active_account_takes_first_line() {
        let runner = FakeRunner::new().on("auth list", "jane@google.com\n");
        assert_eq!(active_account(&runner).await.unwrap(), "jane@google.com");
    }

    #[tokio::test]
    async fn no_active_account_is_a_precondition_failure() {
        let runner = FakeRunner::new().on("auth list", "\n");
        assert!(matches!(
            active_account(&runner).await,
            Err(GcbError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn unset_project_is_a_config_error() {
        let runner = FakeRunner::new().on("config get-value project", "(unset)\n");
        assert!(matches!(
            configured_project(&runner).await,
            Err(GcbError::Config(_))
        ));
    }

    #[tokio::test]
    async fn configured_project_is_trimmed() {
        let runner = FakeRunner::new().on("config get-value project", "kubernetes-release-test\n");
        assert_eq!(
            configured_project(&runner).await.unwrap(),
            "kubernetes-release-test"
        );
    }
}
