//! Parsers for the text `gcloud builds` prints.
//!
//! Every assumption about gcloud's output format lives in this module. When a
//! pattern does not match, the parsers degrade to `None` rather than failing,
//! and callers fall back to showing the raw response to the operator.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::types::BuildJob;
use crate::error::{GcbError, Result};

fn job_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("job id pattern is valid")
    })
}

fn build_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"/builds/([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})")
            .expect("build url pattern is valid")
    })
}

fn bare_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\b")
            .expect("bare id pattern is valid")
    })
}

fn log_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Logs are available at \[(\S+?)\]").expect("log url pattern is valid")
    })
}

fn console_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"https://console\.cloud\.google\.com/cloud-build/builds[^\s\]]+")
            .expect("console url pattern is valid")
    })
}

/// A validated Cloud Build job identifier.
///
/// 32 lowercase hex digits grouped 8-4-4-4-12 by hyphens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId(String);

impl JobId {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if job_id_pattern().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(GcbError::InvalidJobId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What could be recovered from the output of an asynchronous `gcloud builds submit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub job_id: Option<JobId>,
    pub log_url: Option<String>,
    /// Combined response text, kept for the operator when parsing comes up short.
    pub raw: String,
}

/// Extracts the job id and log URL from submission output.
///
/// gcloud reports the created build as a resource URL on stderr
/// (`Created [https://cloudbuild.googleapis.com/v1/projects/p/builds/<id>].`)
/// and prints a table with the bare id on stdout, so both streams are searched.
pub fn parse_submission(stdout: &str, stderr: &str) -> SubmissionReceipt {
    let raw = [stderr.trim(), stdout.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    let job_id = build_url_pattern()
        .captures(&raw)
        .or_else(|| bare_id_pattern().captures(&raw))
        .and_then(|caps| caps.get(1))
        .and_then(|m| JobId::parse(m.as_str()).ok());

    let log_url = log_url_pattern()
        .captures(&raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            console_url_pattern()
                .find(&raw)
                .map(|m| m.as_str().to_string())
        });

    SubmissionReceipt {
        job_id,
        log_url,
        raw,
    }
}

/// Parses the `--format=json` output of `gcloud builds list`.
pub fn parse_job_list(stdout: &str) -> Result<Vec<BuildJob>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(stdout).map_err(|e| GcbError::Parse {
        source_name: "gcloud builds list",
        message: e.to_string(),
    })
}

/// Parses the `--format=json` output of `gcloud builds describe`.
pub fn parse_job(stdout: &str) -> Result<BuildJob> {
    serde_json::from_str(stdout).map_err(|e| GcbError::Parse {
        source_name: "gcloud builds describe",
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0b8b4b3e-6f1d-4c3a-9a39-6ad1b5d5e2f1";

    mod job_id {
        use super::*;

        #[test]
        fn accepts_cloud_build_ids() {
            let id = JobId::parse(ID).unwrap();
            assert_eq!(id.as_str(), ID);
        }

        #[test]
        fn trims_surrounding_whitespace() {
            let id = JobId::parse(&format!("  {ID}\n")).unwrap();
            assert_eq!(id.to_string(), ID);
        }

        #[test]
        fn rejects_empty() {
            assert!(matches!(JobId::parse(""), Err(GcbError::InvalidJobId(_))));
        }

        #[test]
        fn rejects_wrong_grouping() {
            assert!(JobId::parse("0b8b4b3e6f1d-4c3a-9a39-6ad1-b5d5e2f1").is_err());
        }

        #[test]
        fn rejects_uppercase_and_non_hex() {
            assert!(JobId::parse("0B8B4B3E-6F1D-4C3A-9A39-6AD1B5D5E2F1").is_err());
            assert!(JobId::parse("zb8b4b3e-6f1d-4c3a-9a39-6ad1b5d5e2f1").is_err());
        }

        #[test]
        fn rejects_ids_with_trailing_text() {
            assert!(JobId::parse(&format!("{ID}; rm -rf /")).is_err());
        }
    }

    mod submission {
        use super::*;

        #[test]
        fn extracts_id_and_log_url_from_gcloud_output() {
            let stderr = format!(
                "Created [https://cloudbuild.googleapis.com/v1/projects/kubernetes-release-test/builds/{ID}].\n\
                 Logs are available at [https://console.cloud.google.com/cloud-build/builds/{ID}?project=648026197307]."
            );
            let stdout = format!(
                "ID  CREATE_TIME  DURATION  SOURCE  IMAGES  STATUS\n{ID}  2020-04-28T19:09:34+00:00  -  -  -  QUEUED\n"
            );

            let receipt = parse_submission(&stdout, &stderr);
            assert_eq!(receipt.job_id.unwrap().as_str(), ID);
            assert_eq!(
                receipt.log_url.unwrap(),
                format!("https://console.cloud.google.com/cloud-build/builds/{ID}?project=648026197307")
            );
        }

        #[test]
        fn falls_back_to_bare_id_and_console_url() {
            let stdout = format!(
                "{ID} QUEUED\nsee https://console.cloud.google.com/cloud-build/builds/{ID}?project=1"
            );
            let receipt = parse_submission(&stdout, "");
            assert_eq!(receipt.job_id.unwrap().as_str(), ID);
            assert_eq!(
                receipt.log_url.unwrap(),
                format!("https://console.cloud.google.com/cloud-build/builds/{ID}?project=1")
            );
        }

        #[test]
        fn missing_patterns_leave_fields_empty() {
            let receipt = parse_submission("nothing useful here", "");
            assert!(receipt.job_id.is_none());
            assert!(receipt.log_url.is_none());
            assert_eq!(receipt.raw, "nothing useful here");
        }
    }

    mod job_list {
        use super::*;

        #[test]
        fn empty_output_means_no_jobs() {
            assert!(parse_job_list("").unwrap().is_empty());
            assert!(parse_job_list("[]").unwrap().is_empty());
        }

        #[test]
        fn garbled_output_is_a_parse_error() {
            let err = parse_job_list("Listed 0 items.").unwrap_err();
            assert!(matches!(err, GcbError::Parse { .. }));
        }
    }
}
