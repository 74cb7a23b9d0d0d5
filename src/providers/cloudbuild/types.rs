use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::GcbError;

/// Lifecycle state of a build job as reported by Cloud Build.
///
/// Only the four states the operator can filter on get their own variant;
/// anything else the service reports (QUEUED, TIMEOUT, ...) is carried as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Working,
    Success,
    Failure,
    Cancelled,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Working => "WORKING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Cancelled => "CANCELLED",
            Self::Other(status) => status,
        }
    }

    fn from_service(status: &str) -> Self {
        status
            .parse()
            .unwrap_or_else(|_| Self::Other(status.to_uppercase()))
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = GcbError;

    /// Parses one of the four filterable states, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WORKING" => Ok(Self::Working),
            "SUCCESS" => Ok(Self::Success),
            "FAILURE" => Ok(Self::Failure),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(GcbError::Precondition(format!(
                "unknown job status '{s}' (expected one of WORKING, SUCCESS, FAILURE, CANCELLED)"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let status = String::deserialize(deserializer)?;
        Ok(Self::from_service(&status))
    }
}

/// A snapshot of one Cloud Build job, as returned by `gcloud builds list/describe`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildJob {
    pub id: String,
    pub status: JobStatus,
    pub create_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: Option<BuildSource>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl BuildJob {
    /// When the job started running, or when it was queued if it has not started yet.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time.or(self.create_time)
    }

    /// Time spent so far; open-ended jobs are measured against `now`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let start = self.started_at()?;
        let end = self.finish_time.unwrap_or(now);
        Some(end - start)
    }

    /// Short human-readable description of where the job's sources came from.
    pub fn source_reference(&self) -> String {
        self.source
            .as_ref()
            .and_then(BuildSource::reference)
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSource {
    pub storage_source: Option<StorageSource>,
    pub repo_source: Option<RepoSource>,
}

impl BuildSource {
    fn reference(&self) -> Option<String> {
        if let Some(storage) = &self.storage_source {
            return Some(format!("gs://{}/{}", storage.bucket, storage.object));
        }

        let repo = self.repo_source.as_ref()?;
        let revision = repo
            .branch_name
            .as_deref()
            .or(repo.tag_name.as_deref())
            .or(repo.commit_sha.as_deref())
            .unwrap_or("HEAD");
        Some(format!("{}@{}", repo.repo_name, revision))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSource {
    pub bucket: String,
    pub object: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSource {
    pub repo_name: String,
    pub branch_name: Option<String>,
    pub tag_name: Option<String>,
    pub commit_sha: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOB_JSON: &str = r#"{
        "id": "3f1b6a9e-5c2d-4e8f-9a0b-1c2d3e4f5a6b",
        "status": "SUCCESS",
        "createTime": "2020-04-28T19:09:30.000000Z",
        "startTime": "2020-04-28T19:09:34.528464Z",
        "finishTime": "2020-04-28T20:19:34.528464Z",
        "images": ["gcr.io/k8s-staging/kube-apiserver:v1.18.3"],
        "tags": ["jane", "release-1-18", "STAGE", "mock"],
        "logUrl": "https://console.cloud.google.com/cloud-build/builds/3f1b6a9e"
    }"#;

    #[test]
    fn deserializes_gcloud_json() {
        let job: BuildJob = serde_json::from_str(JOB_JSON).unwrap();
        assert_eq!(job.status, JobStatus::Success);
        assert_eq!(job.tags.len(), 4);
        assert_eq!(job.images, vec!["gcr.io/k8s-staging/kube-apiserver:v1.18.3"]);
        assert_eq!(job.source_reference(), "-");
    }

    #[test]
    fn elapsed_uses_finish_time_when_present() {
        let job: BuildJob = serde_json::from_str(JOB_JSON).unwrap();
        let elapsed = job.elapsed(Utc::now()).unwrap();
        assert_eq!(elapsed.num_minutes(), 70);
    }

    #[test]
    fn elapsed_runs_to_now_for_open_jobs() {
        let job: BuildJob = serde_json::from_str(
            r#"{"id": "a", "status": "WORKING", "startTime": "2020-04-28T19:00:00Z"}"#,
        )
        .unwrap();
        let now = "2020-04-28T19:05:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(job.elapsed(now).unwrap().num_seconds(), 300);
    }

    #[test]
    fn unknown_service_status_is_kept() {
        let job: BuildJob =
            serde_json::from_str(r#"{"id": "a", "status": "queued"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Other("QUEUED".to_string()));
        assert!(job.elapsed(Utc::now()).is_none());
    }

    #[test]
    fn status_filter_parsing_ignores_case() {
        assert_eq!("working".parse::<JobStatus>().unwrap(), JobStatus::Working);
        assert_eq!("Cancelled".parse::<JobStatus>().unwrap(), JobStatus::Cancelled);
        assert!("TIMEOUT".parse::<JobStatus>().is_err());
    }

    #[test]
    fn storage_source_reference() {
        let job: BuildJob = serde_json::from_str(
            r#"{"id": "a", "status": "SUCCESS",
                "source": {"storageSource": {"bucket": "b", "object": "source/1.tgz"}}}"#,
        )
        .unwrap();
        assert_eq!(job.source_reference(), "gs://b/source/1.tgz");
    }

    #[test]
    fn repo_source_reference() {
        let job: BuildJob = serde_json::from_str(
            r#"{"id": "a", "status": "SUCCESS",
                "source": {"repoSource": {"repoName": "release", "branchName": "master"}}}"#,
        )
        .unwrap();
        assert_eq!(job.source_reference(), "release@master");
    }
}
