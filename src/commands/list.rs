use std::io::Write;

use chrono::{DateTime, Duration, Local, Utc};
use comfy_table::Cell;
use log::{info, warn};

use crate::error::Result;
use crate::output::{create_table, cyan_header, section_header, status_cell, Spinner};
use crate::providers::cloudbuild::{BuildJob, CloudBuild, JobStatus};
use crate::providers::runner::CommandRunner;

/// Most rows the listing ever shows, and how many jobs it fetches.
pub const MAX_ROWS: usize = 5;

/// Parses the optional status filter; a blank filter matches every job.
pub fn parse_status_filter(raw: Option<&str>) -> Result<Option<JobStatus>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(status) => status.parse().map(Some),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRow {
    pub id: String,
    pub started: String,
    pub duration: String,
    pub source: String,
    pub images: String,
    pub status: JobStatus,
    pub tags: String,
}

fn format_duration(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else {
        format!("{minutes}m{seconds:02}s")
    }
}

fn build_row(job: &BuildJob, tags: Option<Vec<String>>, now: DateTime<Utc>) -> JobRow {
    JobRow {
        id: job.id.clone(),
        started: job
            .started_at()
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
        duration: job
            .elapsed(now)
            .map(format_duration)
            .unwrap_or_else(|| "-".to_string()),
        source: job.source_reference(),
        images: if job.images.is_empty() {
            "-".to_string()
        } else {
            job.images.join("\n")
        },
        status: job.status.clone(),
        tags: tags.map(|t| t.join(" ")).unwrap_or_default(),
    }
}

/// Collects up to [`MAX_ROWS`] rows for the jobs matching `filter`.
///
/// Tags come from a per-job describe call; when it fails the row is still
/// emitted with blank tags.
pub async fn collect_rows<R: CommandRunner>(
    builds: &CloudBuild<'_, R>,
    filter: Option<&JobStatus>,
    now: DateTime<Utc>,
) -> Result<Vec<JobRow>> {
    let jobs = builds.list(MAX_ROWS, None).await?;
    let mut rows = Vec::new();

    for job in jobs
        .iter()
        .filter(|job| filter.map_or(true, |status| &job.status == status))
        .take(MAX_ROWS)
    {
        let tags = match builds.describe(&job.id).await {
            Ok(described) => Some(described.tags),
            Err(e) => {
                warn!("Could not fetch tags for job {}: {e}", job.id);
                None
            }
        };
        rows.push(build_row(job, tags, now));
    }

    Ok(rows)
}

pub async fn run<R: CommandRunner>(
    builds: &CloudBuild<'_, R>,
    filter: Option<JobStatus>,
    out: &mut dyn Write,
) -> Result<()> {
    info!(
        "Listing jobs in {} (status: {})",
        builds.project(),
        filter.as_ref().map_or("any", JobStatus::as_str)
    );

    let spinner = Spinner::start("Fetching recent jobs");
    let rows = collect_rows(builds, filter.as_ref(), Utc::now()).await;
    spinner.clear();
    let rows = rows?;

    section_header(out, "📋", &format!("Recent jobs in {}", builds.project()))?;
    if rows.is_empty() {
        writeln!(out, "  No matching jobs found.")?;
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "ID", "Started", "Duration", "Source", "Images", "Status", "Tags",
    ]));
    for row in &rows {
        table.add_row(vec![
            Cell::new(&row.id),
            Cell::new(&row.started),
            Cell::new(&row.duration),
            Cell::new(&row.source),
            Cell::new(&row.images),
            status_cell(&row.status),
            Cell::new(&row.tags),
        ]);
    }
    writeln!(out, "{table}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::runner::fake::FakeRunner;

    const STATUSES: [&str; 7] = [
        "SUCCESS", "WORKING", "FAILURE", "SUCCESS", "CANCELLED", "TIMEOUT", "SUCCESS",
    ];

    fn job_id(n: usize) -> String {
        format!("00000000-0000-4000-8000-{n:012}")
    }

    fn listing() -> String {
        let jobs: Vec<String> = STATUSES
            .iter()
            .enumerate()
            .map(|(n, status)| {
                format!(
                    r#"{{"id": "{}", "status": "{status}", "startTime": "2020-04-28T19:00:00Z"}}"#,
                    job_id(n)
                )
            })
            .collect();
        format!("[{}]", jobs.join(","))
    }

    fn runner() -> FakeRunner {
        FakeRunner::new()
            .on("builds list", &listing())
            .on(
                "builds describe",
                r#"{"id": "x", "status": "SUCCESS", "tags": ["jane", "master", "STAGE"]}"#,
            )
    }

    fn now() -> DateTime<Utc> {
        "2020-04-28T20:02:03Z".parse().unwrap()
    }

    #[test]
    fn blank_filter_matches_everything() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("failure")).unwrap(),
            Some(JobStatus::Failure)
        );
        assert!(parse_status_filter(Some("queued")).is_err());
    }

    #[test]
    fn durations_are_compact() {
        assert_eq!(format_duration(Duration::seconds(59)), "0m59s");
        assert_eq!(format_duration(Duration::seconds(3723)), "1h02m03s");
    }

    #[tokio::test]
    async fn no_filter_lists_at_most_max_rows() {
        let runner = runner();
        let builds = CloudBuild::new(&runner, "p");

        let rows = collect_rows(&builds, None, now()).await.unwrap();

        assert_eq!(rows.len(), MAX_ROWS);
        assert!(runner.called("--limit=5"));
        assert_eq!(rows[0].tags, "jane master STAGE");
        assert_eq!(rows[0].duration, "1h02m03s");
    }

    #[tokio::test]
    async fn every_filter_only_yields_matching_jobs() {
        for status in ["WORKING", "SUCCESS", "FAILURE", "CANCELLED"] {
            let runner = runner();
            let builds = CloudBuild::new(&runner, "p");
            let filter = parse_status_filter(Some(&status.to_lowercase())).unwrap();

            let rows = collect_rows(&builds, filter.as_ref(), now()).await.unwrap();

            assert!(rows.len() <= MAX_ROWS);
            assert!(!rows.is_empty(), "expected a {status} job");
            assert!(rows.iter().all(|row| row.status.as_str() == status));
        }
    }

    #[tokio::test]
    async fn describe_failure_leaves_tags_blank() {
        let runner = FakeRunner::new()
            .on("builds list", &listing())
            .on_failure("builds describe", "ERROR: NOT_FOUND");
        let builds = CloudBuild::new(&runner, "p");

        let rows = collect_rows(&builds, Some(&JobStatus::Working), now())
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, job_id(1));
        assert_eq!(rows[0].tags, "");
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let runner = FakeRunner::new().on_failure("builds list", "ERROR: PERMISSION_DENIED");
        let builds = CloudBuild::new(&runner, "p");

        assert!(collect_rows(&builds, None, now()).await.is_err());
    }

    #[tokio::test]
    async fn renders_a_table() {
        let runner = runner();
        let builds = CloudBuild::new(&runner, "p");
        let mut out = Vec::new();

        run(&builds, Some(JobStatus::Failure), &mut out).await.unwrap();

        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains(&job_id(2)));
        assert!(!rendered.contains(&job_id(0)));
    }
}
