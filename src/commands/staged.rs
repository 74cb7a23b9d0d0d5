use std::collections::BTreeMap;
use std::io::Write;

use comfy_table::Cell;
use log::info;

use crate::config::Settings;
use crate::error::Result;
use crate::output::{accent, create_table, cyan_header, muted, section_header, Spinner};
use crate::providers::releases::{ReleaseBranch, ReleaseRegistry};
use crate::providers::runner::CommandRunner;
use crate::providers::storage::{StagedBuild, Storage};

/// Buckets whose `stage/` prefix is reported.
///
/// The per-operator mock bucket is only included in mock mode.
pub fn stage_buckets(settings: &Settings, operator_tag: Option<&str>) -> Vec<String> {
    let mut buckets = vec![settings.bucket.clone()];
    if !settings.nomock {
        if let Some(tag) = operator_tag {
            buckets.push(settings.mock_bucket(tag));
        }
    }
    buckets
}

fn render_published(out: &mut dyn Write, latest: &BTreeMap<ReleaseBranch, String>) -> Result<()> {
    section_header(out, "🏷️", "Last published releases")?;
    if latest.is_empty() {
        writeln!(out, "  {}", muted("No published releases found."))?;
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Branch", "Version"]));
    for (branch, version) in latest {
        table.add_row(vec![Cell::new(branch), Cell::new(version)]);
    }
    writeln!(out, "{table}\n")?;
    Ok(())
}

fn render_staged(out: &mut dyn Write, bucket: &str, builds: &[StagedBuild]) -> Result<()> {
    section_header(out, "📦", &format!("Staged builds in gs://{bucket}/stage"))?;
    if builds.is_empty() {
        writeln!(out, "  {}\n", muted("Nothing staged."))?;
        return Ok(());
    }

    for build in builds {
        match build.version() {
            Some(version) => writeln!(out, "  {} {}", accent(version), muted(&build.path))?,
            None => writeln!(out, "  {}", build.path)?,
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Reports published releases and staged builds side by side.
///
/// The two result sets are printed independently; staged builds are not
/// filtered against what has already been published.
pub async fn run<R: CommandRunner>(
    storage: &Storage<'_, R>,
    registry: &ReleaseRegistry,
    buckets: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    info!("Reporting staged builds in {}", buckets.join(", "));

    let spinner = Spinner::start("Reading published release markers");
    let latest = registry.latest_per_branch().await;
    spinner.clear();
    render_published(out, &latest?)?;

    for bucket in buckets {
        let spinner = Spinner::start(&format!("Listing gs://{bucket}/stage"));
        let builds = storage.staged_builds(bucket).await;
        spinner.clear();
        render_staged(out, bucket, &builds?)?;
    }

    Ok(())
}
