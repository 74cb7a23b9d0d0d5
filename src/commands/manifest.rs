use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Cell;
use log::info;

use crate::manifest::{Config, File};
use crate::output::{accent, create_table, cyan_header, muted, section_header, Spinner};

/// Loads a release manifest, picking the format from the file extension.
/// The returned `File` checksums the manifest as read from disk.
pub fn load(path: &Path) -> Result<(Config, File)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let file = File::from_contents(name, &bytes);
    let contents = String::from_utf8(bytes)
        .with_context(|| format!("Manifest is not valid UTF-8: {}", path.display()))?;

    parse(path, &contents).map(|config| (config, file))
}

fn parse(path: &Path, contents: &str) -> Result<Config> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension {
        "yaml" | "yml" => serde_yaml::from_str(contents)
            .with_context(|| format!("Failed to parse YAML manifest: {}", path.display())),
        "json" => serde_json::from_str(contents)
            .with_context(|| format!("Failed to parse JSON manifest: {}", path.display())),
        "toml" => toml::from_str(contents)
            .with_context(|| format!("Failed to parse TOML manifest: {}", path.display())),
        _ => serde_yaml::from_str(contents)
            .or_else(|_| serde_json::from_str(contents))
            .or_else(|_| toml::from_str(contents))
            .with_context(|| format!("Failed to parse manifest: {}", path.display())),
    }
}

fn join_or_dash<I: IntoIterator<Item = String>>(items: I) -> String {
    let joined = items.into_iter().collect::<Vec<_>>().join("\n");
    if joined.is_empty() {
        "-".to_string()
    } else {
        joined
    }
}

pub fn render(manifest: &Config, file: &File, out: &mut dyn Write) -> Result<()> {
    let meta = &manifest.type_meta;
    section_header(out, "📄", "Release manifest")?;
    writeln!(out, "  {} {}", muted("file:"), accent(&file.name))?;
    writeln!(out, "  {} {}", muted("sha256:"), file.sha256)?;
    writeln!(out, "  {} {}", muted("apiVersion:"), accent(&meta.api_version))?;
    writeln!(out, "  {} {}\n", muted("kind:"), accent(&meta.kind))?;

    if manifest.binaries.is_empty() && manifest.images.is_empty() {
        writeln!(out, "  {}", muted("The manifest lists no artifacts."))?;
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(cyan_header(&["Artifact", "Name", "Platforms"]));
    for binary in &manifest.binaries {
        let platforms = join_or_dash(
            binary
                .platforms
                .iter()
                .map(|p| format!("{} {}", p.os(), muted(p.arch()))),
        );
        table.add_row(vec![
            Cell::new("binary"),
            Cell::new(&binary.name),
            Cell::new(platforms),
        ]);
    }
    for image in &manifest.images {
        table.add_row(vec![
            Cell::new("image"),
            Cell::new(&image.name),
            Cell::new(join_or_dash(image.platform_type.iter().cloned())),
        ]);
    }
    writeln!(out, "{table}")?;
    Ok(())
}

pub fn run(path: &Path, out: &mut dyn Write) -> Result<()> {
    let spinner = Spinner::start(&format!("Reading {}", path.display()));
    let manifest = load(path);
    match &manifest {
        Ok(_) => spinner.finish("Manifest loaded"),
        Err(_) => spinner.clear(),
    }
    let (manifest, file) = manifest?;

    info!(
        "Loaded manifest {} (sha256 {}) with {} binaries and {} images",
        path.display(),
        file.sha256,
        manifest.binaries.len(),
        manifest.images.len()
    );
    render(&manifest, &file, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_manifest(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn loads_toml_manifest() {
        let file = write_manifest(
            ".toml",
            r#"
apiVersion = "v1"
kind = "Manifest"

[[binaries]]
name = "kubectl"
platforms = ["linux/amd64"]
"#,
        );

        let (manifest, _) = load(file.path()).unwrap();
        assert_eq!(manifest.type_meta.kind, "Manifest");
        assert_eq!(manifest.binaries[0].platforms[0].arch(), "amd64");
    }

    #[test]
    fn loads_json_without_extension() {
        let file = write_manifest(
            "",
            r#"{"apiVersion": "v1", "kind": "Manifest", "images": [{"name": "pause", "platformType": ["linux/s390x"]}]}"#,
        );

        let (manifest, _) = load(file.path()).unwrap();
        assert_eq!(manifest.images[0].platform_type, ["linux/s390x"]);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let file = write_manifest(".json", "{ not json");

        let err = load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains(&file.path().display().to_string()));
    }

    #[test]
    fn renders_binaries_and_images() {
        let file = write_manifest(
            ".yaml",
            r#"
apiVersion: v1
kind: Manifest
binaries:
  - name: kubeadm
    platforms: [linux/arm64]
images:
  - name: kube-proxy
"#,
        );
        let mut out = Vec::new();

        run(file.path(), &mut out).unwrap();

        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("kubeadm"));
        assert!(rendered.contains("arm64"));
        assert!(rendered.contains("kube-proxy"));
    }

    #[test]
    fn empty_manifest_says_so() {
        let mut out = Vec::new();
        let file = File::from_contents("empty.yaml", b"");
        render(&Config::default(), &file, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("no artifacts"));
    }

    #[test]
    fn reports_the_manifest_checksum() {
        let file = write_manifest(".yaml", "abc: 1\n");
        let mut out = Vec::new();

        run(file.path(), &mut out).unwrap();

        let rendered = String::from_utf8(out).unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy();
        assert!(rendered.contains(name.as_ref()));
        assert!(rendered.contains(&File::from_contents("", b"abc: 1\n").sha256));
    }
}
