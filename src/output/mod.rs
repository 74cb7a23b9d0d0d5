mod progress;
mod prompt;
mod styling;
mod tables;

pub use progress::Spinner;
pub use prompt::{Prompt, TerminalPrompt};
pub use styling::{accent, banner, emphasis, failure, highlight, mode_label, muted, success};
pub use tables::{create_table, cyan_header, status_cell};

/// Prints the gcbmgr banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        banner("☁️  gcbmgr"),
        muted(env!("CARGO_PKG_VERSION")),
        muted("Release jobs on Google Cloud Build")
    );
}

/// Writes an underlined section header.
pub fn section_header(
    out: &mut dyn std::io::Write,
    emoji: &str,
    title: &str,
) -> std::io::Result<()> {
    writeln!(out, "{} {}", emphasis(emoji), emphasis(title).underlined())
}
