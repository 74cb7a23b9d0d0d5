use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use env_logger::{Builder, Env, Target, WriteStyle};
use log::Level;

const LOG_FILE: &str = "gcbmgr.log";
const MAX_GENERATIONS: usize = 5;

/// Copies log lines to the console.
///
/// Warnings and errors always reach it; everything else only with `--verbose`.
struct Mirror<W: Write> {
    out: Mutex<W>,
    verbose: bool,
}

impl<W: Write> Mirror<W> {
    fn new(out: W, verbose: bool) -> Self {
        Self {
            out: Mutex::new(out),
            verbose,
        }
    }

    fn shows(&self, level: Level) -> bool {
        self.verbose || level <= Level::Warn
    }

    fn record(&self, level: Level, line: &str) -> io::Result<()> {
        if !self.shows(level) {
            return Ok(());
        }
        let mut out = self
            .out
            .lock()
            .map_err(|_| io::Error::other("log mirror poisoned"))?;
        writeln!(out, "{line}")
    }
}

pub fn log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("gcbmgr"))
}

/// Shifts `gcbmgr.log` to `gcbmgr.log.1`, `.1` to `.2` and so on, dropping
/// the oldest generation.
fn rotate(dir: &Path) -> io::Result<()> {
    let current = dir.join(LOG_FILE);
    let generation = |n: usize| dir.join(format!("{LOG_FILE}.{n}"));

    let oldest = generation(MAX_GENERATIONS);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..MAX_GENERATIONS).rev() {
        let from = generation(n);
        if from.exists() {
            fs::rename(&from, generation(n + 1))?;
        }
    }
    if current.exists() {
        fs::rename(&current, generation(1))?;
    }
    Ok(())
}

fn open_log_file(dir: &Path) -> io::Result<File> {
    fs::create_dir_all(dir)?;
    rotate(dir)?;
    File::create(dir.join(LOG_FILE))
}

/// Sets up the global logger.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Records go to
/// the log file; warnings and errors are also printed to stderr.
pub fn init(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    let opened = log_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no cache directory"))
        .and_then(|dir| open_log_file(&dir));

    match opened {
        Ok(file) => {
            let mirror = Mirror::new(io::stderr(), verbose);
            builder
                .format(move |buf, record| {
                    let line = format!(
                        "[{} {:<5} {}] {}",
                        buf.timestamp(),
                        record.level(),
                        record.target(),
                        record.args()
                    );
                    mirror.record(record.level(), &line)?;
                    writeln!(buf, "{line}")
                })
                .target(Target::Pipe(Box::new(file)))
                .write_style(WriteStyle::Never);
            builder.init();
        }
        Err(e) => {
            builder.target(Target::Stderr);
            builder.init();
            log::warn!("Logging to stderr only, could not open log file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_reach_the_console_without_verbose() {
        let mirror = Mirror::new(Vec::new(), false);

        mirror.record(Level::Info, "Submitting stage job").unwrap();
        mirror.record(Level::Warn, "Working tree has 1 uncommitted change(s)").unwrap();
        mirror.record(Level::Error, "submission failed").unwrap();

        let shown = String::from_utf8(mirror.out.into_inner().unwrap()).unwrap();
        assert_eq!(
            shown,
            "Working tree has 1 uncommitted change(s)\nsubmission failed\n"
        );
    }

    #[test]
    fn verbose_shows_every_record() {
        let mirror = Mirror::new(Vec::new(), true);

        mirror.record(Level::Debug, "Running: gcloud builds list").unwrap();

        let shown = String::from_utf8(mirror.out.into_inner().unwrap()).unwrap();
        assert_eq!(shown, "Running: gcloud builds list\n");
    }

    #[test]
    fn first_run_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("gcbmgr");

        open_log_file(&log_dir).unwrap();

        assert!(log_dir.join(LOG_FILE).exists());
        assert!(!log_dir.join("gcbmgr.log.1").exists());
    }

    #[test]
    fn previous_runs_are_rotated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LOG_FILE), "run 2").unwrap();
        fs::write(dir.path().join("gcbmgr.log.1"), "run 1").unwrap();

        let mut file = open_log_file(dir.path()).unwrap();
        writeln!(file, "run 3").unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("gcbmgr.log.1")).unwrap(), "run 2");
        assert_eq!(fs::read_to_string(dir.path().join("gcbmgr.log.2")).unwrap(), "run 1");
        assert_eq!(fs::read_to_string(dir.path().join(LOG_FILE)).unwrap(), "run 3\n");
    }

    #[test]
    fn oldest_generation_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        for n in 1..=MAX_GENERATIONS {
            fs::write(dir.path().join(format!("{LOG_FILE}.{n}")), format!("gen {n}")).unwrap();
        }

        rotate(dir.path()).unwrap();

        assert!(!dir.path().join("gcbmgr.log.1").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join(format!("{LOG_FILE}.{MAX_GENERATIONS}"))).unwrap(),
            format!("gen {}", MAX_GENERATIONS - 1)
        );
    }
}
