use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Archived log files kept per service.
const MAX_ARCHIVED_LOGS: usize = 10;
const ARCHIVE_DIR: &str = "archive";

/// Initialize logging for a phonebot binary: a daily rolling file under
/// `log_dir` plus a console layer on stderr.
///
/// Console output goes to stderr so log lines never interleave with the chat
/// transcript printed on stdout. When `log_dir` cannot be prepared only the
/// console layer is installed.
pub fn init_service_logging(log_dir: &str, service_name: &str) -> Result<(), anyhow::Error> {
    // RUST_LOG wins; otherwise info
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let prepared = prepare_log_dir(log_dir, service_name);

    let file_layer = prepared.as_ref().ok().map(|_| {
        let appender = rolling::daily(log_dir, format!("{service_name}.log"));
        let (writer, guard) = non_blocking(appender);
        // Dropping the guard would stop the writer thread
        std::mem::forget(guard);
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_line_number(true)
    });

    let (stderr_writer, stderr_guard) = non_blocking(std::io::stderr());
    let console_layer = fmt::layer().with_writer(stderr_writer).with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;
    std::mem::forget(stderr_guard);

    match prepared {
        Ok(archived) => info!(
            archived,
            "Logging to {log_dir}/{service_name}.log (previous runs in {log_dir}/{ARCHIVE_DIR})"
        ),
        Err(e) => warn!("Console logging only; log directory {log_dir} is unusable: {e:#}"),
    }

    Ok(())
}

fn prepare_log_dir(log_dir: &str, service_name: &str) -> anyhow::Result<usize> {
    fs::create_dir_all(log_dir).with_context(|| format!("cannot create {log_dir}"))?;
    archive_previous_logs(log_dir, service_name)
}

/// Move the previous run's log files for `service_name` (the base file and
/// any dated files the daily appender produced) into `{log_dir}/archive`,
/// prefixed with the start-up time, then prune the archive to the newest
/// `MAX_ARCHIVED_LOGS` entries. Returns how many files were moved.
pub fn archive_previous_logs(log_dir: &str, service_name: &str) -> anyhow::Result<usize> {
    let log_dir = Path::new(log_dir);
    let archive_dir = log_dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive_dir)
        .with_context(|| format!("cannot create {}", archive_dir.display()))?;

    let current_prefix = format!("{service_name}.log");
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");

    let mut moved = 0;
    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with(&current_prefix) {
            continue;
        }
        let target = archive_dir.join(format!("{service_name}-{stamp}-{name}"));
        fs::rename(entry.path(), &target)
            .with_context(|| format!("cannot archive {name}"))?;
        moved += 1;
    }

    prune_archive(&archive_dir, service_name)?;
    Ok(moved)
}

fn prune_archive(archive_dir: &Path, service_name: &str) -> anyhow::Result<()> {
    let prefix = format!("{service_name}-");
    let mut archived: Vec<String> = fs::read_dir(archive_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(&prefix))
        .collect();

    if archived.len() <= MAX_ARCHIVED_LOGS {
        return Ok(());
    }

    // Timestamps sort lexically, oldest first
    archived.sort();
    let excess = archived.len() - MAX_ARCHIVED_LOGS;
    for name in archived.into_iter().take(excess) {
        fs::remove_file(archive_dir.join(&name))
            .with_context(|| format!("cannot prune archived log {name}"))?;
    }
    Ok(())
}
