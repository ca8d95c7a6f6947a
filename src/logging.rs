use chrono::Utc;
use slog::Drain;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

/// Root logger writing to the terminal, tagged with the node it belongs to.
pub fn create_root_logger_for_stdout(node: impl Into<String>) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Node" => node.into()))
}

/// Root logger writing to `<directory>/info_log_<node>/<timestamp>_info.log`.
pub fn create_root_logger_for_file(directory: &Path, node: impl Into<String>) -> io::Result<slog::Logger> {
    let node = node.into();
    let log_dir = directory.join(format!("info_log_{}", node.replace(':', "_")));
    fs::create_dir_all(&log_dir)?;

    let now = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_dir.join(format!("{}_info.log", now)))?;

    let decorator = slog_term::PlainDecorator::new(file);
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Ok(slog::Logger::root(drain, slog::o!("Node" => node)))
}
