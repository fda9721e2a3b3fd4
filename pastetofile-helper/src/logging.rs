use std::{
    ffi::OsString,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use tracing_subscriber::{EnvFilter, fmt::MakeWriter};

pub const LOG_FILTER_ENV: &str = "PTF_LOG";
pub const LOG_DIR_ENV: &str = "PTF_LOG_DIR";
pub const LOG_FILE_NAME: &str = "ptf-helper.log";

#[derive(Clone)]
struct FileMakeWriter {
    file: Arc<Mutex<File>>,
}

struct FileWriterGuard {
    file: Arc<Mutex<File>>,
}

impl Write for FileWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut locked = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        locked.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut locked = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        locked.flush()
    }
}

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        FileWriterGuard {
            file: Arc::clone(&self.file),
        }
    }
}

/// Installs the global subscriber. Logs go to the helper's log file; stdout
/// stays reserved for results, so the fallback when the file cannot be
/// opened is stderr.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_path = log_file_path();
    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to open log file {}: {err}", log_path.display());
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
            return;
        }
    };

    let make_writer = FileMakeWriter {
        file: Arc::new(Mutex::new(file)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(make_writer)
        .init();
}

pub fn log_file_path() -> PathBuf {
    let dir = log_dir_from(
        std::env::var_os(LOG_DIR_ENV),
        std::env::var_os("LOCALAPPDATA"),
    );
    let _ = std::fs::create_dir_all(&dir);
    dir.join(LOG_FILE_NAME)
}

/// `PTF_LOG_DIR` wins; otherwise `PasteToFile\logs` under `%LOCALAPPDATA%`,
/// or under the working directory when that is unset.
pub fn log_dir_from(override_dir: Option<OsString>, local_app_data: Option<OsString>) -> PathBuf {
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    local_app_data
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("PasteToFile")
        .join("logs")
}
