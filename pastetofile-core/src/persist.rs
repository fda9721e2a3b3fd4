use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{CoreError, naming::candidates};

/// Writes `bytes` to the first free candidate name in `dir`.
pub fn write_unique(
    dir: &Path,
    base: &str,
    extension: &str,
    bytes: &[u8],
) -> Result<PathBuf, CoreError> {
    write_unique_with(dir, base, extension, |out| {
        out.write_all(bytes).map_err(CoreError::Io)
    })
}

/// Claims a fresh file with create-new semantics and lets `fill` stream the
/// content into it.
///
/// Name collisions move on to the next candidate; any other creation error
/// aborts. Existing files are never opened for writing. If `fill` or the
/// final flush fails, the claimed file is removed before the error is
/// returned, so a partial file never remains at a reported path.
pub fn write_unique_with<F>(
    dir: &Path,
    base: &str,
    extension: &str,
    fill: F,
) -> Result<PathBuf, CoreError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), CoreError>,
{
    for path in candidates(dir, base, extension) {
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "name taken, trying next candidate");
                continue;
            }
            Err(source) => return Err(CoreError::Create { path, source }),
        };

        return match fill_and_flush(file, fill) {
            Ok(()) => {
                debug!(path = %path.display(), "wrote file");
                Ok(path)
            }
            Err(err) => {
                warn!(path = %path.display(), "write failed, removing placeholder: {err}");
                if let Err(remove_err) = fs::remove_file(&path) {
                    warn!(path = %path.display(), "failed to remove placeholder: {remove_err}");
                }
                Err(match err {
                    CoreError::Io(source) => CoreError::Write { path, source },
                    other => other,
                })
            }
        };
    }

    Err(CoreError::NamesExhausted {
        base: base.to_owned(),
        extension: extension.to_owned(),
    })
}

fn fill_and_flush<F>(file: File, fill: F) -> Result<(), CoreError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), CoreError>,
{
    let mut out = BufWriter::new(file);
    fill(&mut out)?;
    let file = out.into_inner().map_err(|err| CoreError::Io(err.into_error()))?;
    file.sync_all()?;
    Ok(())
}
