//! File-backed document loading with a fallback document.

use std::fs;
use std::io;
use std::path::Path;

/// Read a document from `path`; if the file does not exist, create it with
/// `fallback` and use the fallback content for this run. Other I/O errors
/// propagate.
pub fn load_or_create(path: impl AsRef<Path>, fallback: &str) -> io::Result<String> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::write(path, fallback)?;
            Ok(fallback.to_string())
        }
        Err(e) => Err(e),
    }
}
