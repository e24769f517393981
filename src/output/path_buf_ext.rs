use std::fs::File;
use std::io::{Error, ErrorKind};
use std::path::PathBuf;

/// An extension trait that adds a create-or-open method to `PathBuf`.
pub trait PathBufExt {
    /// Open the path for writing. With `allow_overwrite`, an existing file
    /// is truncated; without it, an existing file is an error.
    fn open(&self, allow_overwrite: bool) -> std::io::Result<File>;
}

impl PathBufExt for PathBuf {
    fn open(&self, allow_overwrite: bool) -> std::io::Result<File> {
        if !allow_overwrite && self.exists() {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("refusing to overwrite: {}", self.to_string_lossy()),
            ));
        }
        File::create(self)
    }
}
