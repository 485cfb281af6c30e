//! Content-addressed writer implementation
//!
//! This module provides the write/verify/publish state machine: bytes go to
//! a staging file and into a digest accumulator, and [`Writer::commit`]
//! publishes the staging file under its content-addressed name only when
//! the accumulated digest matches that name.

use camino::{Utf8Path, Utf8PathBuf};
use cask_core::error::CaskError;
use cask_core::oid::{Oid, OidHasher};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use tracing::debug;

use crate::StoreResult;

/// Suffix appended to the destination path to form the staging path
pub const DEFAULT_SUFFIX: &str = "-temp";

/// Atomic writer for a content-addressed file.
///
/// The destination's base name is the OID its contents must hash to. Bytes
/// are written to an exclusively-created staging file next to the
/// destination; [`Writer::commit`] verifies the accumulated digest against
/// the OID and atomically renames the staging file into place on a match.
///
/// Exclusive creation of the staging file is the only cross-writer mutual
/// exclusion: a second writer for the same destination fails at
/// construction with [`CaskError::Conflict`] rather than blocking.
#[derive(Debug)]
pub struct Writer {
    /// Expected content identifier, taken from the destination's base name
    oid: Oid,
    /// Final destination path
    path: Utf8PathBuf,
    /// Staging path the bytes are written to
    temp_path: Utf8PathBuf,
    /// Open staging handle; `None` once the writer reaches a terminal state
    temp_file: Option<File>,
    /// Digest accumulator fed by every write
    hasher: OidHasher,
    /// Whether the staging path no longer needs removal (renamed or deleted)
    discarded: bool,
}

impl Writer {
    /// Create a writer for `path` staging into `path` + [`DEFAULT_SUFFIX`]
    pub fn create<P: AsRef<Utf8Path>>(path: P) -> StoreResult<Self> {
        Self::with_suffix(path, DEFAULT_SUFFIX)
    }

    /// Create a writer for `path` staging into `path` + `suffix`.
    ///
    /// The expected OID is the base name of `path`. The destination's parent
    /// directory is created if absent. The staging file is opened with
    /// create-new semantics, so a concurrent writer targeting the same
    /// destination fails here with [`CaskError::Conflict`] instead of the
    /// two sharing a staging file.
    pub fn with_suffix<P: AsRef<Utf8Path>>(path: P, suffix: &str) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let oid = Oid::from_path(&path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CaskError::io("Failed to create destination directory".to_string(), e)
            })?;
        }

        let temp_path = Utf8PathBuf::from(format!("{}{}", path, suffix));
        let temp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => CaskError::Conflict {
                    path: temp_path.to_string(),
                },
                _ => CaskError::io("Failed to create staging file".to_string(), e),
            })?;

        debug!(oid = %oid, staging = %temp_path, "created staging file");

        Ok(Self {
            oid,
            path,
            temp_path,
            temp_file: Some(temp_file),
            hasher: OidHasher::new(),
            discarded: false,
        })
    }

    /// Write `buf` to the staging file, feeding the digest accumulator with
    /// exactly the bytes that reached the file.
    ///
    /// Returns the number of bytes written, which may be short; callers that
    /// need the whole buffer written can go through
    /// [`std::io::Write::write_all`].
    pub fn write(&mut self, buf: &[u8]) -> StoreResult<usize> {
        let file = self.temp_file.as_mut().ok_or(CaskError::AlreadyClosed)?;
        let n = file
            .write(buf)
            .map_err(|e| CaskError::io("Failed to write staging file".to_string(), e))?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    /// Verify the accumulated digest against the expected OID and publish
    /// the staging file on a match.
    ///
    /// Returns `Ok(true)` when the staging file was renamed into place, and
    /// `Ok(false)` when the destination already existed and the staging copy
    /// was discarded instead (the matching digest means a concurrent
    /// producer of the same contents got there first). Every outcome is
    /// terminal: the staging handle is released whether or not the commit
    /// succeeds.
    ///
    /// On a digest mismatch the destination is never created and the staging
    /// file is left on disk; the caller still owes a final
    /// [`Writer::discard`] to remove it.
    pub fn commit(&mut self) -> StoreResult<bool> {
        let file = self.temp_file.take().ok_or(CaskError::AlreadyClosed)?;

        let actual = self.hasher.finish();
        if actual != self.oid {
            drop(file);
            debug!(expected = %self.oid, actual = %actual, "content mismatch");
            return Err(CaskError::ContentMismatch {
                expected: self.oid.to_string(),
                actual: actual.to_string(),
            });
        }

        // A matching digest means an existing destination already holds
        // these exact contents; the staging copy is redundant.
        if fs::metadata(&self.path).is_ok() {
            drop(file);
            self.discard()?;
            debug!(oid = %self.oid, "destination already present, staging copy discarded");
            return Ok(false);
        }

        // Close before renaming; some platforms refuse to rename an open file.
        drop(file);
        fs::rename(&self.temp_path, &self.path)
            .map_err(|e| CaskError::io("Failed to publish staging file".to_string(), e))?;
        self.discarded = true;
        debug!(oid = %self.oid, path = %self.path, "destination created");
        Ok(true)
    }

    /// Close the staging handle (if open) and remove the staging file.
    ///
    /// Idempotent: discarding an already-discarded writer is a no-op. The
    /// destination is never touched.
    pub fn discard(&mut self) -> StoreResult<()> {
        if let Some(file) = self.temp_file.take() {
            drop(file);
        }
        if self.discarded {
            return Ok(());
        }
        remove_path_all(&self.temp_path)?;
        self.discarded = true;
        debug!(staging = %self.temp_path, "staging file discarded");
        Ok(())
    }

    /// True when the staging handle is no longer open
    pub fn is_closed(&self) -> bool {
        self.temp_file.is_none()
    }

    /// Expected content identifier for the destination
    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    /// Final destination path
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Staging path written to before [`Writer::commit`]
    pub fn temp_path(&self) -> &Utf8Path {
        &self.temp_path
    }
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Writer::write(self, buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.temp_file.as_mut() {
            Some(file) => file.flush(),
            None => Err(io::Error::other(CaskError::AlreadyClosed)),
        }
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        // Last-resort cleanup; explicit discard() is where errors surface.
        let _ = self.discard();
    }
}

/// Remove the staging path whatever it turned out to be, tolerating a path
/// that is already gone or that unexpectedly resolved to a directory.
fn remove_path_all(path: &Utf8Path) -> StoreResult<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)
            .map_err(|e| CaskError::io("Failed to remove staging directory".to_string(), e)),
        Ok(_) => fs::remove_file(path)
            .map_err(|e| CaskError::io("Failed to remove staging file".to_string(), e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CaskError::io("Failed to stat staging path".to_string(), e)),
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use cask_core::Oid;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;
    use tempfile::tempdir;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]
        #[test]
        fn chunked_commit_property(
            content in prop::collection::vec(any::<u8>(), 0..1000),
            chunk in 1usize..64,
        ) {
            let dir = tempdir().unwrap();
            let oid = Oid::of_bytes(&content);
            let path = Utf8PathBuf::from_path_buf(dir.path().join(oid.as_str())).unwrap();

            let mut writer = Writer::create(&path).unwrap();
            for piece in content.chunks(chunk) {
                let mut rest = piece;
                while !rest.is_empty() {
                    let n = writer.write(rest).unwrap();
                    rest = &rest[n..];
                }
            }

            prop_assert!(writer.commit().unwrap());
            prop_assert!(writer.is_closed());
            prop_assert_eq!(fs::read(&path).unwrap(), content);
        }
    }
}
