//! Memoization of key generation on disk.
//!
//! Key sets are stored under a name derived from `(num_bits, min_key)`,
//! there is no other invalidation.

use crate::{KeySet, Result};

use num_bigint::BigUint;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk representation of cached key sets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CacheFormat {
    /// The text key file format.
    #[default]
    Text,
    /// A `bincode` snapshot.
    Binary,
}

/// A directory of previously generated key sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyCache {
    directory: PathBuf,
    format: CacheFormat,
}

impl KeyCache {
    #[must_use]
    /// Creates a cache storing text key files in `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            format: CacheFormat::Text,
        }
    }

    #[must_use]
    pub const fn with_format(mut self, format: CacheFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub const fn format(&self) -> CacheFormat {
        self.format
    }

    #[must_use]
    /// Name of the file holding the key set for `(num_bits, min_key)`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use num_bigint::BigUint;
    /// use supercomp::cache::KeyCache;
    ///
    /// let name = KeyCache::file_name(4, &BigUint::from(11u32));
    /// assert_eq!(name, "keys_4_11.txt");
    /// ```
    pub fn file_name(num_bits: usize, min_key: &BigUint) -> String {
        format!("keys_{num_bits}_{min_key}.txt")
    }

    #[must_use]
    pub fn path_for(&self, num_bits: usize, min_key: &BigUint) -> PathBuf {
        let mut path = self.directory.join(Self::file_name(num_bits, min_key));
        if self.format == CacheFormat::Binary {
            path.set_extension("bin");
        }
        path
    }

    /// Returns the cached key set for `(num_bits, min_key)`, generating and storing it on a miss.
    ///
    /// On a hit the progress callback only receives `100`.
    /// An unreadable cache entry is regenerated and overwritten.
    ///
    /// ## Errors
    ///
    /// Returns an error only if the cache directory cannot be created.
    /// Failing to store a freshly generated key set is logged and otherwise ignored.
    pub fn calculate_cached(
        &self,
        num_bits: usize,
        min_key: &BigUint,
        mut progress: impl FnMut(u8),
    ) -> Result<KeySet> {
        let path = self.path_for(num_bits, min_key);
        if path.exists() {
            match self.load(&path) {
                Ok(key_set) if key_set.num_bits() == num_bits => {
                    debug!(path = %path.display(), "key set cache hit");
                    progress(100);
                    return Ok(key_set);
                }
                Ok(_) => warn!(path = %path.display(), "cached key set has the wrong bit count"),
                Err(err) => warn!(path = %path.display(), %err, "ignoring unreadable cached key set"),
            }
        }

        std::fs::create_dir_all(&self.directory)?;
        let key_set = KeySet::calculate(num_bits, min_key, progress);
        if let Err(err) = self.store(&key_set, &path) {
            warn!(path = %path.display(), %err, "could not store key set");
        }
        Ok(key_set)
    }

    fn load(&self, path: &Path) -> Result<KeySet> {
        match self.format {
            CacheFormat::Text => KeySet::read(path),
            CacheFormat::Binary => KeySet::from_bytes(&std::fs::read(path)?),
        }
    }

    fn store(&self, key_set: &KeySet, path: &Path) -> Result<()> {
        match self.format {
            CacheFormat::Text => key_set.write(path),
            CacheFormat::Binary => Ok(std::fs::write(path, key_set.to_bytes()?)?),
        }
    }
}
