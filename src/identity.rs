//! Persistent per-account identity storage.
//!
//! The identity file holds the percent-encoded identity bytes. It is
//! created on first use and read back on every later run. Reads and writes
//! are not locked; callers must not run two clients for the same account
//! against the same storage location at once.

use crate::types::{Identity, PhoneNumber};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Errors raised while loading or persisting an identity.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Existing identity file could not be read.
    #[error("Unable to read identity file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Identity file could not be written.
    #[error("Unable to write identity file to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File name of the identity for `account_key`.
pub fn identity_file_name(account_key: &PhoneNumber) -> String {
    format!("id.{account_key}.dat")
}

/// Locates, loads and creates identity files.
///
/// # Example
///
/// ```rust,no_run
/// use wa_registration::identity::IdentityStore;
/// use wa_registration::PhoneNumber;
///
/// let store = IdentityStore::new("wadata");
/// let number = PhoneNumber::new("34600111222")?;
///
/// // Created on the first call, read back afterwards.
/// let identity = store.get_or_create(&number)?;
/// assert_eq!(store.get_or_create(&number)?, identity);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct IdentityStore {
    data_dir: PathBuf,
    location: Option<PathBuf>,
}

impl IdentityStore {
    /// Store identities as `<data_dir>/id.<number>.dat`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            location: None,
        }
    }

    /// Use an explicit storage location instead of the data directory.
    ///
    /// If `location` is an existing directory the identity file is placed
    /// inside it; otherwise `location` is the identity file itself.
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Path of the identity file for `account_key`.
    pub fn path_for(&self, account_key: &PhoneNumber) -> PathBuf {
        match &self.location {
            None => self.data_dir.join(identity_file_name(account_key)),
            Some(location) if location.is_dir() => {
                // Re-collecting the components drops trailing separators.
                location
                    .components()
                    .collect::<PathBuf>()
                    .join(identity_file_name(account_key))
            }
            Some(location) => location.clone(),
        }
    }

    /// Whether an identity file already exists for `account_key`.
    pub fn exists(&self, account_key: &PhoneNumber) -> bool {
        self.path_for(account_key).is_file()
    }

    /// Return the stored identity for `account_key`, creating it if needed.
    ///
    /// A stored payload that does not decode to 16 or 20 bytes is replaced
    /// by a freshly generated identity.
    pub fn get_or_create(&self, account_key: &PhoneNumber) -> Result<Identity, IdentityError> {
        let path = self.path_for(account_key);

        if let Some(identity) = Self::load(&path)? {
            #[cfg(feature = "tracing")]
            debug!(path = %path.display(), len = identity.len(), "Loaded stored identity");
            return Ok(identity);
        }

        let identity = Identity::generate();
        Self::persist(&path, &identity)?;

        #[cfg(feature = "tracing")]
        info!(path = %path.display(), "Created new identity");

        Ok(identity)
    }

    fn load(path: &Path) -> Result<Option<Identity>, IdentityError> {
        if !path.is_file() {
            return Ok(None);
        }

        let raw = fs::read(path).map_err(|source| IdentityError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match Identity::from_url_encoded(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                warn!(
                    path = %path.display(),
                    error = %_e,
                    "Stored identity is invalid, regenerating"
                );
                Ok(None)
            }
        }
    }

    fn persist(path: &Path, identity: &Identity) -> Result<(), IdentityError> {
        fs::write(path, identity.to_url_encoded().as_bytes()).map_err(|source| {
            IdentityError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}
