//! Local registry of installed packages
//!
//! The registry is a single JSON document (`<root>/metadata.json`) holding one
//! record per installed package plus the one-time PATH registration flag.
//! Every operation reloads the document from disk, modifies it and writes the
//! whole document back; nothing is cached between calls.
//!
//! # Examples
//!
//! ```no_run
//! use relpm::{InstalledPackage, Paths, RegistryStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RegistryStore::new(&Paths::resolve()?);
//!
//! registry.upsert(InstalledPackage {
//!     name: "c-utils".to_string(),
//!     version: "v1.0.0".to_string(),
//!     install_path: "/data/relpm/packages/c-utils/v1.0.0".into(),
//!     archive_file_name: "c-utils.zip".to_string(),
//!     metadata_path: "/data/relpm/packages/c-utils/v1.0.0/metadata.json".into(),
//! })?;
//!
//! for line in registry.list_all()? {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

use crate::{Paths, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persisted record of the active version of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub install_path: PathBuf,
    pub archive_file_name: String,
    pub metadata_path: PathBuf,
}

impl InstalledPackage {
    /// Record fields as `(key, value)` pairs, in document order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("version", self.version.clone()),
            ("install_path", self.install_path.display().to_string()),
            ("archive_file_name", self.archive_file_name.clone()),
            ("metadata_path", self.metadata_path.display().to_string()),
        ]
    }
}

/// The whole registry document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub installed_packages: Vec<InstalledPackage>,

    /// Set once the bin directory has been added to the user's PATH
    #[serde(default)]
    pub bin_in_path: bool,
}

/// Read-modify-write access to the registry document
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(paths: &Paths) -> Self {
        Self::at(&paths.registry_file)
    }

    /// Registry backed by an explicit document path
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document, creating an empty one if it doesn't exist yet
    pub fn read(&self) -> Result<RegistryDocument> {
        if !self.path.exists() {
            let document = RegistryDocument::default();
            self.write(&document)?;
            tracing::debug!(path = %self.path.display(), "created registry document");
            return Ok(document);
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the whole document.
    ///
    /// The new content goes to a temporary file next to the document which is
    /// then renamed over it, so readers see either the old or the new document.
    pub fn write(&self, document: &RegistryDocument) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let json = serde_json::to_string_pretty(document)?;
        let mut temp = NamedTempFile::new_in(&parent)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Insert or replace the record for `record.name`
    pub fn upsert(&self, record: InstalledPackage) -> Result<()> {
        let mut document = self.read()?;
        document
            .installed_packages
            .retain(|pkg| pkg.name != record.name);
        tracing::info!(name = %record.name, version = %record.version, "recording installed package");
        document.installed_packages.push(record);
        self.write(&document)
    }

    /// Remove every record for `name`; returns whether anything was removed
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut document = self.read()?;
        let before = document.installed_packages.len();
        document.installed_packages.retain(|pkg| pkg.name != name);

        let removed = document.installed_packages.len() != before;
        if removed {
            self.write(&document)?;
            tracing::info!(name, "removed package from registry");
        }
        Ok(removed)
    }

    /// Installed version of `name`, or an empty string if it isn't installed
    pub fn get_version(&self, name: &str) -> Result<String> {
        Ok(self
            .get_metadata(name)?
            .map(|pkg| pkg.version)
            .unwrap_or_default())
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_metadata(name)?.is_some())
    }

    pub fn get_metadata(&self, name: &str) -> Result<Option<InstalledPackage>> {
        let document = self.read()?;
        Ok(document
            .installed_packages
            .into_iter()
            .find(|pkg| pkg.name == name))
    }

    /// `"<name> <version>"` for every record, in document order
    pub fn list_all(&self) -> Result<Vec<String>> {
        let document = self.read()?;
        Ok(document
            .installed_packages
            .iter()
            .map(|pkg| format!("{} {}", pkg.name, pkg.version))
            .collect())
    }

    pub fn bin_in_path(&self) -> Result<bool> {
        Ok(self.read()?.bin_in_path)
    }

    pub fn set_bin_in_path(&self, value: bool) -> Result<()> {
        let mut document = self.read()?;
        document.bin_in_path = value;
        self.write(&document)
    }
}
