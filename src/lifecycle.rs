//! Install / upgrade / uninstall / list / info
//!
//! [`PackageManager`] ties the release resolver, the installer, the
//! uninstaller and the registry together and decides what happens at each
//! step. It never prints: every operation returns a report whose `Display`
//! impl is the text shown to the user.
//!
//! # Examples
//!
//! ```no_run
//! use relpm::{Config, GithubResolver, PackageManager, Paths, SystemPathRegistrar};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = Paths::resolve()?;
//! let config = Config::load(&paths)?;
//! let resolver = GithubResolver::new(&config.source, &paths)?;
//! let manager = PackageManager::new(config, paths, resolver, SystemPathRegistrar::new());
//!
//! println!("{}", manager.install("c-utils")?);
//! for line in manager.list()? {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::version_dir_name;
use crate::installer;
use crate::uninstaller::{self, UninstallOutcome};
use crate::validation::{is_supported, is_valid_name};
use crate::{
    Config, Error, InstalledPackage, PackageName, PathChange, PathRegistrar, Paths, RegistryStore,
    ReleaseResolver, Result,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// What an install or upgrade attempt ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// Not on the allow-list; nothing was touched
    NotSupported { owner: String },
    /// `upgrade` of a package that isn't registered
    NotInstalled,
    /// The release could not be resolved or downloaded
    ResolutionFailed { message: String },
    /// The registered version already matches the latest release
    UpToDate { version: String },
    Installed {
        previous: Option<String>,
        version: String,
        install_path: PathBuf,
        executables: Vec<String>,
    },
    InstallFailed {
        previous: Option<String>,
        version: String,
        message: String,
    },
}

/// Result of `install` / `upgrade`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub name: PackageName,
    pub status: InstallStatus,
    /// Set when this call performed the one-time PATH registration
    pub path_change: Option<PathChange>,
    pub bin_dir: PathBuf,
}

impl InstallReport {
    pub fn is_installed(&self) -> bool {
        matches!(self.status, InstallStatus::Installed { .. })
    }
}

fn write_transition(
    f: &mut fmt::Formatter<'_>,
    name: &PackageName,
    previous: &Option<String>,
    version: &str,
) -> fmt::Result {
    match previous {
        Some(old) => writeln!(f, "Upgrading {} from {} → {}", name, old, version),
        None => writeln!(f, "Installing {} {}", name, version),
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        match &self.status {
            InstallStatus::NotSupported { owner } => {
                write!(f, "{} not found in github.com/{}", name, owner)?
            }
            InstallStatus::NotInstalled => write!(f, "{} does not exist.", name)?,
            InstallStatus::ResolutionFailed { message } => {
                write!(f, "Download failed: {}", message)?
            }
            InstallStatus::UpToDate { .. } => write!(f, "{} is already up to date.", name)?,
            InstallStatus::Installed {
                previous,
                version,
                install_path,
                ..
            } => {
                write_transition(f, name, previous, version)?;
                write!(
                    f,
                    "Installed {} {} to {}",
                    name,
                    version,
                    install_path.display()
                )?;
            }
            InstallStatus::InstallFailed {
                previous,
                version,
                message,
            } => {
                write_transition(f, name, previous, version)?;
                write!(f, "Extraction failed: {}", message)?;
            }
        }

        match self.path_change {
            Some(PathChange::Added) => write!(
                f,
                "\nAdded {} to PATH (open a new terminal)",
                self.bin_dir.display()
            ),
            Some(PathChange::AlreadyPresent) => {
                write!(f, "\n{} already in PATH", self.bin_dir.display())
            }
            None => Ok(()),
        }
    }
}

/// Result of `uninstall`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallReport {
    pub name: PackageName,
    /// Whether the registry held a record for the package
    pub removed_from_registry: bool,
    /// What happened on disk
    pub outcome: UninstallOutcome,
}

impl fmt::Display for UninstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.removed_from_registry {
            write!(f, "Uninstalled {}", self.outcome.package_name)
        } else {
            write!(f, "{} is not installed", self.name)
        }
    }
}

/// Result of `info`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoReport {
    pub name: PackageName,
    pub record: Option<InstalledPackage>,
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(record) = &self.record else {
            return write!(f, "No package named '{}'", self.name);
        };
        let lines: Vec<String> = record
            .fields()
            .into_iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Deletes a downloaded archive when the install attempt is over, however it ended
struct DownloadedArchive<'a>(&'a Path);

impl Drop for DownloadedArchive<'_> {
    fn drop(&mut self) {
        match fs::remove_file(self.0) {
            Ok(()) => tracing::debug!(archive = %self.0.display(), "removed downloaded archive"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(archive = %self.0.display(), error = %e, "could not remove archive")
            }
        }
    }
}

/// Lifecycle orchestrator
pub struct PackageManager<R, P> {
    config: Config,
    paths: Paths,
    registry: RegistryStore,
    resolver: R,
    registrar: P,
}

impl<R: ReleaseResolver, P: PathRegistrar> PackageManager<R, P> {
    pub fn new(config: Config, paths: Paths, resolver: R, registrar: P) -> Self {
        let registry = RegistryStore::new(&paths);
        Self {
            config,
            paths,
            registry,
            resolver,
            registrar,
        }
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Install the latest release of a package, or upgrade it if an older one is registered.
    ///
    /// After the attempt the bin directory is added to PATH once per registry.
    pub fn install(&self, package: &str) -> Result<InstallReport> {
        let name = PackageName::new(package);
        if !is_supported(&name, &self.config.source) {
            tracing::debug!(package = %name, "package not on the allow-list");
            return Ok(self.report(name, self.not_supported(), None));
        }

        let status = self.install_latest(&name)?;
        let path_change = self.register_bin_dir()?;
        Ok(self.report(name, status, path_change))
    }

    /// Install the latest release of a package that is already registered
    pub fn upgrade(&self, package: &str) -> Result<InstallReport> {
        let name = PackageName::new(package);
        if !self.registry.exists(name.as_str())? {
            return Ok(self.report(name, InstallStatus::NotInstalled, None));
        }
        if !is_supported(&name, &self.config.source) {
            return Ok(self.report(name, self.not_supported(), None));
        }

        let status = self.install_latest(&name)?;
        Ok(self.report(name, status, None))
    }

    /// Remove every version of a package from disk, then drop its registry record
    pub fn uninstall(&self, package: &str) -> Result<UninstallReport> {
        let name = PackageName::new(package);
        let outcome = if is_valid_name(&name) {
            uninstaller::uninstall(&name, &self.paths, &self.config.install)
        } else {
            UninstallOutcome {
                package_name: name.to_string(),
                error: Some(format!("'{}' is not a valid package name", name)),
                ..UninstallOutcome::default()
            }
        };

        if !outcome.success {
            tracing::debug!(package = %name, error = ?outcome.error, "filesystem removal incomplete");
        }

        let removed_from_registry = self.registry.remove(&outcome.package_name)?;
        Ok(UninstallReport {
            name,
            removed_from_registry,
            outcome,
        })
    }

    /// `"<name> <version>"` per registered package, then a count line
    pub fn list(&self) -> Result<Vec<String>> {
        let mut lines = self.registry.list_all()?;
        let count = lines.len();
        lines.push(format!("{} packages installed.", count));
        Ok(lines)
    }

    pub fn info(&self, package: &str) -> Result<InfoReport> {
        let name = PackageName::new(package);
        let record = self.registry.get_metadata(name.as_str())?;
        Ok(InfoReport { name, record })
    }

    fn install_latest(&self, name: &PackageName) -> Result<InstallStatus> {
        let release = match self.resolver.resolve(name) {
            Ok(release) => release,
            Err(e) => {
                tracing::warn!(package = %name, error = %e, "release resolution failed");
                let message = match e {
                    Error::Resolution(message) => message,
                    other => other.to_string(),
                };
                return Ok(InstallStatus::ResolutionFailed { message });
            }
        };
        let _archive = DownloadedArchive(&release.archive);

        if version_dir_name(&release.version).is_none() {
            tracing::warn!(package = %name, tag = %release.version, "unusable release tag");
            return Ok(InstallStatus::ResolutionFailed {
                message: format!(
                    "Release tag '{}' cannot be used as a directory name",
                    release.version
                ),
            });
        }

        let installed = self.registry.get_version(name.as_str())?;
        if installed == release.version {
            return Ok(InstallStatus::UpToDate {
                version: release.version,
            });
        }
        let previous = (!installed.is_empty()).then_some(installed);

        let outcome = installer::install(&release, &self.paths, &self.config.install);
        let (install_path, metadata_path) = match (outcome.install_path, outcome.metadata_path) {
            (Some(install_path), Some(metadata_path)) if outcome.success => {
                (install_path, metadata_path)
            }
            _ => {
                return Ok(InstallStatus::InstallFailed {
                    previous,
                    version: release.version,
                    message: outcome
                        .error
                        .unwrap_or_else(|| "unknown installer error".to_string()),
                });
            }
        };

        self.registry.upsert(InstalledPackage {
            name: name.to_string(),
            version: release.version.clone(),
            install_path: install_path.clone(),
            archive_file_name: release.archive_file_name.clone(),
            metadata_path,
        })?;

        Ok(InstallStatus::Installed {
            previous,
            version: release.version,
            install_path,
            executables: outcome.executables,
        })
    }

    /// One-time PATH registration; registrar failures are logged, not returned
    fn register_bin_dir(&self) -> Result<Option<PathChange>> {
        if !self.config.path.auto_register || self.registry.bin_in_path()? {
            return Ok(None);
        }

        let change = match self.registrar.ensure_on_path(&self.paths.bin_dir) {
            Ok(change) => Some(change),
            Err(e) => {
                tracing::warn!(error = %e, bin_dir = %self.paths.bin_dir.display(), "could not add bin directory to PATH");
                None
            }
        };
        self.registry.set_bin_in_path(true)?;
        Ok(change)
    }

    fn not_supported(&self) -> InstallStatus {
        InstallStatus::NotSupported {
            owner: self.config.source.owner.to_lowercase(),
        }
    }

    fn report(
        &self,
        name: PackageName,
        status: InstallStatus,
        path_change: Option<PathChange>,
    ) -> InstallReport {
        InstallReport {
            name,
            status,
            path_change,
            bin_dir: self.paths.bin_dir.clone(),
        }
    }
}
