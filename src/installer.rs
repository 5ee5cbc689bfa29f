//! Archive installation and binary linking
//!
//! This module extracts the executables of a downloaded release archive into
//! `<packages>/<name>/<version>/` and links each one into the shared bin
//! directory. An existing link with the same name is always removed before the
//! new one is created, so after an upgrade the bin directory resolves to the
//! newest version and never holds two links for one executable.
//!
//! Failures are reported through [`InstallOutcome`] rather than `Err`; files
//! written before the failure are left in place and a retry overwrites them.
//!
//! # Examples
//!
//! ```no_run
//! use relpm::{install, Config, Paths, ReleaseResolver, GithubResolver, PackageName};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = Paths::resolve()?;
//! let config = Config::load(&paths)?;
//! let release = GithubResolver::new(&config.source, &paths)?.resolve(&PackageName::new("c-utils"))?;
//!
//! let outcome = install(&release, &paths, &config.install);
//! if outcome.success {
//!     println!("Installed to {:?}", outcome.install_path);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::{version_dir_name, InstallConfig, LinkMode};
use crate::{Error, Paths, Release, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Name of the per-package metadata document inside a versioned directory
pub const PACKAGE_METADATA_FILE: &str = "metadata.json";

/// Result of installing one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub package_name: String,
    pub version: String,
    pub success: bool,
    /// Versioned package directory (set on success)
    pub install_path: Option<PathBuf>,
    /// Per-package metadata document (set on success)
    pub metadata_path: Option<PathBuf>,
    /// Executable names linked into the bin directory
    pub executables: Vec<String>,
    pub error: Option<String>,
}

struct Installed {
    install_path: PathBuf,
    metadata_path: PathBuf,
}

/// Install a release into its versioned directory and relink its executables
pub fn install(release: &Release, paths: &Paths, settings: &InstallConfig) -> InstallOutcome {
    let mut executables = Vec::new();
    let result = install_release(release, paths, settings, &mut executables);

    let mut outcome = InstallOutcome {
        package_name: release.package_name.to_string(),
        version: release.version.clone(),
        success: false,
        install_path: None,
        metadata_path: None,
        executables,
        error: None,
    };

    match result {
        Ok(installed) => {
            tracing::info!(
                package = %release.package_name,
                version = %release.version,
                linked = outcome.executables.len(),
                "installed release"
            );
            outcome.success = true;
            outcome.install_path = Some(installed.install_path);
            outcome.metadata_path = Some(installed.metadata_path);
        }
        Err(e) => {
            tracing::warn!(package = %release.package_name, error = %e, "install failed");
            outcome.error = Some(e.to_string());
        }
    }
    outcome
}

fn install_release(
    release: &Release,
    paths: &Paths,
    settings: &InstallConfig,
    executables: &mut Vec<String>,
) -> Result<Installed> {
    if version_dir_name(&release.version).is_none() {
        return Err(Error::Other(format!(
            "Release tag '{}' cannot be used as a directory name",
            release.version
        )));
    }
    let package_dir = paths.version_dir(release.package_name.as_str(), &release.version);
    fs::create_dir_all(&package_dir)?;
    fs::create_dir_all(&paths.bin_dir)?;

    let file = File::open(&release.archive)?;
    let mut archive = ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let Some(file_name) = base_name(entry.name()) else {
            continue;
        };
        if !settings.is_executable_name(&file_name) || executables.contains(&file_name) {
            continue;
        }

        let target_path = package_dir.join(&file_name);
        // Never truncate in place: the old file may share its inode with a live link
        remove_if_present(&target_path)?;
        let mut target = File::create(&target_path)?;
        io::copy(&mut entry, &mut target)?;
        drop(target);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = entry.unix_mode().unwrap_or(0o755) | 0o100;
            fs::set_permissions(&target_path, fs::Permissions::from_mode(mode & 0o7777))?;
        }

        let link_path = paths.bin_dir.join(&file_name);
        relink(&target_path, &link_path, settings.link_mode)?;
        tracing::debug!(executable = %file_name, link = %link_path.display(), "linked executable");
        executables.push(file_name);
    }

    let metadata_path = package_dir.join(PACKAGE_METADATA_FILE);
    fs::write(&metadata_path, serde_json::to_string_pretty(&release.metadata)?)?;

    Ok(Installed {
        install_path: package_dir,
        metadata_path,
    })
}

/// Final path component of an archive entry name, flattening any directories
fn base_name(entry_name: &str) -> Option<String> {
    let name = entry_name.rsplit(['/', '\\']).next()?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// Remove a file or link, including dangling symlinks
fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Point `link` at `target`, replacing whatever `link` was before
pub(crate) fn relink(target: &Path, link: &Path, mode: LinkMode) -> io::Result<()> {
    remove_if_present(link)?;
    match mode {
        LinkMode::Hard => fs::hard_link(target, link),
        LinkMode::Symlink => symlink_file(target, link),
    }
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
