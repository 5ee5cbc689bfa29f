//! Filesystem removal of installed packages
//!
//! Uninstalling works from what is on disk, not from the registry: every
//! version directory found under the package root has its executables'
//! links removed from the bin directory, then the whole package root is
//! deleted. Reconciling the registry is the caller's job.

use crate::config::InstallConfig;
use crate::{PackageName, Paths, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of removing a package from disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub package_name: String,
    /// Version directories found under the package root
    pub versions: Vec<String>,
    pub success: bool,
    /// Links deleted from the bin directory
    pub removed_bins: Vec<PathBuf>,
    /// Package roots deleted
    pub removed_packages: Vec<PathBuf>,
    pub error: Option<String>,
}

/// Remove every installed version of `name` and its bin links
pub fn uninstall(name: &PackageName, paths: &Paths, settings: &InstallConfig) -> UninstallOutcome {
    let package_dir = paths.package_dir(name.as_str());
    let mut outcome = UninstallOutcome {
        package_name: name.to_string(),
        ..UninstallOutcome::default()
    };

    if !package_dir.is_dir() {
        outcome.error = Some(format!("{} does not exist", name));
        return outcome;
    }

    match remove_package(&package_dir, paths, settings, &mut outcome) {
        Ok(()) => {
            tracing::info!(
                package = %name,
                versions = outcome.versions.len(),
                links = outcome.removed_bins.len(),
                "removed package from disk"
            );
            outcome.success = true;
        }
        Err(e) => {
            tracing::warn!(package = %name, error = %e, "uninstall failed part-way");
            outcome.error = Some(e.to_string());
        }
    }
    outcome
}

fn remove_package(
    package_dir: &Path,
    paths: &Paths,
    settings: &InstallConfig,
    outcome: &mut UninstallOutcome,
) -> Result<()> {
    let mut version_dirs = Vec::new();
    for entry in fs::read_dir(package_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            outcome
                .versions
                .push(entry.file_name().to_string_lossy().to_string());
            version_dirs.push(entry.path());
        }
    }

    for version_dir in &version_dirs {
        for entry in WalkDir::new(version_dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || !settings.is_executable_name(&file_name) {
                continue;
            }

            let link = paths.bin_dir.join(file_name.as_ref());
            if fs::symlink_metadata(&link).is_ok() {
                fs::remove_file(&link)?;
                tracing::debug!(link = %link.display(), "removed link");
                outcome.removed_bins.push(link);
            }
        }
    }

    fs::remove_dir_all(package_dir)?;
    outcome.removed_packages.push(package_dir.to_path_buf());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_install(paths: &Paths, name: &str, version: &str, exes: &[&str]) {
        let dir = paths.version_dir(name, version);
        fs::create_dir_all(&dir).unwrap();
        fs::create_dir_all(&paths.bin_dir).unwrap();
        fs::write(dir.join("metadata.json"), "{}").unwrap();
        for exe in exes {
            fs::write(dir.join(exe), version).unwrap();
            let link = paths.bin_dir.join(exe);
            let _ = fs::remove_file(&link);
            fs::hard_link(dir.join(exe), link).unwrap();
        }
    }

    #[test]
    fn test_uninstall_missing_package() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::from_root(temp_dir.path());

        let outcome = uninstall(&PackageName::new("tool"), &paths, &InstallConfig::default());
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("tool does not exist"));
        assert!(outcome.versions.is_empty());
        assert!(outcome.removed_bins.is_empty());
    }

    #[test]
    fn test_uninstall_removes_all_versions_and_links() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::from_root(temp_dir.path());
        fake_install(&paths, "tool", "v1", &["tool.exe", "old-helper.exe"]);
        fake_install(&paths, "tool", "v2", &["tool.exe"]);
        fake_install(&paths, "other", "v1", &["other.exe"]);

        let outcome = uninstall(&PackageName::new("tool"), &paths, &InstallConfig::default());
        assert!(outcome.success, "{:?}", outcome.error);

        let mut versions = outcome.versions.clone();
        versions.sort();
        assert_eq!(versions, vec!["v1", "v2"]);
        assert!(!paths.package_dir("tool").exists());
        assert!(!paths.bin_dir.join("tool.exe").exists());
        assert!(!paths.bin_dir.join("old-helper.exe").exists());
        assert_eq!(outcome.removed_packages, vec![paths.package_dir("tool")]);
        assert!(outcome.removed_bins.contains(&paths.bin_dir.join("old-helper.exe")));

        // Other packages are untouched
        assert!(paths.bin_dir.join("other.exe").exists());
        assert!(paths.package_dir("other").exists());
    }

    #[test]
    fn test_uninstall_tolerates_missing_links() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::from_root(temp_dir.path());
        fake_install(&paths, "tool", "v1", &["tool.exe"]);
        fs::remove_file(paths.bin_dir.join("tool.exe")).unwrap();

        let outcome = uninstall(&PackageName::new("tool"), &paths, &InstallConfig::default());
        assert!(outcome.success);
        assert!(outcome.removed_bins.is_empty());
        assert!(!paths.package_dir("tool").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_uninstall_failure_keeps_partial_progress() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::from_root(temp_dir.path());
        fake_install(&paths, "tool", "v1", &["tool.exe"]);

        let package_dir = paths.package_dir("tool");
        fs::set_permissions(&package_dir, fs::Permissions::from_mode(0o555)).unwrap();
        // Permission bits aren't enforced for root
        if fs::write(package_dir.join("write-check"), "x").is_ok() {
            fs::set_permissions(&package_dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let outcome = uninstall(&PackageName::new("tool"), &paths, &InstallConfig::default());
        fs::set_permissions(&package_dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
        assert_eq!(outcome.versions, vec!["v1"]);
        assert_eq!(outcome.removed_bins, vec![paths.bin_dir.join("tool.exe")]);
        assert!(outcome.removed_packages.is_empty());
        assert!(!paths.bin_dir.join("tool.exe").exists());
        assert!(package_dir.exists());
    }

    #[test]
    fn test_uninstall_ignores_non_executables() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::from_root(temp_dir.path());
        fake_install(&paths, "tool", "v1", &["tool.exe"]);
        // A bin entry that happens to share the metadata file's name
        fs::write(paths.bin_dir.join("metadata.json"), "keep me").unwrap();

        let outcome = uninstall(&PackageName::new("tool"), &paths, &InstallConfig::default());
        assert!(outcome.success);
        assert!(paths.bin_dir.join("metadata.json").exists());
    }
}
