//! User configuration and filesystem roots
//!
//! Configuration is stored in TOML format at `<data root>/config.toml`. The
//! data root is `RELPM_HOME` when set, otherwise `relpm/` under the platform's
//! local data directory (`%LOCALAPPDATA%` on Windows, `~/.local/share` on Linux).
//!
//! Every component receives a [`Paths`] value instead of computing locations
//! itself, so tests can point a whole installation at a temporary directory.
//!
//! # Examples
//!
//! ```no_run
//! use relpm::{Config, Paths};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = Paths::resolve()?;
//! let config = Config::load(&paths)?;
//!
//! println!("Packages live in {}", paths.packages_dir.display());
//! println!("Releases come from github.com/{}", config.source.owner);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data root
pub const HOME_ENV: &str = "RELPM_HOME";

/// Name of the registry document inside the data root
pub const REGISTRY_FILE_NAME: &str = "metadata.json";

/// Filesystem roots shared by every component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Data root; everything else lives below it
    pub root: PathBuf,
    /// `<root>/packages` - one `<name>/<version>/` directory per installed version
    pub packages_dir: PathBuf,
    /// `<root>/bin` - shared links to the active executables
    pub bin_dir: PathBuf,
    /// `<root>/downloads` - transient release archives
    pub downloads_dir: PathBuf,
    /// `<root>/metadata.json` - the registry document
    pub registry_file: PathBuf,
    /// `<root>/config.toml`
    pub config_file: PathBuf,
}

impl Paths {
    /// Derive all locations from a data root
    pub fn from_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            packages_dir: root.join("packages"),
            bin_dir: root.join("bin"),
            downloads_dir: root.join("downloads"),
            registry_file: root.join(REGISTRY_FILE_NAME),
            config_file: root.join("config.toml"),
            root,
        }
    }

    /// Resolve the data root from `RELPM_HOME` or the platform default
    pub fn resolve() -> Result<Self> {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                let expanded = shellexpand::tilde(home.trim());
                return Ok(Self::from_root(expanded.as_ref()));
            }
        }

        let base = dirs::data_local_dir().ok_or(Error::NoDataDir)?;
        Ok(Self::from_root(base.join("relpm")))
    }

    /// Versioned package directory: `<packages>/<name>/<version>`.
    ///
    /// Path separators in the version are replaced with `-` so the directory is
    /// always a direct child of the package root. Versions for which
    /// [`version_dir_name`] returns `None` map to `_`; callers reject them first.
    pub fn version_dir(&self, name: &str, version: &str) -> PathBuf {
        let dir = version_dir_name(version).unwrap_or_else(|| "_".to_string());
        self.package_dir(name).join(dir)
    }

    /// Package root holding every installed version of `name`
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir.join(name)
    }
}

/// Single path component used for a release tag, or `None` if it can't be one
pub fn version_dir_name(version: &str) -> Option<String> {
    let name = version.replace(['/', '\\'], "-");
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return None;
    }
    Some(name)
}

/// User configuration file (`<root>/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where releases come from and which packages are trusted
    #[serde(default)]
    pub source: SourceConfig,

    /// Extraction and linking settings
    #[serde(default)]
    pub install: InstallConfig,

    /// PATH registration settings
    #[serde(default)]
    pub path: PathConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// GitHub API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Account owning every trusted repository
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Allow-list of installable packages (repository names, lower-case)
    #[serde(default = "default_packages")]
    pub packages: Vec<String>,

    /// License recorded in per-package metadata
    #[serde(default = "default_license")]
    pub license: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "JourneyCodesAyush".to_string()
}

fn default_packages() -> Vec<String> {
    vec![
        "cpp-cloc".to_string(),
        "c-utils".to_string(),
        "pdf-toolkit".to_string(),
    ]
}

fn default_license() -> String {
    "MIT".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            owner: default_owner(),
            packages: default_packages(),
            license: default_license(),
        }
    }
}

/// How the shared bin directory refers to installed executables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Hard link; package root and bin directory must share a volume
    #[default]
    Hard,
    /// Symbolic link pointing at the versioned copy
    Symlink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Archive entries ending with this suffix (case-insensitive) are installed
    #[serde(default = "default_executable_suffix")]
    pub executable_suffix: String,

    #[serde(default)]
    pub link_mode: LinkMode,
}

fn default_executable_suffix() -> String {
    ".exe".to_string()
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            executable_suffix: default_executable_suffix(),
            link_mode: LinkMode::default(),
        }
    }
}

impl InstallConfig {
    /// Whether a file name counts as an installable executable
    pub fn is_executable_name(&self, file_name: &str) -> bool {
        file_name
            .to_lowercase()
            .ends_with(&self.executable_suffix.to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Add the bin directory to the user's PATH after the first install
    #[serde(default = "default_auto_register")]
    pub auto_register: bool,
}

fn default_auto_register() -> bool {
    true
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            auto_register: default_auto_register(),
        }
    }
}

impl Config {
    /// Load config from `paths.config_file`, or defaults if it doesn't exist
    pub fn load(paths: &Paths) -> Result<Self> {
        Self::load_from(&paths.config_file)
    }

    /// Load config from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
