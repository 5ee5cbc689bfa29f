//! relpm - A minimal per-user package manager for prebuilt release executables
//!
//! relpm installs executables published as `.zip` assets on GitHub releases
//! of a fixed, trusted set of repositories. Each package version is unpacked
//! under its own directory and its executables are linked into one shared
//! `bin` directory that is put on the user's PATH:
//!
//! - Allow-list validation of package names before anything touches disk
//! - Latest-release resolution and download through the GitHub API
//! - Hard-link (or symlink) publication into a single bin directory
//! - A JSON registry of installed packages, written atomically
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
//! println!("{}", manager.install("cpp-cloc")?);
//! println!("{}", manager.info("cpp-cloc")?);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Data root layout and `config.toml`
//! - [`validation`] - Package names and the allow-list
//! - [`resolver`] - Latest-release lookup and archive download
//! - [`installer`] - Extract executables and link them into `bin`
//! - [`uninstaller`] - Remove package directories and their links
//! - [`registry`] - The installed-package registry (`metadata.json`)
//! - [`path_env`] - Put the bin directory on the user's PATH
//! - [`lifecycle`] - Install / upgrade / uninstall / list / info
//! - [`error`] - Error types and result handling

pub mod config;
pub mod error;
pub mod installer;
pub mod lifecycle;
pub mod path_env;
pub mod registry;
pub mod resolver;
pub mod uninstaller;
pub mod validation;

pub use config::{Config, InstallConfig, LinkMode, PathConfig, Paths, SourceConfig};
pub use error::{Error, Result};
pub use installer::{install, InstallOutcome};
pub use lifecycle::{InfoReport, InstallReport, InstallStatus, PackageManager, UninstallReport};
pub use path_env::{PathChange, PathRegistrar, SystemPathRegistrar};
pub use registry::{InstalledPackage, RegistryDocument, RegistryStore};
pub use resolver::{GithubResolver, Release, ReleaseMetadata, ReleaseResolver};
pub use uninstaller::{uninstall, UninstallOutcome};
pub use validation::{is_supported, is_valid_name, PackageName};
