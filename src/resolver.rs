//! Release resolution: finding and downloading the latest release of a package
//!
//! [`ReleaseResolver`] is the seam between the lifecycle and the network.
//! [`GithubResolver`] implements it against the GitHub releases API: it asks
//! for the latest release of `<owner>/<package>`, picks the first `.zip` asset
//! and downloads it into the downloads directory.
//!
//! # Examples
//!
//! ```no_run
//! use relpm::{Config, GithubResolver, PackageName, Paths, ReleaseResolver};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = Paths::resolve()?;
//! let config = Config::load(&paths)?;
//! let resolver = GithubResolver::new(&config.source, &paths)?;
//!
//! let release = resolver.resolve(&PackageName::new("c-utils"))?;
//! println!("{} {} -> {}", release.package_name, release.version, release.archive.display());
//! # Ok(())
//! # }
//! ```

use crate::config::SourceConfig;
use crate::{Error, PackageName, Paths, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Per-package metadata written next to the installed executables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub author: String,
    pub license: String,
    pub published_at: String,
}

/// The latest release of a package, downloaded and ready to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub package_name: PackageName,
    /// Opaque release tag; only compared for equality
    pub version: String,
    /// Local path of the downloaded archive
    pub archive: PathBuf,
    /// Asset name as published
    pub archive_file_name: String,
    pub metadata: ReleaseMetadata,
}

/// Finds and downloads the latest release of a package
pub trait ReleaseResolver {
    fn resolve(&self, package: &PackageName) -> Result<Release>;
}

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    author: Option<GithubAuthor>,
    #[serde(default)]
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAuthor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    name: String,
    browser_download_url: String,
}

/// Resolver backed by the GitHub releases API
pub struct GithubResolver {
    api_url: Url,
    owner: String,
    license: String,
    downloads_dir: PathBuf,
    client: reqwest::blocking::Client,
    show_progress: bool,
}

impl GithubResolver {
    pub fn new(source: &SourceConfig, paths: &Paths) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("relpm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_url: Url::parse(&source.api_url)?,
            owner: source.owner.clone(),
            license: source.license.clone(),
            downloads_dir: paths.downloads_dir.clone(),
            client,
            show_progress: true,
        })
    }

    /// Disable the download spinner (non-interactive use, tests)
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn latest_release_url(&self, package: &PackageName) -> Result<Url> {
        let path = format!(
            "repos/{}/{}/releases/latest",
            self.owner,
            package.as_str()
        );
        // Url::join replaces the last segment unless the base ends with '/'
        let mut base = self.api_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(base.join(&path)?)
    }

    fn fetch_latest(&self, package: &PackageName) -> Result<GithubRelease> {
        let url = self.latest_release_url(package)?;
        tracing::debug!(%url, "fetching latest release");

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/vnd.github+json")
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    Error::Resolution(format!("Cannot connect to {}", self.api_url))
                } else if e.is_timeout() {
                    Error::Resolution("Release request timed out. Please try again.".to_string())
                } else {
                    Error::Resolution(format!("Failed to fetch release: {}", e))
                }
            })?;

        let status = response.status();
        if status == 404 {
            return Err(Error::Resolution(format!(
                "No published release for '{}' at {}",
                package, url
            )));
        }
        if !status.is_success() {
            return Err(Error::Resolution(format!(
                "Release lookup failed: HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json()
            .map_err(|e| Error::Resolution(format!("Failed to parse release: {}", e)))
    }

    fn download(&self, url: &str, target: &Path) -> Result<()> {
        let spinner = if self.show_progress {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
                spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
            }
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner
        } else {
            ProgressBar::hidden()
        };
        spinner.set_message(format!("Downloading {}...", url));

        let result = self.download_to(url, target);
        spinner.finish_and_clear();
        if result.is_err() {
            // Partial archive
            let _ = fs::remove_file(target);
        }
        result
    }

    fn download_to(&self, url: &str, target: &Path) -> Result<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::Resolution(format!("Failed to download archive: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Resolution(format!(
                "Failed to download archive: HTTP {}",
                response.status().as_u16()
            )));
        }

        fs::create_dir_all(&self.downloads_dir)?;
        let mut file = File::create(target)?;
        io::copy(&mut response, &mut file)
            .map_err(|e| Error::Resolution(format!("Failed to download archive: {}", e)))?;
        Ok(())
    }
}

impl ReleaseResolver for GithubResolver {
    fn resolve(&self, package: &PackageName) -> Result<Release> {
        let release = self.fetch_latest(package)?;

        let asset = release
            .assets
            .iter()
            .find(|asset| asset.name.to_lowercase().ends_with(".zip"))
            .ok_or_else(|| {
                Error::Resolution("No zip asset found in latest release".to_string())
            })?;

        // Asset names come from the server; keep only the final component
        let file_name = Path::new(&asset.name)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| Error::Resolution(format!("Invalid asset name '{}'", asset.name)))?;
        let archive = self.downloads_dir.join(&file_name);

        self.download(&asset.browser_download_url, &archive)?;
        tracing::info!(package = %package, version = %release.tag_name, archive = %archive.display(), "downloaded release");

        Ok(Release {
            package_name: package.clone(),
            version: release.tag_name,
            archive,
            archive_file_name: file_name,
            metadata: ReleaseMetadata {
                author: release.author.map(|a| a.login).unwrap_or_default(),
                license: self.license.clone(),
                published_at: release.published_at.unwrap_or_default(),
            },
        })
    }
}
