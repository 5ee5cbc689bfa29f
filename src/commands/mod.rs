pub mod info;
pub mod install;
pub mod list;
pub mod uninstall;
pub mod upgrade;

use anyhow::{Context, Result};
use relpm::{Config, GithubResolver, PackageManager, Paths, SystemPathRegistrar};

pub type Manager = PackageManager<GithubResolver, SystemPathRegistrar>;

/// Build a manager over the user's data root and config
pub fn manager() -> Result<Manager> {
    let paths = Paths::resolve()?;
    let config = Config::load(&paths)
        .with_context(|| format!("Failed to load {}", paths.config_file.display()))?;
    let resolver = GithubResolver::new(&config.source, &paths)?;
    Ok(PackageManager::new(
        config,
        paths,
        resolver,
        SystemPathRegistrar::new(),
    ))
}
