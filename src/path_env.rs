//! Adding the shared bin directory to the user's PATH
//!
//! On Windows the user PATH lives in `HKCU\Environment`; elsewhere relpm
//! appends an `export PATH=...` line to `~/.profile`. Both are idempotent:
//! an entry that is already present is left alone.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// What [`PathRegistrar::ensure_on_path`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChange {
    Added,
    AlreadyPresent,
}

/// Makes a directory visible on the user's executable search path
pub trait PathRegistrar {
    fn ensure_on_path(&self, bin_dir: &Path) -> Result<PathChange>;
}

/// PATH registrar for the current platform
#[derive(Debug, Clone, Default)]
pub struct SystemPathRegistrar {
    /// Shell profile to edit on non-Windows platforms (default `~/.profile`)
    profile: Option<PathBuf>,
}

impl SystemPathRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific shell profile instead of `~/.profile`
    pub fn with_profile<P: AsRef<Path>>(profile: P) -> Self {
        Self {
            profile: Some(profile.as_ref().to_path_buf()),
        }
    }
}

impl PathRegistrar for SystemPathRegistrar {
    #[cfg(windows)]
    fn ensure_on_path(&self, bin_dir: &Path) -> Result<PathChange> {
        if let Some(profile) = &self.profile {
            return add_to_profile(profile, bin_dir);
        }
        add_to_user_environment(bin_dir)
    }

    #[cfg(not(windows))]
    fn ensure_on_path(&self, bin_dir: &Path) -> Result<PathChange> {
        let profile = match &self.profile {
            Some(profile) => profile.clone(),
            None => dirs::home_dir()
                .ok_or_else(|| Error::Other("Could not find home directory".to_string()))?
                .join(".profile"),
        };
        add_to_profile(&profile, bin_dir)
    }
}

const PATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Lower-cased, separator-normalised form used to compare PATH entries
fn normalize(entry: &str) -> String {
    entry
        .trim()
        .trim_end_matches(['/', '\\'])
        .replace('\\', "/")
        .to_lowercase()
}

fn contains_entry(path_value: &str, separator: char, dir: &str) -> bool {
    let wanted = normalize(dir);
    path_value
        .split(separator)
        .any(|entry| !entry.trim().is_empty() && normalize(entry) == wanted)
}

fn add_to_profile(profile: &Path, bin_dir: &Path) -> Result<PathChange> {
    let dir = bin_dir.display().to_string();
    let line = format!("export PATH=\"{}:$PATH\"", dir);

    if let Ok(current) = std::env::var("PATH") {
        if contains_entry(&current, PATH_SEPARATOR, &dir) {
            return Ok(PathChange::AlreadyPresent);
        }
    }

    let existing = match std::fs::read_to_string(profile) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::Io(e)),
    };
    if existing.lines().any(|l| l.trim() == line) {
        return Ok(PathChange::AlreadyPresent);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str("# Added by relpm\n");
    content.push_str(&line);
    content.push('\n');
    std::fs::write(profile, content)?;

    tracing::info!(profile = %profile.display(), "added bin directory to PATH");
    Ok(PathChange::Added)
}

/// Current user PATH from a registry read; only a missing value counts as empty.
///
/// Any other read failure is returned, since writing back after it would
/// replace the user's entries with the bin directory alone.
#[cfg_attr(not(windows), allow(dead_code))]
fn existing_path(read: std::io::Result<String>) -> Result<String> {
    match read {
        Ok(value) => Ok(value),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(windows)]
fn add_to_user_environment(bin_dir: &Path) -> Result<PathChange> {
    use winreg::enums::{RegType, HKEY_CURRENT_USER, KEY_READ, KEY_SET_VALUE};
    use winreg::{RegKey, RegValue};

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let env = hkcu.open_subkey_with_flags("Environment", KEY_READ | KEY_SET_VALUE)?;
    let current = existing_path(env.get_value("PATH"))?;

    let dir = bin_dir.display().to_string();
    if contains_entry(&current, ';', &dir) {
        return Ok(PathChange::AlreadyPresent);
    }

    let updated = if current.is_empty() {
        dir
    } else {
        format!("{};{}", current.trim_end_matches(';'), dir)
    };

    // REG_EXPAND_SZ keeps %VAR% references in the existing PATH working
    let bytes: Vec<u8> = updated
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    env.set_raw_value(
        "PATH",
        &RegValue {
            bytes,
            vtype: RegType::REG_EXPAND_SZ,
        },
    )?;

    tracing::info!("added bin directory to user PATH (open a new terminal)");
    Ok(PathChange::Added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_contains_entry_normalises() {
        assert!(contains_entry(
            r"C:\Windows;C:\Users\me\AppData\Local\relpm\bin\",
            ';',
            r"c:\users\ME\appdata\local\relpm\bin"
        ));
        assert!(contains_entry("/usr/bin:/home/me/relpm/bin/", ':', "/home/me/relpm/bin"));
        assert!(!contains_entry("/usr/bin:/bin", ':', "/home/me/relpm/bin"));
        assert!(!contains_entry("", ':', "/home/me/relpm/bin"));
    }

    #[test]
    fn test_existing_path_only_defaults_when_missing() {
        use std::io::{Error as IoError, ErrorKind};

        assert_eq!(existing_path(Ok(r"C:\Windows".to_string())).unwrap(), r"C:\Windows");
        assert_eq!(
            existing_path(Err(IoError::from(ErrorKind::NotFound))).unwrap(),
            ""
        );
        assert!(existing_path(Err(IoError::from(ErrorKind::PermissionDenied))).is_err());
        assert!(existing_path(Err(IoError::new(ErrorKind::InvalidData, "REG_BINARY"))).is_err());
    }

    #[test]
    fn test_profile_registration_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let profile = temp_dir.path().join(".profile");
        fs::write(&profile, "alias ll='ls -l'").unwrap();
        let registrar = SystemPathRegistrar::with_profile(&profile);
        let bin = temp_dir.path().join("bin");

        assert_eq!(registrar.ensure_on_path(&bin).unwrap(), PathChange::Added);
        assert_eq!(
            registrar.ensure_on_path(&bin).unwrap(),
            PathChange::AlreadyPresent
        );

        let content = fs::read_to_string(&profile).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert_eq!(content.matches("export PATH=").count(), 1);
        assert!(content.contains(&bin.display().to_string()));
    }

    #[test]
    fn test_profile_created_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let profile = temp_dir.path().join(".profile");
        let registrar = SystemPathRegistrar::with_profile(&profile);

        registrar.ensure_on_path(Path::new("/opt/relpm/bin")).unwrap();
        assert_eq!(
            fs::read_to_string(&profile).unwrap(),
            "# Added by relpm\nexport PATH=\"/opt/relpm/bin:$PATH\"\n"
        );
    }
}
