//! Package names and the trusted-package allow-list

use crate::config::SourceConfig;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Case-normalised package name, the key into every store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9._-]*$").expect("valid regex"))
}

/// Whether `name` is safe to use as a single path component
pub fn is_valid_name(name: &PackageName) -> bool {
    let name = name.as_str();
    name_pattern().is_match(name) && !name.contains("..")
}

/// Whether `name` may be installed from the configured source.
///
/// The syntax check also keeps separators and `..` out of the paths that are
/// built from package names.
pub fn is_supported(name: &PackageName, source: &SourceConfig) -> bool {
    is_valid_name(name)
        && source
            .packages
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(name.as_str()))
}
