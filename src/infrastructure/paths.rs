//! Platform path resolution.
//!
//! The data directory holds the favorite store and the log file. It follows
//! platform conventions through `directories` (`~/.local/share/citydex` on
//! Linux) and falls back to a relative `.citydex` directory when no home
//! directory can be determined.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the platform data directory for citydex.
///
/// # Examples
///
/// ```
/// let dir = citydex::infrastructure::data_dir();
/// assert!(dir.ends_with("citydex") || dir.ends_with(".citydex"));
/// ```
#[must_use]
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "citydex").map_or_else(
        || PathBuf::from(".citydex"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

/// Expands a leading `~` to the user's home directory.
///
/// Paths without a tilde, or a tilde when no home directory is known, are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use citydex::infrastructure::expand_tilde;
/// use std::path::PathBuf;
///
/// assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
/// assert!(!expand_tilde("~/cities.json").starts_with("~"));
/// ```
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let Some(home) = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()) else {
        return PathBuf::from(path);
    };

    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_only_expands_at_start() {
        assert_eq!(expand_tilde("data/~/x"), PathBuf::from("data/~/x"));
        assert_eq!(expand_tilde("~user/x"), PathBuf::from("~user/x"));
    }
}
