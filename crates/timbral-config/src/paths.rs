//! Platform-specific paths for patches and configuration.
//!
//! # Directory Structure
//!
//! - **User patches**: `~/.config/timbral/patches/` (Linux), `~/Library/Application Support/timbral/patches/` (macOS), `%APPDATA%\timbral\patches\` (Windows)
//! - **User config**: `~/.config/timbral/` (Linux), `~/Library/Application Support/timbral/` (macOS), `%APPDATA%\timbral\` (Windows)
//! - **System patches**: `/usr/share/timbral/patches/` (Linux), `/Library/Application Support/timbral/patches/` (macOS)
//!
//! # Example
//!
//! ```rust,no_run
//! use timbral_config::paths;
//!
//! let (patch, source) = paths::resolve_patch("soft_pad").unwrap();
//! println!("{} from {source}", patch.name);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Patch, get_factory_patch};

/// Application name used for directory paths.
const APP_NAME: &str = "timbral";

/// Subdirectory name for patches.
const PATCHES_SUBDIR: &str = "patches";

/// Returns the user-specific patches directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_patches_dir() -> PathBuf {
    user_config_dir().join(PATCHES_SUBDIR)
}

/// Returns the user-specific configuration directory.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the system-wide patches directory.
///
/// # Platform Paths
///
/// - Linux: `/usr/share/timbral/patches/`
/// - macOS: `/Library/Application Support/timbral/patches/`
/// - Windows: `%PROGRAMDATA%\timbral\patches\`
pub fn system_patches_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/usr/share").join(APP_NAME).join(PATCHES_SUBDIR)
    }
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support")
            .join(APP_NAME)
            .join(PATCHES_SUBDIR)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join(PATCHES_SUBDIR)
    }
}

fn toml_file_name(name: &str) -> String {
    if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    }
}

fn find_in_dirs(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let filename = toml_file_name(name);
    dirs.iter()
        .map(|dir| dir.join(&filename))
        .find(|path| path.is_file())
}

/// Find a patch file by name or path.
///
/// Searches the user patches directory, then the system patches directory,
/// then treats `name` as a path.
pub fn find_patch(name: &str) -> Option<PathBuf> {
    find_in_dirs(name, &[user_patches_dir(), system_patches_dir()]).or_else(|| {
        let path = PathBuf::from(name);
        path.is_file().then_some(path)
    })
}

/// Where a resolved patch came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchSource {
    /// Built into the library.
    Factory,
    /// A file in one of the patch directories or given by path.
    File(PathBuf),
}

impl fmt::Display for PatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchSource::Factory => f.write_str("factory"),
            PatchSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Resolve a patch by factory name, then user/system file, then path.
///
/// # Errors
///
/// [`ConfigError::PatchNotFound`] when nothing matches; read and parse
/// errors from the file that did.
pub fn resolve_patch(name: &str) -> Result<(Patch, PatchSource), ConfigError> {
    if let Some(patch) = get_factory_patch(name) {
        return Ok((patch, PatchSource::Factory));
    }
    let path = find_patch(name).ok_or_else(|| ConfigError::PatchNotFound(name.to_string()))?;
    let patch = Patch::load(&path)?;
    Ok((patch, PatchSource::File(path)))
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Ensure the user patches directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_patches_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_patches_dir())
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    ensure_dir(user_config_dir())
}

/// List all patch files in the user patches directory.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_patches() -> Vec<PathBuf> {
    list_patches_in_dir(&user_patches_dir())
}

/// List all patch files in the system patches directory.
pub fn list_system_patches() -> Vec<PathBuf> {
    list_patches_in_dir(&system_patches_dir())
}

/// User patches followed by system patches. Duplicate names are kept.
pub fn list_all_patches() -> Vec<PathBuf> {
    let mut patches = list_user_patches();
    patches.extend(list_system_patches());
    patches
}

/// `.toml` files in `dir`, sorted by path.
pub fn list_patches_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut patches: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    patches.sort();
    patches
}

/// Get the patch name from a file path.
///
/// ```rust
/// use timbral_config::paths::patch_name_from_path;
/// use std::path::Path;
///
/// let name = patch_name_from_path(Path::new("/path/to/warm_pad.toml"));
/// assert_eq!(name, Some("warm_pad".to_string()));
/// ```
pub fn patch_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dirs_name_the_app() {
        assert!(user_config_dir().to_string_lossy().contains("timbral"));
        assert!(user_patches_dir().ends_with("patches"));
        assert!(system_patches_dir().to_string_lossy().contains("timbral"));
    }

    #[test]
    fn test_find_in_dirs_adds_extension_and_keeps_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("lead.toml"), "name = \"second\"").unwrap();

        let dirs = [first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_in_dirs("lead", &dirs),
            Some(second.path().join("lead.toml"))
        );

        fs::write(first.path().join("lead.toml"), "name = \"first\"").unwrap();
        assert_eq!(
            find_in_dirs("lead.toml", &dirs),
            Some(first.path().join("lead.toml"))
        );
        assert_eq!(find_in_dirs("missing", &dirs), None);
    }

    #[test]
    fn test_find_patch_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let patch_path = temp_dir.path().join("by_path_patch_test.toml");
        fs::write(&patch_path, "name = \"test\"").unwrap();

        assert_eq!(find_patch(patch_path.to_str().unwrap()), Some(patch_path));
        assert!(find_patch("nonexistent_patch_12345").is_none());
    }

    #[test]
    fn test_resolve_prefers_factory() {
        let (patch, source) = resolve_patch("pluck").unwrap();
        assert_eq!(patch.name, "Pluck");
        assert_eq!(source, PatchSource::Factory);
        assert_eq!(source.to_string(), "factory");
    }

    #[test]
    fn test_resolve_file_and_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("resolve_test.toml");
        Patch::new("From Disk").save(&path).unwrap();

        let (patch, source) = resolve_patch(path.to_str().unwrap()).unwrap();
        assert_eq!(patch.name, "From Disk");
        assert_eq!(source, PatchSource::File(path));

        assert!(matches!(
            resolve_patch("nonexistent_patch_12345"),
            Err(ConfigError::PatchNotFound(_))
        ));
    }

    #[test]
    fn test_list_patches_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp_dir.path().join("dir.toml")).unwrap();

        let patches = list_patches_in_dir(temp_dir.path());
        assert_eq!(
            patches,
            vec![temp_dir.path().join("a.toml"), temp_dir.path().join("b.toml")]
        );
        assert!(list_patches_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn test_patch_name_from_path() {
        assert_eq!(
            patch_name_from_path(Path::new("simple.toml")),
            Some("simple".to_string())
        );
    }
}
