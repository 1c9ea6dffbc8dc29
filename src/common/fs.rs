//! File system helpers
//!
//! Small wrappers shared by the file-backed sources and the response cache.

use std::path::Path;
use std::time::SystemTime;

use super::error::{ConfigureError, Result};

/// Check that a path exists and is a regular file
///
/// # Returns
///
/// `Ok(())` when the file exists, otherwise a configuration error naming the path.
pub fn check_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ConfigureError::Config(format!(
            "File {} does not exist",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(ConfigureError::Config(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Last modification time of a file
pub async fn modified_time(path: &Path) -> Result<SystemTime> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata.modified()?)
}

/// Whether `name` can be used as a single file name component
///
/// Only ASCII letters, digits, `.` and `_` are accepted, and the names `.` and `..` are
/// refused so a name can never climb out of its directory.
pub fn is_valid_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_check_file_exists() {
        let path = PathBuf::from("Cargo.toml");
        assert!(check_file_exists(&path).is_ok());

        let path = PathBuf::from("non_existent_file.txt");
        assert!(check_file_exists(&path).is_err());

        let path = PathBuf::from("src");
        assert!(check_file_exists(&path).is_err());
    }

    #[test]
    fn test_valid_file_names() {
        assert!(is_valid_file_name("app_config"));
        assert!(is_valid_file_name("app.yaml"));
        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name("."));
        assert!(!is_valid_file_name(".."));
        assert!(!is_valid_file_name("../etc/passwd"));
        assert!(!is_valid_file_name("with space"));
        assert!(!is_valid_file_name("dash-name"));
    }

    #[tokio::test]
    async fn test_modified_time() {
        let path = PathBuf::from("Cargo.toml");
        assert!(modified_time(&path).await.is_ok());

        let path = PathBuf::from("non_existent_file.txt");
        assert!(modified_time(&path).await.is_err());
    }
}
