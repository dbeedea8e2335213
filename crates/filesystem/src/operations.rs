use super::models::FileSystem;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

impl FileSystem {
    /// Ensures `path` exists as a directory and returns its absolute form
    pub async fn ensure_directory(path: &Path, description: &str) -> io::Result<PathBuf> {
        let abs_path = Self::get_absolute_path(path)?;
        Self::create_directory(&abs_path, description).await?;
        Ok(abs_path)
    }

    async fn create_directory(path: &Path, description: &str) -> io::Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
            tracing::debug!("    Created: {} ({})", path.display(), description);
        } else if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} exists but is not a directory", path.display()),
            ));
        } else {
            tracing::debug!("    Exists:  {} ({})", path.display(), description);
        }
        Ok(())
    }

    pub fn get_absolute_path(path: &Path) -> io::Result<PathBuf> {
        let abs_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(abs_path)
    }

    pub fn get_absolute_path_string(path: &str) -> io::Result<String> {
        let path_buf = PathBuf::from(path);
        let abs = Self::get_absolute_path(&path_buf)?;
        Ok(abs.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_directory_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("uploads").join("tasks");

        let created = FileSystem::ensure_directory(&target, "Upload root").await.unwrap();

        assert!(created.is_absolute());
        assert!(created.is_dir());

        // Second call is a no-op
        FileSystem::ensure_directory(&target, "Upload root").await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let err = FileSystem::ensure_directory(&file, "Upload root").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_absolute_path_passthrough() {
        let abs = if cfg!(windows) { "C:\\data\\uploads" } else { "/data/uploads" };
        assert_eq!(
            FileSystem::get_absolute_path(Path::new(abs)).unwrap(),
            PathBuf::from(abs)
        );
    }
}
