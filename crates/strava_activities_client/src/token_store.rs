//! File-backed storage for refresh tokens rotated by the provider.

use secrecy::{ExposeSecret, SecretString};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Clone, Debug)]
pub struct RefreshTokenStore {
    path: PathBuf,
}

impl RefreshTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token. A missing or blank file yields `None`.
    pub fn load(&self) -> io::Result<Option<SecretString>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SecretString::new(token.into())))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace the stored token. The new contents go to a sibling temp file
    /// that is renamed over the target, so an interrupted write leaves the
    /// previous token in place. On unix the file is readable by the owner only.
    pub async fn save(&self, token: &SecretString) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = self.temp_path();
        // a leftover from an interrupted save keeps its old mode; start fresh
        let _ = tokio::fs::remove_file(&temp_path).await;
        if let Err(e) = write_private(&temp_path, token).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
        tokio::fs::rename(&temp_path, &self.path).await
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "refresh_token".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn write_private(path: &Path, token: &SecretString) -> io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(format!("{}\n", token.expose_secret()).as_bytes())
        .await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefreshTokenStore::new(dir.path().join("absent"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn load_blank_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();
        assert!(RefreshTokenStore::new(path).load().unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_trims_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefreshTokenStore::new(dir.path().join("nested/dir/token"));
        store
            .save(&SecretString::new("rotated-token".into()))
            .await
            .unwrap();
        let loaded = store.load().unwrap().expect("token");
        assert_eq!(loaded.expose_secret(), "rotated-token");
    }

    #[tokio::test]
    async fn save_replaces_previous_token_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        let store = RefreshTokenStore::new(&path);
        store.save(&SecretString::new("first".into())).await.unwrap();
        store.save(&SecretString::new("second".into())).await.unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "second");
        assert!(!dir.path().join("token.tmp").exists());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "still-valid\n").unwrap();
        // occupy the temp file name with a directory so the write cannot start
        std::fs::create_dir(dir.path().join("token.tmp")).unwrap();

        let store = RefreshTokenStore::new(&path);
        store
            .save(&SecretString::new("rotated".into()))
            .await
            .expect_err("temp file is blocked");
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "still-valid");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn saved_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        RefreshTokenStore::new(&path)
            .save(&SecretString::new("rotated".into()))
            .await
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
