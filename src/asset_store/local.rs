use super::{AssetStore, AssetStoreError};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Filesystem-backed asset store for dev mode.
///
/// Objects are written below `root` using their key as relative path, and
/// served by whatever static file server is mounted at `public_base_url`.
pub struct LocalAssetStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAssetStore {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        LocalAssetStore {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait::async_trait]
impl AssetStore for LocalAssetStore {
    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, AssetStoreError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Same key overwrites, like the remote store
        fs::write(&path, data).await?;
        debug!("LocalAssetStore: wrote {} bytes to {}", data.len(), path.display());

        Ok(self.url_for(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, AssetStoreError> {
        let dir = self.root.join(prefix);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                keys.push(format!("{}{}", prefix, entry.file_name().to_string_lossy()));
            }
        }
        keys.sort();

        Ok(keys.iter().map(|key| self.url_for(key)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_then_list() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path().to_path_buf(), "http://cdn.test/".into());

        let url = store
            .put_object("banners/b.png", b"two", "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://cdn.test/banners/b.png");
        store
            .put_object("banners/a.png", b"one", "image/png")
            .await
            .unwrap();

        let urls = store.list("banners/").await.unwrap();
        assert_eq!(
            urls,
            vec![
                "http://cdn.test/banners/a.png".to_string(),
                "http://cdn.test/banners/b.png".to_string()
            ]
        );
        assert_eq!(
            std::fs::read(dir.path().join("banners/a.png")).unwrap(),
            b"one"
        );
    }

    #[tokio::test]
    async fn test_list_missing_namespace_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path().to_path_buf(), "http://cdn.test".into());
        assert!(store.list("logos/").await.unwrap().is_empty());
    }
}
