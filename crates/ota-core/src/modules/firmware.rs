//! Firmware artifact directory.
//!
//! Flat directory of binaries served at `/firmware/{filename}`. The MD5
//! reported here is what devices check after download.

use std::path::{Path, PathBuf};

use md5::Md5;
use sha2::{Digest, Sha256};

use ota_types::FirmwareFile;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct FirmwareStore {
    dir: PathBuf,
}

impl FirmwareStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if needed.
    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Resolve a filename inside the store, rejecting anything path-like.
    pub fn path_for(&self, filename: &str) -> AppResult<PathBuf> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }

    /// All regular files, sorted by name.
    pub async fn list(&self) -> AppResult<Vec<FirmwareFile>> {
        self.ensure_dir().await?;

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    // Hidden files are not firmware.
                    if !name.starts_with('.') {
                        names.push(name.to_string());
                    }
                } else {
                    tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 firmware filename");
                }
            }
        }
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            files.push(self.describe(&name, &self.dir.join(&name)).await?);
        }
        Ok(files)
    }

    pub async fn info(&self, filename: &str) -> AppResult<FirmwareFile> {
        let path = self.existing(filename).await?;
        self.describe(filename, &path).await
    }

    /// Write (or overwrite) a firmware binary.
    ///
    /// Bytes are staged in a uniquely named file next to the served
    /// directory and renamed into place once synced.
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> AppResult<FirmwareFile> {
        let path = self.path_for(filename)?;
        self.ensure_dir().await?;
        let staging = self.staging_dir();
        tokio::fs::create_dir_all(&staging).await?;

        let bytes = bytes.to_vec();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write;

            let mut temp = tempfile::Builder::new().prefix("upload-").tempfile_in(&staging)?;
            temp.write_all(&bytes)?;
            temp.as_file().sync_all()?;
            temp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        let file = self.describe(filename, &path).await?;
        tracing::info!(filename, size = file.size, checksum = %file.checksum, "Firmware stored");
        Ok(file)
    }

    /// Sibling of the served directory, on the same filesystem.
    fn staging_dir(&self) -> PathBuf {
        let name = self.dir.file_name().and_then(|n| n.to_str()).unwrap_or("firmware");
        self.dir.with_file_name(format!(".{}.staging", name))
    }

    pub async fn delete(&self, filename: &str) -> AppResult<()> {
        let path = self.existing(filename).await?;
        tokio::fs::remove_file(&path).await?;
        tracing::info!(filename, "Firmware deleted");
        Ok(())
    }

    async fn existing(&self, filename: &str) -> AppResult<PathBuf> {
        let path = self.path_for(filename)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(AppError::NotFound(filename.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn describe(&self, filename: &str, path: &Path) -> AppResult<FirmwareFile> {
        let bytes = tokio::fs::read(path).await?;
        let meta = tokio::fs::metadata(path).await?;
        let uploaded_at = meta
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339());

        Ok(FirmwareFile {
            filename: filename.to_string(),
            checksum: md5_hex(&bytes),
            sha256: sha256_hex(&bytes),
            size: bytes.len() as u64,
            uploaded_at,
        })
    }
}

fn validate_filename(filename: &str) -> AppResult<()> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);
    if bad {
        return Err(AppError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

fn to_hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Lowercase hex MD5 of `bytes`.
pub fn md5_hex(bytes: &[u8]) -> String {
    to_hex(&Md5::digest(bytes))
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    to_hex(&Sha256::digest(bytes))
}

/// Public download URL of a stored firmware file.
pub fn download_url(base_url: &str, filename: &str) -> String {
    format!("{}/firmware/{}", base_url.trim_end_matches('/'), urlencoding::encode(filename))
}

/// MD5 of a file on disk.
pub async fn calculate_file_md5(path: &Path) -> AppResult<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(md5_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(
            sha256_hex(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_download_url_escapes_filename() {
        assert_eq!(
            download_url("http://ota.local:5000", "pb-1.2.1.bin"),
            "http://ota.local:5000/firmware/pb-1.2.1.bin"
        );
        assert_eq!(
            download_url("https://ota.example.com/", "panic button #2.bin"),
            "https://ota.example.com/firmware/panic%20button%20%232.bin"
        );
    }

    #[test]
    fn test_filename_validation() {
        for bad in ["", ".", "..", "../etc/passwd", "a/b.bin", "a\\b.bin", "nul\0.bin"] {
            assert!(matches!(validate_filename(bad), Err(AppError::InvalidFilename(_))), "{bad:?}");
        }
        assert!(validate_filename("pb_v1.2.1.bin").is_ok());
    }

    #[tokio::test]
    async fn test_save_list_info_delete() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FirmwareStore::new(tmp.path().join("firmware"));

        let saved = store.save("pb_v1.2.1.bin", b"hello").await.unwrap();
        assert_eq!(saved.checksum, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(saved.size, 5);
        assert!(saved.uploaded_at.is_some());

        store.save("a.bin", b"").await.unwrap();
        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|f| f.filename).collect();
        assert_eq!(names, vec!["a.bin", "pb_v1.2.1.bin"]);

        assert_eq!(store.info("pb_v1.2.1.bin").await.unwrap().checksum, saved.checksum);

        store.delete("pb_v1.2.1.bin").await.unwrap();
        assert!(matches!(store.info("pb_v1.2.1.bin").await, Err(AppError::NotFound(_))));
        assert!(matches!(store.delete("pb_v1.2.1.bin").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_uploads_never_appear_in_served_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = std::sync::Arc::new(FirmwareStore::new(tmp.path().join("firmware")));

        let mut tasks = Vec::new();
        for i in 0..8u8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.save("pb.bin", &[i; 64]).await.unwrap() }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut entries: Vec<String> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["pb.bin"]);

        let stored = std::fs::read(store.dir().join("pb.bin")).unwrap();
        assert_eq!(stored.len(), 64);
        assert!(stored.iter().all(|b| *b == stored[0]));
        assert_eq!(std::fs::read_dir(store.staging_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = FirmwareStore::new(tmp.path());
        assert!(matches!(store.save("../x.bin", b"x").await, Err(AppError::InvalidFilename(_))));
        assert!(matches!(store.info("..").await, Err(AppError::InvalidFilename(_))));
    }

    #[tokio::test]
    async fn test_calculate_file_md5() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("fw.bin");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(calculate_file_md5(&path).await.unwrap(), "5d41402abc4b2a76b9719d911017c592");
    }
}
