//! Saving downloaded files

use crate::AppError;
use app_api::Download;
use std::path::{Path, PathBuf};

/// Characters that may not appear in a saved file name
const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Windows reserved device names
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL",
    "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9",
    "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Make a server-provided file name safe to create inside the download dir
pub fn sanitize_file_name(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) || c.is_control() { '_' } else { c })
        .collect();

    let upper = result.to_uppercase();
    let base = upper.split('.').next().unwrap_or("");
    if RESERVED_NAMES.contains(&base) {
        result = format!("_{}", result);
    }

    while result.ends_with('.') || result.ends_with(' ') {
        result.pop();
    }
    let trimmed = result.trim_start_matches('.');
    if trimmed.is_empty() {
        return "download".to_string();
    }
    trimmed.to_string()
}

/// Writes downloads into one directory without overwriting existing files
#[derive(Debug, Clone)]
pub struct Downloader {
    dir: PathBuf,
}

impl Downloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save `download`, returning the path written
    pub async fn save(&self, download: &Download) -> Result<PathBuf, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = sanitize_file_name(&download.file_name);
        let target = self.free_path(&name).await;
        tokio::fs::write(&target, &download.bytes).await?;

        tracing::info!("Saved {} bytes to {:?}", download.bytes.len(), target);
        Ok(target)
    }

    /// `name`, or `stem (n).ext` for the first n not already taken
    async fn free_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !exists(&candidate).await {
            return candidate;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
            _ => (name, ""),
        };
        let mut n = 1;
        loop {
            let candidate = self.dir.join(format!("{} ({}){}", stem, n, ext));
            if !exists(&candidate).await {
                return candidate;
            }
            n += 1;
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("image.png"), "image.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name("a:b?.png"), "a_b_.png");
        assert_eq!(sanitize_file_name("CON.zip"), "_CON.zip");
        assert_eq!(sanitize_file_name(".."), "download");
        assert_eq!(sanitize_file_name("name. "), "name");
    }

    #[tokio::test]
    async fn test_save_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let downloader = Downloader::new(dir.path().join("out"));
        let download = Download { file_name: "a.png".into(), bytes: vec![1, 2, 3] };

        let first = downloader.save(&download).await.unwrap();
        let second = downloader.save(&download).await.unwrap();

        assert_eq!(first.file_name().unwrap(), "a.png");
        assert_eq!(second.file_name().unwrap(), "a (1).png");
        assert_eq!(std::fs::read(&second).unwrap(), vec![1, 2, 3]);
    }
}
