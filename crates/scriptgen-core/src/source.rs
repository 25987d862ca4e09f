use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Single-shot provider of text such as a pasted report or a backup document.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Read the whole text. Each call performs one complete read.
    async fn read_text(&self) -> Result<String>;

    /// Short label for logs and error messages.
    fn describe(&self) -> String;
}

/// Reads a file from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TextSource for FileSource {
    async fn read_text(&self) -> Result<String> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = text.len(), "source read");
        Ok(text)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads everything from standard input.
#[derive(Debug, Default, Clone)]
pub struct StdinSource;

#[async_trait]
impl TextSource for StdinSource {
    async fn read_text(&self) -> Result<String> {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read stdin")?;
        Ok(text)
    }

    fn describe(&self) -> String {
        "<stdin>".to_string()
    }
}

/// In-memory text, mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct StringSource(pub String);

#[async_trait]
impl TextSource for StringSource {
    async fn read_text(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn string_source_returns_contents() {
        let source = StringSource("1. Score: 5 | .cart".into());
        assert_eq!(block_on(source.read_text()).unwrap(), "1. Score: 5 | .cart");
    }

    #[tokio::test]
    async fn file_source_reads_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("report.txt");
        std::fs::write(&path, "1. .cart-items").unwrap();
        let source = FileSource::new(&path);
        assert_eq!(source.read_text().await.unwrap(), "1. .cart-items");
        assert!(source.describe().ends_with("report.txt"));
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let source = FileSource::new("/definitely/not/here.txt");
        let err = source.read_text().await.unwrap_err();
        assert!(format!("{err}").contains("/definitely/not/here.txt"));
    }
}
