use super::{ShareFile, SharePlatform};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Clipboard helpers tried in order until one accepts the text.
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Desktop platform: files land in a directory, text goes to the system
/// clipboard, and there is no share sheet.
pub struct LocalPlatform {
    download_dir: PathBuf,
}

impl LocalPlatform {
    pub fn new(download_dir: PathBuf) -> Self {
        Self { download_dir }
    }

    /// The user's downloads directory, or the working directory if the
    /// platform has none.
    pub fn with_default_downloads() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

async fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).await?;
    }
    Ok(child.wait().await?.success())
}

#[async_trait]
impl SharePlatform for LocalPlatform {
    fn supports_native_share(&self) -> bool {
        false
    }

    fn can_share_files(&self, _files: &[ShareFile]) -> bool {
        false
    }

    async fn share_files(&self, _files: &[ShareFile]) -> Result<()> {
        Err(Error::Share("Native sharing is not available".to_string()))
    }

    async fn share_text(&self, _title: &str, _text: &str) -> Result<()> {
        Err(Error::Share("Native sharing is not available".to_string()))
    }

    async fn download(&self, file: &ShareFile) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(&file.file_name);
        tokio::fs::write(&path, &file.bytes).await?;
        Ok(path)
    }

    async fn copy_text(&self, text: &str) -> Result<()> {
        for (program, args) in CLIPBOARD_COMMANDS {
            match pipe_to(program, args, text).await {
                Ok(true) => return Ok(()),
                Ok(false) => debug!("{} exited unsuccessfully", program),
                Err(e) => debug!("{} unavailable: {}", program, e),
            }
        }
        Err(Error::Share("No clipboard tool available".to_string()))
    }
}
