use super::{HistoryEntry, HistoryError, HistoryStore, UserIdentity};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Stores each user's history as `<data_dir>/<user_id>.jsonl`, one entry per
/// line.
#[derive(Debug, Clone)]
pub struct JsonLinesHistoryStore {
    data_dir: PathBuf,
}

impl JsonLinesHistoryStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn user_file(&self, user: &UserIdentity) -> Result<PathBuf, HistoryError> {
        let id = user.validated_id()?;
        Ok(self.data_dir.join(format!("{id}.jsonl")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> HistoryError + '_ {
    move |source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl HistoryStore for JsonLinesHistoryStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn append(&self, user: &UserIdentity, entry: HistoryEntry) -> Result<(), HistoryError> {
        let path = self.user_file(user)?;
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(io_error(&self.data_dir))?;

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_error(&path))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(io_error(&path))?;
        file.flush().await.map_err(io_error(&path))?;

        debug!(path = %path.display(), "appended history entry");
        Ok(())
    }

    async fn list(&self, user: &UserIdentity) -> Result<Vec<HistoryEntry>, HistoryError> {
        let path = self.user_file(user)?;
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_error(&path)(err)),
        };

        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(HistoryError::from))
            .collect()
    }
}
