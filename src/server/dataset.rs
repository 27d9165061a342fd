//! Dataset retrieval and on-disk caching
//!
//! Examples come from the Hugging Face datasets-server rows API and are
//! cached under `data/dataset_{index}.json`; completed answers (with their
//! audit transcripts) are cached under `answers/answer_{index}.json` so a
//! repeated query replays instead of re-running the loop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::TranscriptEntry;
use crate::config::ServerConfig;
use crate::metrics::DATASET_FETCHES;

/// Rows endpoint of the Hugging Face datasets-server
const DATASETS_SERVER_URL: &str = "https://datasets-server.huggingface.co/rows";

/// One benchmark example: the long context and the question over it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetExample {
    pub context_window_text: String,
    pub question: String,
}

/// A cached run result, in the shape served by `/api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub final_answer: Option<String>,
    pub code_and_output: Vec<TranscriptEntry>,
}

/// Error type for dataset operations
#[derive(Debug)]
pub enum DatasetError {
    Request(reqwest::Error),
    Io(std::io::Error),
    Parse(serde_json::Error),
    Shape(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Request(e) => write!(f, "Request error: {}", e),
            DatasetError::Io(e) => write!(f, "IO error: {}", e),
            DatasetError::Parse(e) => write!(f, "Parse error: {}", e),
            DatasetError::Shape(msg) => write!(f, "Unexpected response shape: {}", msg),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<reqwest::Error> for DatasetError {
    fn from(e: reqwest::Error) -> Self {
        DatasetError::Request(e)
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(e: serde_json::Error) -> Self {
        DatasetError::Parse(e)
    }
}

/// Fetches dataset examples and persists both examples and answers
pub struct DatasetStore {
    client: reqwest::Client,
    dataset: String,
    subset: String,
    split: String,
    hf_token: Option<String>,
    data_dir: PathBuf,
    answer_dir: PathBuf,
}

impl DatasetStore {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            dataset: config.dataset.clone(),
            subset: config.dataset_subset.clone(),
            split: config.dataset_split.clone(),
            hf_token: config.hf_token.clone(),
            data_dir: config.data_dir.clone(),
            answer_dir: config.answer_dir.clone(),
        }
    }

    /// Get one example, from the disk cache when present
    pub async fn example(&self, index: usize) -> Result<DatasetExample, DatasetError> {
        let path = self.data_dir.join(format!("dataset_{}.json", index));

        if path.exists() {
            DATASET_FETCHES.with_label_values(&["cache"]).inc();
            debug!(index, "Dataset example served from cache");
            return read_json(&path);
        }

        let example = self.fetch_remote(index).await?;
        DATASET_FETCHES.with_label_values(&["remote"]).inc();

        std::fs::create_dir_all(&self.data_dir)?;
        write_json(&path, &example)?;
        info!(index, "Dataset example fetched and cached");

        Ok(example)
    }

    /// Look up a cached answer for an example index
    pub fn cached_answer(&self, index: usize) -> Option<CachedAnswer> {
        let path = self.answer_dir.join(format!("answer_{}.json", index));
        if !path.exists() {
            return None;
        }
        read_json(&path).ok()
    }

    /// Persist a completed answer
    pub fn store_answer(&self, index: usize, answer: &CachedAnswer) -> Result<(), DatasetError> {
        std::fs::create_dir_all(&self.answer_dir)?;
        let path = self.answer_dir.join(format!("answer_{}.json", index));
        write_json(&path, answer)
    }

    async fn fetch_remote(&self, index: usize) -> Result<DatasetExample, DatasetError> {
        let mut request = self.client.get(DATASETS_SERVER_URL).query(&[
            ("dataset", self.dataset.as_str()),
            ("config", self.subset.as_str()),
            ("split", self.split.as_str()),
            ("offset", &index.to_string()),
            ("length", "1"),
        ]);

        if let Some(token) = &self.hf_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        let row = body
            .get("rows")
            .and_then(|rows| rows.get(0))
            .and_then(|entry| entry.get("row"))
            .ok_or_else(|| DatasetError::Shape(format!("no row at offset {}", index)))?;

        Ok(serde_json::from_value(row.clone())?)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DatasetError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DatasetError> {
    let json = serde_json::to_string(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_round_trip() {
        let example = DatasetExample {
            context_window_text: "long context".to_string(),
            question: "what?".to_string(),
        };
        let json = serde_json::to_string(&example).unwrap();
        let back: DatasetExample = serde_json::from_str(&json).unwrap();
        assert_eq!(back.question, "what?");
    }

    #[test]
    fn test_row_shape_parse() {
        let body: serde_json::Value = serde_json::json!({
            "rows": [{"row_idx": 3, "row": {
                "context_window_text": "ctx",
                "question": "q",
                "extra_column": 1
            }}]
        });
        let row = body["rows"][0]["row"].clone();
        let example: DatasetExample = serde_json::from_value(row).unwrap();
        assert_eq!(example.context_window_text, "ctx");
    }

    #[test]
    fn test_cached_answer_shape() {
        let answer = CachedAnswer {
            final_answer: Some("4".to_string()),
            code_and_output: Vec::new(),
        };
        let json = serde_json::to_string(&answer).unwrap();
        assert!(json.contains("\"final_answer\":\"4\""));
        assert!(json.contains("\"code_and_output\":[]"));
    }
}
