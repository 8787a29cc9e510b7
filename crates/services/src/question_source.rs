use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use quiz_core::model::{Question, QuestionDraft};
use storage::repository::QuestionRepository;

use crate::error::QuestionSourceError;

/// Where the quiz loads its question bank from.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the full question bank.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError` if the bank cannot be reached or read.
    async fn fetch_bank(&self) -> Result<Vec<Question>, QuestionSourceError>;
}

/// Question bank backed by a storage repository.
#[derive(Clone)]
pub struct RepositorySource {
    repo: Arc<dyn QuestionRepository>,
}

impl RepositorySource {
    #[must_use]
    pub fn new(repo: Arc<dyn QuestionRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl QuestionSource for RepositorySource {
    async fn fetch_bank(&self) -> Result<Vec<Question>, QuestionSourceError> {
        Ok(self.repo.fetch_questions().await?)
    }
}

/// Question bank served as a JSON array over HTTP.
///
/// Entries that do not parse or validate are skipped with a warning; the rest of
/// the bank is still usable.
#[derive(Clone, Debug)]
pub struct RemoteQuestionSource {
    client: Client,
    url: String,
}

impl RemoteQuestionSource {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    #[must_use]
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuestionSource for RemoteQuestionSource {
    async fn fetch_bank(&self) -> Result<Vec<Question>, QuestionSourceError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(QuestionSourceError::HttpStatus(response.status()));
        }

        let entries: Vec<Value> = response.json().await?;
        Ok(parse_bank(entries))
    }
}

/// Keep every entry that is a valid question, in order.
fn parse_bank(entries: Vec<Value>) -> Vec<Question> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let draft: QuestionDraft = match serde_json::from_value(entry) {
                Ok(draft) => draft,
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping malformed question");
                    return None;
                }
            };
            match draft.validate() {
                Ok(question) => Some(question),
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping invalid question");
                    None
                }
            }
        })
        .collect()
}
