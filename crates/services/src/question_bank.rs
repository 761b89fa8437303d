use std::fmt;
use std::path::PathBuf;

use rand::rng;
use rand::seq::SliceRandom;
use reqwest::{Client, Url};
use study_core::model::question::validate_set;
use study_core::model::{Question, Subject};
use tracing::{debug, warn};

use crate::error::QuestionBankError;

/// Where subject banks (`<subject>.json`) are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    /// An HTTP(S) base URL.
    Remote(Url),
    /// A local directory.
    Directory(PathBuf),
}

impl BankSource {
    /// Interpret `raw` as a URL when it has an `http`/`https` scheme, and as a
    /// directory path otherwise.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Self::Remote(url);
            }
        }
        Self::Directory(PathBuf::from(trimmed))
    }

    fn bank_location(&self, subject: &Subject) -> String {
        let file = format!("{}.json", subject.as_str());
        match self {
            Self::Remote(base) => format!("{}/{file}", base.as_str().trim_end_matches('/')),
            Self::Directory(dir) => dir.join(file).display().to_string(),
        }
    }
}

impl fmt::Display for BankSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{url}"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Loads and checks question banks.
#[derive(Clone)]
pub struct QuestionBankService {
    client: Client,
    source: BankSource,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(source: BankSource) -> Self {
        Self {
            client: Client::new(),
            source,
        }
    }

    #[must_use]
    pub fn source(&self) -> &BankSource {
        &self.source
    }

    /// Fetch the bank for `subject` and check every question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError` when the bank cannot be fetched or parsed,
    /// holds no questions, or contains a question that fails validation.
    pub async fn load(&self, subject: &Subject) -> Result<Vec<Question>, QuestionBankError> {
        let location = self.source.bank_location(subject);
        let raw = match &self.source {
            BankSource::Remote(_) => self.fetch(&location).await?,
            BankSource::Directory(_) => {
                tokio::fs::read_to_string(&location)
                    .await
                    .map_err(|source| QuestionBankError::Io {
                        path: PathBuf::from(&location),
                        source,
                    })?
            }
        };

        let questions: Vec<Question> = serde_json::from_str(&raw)?;
        if questions.is_empty() {
            return Err(QuestionBankError::Empty {
                subject: subject.clone(),
            });
        }

        let errors = validate_set(&questions);
        if !errors.is_empty() {
            for error in &errors {
                warn!(subject = %subject, %error, "invalid question");
            }
            return Err(QuestionBankError::InvalidQuestions {
                subject: subject.clone(),
                errors,
            });
        }

        for error in questions.iter().filter_map(Question::letter_mismatch) {
            warn!(subject = %subject, %error, "correctLetter ignored");
        }

        debug!(subject = %subject, %location, count = questions.len(), "question bank loaded");
        Ok(questions)
    }

    async fn fetch(&self, url: &str) -> Result<String, QuestionBankError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(QuestionBankError::HttpStatus(response.status()));
        }
        Ok(response.text().await?)
    }
}

/// Up to `count` questions picked at random, without repeats.
#[must_use]
pub fn sample(questions: &[Question], count: usize) -> Vec<Question> {
    let mut picked = questions.to_vec();
    picked.shuffle(&mut rng());
    picked.truncate(count);
    picked
}
