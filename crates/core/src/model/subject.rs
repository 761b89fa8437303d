use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject key cannot be empty")]
    Empty,

    #[error("subject key cannot contain whitespace: {0:?}")]
    Whitespace(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog must list at least one subject")]
    NoSubjects,

    #[error("subject listed twice: {0}")]
    Duplicate(Subject),

    #[error("questions per subject must be > 0")]
    NoQuestions,
}

//
// ─── SUBJECT ───────────────────────────────────────────────────────────────────
//

/// Key of a topic area such as `math` or `science`.
///
/// Keys are trimmed and may not contain inner whitespace; they appear as
/// object keys in the stored documents and as file stems of question banks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
    /// Create a validated subject key.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError` if the key is empty or contains whitespace.
    pub fn new(key: impl Into<String>) -> Result<Self, SubjectError> {
        let raw = key.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubjectError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(SubjectError::Whitespace(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Subject {
    type Error = SubjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Display metadata for a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectInfo {
    pub subject: Subject,
    pub name: String,
    pub icon: String,
}

const FALLBACK_ICON: &str = "📝";

/// The subjects a deployment knows about and how many questions each holds.
///
/// Every catalog subject gets a zeroed counters entry when storage is
/// initialized, and the overall total is `subjects × questions_per_subject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCatalog {
    subjects: Vec<SubjectInfo>,
    questions_per_subject: u32,
}

impl SubjectCatalog {
    /// Build a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for an empty list, a repeated subject, or zero
    /// questions per subject.
    pub fn new(
        subjects: Vec<SubjectInfo>,
        questions_per_subject: u32,
    ) -> Result<Self, CatalogError> {
        if subjects.is_empty() {
            return Err(CatalogError::NoSubjects);
        }
        if questions_per_subject == 0 {
            return Err(CatalogError::NoQuestions);
        }
        let mut seen = BTreeSet::new();
        for info in &subjects {
            if !seen.insert(&info.subject) {
                return Err(CatalogError::Duplicate(info.subject.clone()));
            }
        }
        Ok(Self {
            subjects,
            questions_per_subject,
        })
    }

    /// The four-subject GED study guide: 100 questions each.
    #[must_use]
    pub fn ged() -> Self {
        let entries = [
            ("math", "Mathematics", "📊"),
            ("rla", "Reasoning Through Language Arts", "📚"),
            ("science", "Science", "🔬"),
            ("social", "Social Studies", "🌍"),
        ];
        let subjects = entries
            .into_iter()
            .map(|(key, name, icon)| SubjectInfo {
                subject: Subject(key.to_string()),
                name: name.to_string(),
                icon: icon.to_string(),
            })
            .collect();
        Self {
            subjects,
            questions_per_subject: 100,
        }
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter().map(|info| &info.subject)
    }

    #[must_use]
    pub fn entries(&self) -> &[SubjectInfo] {
        &self.subjects
    }

    /// Display metadata for `subject`; unknown subjects use their key as name.
    #[must_use]
    pub fn info(&self, subject: &Subject) -> SubjectInfo {
        self.subjects
            .iter()
            .find(|info| &info.subject == subject)
            .cloned()
            .unwrap_or_else(|| SubjectInfo {
                subject: subject.clone(),
                name: subject.as_str().to_string(),
                icon: FALLBACK_ICON.to_string(),
            })
    }

    #[must_use]
    pub fn questions_per_subject(&self) -> u32 {
        self.questions_per_subject
    }

    /// Expected number of questions across every subject.
    #[must_use]
    pub fn expected_total(&self) -> u32 {
        let count = u32::try_from(self.subjects.len()).unwrap_or(u32::MAX);
        count.saturating_mul(self.questions_per_subject)
    }
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self::ged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(key: &str) -> SubjectInfo {
        SubjectInfo {
            subject: Subject::new(key).unwrap(),
            name: key.to_uppercase(),
            icon: "*".into(),
        }
    }

    #[test]
    fn subject_keys_are_trimmed() {
        assert_eq!(Subject::new("  math ").unwrap().as_str(), "math");
        assert_eq!(Subject::new("   ").unwrap_err(), SubjectError::Empty);
        assert!(matches!(
            Subject::new("social studies"),
            Err(SubjectError::Whitespace(_))
        ));
    }

    #[test]
    fn ged_catalog_expects_four_hundred_questions() {
        let catalog = SubjectCatalog::ged();
        assert_eq!(catalog.subjects().count(), 4);
        assert_eq!(catalog.expected_total(), 400);
        let rla = Subject::new("rla").unwrap();
        assert_eq!(catalog.info(&rla).name, "Reasoning Through Language Arts");
    }

    #[test]
    fn unknown_subject_info_falls_back_to_key() {
        let catalog = SubjectCatalog::ged();
        let art = Subject::new("art").unwrap();
        assert!(catalog.subjects().all(|known| known != &art));
        let fallback = catalog.info(&art);
        assert_eq!(fallback.name, "art");
        assert_eq!(fallback.icon, FALLBACK_ICON);
    }

    #[test]
    fn catalog_construction_is_validated() {
        assert_eq!(
            SubjectCatalog::new(vec![], 10).unwrap_err(),
            CatalogError::NoSubjects
        );
        assert_eq!(
            SubjectCatalog::new(vec![info("a")], 0).unwrap_err(),
            CatalogError::NoQuestions
        );
        assert!(matches!(
            SubjectCatalog::new(vec![info("a"), info("a")], 5),
            Err(CatalogError::Duplicate(_))
        ));
        let catalog = SubjectCatalog::new(vec![info("a"), info("b")], 25).unwrap();
        assert_eq!(catalog.expected_total(), 50);
    }
}
