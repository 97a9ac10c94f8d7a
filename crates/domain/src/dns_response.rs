use super::{RecordType, ResourceRecord};
use crate::domain_name;

/// Question section of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub record_type: Option<RecordType>,
}

impl Question {
    pub fn new(name: impl Into<String>, record_type: Option<RecordType>) -> Self {
        Self {
            name: name.into(),
            record_type,
        }
    }

    /// Case-insensitive name comparison, trailing dot ignored.
    pub fn matches(&self, name: &str, record_type: RecordType) -> bool {
        self.record_type == Some(record_type) && domain_name::names_equal(&self.name, name)
    }
}

/// Parsed answer handed to a successful handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub question: Question,

    pub answers: Vec<ResourceRecord>,

    pub authority: Vec<ResourceRecord>,

    pub additional: Vec<ResourceRecord>,

    pub authoritative: bool,

    pub truncated: bool,

    pub authentic_data: bool,
}

impl Response {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            answers: vec![],
            authority: vec![],
            additional: vec![],
            authoritative: false,
            truncated: false,
            authentic_data: false,
        }
    }

    pub fn with_answers(mut self, answers: Vec<ResourceRecord>) -> Self {
        self.answers = answers;
        self
    }

    /// Answers of the requested type, skipping CNAME chains and the like.
    pub fn records_of(&self, record_type: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.answers.iter().filter(move |r| r.is_type(record_type))
    }

    pub fn min_ttl(&self) -> Option<u32> {
        self.answers.iter().map(|r| r.ttl).min()
    }
}
