use ferrous_resolver_domain::{DomainError, RecordType, ResolveError, Response};
use serde_json::{json, Value};

/// What became of one name given on the command line.
#[derive(Debug, Clone)]
pub enum Outcome {
    Answer(Response),
    Failed(ResolveError),
    Rejected(DomainError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Answer(_))
    }
}

pub fn render_text(name: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Answer(response) if response.answers.is_empty() => {
            format!(";; {}: empty answer", name)
        }
        Outcome::Answer(response) => {
            let mut lines: Vec<String> = response.answers.iter().map(|r| r.to_string()).collect();
            if response.truncated {
                lines.push(format!(";; {}: answer truncated", name));
            }
            lines.join("\n")
        }
        Outcome::Failed(error) => format!(";; {}: {} ({})", name, error.as_str(), error),
        Outcome::Rejected(error) => format!(";; {}: {}", name, error),
    }
}

pub fn render_json(name: &str, record_type: RecordType, outcome: &Outcome) -> Value {
    match outcome {
        Outcome::Answer(response) => {
            let answers: Vec<Value> = response
                .answers
                .iter()
                .map(|r| {
                    json!({
                        "name": r.name,
                        "type": r.record_type.map(|t| t.as_str()),
                        "ttl": r.ttl,
                        "data": r.data.to_string(),
                    })
                })
                .collect();
            json!({
                "query": name,
                "type": record_type.as_str(),
                "status": "NOERROR",
                "truncated": response.truncated,
                "authoritative": response.authoritative,
                "answers": answers,
            })
        }
        Outcome::Failed(error) => json!({
            "query": name,
            "type": record_type.as_str(),
            "status": error.as_str(),
        }),
        Outcome::Rejected(error) => json!({
            "query": name,
            "type": record_type.as_str(),
            "status": "REJECTED",
            "error": error.to_string(),
        }),
    }
}
