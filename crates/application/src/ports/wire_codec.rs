use ferrous_resolver_domain::{DomainError, Query, Question, Response};

/// How a decoded response settles the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    NxDomain,
    NoData,
    ServerFailure,
}

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub id: u16,

    pub question: Option<Question>,

    pub truncated: bool,

    pub class: ResponseClass,

    pub response: Response,
}

/// Turns queries into request packets and response packets into records.
pub trait WireCodec {
    fn encode(&self, id: u16, query: &Query) -> Result<Vec<u8>, DomainError>;

    fn decode(&self, payload: &[u8]) -> Result<ParsedResponse, DomainError>;
}
