use thiserror::Error;

/// Failures reported synchronously at the call site.
///
/// A query that fails here never reaches a handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("No nameservers configured")]
    NoNameservers,

    #[error("Wire format error: {0}")]
    Codec(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DomainError {
    /// Malformed input, as opposed to a resolver that cannot run queries at all.
    pub fn is_invalid_query(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidDomainName(_)
                | DomainError::UnsupportedRecordType(_)
                | DomainError::InvalidIpAddress(_)
        )
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, DomainError::NoNameservers)
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}

/// Network outcome of a lookup, delivered exactly once through a handler.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveError {
    #[error("Query timeout")]
    Timeout,

    #[error("Server failure")]
    ServerFailure,

    #[error("Domain not found (NXDOMAIN)")]
    NxDomain,

    #[error("No data for requested record type")]
    NoData,
}

impl ResolveError {
    /// Authoritative "does not exist" answers; these may be retried under
    /// another search suffix, everything else is an infrastructure problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NxDomain | ResolveError::NoData)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveError::Timeout => "TIMEOUT",
            ResolveError::ServerFailure => "SERVFAIL",
            ResolveError::NxDomain => "NXDOMAIN",
            ResolveError::NoData => "NODATA",
        }
    }
}
