//! Ferrous Resolver Domain Layer
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod dns_response;
pub mod domain_name;
pub mod errors;

pub use config::{CliOverrides, Config, ConfigError, LoggingConfig, ResolverConfig};
pub use dns_query::{Bits, Query};
pub use dns_record::{RecordData, RecordType, ResourceRecord};
pub use dns_response::{Question, Response};
pub use errors::{DomainError, ResolveError};
