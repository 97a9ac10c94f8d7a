//! Wire format for the resolver core, backed by `hickory-proto`.

pub mod message_builder;
pub mod record_type_map;
pub mod response_parser;

pub use message_builder::{MessageBuilder, EDNS_PAYLOAD_SIZE};
pub use record_type_map::RecordTypeMapper;
pub use response_parser::ResponseParser;

use ferrous_resolver_application::ports::{ParsedResponse, WireCodec};
use ferrous_resolver_domain::{DomainError, Query};

#[derive(Debug, Clone, Copy, Default)]
pub struct HickoryCodec;

impl WireCodec for HickoryCodec {
    fn encode(&self, id: u16, query: &Query) -> Result<Vec<u8>, DomainError> {
        MessageBuilder::build_query(id, query)
    }

    fn decode(&self, payload: &[u8]) -> Result<ParsedResponse, DomainError> {
        ResponseParser::parse(payload)
    }
}
