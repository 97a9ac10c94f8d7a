use super::record_type_map::RecordTypeMapper;
use ferrous_resolver_application::ports::{ParsedResponse, ResponseClass};
use ferrous_resolver_domain::{DomainError, Question, RecordData, ResourceRecord, Response};
use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::{RData, Record};
use hickory_proto::serialize::binary::BinEncodable;
use tracing::debug;

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<ParsedResponse, DomainError> {
        let message = Message::from_vec(response_bytes)
            .map_err(|e| DomainError::Codec(format!("Failed to parse DNS response: {}", e)))?;

        if message.message_type() != MessageType::Response {
            return Err(DomainError::Codec(
                "Received a query where a response was expected".to_string(),
            ));
        }

        let question = message.queries().first().map(|q| {
            Question::new(
                q.name().to_utf8(),
                RecordTypeMapper::from_hickory(q.query_type()),
            )
        });

        let rcode = message.response_code();
        let truncated = message.truncated();
        let answers = Self::convert_records(message.answers());
        let class = Self::classify(rcode, !answers.is_empty());

        let mut response = Response::new(
            question
                .clone()
                .unwrap_or_else(|| Question::new(String::new(), None)),
        );
        response.answers = answers;
        response.authority = Self::convert_records(message.name_servers());
        response.additional = Self::convert_records(message.additionals());
        response.authoritative = message.authoritative();
        response.authentic_data = message.authentic_data();
        response.truncated = truncated;

        debug!(
            rcode = ?rcode,
            answers = response.answers.len(),
            authority = response.authority.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(ParsedResponse {
            id: message.id(),
            question,
            truncated,
            class,
            response,
        })
    }

    /// NOERROR without answers is NODATA; every rcode other than NOERROR
    /// and NXDOMAIN counts as a server failure.
    pub fn classify(rcode: ResponseCode, has_answers: bool) -> ResponseClass {
        match rcode {
            ResponseCode::NoError if has_answers => ResponseClass::Success,
            ResponseCode::NoError => ResponseClass::NoData,
            ResponseCode::NXDomain => ResponseClass::NxDomain,
            _ => ResponseClass::ServerFailure,
        }
    }

    fn convert_records(records: &[Record]) -> Vec<ResourceRecord> {
        records
            .iter()
            .map(|record| {
                ResourceRecord::new(
                    record.name().to_utf8(),
                    RecordTypeMapper::from_hickory(record.record_type()),
                    record.ttl(),
                    Self::convert_data(record.data()),
                )
            })
            .collect()
    }

    fn convert_data(data: &RData) -> RecordData {
        match data {
            RData::A(a) => RecordData::A(a.0),
            RData::AAAA(aaaa) => RecordData::Aaaa(aaaa.0),
            RData::CNAME(canonical) => RecordData::Name(canonical.to_utf8()),
            RData::NS(ns) => RecordData::Name(ns.to_utf8()),
            RData::PTR(ptr) => RecordData::Name(ptr.to_utf8()),
            RData::MX(mx) => RecordData::Mx {
                preference: mx.preference(),
                exchange: mx.exchange().to_utf8(),
            },
            RData::TXT(txt) => RecordData::Txt(
                txt.txt_data()
                    .iter()
                    .map(|part| String::from_utf8_lossy(part).into_owned())
                    .collect(),
            ),
            RData::SRV(srv) => RecordData::Srv {
                priority: srv.priority(),
                weight: srv.weight(),
                port: srv.port(),
                target: srv.target().to_utf8(),
            },
            other => RecordData::Other(other.to_bytes().unwrap_or_default()),
        }
    }
}
