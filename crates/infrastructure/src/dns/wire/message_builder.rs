//! DNS Message Builder
//!
//! Constructs query messages in wire format using `hickory-proto`.

use super::record_type_map::RecordTypeMapper;
use ferrous_resolver_domain::{DomainError, Query};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query as HickoryQuery};
use hickory_proto::rr::{DNSClass, Name};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// UDP payload size advertised when EDNS is attached.
pub const EDNS_PAYLOAD_SIZE: u16 = 1232;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a query message with the given transaction id.
    ///
    /// The header bits come from the query. An OPT record is only added
    /// when the DO bit is requested.
    pub fn build_query(id: u16, query: &Query) -> Result<Vec<u8>, DomainError> {
        let name = Name::from_str(&query.name).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", query.name, e))
        })?;

        let mut question =
            HickoryQuery::query(name, RecordTypeMapper::to_hickory(&query.record_type));
        question.set_query_class(DNSClass::IN);

        let bits = query.bits;
        let mut message = Message::new();
        message.set_id(id);
        message.set_message_type(MessageType::Query);
        message.set_op_code(OpCode::Query);
        message.set_recursion_desired(bits.recursion_desired);
        message.set_authentic_data(bits.authentic_data);
        message.set_checking_disabled(bits.checking_disabled);
        message.add_query(question);

        if bits.dnssec_ok {
            let mut edns = Edns::new();
            edns.set_max_payload(EDNS_PAYLOAD_SIZE);
            edns.set_dnssec_ok(true);
            message.set_edns(edns);
        }

        Self::serialize_message(&message)
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message
            .emit(&mut encoder)
            .map_err(|e| DomainError::Codec(format!("Failed to serialize DNS message: {}", e)))?;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_resolver_domain::{Bits, RecordType};

    fn query(name: &str, record_type: RecordType, bits: Bits) -> Query {
        Query::new(name, record_type, bits)
    }

    #[test]
    fn test_build_a_query() {
        let bytes =
            MessageBuilder::build_query(0x1234, &query("google.com", RecordType::A, Bits::default()))
                .unwrap();

        // Header is 12 bytes, plus the question.
        assert!(bytes.len() > 12);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 0x1234);
        // QR=0, RD=1
        assert_eq!(bytes[2] & 0x80, 0);
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
        // ARCOUNT = 0 without DO
        assert_eq!(&bytes[10..12], &[0, 0]);
    }

    #[test]
    fn test_header_bits_follow_query() {
        let bits = Bits::default()
            .with_recursion_desired(false)
            .with_checking_disabled(true)
            .with_authentic_data(true);
        let bytes =
            MessageBuilder::build_query(1, &query("example.com", RecordType::AAAA, bits)).unwrap();

        assert_eq!(bytes[2] & 0x01, 0, "RD flag should be clear");
        assert_eq!(bytes[3] & 0x10, 0x10, "CD flag should be set");
        assert_eq!(bytes[3] & 0x20, 0x20, "AD flag should be set");
    }

    #[test]
    fn test_dnssec_ok_adds_opt_record() {
        let bits = Bits::default().with_dnssec_ok(true);
        let bytes =
            MessageBuilder::build_query(7, &query("example.com", RecordType::DNSKEY, bits)).unwrap();

        // ARCOUNT = 1, then the OPT record closes the message:
        // root name, type 41, payload size, extended rcode, version, flags, rdlen.
        assert_eq!(&bytes[10..12], &[0, 1]);
        let opt = &bytes[bytes.len() - 11..];
        assert_eq!(&opt[..3], &[0, 0, 41]);
        assert_eq!(u16::from_be_bytes([opt[3], opt[4]]), EDNS_PAYLOAD_SIZE);
        assert_eq!(opt[7] & 0x80, 0x80, "DO bit should be set");
    }

    #[test]
    fn test_all_record_types_build() {
        let types = [
            RecordType::A,
            RecordType::AAAA,
            RecordType::MX,
            RecordType::TXT,
            RecordType::SOA,
            RecordType::NS,
            RecordType::CNAME,
            RecordType::SRV,
            RecordType::CAA,
            RecordType::ANY,
        ];

        for rt in types {
            let result = MessageBuilder::build_query(1, &query("example.com", rt, Bits::default()));
            assert!(result.is_ok(), "Failed to build query for {:?}", rt);
        }
    }

    #[test]
    fn test_overlong_label_is_rejected() {
        let name = format!("{}.com", "a".repeat(70));
        let result = MessageBuilder::build_query(1, &query(&name, RecordType::A, Bits::default()));
        assert!(matches!(result, Err(DomainError::InvalidDomainName(_))));
    }
}
