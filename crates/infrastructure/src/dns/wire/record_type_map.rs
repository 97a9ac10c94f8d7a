//! Mapping between `ferrous_resolver_domain::RecordType` and `hickory_proto::rr::RecordType`.

use ferrous_resolver_domain::RecordType;
use hickory_proto::rr::RecordType as HickoryRecordType;

pub struct RecordTypeMapper;

impl RecordTypeMapper {
    /// Convert domain RecordType → hickory RecordType (for building queries)
    pub fn to_hickory(record_type: &RecordType) -> HickoryRecordType {
        match record_type {
            // Basic records
            RecordType::A => HickoryRecordType::A,
            RecordType::AAAA => HickoryRecordType::AAAA,
            RecordType::CNAME => HickoryRecordType::CNAME,
            RecordType::MX => HickoryRecordType::MX,
            RecordType::TXT => HickoryRecordType::TXT,
            RecordType::PTR => HickoryRecordType::PTR,
            RecordType::NS => HickoryRecordType::NS,
            RecordType::SOA => HickoryRecordType::SOA,

            // Service and naming records
            RecordType::SRV => HickoryRecordType::SRV,
            RecordType::NAPTR => HickoryRecordType::NAPTR,
            RecordType::HINFO => HickoryRecordType::HINFO,
            RecordType::SVCB => HickoryRecordType::SVCB,
            RecordType::HTTPS => HickoryRecordType::HTTPS,

            // Security records
            RecordType::CAA => HickoryRecordType::CAA,
            RecordType::TLSA => HickoryRecordType::TLSA,
            RecordType::SSHFP => HickoryRecordType::SSHFP,
            RecordType::DS => HickoryRecordType::DS,
            RecordType::DNSKEY => HickoryRecordType::DNSKEY,

            // Meta types
            RecordType::OPT => HickoryRecordType::OPT,
            RecordType::ANY => HickoryRecordType::ANY,
        }
    }

    /// Convert hickory RecordType → domain RecordType (for parsed records)
    ///
    /// Returns `None` for types the domain layer does not name.
    pub fn from_hickory(hickory_type: HickoryRecordType) -> Option<RecordType> {
        RecordType::from_u16(u16::from(hickory_type))
    }
}
