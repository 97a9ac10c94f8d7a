use super::RecordType;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Decoded payload of a resource record.
///
/// Only the types a stub resolver commonly hands back are decoded; anything
/// else keeps its raw rdata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    /// CNAME, NS and PTR targets.
    Name(String),
    Mx { preference: u16, exchange: String },
    Txt(Vec<String>),
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    Other(Vec<u8>),
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(ip) => write!(f, "{}", ip),
            RecordData::Aaaa(ip) => write!(f, "{}", ip),
            RecordData::Name(name) => write!(f, "{}", name),
            RecordData::Mx {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RecordData::Txt(parts) => {
                let quoted: Vec<String> = parts.iter().map(|p| format!("\"{}\"", p)).collect();
                write!(f, "{}", quoted.join(" "))
            }
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            RecordData::Other(bytes) => write!(f, "\\# {}", bytes.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,

    /// `None` for types this crate has no enum variant for.
    pub record_type: Option<RecordType>,

    pub ttl: u32,

    pub data: RecordData,
}

impl ResourceRecord {
    pub fn new(
        name: impl Into<String>,
        record_type: Option<RecordType>,
        ttl: u32,
        data: RecordData,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            data,
        }
    }

    pub fn is_type(&self, record_type: RecordType) -> bool {
        self.record_type == Some(record_type)
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rtype = self.record_type.map(|t| t.as_str()).unwrap_or("TYPE?");
        write!(f, "{}\t{}\tIN\t{}\t{}", self.name, self.ttl, rtype, self.data)
    }
}
