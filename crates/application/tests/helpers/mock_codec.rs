use ferrous_resolver_application::ports::{ParsedResponse, ResponseClass, WireCodec};
use ferrous_resolver_domain::{
    DomainError, Query, Question, RecordData, RecordType, ResourceRecord, Response,
};
use std::net::Ipv4Addr;

/// Text codec: queries are `id|name|type`, replies
/// `id|name|type|class|tc|answers` with comma separated IPv4 answers.
pub struct MockCodec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentQuery {
    pub id: u16,
    pub name: String,
    pub record_type: RecordType,
}

impl SentQuery {
    pub fn parse(payload: &[u8]) -> Self {
        let text = std::str::from_utf8(payload).unwrap();
        let mut parts = text.split('|');
        let id = parts.next().unwrap().parse().unwrap();
        let name = parts.next().unwrap().to_string();
        let record_type = parts.next().unwrap().parse().unwrap();
        Self {
            id,
            name,
            record_type,
        }
    }
}

impl WireCodec for MockCodec {
    fn encode(&self, id: u16, query: &Query) -> Result<Vec<u8>, DomainError> {
        Ok(format!("{}|{}|{}", id, query.name, query.record_type).into_bytes())
    }

    fn decode(&self, payload: &[u8]) -> Result<ParsedResponse, DomainError> {
        let malformed = || DomainError::Codec("malformed reply".to_string());
        let text = std::str::from_utf8(payload).map_err(|_| malformed())?;
        let parts: Vec<&str> = text.split('|').collect();
        if parts.len() != 6 {
            return Err(malformed());
        }

        let id: u16 = parts[0].parse().map_err(|_| malformed())?;
        let record_type: RecordType = parts[2].parse().map_err(|_| malformed())?;
        let class = match parts[3] {
            "ok" => ResponseClass::Success,
            "nxdomain" => ResponseClass::NxDomain,
            "nodata" => ResponseClass::NoData,
            "servfail" => ResponseClass::ServerFailure,
            _ => return Err(malformed()),
        };
        let truncated = parts[4] == "tc";
        let answers = parts[5]
            .split(',')
            .filter(|a| !a.is_empty())
            .map(|a| {
                let ip: Ipv4Addr = a.parse().map_err(|_| malformed())?;
                Ok(ResourceRecord::new(
                    parts[1],
                    Some(RecordType::A),
                    300,
                    RecordData::A(ip),
                ))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let question = Question::new(parts[1], Some(record_type));
        let mut response = Response::new(question.clone()).with_answers(answers);
        response.truncated = truncated;
        Ok(ParsedResponse {
            id,
            question: Some(question),
            truncated,
            class,
            response,
        })
    }
}

/// Builds a reply in the mock wire format, by default a positive answer to
/// the given query.
#[derive(Debug, Clone)]
pub struct Reply {
    pub id: u16,
    pub name: String,
    pub record_type: RecordType,
    pub class: &'static str,
    pub truncated: bool,
    pub answers: Vec<Ipv4Addr>,
}

impl Reply {
    pub fn to(payload: &[u8]) -> Self {
        let query = SentQuery::parse(payload);
        Self {
            id: query.id,
            name: query.name,
            record_type: query.record_type,
            class: "ok",
            truncated: false,
            answers: vec![Ipv4Addr::new(93, 184, 216, 34)],
        }
    }

    pub fn answer(mut self, ip: Ipv4Addr) -> Self {
        self.answers = vec![ip];
        self
    }

    pub fn nxdomain(mut self) -> Self {
        self.class = "nxdomain";
        self.answers.clear();
        self
    }

    pub fn nodata(mut self) -> Self {
        self.class = "nodata";
        self.answers.clear();
        self
    }

    pub fn servfail(mut self) -> Self {
        self.class = "servfail";
        self.answers.clear();
        self
    }

    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    pub fn with_id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let answers: Vec<String> = self.answers.iter().map(|a| a.to_string()).collect();
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.id,
            self.name,
            self.record_type,
            self.class,
            if self.truncated { "tc" } else { "-" },
            answers.join(",")
        )
        .into_bytes()
    }
}
