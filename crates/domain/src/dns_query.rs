use super::RecordType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Header and EDNS flags sent with a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct Bits {
    pub recursion_desired: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
    /// Sets the DO flag, which requires an EDNS OPT record.
    pub dnssec_ok: bool,
}

impl Bits {
    pub const fn new() -> Self {
        Self {
            recursion_desired: true,
            authentic_data: false,
            checking_disabled: false,
            dnssec_ok: false,
        }
    }

    pub fn with_recursion_desired(mut self, value: bool) -> Self {
        self.recursion_desired = value;
        self
    }

    pub fn with_authentic_data(mut self, value: bool) -> Self {
        self.authentic_data = value;
        self
    }

    pub fn with_checking_disabled(mut self, value: bool) -> Self {
        self.checking_disabled = value;
        self
    }

    pub fn with_dnssec_ok(mut self, value: bool) -> Self {
        self.dnssec_ok = value;
        self
    }
}

impl Default for Bits {
    fn default() -> Self {
        Self::new()
    }
}

/// One lookup request. Never mutated after creation; the search fallback
/// derives a fresh `Query` per candidate name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: Arc<str>,
    pub record_type: RecordType,
    pub bits: Bits,
}

impl Query {
    pub fn new(name: impl Into<Arc<str>>, record_type: RecordType, bits: Bits) -> Self {
        Self {
            name: name.into(),
            record_type,
            bits,
        }
    }

    /// Same type and bits, different owner name.
    pub fn renamed(&self, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            record_type: self.record_type,
            bits: self.bits,
        }
    }
}
