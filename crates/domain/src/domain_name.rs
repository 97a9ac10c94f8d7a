//! Domain name syntax helpers.
//!
//! Names are kept in presentation format (`"www.example.com"`, optionally
//! with a trailing dot) up to the wire codec.

use crate::DomainError;
use std::net::IpAddr;

pub const MAX_NAME_LENGTH: usize = 253;
pub const MAX_LABEL_LENGTH: usize = 63;

/// Checks presentation-format syntax: label lengths, total length and the
/// character set accepted in hostnames and service labels.
pub fn validate(domain: &str) -> Result<(), DomainError> {
    if domain == "." {
        return Ok(());
    }

    let bare = domain.strip_suffix('.').unwrap_or(domain);

    if bare.is_empty() {
        return Err(DomainError::InvalidDomainName("empty name".to_string()));
    }

    if bare.len() > MAX_NAME_LENGTH {
        return Err(DomainError::InvalidDomainName(format!(
            "name exceeds {} characters: {}",
            MAX_NAME_LENGTH, domain
        )));
    }

    for label in bare.split('.') {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName(format!(
                "empty label in {}",
                domain
            )));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(DomainError::InvalidDomainName(format!(
                "label exceeds {} characters in {}",
                MAX_LABEL_LENGTH, domain
            )));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'*')
        {
            return Err(DomainError::InvalidDomainName(format!(
                "invalid character in {}",
                domain
            )));
        }
    }

    Ok(())
}

pub fn is_fully_qualified(domain: &str) -> bool {
    domain.ends_with('.')
}

/// Number of label separators, not counting a trailing root dot.
pub fn count_dots(domain: &str) -> usize {
    let bare = domain.strip_suffix('.').unwrap_or(domain);
    bare.bytes().filter(|b| *b == b'.').count()
}

/// Appends a search suffix to a relative name.
pub fn with_suffix(domain: &str, suffix: &str) -> String {
    let suffix = suffix.trim_matches('.');
    if suffix.is_empty() {
        return domain.to_string();
    }
    format!("{}.{}", domain.trim_end_matches('.'), suffix)
}

pub fn names_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Builds the PTR owner name for an address.
pub fn reverse_name(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            format!("{}.{}.{}.{}.in-addr.arpa.", o[3], o[2], o[1], o[0])
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(73);
            for byte in v6.octets().iter().rev() {
                name.push_str(&format!("{:x}.{:x}.", byte & 0x0f, byte >> 4));
            }
            name.push_str("ip6.arpa.");
            name
        }
    }
}
