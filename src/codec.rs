//! Self-describing text form of a derived key.
//!
//! `$argon2id$v=19$m=<memory>,t=<time>,p=<lanes>$<salt>$<digest>`, with salt and
//! digest in standard base64 without padding.

use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;

use crate::error::{Error, Result};

pub const ALGORITHM: &str = "argon2id";
pub const VERSION: u32 = 19;

/// Largest accepted memory cost: 4 GiB in KiB. Stored hashes above this are
/// rejected before any memory is allocated for them.
pub const MAX_MEMORY_COST: u32 = 4 * 1024 * 1024;
/// Largest accepted number of passes.
pub const MAX_TIME_COST: u32 = 1024;

const DELIMITER: char = '$';
const FIELD_COUNT: usize = 6;

/// Work factors carried inside an encoded hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Params {
    /// Working memory in KiB.
    pub memory_cost: u32,
    /// Number of passes over memory.
    pub time_cost: u32,
    /// Lane count.
    pub parallelism: u8,
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m={},t={},p={}",
            self.memory_cost, self.time_cost, self.parallelism
        )
    }
}

impl FromStr for Params {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.split(',');
        let memory_cost = parse_field(fields.next(), "m")?;
        let time_cost = parse_field(fields.next(), "t")?;
        let parallelism = parse_field(fields.next(), "p")?;

        if fields.next().is_some() {
            return Err(Error::Format(format!("unexpected trailing parameters in '{s}'")));
        }

        if memory_cost > MAX_MEMORY_COST {
            return Err(Error::Format(format!(
                "memory cost {memory_cost} KiB exceeds the {MAX_MEMORY_COST} KiB limit"
            )));
        }
        if time_cost > MAX_TIME_COST {
            return Err(Error::Format(format!(
                "time cost {time_cost} exceeds the limit of {MAX_TIME_COST}"
            )));
        }

        Ok(Params {
            memory_cost,
            time_cost,
            parallelism,
        })
    }
}

/// Parse one `key=<positive integer>` entry of the parameter field.
fn parse_field<T>(field: Option<&str>, key: &str) -> Result<T>
where
    T: FromStr + PartialEq + Default,
{
    let field = field.ok_or_else(|| Error::Format(format!("missing parameter '{key}'")))?;
    let value = field
        .strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| Error::Format(format!("expected '{key}=<n>', got '{field}'")))?;

    // `u32::from_str` accepts a leading '+', the format does not.
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Format(format!("non-numeric parameter '{field}'")));
    }

    let parsed: T = value
        .parse()
        .map_err(|_| Error::Format(format!("parameter out of range '{field}'")))?;
    if parsed == T::default() {
        return Err(Error::Format(format!("parameter must be positive '{field}'")));
    }
    Ok(parsed)
}

/// Everything recovered from an encoded hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHash {
    pub algorithm: String,
    pub version: String,
    pub params: Params,
    pub salt: Vec<u8>,
    pub digest: Vec<u8>,
}

pub fn encode(digest: &[u8], salt: &[u8], params: &Params) -> String {
    format!(
        "${ALGORITHM}$v={VERSION}${params}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest),
    )
}

/// Parse an encoded hash. Only the structure is checked; tag and version are
/// returned as-is.
pub fn decode(text: &str) -> Result<DecodedHash> {
    let parts: Vec<&str> = text.split(DELIMITER).collect();
    if parts.len() != FIELD_COUNT {
        return Err(Error::Format(format!(
            "expected {FIELD_COUNT} '{DELIMITER}'-separated fields, got {}",
            parts.len()
        )));
    }
    if !parts[0].is_empty() {
        return Err(Error::Format(format!("hash must start with '{DELIMITER}'")));
    }
    if parts[1].is_empty() {
        return Err(Error::Format("missing algorithm tag".to_string()));
    }

    let params: Params = parts[3].parse()?;
    let salt = STANDARD_NO_PAD.decode(parts[4])?;
    let digest = STANDARD_NO_PAD.decode(parts[5])?;

    if salt.is_empty() || digest.is_empty() {
        return Err(Error::Format("salt and digest must not be empty".to_string()));
    }

    Ok(DecodedHash {
        algorithm: parts[1].to_string(),
        version: parts[2].to_string(),
        params,
        salt,
        digest,
    })
}
