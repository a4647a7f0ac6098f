use argon2::{Algorithm, Argon2, Version};
use rand::TryRngCore;
use rand::rngs::OsRng;

use crate::codec::{self, Params};
use crate::config::Config;
use crate::error::{Error, Result};

/// Argon2id with a fixed set of work factors. Shared read-only between the
/// engine and its rehash workers.
#[derive(Debug, Clone)]
pub struct Hasher {
    params: Params,
    key_length: usize,
    salt_length: usize,
}

impl Hasher {
    pub fn new(config: &Config) -> Self {
        Self {
            params: config.params(),
            key_length: config.key_length as usize,
            salt_length: config.salt_length as usize,
        }
    }

    pub fn params(&self) -> Params {
        self.params
    }

    /// Hash a password with a fresh random salt and the configured work factors.
    pub fn hash(&self, password: &str) -> Result<String> {
        if password.is_empty() {
            return Err(Error::Validation("password cannot be empty".to_string()));
        }

        let mut salt = vec![0u8; self.salt_length];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| Error::Randomness(format!("Failed to generate salt: {e}")))?;

        let digest = derive(password.as_bytes(), &salt, &self.params, self.key_length)?;
        Ok(codec::encode(&digest, &salt, &self.params))
    }
}

/// Run Argon2id (v0x13) and return `length` bytes of output.
pub fn derive(password: &[u8], salt: &[u8], params: &Params, length: usize) -> Result<Vec<u8>> {
    let argon2_params = argon2::Params::new(
        params.memory_cost,
        params.time_cost,
        u32::from(params.parallelism),
        Some(length),
    )?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut out = vec![0u8; length];
    argon2.hash_password_into(password, salt, &mut out)?;
    Ok(out)
}
