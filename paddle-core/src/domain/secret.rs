//! Secret bindings injected into pod containers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// An environment variable sourced from a key of a named secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSecret {
    /// Environment variable name
    pub name: String,
    /// Secret object holding the value
    pub store: String,
    /// Key within the secret object
    pub key: String,
}

impl FromStr for PodSecret {
    type Err = DomainError;

    /// Parses the `NAME:STORE:KEY` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [name, store, key] if !name.is_empty() && !store.is_empty() && !key.is_empty() => {
                Ok(Self {
                    name: name.to_string(),
                    store: store.to_string(),
                    key: key.to_string(),
                })
            }
            _ => Err(DomainError::InvalidSecret(s.to_string())),
        }
    }
}

impl fmt::Display for PodSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.store, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secret() {
        let secret: PodSecret = "DB_PASSWORD:postgres:password".parse().unwrap();
        assert_eq!(secret.name, "DB_PASSWORD");
        assert_eq!(secret.store, "postgres");
        assert_eq!(secret.key, "password");
        assert_eq!(secret.to_string(), "DB_PASSWORD:postgres:password");
    }

    #[test]
    fn test_parse_secret_rejects_malformed() {
        for raw in ["", "A:B", "A:B:C:D", "A::C", ":B:C"] {
            assert_eq!(
                raw.parse::<PodSecret>(),
                Err(DomainError::InvalidSecret(raw.to_string()))
            );
        }
    }
}
