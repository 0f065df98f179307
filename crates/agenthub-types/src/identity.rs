//! Identity types for AgentHub
//!
//! All identity types are strongly typed wrappers around strings to prevent
//! accidental mixing of different ID types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from an existing string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Borrow the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

/// Macro for ids minted by the system rather than chosen by a participant
macro_rules! define_generated_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::new_v4().simple()))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id_type!(AgentId, "Identifier of a marketplace participant (buyer, seller, or validator)");
define_id_type!(ContractId, "Identifier of an escrow contract");
define_id_type!(JobId, "Identifier of a job posting");

define_generated_id!(ContractId, "contract");
define_generated_id!(JobId, "job");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_prefixed() {
        let contract = ContractId::new();
        assert!(contract.as_str().starts_with("contract_"));
        assert_eq!(contract.as_str().len(), "contract_".len() + 32);

        let job = JobId::new();
        assert!(job.as_str().starts_with("job_"));
        assert_eq!(job.as_str().len(), "job_".len() + 32);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..10_000).map(|_| ContractId::new()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_agent_id_serializes_as_plain_string() {
        let id = AgentId::from("ResearchBot");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ResearchBot\"");
        assert_eq!(id.to_string(), "ResearchBot");
    }
}
