use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown signer role: {0}")]
pub struct UnknownRole(pub String);

/// Party signing a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    Sender,
    Carrier,
}

impl SignerRole {
    pub const ALL: [SignerRole; 2] = [SignerRole::Sender, SignerRole::Carrier];

    /// Literal used in signing links and the REST API
    pub fn as_str(&self) -> &'static str {
        match self {
            SignerRole::Sender => "sender",
            SignerRole::Carrier => "carrier",
        }
    }

    /// Name of the declaration field holding this role's signature
    pub fn field_name(&self) -> &'static str {
        match self {
            SignerRole::Sender => "signatureSender",
            SignerRole::Carrier => "signatureCarrier",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignerRole::Sender => "Sender",
            SignerRole::Carrier => "Driver",
        }
    }
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignerRole {
    type Err = UnknownRole;

    // Exact match only: "Sender" or " carrier" are not valid link segments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sender" => Ok(SignerRole::Sender),
            "carrier" => Ok(SignerRole::Carrier),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
