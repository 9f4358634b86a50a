use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Sign,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Sign => "SIGN",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "SIGN" => Ok(AuditAction::Sign),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(format!("unknown audit action {}", other)),
        }
    }
}

/// One row of the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Assigned by the store; zero until persisted
    pub id: i64,
    pub username: String,
    pub action: AuditAction,
    pub entity: String,
    pub entity_id: String,
    pub details: String,
    pub created_at: i64,
}

impl AuditEntry {
    pub const DECLARATION: &'static str = "DECLARATION";

    pub fn new(username: &str, action: AuditAction, entity: &str, entity_id: &str, details: String) -> Self {
        Self {
            id: 0,
            username: username.to_string(),
            action,
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            details,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn for_declaration(username: &str, action: AuditAction, declaration_id: &str, details: String) -> Self {
        Self::new(username, action, Self::DECLARATION, declaration_id, details)
    }
}
