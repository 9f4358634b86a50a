use crate::domain::{AuditAction, AuditEntry, Declaration, SignerRole};
use crate::infrastructure::database::{DatabaseError, DeclarationRepository, SaveKind};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("Declaration id cannot be empty")]
    EmptyId,

    #[error("Declaration number cannot be empty")]
    EmptyNumber,

    #[error("Declaration not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DatabaseError> for DeclarationError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound => DeclarationError::NotFound,
            other => DeclarationError::DatabaseError(other.to_string()),
        }
    }
}

/// Persistence gateway: full-replace upsert plus audit trail
pub struct SaveDeclarationUseCase<'a> {
    repository: &'a dyn DeclarationRepository,
}

impl<'a> SaveDeclarationUseCase<'a> {
    pub fn new(repository: &'a dyn DeclarationRepository) -> Self {
        Self { repository }
    }

    pub fn execute(&self, decl: &Declaration, username: &str) -> Result<SaveKind, DeclarationError> {
        if decl.id.trim().is_empty() {
            return Err(DeclarationError::EmptyId);
        }
        if decl.number.trim().is_empty() {
            return Err(DeclarationError::EmptyNumber);
        }

        let previous = match self.repository.find_by_id(&decl.id) {
            Ok(found) => Some(found),
            Err(DatabaseError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let kind = self.repository.save_declaration(decl)?;

        // A lost audit row must not undo a stored declaration
        for entry in audit_entries(username, previous.as_ref(), decl, kind) {
            if let Err(e) = self.repository.append_audit(&entry) {
                error!("Error creating audit entry for {}: {}", decl.id, e);
            }
        }

        Ok(kind)
    }
}

pub struct DeleteDeclarationUseCase<'a> {
    repository: &'a dyn DeclarationRepository,
}

impl<'a> DeleteDeclarationUseCase<'a> {
    pub fn new(repository: &'a dyn DeclarationRepository) -> Self {
        Self { repository }
    }

    pub fn execute(&self, id: &str, username: &str) -> Result<(), DeclarationError> {
        let existing = self.repository.find_by_id(id)?;
        self.repository.delete_declaration(id)?;

        let entry = AuditEntry::for_declaration(
            username,
            AuditAction::Delete,
            id,
            format!("Deleted declaration #{}", existing.number),
        );
        if let Err(e) = self.repository.append_audit(&entry) {
            error!("Error creating audit entry for {}: {}", id, e);
        }
        Ok(())
    }
}

/// Audit rows for one save: the write itself plus one per new signature
pub fn audit_entries(
    username: &str,
    previous: Option<&Declaration>,
    current: &Declaration,
    kind: SaveKind,
) -> Vec<AuditEntry> {
    let action = match kind {
        SaveKind::Created => AuditAction::Create,
        SaveKind::Updated => AuditAction::Update,
    };
    let mut entries = vec![AuditEntry::for_declaration(
        username,
        action,
        &current.id,
        format!("Declaration #{}", current.number),
    )];

    for role in SignerRole::ALL {
        let Some(image) = current.signature(role) else {
            continue;
        };
        if previous.and_then(|p| p.signature(role)) != Some(image) {
            entries.push(AuditEntry::for_declaration(
                username,
                AuditAction::Sign,
                &current.id,
                format!("{} signature sha256:{}", role.label(), image.fingerprint()),
            ));
        }
    }

    entries
}
