use crate::domain::{AuditAction, AuditEntry, Declaration, SignatureImage};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("Stored data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Declaration not found")]
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Created,
    Updated,
}

pub trait DeclarationRepository {
    /// Full replace by id; every column is overwritten
    fn save_declaration(&self, decl: &Declaration) -> Result<SaveKind, DatabaseError>;
    fn find_by_id(&self, id: &str) -> Result<Declaration, DatabaseError>;
    fn list_declarations(&self) -> Result<Vec<Declaration>, DatabaseError>;
    fn delete_declaration(&self, id: &str) -> Result<(), DatabaseError>;
    fn count_declarations(&self) -> Result<usize, DatabaseError>;
    fn append_audit(&self, entry: &AuditEntry) -> Result<i64, DatabaseError>;
    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, DatabaseError>;
}

pub struct SqliteRepository {
    conn: Connection,
}

const DECLARATION_COLUMNS: &str = "id, number, date, city, recipient, equipment, sender, carrier, \
     signature_sender, signature_carrier";

impl SqliteRepository {
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn new_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), DatabaseError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS declarations (
                id TEXT PRIMARY KEY,
                number TEXT NOT NULL,
                date TEXT NOT NULL,
                city TEXT NOT NULL,
                recipient TEXT NOT NULL,
                equipment TEXT NOT NULL,
                sender TEXT NOT NULL,
                carrier TEXT NOT NULL,
                signature_sender TEXT,
                signature_carrier TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_declarations_created_at ON declarations(created_at)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                action TEXT NOT NULL,
                entity TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                details TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_logs_created_at ON audit_logs(created_at)",
            [],
        )?;

        Ok(())
    }

    fn row_to_declaration(row: &rusqlite::Row) -> Result<Declaration, rusqlite::Error> {
        Ok(Declaration {
            id: row.get(0)?,
            number: row.get(1)?,
            date: row.get(2)?,
            city: row.get(3)?,
            recipient: json_column(row, 4)?,
            equipment: json_column(row, 5)?,
            sender: json_column(row, 6)?,
            carrier: json_column(row, 7)?,
            signature_sender: signature_column(row, 8)?,
            signature_carrier: signature_column(row, 9)?,
        })
    }

    fn row_to_audit(row: &rusqlite::Row) -> Result<AuditEntry, rusqlite::Error> {
        let action: String = row.get(2)?;
        Ok(AuditEntry {
            id: row.get(0)?,
            username: row.get(1)?,
            action: action.parse::<AuditAction>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
            })?,
            entity: row.get(3)?,
            entity_id: row.get(4)?,
            details: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

fn json_column<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<T, rusqlite::Error> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn signature_column(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<Option<SignatureImage>, rusqlite::Error> {
    let uri: Option<String> = row.get(idx)?;
    uri.map(SignatureImage::from_data_uri)
        .transpose()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl DeclarationRepository for SqliteRepository {
    fn save_declaration(&self, decl: &Declaration) -> Result<SaveKind, DatabaseError> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM declarations WHERE id = ?1)",
            params![&decl.id],
            |row| row.get(0),
        )?;
        let now = chrono::Utc::now().timestamp();

        self.conn.execute(
            "INSERT INTO declarations (id, number, date, city, recipient, equipment, sender, carrier,
                                       signature_sender, signature_carrier, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
             ON CONFLICT(id) DO UPDATE SET
                number = excluded.number,
                date = excluded.date,
                city = excluded.city,
                recipient = excluded.recipient,
                equipment = excluded.equipment,
                sender = excluded.sender,
                carrier = excluded.carrier,
                signature_sender = excluded.signature_sender,
                signature_carrier = excluded.signature_carrier,
                updated_at = excluded.updated_at",
            params![
                &decl.id,
                &decl.number,
                &decl.date,
                &decl.city,
                serde_json::to_string(&decl.recipient)?,
                serde_json::to_string(&decl.equipment)?,
                serde_json::to_string(&decl.sender)?,
                serde_json::to_string(&decl.carrier)?,
                decl.signature_sender.as_ref().map(|s| s.as_data_uri()),
                decl.signature_carrier.as_ref().map(|s| s.as_data_uri()),
                now
            ],
        )?;

        Ok(if exists {
            SaveKind::Updated
        } else {
            SaveKind::Created
        })
    }

    fn find_by_id(&self, id: &str) -> Result<Declaration, DatabaseError> {
        let decl = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM declarations WHERE id = ?1",
                    DECLARATION_COLUMNS
                ),
                params![id],
                Self::row_to_declaration,
            )
            .optional()?;

        decl.ok_or(DatabaseError::NotFound)
    }

    fn list_declarations(&self) -> Result<Vec<Declaration>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM declarations ORDER BY created_at DESC, rowid DESC",
            DECLARATION_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_declaration)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn delete_declaration(&self, id: &str) -> Result<(), DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM declarations WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    fn count_declarations(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM declarations", [], |row| row.get(0))?;

        Ok(count as usize)
    }

    fn append_audit(&self, entry: &AuditEntry) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO audit_logs (username, action, entity, entity_id, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &entry.username,
                entry.action.as_str(),
                &entry.entity,
                &entry.entity_id,
                &entry.details,
                &entry.created_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_audit(&self, limit: usize) -> Result<Vec<AuditEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, action, entity, entity_id, details, created_at
             FROM audit_logs
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        // SQLite reads a negative LIMIT as unbounded
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], Self::row_to_audit)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
