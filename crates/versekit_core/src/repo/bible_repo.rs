//! Bible document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist whole Bible documents (metadata plus node arena) atomically.
//! - Rebuild documents with the same node identities they were saved with.
//!
//! # Invariants
//! - A save replaces every node row of the document inside one transaction.
//! - Sibling order is stored as `sort_order` and restored exactly.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::bible::{Bible, BibleMetadata, TreeError};
use crate::model::node::{NodeData, NodeId, NodeKind};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from Bible persistence.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No document stored under this id.
    NotFound(Uuid),
    /// A document already exists under this id.
    AlreadyExists(Uuid),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted rows cannot be converted into a valid document.
    InvalidData(String),
    /// Store or background worker cannot serve requests.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "bible not found: {id}"),
            Self::AlreadyExists(id) => write!(f, "bible already exists: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted bible data: {message}"),
            Self::Unavailable(message) => write!(f, "bible store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<TreeError> for StoreError {
    fn from(value: TreeError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Listing row for stored documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleSummary {
    pub document_id: Uuid,
    pub name: String,
    pub language: String,
    pub updated_at: i64,
}

/// Repository interface for Bible documents.
pub trait BibleRepository {
    /// Inserts or replaces the document stored under `bible.meta.document_id`.
    fn save_bible(&self, bible: &Bible) -> StoreResult<()>;
    /// Inserts a new document; fails when the id is already taken.
    fn create_bible(&self, bible: &Bible) -> StoreResult<()>;
    fn load_bible(&self, id: Uuid) -> StoreResult<Option<Bible>>;
    fn list_bibles(&self) -> StoreResult<Vec<BibleSummary>>;
    fn delete_bible(&self, id: Uuid) -> StoreResult<()>;
}

/// SQLite-backed Bible repository.
pub struct SqliteBibleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBibleRepository<'conn> {
    /// Wraps a connection returned by `db::open_db*`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let expected_version = latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn exists(&self, id: Uuid) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bibles WHERE bible_uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn write(&self, bible: &Bible) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let meta = &bible.meta;
        let document_id = meta.document_id.to_string();
        tx.execute(
            "INSERT INTO bibles (
                bible_uuid,
                root_uuid,
                name,
                language,
                source,
                copyright,
                notes,
                created_at,
                updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                (strftime('%s', 'now') * 1000),
                (strftime('%s', 'now') * 1000)
            )
            ON CONFLICT(bible_uuid) DO UPDATE SET
                root_uuid = excluded.root_uuid,
                name = excluded.name,
                language = excluded.language,
                source = excluded.source,
                copyright = excluded.copyright,
                notes = excluded.notes,
                updated_at = excluded.updated_at;",
            params![
                document_id,
                bible.root().to_string(),
                meta.name,
                meta.language,
                meta.source,
                meta.copyright,
                meta.notes,
            ],
        )?;
        tx.execute(
            "DELETE FROM bible_nodes WHERE bible_uuid = ?1;",
            [document_id.as_str()],
        )?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO bible_nodes (
                    bible_uuid,
                    node_uuid,
                    kind,
                    parent_uuid,
                    sort_order,
                    number,
                    name,
                    text
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            )?;
            for (parent, node) in bible.walk() {
                let sort_order = bible.index_of(parent, node.id()).ok_or_else(|| {
                    StoreError::InvalidData(format!("node {} is detached", node.id()))
                })?;
                let data = node.data();
                insert.execute(params![
                    document_id,
                    node.id().to_string(),
                    node.kind().as_str(),
                    parent.to_string(),
                    sort_order as i64,
                    data.number().unwrap_or_default(),
                    data.name(),
                    data.text(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl BibleRepository for SqliteBibleRepository<'_> {
    fn save_bible(&self, bible: &Bible) -> StoreResult<()> {
        self.write(bible)
    }

    fn create_bible(&self, bible: &Bible) -> StoreResult<()> {
        if self.exists(bible.meta.document_id)? {
            return Err(StoreError::AlreadyExists(bible.meta.document_id));
        }
        self.write(bible)
    }

    fn load_bible(&self, id: Uuid) -> StoreResult<Option<Bible>> {
        let header = self
            .conn
            .query_row(
                "SELECT root_uuid, name, language, source, copyright, notes
                 FROM bibles
                 WHERE bible_uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("root_uuid")?,
                        BibleMetadata {
                            document_id: id,
                            name: row.get("name")?,
                            language: row.get("language")?,
                            source: row.get("source")?,
                            copyright: row.get("copyright")?,
                            notes: row.get("notes")?,
                        },
                    ))
                },
            )
            .optional()?;
        let Some((root_text, meta)) = header else {
            return Ok(None);
        };
        let root = parse_uuid(&root_text, "bibles.root_uuid")?;

        let mut stmt = self.conn.prepare(
            "SELECT node_uuid, kind, parent_uuid, number, name, text
             FROM bible_nodes
             WHERE bible_uuid = ?1
             ORDER BY parent_uuid ASC, sort_order ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_node_row(row)?);
        }

        Ok(Some(Bible::restore(meta, root, records)?))
    }

    fn list_bibles(&self) -> StoreResult<Vec<BibleSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT bible_uuid, name, language, updated_at
             FROM bibles
             ORDER BY name COLLATE NOCASE ASC, bible_uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("bible_uuid")?;
            summaries.push(BibleSummary {
                document_id: parse_uuid(&id_text, "bibles.bible_uuid")?,
                name: row.get("name")?,
                language: row.get("language")?,
                updated_at: row.get("updated_at")?,
            });
        }
        Ok(summaries)
    }

    fn delete_bible(&self, id: Uuid) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM bibles WHERE bible_uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_node_row(row: &Row<'_>) -> StoreResult<(NodeId, NodeId, NodeData)> {
    let node_text: String = row.get("node_uuid")?;
    let node = parse_uuid(&node_text, "bible_nodes.node_uuid")?;
    let parent_text: String = row.get("parent_uuid")?;
    let parent = parse_uuid(&parent_text, "bible_nodes.parent_uuid")?;

    let kind_text: String = row.get("kind")?;
    let kind = parse_kind(&kind_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid node kind `{kind_text}` in bible_nodes.kind"))
    })?;
    let number: i32 = row.get("number")?;
    let data = match kind {
        NodeKind::Book => NodeData::Book {
            number,
            name: row.get::<_, Option<String>>("name")?.unwrap_or_default(),
        },
        NodeKind::Chapter => NodeData::Chapter { number },
        NodeKind::Verse => NodeData::Verse {
            number,
            text: row.get::<_, Option<String>>("text")?.unwrap_or_default(),
        },
        NodeKind::Bible => {
            return Err(StoreError::InvalidData(format!(
                "root kind stored as node row {node}"
            )))
        }
    };
    Ok((node, parent, data))
}

fn parse_kind(value: &str) -> Option<NodeKind> {
    NodeKind::ALL.into_iter().find(|kind| kind.as_str() == value)
}

fn parse_uuid(value: &str, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
