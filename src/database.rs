//! Database initialization, table definitions and store access
//!
//! The embedded redb database holds three tables: the main code → mapping
//! relation, a url → code reverse index that makes shortening idempotent,
//! and the user relation keyed by email. Records are stored as JSON strings.
//!
//! redb serializes write transactions, so the check-and-insert helpers here
//! are atomic with respect to concurrent writers: of two requests racing to
//! claim the same short code, exactly one insert commits and the loser sees
//! the occupant.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use crate::error::AppError;
use crate::model::{UrlMapping, User};
use crate::shortcode;
use crate::token::{TokenIssuer, TokenValidator};

/// Main table for URL mappings.
///
/// Key: short code
/// Value: JSON-serialized [`UrlMapping`]
pub const TABLE_MAPPINGS: TableDefinition<&str, &str> = TableDefinition::new("mappings_v1");

/// Reverse index from original URL to its short code.
///
/// Lets `shorten` answer "has this URL been seen before?" without scanning
/// the main table.
pub const TABLE_URL_INDEX: TableDefinition<&str, &str> = TableDefinition::new("url_index_v1");

/// User accounts.
///
/// Key: email (the unique account identifier)
/// Value: JSON-serialized [`User`]
pub const TABLE_USERS: TableDefinition<&str, &str> = TableDefinition::new("users_v1");

/// Startup configuration for [`AppState`].
#[derive(Clone)]
pub struct AppConfig {
    /// Public base under which short URLs are advertised.
    pub base_url: String,

    /// Secret for signing and verifying tokens. Immutable for the process
    /// lifetime; rotation would need versioned keys, which is out of scope.
    pub token_secret: String,

    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,

    /// Upper bound on collision-retry attempts per URL. The digest itself
    /// caps the useful range at [`shortcode::MAX_OFFSETS`].
    pub retry_limit: usize,
}

/// Application state shared across all request handlers.
///
/// Everything in here is read-only after startup; the database does its own
/// internal locking.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database.
    pub db: Arc<Database>,

    pub base_url: String,

    pub issuer: TokenIssuer,

    pub validator: TokenValidator,

    pub retry_limit: usize,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: AppConfig) -> Self {
        let secret = config.token_secret.as_bytes();
        Self {
            db,
            base_url: config.base_url,
            issuer: TokenIssuer::new(secret, config.token_ttl_secs),
            validator: TokenValidator::new(secret),
            retry_limit: config.retry_limit.min(shortcode::MAX_OFFSETS),
        }
    }
}

/// Creates or opens the database file and ensures all tables exist.
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_MAPPINGS)?;
        write_txn.open_table(TABLE_URL_INDEX)?;
        write_txn.open_table(TABLE_USERS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Outcome of an attempted mapping insert.
pub enum InsertOutcome {
    /// The code was free and the mapping is now stored.
    Inserted,
    /// The code is already held by this mapping (which may or may not be
    /// for the same URL; the caller decides what that means).
    CodeTaken(UrlMapping),
}

/// Looks up a mapping by short code.
pub fn get_mapping(db: &Database, code: &str) -> Result<Option<UrlMapping>, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_MAPPINGS)?;

    match table.get(code)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

/// Looks up a mapping by its original URL via the reverse index.
pub fn get_mapping_by_url(db: &Database, url: &str) -> Result<Option<UrlMapping>, AppError> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(TABLE_URL_INDEX)?;

    let code = match index.get(url)? {
        Some(guard) => guard.value().to_string(),
        None => return Ok(None),
    };
    drop(index);

    let table = read_txn.open_table(TABLE_MAPPINGS)?;
    match table.get(code.as_str())? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

/// Stores a mapping if its short code is still free.
///
/// The existence check and the insert run inside a single write
/// transaction, which is what enforces short-code uniqueness under
/// concurrency. Both the main table and the reverse index are written
/// together.
pub fn insert_mapping(db: &Database, mapping: &UrlMapping) -> Result<InsertOutcome, AppError> {
    let record_json = serde_json::to_string(mapping)?;

    let write_txn = db.begin_write()?;
    let outcome = {
        let mut table = write_txn.open_table(TABLE_MAPPINGS)?;

        if let Some(guard) = table.get(mapping.short_code.as_str())? {
            let existing: UrlMapping = serde_json::from_str(guard.value())?;
            InsertOutcome::CodeTaken(existing)
        } else {
            table.insert(mapping.short_code.as_str(), record_json.as_str())?;

            let mut index = write_txn.open_table(TABLE_URL_INDEX)?;
            index.insert(mapping.original_url.as_str(), mapping.short_code.as_str())?;

            InsertOutcome::Inserted
        }
    };

    match outcome {
        InsertOutcome::Inserted => {
            write_txn.commit()?;
            Ok(InsertOutcome::Inserted)
        }
        // Nothing was written; let the transaction drop.
        taken => Ok(taken),
    }
}

/// Returns every stored mapping in key order.
pub fn list_mappings(db: &Database) -> Result<Vec<UrlMapping>, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_MAPPINGS)?;

    let mappings = table
        .iter()?
        .filter_map(|res| {
            res.ok()
                .and_then(|(_, value)| serde_json::from_str::<UrlMapping>(value.value()).ok())
        })
        .collect();

    Ok(mappings)
}

/// Looks up a user by email.
pub fn get_user(db: &Database, email: &str) -> Result<Option<User>, AppError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_USERS)?;

    match table.get(email)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

/// Stores a new user if the email is still free. Returns `false` when the
/// email is already registered.
pub fn insert_user(db: &Database, user: &User) -> Result<bool, AppError> {
    let record_json = serde_json::to_string(user)?;

    let write_txn = db.begin_write()?;
    let inserted = {
        let mut table = write_txn.open_table(TABLE_USERS)?;

        if table.get(user.email.as_str())?.is_some() {
            false
        } else {
            table.insert(user.email.as_str(), record_json.as_str())?;
            true
        }
    };

    if inserted {
        write_txn.commit()?;
    }

    Ok(inserted)
}
