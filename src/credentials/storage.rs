//! SQLite-backed token persistence.
//!
//! One row per (application, user). Access and refresh tokens are sealed
//! individually; the remaining record fields are stored in clear.

use super::encryption::{validate_key, Cipher, Sealed};
use super::AccessTokenRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Encrypted token storage backed by SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE tokens (
///     application TEXT NOT NULL,
///     user TEXT NOT NULL,
///     access_token TEXT NOT NULL,        -- sealed
///     access_token_nonce TEXT NOT NULL,
///     refresh_token TEXT,                -- sealed (optional)
///     refresh_token_nonce TEXT,
///     token_type TEXT NOT NULL,
///     account TEXT NOT NULL,
///     scopes TEXT NOT NULL,
///     updated_at TEXT NOT NULL,          -- RFC 3339
///     PRIMARY KEY (application, user)
/// );
/// ```
pub struct TokenStore {
    conn: Mutex<Connection>,
    cipher: Cipher,
}

impl TokenStore {
    /// Opens (or creates) the store at `db_path`.
    ///
    /// `encryption_key` is the base64-encoded 32-byte master key.
    pub fn new<P: AsRef<Path>>(db_path: P, encryption_key: &str) -> Result<Self> {
        let key = validate_key(encryption_key).context("Invalid encryption key")?;
        let cipher = Cipher::new(&key)?;

        let conn = Connection::open(db_path).context("Failed to open token database")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                application TEXT NOT NULL,
                user TEXT NOT NULL,
                access_token TEXT NOT NULL,
                access_token_nonce TEXT NOT NULL,
                refresh_token TEXT,
                refresh_token_nonce TEXT,
                token_type TEXT NOT NULL,
                account TEXT NOT NULL,
                scopes TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (application, user)
            );
            "#,
        )
        .context("Failed to create tokens table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            cipher,
        })
    }

    /// Stores `record` for `(application, user)`, replacing any previous one.
    pub fn store(&self, application: &str, user: &str, record: &AccessTokenRecord) -> Result<()> {
        let access = self
            .cipher
            .seal(&record.access_token)
            .context("Failed to encrypt access token")?;
        let refresh = record
            .refresh_token
            .as_deref()
            .map(|token| self.cipher.seal(token))
            .transpose()
            .context("Failed to encrypt refresh token")?;
        let (refresh_token, refresh_token_nonce) = match refresh {
            Some(sealed) => (Some(sealed.ciphertext), Some(sealed.nonce)),
            None => (None, None),
        };

        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO tokens (
                    application, user,
                    access_token, access_token_nonce,
                    refresh_token, refresh_token_nonce,
                    token_type, account, scopes, updated_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(application, user) DO UPDATE SET
                    access_token = excluded.access_token,
                    access_token_nonce = excluded.access_token_nonce,
                    refresh_token = excluded.refresh_token,
                    refresh_token_nonce = excluded.refresh_token_nonce,
                    token_type = excluded.token_type,
                    account = excluded.account,
                    scopes = excluded.scopes,
                    updated_at = excluded.updated_at
                "#,
                params![
                    application,
                    user,
                    access.ciphertext,
                    access.nonce,
                    refresh_token,
                    refresh_token_nonce,
                    record.token_type,
                    record.user,
                    record.scopes,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("Failed to store token")?;

        tracing::debug!(application = %application, user = %user, "Token stored");
        Ok(())
    }

    /// Loads the record for `(application, user)`, if any.
    pub fn get(&self, application: &str, user: &str) -> Result<Option<AccessTokenRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT access_token, access_token_nonce,
                       refresh_token, refresh_token_nonce,
                       token_type, account, scopes
                FROM tokens
                WHERE application = ?1 AND user = ?2
                "#,
            )
            .context("Failed to prepare query")?;

        let mut rows = stmt
            .query(params![application, user])
            .context("Failed to execute query")?;

        let Some(row) = rows.next().context("Failed to read row")? else {
            return Ok(None);
        };

        let access_token = self
            .cipher
            .open(&Sealed {
                ciphertext: row.get(0)?,
                nonce: row.get(1)?,
            })
            .context("Failed to decrypt access token")?;

        let refresh_token: Option<String> = row.get(2)?;
        let refresh_token_nonce: Option<String> = row.get(3)?;
        let refresh_token = match (refresh_token, refresh_token_nonce) {
            (Some(ciphertext), Some(nonce)) => Some(
                self.cipher
                    .open(&Sealed { ciphertext, nonce })
                    .context("Failed to decrypt refresh token")?,
            ),
            _ => None,
        };

        Ok(Some(AccessTokenRecord {
            access_token,
            token_type: row.get(4)?,
            user: row.get(5)?,
            scopes: row.get(6)?,
            refresh_token,
        }))
    }

    /// Removes the record. Returns whether one existed.
    pub fn delete(&self, application: &str, user: &str) -> Result<bool> {
        let rows_affected = self
            .conn
            .lock()
            .unwrap()
            .execute(
                "DELETE FROM tokens WHERE application = ?1 AND user = ?2",
                params![application, user],
            )
            .context("Failed to delete token")?;

        Ok(rows_affected > 0)
    }

    /// Users holding a token for `application`, sorted.
    pub fn list_users(&self, application: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT user FROM tokens WHERE application = ?1 ORDER BY user")
            .context("Failed to prepare query")?;

        let users = stmt
            .query_map(params![application], |row| row.get(0))
            .context("Failed to execute query")?
            .collect::<Result<Vec<String>, _>>()
            .context("Failed to read results")?;

        Ok(users)
    }
}
