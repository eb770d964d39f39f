use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CoreError;
use crate::model::{Candidate, ContextPair, StoreStats, Transition, TransitionPage};
use crate::sampling::weighted_choice;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

const STATE_MSG_COUNTER: &str = "msg_counter";
const STATE_LAST_MESSAGE: &str = "last_message";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS transitions (
        word1 TEXT NOT NULL,
        word2 TEXT NOT NULL,
        next_word TEXT NOT NULL,
        count INTEGER NOT NULL DEFAULT 1,
        PRIMARY KEY (word1, word2, next_word)
    );
    CREATE INDEX IF NOT EXISTS idx_word1_word2 ON transitions(word1, word2);

    CREATE TABLE IF NOT EXISTS state (
        key TEXT PRIMARY KEY,
        value INTEGER DEFAULT 0,
        value_text TEXT DEFAULT ''
    );
";

/// Weighted transitions for exactly one channel, in one SQLite database.
///
/// The connection sits behind its own mutex so the store is `Sync`; every
/// statement is serialized, which also makes increment-or-insert atomic.
pub struct TransitionStore {
    channel: String,
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for TransitionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionStore")
            .field("channel", &self.channel)
            .field("path", &self.path)
            .finish()
    }
}

impl TransitionStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path, channel: &str) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(&conn, channel)?;
        tracing::debug!(channel, path = %path.display(), "opened transition store");
        Ok(Self {
            channel: channel.to_string(),
            path: Some(path.to_path_buf()),
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory(channel: &str) -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn, channel)?;
        Ok(Self {
            channel: channel.to_string(),
            path: None,
            conn: Mutex::new(conn),
        })
    }

    fn init(conn: &Connection, channel: &str) -> Result<(), CoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        if let Err(e) =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        {
            tracing::warn!(channel, "could not enable WAL: {e}");
        }
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Size of the database file in bytes, 0 for in-memory stores.
    pub fn file_size(&self) -> u64 {
        self.path
            .as_deref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Insert the triple with count 1, or bump its count.
    pub fn record_transition(
        &self,
        word1: &str,
        word2: &str,
        next_word: &str,
    ) -> Result<(), CoreError> {
        let conn = self.conn.lock();
        record(&conn, word1, word2, next_word)
    }

    /// Record a batch of triples in one transaction.
    pub fn record_transitions(&self, triples: &[(&str, &str, &str)]) -> Result<(), CoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for (w1, w2, next) in triples {
            record(&tx, w1, w2, next)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count(&self, word1: &str, word2: &str, next_word: &str) -> Result<Option<u64>, CoreError> {
        let conn = self.conn.lock();
        let count = conn
            .query_row(
                "SELECT count FROM transitions WHERE word1 = ?1 AND word2 = ?2 AND next_word = ?3",
                params![word1, word2, next_word],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(count.map(to_u64))
    }

    /// Every next-token candidate for a context, with its count.
    pub fn candidates(&self, word1: &str, word2: &str) -> Result<Vec<Candidate>, CoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT next_word, count FROM transitions WHERE word1 = ?1 AND word2 = ?2",
        )?;
        let rows = stmt.query_map(params![word1, word2], |row| {
            Ok(Candidate {
                token: row.get(0)?,
                count: to_u64(row.get::<_, i64>(1)?),
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn sample_next_token<R: Rng>(
        &self,
        rng: &mut R,
        word1: &str,
        word2: &str,
    ) -> Result<Option<String>, CoreError> {
        let candidates = self.candidates(word1, word2)?;
        Ok(weighted_choice(rng, &candidates).map(|c| c.token.clone()))
    }

    /// A uniformly random context pair among those present, chosen with
    /// `rng` so seeded callers get the same pair back.
    pub fn sample_random_context<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Option<ContextPair>, CoreError> {
        let conn = self.conn.lock();
        let pairs: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT word1, word2 FROM transitions)",
            [],
            |row| row.get(0),
        )?;
        if pairs <= 0 {
            return Ok(None);
        }
        let offset = rng.gen_range(0..pairs);
        let pair = conn
            .query_row(
                "SELECT DISTINCT word1, word2 FROM transitions
                 ORDER BY word1, word2 LIMIT 1 OFFSET ?1",
                params![offset],
                |row| Ok(ContextPair::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(pair)
    }

    /// Returns whether a row was removed.
    pub fn delete_transition(
        &self,
        word1: &str,
        word2: &str,
        next_word: &str,
    ) -> Result<bool, CoreError> {
        let conn = self.conn.lock();
        let n = conn.execute(
            "DELETE FROM transitions WHERE word1 = ?1 AND word2 = ?2 AND next_word = ?3",
            params![word1, word2, next_word],
        )?;
        Ok(n > 0)
    }

    /// Overwrite a count. Anything below 1 deletes the row.
    pub fn set_transition_count(
        &self,
        word1: &str,
        word2: &str,
        next_word: &str,
        count: i64,
    ) -> Result<bool, CoreError> {
        if count < 1 {
            return self.delete_transition(word1, word2, next_word);
        }
        let conn = self.conn.lock();
        let n = conn.execute(
            "UPDATE transitions SET count = ?4 WHERE word1 = ?1 AND word2 = ?2 AND next_word = ?3",
            params![word1, word2, next_word, count],
        )?;
        Ok(n > 0)
    }

    /// Delete every transition the predicate selects and return them.
    pub fn purge_matching<F>(&self, mut predicate: F) -> Result<Vec<Transition>, CoreError>
    where
        F: FnMut(&Transition) -> bool,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut doomed = Vec::new();
        {
            let mut stmt =
                tx.prepare("SELECT rowid, word1, word2, next_word, count FROM transitions")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Transition {
                        word1: row.get(1)?,
                        word2: row.get(2)?,
                        next_word: row.get(3)?,
                        count: to_u64(row.get::<_, i64>(4)?),
                    },
                ))
            })?;
            for row in rows {
                let (rowid, transition) = row?;
                if predicate(&transition) {
                    doomed.push((rowid, transition));
                }
            }
        }
        {
            let mut delete = tx.prepare("DELETE FROM transitions WHERE rowid = ?1")?;
            for (rowid, _) in &doomed {
                delete.execute(params![rowid])?;
            }
        }
        tx.commit()?;
        Ok(doomed.into_iter().map(|(_, t)| t).collect())
    }

    /// Delete rows where `needle` occurs, case-insensitively, inside any token.
    pub fn purge_containing(&self, needle: &str) -> Result<u64, CoreError> {
        let pattern = like_pattern(&needle.to_lowercase());
        let conn = self.conn.lock();
        let n = conn.execute(
            "DELETE FROM transitions
             WHERE LOWER(word1) LIKE ?1 ESCAPE '\\'
                OR LOWER(word2) LIKE ?1 ESCAPE '\\'
                OR LOWER(next_word) LIKE ?1 ESCAPE '\\'",
            params![pattern],
        )?;
        Ok(n as u64)
    }

    /// Delete rows where `first second` appears as adjacent tokens, either as
    /// the context pair or as the second context word plus the next word.
    pub fn purge_adjacent(&self, first: &str, second: &str) -> Result<u64, CoreError> {
        let conn = self.conn.lock();
        let n = conn.execute(
            "DELETE FROM transitions
             WHERE (LOWER(word1) = ?1 AND LOWER(word2) = ?2)
                OR (LOWER(word2) = ?1 AND LOWER(next_word) = ?2)",
            params![first.to_lowercase(), second.to_lowercase()],
        )?;
        Ok(n as u64)
    }

    pub fn stats(&self) -> Result<StoreStats, CoreError> {
        let conn = self.conn.lock();
        let unique_pairs: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT word1, word2 FROM transitions)",
            [],
            |row| row.get(0),
        )?;
        let total_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM transitions", [], |row| row.get(0))?;
        Ok(StoreStats {
            unique_pairs: to_u64(unique_pairs),
            total_entries: to_u64(total_entries),
        })
    }

    /// Paginated listing ordered by count, optionally filtered by a substring
    /// of any token. Out-of-range paging falls back to sane defaults.
    pub fn transitions_page(
        &self,
        search: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TransitionPage, CoreError> {
        let page = page.max(1);
        let page_size = if (1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        let offset = i64::from(page - 1) * i64::from(page_size);
        let search = search.trim();

        let conn = self.conn.lock();
        let (total, transitions) = if search.is_empty() {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM transitions", [], |row| row.get(0))?;
            let mut stmt = conn.prepare(
                "SELECT word1, word2, next_word, count FROM transitions
                 ORDER BY count DESC LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map(params![i64::from(page_size), offset], row_to_transition)?
                .collect::<Result<Vec<_>, _>>()?;
            (total, rows)
        } else {
            let pattern = like_pattern(search);
            let filter = "word1 LIKE ?1 ESCAPE '\\' OR word2 LIKE ?1 ESCAPE '\\' \
                          OR next_word LIKE ?1 ESCAPE '\\'";
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM transitions WHERE {filter}"),
                params![pattern],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT word1, word2, next_word, count FROM transitions WHERE {filter}
                 ORDER BY count DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(
                    params![pattern, i64::from(page_size), offset],
                    row_to_transition,
                )?
                .collect::<Result<Vec<_>, _>>()?;
            (total, rows)
        };

        Ok(TransitionPage {
            transitions,
            total: to_u64(total),
            page,
            page_size,
        })
    }

    /// Remove all transitions and reset the persisted state.
    pub fn erase(&self) -> Result<(), CoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM transitions", [])?;
        tx.execute("DELETE FROM state", [])?;
        tx.execute(
            "INSERT INTO state (key, value) VALUES (?1, 0)",
            params![STATE_MSG_COUNTER],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Reclaim free pages.
    pub fn vacuum(&self) -> Result<(), CoreError> {
        self.conn.lock().execute_batch("VACUUM")?;
        Ok(())
    }

    pub fn load_counter(&self) -> Result<u32, CoreError> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT value FROM state WHERE key = ?1",
                params![STATE_MSG_COUNTER],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(value.map(|v| u32::try_from(v).unwrap_or(0)).unwrap_or(0))
    }

    pub fn save_counter(&self, counter: u32) -> Result<(), CoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![STATE_MSG_COUNTER, i64::from(counter)],
        )?;
        Ok(())
    }

    pub fn save_last_message(&self, message: &str) -> Result<(), CoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO state (key, value_text) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_text = excluded.value_text",
            params![STATE_LAST_MESSAGE, message],
        )?;
        Ok(())
    }

    pub fn last_message(&self) -> Result<Option<String>, CoreError> {
        let conn = self.conn.lock();
        let msg = conn
            .query_row(
                "SELECT value_text FROM state WHERE key = ?1",
                params![STATE_LAST_MESSAGE],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(msg.flatten().filter(|m| !m.is_empty()))
    }
}

fn record(conn: &Connection, word1: &str, word2: &str, next_word: &str) -> Result<(), CoreError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO transitions (word1, word2, next_word, count) VALUES (?1, ?2, ?3, 1)
         ON CONFLICT(word1, word2, next_word) DO UPDATE SET count = count + 1",
    )?;
    stmt.execute(params![word1, word2, next_word])?;
    Ok(())
}

fn row_to_transition(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transition> {
    Ok(Transition {
        word1: row.get(0)?,
        word2: row.get(1)?,
        next_word: row.get(2)?,
        count: to_u64(row.get::<_, i64>(3)?),
    })
}

fn to_u64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}
