use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use super::dates::{first_of_month, last_monday, today};
use super::{LeaderboardRow, StoredFile, User, UserStore, UserXp, XpPeriod};
use crate::core::error::HubResult;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    username    TEXT,
    first_name  TEXT NOT NULL DEFAULT '',
    wallet      TEXT
);
CREATE TABLE IF NOT EXISTS user_xp (
    user_id     INTEGER NOT NULL,
    title       TEXT NOT NULL,
    xp          INTEGER NOT NULL DEFAULT 0,
    month_xp    INTEGER NOT NULL DEFAULT 0,
    week_xp     INTEGER NOT NULL DEFAULT 0,
    month_from  TEXT NOT NULL,
    week_from   TEXT NOT NULL,
    PRIMARY KEY (user_id, title)
);
CREATE INDEX IF NOT EXISTS idx_user_xp_title ON user_xp (title);
CREATE TABLE IF NOT EXISTS files (
    unique_id   TEXT PRIMARY KEY,
    file_id     TEXT NOT NULL,
    prefix      TEXT NOT NULL,
    name        TEXT NOT NULL
);
";

/// Create a new database connection pool
///
/// Initializes a pool with up to 10 connections and creates the schema.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = migrate_schema(&conn) {
        log::warn!("Failed to migrate schema: {}", e);
    }

    Ok(pool)
}

/// Single-connection in-memory pool, used by tests and dry runs.
///
/// Every `:memory:` connection is its own database, hence `max_size(1)`.
pub fn create_memory_pool() -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = migrate_schema(&conn) {
        log::warn!("Failed to migrate schema: {}", e);
    }

    Ok(pool)
}

/// Get a connection from the pool
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

pub fn migrate_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

/// SQLite-backed [`UserStore`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

fn row_to_xp(row: &Row<'_>) -> rusqlite::Result<UserXp> {
    Ok(UserXp {
        user_id: row.get(0)?,
        title: row.get(1)?,
        xp: row.get(2)?,
        month_xp: row.get(3)?,
        week_xp: row.get(4)?,
        month_from: row.get(5)?,
        week_from: row.get(6)?,
    })
}

fn row_to_file(row: &Row<'_>) -> rusqlite::Result<StoredFile> {
    Ok(StoredFile {
        unique_id: row.get(0)?,
        file_id: row.get(1)?,
        prefix: row.get(2)?,
        name: row.get(3)?,
    })
}

/// Resets the week/month counters whose window has passed.
fn roll_windows(mut row: UserXp, today: NaiveDate) -> UserXp {
    let week = last_monday(today);
    if row.week_from < week {
        row.week_xp = 0;
        row.week_from = week;
    }
    let month = first_of_month(today);
    if row.month_from < month {
        row.month_xp = 0;
        row.month_from = month;
    }
    row
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> HubResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }

    /// [`UserStore::shift_xp`] with an explicit calendar date.
    pub fn shift_xp_on(&self, user_id: i64, title: &str, delta: i64, today: NaiveDate) -> HubResult<UserXp> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                "SELECT user_id, title, xp, month_xp, week_xp, month_from, week_from
                 FROM user_xp WHERE user_id = ?1 AND title = ?2",
                params![user_id, title],
                row_to_xp,
            )
            .optional()?;

        let row = existing.unwrap_or_else(|| UserXp {
            user_id,
            title: title.to_string(),
            xp: 0,
            month_xp: 0,
            week_xp: 0,
            month_from: first_of_month(today),
            week_from: last_monday(today),
        });

        let mut row = roll_windows(row, today);
        row.xp = (row.xp + delta).max(0);
        row.month_xp = (row.month_xp + delta).max(0);
        row.week_xp = (row.week_xp + delta).max(0);

        tx.execute(
            "INSERT INTO user_xp (user_id, title, xp, month_xp, week_xp, month_from, week_from)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id, title) DO UPDATE SET
                xp = excluded.xp,
                month_xp = excluded.month_xp,
                week_xp = excluded.week_xp,
                month_from = excluded.month_from,
                week_from = excluded.week_from",
            params![
                row.user_id,
                row.title,
                row.xp,
                row.month_xp,
                row.week_xp,
                row.month_from,
                row.week_from
            ],
        )?;
        tx.commit()?;

        Ok(row)
    }

    pub fn user_xp_on(&self, user_id: i64, today: NaiveDate) -> HubResult<Vec<UserXp>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, title, xp, month_xp, week_xp, month_from, week_from
             FROM user_xp WHERE user_id = ?1 ORDER BY title",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_xp)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(roll_windows(row?, today));
        }
        Ok(out)
    }

    pub fn top_xp_on(
        &self,
        title: &str,
        period: XpPeriod,
        limit: usize,
        today: NaiveDate,
    ) -> HubResult<Vec<LeaderboardRow>> {
        let (column, window) = match period {
            XpPeriod::All => ("x.xp", None),
            XpPeriod::Month => ("x.month_xp", Some(("x.month_from", first_of_month(today)))),
            XpPeriod::Week => ("x.week_xp", Some(("x.week_from", last_monday(today)))),
        };

        let window_clause = match window {
            Some((from, _)) => format!("AND {from} = ?3"),
            None => String::new(),
        };
        let sql = format!(
            "SELECT x.user_id, u.username, u.first_name, {column}
             FROM user_xp x LEFT JOIN users u ON u.id = x.user_id
             WHERE x.title = ?1 AND {column} > 0 {window_clause}
             ORDER BY {column} DESC, x.user_id
             LIMIT ?2"
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &Row<'_>| -> rusqlite::Result<LeaderboardRow> {
            let user_id: i64 = row.get(0)?;
            let username: Option<String> = row.get(1)?;
            let first_name: Option<String> = row.get(2)?;
            let name = match (username, first_name) {
                (Some(u), _) => format!("@{u}"),
                (None, Some(f)) if !f.is_empty() => f,
                _ => format!("User {user_id}"),
            };
            Ok(LeaderboardRow {
                user_id,
                name,
                xp: row.get(3)?,
            })
        };

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = match window {
            Some((_, from)) => stmt
                .query_map(params![title, limit, from], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(params![title, limit], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }
}

impl UserStore for SqliteStore {
    fn get_user(&self, id: i64) -> HubResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, first_name, wallet FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        first_name: row.get(2)?,
                        wallet: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn save_user(&self, user: &User) -> HubResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (id, username, first_name, wallet) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                wallet = excluded.wallet",
            params![user.id, user.username, user.first_name, user.wallet],
        )?;
        Ok(())
    }

    fn shift_xp(&self, user_id: i64, title: &str, delta: i64) -> HubResult<UserXp> {
        self.shift_xp_on(user_id, title, delta, today())
    }

    fn xp_titles(&self) -> HubResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT title FROM user_xp ORDER BY title")?;
        let titles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(titles)
    }

    fn user_xp(&self, user_id: i64) -> HubResult<Vec<UserXp>> {
        self.user_xp_on(user_id, today())
    }

    fn top_xp(&self, title: &str, period: XpPeriod, limit: usize) -> HubResult<Vec<LeaderboardRow>> {
        self.top_xp_on(title, period, limit, today())
    }

    fn save_file(&self, file: &StoredFile) -> HubResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO files (unique_id, file_id, prefix, name) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(unique_id) DO UPDATE SET
                file_id = excluded.file_id,
                prefix = excluded.prefix,
                name = excluded.name",
            params![file.unique_id, file.file_id, file.prefix, file.name],
        )?;
        Ok(())
    }

    fn list_files(&self, prefix: &str) -> HubResult<Vec<StoredFile>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT unique_id, file_id, prefix, name FROM files WHERE prefix = ?1 ORDER BY name")?;
        let files = stmt
            .query_map(params![prefix], row_to_file)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    fn get_file(&self, unique_id: &str) -> HubResult<Option<StoredFile>> {
        let conn = self.conn()?;
        let file = conn
            .query_row(
                "SELECT unique_id, file_id, prefix, name FROM files WHERE unique_id = ?1",
                params![unique_id],
                row_to_file,
            )
            .optional()?;
        Ok(file)
    }

    fn delete_file(&self, unique_id: &str) -> HubResult<bool> {
        let conn = self.conn()?;
        let changed = conn.execute("DELETE FROM files WHERE unique_id = ?1", params![unique_id])?;
        Ok(changed > 0)
    }
}
