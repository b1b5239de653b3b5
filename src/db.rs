//! SQLite-backed storage for users and the textbook catalog.
//!
//! All access goes through [`Repository`], a narrow interface over a single
//! shared connection. Handlers check the connection out for the duration of
//! one statement; the mutex guard guarantees release.

use anyhow::{Context, Result};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;

/// School grade a user can register with. The closed set keeps the
/// grade-interpolated table names (`class_9_books`, ...) safe to format
/// into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Ninth,
    Tenth,
    Eleventh,
}

impl Grade {
    /// Parse a grade from message text. Only the exact strings "9", "10"
    /// and "11" are grade selections; everything else belongs to other
    /// handlers.
    pub fn parse(text: &str) -> Option<Grade> {
        match text {
            "9" => Some(Grade::Ninth),
            "10" => Some(Grade::Tenth),
            "11" => Some(Grade::Eleventh),
            _ => None,
        }
    }

    /// Inverse of [`number`](Grade::number) for values read back from the
    /// `user_class` column. Anything outside the fixed set is dropped as
    /// an invalid row.
    pub fn from_number(number: i64) -> Option<Grade> {
        match number {
            9 => Some(Grade::Ninth),
            10 => Some(Grade::Tenth),
            11 => Some(Grade::Eleventh),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Grade::Ninth => 9,
            Grade::Tenth => 10,
            Grade::Eleventh => 11,
        }
    }

    fn books_table(self) -> String {
        format!("class_{}_books", self.number())
    }

    pub const ALL: [Grade; 3] = [Grade::Ninth, Grade::Tenth, Grade::Eleventh];
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// A registered user row.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub grade: Grade,
    pub google_query: Option<String>,
}

/// Shared handle to the bot database.
#[derive(Clone)]
pub struct Repository {
    conn: Arc<Mutex<Connection>>,
}

impl Repository {
    /// Open (or create) the database at `path` and bring the schema up.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {path}"))?;
        init_database_schema(&conn)?;
        seed_textbooks(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Look up a user by Telegram id.
    pub async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT user_id, user_class, google_query FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()
            .context("Failed to read user")?;

        Ok(row.and_then(|(user_id, class, google_query)| {
            Grade::from_number(class).map(|grade| User {
                user_id,
                grade,
                google_query,
            })
        }))
    }

    /// Register a brand-new user with the chosen grade.
    pub async fn add_user(&self, user_id: i64, grade: Grade) -> Result<()> {
        info!("Registering user {} with grade {}", user_id, grade);
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (user_id, user_class) VALUES (?1, ?2)",
            params![user_id, grade.number()],
        )
        .context("Failed to insert user")?;
        Ok(())
    }

    /// Overwrite the grade of an existing user.
    pub async fn update_user_grade(&self, user_id: i64, grade: Grade) -> Result<()> {
        info!("Updating grade of user {} to {}", user_id, grade);
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE users SET user_class = ?1 WHERE user_id = ?2",
            params![grade.number(), user_id],
        )
        .context("Failed to update user grade")?;
        Ok(())
    }

    /// Grade of a registered user, if any.
    pub async fn grade_of(&self, user_id: i64) -> Result<Option<Grade>> {
        Ok(self.find_user(user_id).await?.map(|u| u.grade))
    }

    /// The comma-joined cached search result for a user.
    pub async fn cached_query(&self, user_id: i64) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let cached = conn
            .query_row(
                "SELECT google_query FROM users WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()
            .context("Failed to read cached query")?;
        Ok(cached.flatten())
    }

    /// Persist the comma-joined search result for a user.
    pub async fn set_cached_query(&self, user_id: i64, query: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE users SET google_query = ?1 WHERE user_id = ?2",
            params![query, user_id],
        )
        .context("Failed to store cached query")?;
        Ok(())
    }

    /// Drop the cached search result for a user.
    pub async fn clear_cached_query(&self, user_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "UPDATE users SET google_query = NULL WHERE user_id = ?1",
            params![user_id],
        )
        .context("Failed to clear cached query")?;
        Ok(())
    }

    /// Textbook names available for a grade and subject.
    pub async fn textbooks(&self, grade: Grade, subject: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT book_name FROM {} WHERE book_subject = ?1",
            grade.books_table()
        );
        let mut stmt = conn.prepare(&sql).context("Failed to prepare textbook query")?;
        let names = stmt
            .query_map(params![subject], |row| row.get::<_, String>(0))
            .context("Failed to list textbooks")?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// URL template (prefix, suffix) for a textbook of a grade.
    pub async fn textbook_url(
        &self,
        grade: Grade,
        book_name: &str,
    ) -> Result<Option<(String, String)>> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT book_url, book_url_2 FROM {} WHERE book_name = ?1",
            grade.books_table()
        );
        conn.query_row(&sql, params![book_name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .optional()
        .context("Failed to read textbook url")
    }
}

/// Initialize the database schema.
pub fn init_database_schema(conn: &Connection) -> Result<()> {
    info!("Initializing database schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            user_id INTEGER PRIMARY KEY,
            user_class INTEGER NOT NULL,
            google_query TEXT
        )",
        [],
    )
    .context("Failed to create users table")?;

    for grade in Grade::ALL {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                book_subject TEXT NOT NULL,
                book_name TEXT NOT NULL,
                book_url TEXT NOT NULL,
                book_url_2 TEXT NOT NULL
            )",
            grade.books_table()
        );
        conn.execute(&sql, [])
            .with_context(|| format!("Failed to create books table for grade {grade}"))?;
    }

    info!("Database schema initialized successfully");
    Ok(())
}

// (grade, subject, book, url prefix, url suffix); the composed task URL is
// prefix + task-number + suffix.
const TEXTBOOK_SEED: &[(u8, &str, &str, &str, &str)] = &[
    (
        9,
        "Алгебра",
        "Макарычев Ю.Н.",
        "https://gdz.im/9-klass/algebra/makarychev/zadanie-",
        "/",
    ),
    (
        9,
        "Геометрия",
        "Атанасян Л.С.",
        "https://gdz.im/9-klass/geometriya/atanasyan/zadanie-",
        "/",
    ),
    (
        9,
        "Физика",
        "Перышкин А.В.",
        "https://gdz.im/9-klass/fizika/peryshkin/uprazhnenie-",
        "/",
    ),
    (
        9,
        "Химия",
        "Габриелян О.С.",
        "https://gdz.im/9-klass/himiya/gabrielyan/zadanie-",
        "/",
    ),
    (
        10,
        "Алгебра",
        "Алимов Ш.А.",
        "https://gdz.im/10-klass/algebra/alimov/zadanie-",
        "/",
    ),
    (
        10,
        "Геометрия",
        "Атанасян Л.С.",
        "https://gdz.im/10-klass/geometriya/atanasyan/zadanie-",
        "/",
    ),
    (
        10,
        "Физика",
        "Мякишев Г.Я.",
        "https://gdz.im/10-klass/fizika/myakishev/uprazhnenie-",
        "/",
    ),
    (
        10,
        "Химия",
        "Габриелян О.С.",
        "https://gdz.im/10-klass/himiya/gabrielyan/zadanie-",
        "/",
    ),
    (
        11,
        "Алгебра",
        "Алимов Ш.А.",
        "https://gdz.im/11-klass/algebra/alimov/zadanie-",
        "/",
    ),
    (
        11,
        "Геометрия",
        "Атанасян Л.С.",
        "https://gdz.im/11-klass/geometriya/atanasyan/zadanie-",
        "/",
    ),
    (
        11,
        "Физика",
        "Мякишев Г.Я.",
        "https://gdz.im/11-klass/fizika/myakishev/uprazhnenie-",
        "/",
    ),
    (
        11,
        "Химия",
        "Габриелян О.С.",
        "https://gdz.im/11-klass/himiya/gabrielyan/zadanie-",
        "/",
    ),
];

/// Seed the textbook catalog. The catalog is static reference data; seeding
/// only runs when the grade-9 table is empty so redeploys keep manual edits.
pub fn seed_textbooks(conn: &Connection) -> Result<()> {
    let existing: i64 = conn
        .query_row("SELECT COUNT(*) FROM class_9_books", [], |row| row.get(0))
        .context("Failed to count seeded textbooks")?;
    if existing > 0 {
        return Ok(());
    }

    info!("Seeding textbook catalog ({} entries)", TEXTBOOK_SEED.len());
    for (grade, subject, name, url, url_2) in TEXTBOOK_SEED {
        let sql = format!(
            "INSERT INTO class_{}_books (book_subject, book_name, book_url, book_url_2)
             VALUES (?1, ?2, ?3, ?4)",
            grade
        );
        conn.execute(&sql, params![subject, name, url, url_2])
            .context("Failed to seed textbook row")?;
    }
    Ok(())
}
