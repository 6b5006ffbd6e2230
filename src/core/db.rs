// database access for questions and categories
// supports postgres and sqlite through the any driver

use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use sqlx::{any::AnyPoolOptions, any::AnyRow, AnyPool, Row};
use std::time::Duration;
use tracing::debug;

const QUESTION_COLUMNS: &str = "id, question, answer, category, difficulty";

// categories created by `init --seed` on an empty store
const SEED_CATEGORIES: [&str; 6] = [
    "Science",
    "Art",
    "Geography",
    "History",
    "Entertainment",
    "Sports",
];

pub struct Db {
    pool: AnyPool,
    dialect: Dialect,
}

/// A stored trivia question.
///
/// Create performs no validation, so every column besides `id` may be null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: i64,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub category: Option<i64>,
    pub difficulty: Option<i64>,
}

/// Fields accepted when creating a question. Missing fields are stored as null.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewQuestion {
    pub question: Option<String>,
    pub answer: Option<String>,
    #[serde(deserialize_with = "loose_integer")]
    pub category: Option<i64>,
    #[serde(deserialize_with = "loose_integer")]
    pub difficulty: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub label: String,
}

/// Reads an integer sent either as a json number or as a numeric string.
pub fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// web clients send ids from form fields as strings
fn loose_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => integer_value(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {value}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Postgres,
    Sqlite,
}

impl Db {
    pub async fn connect(url: &str) -> Result<Self, Error> {
        sqlx::any::install_default_drivers();

        let dialect = detect_dialect(url);

        // every connection to an in-memory sqlite url opens its own empty database,
        // so keep exactly one alive for the lifetime of the pool
        let options = if is_in_memory(url) {
            AnyPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            AnyPoolOptions::new().max_connections(5)
        };

        let pool = options.connect(url).await?;

        Ok(Self { pool, dialect })
    }

    pub fn dialect_name(&self) -> &'static str {
        match self.dialect {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    // create both tables if missing, optionally filling an empty category table
    pub async fn init_schema(&self, seed: bool) -> Result<(), Error> {
        let ddl: [&str; 2] = match self.dialect {
            Dialect::Postgres => [
                "CREATE TABLE IF NOT EXISTS categories (
                    id BIGSERIAL PRIMARY KEY,
                    type TEXT NOT NULL
                )",
                "CREATE TABLE IF NOT EXISTS questions (
                    id BIGSERIAL PRIMARY KEY,
                    question TEXT,
                    answer TEXT,
                    category BIGINT,
                    difficulty BIGINT
                )",
            ],
            Dialect::Sqlite => [
                "CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    type TEXT NOT NULL
                )",
                "CREATE TABLE IF NOT EXISTS questions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    question TEXT,
                    answer TEXT,
                    category INTEGER,
                    difficulty INTEGER
                )",
            ],
        };

        for statement in ddl {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        if seed && self.categories().await?.is_empty() {
            for label in SEED_CATEGORIES {
                self.insert_category(label).await?;
            }
            debug!(count = SEED_CATEGORIES.len(), "seeded categories");
        }

        Ok(())
    }

    pub async fn questions(&self) -> Result<Vec<Question>, Error> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(question_from_row).collect()
    }

    // case-insensitive substring match on the question text
    // sqlite only folds ascii case, so both sides go through the same LOWER
    pub async fn search_questions(&self, term: &str) -> Result<Vec<Question>, Error> {
        let condition = match self.dialect {
            Dialect::Postgres => "question ILIKE $1",
            Dialect::Sqlite => "LOWER(question) LIKE LOWER($1)",
        };
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE {condition} ORDER BY id");
        let pattern = format!("%{term}%");
        debug!(%pattern, "searching questions");

        let rows = sqlx::query(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(question_from_row).collect()
    }

    pub async fn questions_in_category(&self, category: i64) -> Result<Vec<Question>, Error> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE category = $1 ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(question_from_row).collect()
    }

    /// Questions not listed in `excluded`, limited to `category` when one is given.
    pub async fn quiz_candidates(
        &self,
        category: Option<i64>,
        excluded: &[i64],
    ) -> Result<Vec<Question>, Error> {
        let mut sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE 1 = 1");
        let mut next = 1;

        if category.is_some() {
            sql.push_str(&format!(" AND category = ${next}"));
            next += 1;
        }
        if !excluded.is_empty() {
            sql.push_str(&format!(
                " AND id NOT IN ({})",
                placeholders(next, excluded.len())
            ));
        }
        sql.push_str(" ORDER BY id");

        let mut query = sqlx::query(&sql);
        if let Some(category) = category {
            query = query.bind(category);
        }
        for id in excluded {
            query = query.bind(*id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(question_from_row).collect()
    }

    pub async fn question(&self, id: i64) -> Result<Option<Question>, Error> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(question_from_row).transpose()
    }

    pub async fn count_questions(&self) -> Result<i64, Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // returns the id the store assigned
    pub async fn insert_question(&self, new: &NewQuestion) -> Result<i64, Error> {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO questions (question, answer, category, difficulty)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(new.question.clone())
        .bind(new.answer.clone())
        .bind(new.category)
        .bind(new.difficulty)
        .fetch_one(&self.pool)
        .await?;

        debug!(id, "inserted question");
        Ok(id)
    }

    pub async fn delete_question(&self, id: i64) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(id, rows = result.rows_affected(), "deleted question");
        Ok(())
    }

    pub async fn category(&self, id: i64) -> Result<Option<Category>, Error> {
        let row = sqlx::query("SELECT id, type FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(category_from_row).transpose()
    }

    // natural store order
    pub async fn categories(&self) -> Result<Vec<Category>, Error> {
        let rows = sqlx::query("SELECT id, type FROM categories")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(category_from_row).collect()
    }

    pub async fn categories_by_label(&self) -> Result<Vec<Category>, Error> {
        let rows = sqlx::query("SELECT id, type FROM categories ORDER BY type")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(category_from_row).collect()
    }

    pub async fn insert_category(&self, label: &str) -> Result<i64, Error> {
        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO categories (type) VALUES ($1) RETURNING id")
                .bind(label.to_string())
                .fetch_one(&self.pool)
                .await?;

        Ok(id)
    }
}

// figure out dialect from connection string
fn detect_dialect(url: &str) -> Dialect {
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Dialect::Postgres
    } else {
        Dialect::Sqlite
    }
}

fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite:") && (url.contains(":memory:") || url.contains("mode=memory"))
}

// numbered placeholders work for both postgres and sqlite
fn placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn question_from_row(row: &AnyRow) -> Result<Question, Error> {
    Ok(Question {
        id: row.try_get("id")?,
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        category: row.try_get("category")?,
        difficulty: row.try_get("difficulty")?,
    })
}

fn category_from_row(row: &AnyRow) -> Result<Category, Error> {
    Ok(Category {
        id: row.try_get("id")?,
        label: row.try_get("type")?,
    })
}
