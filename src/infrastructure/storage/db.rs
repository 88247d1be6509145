use crate::domain::error::ReviewError;
use crate::domain::model::Review;
use crate::domain::traits::ReviewStore;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio_rusqlite::{params, Connection};

const SELECT_REVIEWS: &str =
    "SELECT id, header, content, date, product_id, is_hidden FROM product_reviews";

pub async fn init_database(db_path: &Path) -> Result<Connection, ReviewError> {
    let db = Connection::open(db_path.to_path_buf()).await?;
    create_schema(&db).await?;
    Ok(db)
}

/// Opens a private in-memory database with the review schema applied.
pub async fn init_memory_database() -> Result<Connection, ReviewError> {
    let db = Connection::open_in_memory().await?;
    create_schema(&db).await?;
    Ok(db)
}

async fn create_schema(db: &Connection) -> Result<(), ReviewError> {
    db.call(|conn| {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS product_reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                header TEXT NOT NULL CHECK (length(header) > 0),
                content TEXT NOT NULL CHECK (length(content) > 0),
                date TEXT NOT NULL,
                product_id INTEGER NOT NULL,
                is_hidden INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_product_reviews_product
                ON product_reviews(product_id, is_hidden)",
            [],
        )?;

        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(())
}

pub async fn count_reviews(db: &Connection) -> Result<usize, ReviewError> {
    let count: i64 = db
        .call(|conn| {
            conn.query_row("SELECT COUNT(*) FROM product_reviews", params![], |row| {
                row.get(0)
            })
        })
        .await?;

    Ok(count as usize)
}

// 待提交的变更
#[derive(Debug)]
enum PendingChange {
    Insert(Review),
    Update(Review),
}

/// SQLite-backed [`ReviewStore`].
///
/// Ids are handed out at insert time from a counter seeded with the highest
/// id the table has ever used, so an id is never reused even after rows are
/// lost to a failed commit.
pub struct SqliteReviewStore {
    conn: Connection,
    next_id: AtomicI64,
    pending: Mutex<Vec<PendingChange>>,
}

impl SqliteReviewStore {
    pub async fn new(conn: Connection) -> Result<Self, ReviewError> {
        let last_id: i64 = conn
            .call(|conn| {
                // sqlite_sequence only has a row once something was inserted
                conn.query_row(
                    "SELECT MAX(
                        COALESCE((SELECT MAX(id) FROM product_reviews), 0),
                        COALESCE((SELECT seq FROM sqlite_sequence WHERE name = 'product_reviews'), 0)
                    )",
                    params![],
                    |row| row.get(0),
                )
            })
            .await?;

        Ok(Self {
            conn,
            next_id: AtomicI64::new(last_id + 1),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn select(&self, product_id: Option<i64>) -> Result<Vec<Review>, ReviewError> {
        let reviews = self
            .conn
            .call(move |conn| {
                let reviews = match product_id {
                    Some(product_id) => {
                        let mut stmt = conn.prepare(&format!(
                            "{} WHERE product_id = ?1 AND is_hidden = 0 ORDER BY id",
                            SELECT_REVIEWS
                        ))?;
                        let rows = stmt
                            .query_map(params![product_id], review_from_row)?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        rows
                    }
                    None => {
                        let mut stmt =
                            conn.prepare(&format!("{} ORDER BY id", SELECT_REVIEWS))?;
                        let rows = stmt
                            .query_map(params![], review_from_row)?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        rows
                    }
                };
                Ok::<_, rusqlite::Error>(reviews)
            })
            .await?;

        Ok(reviews)
    }
}

#[async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn list_all(&self) -> Result<Vec<Review>, ReviewError> {
        self.select(None).await
    }

    async fn list_visible_for_product(&self, product_id: i64) -> Result<Vec<Review>, ReviewError> {
        self.select(Some(product_id)).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>, ReviewError> {
        use rusqlite::OptionalExtension;

        let review = self
            .conn
            .call(move |conn| {
                conn.query_row(
                    &format!("{} WHERE id = ?1", SELECT_REVIEWS),
                    params![id],
                    review_from_row,
                )
                .optional()
            })
            .await?;

        Ok(review)
    }

    async fn insert(&self, mut review: Review) -> Result<Review, ReviewError> {
        review.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().push(PendingChange::Insert(review.clone()));
        tracing::debug!(id = review.id, "staged review insert");
        Ok(review)
    }

    async fn mark_dirty(&self, review: &Review) -> Result<(), ReviewError> {
        self.pending.lock().push(PendingChange::Update(review.clone()));
        tracing::debug!(id = review.id, "staged review update");
        Ok(())
    }

    async fn commit(&self) -> Result<(), ReviewError> {
        let changes = std::mem::take(&mut *self.pending.lock());
        if changes.is_empty() {
            return Ok(());
        }
        let count = changes.len();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                for change in changes {
                    match change {
                        PendingChange::Insert(review) => {
                            tx.execute(
                                "INSERT INTO product_reviews (id, header, content, date, product_id, is_hidden)
                                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                                params![
                                    review.id,
                                    review.header,
                                    review.content,
                                    encode_date(&review.date),
                                    review.product_id,
                                    review.is_hidden
                                ],
                            )?;
                        }
                        PendingChange::Update(review) => {
                            // visibility is the only column that changes after insert
                            let updated = tx.execute(
                                "UPDATE product_reviews SET is_hidden = ?2 WHERE id = ?1",
                                params![review.id, review.is_hidden],
                            )?;
                            if updated == 0 {
                                return Err(rusqlite::Error::QueryReturnedNoRows);
                            }
                        }
                    }
                }
                tx.commit()?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;

        tracing::debug!(changes = count, "committed review changes");
        Ok(())
    }
}

fn review_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    let date: String = row.get(3)?;
    Ok(Review {
        id: row.get(0)?,
        header: row.get(1)?,
        content: row.get(2)?,
        date: decode_date(&date).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        product_id: row.get(4)?,
        is_hidden: row.get(5)?,
    })
}

// 纳秒精度，保证读回的时间与创建时返回的一致
fn encode_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|d| d.with_timezone(&Utc))
}
