use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use intake_core::domain::order::{format_timestamp, NewOrder, Order, OrderId};
use intake_core::domain::submission::{ContactMethod, Submission};

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let submission = &order.submission;
        // Absent optional fields bind as NULL; every column is named explicitly.
        let result = sqlx::query(
            "INSERT INTO orders
                (name, email, phone, contact_method, message, country,
                 username, verification_status, selected_card, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.phone)
        .bind(submission.contact_method.map(ContactMethod::as_str))
        .bind(submission.message.as_deref())
        .bind(submission.country.as_deref())
        .bind(submission.username.as_deref())
        .bind(submission.verification_status.as_deref())
        .bind(submission.selected_card.as_deref())
        .bind(format_timestamp(&order.created_at))
        .execute(&self.pool)
        .await?;

        let id = OrderId(result.last_insert_rowid());
        debug!(event_name = "db.orders.inserted", order_id = %id, "order row inserted");
        Ok(order.into_order(id))
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, contact_method, message, country,
                    username, verification_status, selected_card, created_at
             FROM orders WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_order(&row)).transpose()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn decode_order(row: &SqliteRow) -> Result<Order, RepositoryError> {
    let contact_method = row
        .try_get::<Option<String>, _>("contact_method")?
        .map(|raw| {
            ContactMethod::parse(&raw)
                .ok_or_else(|| RepositoryError::Decode(format!("unknown contact method `{raw}`")))
        })
        .transpose()?;

    let created_at_raw: String = row.try_get("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid created_at `{created_at_raw}`: {error}"))
        })?
        .with_timezone(&Utc);

    Ok(Order {
        id: OrderId(row.try_get("id")?),
        submission: Submission {
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            contact_method,
            message: row.try_get("message")?,
            country: row.try_get("country")?,
            username: row.try_get("username")?,
            verification_status: row.try_get("verification_status")?,
            selected_card: row.try_get("selected_card")?,
        },
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sqlx::Row;

    use intake_core::domain::order::{NewOrder, OrderId};
    use intake_core::domain::submission::{ContactMethod, Submission};

    use super::SqlOrderRepository;
    use crate::repositories::{OrderRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn submission() -> Submission {
        Submission {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            contact_method: Some(ContactMethod::Discord),
            message: None,
            country: Some("United Kingdom".to_string()),
            username: Some("ada#1815".to_string()),
            verification_status: Some("verified".to_string()),
            selected_card: None,
        }
    }

    fn new_order() -> NewOrder {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("timestamp");
        NewOrder::new(submission(), created_at)
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips_fields() {
        let pool = setup().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let stored = repo.insert(new_order()).await.expect("insert");
        let loaded = repo.find_by_id(stored.id).await.expect("find").expect("order exists");

        assert_eq!(loaded, stored);
        assert_eq!(loaded.submission.contact_method, Some(ContactMethod::Discord));
        pool.close().await;
    }

    #[tokio::test]
    async fn absent_optional_fields_are_stored_as_null() {
        let pool = setup().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let stored = repo.insert(new_order()).await.expect("insert");
        let row = sqlx::query(
            "SELECT message IS NULL AS message_null, selected_card IS NULL AS card_null
             FROM orders WHERE id = ?",
        )
        .bind(stored.id.0)
        .fetch_one(&pool)
        .await
        .expect("select");

        assert_eq!(row.get::<i64, _>("message_null"), 1);
        assert_eq!(row.get::<i64, _>("card_null"), 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn identical_inserts_get_distinct_increasing_ids() {
        let pool = setup().await;
        let repo = SqlOrderRepository::new(pool.clone());

        let first = repo.insert(new_order()).await.expect("first insert");
        let second = repo.insert(new_order()).await.expect("second insert");

        assert!(second.id > first.id, "ids should be monotonic");
        assert_eq!(repo.count().await.expect("count"), 2);
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_order_is_none() {
        let pool = setup().await;
        let repo = SqlOrderRepository::new(pool.clone());

        assert!(repo.find_by_id(OrderId(404)).await.expect("find").is_none());
        pool.close().await;
    }

    #[tokio::test]
    async fn insert_without_schema_is_a_database_error() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        let repo = SqlOrderRepository::new(pool.clone());

        let error = repo.insert(new_order()).await.expect_err("orders table is missing");
        assert!(matches!(error, RepositoryError::Database(_)));
        pool.close().await;
    }
}
