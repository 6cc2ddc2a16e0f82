use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDateTime;
use validator::Validate;

// Статусы события - только для выпадающих списков, на уровне
// валидации значение не ограничивается
pub const EVENT_STATUSES: [&str; 5] = ["planning", "ready", "active", "completed", "canceled"];

pub fn default_event_status() -> String {
    "planning".to_string()
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub description: Option<String>,
    pub location: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub price: i64,
    pub visitor_limit: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Данные для создания/полного обновления события
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EventPayload {
    #[validate(length(min = 1, message = "title не может быть пустым"))]
    pub title: String,
    #[serde(default = "default_event_status")]
    pub status: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "location не может быть пустым"))]
    pub location: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    #[serde(default)]
    #[validate(range(min = 0, message = "price должен быть неотрицательным"))]
    pub price: i64,
    #[validate(range(min = 0, message = "visitor_limit должен быть неотрицательным"))]
    pub visitor_limit: Option<i64>,
}

impl Event {
    pub async fn find_by_id(id: i64, pool: &sqlx::PgPool) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &sqlx::PgPool) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn insert(pool: &sqlx::PgPool, payload: &EventPayload) -> Result<Event, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, status, description, location, start_at, end_at, price, visitor_limit)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.status)
        .bind(&payload.description)
        .bind(&payload.location)
        .bind(payload.start_at)
        .bind(payload.end_at)
        .bind(payload.price)
        .bind(payload.visitor_limit)
        .fetch_one(pool)
        .await
    }

    // Полная замена всех полей, кроме created_at
    pub async fn update(
        id: i64,
        pool: &sqlx::PgPool,
        payload: &EventPayload,
    ) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events
            SET title = $1, status = $2, description = $3, location = $4,
                start_at = $5, end_at = $6, price = $7, visitor_limit = $8,
                updated_at = NOW()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.status)
        .bind(&payload.description)
        .bind(&payload.location)
        .bind(payload.start_at)
        .bind(payload.end_at)
        .bind(payload.price)
        .bind(payload.visitor_limit)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(id: i64, pool: &sqlx::PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn payload(price: i64, visitor_limit: Option<i64>) -> EventPayload {
        let start = NaiveDate::from_ymd_opt(2026, 9, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        EventPayload {
            title: "Конференция".to_string(),
            status: default_event_status(),
            description: None,
            location: "Москва".to_string(),
            start_at: start,
            end_at: start + chrono::Duration::hours(8),
            price,
            visitor_limit,
        }
    }

    #[test]
    fn accepts_zero_price_and_absent_limit() {
        assert!(payload(0, None).validate().is_ok());
    }

    #[test]
    fn rejects_negative_price() {
        assert!(payload(-5, None).validate().is_err());
    }

    #[test]
    fn rejects_negative_visitor_limit() {
        assert!(payload(100, Some(-1)).validate().is_err());
    }

    #[test]
    fn rejects_empty_title() {
        let mut p = payload(100, Some(50));
        p.title = String::new();
        assert!(p.validate().is_err());
    }

    #[test]
    fn default_status_is_planning() {
        assert_eq!(default_event_status(), "planning");
        assert!(EVENT_STATUSES.contains(&default_event_status().as_str()));
    }
}
