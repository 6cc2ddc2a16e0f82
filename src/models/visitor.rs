use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDateTime;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Visitor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Данные для создания/полного обновления посетителя.
// Уникальность телефона и почты обеспечивает только БД.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VisitorPayload {
    #[validate(length(min = 1, message = "first_name не может быть пустым"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name не может быть пустым"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "phone не может быть пустым"))]
    pub phone: String,
    #[validate(email(message = "некорректный адрес почты"))]
    pub email: Option<String>,
}

impl Visitor {
    pub async fn find_by_id(id: i64, pool: &sqlx::PgPool) -> Result<Option<Visitor>, sqlx::Error> {
        sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &sqlx::PgPool) -> Result<Vec<Visitor>, sqlx::Error> {
        sqlx::query_as::<_, Visitor>("SELECT * FROM visitors ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn insert(pool: &sqlx::PgPool, payload: &VisitorPayload) -> Result<Visitor, sqlx::Error> {
        sqlx::query_as::<_, Visitor>(
            r#"
            INSERT INTO visitors (first_name, last_name, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        id: i64,
        pool: &sqlx::PgPool,
        payload: &VisitorPayload,
    ) -> Result<Option<Visitor>, sqlx::Error> {
        sqlx::query_as::<_, Visitor>(
            r#"
            UPDATE visitors
            SET first_name = $1, last_name = $2, phone = $3, email = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.phone)
        .bind(&payload.email)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(id: i64, pool: &sqlx::PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: Option<&str>) -> VisitorPayload {
        VisitorPayload {
            first_name: "Алексей".to_string(),
            last_name: "Петров".to_string(),
            phone: "+7 900 123-45-67".to_string(),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn accepts_visitor_without_email() {
        assert!(payload(None).validate().is_ok());
    }

    #[test]
    fn accepts_valid_email() {
        assert!(payload(Some("alex@example.com")).validate().is_ok());
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(payload(Some("not-an-email")).validate().is_err());
    }

    #[test]
    fn rejects_empty_phone() {
        let mut p = payload(None);
        p.phone = String::new();
        assert!(p.validate().is_err());
    }
}
