use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::NaiveDateTime;

// Статусы регистрации - для выпадающих списков; как и у события,
// свободные строки не отклоняются
pub const REGISTRATION_STATUSES: [&str; 5] = ["unpaid", "paid", "refunded", "cancelled", "completed"];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub visitor_id: i64,
    pub event_id: i64,
    pub status: String,
    pub price: Option<i64>,
    pub billed_amount: Option<i64>,
    pub refund_amount: Option<i64>,
    pub billed_at: Option<NaiveDateTime>,
    pub refunded_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// Разобранные поля формы обновления регистрации
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentUpdate {
    pub billed_amount: Option<i64>,
    pub refund_amount: Option<i64>,
}

impl Registration {
    // Бесплатное событие считается оплаченным сразу
    pub fn initial_status(event_price: i64) -> &'static str {
        if event_price == 0 {
            "paid"
        } else {
            "unpaid"
        }
    }

    pub async fn find_by_id(
        id: i64,
        pool: &sqlx::PgPool,
    ) -> Result<Option<Registration>, sqlx::Error> {
        sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // Цена фиксируется из события в момент регистрации и позже
    // не пересчитывается
    pub async fn insert(
        pool: &sqlx::PgPool,
        visitor_id: i64,
        event_id: i64,
        event_price: i64,
    ) -> Result<Registration, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (visitor_id, event_id, status, price)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(visitor_id)
        .bind(event_id)
        .bind(Self::initial_status(event_price))
        .bind(event_price)
        .fetch_one(pool)
        .await
    }

    pub async fn save_payment(&self, pool: &sqlx::PgPool) -> Result<Registration, sqlx::Error> {
        sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations
            SET status = $1, billed_amount = $2, refund_amount = $3,
                billed_at = $4, refunded_at = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&self.status)
        .bind(self.billed_amount)
        .bind(self.refund_amount)
        .bind(self.billed_at)
        .bind(self.refunded_at)
        .bind(self.id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(id: i64, pool: &sqlx::PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Переходы статуса при обновлении: оплата засчитывается только
    // при точном совпадении суммы с зафиксированной ценой, возврат -
    // при любой положительной сумме. Оба перехода могут сработать
    // в одном вызове, возврат применяется вторым.
    pub fn apply_payment(&mut self, update: PaymentUpdate, now: NaiveDateTime) {
        if let Some(billed) = update.billed_amount {
            if billed > 0 && Some(billed) == self.price {
                self.status = "paid".to_string();
                self.billed_amount = Some(billed);
                self.billed_at = Some(now);
            }
        }
        if let Some(refund) = update.refund_amount {
            if refund > 0 {
                self.status = "refunded".to_string();
                self.refund_amount = Some(refund);
                self.refunded_at = Some(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn registration(price: Option<i64>) -> Registration {
        let created = NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Registration {
            id: 1,
            visitor_id: 1,
            event_id: 1,
            status: Registration::initial_status(price.unwrap_or(0)).to_string(),
            price,
            billed_amount: None,
            refund_amount: None,
            billed_at: None,
            refunded_at: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn free_event_is_paid_immediately() {
        assert_eq!(Registration::initial_status(0), "paid");
        assert_eq!(Registration::initial_status(100), "unpaid");
    }

    #[test]
    fn exact_billed_amount_marks_paid() {
        let mut reg = registration(Some(100));
        reg.apply_payment(
            PaymentUpdate { billed_amount: Some(100), refund_amount: None },
            now(),
        );
        assert_eq!(reg.status, "paid");
        assert_eq!(reg.billed_amount, Some(100));
        assert_eq!(reg.billed_at, Some(now()));
    }

    #[test]
    fn mismatched_billed_amount_is_ignored() {
        let mut reg = registration(Some(100));
        reg.apply_payment(
            PaymentUpdate { billed_amount: Some(50), refund_amount: None },
            now(),
        );
        assert_eq!(reg.status, "unpaid");
        assert_eq!(reg.billed_amount, None);
        assert_eq!(reg.billed_at, None);
    }

    #[test]
    fn zero_billed_amount_is_ignored_even_for_free_price() {
        // price = 0: сумма 0 не проходит по условию billed > 0
        let mut reg = registration(Some(0));
        reg.apply_payment(
            PaymentUpdate { billed_amount: Some(0), refund_amount: None },
            now(),
        );
        assert_eq!(reg.billed_amount, None);
    }

    #[test]
    fn positive_refund_marks_refunded() {
        let mut reg = registration(Some(100));
        reg.apply_payment(
            PaymentUpdate { billed_amount: None, refund_amount: Some(30) },
            now(),
        );
        assert_eq!(reg.status, "refunded");
        assert_eq!(reg.refund_amount, Some(30));
        assert_eq!(reg.refunded_at, Some(now()));
    }

    #[test]
    fn billed_and_refund_in_one_call_ends_refunded() {
        let mut reg = registration(Some(100));
        reg.apply_payment(
            PaymentUpdate { billed_amount: Some(100), refund_amount: Some(100) },
            now(),
        );
        assert_eq!(reg.status, "refunded");
        assert_eq!(reg.billed_amount, Some(100));
        assert_eq!(reg.refund_amount, Some(100));
        assert!(reg.billed_at.is_some());
        assert!(reg.refunded_at.is_some());
    }

    #[test]
    fn absent_amounts_change_nothing() {
        let mut reg = registration(Some(100));
        reg.apply_payment(PaymentUpdate::default(), now());
        assert_eq!(reg.status, "unpaid");
        assert_eq!(reg.billed_at, None);
        assert_eq!(reg.refunded_at, None);
    }
}
