pub mod api;
pub mod events;
pub mod registrations;
pub mod visitors;

use askama::Template;
use axum::{response::IntoResponse, routing::get, Router};
use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::error::AppError;
use crate::views::HtmlTemplate;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .route("/", get(index))
        .merge(events::routes())
        .merge(visitors::routes())
        .merge(registrations::routes())
        .nest("/api", api::routes())
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

async fn index() -> impl IntoResponse {
    HtmlTemplate(IndexTemplate)
}

/* ---------- helpers ---------- */

// Числовые параметры форм и фильтров приходят строками: пустая строка
// и отсутствие значения означают None, любая не-цифра - ошибка 400
pub fn parse_numeric_param(value: Option<&str>, message: &str) -> Result<Option<i64>, AppError> {
    match value {
        None | Some("") => Ok(None),
        Some(s) if s.chars().all(|c| c.is_ascii_digit()) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::validation(message)),
        Some(_) => Err(AppError::validation(message)),
    }
}

// ORDER BY добавляется только для известной колонки сущности,
// незнакомое значение sort_by молча игнорируется.
// Ненулевой sort_order означает сортировку по убыванию.
pub fn order_clause(
    alias: &str,
    columns: &[&str],
    sort_by: Option<&str>,
    sort_order: Option<i32>,
) -> String {
    match sort_by {
        Some(column) if columns.contains(&column) => {
            let direction = if sort_order.unwrap_or(0) != 0 { "DESC" } else { "ASC" };
            format!(" ORDER BY {}.{} {}", alias, column, direction)
        }
        _ => String::new(),
    }
}

// Значения полей datetime-local из HTML-форм
pub fn parse_form_datetime(value: &str, field: &str) -> Result<NaiveDateTime, AppError> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    Err(AppError::validation(format!(
        "Некорректная дата в поле {}",
        field
    )))
}

// Пустые строки из необязательных текстовых полей форм превращаются в None
pub fn none_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn numeric_param_absent_or_empty_is_none() {
        assert_eq!(parse_numeric_param(None, "err").unwrap(), None);
        assert_eq!(parse_numeric_param(Some(""), "err").unwrap(), None);
    }

    #[test]
    fn numeric_param_digits_are_parsed() {
        assert_eq!(parse_numeric_param(Some("0"), "err").unwrap(), Some(0));
        assert_eq!(parse_numeric_param(Some("42"), "err").unwrap(), Some(42));
    }

    #[test]
    fn numeric_param_rejects_sign_and_garbage() {
        assert!(parse_numeric_param(Some("-1"), "err").is_err());
        assert!(parse_numeric_param(Some("abc"), "err").is_err());
        assert!(parse_numeric_param(Some("1.5"), "err").is_err());
        assert!(parse_numeric_param(Some(" 1"), "err").is_err());
    }

    #[test]
    fn numeric_param_keeps_the_given_message() {
        let err = parse_numeric_param(Some("x"), "Некорректный лимит посетителей").unwrap_err();
        assert_eq!(err.to_string(), "Некорректный лимит посетителей");
    }

    #[test]
    fn order_clause_ignores_unknown_columns() {
        let columns = ["id", "title"];
        assert_eq!(order_clause("e", &columns, Some("nope"), Some(1)), "");
        assert_eq!(order_clause("e", &columns, None, Some(1)), "");
    }

    #[test]
    fn order_clause_direction_follows_sort_order() {
        let columns = ["id", "title"];
        assert_eq!(
            order_clause("e", &columns, Some("title"), None),
            " ORDER BY e.title ASC"
        );
        assert_eq!(
            order_clause("e", &columns, Some("title"), Some(0)),
            " ORDER BY e.title ASC"
        );
        assert_eq!(
            order_clause("e", &columns, Some("id"), Some(1)),
            " ORDER BY e.id DESC"
        );
    }

    #[test]
    fn form_datetime_accepts_datetime_local_values() {
        assert!(parse_form_datetime("2026-09-01T10:00", "start_at").is_ok());
        assert!(parse_form_datetime("2026-09-01T10:00:30", "start_at").is_ok());
        assert!(parse_form_datetime("2026-09-01 10:00:30", "start_at").is_ok());
        assert!(parse_form_datetime("01.09.2026", "start_at").is_err());
    }

    #[test]
    fn empty_optional_fields_become_none() {
        assert_eq!(none_if_empty(Some(String::new())), None);
        assert_eq!(none_if_empty(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(none_if_empty(None), None);
    }

    proptest! {
        #[test]
        fn numeric_param_accepts_any_digit_string(value in "[0-9]{1,12}") {
            let parsed = parse_numeric_param(Some(&value), "err").unwrap();
            prop_assert_eq!(parsed, Some(value.parse::<i64>().unwrap()));
        }

        #[test]
        fn numeric_param_rejects_any_non_digit_string(value in "[^0-9]+") {
            prop_assert!(parse_numeric_param(Some(&value), "err").is_err());
        }
    }
}
