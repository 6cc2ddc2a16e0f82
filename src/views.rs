//! views.rs
//!
//! Обвязка для отрисовки askama-шаблонов и фильтры форматирования.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Failed to render template: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

pub mod filters {
    use chrono::NaiveDateTime;

    pub fn format_price(value: &i64) -> askama::Result<String> {
        Ok(format!("{:.2} ₽", *value as f64))
    }

    pub fn format_datetime_ru(value: &NaiveDateTime) -> askama::Result<String> {
        Ok(value.format("%d.%m.%Y %H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::filters;
    use chrono::NaiveDate;

    #[test]
    fn price_is_formatted_in_rubles() {
        assert_eq!(filters::format_price(&100).unwrap(), "100.00 ₽");
        assert_eq!(filters::format_price(&0).unwrap(), "0.00 ₽");
    }

    #[test]
    fn datetime_uses_ru_order() {
        let ts = NaiveDate::from_ymd_opt(2026, 9, 1)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        assert_eq!(filters::format_datetime_ru(&ts).unwrap(), "01.09.2026 18:30:00");
    }
}
