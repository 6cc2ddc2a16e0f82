//! registrations.rs
//!
//! HTML-интерфейс регистраций.
//!
//! Включает в себя следующую функциональность:
//! - Список с фильтрами по событию, посетителю и статусу.
//! - Создание регистрации с фиксацией цены события.
//! - Обновление оплаты/возврата с переходами статуса.
//! - Удаление с редиректом.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::controllers::{order_clause, parse_numeric_param};
use crate::error::AppError;
use crate::models::registration::{PaymentUpdate, Registration, REGISTRATION_STATUSES};
use crate::models::{Event, Visitor};
use crate::views::{filters, HtmlTemplate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/registrations/", get(list_registrations))
        .route(
            "/registrations/create/",
            get(create_registration_form).post(create_registration),
        )
        .route(
            "/registrations/{id}/update/",
            get(update_registration_form).post(update_registration),
        )
        .route("/registrations/{id}/delete/", get(delete_registration))
}

/* ---------- helpers ---------- */

const SORTABLE_COLUMNS: [&str; 11] = [
    "id",
    "visitor_id",
    "event_id",
    "status",
    "price",
    "billed_amount",
    "refund_amount",
    "billed_at",
    "refunded_at",
    "created_at",
    "updated_at",
];

async fn find_registration_or_404(
    pool: &sqlx::PgPool,
    registration_id: i64,
) -> Result<Registration, AppError> {
    Registration::find_by_id(registration_id, pool)
        .await?
        .ok_or_else(|| AppError::not_found("Регистрация не найдена"))
}

// Справочники "ID события -> название" и "ID посетителя -> имя"
// строятся по полному набору регистраций, без учета активных фильтров
async fn display_lookups(
    pool: &sqlx::PgPool,
) -> Result<(HashMap<i64, String>, HashMap<i64, String>), sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, i64, String, String)>(
        r#"
        SELECT r.event_id, e.title, r.visitor_id, v.first_name, v.last_name
        FROM registrations r
        JOIN events e ON e.id = r.event_id
        JOIN visitors v ON v.id = r.visitor_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut event_titles: HashMap<i64, String> = HashMap::new();
    let mut visitor_names: HashMap<i64, String> = HashMap::new();
    for (event_id, title, visitor_id, first_name, last_name) in rows {
        event_titles.entry(event_id).or_insert(title);
        visitor_names
            .entry(visitor_id)
            .or_insert_with(|| format!("{} {}", first_name, last_name));
    }
    Ok((event_titles, visitor_names))
}

/* ---------- СПИСОК ---------- */

// GET /registrations/
#[derive(Debug, Deserialize)]
struct RegistrationsQuery {
    event_id: Option<String>,
    visitor_id: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<i32>,
    status: Option<String>,
}

// Строка таблицы со справочными полями; необязательные суммы и даты
// форматируются заранее, чтобы не усложнять шаблон
struct RegistrationRow {
    registration: Registration,
    event_title: String,
    visitor_name: String,
    price: String,
    billed_amount: String,
    refund_amount: String,
    billed_at: String,
    refunded_at: String,
}

#[derive(Template)]
#[template(path = "registration/index.html")]
struct RegistrationIndexTemplate {
    rows: Vec<RegistrationRow>,
    event_options: Vec<(i64, String)>,
    visitor_options: Vec<(i64, String)>,
    sort_by: String,
    sort_order: i32,
    statuses: Vec<String>,
    status: String,
    event_id: String,
    visitor_id: String,
}

async fn list_registrations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegistrationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let event_id = parse_numeric_param(params.event_id.as_deref(), "Некорректный ID события")?;
    let visitor_id = parse_numeric_param(params.visitor_id.as_deref(), "Некорректный ID посетителя")?;
    let status = params.status.clone().unwrap_or_default();

    let (event_titles, visitor_names) = display_lookups(&state.db.pool).await?;

    let mut sql = String::from("SELECT r.* FROM registrations r");
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1;
    if event_id.is_some() {
        conditions.push(format!("r.event_id = ${}", bind_idx));
        bind_idx += 1;
    }
    if visitor_id.is_some() {
        conditions.push(format!("r.visitor_id = ${}", bind_idx));
        bind_idx += 1;
    }
    if !status.is_empty() {
        conditions.push(format!("r.status = ${}", bind_idx));
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&order_clause(
        "r",
        &SORTABLE_COLUMNS,
        params.sort_by.as_deref(),
        params.sort_order,
    ));

    let mut query = sqlx::query_as::<_, Registration>(&sql);
    if let Some(event_id) = event_id {
        query = query.bind(event_id);
    }
    if let Some(visitor_id) = visitor_id {
        query = query.bind(visitor_id);
    }
    if !status.is_empty() {
        query = query.bind(status.clone());
    }

    let registrations = query.fetch_all(&state.db.pool).await.map_err(|e| {
        tracing::error!("list_registrations sql error: {:?}", e);
        AppError::from(e)
    })?;

    let rows = registrations
        .into_iter()
        .map(|registration| {
            let event_title = event_titles
                .get(&registration.event_id)
                .cloned()
                .unwrap_or_default();
            let visitor_name = visitor_names
                .get(&registration.visitor_id)
                .cloned()
                .unwrap_or_default();
            RegistrationRow {
                event_title,
                visitor_name,
                price: format_optional_price(registration.price),
                billed_amount: format_optional_price(registration.billed_amount),
                refund_amount: format_optional_price(registration.refund_amount),
                billed_at: format_optional_datetime(registration.billed_at),
                refunded_at: format_optional_datetime(registration.refunded_at),
                registration,
            }
        })
        .collect();

    let mut event_options: Vec<(i64, String)> =
        event_titles.into_iter().collect();
    event_options.sort_by_key(|(id, _)| *id);
    let mut visitor_options: Vec<(i64, String)> =
        visitor_names.into_iter().collect();
    visitor_options.sort_by_key(|(id, _)| *id);

    Ok(HtmlTemplate(RegistrationIndexTemplate {
        rows,
        event_options,
        visitor_options,
        sort_by: params.sort_by.unwrap_or_default(),
        sort_order: params.sort_order.unwrap_or(0),
        statuses: REGISTRATION_STATUSES.iter().map(|s| s.to_string()).collect(),
        status,
        event_id: params.event_id.unwrap_or_default(),
        visitor_id: params.visitor_id.unwrap_or_default(),
    }))
}

fn format_optional_price(value: Option<i64>) -> String {
    match value {
        Some(amount) => format!("{:.2} ₽", amount as f64),
        None => "-".to_string(),
    }
}

fn format_optional_datetime(value: Option<chrono::NaiveDateTime>) -> String {
    match value {
        Some(ts) => ts.format("%d.%m.%Y %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/* ---------- СОЗДАНИЕ ---------- */

// GET /registrations/create/
#[derive(Template)]
#[template(path = "registration/create.html")]
struct RegistrationCreateTemplate {
    events: Vec<Event>,
    visitors: Vec<Visitor>,
}

async fn create_registration_form(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let events = Event::find_all(&state.db.pool).await?;
    let visitors = Visitor::find_all(&state.db.pool).await?;
    Ok(HtmlTemplate(RegistrationCreateTemplate { events, visitors }))
}

// POST /registrations/create/
#[derive(Debug, Deserialize)]
struct RegistrationForm {
    event_id: i64,
    visitor_id: i64,
}

async fn create_registration(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegistrationForm>,
) -> Result<Redirect, AppError> {
    let visitor = Visitor::find_by_id(form.visitor_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Посетитель не найден"))?;
    let event = Event::find_by_id(form.event_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Событие не найдено"))?;

    Registration::insert(&state.db.pool, visitor.id, event.id, event.price).await?;
    Ok(Redirect::to("/registrations/"))
}

/* ---------- ОБНОВЛЕНИЕ ОПЛАТЫ ---------- */

// GET /registrations/{id}/update/
#[derive(Template)]
#[template(path = "registration/update.html")]
struct RegistrationUpdateTemplate {
    registration: Registration,
}

async fn update_registration_form(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let registration = find_registration_or_404(&state.db.pool, registration_id).await?;
    Ok(HtmlTemplate(RegistrationUpdateTemplate { registration }))
}

// POST /registrations/{id}/update/
#[derive(Debug, Deserialize)]
struct PaymentForm {
    billed_amount: Option<String>,
    refund_amount: Option<String>,
}

async fn update_registration(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<i64>,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect, AppError> {
    let billed_amount =
        parse_numeric_param(form.billed_amount.as_deref(), "Некорректная оплаченная сумма")?;
    let refund_amount =
        parse_numeric_param(form.refund_amount.as_deref(), "Некорректная сумма возврата")?;

    let mut registration = find_registration_or_404(&state.db.pool, registration_id).await?;
    registration.apply_payment(
        PaymentUpdate {
            billed_amount,
            refund_amount,
        },
        Utc::now().naive_utc(),
    );
    registration.save_payment(&state.db.pool).await?;

    Ok(Redirect::to("/registrations/"))
}

/* ---------- УДАЛЕНИЕ ---------- */

// GET /registrations/{id}/delete/
async fn delete_registration(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let deleted = Registration::delete(registration_id, &state.db.pool).await?;
    if !deleted {
        return Err(AppError::not_found("Регистрация не найдена"));
    }
    Ok(Redirect::to("/registrations/"))
}
