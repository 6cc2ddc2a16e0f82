//! events.rs
//!
//! HTML-интерфейс мероприятий.
//!
//! Включает в себя следующую функциональность:
//! - Список с поиском, фильтрами по статусу и посетителю, сортировкой.
//! - Карточка мероприятия с посетителями и доходами.
//! - Формы создания/редактирования и удаление с редиректом.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{none_if_empty, order_clause, parse_form_datetime, parse_numeric_param};
use crate::error::AppError;
use crate::models::event::{default_event_status, Event, EventPayload, EVENT_STATUSES};
use crate::models::Visitor;
use crate::views::{filters, HtmlTemplate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/", get(list_events))
        .route("/events/create/", get(create_event_form).post(create_event))
        .route("/events/{id}", get(view_event))
        .route("/events/{id}/update/", get(update_event_form).post(update_event))
        .route("/events/{id}/delete/", get(delete_event))
}

/* ---------- helpers ---------- */

// Колонки, по которым разрешена сортировка списка
const SORTABLE_COLUMNS: [&str; 11] = [
    "id",
    "title",
    "status",
    "description",
    "location",
    "start_at",
    "end_at",
    "price",
    "visitor_limit",
    "created_at",
    "updated_at",
];

async fn find_event_or_404(pool: &sqlx::PgPool, event_id: i64) -> Result<Event, AppError> {
    Event::find_by_id(event_id, pool)
        .await?
        .ok_or_else(|| AppError::not_found("Событие не найдено"))
}

/* ---------- СПИСОК ---------- */

// GET /events/
#[derive(Debug, Deserialize)]
struct EventsQuery {
    visitor_id: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<i32>,
    search: Option<String>,
    status: Option<String>,
}

#[derive(Template)]
#[template(path = "event/index.html")]
struct EventIndexTemplate {
    events: Vec<Event>,
    sort_by: String,
    sort_order: i32,
    search: String,
    statuses: Vec<String>,
    status: String,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let visitor_id = parse_numeric_param(params.visitor_id.as_deref(), "Некорректный ID посетителя")?;
    let search = params.search.clone().unwrap_or_default();
    let status = params.status.clone().unwrap_or_default();

    // Фильтр по посетителю идет через таблицу регистраций
    let mut sql = String::from("SELECT e.* FROM events e");
    if visitor_id.is_some() {
        sql.push_str(" JOIN registrations r ON r.event_id = e.id");
    }

    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1;
    if visitor_id.is_some() {
        conditions.push(format!("r.visitor_id = ${}", bind_idx));
        bind_idx += 1;
    }
    if !search.is_empty() {
        conditions.push(format!(
            "(e.title ILIKE ${idx} OR e.description ILIKE ${idx} OR e.location ILIKE ${idx})",
            idx = bind_idx
        ));
        bind_idx += 1;
    }
    if !status.is_empty() {
        conditions.push(format!("e.status = ${}", bind_idx));
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&order_clause(
        "e",
        &SORTABLE_COLUMNS,
        params.sort_by.as_deref(),
        params.sort_order,
    ));

    let mut query = sqlx::query_as::<_, Event>(&sql);
    if let Some(visitor_id) = visitor_id {
        query = query.bind(visitor_id);
    }
    if !search.is_empty() {
        query = query.bind(format!("%{}%", search));
    }
    if !status.is_empty() {
        query = query.bind(status.clone());
    }

    let events = query.fetch_all(&state.db.pool).await.map_err(|e| {
        tracing::error!("list_events sql error: {:?}", e);
        AppError::from(e)
    })?;

    Ok(HtmlTemplate(EventIndexTemplate {
        events,
        sort_by: params.sort_by.unwrap_or_default(),
        sort_order: params.sort_order.unwrap_or(0),
        search,
        statuses: EVENT_STATUSES.iter().map(|s| s.to_string()).collect(),
        status,
    }))
}

/* ---------- КАРТОЧКА ---------- */

// GET /events/{id}
#[derive(Template)]
#[template(path = "event/view.html")]
struct EventViewTemplate {
    event: Event,
    visitors: Vec<Visitor>,
    total_income: i64,
    expected_income: i64,
}

async fn view_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event_or_404(&state.db.pool, event_id).await?;

    // Посетители через регистрации; несколько регистраций одного
    // посетителя дают повторяющиеся строки
    let visitors = sqlx::query_as::<_, Visitor>(
        "SELECT v.* FROM visitors v JOIN registrations r ON r.visitor_id = v.id WHERE r.event_id = $1",
    )
    .bind(event_id)
    .fetch_all(&state.db.pool)
    .await?;

    let (total_income, expected_income) = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT
            COALESCE(SUM(COALESCE(billed_amount, 0) - COALESCE(refund_amount, 0)), 0)::bigint AS total_income,
            COALESCE(SUM(COALESCE(price, 0)), 0)::bigint AS expected_income
        FROM registrations
        WHERE event_id = $1
        "#,
    )
    .bind(event_id)
    .fetch_one(&state.db.pool)
    .await?;

    Ok(HtmlTemplate(EventViewTemplate {
        event,
        visitors,
        total_income,
        expected_income,
    }))
}

/* ---------- СОЗДАНИЕ И РЕДАКТИРОВАНИЕ ---------- */

#[derive(Debug, Deserialize)]
struct EventForm {
    title: String,
    description: Option<String>,
    #[serde(default = "default_event_status")]
    status: String,
    location: String,
    start_at: String,
    end_at: String,
    price: i64,
    visitor_limit: Option<String>,
}

impl EventForm {
    fn into_payload(self) -> Result<EventPayload, AppError> {
        let visitor_limit = parse_numeric_param(
            self.visitor_limit.as_deref(),
            "Некорректный лимит посетителей",
        )?;
        let payload = EventPayload {
            title: self.title,
            status: self.status,
            description: none_if_empty(self.description),
            location: self.location,
            start_at: parse_form_datetime(&self.start_at, "start_at")?,
            end_at: parse_form_datetime(&self.end_at, "end_at")?,
            price: self.price,
            visitor_limit,
        };
        payload.validate()?;
        Ok(payload)
    }
}

// GET /events/create/
#[derive(Template)]
#[template(path = "event/create.html")]
struct EventCreateTemplate {
    statuses: Vec<String>,
}

async fn create_event_form() -> impl IntoResponse {
    HtmlTemplate(EventCreateTemplate {
        statuses: EVENT_STATUSES.iter().map(|s| s.to_string()).collect(),
    })
}

// POST /events/create/
async fn create_event(
    State(state): State<Arc<AppState>>,
    Form(form): Form<EventForm>,
) -> Result<Redirect, AppError> {
    let payload = form.into_payload()?;
    let event = Event::insert(&state.db.pool, &payload).await?;
    Ok(Redirect::to(&format!("/events/{}", event.id)))
}

// GET /events/{id}/update/
#[derive(Template)]
#[template(path = "event/update.html")]
struct EventUpdateTemplate {
    event: Event,
    statuses: Vec<String>,
}

async fn update_event_form(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event_or_404(&state.db.pool, event_id).await?;
    Ok(HtmlTemplate(EventUpdateTemplate {
        event,
        statuses: EVENT_STATUSES.iter().map(|s| s.to_string()).collect(),
    }))
}

// POST /events/{id}/update/
async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
    Form(form): Form<EventForm>,
) -> Result<Redirect, AppError> {
    let payload = form.into_payload()?;
    let event = Event::update(event_id, &state.db.pool, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Событие не найдено"))?;
    Ok(Redirect::to(&format!("/events/{}", event.id)))
}

/* ---------- УДАЛЕНИЕ ---------- */

// GET /events/{id}/delete/
async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let deleted = Event::delete(event_id, &state.db.pool).await?;
    if !deleted {
        return Err(AppError::not_found("Событие не найдено"));
    }
    Ok(Redirect::to("/events/"))
}
