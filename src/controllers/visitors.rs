//! visitors.rs
//!
//! HTML-интерфейс посетителей: список с поиском и фильтром по событию,
//! карточка с мероприятиями посетителя, формы создания/редактирования,
//! удаление с редиректом.

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

use crate::controllers::{none_if_empty, order_clause, parse_numeric_param};
use crate::error::AppError;
use crate::models::visitor::{Visitor, VisitorPayload};
use crate::models::Event;
use crate::views::{filters, HtmlTemplate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/visitors/", get(list_visitors))
        .route("/visitors/create/", get(create_visitor_form).post(create_visitor))
        .route("/visitors/{id}", get(view_visitor))
        .route("/visitors/{id}/update/", get(update_visitor_form).post(update_visitor))
        .route("/visitors/{id}/delete/", get(delete_visitor))
}

/* ---------- helpers ---------- */

const SORTABLE_COLUMNS: [&str; 7] = [
    "id",
    "first_name",
    "last_name",
    "phone",
    "email",
    "created_at",
    "updated_at",
];

async fn find_visitor_or_404(pool: &sqlx::PgPool, visitor_id: i64) -> Result<Visitor, AppError> {
    Visitor::find_by_id(visitor_id, pool)
        .await?
        .ok_or_else(|| AppError::not_found("Посетитель не найден"))
}

/* ---------- СПИСОК ---------- */

// GET /visitors/
#[derive(Debug, Deserialize)]
struct VisitorsQuery {
    event_id: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<i32>,
    search: Option<String>,
}

#[derive(Template)]
#[template(path = "visitor/index.html")]
struct VisitorIndexTemplate {
    visitors: Vec<Visitor>,
    sort_by: String,
    sort_order: i32,
    search: String,
}

async fn list_visitors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VisitorsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let event_id = parse_numeric_param(params.event_id.as_deref(), "Некорректный ID события")?;
    let search = params.search.clone().unwrap_or_default();

    // Фильтр по событию идет через таблицу регистраций
    let mut sql = String::from("SELECT v.* FROM visitors v");
    if event_id.is_some() {
        sql.push_str(" JOIN registrations r ON r.visitor_id = v.id");
    }

    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1;
    if event_id.is_some() {
        conditions.push(format!("r.event_id = ${}", bind_idx));
        bind_idx += 1;
    }
    if !search.is_empty() {
        conditions.push(format!(
            "(v.first_name ILIKE ${idx} OR v.last_name ILIKE ${idx} OR v.email ILIKE ${idx})",
            idx = bind_idx
        ));
    }
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&order_clause(
        "v",
        &SORTABLE_COLUMNS,
        params.sort_by.as_deref(),
        params.sort_order,
    ));

    let mut query = sqlx::query_as::<_, Visitor>(&sql);
    if let Some(event_id) = event_id {
        query = query.bind(event_id);
    }
    if !search.is_empty() {
        query = query.bind(format!("%{}%", search));
    }

    let visitors = query.fetch_all(&state.db.pool).await.map_err(|e| {
        tracing::error!("list_visitors sql error: {:?}", e);
        AppError::from(e)
    })?;

    Ok(HtmlTemplate(VisitorIndexTemplate {
        visitors,
        sort_by: params.sort_by.unwrap_or_default(),
        sort_order: params.sort_order.unwrap_or(0),
        search,
    }))
}

/* ---------- КАРТОЧКА ---------- */

// GET /visitors/{id}
#[derive(Template)]
#[template(path = "visitor/view.html")]
struct VisitorViewTemplate {
    visitor: Visitor,
    events: Vec<Event>,
}

async fn view_visitor(
    State(state): State<Arc<AppState>>,
    Path(visitor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let visitor = find_visitor_or_404(&state.db.pool, visitor_id).await?;

    // Мероприятия через регистрации, повторы не схлопываются
    let events = sqlx::query_as::<_, Event>(
        "SELECT e.* FROM events e JOIN registrations r ON r.event_id = e.id WHERE r.visitor_id = $1",
    )
    .bind(visitor_id)
    .fetch_all(&state.db.pool)
    .await?;

    Ok(HtmlTemplate(VisitorViewTemplate { visitor, events }))
}

/* ---------- СОЗДАНИЕ И РЕДАКТИРОВАНИЕ ---------- */

#[derive(Debug, Deserialize)]
struct VisitorForm {
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
}

impl VisitorForm {
    fn into_payload(self) -> Result<VisitorPayload, AppError> {
        let payload = VisitorPayload {
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            email: none_if_empty(self.email),
        };
        payload.validate()?;
        Ok(payload)
    }
}

// GET /visitors/create/
#[derive(Template)]
#[template(path = "visitor/create.html")]
struct VisitorCreateTemplate;

async fn create_visitor_form() -> impl IntoResponse {
    HtmlTemplate(VisitorCreateTemplate)
}

// POST /visitors/create/
async fn create_visitor(
    State(state): State<Arc<AppState>>,
    Form(form): Form<VisitorForm>,
) -> Result<Redirect, AppError> {
    let payload = form.into_payload()?;
    let visitor = Visitor::insert(&state.db.pool, &payload).await?;
    Ok(Redirect::to(&format!("/visitors/{}", visitor.id)))
}

// GET /visitors/{id}/update/
#[derive(Template)]
#[template(path = "visitor/update.html")]
struct VisitorUpdateTemplate {
    visitor: Visitor,
}

async fn update_visitor_form(
    State(state): State<Arc<AppState>>,
    Path(visitor_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let visitor = find_visitor_or_404(&state.db.pool, visitor_id).await?;
    Ok(HtmlTemplate(VisitorUpdateTemplate { visitor }))
}

// POST /visitors/{id}/update/
async fn update_visitor(
    State(state): State<Arc<AppState>>,
    Path(visitor_id): Path<i64>,
    Form(form): Form<VisitorForm>,
) -> Result<Redirect, AppError> {
    let payload = form.into_payload()?;
    let visitor = Visitor::update(visitor_id, &state.db.pool, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Посетитель не найден"))?;
    Ok(Redirect::to(&format!("/visitors/{}", visitor.id)))
}

/* ---------- УДАЛЕНИЕ ---------- */

// GET /visitors/{id}/delete/
async fn delete_visitor(
    State(state): State<Arc<AppState>>,
    Path(visitor_id): Path<i64>,
) -> Result<Redirect, AppError> {
    let deleted = Visitor::delete(visitor_id, &state.db.pool).await?;
    if !deleted {
        return Err(AppError::not_found("Посетитель не найден"));
    }
    Ok(Redirect::to("/visitors/"))
}
