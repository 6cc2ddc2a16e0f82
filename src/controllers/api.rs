//! api.rs
//!
//! JSON-интерфейс: создание и чтение событий, посетителей и регистраций.
//! Обновление и удаление в этом варианте API не выставляются.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::event::EventPayload;
use crate::models::visitor::VisitorPayload;
use crate::models::{Event, Registration, Visitor};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/", post(create_event))
        .route("/events/{id}", get(read_event))
        .route("/visitors/", post(create_visitor))
        .route("/visitors/{id}", get(read_visitor))
        .route("/registrations/", post(create_registration))
        .route("/registrations/{id}", get(read_registration))
}

/* ---------- EVENTS ---------- */

// POST /api/events/
async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EventPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let event = Event::insert(&state.db.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

// GET /api/events/{id}
async fn read_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<i64>,
) -> Result<Json<Event>, AppError> {
    let event = Event::find_by_id(event_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Событие не найдено"))?;
    Ok(Json(event))
}

/* ---------- VISITORS ---------- */

// POST /api/visitors/
// Нарушение уникальности телефона/почты не перехватывается и уходит
// как внутренняя ошибка
async fn create_visitor(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VisitorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let visitor = Visitor::insert(&state.db.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(visitor)))
}

// GET /api/visitors/{id}
async fn read_visitor(
    State(state): State<Arc<AppState>>,
    Path(visitor_id): Path<i64>,
) -> Result<Json<Visitor>, AppError> {
    let visitor = Visitor::find_by_id(visitor_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Посетитель не найден"))?;
    Ok(Json(visitor))
}

/* ---------- REGISTRATIONS ---------- */

// POST /api/registrations/
// Цена и начальный статус всегда выводятся из события на сервере
#[derive(Debug, Deserialize)]
struct RegistrationPayload {
    visitor_id: i64,
    event_id: i64,
}

async fn create_registration(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegistrationPayload>,
) -> Result<impl IntoResponse, AppError> {
    let visitor = Visitor::find_by_id(payload.visitor_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Посетитель не найден"))?;
    let event = Event::find_by_id(payload.event_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Событие не найдено"))?;

    let registration =
        Registration::insert(&state.db.pool, visitor.id, event.id, event.price).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

// GET /api/registrations/{id}
async fn read_registration(
    State(state): State<Arc<AppState>>,
    Path(registration_id): Path<i64>,
) -> Result<Json<Registration>, AppError> {
    let registration = Registration::find_by_id(registration_id, &state.db.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Регистрация не найдена"))?;
    Ok(Json(registration))
}
