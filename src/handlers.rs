use crate::errors::AppError;
use crate::models::SettingsUpdate;
use crate::state::AppState;
use crate::ui::render_index;
use crate::view::{Screen, TimerView, ViewModel};
use axum::{
    Form, Json,
    extract::{Path, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// How long `/api/timer` waits for the next tick before answering anyway.
const TIMER_POLL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct StartForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct FinishForm {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub productivity: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingForm {
    #[serde(default)]
    pub value: String,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render_index(&session.view()))
}

pub async fn get_view(State(state): State<AppState>) -> Json<ViewModel> {
    let session = state.session.lock().await;
    Json(session.view())
}

/// Long-poll: resolves on the next tick (or after a short timeout when idle).
pub async fn get_timer(State(state): State<AppState>) -> Json<TimerView> {
    let mut ticks = state.session.lock().await.subscribe_ticks();
    let _ = tokio::time::timeout(TIMER_POLL_TIMEOUT, ticks.changed()).await;
    let session = state.session.lock().await;
    Json(session.view().timer)
}

pub async fn start_activity(
    State(state): State<AppState>,
    Form(form): Form<StartForm>,
) -> Redirect {
    let mut session = state.session.lock().await;
    let category = Some(form.category.trim()).filter(|category| !category.is_empty());
    if let Err(err) = session.start(&form.name, category).await {
        debug!("start not applied: {err}");
    }
    Redirect::to("/")
}

pub async fn finish_activity(
    State(state): State<AppState>,
    Form(form): Form<FinishForm>,
) -> Result<Redirect, AppError> {
    let productivity = match form.productivity.trim() {
        "" => None,
        raw => Some(
            raw.parse::<u8>()
                .map_err(|_| AppError::bad_request("productivity must be a number from 1 to 5"))?,
        ),
    };
    let notes = Some(form.notes).filter(|notes| !notes.trim().is_empty());

    let mut session = state.session.lock().await;
    if let Err(err) = session.finish(notes, productivity).await {
        debug!("finish not applied: {err}");
    }
    Ok(Redirect::to("/"))
}

pub async fn refresh_stats(State(state): State<AppState>) -> Redirect {
    let mut session = state.session.lock().await;
    let _ = session.refresh_stats().await;
    Redirect::to("/")
}

pub async fn update_setting(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Form(form): Form<SettingForm>,
) -> Result<Redirect, AppError> {
    let update = SettingsUpdate::parse(&field, &form.value).map_err(|message| {
        warn!("rejected settings update: {message}");
        AppError::bad_request(message)
    })?;

    let mut session = state.session.lock().await;
    let _ = session.update_setting(update).await;
    Ok(Redirect::to("/"))
}

pub async fn switch_screen(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    let screen: Screen = name.parse().map_err(AppError::bad_request)?;
    state.session.lock().await.navigate(screen);
    Ok(Redirect::to("/"))
}
