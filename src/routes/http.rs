//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::protocol::*;
use crate::state::AppState;
use crate::logic;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state, body), fields(level = %body.level))]
pub async fn http_set_level(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LevelIn>,
) -> impl IntoResponse {
  let message = logic::set_user_level(&state, body.session_id.as_deref(), &body.level).await;
  Json(LevelOut { message })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_level(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LevelQuery>,
) -> impl IntoResponse {
  let message = logic::get_user_level(&state, q.session_id.as_deref()).await;
  Json(LevelOut { message })
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, count = body.question_count))]
pub async fn http_start_exercise(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartExerciseIn>,
) -> impl IntoResponse {
  let outcome = logic::start_exercise(
    &state,
    body.session_id.as_deref(),
    &body.topic,
    body.question_count,
    body.proceed_despite_warning,
  )
  .await;
  info!(target: "exercise", topic = %body.topic, started = matches!(outcome, StartOutcome::Started { .. }), "HTTP exercise request handled");
  Json(outcome)
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic, count = body.question_count))]
pub async fn http_confirm_exercise(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ConfirmExerciseIn>,
) -> impl IntoResponse {
  let outcome = logic::confirm_difficult_topic(
    &state,
    body.session_id.as_deref(),
    &body.topic,
    body.question_count,
  )
  .await;
  Json(outcome)
}

#[instrument(level = "info", skip(state, body), fields(%body.exercise_id, answer_len = body.answer.len()))]
pub async fn http_submit_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> impl IntoResponse {
  let out = logic::submit_answer(&state, &body.exercise_id, &body.answer).await;
  info!(target: "exercise", id = %body.exercise_id, correct = out.correct, "HTTP submit_answer evaluated");
  Json(out)
}

#[instrument(level = "info", skip(state), fields(%q.exercise_id))]
pub async fn http_get_hint(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ExerciseQuery>,
) -> impl IntoResponse {
  let out = logic::request_translation(&state, &q.exercise_id).await;
  info!(target: "exercise", id = %q.exercise_id, "HTTP hint served");
  Json(out)
}

#[instrument(level = "info", skip(state, body), fields(%body.exercise_id))]
pub async fn http_skip_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SkipIn>,
) -> impl IntoResponse {
  let out = logic::skip_question(&state, &body.exercise_id).await;
  Json(out)
}

#[instrument(level = "info", skip(state), fields(%q.exercise_id))]
pub async fn http_get_summary(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ExerciseQuery>,
) -> impl IntoResponse {
  let summary = logic::exercise_summary(&state, &q.exercise_id).await;
  Json(summary)
}
