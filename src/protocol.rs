//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::CefrLevel;

fn default_question_count() -> usize { 5 }

//
// Requests
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelIn {
    pub level: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExerciseIn {
    pub topic: String,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub proceed_despite_warning: bool,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmExerciseIn {
    pub topic: String,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIn {
    pub exercise_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseQuery {
    pub exercise_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipIn {
    pub exercise_id: String,
}

//
// Responses
//

#[derive(Debug, Serialize)]
pub struct LevelOut {
    pub message: String,
}

/// Outcome of an exercise request: either the exercise started, or the topic
/// was judged above the user's level and needs explicit confirmation.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartOutcome {
    #[serde(rename_all = "camelCase")]
    Started {
        exercise_id: String,
        question_number: usize,
        total_questions: usize,
        sentence_with_blank: String,
    },
    #[serde(rename_all = "camelCase")]
    Warning {
        topic: String,
        topic_level: CefrLevel,
        user_level: CefrLevel,
        warning: String,
        suggested_simpler_topic: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOut {
    pub correct: bool,
    pub user_answer: String,
    pub correct_word: Option<String>,
    pub explanation: Option<String>,
    pub exercise_complete: bool,
    pub next_question_number: Option<usize>,
    pub next_sentence: Option<String>,
}

/// The hint: English translation of the current sentence, without the word.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOut {
    pub translation: String,
    pub current_sentence: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipOut {
    pub correct_word: Option<String>,
    pub correct_sentence: Option<String>,
    pub exercise_complete: bool,
    pub next_question_number: Option<usize>,
    pub next_sentence: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
