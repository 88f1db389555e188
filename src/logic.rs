//! Exercise orchestration consumed by the HTTP handlers.
//!
//! This is the façade over the engine: it gates topics against the user's
//! CEFR level, creates and registers sessions, and drives the per-question
//! submit/hint/skip/summary operations. Every operation here is total — an
//! unknown exercise id yields a recoverable "please start a new exercise"
//! shaped value, never an error.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::domain::{CefrLevel, PendingExercise, TopicAssessment};
use crate::exercise::{ExerciseSession, ExerciseSummary};
use crate::generate;
use crate::protocol::{AnswerOut, SkipOut, StartOutcome, TranslationOut};
use crate::state::AppState;
use crate::util::{normalize_answer, short_id};

const NOT_FOUND_MSG: &str = "Exercise not found. Please start a new exercise.";
const ALREADY_COMPLETE_MSG: &str = "This exercise is already complete. Ask for the summary or start a new one.";

#[instrument(level = "info", skip(state))]
pub async fn set_user_level(state: &AppState, session_id: Option<&str>, level: &str) -> String {
  let cefr = CefrLevel::from_str_lossy(level);
  state.profiles.set(session_id, cefr).await;
  format!("Your German level has been set to {}.", cefr)
}

#[instrument(level = "info", skip(state))]
pub async fn get_user_level(state: &AppState, session_id: Option<&str>) -> String {
  let level = state.profiles.get(session_id).await;
  format!("Your current German level is set to {}.", level)
}

/// True when the request must stop at a warning instead of starting.
fn needs_warning(user_level: CefrLevel, topic_level: CefrLevel, proceed_despite_warning: bool) -> bool {
  !proceed_despite_warning && user_level.is_lower_than(topic_level)
}

fn warning_text(assessment: &TopicAssessment, user_level: CefrLevel) -> String {
  let suggestion = assessment
    .suggested_simpler_topic
    .as_deref()
    .map(|t| format!(" (suggested: {})", t))
    .unwrap_or_default();
  format!(
    "The topic '{}' is typically at {} level, but your current level is {}. \
     This might be challenging! Would you like to:\n\
     1. Continue anyway (I'll adjust the vocabulary to be more accessible)\n\
     2. Try a simpler topic{}",
    assessment.topic, assessment.assessed_level, user_level, suggestion
  )
}

/// Assess the topic and either start the exercise or stop at a warning.
#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn start_exercise(
  state: &AppState,
  session_id: Option<&str>,
  topic: &str,
  question_count: usize,
  proceed_despite_warning: bool,
) -> StartOutcome {
  let count = question_count.clamp(1, 10);

  let assessment = generate::assess_topic(state.openai.as_ref(), &state.prompts, topic).await;
  let topic_level = assessment.assessed_level;
  let user_level = state.profiles.get(session_id).await;

  info!(target: "exercise", %topic, %topic_level, %user_level, "Topic assessed against user level");

  if needs_warning(user_level, topic_level, proceed_despite_warning) {
    let pending_id = short_id();
    state
      .pending
      .insert(pending_id.clone(), PendingExercise {
        topic: topic.to_string(),
        question_count: count,
        topic_level,
      })
      .await;
    info!(target: "exercise", %topic, %pending_id, "Topic above user level; warning issued");

    return StartOutcome::Warning {
      topic: topic.to_string(),
      topic_level,
      user_level,
      warning: warning_text(&assessment, user_level),
      suggested_simpler_topic: assessment.suggested_simpler_topic,
    };
  }

  create_exercise(state, topic, count, user_level).await
}

/// The user saw the warning and wants to proceed anyway. Stateless: derives
/// everything from the caller-supplied topic and count rather than consuming
/// the stashed pending ticket.
#[instrument(level = "info", skip(state, topic), fields(topic_len = topic.len()))]
pub async fn confirm_difficult_topic(
  state: &AppState,
  session_id: Option<&str>,
  topic: &str,
  question_count: usize,
) -> StartOutcome {
  let user_level = state.profiles.get(session_id).await;
  info!(target: "exercise", %topic, %user_level, "User confirmed difficult topic");
  create_exercise(state, topic, question_count.clamp(1, 10), user_level).await
}

/// Generate questions at the user's level, register the session, and report
/// the first sentence.
async fn create_exercise(
  state: &AppState,
  topic: &str,
  count: usize,
  level: CefrLevel,
) -> StartOutcome {
  let exercise_id = short_id();
  let questions =
    generate::generate_questions(state.openai.as_ref(), &state.prompts, topic, level, count).await;

  let session = ExerciseSession::new(exercise_id.clone(), vec![topic.to_string()], questions);
  let total_questions = session.total_questions();
  let sentence_with_blank = session
    .current_question()
    .map(|q| q.sentence_with_blank.clone())
    .unwrap_or_default();

  info!(target: "exercise", id = %session.id, topics = ?session.topics, %level, total_questions, "Exercise started");
  state
    .exercises
    .insert(exercise_id.clone(), Arc::new(Mutex::new(session)))
    .await;

  StartOutcome::Started {
    exercise_id,
    question_number: 1,
    total_questions,
    sentence_with_blank,
  }
}

/// Check the learner's answer against the current question and advance.
#[instrument(level = "info", skip(state, answer), fields(%exercise_id, answer_len = answer.len()))]
pub async fn submit_answer(state: &AppState, exercise_id: &str, answer: &str) -> AnswerOut {
  let Some(shared) = state.exercises.get(exercise_id).await else {
    return AnswerOut {
      correct: false,
      user_answer: answer.to_string(),
      correct_word: None,
      explanation: Some(NOT_FOUND_MSG.into()),
      exercise_complete: true,
      next_question_number: None,
      next_sentence: None,
    };
  };

  let mut session = shared.lock().await;
  let Some(current) = session.current_question().cloned() else {
    return AnswerOut {
      correct: false,
      user_answer: answer.to_string(),
      correct_word: None,
      explanation: Some(ALREADY_COMPLETE_MSG.into()),
      exercise_complete: true,
      next_question_number: None,
      next_sentence: None,
    };
  };

  let correct = normalize_answer(answer) == normalize_answer(&current.target_word);
  session.record_answer(answer, correct);
  session.move_to_next();

  let exercise_complete = session.is_complete();
  info!(target: "exercise", %exercise_id, correct, exercise_complete, "Answer evaluated");

  let explanation = if correct {
    None
  } else {
    Some(format!("The correct word was '{}' ({}).", current.target_word, current.english_word))
  };

  AnswerOut {
    correct,
    user_answer: answer.to_string(),
    correct_word: Some(current.target_word),
    explanation,
    exercise_complete,
    next_question_number: (!exercise_complete).then(|| session.current_number()),
    next_sentence: session.current_question().map(|q| q.sentence_with_blank.clone()),
  }
}

/// Reveal the English translation of the current sentence and mark the hint
/// as used for progress tracking.
#[instrument(level = "info", skip(state), fields(%exercise_id))]
pub async fn request_translation(state: &AppState, exercise_id: &str) -> TranslationOut {
  let Some(shared) = state.exercises.get(exercise_id).await else {
    return TranslationOut { translation: NOT_FOUND_MSG.into(), current_sentence: None };
  };

  let mut session = shared.lock().await;
  match session.current_question().cloned() {
    Some(current) => {
      session.mark_hint_used();
      info!(target: "exercise", %exercise_id, "Translation hint served");
      TranslationOut {
        translation: current.english_translation,
        current_sentence: Some(current.sentence_with_blank),
      }
    }
    None => TranslationOut { translation: ALREADY_COMPLETE_MSG.into(), current_sentence: None },
  }
}

/// Give up on the current question: reveal the answer and advance.
#[instrument(level = "info", skip(state), fields(%exercise_id))]
pub async fn skip_question(state: &AppState, exercise_id: &str) -> SkipOut {
  let Some(shared) = state.exercises.get(exercise_id).await else {
    return SkipOut {
      correct_word: None,
      correct_sentence: None,
      exercise_complete: true,
      next_question_number: None,
      next_sentence: None,
    };
  };

  let mut session = shared.lock().await;
  let Some(skipped) = session.current_question().cloned() else {
    return SkipOut {
      correct_word: None,
      correct_sentence: None,
      exercise_complete: true,
      next_question_number: None,
      next_sentence: None,
    };
  };

  session.record_skip();
  session.move_to_next();

  let exercise_complete = session.is_complete();
  info!(target: "exercise", %exercise_id, exercise_complete, "Question skipped");

  SkipOut {
    correct_word: Some(skipped.target_word),
    correct_sentence: Some(skipped.complete_sentence),
    exercise_complete,
    next_question_number: (!exercise_complete).then(|| session.current_number()),
    next_sentence: session.current_question().map(|q| q.sentence_with_blank.clone()),
  }
}

/// Aggregate results for an exercise. Unknown ids yield an all-zero summary.
#[instrument(level = "info", skip(state), fields(%exercise_id))]
pub async fn exercise_summary(state: &AppState, exercise_id: &str) -> ExerciseSummary {
  match state.exercises.get(exercise_id).await {
    Some(shared) => shared.lock().await.summary(),
    None => ExerciseSummary::empty(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Prompts;

  fn offline_state() -> AppState {
    AppState::with(None, Prompts::default())
  }

  fn started_id(outcome: &StartOutcome) -> String {
    match outcome {
      StartOutcome::Started { exercise_id, .. } => exercise_id.clone(),
      StartOutcome::Warning { .. } => panic!("expected Started, got Warning"),
    }
  }

  #[test]
  fn gate_requires_strictly_higher_topic_level() {
    assert!(needs_warning(CefrLevel::A1, CefrLevel::C1, false));
    assert!(!needs_warning(CefrLevel::C1, CefrLevel::C1, false));
    assert!(!needs_warning(CefrLevel::C2, CefrLevel::B1, false));
    // Explicit confirmation bypasses the gate entirely.
    assert!(!needs_warning(CefrLevel::A1, CefrLevel::C2, true));
  }

  #[test]
  fn warning_text_includes_suggestion_when_present() {
    let assessment = TopicAssessment {
      topic: "quantum physics".into(),
      assessed_level: CefrLevel::C1,
      reasoning: "specialized".into(),
      suggested_simpler_topic: Some("science basics".into()),
    };
    let text = warning_text(&assessment, CefrLevel::A1);
    assert!(text.contains("'quantum physics' is typically at C1 level"));
    assert!(text.contains("your current level is A1"));
    assert!(text.contains("(suggested: science basics)"));

    let without = TopicAssessment { suggested_simpler_topic: None, ..assessment };
    assert!(!warning_text(&without, CefrLevel::A1).contains("suggested:"));
  }

  #[tokio::test]
  async fn level_setters_phrase_confirmations() {
    let state = offline_state();
    assert_eq!(
      set_user_level(&state, None, "b1").await,
      "Your German level has been set to B1."
    );
    assert_eq!(
      get_user_level(&state, None).await,
      "Your current German level is set to B1."
    );
    // Garbage levels are normalized, never rejected.
    assert_eq!(
      set_user_level(&state, None, "fluent??").await,
      "Your German level has been set to A1."
    );
  }

  #[tokio::test]
  async fn offline_assessment_warns_a1_user_and_stashes_a_ticket() {
    // With no client the assessor falls back to A2, which is above the
    // default A1 user, so the gate trips.
    let state = offline_state();
    let outcome = start_exercise(&state, None, "quantum physics", 5, false).await;
    match outcome {
      StartOutcome::Warning { topic_level, user_level, ref warning, .. } => {
        assert_eq!(topic_level, CefrLevel::A2);
        assert_eq!(user_level, CefrLevel::A1);
        assert!(warning.contains("might be challenging"));
      }
      StartOutcome::Started { .. } => panic!("expected Warning"),
    }
    assert_eq!(state.pending.len().await, 1);
    assert_eq!(state.exercises.len().await, 0);
  }

  #[tokio::test]
  async fn proceed_flag_bypasses_the_gate() {
    let state = offline_state();
    let outcome = start_exercise(&state, None, "quantum physics", 5, true).await;
    match outcome {
      StartOutcome::Started { question_number, total_questions, ref sentence_with_blank, .. } => {
        assert_eq!(question_number, 1);
        // Offline fallback holds 3 questions; 5 requested truncates to 3.
        assert_eq!(total_questions, 3);
        assert_eq!(sentence_with_blank, "Guten ___, wie geht es Ihnen?");
      }
      StartOutcome::Warning { .. } => panic!("expected Started"),
    }
    assert_eq!(state.exercises.len().await, 1);
  }

  #[tokio::test]
  async fn confirm_starts_unconditionally_at_user_level() {
    let state = offline_state();
    // Warn first, then confirm with the same topic+count.
    let _ = start_exercise(&state, None, "quantum physics", 5, false).await;
    let outcome = confirm_difficult_topic(&state, None, "quantum physics", 5).await;
    assert!(matches!(outcome, StartOutcome::Started { .. }));
  }

  #[tokio::test]
  async fn user_at_level_starts_without_warning() {
    let state = offline_state();
    state.profiles.set(None, CefrLevel::B1).await;
    let outcome = start_exercise(&state, None, "shopping", 2, false).await;
    match outcome {
      StartOutcome::Started { total_questions, .. } => assert_eq!(total_questions, 2),
      StartOutcome::Warning { .. } => panic!("B1 user should pass an A2-assessed topic"),
    }
  }

  #[tokio::test]
  async fn answers_accept_leading_articles() {
    let state = offline_state();
    let id = started_id(&confirm_difficult_topic(&state, None, "greetings", 3).await);

    // Fallback question 1 expects "Tag".
    let out = submit_answer(&state, &id, "der Tag").await;
    assert!(out.correct);
    assert!(out.explanation.is_none());
    assert_eq!(out.correct_word.as_deref(), Some("Tag"));
    assert!(!out.exercise_complete);
    assert_eq!(out.next_question_number, Some(2));
    assert_eq!(out.next_sentence.as_deref(), Some("Ich ___ Deutsch."));
  }

  #[tokio::test]
  async fn wrong_answer_explains_the_correct_word() {
    let state = offline_state();
    let id = started_id(&confirm_difficult_topic(&state, None, "greetings", 1).await);

    let out = submit_answer(&state, &id, "Nacht").await;
    assert!(!out.correct);
    assert_eq!(out.explanation.as_deref(), Some("The correct word was 'Tag' (day)."));
    // Single-question exercise: wrong answer still completes it.
    assert!(out.exercise_complete);
    assert!(out.next_question_number.is_none());
    assert!(out.next_sentence.is_none());
  }

  #[tokio::test]
  async fn full_walk_wrong_skip_correct_matches_summary() {
    let state = offline_state();
    let id = started_id(&confirm_difficult_topic(&state, None, "greetings", 3).await);

    let first = submit_answer(&state, &id, "Nacht").await; // wrong
    assert!(!first.correct);
    let skipped = skip_question(&state, &id).await; // skip "lerne"
    assert_eq!(skipped.correct_word.as_deref(), Some("lerne"));
    assert_eq!(skipped.correct_sentence.as_deref(), Some("Ich lerne Deutsch."));
    let last = submit_answer(&state, &id, "das Wetter").await; // correct
    assert!(last.correct);
    assert!(last.exercise_complete);

    let summary = exercise_summary(&state, &id).await;
    assert_eq!(summary.total_questions, 3);
    assert_eq!(summary.correct_answers, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.hints_used, 0);
    assert_eq!(summary.accuracy_percentage, 33.3);
    let missed: Vec<_> = summary.missed_words.iter().map(|m| m.german_word.as_str()).collect();
    assert_eq!(missed, vec!["Tag", "lerne"]);
  }

  #[tokio::test]
  async fn translation_hint_reveals_sentence_and_counts() {
    let state = offline_state();
    let id = started_id(&confirm_difficult_topic(&state, None, "greetings", 1).await);

    let hint = request_translation(&state, &id).await;
    assert_eq!(hint.translation, "Good ___, how are you?");
    assert_eq!(hint.current_sentence.as_deref(), Some("Guten ___, wie geht es Ihnen?"));

    let _ = submit_answer(&state, &id, "Tag").await;
    assert_eq!(exercise_summary(&state, &id).await.hints_used, 1);
  }

  #[tokio::test]
  async fn unknown_exercise_ids_are_recoverable() {
    let state = offline_state();

    let answer = submit_answer(&state, "nope", "Tag").await;
    assert!(!answer.correct);
    assert!(answer.exercise_complete);
    assert_eq!(answer.explanation.as_deref(), Some(NOT_FOUND_MSG));

    let hint = request_translation(&state, "nope").await;
    assert_eq!(hint.translation, NOT_FOUND_MSG);
    assert!(hint.current_sentence.is_none());

    let skip = skip_question(&state, "nope").await;
    assert!(skip.exercise_complete);
    assert!(skip.correct_word.is_none());

    let summary = exercise_summary(&state, "nope").await;
    assert_eq!(summary.total_questions, 0);
    assert_eq!(summary.accuracy_percentage, 0.0);
    assert!(summary.missed_words.is_empty());
  }

  #[tokio::test]
  async fn operations_on_a_finished_exercise_stay_total() {
    let state = offline_state();
    let id = started_id(&confirm_difficult_topic(&state, None, "greetings", 1).await);
    let _ = submit_answer(&state, &id, "Tag").await;

    let again = submit_answer(&state, &id, "Tag").await;
    assert!(!again.correct);
    assert!(again.exercise_complete);
    assert_eq!(again.explanation.as_deref(), Some(ALREADY_COMPLETE_MSG));

    let hint = request_translation(&state, &id).await;
    assert_eq!(hint.translation, ALREADY_COMPLETE_MSG);

    let skip = skip_question(&state, &id).await;
    assert!(skip.exercise_complete);
    assert!(skip.correct_word.is_none());

    // The summary still reflects the finished walk.
    assert_eq!(exercise_summary(&state, &id).await.correct_answers, 1);
  }

  #[tokio::test]
  async fn question_count_is_clamped() {
    let state = offline_state();
    let outcome = confirm_difficult_topic(&state, None, "greetings", 0).await;
    match outcome {
      StartOutcome::Started { total_questions, .. } => assert_eq!(total_questions, 1),
      StartOutcome::Warning { .. } => panic!("confirm never warns"),
    }
  }
}
