//! The exercise session state machine.
//!
//! A session holds a fixed, ordered question list and the learner's walk
//! through it: one `AttemptRecord` per question plus a cursor that only ever
//! moves forward. The session is complete once the cursor reaches the end of
//! the question list; `move_to_next` saturates there, so the cursor never
//! exceeds `questions.len()`.

use serde::Serialize;

use crate::domain::{AttemptRecord, Question};

/// An in-progress (or finished) fill-in-the-blank exercise.
#[derive(Clone, Debug)]
pub struct ExerciseSession {
  pub id: String,
  pub topics: Vec<String>,
  questions: Vec<Question>,
  attempts: Vec<AttemptRecord>,
  current_index: usize,
}

/// Aggregate results over a whole session. Serialized as-is to callers.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
  pub total_questions: usize,
  pub correct_answers: usize,
  pub skipped: usize,
  pub hints_used: usize,
  pub accuracy_percentage: f64,
  pub missed_words: Vec<MissedWord>,
}

impl ExerciseSummary {
  /// Used when a summary is requested for an unknown exercise id.
  pub fn empty() -> Self {
    Self {
      total_questions: 0,
      correct_answers: 0,
      skipped: 0,
      hints_used: 0,
      accuracy_percentage: 0.0,
      missed_words: Vec::new(),
    }
  }
}

/// A word the learner answered wrong or skipped, for the recap.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedWord {
  pub german_word: String,
  pub english_word: String,
  pub example_sentence: String,
}

impl ExerciseSession {
  /// Construct a session positioned at the first question. Callers are
  /// expected to pass a non-empty question list.
  pub fn new(id: String, topics: Vec<String>, questions: Vec<Question>) -> Self {
    let attempts = vec![AttemptRecord::default(); questions.len()];
    Self { id, topics, questions, attempts, current_index: 0 }
  }

  pub fn is_complete(&self) -> bool {
    self.current_index >= self.questions.len()
  }

  /// The question under the cursor, or None once the session is complete.
  pub fn current_question(&self) -> Option<&Question> {
    self.questions.get(self.current_index)
  }

  /// 1-based number of the current question, for display.
  pub fn current_number(&self) -> usize {
    self.current_index + 1
  }

  pub fn total_questions(&self) -> usize {
    self.questions.len()
  }

  /// Record the learner's answer for the current question. Calling twice
  /// for the same index overwrites the prior values without complaint.
  pub fn record_answer(&mut self, answer: &str, correct: bool) {
    if let Some(record) = self.attempts.get_mut(self.current_index) {
      record.submitted_answer = answer.to_string();
      record.correct = correct;
      record.answered = true;
    }
  }

  /// Mark the current question as skipped. `correct` keeps whatever value
  /// it had (default false), so skips count as missed words.
  pub fn record_skip(&mut self) {
    if let Some(record) = self.attempts.get_mut(self.current_index) {
      record.skipped = true;
      record.answered = true;
    }
  }

  /// Idempotent; independent of answered/skipped state.
  pub fn mark_hint_used(&mut self) {
    if let Some(record) = self.attempts.get_mut(self.current_index) {
      record.hint_used = true;
    }
  }

  /// Advance the cursor, saturating at the question count. Nothing rewinds.
  pub fn move_to_next(&mut self) {
    if self.current_index < self.questions.len() {
      self.current_index += 1;
    }
  }

  /// Aggregate counts and the missed-word recap. Missed words are attempts
  /// that were answered (including skips) but not correct, in question order;
  /// questions never reached are excluded.
  pub fn summary(&self) -> ExerciseSummary {
    let mut correct_answers = 0;
    let mut skipped = 0;
    let mut hints_used = 0;
    let mut missed_words = Vec::new();

    for (question, record) in self.questions.iter().zip(&self.attempts) {
      if record.correct { correct_answers += 1; }
      if record.skipped { skipped += 1; }
      if record.hint_used { hints_used += 1; }

      if record.answered && !record.correct {
        missed_words.push(MissedWord {
          german_word: question.target_word.clone(),
          english_word: question.english_word.clone(),
          example_sentence: question.complete_sentence.clone(),
        });
      }
    }

    let total_questions = self.questions.len();
    let accuracy_percentage = if total_questions == 0 {
      0.0
    } else {
      let raw = correct_answers as f64 * 100.0 / total_questions as f64;
      (raw * 10.0).round() / 10.0
    };

    ExerciseSummary {
      total_questions,
      correct_answers,
      skipped,
      hints_used,
      accuracy_percentage,
      missed_words,
    }
  }
}
