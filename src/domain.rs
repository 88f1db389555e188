//! Domain models used by the backend: CEFR levels, questions, attempts,
//! topic assessments and pending (awaiting-confirmation) exercises.

use std::fmt;

use serde::{Deserialize, Serialize};

/// CEFR proficiency level, totally ordered A1 < A2 < B1 < B2 < C1 < C2.
/// Used to grade both the user and the requested topic.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CefrLevel {
  A1,
  A2,
  B1,
  B2,
  C1,
  C2,
}

impl CefrLevel {
  /// Proficiency rank, A1=1 … C2=6.
  pub fn rank(self) -> u8 {
    match self {
      CefrLevel::A1 => 1,
      CefrLevel::A2 => 2,
      CefrLevel::B1 => 3,
      CefrLevel::B2 => 4,
      CefrLevel::C1 => 5,
      CefrLevel::C2 => 6,
    }
  }

  pub fn is_lower_than(self, other: CefrLevel) -> bool {
    self.rank() < other.rank()
  }

  /// Total parse: case-insensitive, trimmed, anything unrecognized falls
  /// back to A1. Bad level strings must never fail the caller.
  pub fn from_str_lossy(level: &str) -> CefrLevel {
    match level.trim().to_uppercase().as_str() {
      "A1" => CefrLevel::A1,
      "A2" => CefrLevel::A2,
      "B1" => CefrLevel::B1,
      "B2" => CefrLevel::B2,
      "C1" => CefrLevel::C1,
      "C2" => CefrLevel::C2,
      _ => CefrLevel::A1,
    }
  }
}

impl fmt::Display for CefrLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      CefrLevel::A1 => "A1",
      CefrLevel::A2 => "A2",
      CefrLevel::B1 => "B1",
      CefrLevel::B2 => "B2",
      CefrLevel::C1 => "C1",
      CefrLevel::C2 => "C2",
    };
    f.write_str(s)
  }
}

impl Default for CefrLevel {
  fn default() -> Self { CefrLevel::A1 }
}

/// One fill-in-the-blank question. The target word, inserted into the blank
/// marker of `sentence_with_blank`, yields `complete_sentence` (assumed by
/// consumers, not mechanically enforced).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub sentence_with_blank: String,
  pub complete_sentence: String,
  pub target_word: String,
  pub english_word: String,
  pub english_translation: String,
}

/// Per-question scratch record, created all-false/empty at session start.
/// Last write wins; there is deliberately no double-scoring guard.
#[derive(Clone, Debug, Default)]
pub struct AttemptRecord {
  #[allow(dead_code)]
  pub submitted_answer: String,
  pub correct: bool,
  pub skipped: bool,
  pub hint_used: bool,
  pub answered: bool,
}

/// Result of a topic difficulty assessment. Produced once per call, not cached.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAssessment {
  pub topic: String,
  pub assessed_level: CefrLevel,
  pub reasoning: String,
  pub suggested_simpler_topic: Option<String>,
}

/// Ephemeral ticket stashed when a topic exceeds the user's level and the
/// exercise awaits explicit confirmation. Never expires.
#[derive(Clone, Debug)]
pub struct PendingExercise {
  pub topic: String,
  pub question_count: usize,
  pub topic_level: CefrLevel,
}

#[cfg(test)]
mod tests {
  use super::*;

  const ALL: [CefrLevel; 6] = [
    CefrLevel::A1, CefrLevel::A2, CefrLevel::B1,
    CefrLevel::B2, CefrLevel::C1, CefrLevel::C2,
  ];

  #[test]
  fn is_lower_than_matches_rank_order() {
    for a in ALL {
      for b in ALL {
        assert_eq!(a.is_lower_than(b), a.rank() < b.rank());
        assert_eq!(a < b, a.rank() < b.rank());
      }
    }
  }

  #[test]
  fn order_is_antisymmetric() {
    for a in ALL {
      for b in ALL {
        if a.is_lower_than(b) {
          assert!(!b.is_lower_than(a));
        }
      }
    }
  }

  #[test]
  fn parse_is_case_insensitive_and_trimmed() {
    assert_eq!(CefrLevel::from_str_lossy("b2"), CefrLevel::B2);
    assert_eq!(CefrLevel::from_str_lossy("  C1 "), CefrLevel::C1);
    assert_eq!(CefrLevel::from_str_lossy("a1"), CefrLevel::A1);
  }

  #[test]
  fn parse_is_total_and_defaults_to_a1() {
    for garbage in ["", "   ", "Z9", "beginner", "A3", "§§§"] {
      assert_eq!(CefrLevel::from_str_lossy(garbage), CefrLevel::A1);
    }
  }
}
