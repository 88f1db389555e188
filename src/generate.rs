//! Collaborator wrappers around the LLM: topic difficulty assessment and
//! question generation, each with a deterministic offline fallback.
//!
//! Both run the same two-stage pipeline over the raw model reply: first
//! extract the candidate JSON substring (markdown fences stripped), then
//! structurally decode it. A failure at either stage, a transport error, or
//! a missing client all land on the fallback value; nothing here ever
//! surfaces an error to the exercise flow.

use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{CefrLevel, Question, TopicAssessment};
use crate::openai::OpenAI;
use crate::util::{extract_json, trunc_for_log};

/// Assess how hard a free-text topic is on the CEFR scale.
///
/// The fallback is a mid-level A2 estimate: not A1, which would silently
/// wave through legitimately hard topics, and not C2, which would warn on
/// everything.
#[instrument(level = "info", skip(openai, prompts, topic), fields(topic_len = topic.len()))]
pub async fn assess_topic(
  openai: Option<&OpenAI>,
  prompts: &Prompts,
  topic: &str,
) -> TopicAssessment {
  if let Some(oa) = openai {
    match oa.assess_topic_raw(prompts, topic).await {
      Ok(raw) => {
        if let Some(assessment) = parse_assessment(&raw, topic) {
          info!(target: "exercise", %topic, level = %assessment.assessed_level, "Topic assessed");
          return assessment;
        }
        error!(target: "exercise", %topic, raw = %trunc_for_log(&raw, 120), "Unparseable topic assessment; using default");
      }
      Err(e) => {
        error!(target: "exercise", %topic, error = %e, "Topic assessment call failed; using default");
      }
    }
  }
  fallback_assessment(topic)
}

/// Generate `count` questions for a topic at the given level. `count` is
/// expected to be pre-clamped to [1, 10] by the orchestrator.
#[instrument(level = "info", skip(openai, prompts, topic), fields(topic_len = topic.len(), %level))]
pub async fn generate_questions(
  openai: Option<&OpenAI>,
  prompts: &Prompts,
  topic: &str,
  level: CefrLevel,
  count: usize,
) -> Vec<Question> {
  if let Some(oa) = openai {
    match oa.generate_questions_raw(prompts, topic, level, count).await {
      Ok(raw) => {
        if let Some(questions) = parse_questions(&raw) {
          if !questions.is_empty() {
            info!(target: "exercise", %topic, generated = questions.len(), "Questions generated");
            return questions;
          }
        }
        error!(target: "exercise", %topic, raw = %trunc_for_log(&raw, 120), "Unparseable question batch; using fallback");
      }
      Err(e) => {
        error!(target: "exercise", %topic, error = %e, "Question generation call failed; using fallback");
      }
    }
  }
  fallback_questions(count)
}

/// Wire shape of the assessment reply. Missing fields degrade instead of
/// failing the decode: absent level parses lossily to A1.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentWire {
  #[serde(default)]
  level: String,
  #[serde(default)]
  reasoning: String,
  #[serde(default)]
  simpler_topic: Option<String>,
}

fn parse_assessment(raw: &str, topic: &str) -> Option<TopicAssessment> {
  let wire: AssessmentWire = serde_json::from_str(extract_json(raw)).ok()?;
  Some(TopicAssessment {
    topic: topic.to_string(),
    assessed_level: CefrLevel::from_str_lossy(&wire.level),
    reasoning: wire.reasoning,
    suggested_simpler_topic: wire.simpler_topic,
  })
}

fn parse_questions(raw: &str) -> Option<Vec<Question>> {
  serde_json::from_str(extract_json(raw)).ok()
}

fn fallback_assessment(topic: &str) -> TopicAssessment {
  TopicAssessment {
    topic: topic.to_string(),
    assessed_level: CefrLevel::A2,
    reasoning: "Could not assess topic".into(),
    suggested_simpler_topic: None,
  }
}

/// Fixed offline batch, truncated to `min(count, 3)`. Never padded with
/// duplicates.
pub fn fallback_questions(count: usize) -> Vec<Question> {
  let mut fallback = vec![
    Question {
      sentence_with_blank: "Guten ___, wie geht es Ihnen?".into(),
      complete_sentence: "Guten Tag, wie geht es Ihnen?".into(),
      target_word: "Tag".into(),
      english_word: "day".into(),
      english_translation: "Good ___, how are you?".into(),
    },
    Question {
      sentence_with_blank: "Ich ___ Deutsch.".into(),
      complete_sentence: "Ich lerne Deutsch.".into(),
      target_word: "lerne".into(),
      english_word: "learn".into(),
      english_translation: "I ___ German.".into(),
    },
    Question {
      sentence_with_blank: "Das ___ ist sehr schön heute.".into(),
      complete_sentence: "Das Wetter ist sehr schön heute.".into(),
      target_word: "Wetter".into(),
      english_word: "weather".into(),
      english_translation: "The ___ is very nice today.".into(),
    },
  ];
  fallback.truncate(count);
  fallback
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assessment_parses_through_a_code_fence() {
    let raw = "```json\n{\"level\": \"C1\", \"reasoning\": \"legal jargon\", \"simplerTopic\": \"everyday law\"}\n```";
    let a = parse_assessment(raw, "legal terms").unwrap();
    assert_eq!(a.assessed_level, CefrLevel::C1);
    assert_eq!(a.reasoning, "legal jargon");
    assert_eq!(a.suggested_simpler_topic.as_deref(), Some("everyday law"));
  }

  #[test]
  fn assessment_tolerates_null_simpler_topic_and_missing_level() {
    let a = parse_assessment("{\"reasoning\": \"x\", \"simplerTopic\": null}", "t").unwrap();
    assert_eq!(a.assessed_level, CefrLevel::A1);
    assert!(a.suggested_simpler_topic.is_none());
  }

  #[test]
  fn assessment_rejects_non_json() {
    assert!(parse_assessment("Sorry, I can't help with that.", "t").is_none());
  }

  #[test]
  fn questions_parse_through_a_code_fence() {
    let raw = "```json\n[{\"sentenceWithBlank\": \"Ich trinke ___.\", \"completeSentence\": \"Ich trinke Kaffee.\", \"targetWord\": \"Kaffee\", \"englishWord\": \"coffee\", \"englishTranslation\": \"I drink ___.\"}]\n```";
    let qs = parse_questions(raw).unwrap();
    assert_eq!(qs.len(), 1);
    assert_eq!(qs[0].target_word, "Kaffee");
  }

  #[test]
  fn fallback_truncates_but_never_pads() {
    assert_eq!(fallback_questions(1).len(), 1);
    assert_eq!(fallback_questions(3).len(), 3);
    assert_eq!(fallback_questions(5).len(), 3);
    let words: Vec<_> = fallback_questions(3).into_iter().map(|q| q.target_word).collect();
    assert_eq!(words, vec!["Tag", "lerne", "Wetter"]);
  }

  #[tokio::test]
  async fn offline_assessment_defaults_to_a2() {
    let a = assess_topic(None, &Prompts::default(), "quantum physics").await;
    assert_eq!(a.assessed_level, CefrLevel::A2);
    assert_eq!(a.reasoning, "Could not assess topic");
  }

  #[tokio::test]
  async fn offline_generation_uses_the_fallback_batch() {
    let qs = generate_questions(None, &Prompts::default(), "x", CefrLevel::A1, 5).await;
    assert_eq!(qs.len(), 3);
  }
}
