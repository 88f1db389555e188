//! Loading agent configuration (prompt overrides) from TOML.
//!
//! See `AgentConfig` and `Prompts` for expected schema.

use serde::Deserialize;
use tracing::{info, error};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts used by the OpenAI client. Defaults are tuned for German
/// vocabulary exercises; override them in TOML to change tone/structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Topic difficulty assessment
  pub assess_system: String,
  pub assess_user_template: String,
  // Question generation
  pub generate_system: String,
  pub generate_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      assess_system: r#"You are an expert German language educator specializing in vocabulary assessment.
Your task is to assess the CEFR difficulty level of vocabulary topics.

CEFR Levels:
- A1: Basic words (greetings, numbers, colors, family, food basics)
- A2: Everyday topics (shopping, travel basics, hobbies, daily routine)
- B1: Intermediate topics (work, health, education, media)
- B2: Advanced topics (politics, science, business, abstract concepts)
- C1: Professional topics (law, medicine, technology, academic)
- C2: Specialized/rare vocabulary (philosophy, literature, technical jargon)

Respond with ONLY a JSON object in this exact format:
{"level": "A1", "reasoning": "brief explanation", "simplerTopic": "suggested easier topic or null"}"#.into(),
      assess_user_template: "Assess the CEFR level for German vocabulary about: {topic}".into(),
      generate_system: r#"You are an expert German language teacher creating vocabulary exercises.
Generate fill-in-the-blank sentences for German learners.

Rules:
1. Create natural, contextual sentences in German
2. The blank should replace a key vocabulary word
3. Provide the English translation of the sentence
4. Match the difficulty to the specified CEFR level
5. Use vocabulary appropriate for the given topic

Respond with ONLY a JSON array of objects, each with:
- sentenceWithBlank: German sentence with ___ for the missing word
- completeSentence: Full German sentence with the word
- targetWord: The German word that fills the blank
- englishWord: English translation of the target word
- englishTranslation: Full English translation of the sentence

Example:
[{"sentenceWithBlank": "Ich trinke gern ___.", "completeSentence": "Ich trinke gern Kaffee.", "targetWord": "Kaffee", "englishWord": "coffee", "englishTranslation": "I like to drink ___."}]"#.into(),
      generate_user_template: "Generate {count} German vocabulary sentences about '{topic}' at {level} level.".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "lexio_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lexio_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lexio_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
