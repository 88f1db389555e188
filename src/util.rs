//! Small utility helpers used across modules.

use uuid::Uuid;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Short opaque id for exercises and pending tickets (8 hex chars of a v4 UUID).
pub fn short_id() -> String {
  Uuid::new_v4().to_string()[..8].to_string()
}

/// Stage one of the LLM response pipeline: extract the candidate JSON
/// substring by stripping a markdown code fence, if present. Stage two
/// (structural decode) lives with the callers in `generate`.
pub fn extract_json(response: &str) -> &str {
  let mut cleaned = response.trim();
  if let Some(rest) = cleaned.strip_prefix("```json") {
    cleaned = rest;
  } else if let Some(rest) = cleaned.strip_prefix("```") {
    cleaned = rest;
  }
  if let Some(rest) = cleaned.strip_suffix("```") {
    cleaned = rest;
  }
  cleaned.trim()
}

/// German definite/indefinite articles accepted (and ignored) in answers.
const ARTICLES: [&str; 8] = ["der", "die", "das", "ein", "eine", "einen", "einem", "einer"];

/// Normalize a learner's answer for comparison: trim, lowercase, then strip
/// a single leading article token followed by whitespace. Articles embedded
/// mid-word are left alone ("derbyshire" stays intact).
pub fn normalize_answer(answer: &str) -> String {
  let s = answer.trim().to_lowercase();
  for article in ARTICLES {
    if let Some(rest) = s.strip_prefix(article) {
      if rest.starts_with(char::is_whitespace) {
        return rest.trim_start().to_string();
      }
    }
  }
  s
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads. The cut backs
/// off to a char boundary so multi-byte input can't panic the slice.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
