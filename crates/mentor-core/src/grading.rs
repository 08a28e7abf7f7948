//! Quiz grading.
//!
//! Submissions arrive as an untyped JSON object. [`AnswerSheet::decode`] is
//! the single place where that payload is narrowed: a selection is either an
//! integer or a string holding an integer; anything else is unanswered.
//! Grading itself is a pure function of the question bank and the sheet.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::quiz::{Answers, QuizQuestion};

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decoded answers: question id → selected option index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
  selections: HashMap<Uuid, i64>,
}

impl AnswerSheet {
  /// Narrow a raw submission. Keys that are not question ids and values that
  /// are not integer selections are dropped.
  pub fn decode(answers: &Answers) -> Self {
    let selections = answers
      .iter()
      .filter_map(|(key, value)| {
        let question_id = Uuid::parse_str(key).ok()?;
        Some((question_id, decode_selection(value)?))
      })
      .collect();
    Self { selections }
  }

  pub fn selected(&self, question_id: Uuid) -> Option<i64> {
    self.selections.get(&question_id).copied()
  }

  pub fn len(&self) -> usize { self.selections.len() }

  pub fn is_empty(&self) -> bool { self.selections.is_empty() }
}

/// Read one selected option index out of a JSON value.
///
/// Accepts integers, whole-valued floats (`1.0`) and strings that parse as an
/// integer (`"2"`).
pub fn decode_selection(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| {
      n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
    }),
    Value::String(s) => s.parse().ok(),
    _ => None,
  }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizScore {
  pub score:     u32,
  pub max_score: u32,
}

impl QuizScore {
  pub fn percentage(&self) -> u8 { percentage(self.score, self.max_score) }

  /// At least one question was graded.
  pub fn is_gradable(&self) -> bool { self.max_score > 0 }

  pub fn is_perfect(&self) -> bool {
    self.is_gradable() && self.score == self.max_score
  }
}

/// Score `sheet` against `questions`. Order-independent.
pub fn grade(questions: &[QuizQuestion], sheet: &AnswerSheet) -> QuizScore {
  questions.iter().fold(QuizScore::default(), |mut acc, question| {
    let points = question.effective_points();
    acc.max_score = acc.max_score.saturating_add(points);
    if sheet.selected(question.question_id) == Some(question.correct_index) {
      acc.score = acc.score.saturating_add(points);
    }
    acc
  })
}

/// `round(100 * score / max_score)`, or 0 when there is nothing to score.
pub fn percentage(score: u32, max_score: u32) -> u8 {
  if max_score == 0 {
    return 0;
  }
  let pct = (f64::from(score) / f64::from(max_score) * 100.0).round();
  pct.clamp(0.0, 100.0) as u8
}

/// Decide pass/fail for a graded attempt.
///
/// With a known passing threshold the percentage must reach it. Without one
/// (the material could not be loaded) only a perfect score passes. An empty
/// question bank never passes.
pub fn passed(score: QuizScore, passing_score: Option<u8>) -> bool {
  if !score.is_gradable() {
    return false;
  }
  match passing_score {
    Some(threshold) => score.percentage() >= threshold,
    None => score.is_perfect(),
  }
}
