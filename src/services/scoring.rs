//! Pure answer-key resolution. Nothing here touches the database; the
//! transactional side lives in [`crate::services::exam_finalize`].

use std::collections::HashMap;

use crate::db::models::Question;

const OPTION_PREFIX: &str = "option_";

/// Canonical form of an answer option: trimmed and lowercased, with the
/// `option_x` form reduced to its trailing letter. Anything else is kept as is.
pub(crate) fn normalize_option(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let letter = lowered
        .strip_prefix(OPTION_PREFIX)
        .and_then(|rest| rest.chars().last())
        .filter(char::is_ascii_alphabetic);
    match letter {
        Some(letter) => letter.to_string(),
        None => lowered,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradedAnswer {
    pub(crate) question_id: i64,
    /// As submitted, trimmed.
    pub(crate) selected_option: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreOutcome {
    pub(crate) obtained_marks: i64,
    pub(crate) total_marks: i64,
    pub(crate) answers: Vec<GradedAnswer>,
}

impl ScoreOutcome {
    pub(crate) fn percentage(&self) -> f64 {
        percentage(self.obtained_marks, self.total_marks)
    }
}

pub(crate) fn percentage(obtained: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    obtained as f64 / total as f64 * 100.0
}

/// Resolves `answers` (question id as string to selected option) against the
/// exam's questions. Every question counts toward the total; only answered
/// questions yield a [`GradedAnswer`]. Keys matching no question are ignored.
pub(crate) fn score_answers(questions: &[Question], answers: &HashMap<String, String>) -> ScoreOutcome {
    let mut obtained_marks = 0_i64;
    let mut total_marks = 0_i64;
    let mut graded = Vec::new();

    for question in questions {
        let marks = i64::from(question.marks);
        total_marks += marks;

        let Some(selected) = answers.get(&question.id.to_string()) else {
            continue;
        };

        let is_correct = normalize_option(selected) == normalize_option(&question.correct_option);
        if is_correct {
            obtained_marks += marks;
        }

        graded.push(GradedAnswer {
            question_id: question.id,
            selected_option: selected.trim().to_string(),
            is_correct,
        });
    }

    ScoreOutcome { obtained_marks, total_marks, answers: graded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64, correct: &str, marks: i32) -> Question {
        Question {
            id,
            exam_id: 1,
            question_text: format!("Question {id}"),
            option_a: "A".to_string(),
            option_b: "B".to_string(),
            option_c: "C".to_string(),
            option_d: "D".to_string(),
            correct_option: correct.to_string(),
            marks,
        }
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn normalize_handles_both_shapes() {
        assert_eq!(normalize_option("b"), "b");
        assert_eq!(normalize_option("option_b"), "b");
        assert_eq!(normalize_option("  Option_C "), "c");
        assert_eq!(normalize_option("D"), "d");
    }

    #[test]
    fn normalize_keeps_non_letter_tails() {
        assert_eq!(normalize_option("option_1"), "option_1");
        assert_eq!(normalize_option(""), "");
        assert_eq!(normalize_option("   "), "");
    }

    #[test]
    fn normalize_only_strips_the_option_prefix() {
        assert_eq!(normalize_option("bad"), "bad");
        assert_eq!(normalize_option("xd"), "xd");
        assert_ne!(normalize_option("bad"), normalize_option("d"));
        assert_ne!(normalize_option("xd"), normalize_option("d"));
        assert_eq!(normalize_option("no idea, guessed"), "no idea, guessed");
    }

    #[test]
    fn free_text_answer_is_not_correct() {
        let questions = vec![question(1, "d", 4)];
        let outcome = score_answers(&questions, &answers(&[("1", "no idea, guessed")]));

        assert_eq!(outcome.obtained_marks, 0);
        assert!(!outcome.answers[0].is_correct);
    }

    #[test]
    fn normalize_is_symmetric() {
        for stored in ["a", "option_a", " A "] {
            for submitted in ["a", "option_a", "OPTION_A"] {
                assert_eq!(normalize_option(stored), normalize_option(submitted));
            }
        }
    }

    #[test]
    fn partial_submission_scores_marks_not_questions() {
        let questions = vec![question(1, "b", 5), question(2, "c", 10)];
        let outcome = score_answers(&questions, &answers(&[("1", "b"), ("2", "d")]));

        assert_eq!(outcome.obtained_marks, 5);
        assert_eq!(outcome.total_marks, 15);
        assert_eq!(outcome.percentage().round(), 33.0);
        assert_eq!(
            outcome.answers,
            vec![
                GradedAnswer { question_id: 1, selected_option: "b".to_string(), is_correct: true },
                GradedAnswer {
                    question_id: 2,
                    selected_option: "d".to_string(),
                    is_correct: false
                },
            ]
        );
    }

    #[test]
    fn prefixed_answers_score_full_marks() {
        let questions = vec![question(1, "b", 5), question(2, "c", 10)];
        let outcome = score_answers(&questions, &answers(&[("1", "option_b"), ("2", "option_c")]));

        assert_eq!(outcome.obtained_marks, 15);
        assert_eq!(outcome.percentage(), 100.0);
    }

    #[test]
    fn empty_submission_scores_zero_without_rows() {
        let questions = vec![question(1, "a", 3), question(2, "b", 4)];
        let outcome = score_answers(&questions, &HashMap::new());

        assert_eq!(outcome.obtained_marks, 0);
        assert_eq!(outcome.total_marks, 7);
        assert_eq!(outcome.percentage(), 0.0);
        assert!(outcome.answers.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let questions = vec![question(1, "a", 2)];
        let outcome = score_answers(&questions, &answers(&[("1", " a "), ("99", "a"), ("x", "b")]));

        assert_eq!(outcome.obtained_marks, 2);
        assert_eq!(outcome.answers.len(), 1);
        assert_eq!(outcome.answers[0].selected_option, "a");
    }

    #[test]
    fn zero_total_yields_zero_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }
}
