//! Test attempt scoring
//!
//! Correct answers earn the question's marks, wrong answers lose the
//! test's negative marks, skipped questions count zero.

use crate::data::Question;
use crate::error::AppError;

/// Result of scoring one attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub score: i64,
    pub max_score: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
}

/// Score `answers` against `questions`
///
/// # Errors
/// `AppError::Validation` when the answer count differs from the question
/// count or an answer points past the question's options.
pub fn score_attempt(
    questions: &[Question],
    answers: &[Option<usize>],
    negative_marks: i64,
) -> Result<Score, AppError> {
    if answers.len() != questions.len() {
        return Err(AppError::Validation(format!(
            "expected {} answers, got {}",
            questions.len(),
            answers.len()
        )));
    }

    let mut result = Score::default();
    for (index, (question, answer)) in questions.iter().zip(answers).enumerate() {
        result.max_score = result.max_score.saturating_add(question.marks);

        let Some(selected) = *answer else {
            continue;
        };
        if selected >= question.options.len() {
            return Err(AppError::Validation(format!(
                "answer {} is out of range for question {}",
                selected,
                index + 1
            )));
        }

        if selected == question.correct_option {
            result.score = result.score.saturating_add(question.marks);
            result.correct_count += 1;
        } else {
            result.score = result.score.saturating_sub(negative_marks);
            result.wrong_count += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct_option: usize, marks: i64) -> Question {
        Question {
            prompt: "Which particle carries a negative charge?".to_string(),
            options: vec![
                "Proton".to_string(),
                "Neutron".to_string(),
                "Electron".to_string(),
                "Positron".to_string(),
            ],
            correct_option,
            marks,
            explanation: None,
        }
    }

    #[test]
    fn neet_style_marking() {
        let questions = vec![question(2, 4), question(0, 4), question(1, 4), question(3, 4)];
        let answers = vec![Some(2), Some(1), None, Some(3)];

        let score = score_attempt(&questions, &answers, 1).unwrap();

        assert_eq!(
            score,
            Score {
                score: 4 - 1 + 4,
                max_score: 16,
                correct_count: 2,
                wrong_count: 1,
            }
        );
    }

    #[test]
    fn score_can_go_negative() {
        let questions = vec![question(0, 4), question(0, 4)];
        let score = score_attempt(&questions, &[Some(1), Some(2)], 1).unwrap();
        assert_eq!(score.score, -2);
        assert_eq!(score.correct_count, 0);
    }

    #[test]
    fn all_skipped_scores_zero() {
        let questions = vec![question(0, 4), question(1, 2)];
        let score = score_attempt(&questions, &[None, None], 1).unwrap();
        assert_eq!(score.score, 0);
        assert_eq!(score.max_score, 6);
    }

    #[test]
    fn answer_count_must_match() {
        let questions = vec![question(0, 4), question(1, 4)];
        assert!(matches!(
            score_attempt(&questions, &[Some(0)], 1),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn out_of_range_answer_is_rejected() {
        let questions = vec![question(0, 4)];
        assert!(matches!(
            score_attempt(&questions, &[Some(4)], 1),
            Err(AppError::Validation(_))
        ));
    }
}
