//! Client-side scoring of objective answers and the manual grading workflow.
//!
//! Objective items (multiple choice, fill in blanks, reorder, comprehension) are
//! scored immediately. Essay and summarize-text items stay `Pending` until an
//! admin assigns marks.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{
    Answer, ComprehensionItem, Exam, ExamResult, GradingStatus, Question, QuestionBody,
    QuestionResult, ReadingBody, ReadingMaterial, ResultStatus,
};

/// Maximum for an essay or summary saved without marks.
pub const DEFAULT_SUBJECTIVE_MARKS: f64 = 10.0;

/// Raw points earned against raw points available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawScore {
    pub earned: f64,
    pub available: f64,
}

impl RawScore {
    fn new(earned: f64, available: f64) -> Self {
        Self { earned, available }
    }

    pub fn is_full(&self) -> bool {
        self.available > 0.0 && (self.earned - self.available).abs() < f64::EPSILON
    }
}

/// Case-insensitive, whitespace-collapsed form used for string matching.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn same(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Single correct option: all or nothing. Several correct options: +1 per right
/// pick, -1 per wrong pick, never below zero.
pub fn score_choices(correct: &[String], chosen: &[String]) -> RawScore {
    let correct = distinct(correct);
    let chosen = distinct(chosen);

    if correct.len() <= 1 {
        let hit = chosen.len() == 1 && correct.first() == chosen.first();
        return RawScore::new(if hit { 1.0 } else { 0.0 }, 1.0);
    }

    let points: i64 = chosen
        .iter()
        .map(|pick| if correct.contains(pick) { 1 } else { -1 })
        .sum();
    RawScore::new(points.max(0) as f64, correct.len() as f64)
}

/// Whether `option` is one of the correct answers under the matching rules used for scoring.
pub fn is_correct_choice(correct: &[String], option: &str) -> bool {
    correct.iter().any(|c| same(c, option))
}

/// Normalized values with repeats removed, first occurrence wins.
fn distinct(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| normalize(v))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// One point per blank whose answer matches the expected word.
pub fn score_blanks(expected: &[String], given: &[String]) -> RawScore {
    let earned = expected
        .iter()
        .enumerate()
        .filter(|(i, want)| given.get(*i).is_some_and(|g| same(want, g)))
        .count();
    RawScore::new(earned as f64, expected.len() as f64)
}

/// One point per correctly ordered adjacent pair.
pub fn score_order(paragraph_count: usize, order: &[usize]) -> RawScore {
    if paragraph_count < 2 {
        return RawScore::new(0.0, 0.0);
    }

    let position: HashMap<usize, usize> = order
        .iter()
        .enumerate()
        .map(|(pos, &paragraph)| (paragraph, pos))
        .collect();

    let earned = (0..paragraph_count - 1)
        .filter(|&i| match (position.get(&i), position.get(&(i + 1))) {
            (Some(a), Some(b)) => *b == *a + 1,
            _ => false,
        })
        .count();
    RawScore::new(earned as f64, (paragraph_count - 1) as f64)
}

pub fn score_comprehension(items: &[ComprehensionItem], given: &[String]) -> (RawScore, Vec<bool>) {
    let flags: Vec<bool> = items
        .iter()
        .enumerate()
        .map(|(i, item)| given.get(i).is_some_and(|g| same(&item.answer, g)))
        .collect();
    let earned = flags.iter().filter(|f| **f).count();
    (RawScore::new(earned as f64, items.len() as f64), flags)
}

fn objective_raw(body: &QuestionBody, answer: Option<&Answer>) -> Option<RawScore> {
    match body {
        QuestionBody::MultipleChoice { correct_answers, .. } => {
            let chosen = match answer {
                Some(Answer::Choices(v)) => v.as_slice(),
                _ => &[],
            };
            Some(score_choices(correct_answers, chosen))
        }
        QuestionBody::FillInBlanks { answers, .. } => {
            let given = match answer {
                Some(Answer::Blanks(v)) => v.as_slice(),
                _ => &[],
            };
            Some(score_blanks(answers, given))
        }
        QuestionBody::SummarizeText { .. } | QuestionBody::Essay { .. } => None,
    }
}

/// Scores one exam question. Raw objective scores are scaled onto `marks` when set.
pub fn score_question(question: &Question, answer: Option<&Answer>) -> QuestionResult {
    let answer = answer.filter(|a| !a.is_empty()).cloned();

    let (is_correct, score, max_score, status) = match objective_raw(&question.body, answer.as_ref()) {
        Some(raw) => {
            let max = question.marks.unwrap_or(raw.available);
            let score = if raw.available > 0.0 {
                raw.earned / raw.available * max
            } else {
                0.0
            };
            (Some(raw.is_full()), score, max, GradingStatus::Auto)
        }
        // Blank or written, a tutor decides the marks.
        None => (None, 0.0, question.marks.unwrap_or(DEFAULT_SUBJECTIVE_MARKS), GradingStatus::Pending),
    };

    QuestionResult {
        question_id: question.id.clone(),
        question_type: question.body.label().to_string(),
        prompt: question.prompt.clone(),
        answer,
        is_correct,
        score,
        max_score,
        status,
        feedback: None,
    }
}

/// Builds the full result for an exam whose sections carry resolved questions.
pub fn score_exam(
    exam: &Exam,
    user_id: &str,
    answers: &HashMap<String, Answer>,
    submitted_at: DateTime<Utc>,
) -> ExamResult {
    let items = exam
        .sections
        .iter()
        .flat_map(|section| section.questions.iter())
        .map(|q| score_question(q, answers.get(&q.id)))
        .collect();

    let mut result = ExamResult {
        id: String::new(),
        exam_id: exam.id.clone(),
        exam_title: exam.title.clone(),
        user_id: user_id.to_string(),
        items,
        auto_score: 0.0,
        total_score: 0.0,
        max_score: 0.0,
        status: ResultStatus::PendingReview,
        submitted_at,
    };
    recompute_totals(&mut result);
    result
}

pub fn recompute_totals(result: &mut ExamResult) {
    result.auto_score = result
        .items
        .iter()
        .filter(|i| i.status == GradingStatus::Auto)
        .map(|i| i.score)
        .sum();
    result.total_score = result.items.iter().map(|i| i.score).sum();
    result.max_score = result.items.iter().map(|i| i.max_score).sum();
    result.status = if result.items.iter().any(|i| i.status == GradingStatus::Pending) {
        ResultStatus::PendingReview
    } else {
        ResultStatus::Graded
    };
}

/// Admin marks for one item. Works for pending items and overrides of auto-scored ones.
pub fn assign_marks(
    result: &mut ExamResult,
    question_id: &str,
    marks: f64,
    feedback: Option<String>,
) -> AppResult<()> {
    let item = result
        .items
        .iter_mut()
        .find(|i| i.question_id == question_id)
        .ok_or_else(|| AppError::Grading(format!("question {} is not part of this result", question_id)))?;

    if !marks.is_finite() || marks < 0.0 || marks > item.max_score {
        return Err(AppError::Grading(format!(
            "marks must be between 0 and {}",
            item.max_score
        )));
    }

    item.score = marks;
    item.is_correct = Some(item.max_score > 0.0 && (marks - item.max_score).abs() < f64::EPSILON);
    item.status = GradingStatus::Graded;
    item.feedback = feedback.filter(|f| !f.trim().is_empty());

    recompute_totals(result);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeOutcome {
    pub score: f64,
    pub max_score: f64,
    /// Per blank, option or comprehension item, in display order.
    pub marks: Vec<bool>,
}

impl PracticeOutcome {
    pub fn is_perfect(&self) -> bool {
        self.max_score > 0.0 && (self.score - self.max_score).abs() < f64::EPSILON
    }
}

/// Checks a reading-material practice attempt with the exam rules.
pub fn check_reading(material: &ReadingMaterial, answer: &Answer) -> PracticeOutcome {
    match (&material.body, answer) {
        (ReadingBody::Mcq { correct_answers, .. }, Answer::Choices(chosen)) => {
            let raw = score_choices(correct_answers, chosen);
            let marks = chosen
                .iter()
                .map(|c| is_correct_choice(correct_answers, c))
                .collect();
            PracticeOutcome { score: raw.earned, max_score: raw.available, marks }
        }
        (ReadingBody::FillInBlanks { answers, .. }, Answer::Blanks(given)) => {
            let raw = score_blanks(answers, given);
            let marks = answers
                .iter()
                .enumerate()
                .map(|(i, want)| given.get(i).is_some_and(|g| same(want, g)))
                .collect();
            PracticeOutcome { score: raw.earned, max_score: raw.available, marks }
        }
        (ReadingBody::Reorder { paragraphs }, Answer::Order(order)) => {
            let raw = score_order(paragraphs.len(), order);
            let marks = order
                .windows(2)
                .map(|pair| pair[1] == pair[0] + 1)
                .collect();
            PracticeOutcome { score: raw.earned, max_score: raw.available, marks }
        }
        (ReadingBody::ReadingComprehension { items }, Answer::Choices(given)) => {
            let (raw, marks) = score_comprehension(items, given);
            PracticeOutcome { score: raw.earned, max_score: raw.available, marks }
        }
        (body, _) => {
            tracing::warn!("Answer shape does not match {} material", body.label());
            PracticeOutcome { score: 0.0, max_score: 0.0, marks: vec![] }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{Section, SectionKind};

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn mcq(id: &str, correct: &[&str], marks: Option<f64>) -> Question {
        Question {
            id: id.to_string(),
            prompt: "Choose".into(),
            marks,
            body: QuestionBody::MultipleChoice {
                options: s(&["a", "b", "c", "d"]),
                correct_answers: s(correct),
            },
        }
    }

    fn essay(id: &str, marks: f64) -> Question {
        Question {
            id: id.to_string(),
            prompt: "Discuss".into(),
            marks: Some(marks),
            body: QuestionBody::Essay { topic: "Travel".into(), min_words: None, max_words: None },
        }
    }

    #[test]
    fn test_single_choice_all_or_nothing() {
        assert_eq!(score_choices(&s(&["b"]), &s(&["B "])).earned, 1.0);
        assert_eq!(score_choices(&s(&["b"]), &s(&["a"])).earned, 0.0);
        // Picking everything does not earn the point.
        assert_eq!(score_choices(&s(&["b"]), &s(&["a", "b"])).earned, 0.0);
    }

    #[test]
    fn test_multiple_choice_negative_marking_floors_at_zero() {
        let correct = s(&["a", "c"]);
        assert_eq!(score_choices(&correct, &s(&["a", "c"])), RawScore::new(2.0, 2.0));
        assert_eq!(score_choices(&correct, &s(&["a", "b"])).earned, 0.0);
        assert_eq!(score_choices(&correct, &s(&["a", "c", "d"])).earned, 1.0);
        assert_eq!(score_choices(&correct, &s(&["b", "d"])).earned, 0.0);
    }

    #[test]
    fn test_blanks_ignore_case_and_spacing() {
        let raw = score_blanks(&s(&["New York", "river"]), &s(&["  new   york", "lake"]));
        assert_eq!(raw, RawScore::new(1.0, 2.0));
        assert_eq!(score_blanks(&s(&["one", "two"]), &s(&["one"])).earned, 1.0);
    }

    #[test]
    fn test_reorder_counts_adjacent_pairs() {
        assert_eq!(score_order(4, &[0, 1, 2, 3]), RawScore::new(3.0, 3.0));
        // (0,1) and (2,3) are kept together.
        assert_eq!(score_order(4, &[2, 3, 0, 1]).earned, 2.0);
        assert_eq!(score_order(3, &[2, 1, 0]).earned, 0.0);
        assert_eq!(score_order(1, &[0]).available, 0.0);
    }

    #[test]
    fn test_question_marks_scale_objective_score() {
        let q = mcq("q1", &["a", "b"], Some(4.0));
        let result = score_question(&q, Some(&Answer::Choices(s(&["a"]))));
        assert_eq!(result.score, 2.0);
        assert_eq!(result.max_score, 4.0);
        assert_eq!(result.is_correct, Some(false));
        assert_eq!(result.status, GradingStatus::Auto);
    }

    #[test]
    fn test_duplicate_picks_count_once() {
        let correct = s(&["a", "c"]);
        let raw = score_choices(&correct, &s(&["a", "a"]));
        assert_eq!(raw, RawScore::new(1.0, 2.0));
        assert!(!raw.is_full());
        assert_eq!(score_choices(&correct, &s(&["a", " A ", "c"])), RawScore::new(2.0, 2.0));
        assert_eq!(score_choices(&correct, &s(&["b", "b", "a"])).earned, 0.0);
    }

    #[test]
    fn test_unanswered_essay_still_goes_to_review() {
        let q = essay("e1", 15.0);
        let blank = score_question(&q, Some(&Answer::Text("  ".into())));
        assert_eq!(blank.status, GradingStatus::Pending);
        assert_eq!(blank.is_correct, None);
        assert_eq!(blank.max_score, 15.0);

        let missing = score_question(&q, None);
        assert_eq!(missing.status, GradingStatus::Pending);
        assert_eq!(missing.score, 0.0);

        let written = score_question(&q, Some(&Answer::Text("Travel broadens the mind.".into())));
        assert_eq!(written.status, GradingStatus::Pending);
        assert_eq!(written.is_correct, None);
        assert_eq!(written.max_score, 15.0);
    }

    fn sample_exam() -> Exam {
        Exam {
            id: "exam-1".into(),
            title: "Mock".into(),
            description: String::new(),
            course_id: None,
            sections: vec![
                Section {
                    name: "Reading".into(),
                    kind: SectionKind::Reading,
                    duration_minutes: 10,
                    question_ids: s(&["q1", "q2"]),
                    questions: vec![
                        mcq("q1", &["a"], None),
                        Question {
                            id: "q2".into(),
                            prompt: "Fill".into(),
                            marks: None,
                            body: QuestionBody::FillInBlanks {
                                text: "[blank] and [blank]".into(),
                                answers: s(&["salt", "pepper"]),
                                word_bank: vec![],
                            },
                        },
                    ],
                },
                Section {
                    name: "Writing".into(),
                    kind: SectionKind::Writing,
                    duration_minutes: 20,
                    question_ids: s(&["e1"]),
                    questions: vec![essay("e1", 10.0)],
                },
            ],
        }
    }

    #[test]
    fn test_score_exam_and_assign_marks() {
        let exam = sample_exam();
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), Answer::Choices(s(&["a"])));
        answers.insert("q2".to_string(), Answer::Blanks(s(&["salt", "sugar"])));
        answers.insert("e1".to_string(), Answer::Text("An essay".into()));

        let mut result = score_exam(&exam, "user-1", &answers, Utc::now());
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.auto_score, 2.0);
        assert_eq!(result.total_score, 2.0);
        assert_eq!(result.max_score, 13.0);
        assert_eq!(result.status, ResultStatus::PendingReview);

        let err = assign_marks(&mut result, "e1", 11.0, None);
        assert!(matches!(err, Err(AppError::Grading(_))));
        assert!(assign_marks(&mut result, "missing", 1.0, None).is_err());

        assign_marks(&mut result, "e1", 7.5, Some("Good structure".into())).expect("Failed to assign marks");
        assert_eq!(result.total_score, 9.5);
        assert_eq!(result.auto_score, 2.0);
        assert_eq!(result.status, ResultStatus::Graded);
        let essay_item = result.items.iter().find(|i| i.question_id == "e1").unwrap();
        assert_eq!(essay_item.feedback.as_deref(), Some("Good structure"));
    }

    #[test]
    fn test_essay_without_marks_can_be_graded() {
        let mut q = essay("e1", 0.0);
        q.marks = None;
        let item = score_question(&q, Some(&Answer::Text("Some text".into())));
        assert_eq!(item.max_score, DEFAULT_SUBJECTIVE_MARKS);

        let mut result = ExamResult {
            id: "r1".into(),
            exam_id: "exam-1".into(),
            exam_title: "Mock".into(),
            user_id: "user-1".into(),
            items: vec![item],
            auto_score: 0.0,
            total_score: 0.0,
            max_score: 0.0,
            status: ResultStatus::PendingReview,
            submitted_at: Utc::now(),
        };
        recompute_totals(&mut result);
        assign_marks(&mut result, "e1", 5.0, None).expect("Failed to assign marks");
        assert_eq!(result.total_score, 5.0);
        assert_eq!(result.status, ResultStatus::Graded);
    }

    #[test]
    fn test_assign_marks_overrides_auto_item() {
        let exam = sample_exam();
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), Answer::Choices(s(&["b"])));
        answers.insert("e1".to_string(), Answer::Text("An essay".into()));
        let mut result = score_exam(&exam, "user-1", &answers, Utc::now());
        assert_eq!(result.auto_score, 0.0);

        assign_marks(&mut result, "q1", 1.0, Some("Accepted on appeal".into())).expect("Failed to override");
        let q1 = result.items.iter().find(|i| i.question_id == "q1").unwrap();
        assert_eq!(q1.status, GradingStatus::Graded);
        assert_eq!(q1.is_correct, Some(true));
        // Overridden items no longer count as automatic.
        assert_eq!(result.auto_score, 0.0);
        assert_eq!(result.total_score, 1.0);
        assert_eq!(result.status, ResultStatus::PendingReview);

        assert!(assign_marks(&mut result, "q1", 2.0, None).is_err());
    }

    #[test]
    fn test_option_highlight_agrees_with_score() {
        let material = ReadingMaterial {
            id: "r2".into(),
            title: "Capitals".into(),
            passage: String::new(),
            body: ReadingBody::Mcq {
                options: s(&["kathmandu", "Pokhara"]),
                correct_answers: s(&["Kathmandu "]),
            },
        };
        let outcome = check_reading(&material, &Answer::Choices(s(&["kathmandu"])));
        assert!(outcome.is_perfect());
        assert_eq!(outcome.marks, vec![true]);
        assert!(is_correct_choice(&s(&["Kathmandu "]), "kathmandu"));
        assert!(!is_correct_choice(&s(&["Kathmandu "]), "Pokhara"));
    }

    #[test]
    fn test_check_reading_comprehension() {
        let material = ReadingMaterial {
            id: "r1".into(),
            title: "Bees".into(),
            passage: "Bees pollinate flowers.".into(),
            body: ReadingBody::ReadingComprehension {
                items: vec![
                    ComprehensionItem { question: "What do bees do?".into(), options: s(&["pollinate", "sleep"]), answer: "pollinate".into() },
                    ComprehensionItem { question: "What?".into(), options: s(&["flowers", "rocks"]), answer: "flowers".into() },
                ],
            },
        };

        let outcome = check_reading(&material, &Answer::Choices(s(&["pollinate", "rocks"])));
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.max_score, 2.0);
        assert_eq!(outcome.marks, vec![true, false]);
        assert!(!outcome.is_perfect());

        let mismatch = check_reading(&material, &Answer::Text("pollinate".into()));
        assert_eq!(mismatch.max_score, 0.0);
    }
}
