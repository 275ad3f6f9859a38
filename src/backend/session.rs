use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{Answer, Exam, ExamResult, Question, Section};
use crate::backend::scoring;

/// Countdown anchored to a wall-clock end time, so it keeps running across reloads.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SectionTimer {
    pub ends_at: DateTime<Utc>,
}

impl SectionTimer {
    pub fn start(now: DateTime<Utc>, duration: Duration) -> Self {
        Self { ends_at: now + duration }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.ends_at - now).max(Duration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) <= Duration::zero()
    }
}

/// `MM:SS`, with hours folded into the minutes.
pub fn format_clock(remaining: Duration) -> String {
    let secs = remaining.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Running(Duration),
    SectionAdvanced,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamSession {
    pub exam: Exam,
    pub user_id: String,
    pub section_index: usize,
    pub question_index: usize,
    pub answers: HashMap<String, Answer>,
    pub timer: SectionTimer,
    pub started_at: DateTime<Utc>,
}

impl ExamSession {
    pub fn start(exam: Exam, user_id: &str, now: DateTime<Utc>) -> AppResult<Self> {
        let first = exam
            .sections
            .first()
            .ok_or_else(|| AppError::Exam(format!("exam '{}' has no sections", exam.title)))?;

        if let Some(section) = exam.sections.iter().find(|s| s.questions.is_empty()) {
            return Err(AppError::Exam(format!(
                "section '{}' has no questions",
                section.name
            )));
        }

        let timer = SectionTimer::start(now, first.duration());
        tracing::info!(exam = %exam.id, sections = exam.sections.len(), "Starting exam session");

        Ok(Self {
            exam,
            user_id: user_id.to_string(),
            section_index: 0,
            question_index: 0,
            answers: HashMap::new(),
            timer,
            started_at: now,
        })
    }

    pub fn current_section(&self) -> &Section {
        // section_index is only ever moved within bounds
        &self.exam.sections[self.section_index]
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_section().questions.get(self.question_index)
    }

    pub fn is_last_section(&self) -> bool {
        self.section_index + 1 >= self.exam.sections.len()
    }

    pub fn answered_in_section(&self) -> usize {
        self.current_section()
            .questions
            .iter()
            .filter(|q| self.answers.get(&q.id).is_some_and(|a| !a.is_empty()))
            .count()
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn record_answer(&mut self, question_id: &str, answer: Answer) -> AppResult<()> {
        let known = self
            .exam
            .sections
            .iter()
            .flat_map(|s| s.questions.iter())
            .any(|q| q.id == question_id);
        if !known {
            return Err(AppError::Exam(format!("unknown question {}", question_id)));
        }
        self.answers.insert(question_id.to_string(), answer);
        Ok(())
    }

    pub fn next_question(&mut self) {
        let count = self.current_section().questions.len();
        if self.question_index + 1 < count {
            self.question_index += 1;
        }
    }

    pub fn previous_question(&mut self) {
        self.question_index = self.question_index.saturating_sub(1);
    }

    pub fn go_to_question(&mut self, index: usize) {
        if index < self.current_section().questions.len() {
            self.question_index = index;
        }
    }

    /// Moves to the next section and restarts the clock. `false` on the last section.
    pub fn advance_section(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_last_section() {
            return false;
        }
        self.section_index += 1;
        self.question_index = 0;
        self.timer = SectionTimer::start(now, self.current_section().duration());
        tracing::debug!(section = %self.current_section().name, "Advanced to next section");
        true
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.timer.is_expired(now) {
            return TickOutcome::Running(self.timer.remaining(now));
        }
        if self.advance_section(now) {
            TickOutcome::SectionAdvanced
        } else {
            TickOutcome::Finished
        }
    }

    pub fn finish(&self, now: DateTime<Utc>) -> ExamResult {
        scoring::score_exam(&self.exam, &self.user_id, &self.answers, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{QuestionBody, SectionKind};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            prompt: format!("Question {}", id),
            marks: None,
            body: QuestionBody::MultipleChoice {
                options: vec!["yes".into(), "no".into()],
                correct_answers: vec!["yes".into()],
            },
        }
    }

    fn section(name: &str, minutes: u32, ids: &[&str]) -> Section {
        Section {
            name: name.to_string(),
            kind: SectionKind::Reading,
            duration_minutes: minutes,
            question_ids: ids.iter().map(|i| i.to_string()).collect(),
            questions: ids.iter().map(|i| question(i)).collect(),
        }
    }

    fn exam() -> Exam {
        Exam {
            id: "exam-1".into(),
            title: "Mock".into(),
            description: String::new(),
            course_id: None,
            sections: vec![section("Reading", 10, &["a", "b"]), section("Listening", 5, &["c"])],
        }
    }

    #[test]
    fn test_timer_never_negative() {
        let timer = SectionTimer::start(t0(), Duration::seconds(90));
        assert_eq!(timer.remaining(t0() + Duration::seconds(30)), Duration::seconds(60));
        assert_eq!(timer.remaining(t0() + Duration::minutes(5)), Duration::zero());
        assert!(timer.is_expired(t0() + Duration::seconds(90)));
        assert!(!timer.is_expired(t0() + Duration::seconds(89)));
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::seconds(65)), "01:05");
        assert_eq!(format_clock(Duration::minutes(75)), "75:00");
        assert_eq!(format_clock(Duration::seconds(-3)), "00:00");
    }

    #[test]
    fn test_start_rejects_unresolved_sections() {
        let mut empty = exam();
        empty.sections[1].questions.clear();
        assert!(matches!(ExamSession::start(empty, "u", t0()), Err(AppError::Exam(_))));

        let mut none = exam();
        none.sections.clear();
        assert!(ExamSession::start(none, "u", t0()).is_err());
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut session = ExamSession::start(exam(), "u", t0()).expect("Failed to start");
        session.previous_question();
        assert_eq!(session.question_index, 0);
        session.next_question();
        session.next_question();
        assert_eq!(session.question_index, 1);
        assert_eq!(session.current_question().map(|q| q.id.as_str()), Some("b"));
        session.go_to_question(7);
        assert_eq!(session.question_index, 1);
    }

    #[test]
    fn test_record_answer_replaces_and_rejects_unknown() {
        let mut session = ExamSession::start(exam(), "u", t0()).expect("Failed to start");
        session.record_answer("a", Answer::Choices(vec!["no".into()])).unwrap();
        session.record_answer("a", Answer::Choices(vec!["yes".into()])).unwrap();
        assert_eq!(session.answers.len(), 1);
        assert_eq!(session.answered_in_section(), 1);
        assert!(session.record_answer("zzz", Answer::Text("x".into())).is_err());
    }

    #[test]
    fn test_tick_walks_sections_then_finishes() {
        let mut session = ExamSession::start(exam(), "u", t0()).expect("Failed to start");

        match session.tick(t0() + Duration::minutes(4)) {
            TickOutcome::Running(left) => assert_eq!(left, Duration::minutes(6)),
            other => panic!("Expected running, got {:?}", other),
        }

        let later = t0() + Duration::minutes(10);
        assert_eq!(session.tick(later), TickOutcome::SectionAdvanced);
        assert_eq!(session.section_index, 1);
        assert_eq!(session.timer.ends_at, later + Duration::minutes(5));

        assert_eq!(session.tick(later + Duration::minutes(5)), TickOutcome::Finished);
        assert_eq!(session.section_index, 1);
    }

    #[test]
    fn test_reload_after_long_absence_advances_one_section_per_tick() {
        let mut three = exam();
        three.sections.push(section("Writing", 20, &["d"]));
        let session = ExamSession::start(three, "u", t0()).expect("Failed to start");
        let json = serde_json::to_string(&session).expect("Failed to serialize");

        // Back after both the first and second sections would have run out.
        let now = t0() + Duration::minutes(40);
        let mut restored: ExamSession = serde_json::from_str(&json).expect("Failed to restore");
        assert_eq!(restored.tick(now), TickOutcome::SectionAdvanced);
        assert_eq!(restored.section_index, 1);
        assert_eq!(restored.question_index, 0);
        assert_eq!(restored.timer.ends_at, now + Duration::minutes(5));

        let next = now + Duration::seconds(1);
        assert_eq!(restored.tick(next), TickOutcome::Running(Duration::seconds(299)));
        assert_eq!(restored.section_index, 1);
    }

    #[test]
    fn test_session_survives_serialization() {
        let mut session = ExamSession::start(exam(), "u", t0()).expect("Failed to start");
        session.record_answer("b", Answer::Choices(vec!["yes".into()])).unwrap();

        let json = serde_json::to_string(&session).expect("Failed to serialize");
        let restored: ExamSession = serde_json::from_str(&json).expect("Failed to restore");
        assert_eq!(restored, session);
        assert_eq!(restored.timer.remaining(t0() + Duration::minutes(3)), Duration::minutes(7));
    }

    #[test]
    fn test_finish_scores_unanswered_as_zero() {
        let mut session = ExamSession::start(exam(), "u-9", t0()).expect("Failed to start");
        session.record_answer("a", Answer::Choices(vec!["yes".into()])).unwrap();
        let result = session.finish(t0() + Duration::minutes(1));
        assert_eq!(result.user_id, "u-9");
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.total_score, 1.0);
        assert_eq!(result.max_score, 3.0);
    }
}
