use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for a gap in fill-in-blanks text.
pub const BLANK_MARKER: &str = "[blank]";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_paid: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Reading,
    Writing,
    Listening,
    Speaking,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Reading,
        SectionKind::Writing,
        SectionKind::Listening,
        SectionKind::Speaking,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Reading => "Reading",
            SectionKind::Writing => "Writing",
            SectionKind::Listening => "Listening",
            SectionKind::Speaking => "Speaking",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "writing" => SectionKind::Writing,
            "listening" => SectionKind::Listening,
            "speaking" => SectionKind::Speaking,
            _ => SectionKind::Reading,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub kind: SectionKind,
    pub duration_minutes: u32,
    #[serde(default)]
    pub question_ids: Vec<String>,
    /// Resolved questions. Filled either by the server or when the exam starts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<Question>,
}

impl Section {
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_resolved(&self) -> bool {
        !self.questions.is_empty() && self.questions.len() >= self.question_ids.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exam {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Exam {
    pub fn total_minutes(&self) -> u32 {
        self.sections.iter().map(|s| s.duration_minutes).sum()
    }

    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .map(|s| s.question_ids.len().max(s.questions.len()))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub prompt: String,
    /// Weight of the question. Objective scores are scaled onto it when present.
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(flatten)]
    pub body: QuestionBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionBody {
    MultipleChoice {
        options: Vec<String>,
        #[serde(default)]
        correct_answers: Vec<String>,
    },
    FillInBlanks {
        text: String,
        #[serde(default)]
        answers: Vec<String>,
        #[serde(default)]
        word_bank: Vec<String>,
    },
    SummarizeText {
        passage: String,
        #[serde(default)]
        min_words: Option<u32>,
        #[serde(default)]
        max_words: Option<u32>,
    },
    Essay {
        topic: String,
        #[serde(default)]
        min_words: Option<u32>,
        #[serde(default)]
        max_words: Option<u32>,
    },
}

impl QuestionBody {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionBody::MultipleChoice { .. } => "multiple-choice",
            QuestionBody::FillInBlanks { .. } => "fill-in-blanks",
            QuestionBody::SummarizeText { .. } => "summarize-text",
            QuestionBody::Essay { .. } => "essay",
        }
    }

    pub fn is_objective(&self) -> bool {
        matches!(
            self,
            QuestionBody::MultipleChoice { .. } | QuestionBody::FillInBlanks { .. }
        )
    }
}

/// Splits fill-in-blanks text into the literal segments around each gap.
pub fn blank_segments(text: &str) -> Vec<&str> {
    text.split(BLANK_MARKER).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComprehensionItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ReadingBody {
    Mcq {
        options: Vec<String>,
        #[serde(default)]
        correct_answers: Vec<String>,
    },
    FillInBlanks {
        text: String,
        #[serde(default)]
        answers: Vec<String>,
        #[serde(default)]
        word_bank: Vec<String>,
    },
    /// Paragraphs are stored in their correct order.
    Reorder { paragraphs: Vec<String> },
    ReadingComprehension { items: Vec<ComprehensionItem> },
}

impl ReadingBody {
    pub fn label(&self) -> &'static str {
        match self {
            ReadingBody::Mcq { .. } => "mcq",
            ReadingBody::FillInBlanks { .. } => "fill-in-blanks",
            ReadingBody::Reorder { .. } => "reorder",
            ReadingBody::ReadingComprehension { .. } => "reading-comprehension",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingMaterial {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub passage: String,
    #[serde(flatten)]
    pub body: ReadingBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Choices(Vec<String>),
    Blanks(Vec<String>),
    Text(String),
    /// Indices into the correctly ordered list, in the order the user placed them.
    Order(Vec<usize>),
}

impl Answer {
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Choices(v) | Answer::Blanks(v) => v.iter().all(|s| s.trim().is_empty()),
            Answer::Text(s) => s.trim().is_empty(),
            Answer::Order(v) => v.is_empty(),
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Answer::Choices(v) | Answer::Blanks(v) => v.join(", "),
            Answer::Text(s) => s.clone(),
            Answer::Order(v) => v
                .iter()
                .map(|i| (i + 1).to_string())
                .collect::<Vec<_>>()
                .join(" → "),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GradingStatus {
    Auto,
    Pending,
    Graded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionResult {
    pub question_id: String,
    pub question_type: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub answer: Option<Answer>,
    pub is_correct: Option<bool>,
    pub score: f64,
    pub max_score: f64,
    pub status: GradingStatus,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ResultStatus {
    PendingReview,
    Graded,
}

impl ResultStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResultStatus::PendingReview => "Pending review",
            ResultStatus::Graded => "Graded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExamResult {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub exam_id: String,
    #[serde(default)]
    pub exam_title: String,
    pub user_id: String,
    pub items: Vec<QuestionResult>,
    pub auto_score: f64,
    pub total_score: f64,
    pub max_score: f64,
    pub status: ResultStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Complete,
    Failed,
    FullRefund,
    PartialRefund,
    Ambiguous,
    NotFound,
    Canceled,
}

impl PaymentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Complete => "Complete",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::FullRefund => "Refunded",
            PaymentStatus::PartialRefund => "Partially refunded",
            PaymentStatus::Ambiguous => "Ambiguous",
            PaymentStatus::NotFound => "Not found",
            PaymentStatus::Canceled => "Canceled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    pub amount: f64,
    pub transaction_uuid: String,
    #[serde(default)]
    pub ref_id: Option<String>,
    pub status: PaymentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SpeakingKind {
    #[default]
    ReadAloud,
    RepeatSentence,
    DescribeImage,
    RetellLecture,
    AnswerShortQuestion,
}

impl SpeakingKind {
    pub fn label(&self) -> &'static str {
        match self {
            SpeakingKind::ReadAloud => "Read Aloud",
            SpeakingKind::RepeatSentence => "Repeat Sentence",
            SpeakingKind::DescribeImage => "Describe Image",
            SpeakingKind::RetellLecture => "Re-tell Lecture",
            SpeakingKind::AnswerShortQuestion => "Answer Short Question",
        }
    }
}

fn default_preparation_seconds() -> u32 {
    35
}

fn default_response_seconds() -> u32 {
    40
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakingQuestion {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub kind: SpeakingKind,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_preparation_seconds")]
    pub preparation_seconds: u32,
    #[serde(default = "default_response_seconds")]
    pub response_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakingResponse {
    #[serde(default, alias = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub mime_type: String,
    /// Base64 encoded recording.
    pub audio: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub marks: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl SpeakingResponse {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_parses_from_server_json() {
        let json = r#"{
            "_id": "q1",
            "prompt": "Pick the synonym of rapid",
            "type": "multiple-choice",
            "options": ["slow", "quick", "late"],
            "correct_answers": ["quick"]
        }"#;

        let question: Question = serde_json::from_str(json).expect("Failed to parse question");
        assert_eq!(question.id, "q1");
        assert_eq!(question.marks, None);
        assert!(question.body.is_objective());
        match question.body {
            QuestionBody::MultipleChoice { options, correct_answers } => {
                assert_eq!(options.len(), 3);
                assert_eq!(correct_answers, vec!["quick".to_string()]);
            }
            other => panic!("Unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_essay_is_subjective() {
        let json = r#"{"id": "q2", "prompt": "Write", "marks": 15, "type": "essay", "topic": "Cities"}"#;
        let question: Question = serde_json::from_str(json).expect("Failed to parse essay");
        assert_eq!(question.marks, Some(15.0));
        assert!(!question.body.is_objective());
        assert_eq!(question.body.label(), "essay");
    }

    #[test]
    fn test_exam_sections_without_questions() {
        let json = r#"{
            "id": "e1",
            "title": "Mock Test 1",
            "sections": [
                {"name": "Reading", "kind": "reading", "duration_minutes": 30, "question_ids": ["a", "b"]},
                {"name": "Writing", "kind": "writing", "duration_minutes": 20, "question_ids": ["c"]}
            ]
        }"#;

        let exam: Exam = serde_json::from_str(json).expect("Failed to parse exam");
        assert_eq!(exam.total_minutes(), 50);
        assert_eq!(exam.question_count(), 3);
        assert!(!exam.sections[0].is_resolved());
        assert_eq!(exam.sections[1].duration(), Duration::minutes(20));

        // Unresolved questions are not echoed back to the server.
        let value = serde_json::to_value(&exam).expect("Failed to serialize exam");
        assert!(value["sections"][0].get("questions").is_none());
    }

    #[test]
    fn test_reading_material_reorder() {
        let json = r#"{"id": "r1", "title": "Order", "type": "reorder", "paragraphs": ["A", "B", "C"]}"#;
        let material: ReadingMaterial = serde_json::from_str(json).expect("Failed to parse material");
        assert_eq!(material.body.label(), "reorder");
        assert_eq!(material.passage, "");
    }

    #[test]
    fn test_blank_segments() {
        let segments = blank_segments("The [blank] sat on the [blank].");
        assert_eq!(segments, vec!["The ", " sat on the ", "."]);
    }

    #[test]
    fn test_answer_tagging() {
        let answer = Answer::Blanks(vec!["cat".into(), "mat".into()]);
        let value = serde_json::to_value(&answer).expect("Failed to serialize answer");
        assert_eq!(value["kind"], "blanks");
        assert_eq!(value["value"][1], "mat");
        assert!(!answer.is_empty());
        assert!(Answer::Text("   ".into()).is_empty());
    }

    #[test]
    fn test_payment_status_wire_names() {
        let status: PaymentStatus = serde_json::from_str("\"FULL_REFUND\"").expect("Failed to parse status");
        assert_eq!(status, PaymentStatus::FullRefund);
        assert_eq!(serde_json::to_string(&PaymentStatus::Complete).unwrap(), "\"COMPLETE\"");
    }
}
