use std::collections::HashSet;

use dioxus::prelude::*;

use crate::backend::api::Resource;
use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{
    blank_segments, Question, QuestionBody, ReadingBody, ReadingMaterial, SpeakingKind,
    SpeakingQuestion,
};
use crate::backend::scoring::{normalize, DEFAULT_SUBJECTIVE_MARKS};
use crate::backend::{AppCmd, CmdTx};
use crate::components::admin_page::{delete_record, save_record};
use crate::components::common::{format_score, EmptyState};
use crate::components::forms::{
    comma_list, format_comprehension, lines, optional_f64, optional_u32, parse_comprehension,
};
use crate::components::AppState;

pub const QUESTION_TYPES: [&str; 4] = ["multiple-choice", "fill-in-blanks", "summarize-text", "essay"];
pub const READING_TYPES: [&str; 4] = ["mcq", "fill-in-blanks", "reorder", "reading-comprehension"];

const SPEAKING_KINDS: [SpeakingKind; 5] = [
    SpeakingKind::ReadAloud,
    SpeakingKind::RepeatSentence,
    SpeakingKind::DescribeImage,
    SpeakingKind::RetellLecture,
    SpeakingKind::AnswerShortQuestion,
];

/// Repeated lines collapse to their first occurrence under answer matching.
fn unique_lines(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    lines(text)
        .into_iter()
        .filter(|line| seen.insert(normalize(line)))
        .collect()
}

fn choices(options: &str, correct: &str) -> AppResult<(Vec<String>, Vec<String>)> {
    let options = unique_lines(options);
    let correct = unique_lines(correct);
    if options.len() < 2 {
        return Err(AppError::Validation("Enter at least two options".into()));
    }
    if correct.is_empty() {
        return Err(AppError::Validation("Mark at least one correct answer".into()));
    }
    if let Some(stray) = correct.iter().find(|c| !options.contains(c)) {
        return Err(AppError::Validation(format!("'{}' is not one of the options", stray)));
    }
    Ok((options, correct))
}

/// Answers must line up with the `[blank]` markers in the text.
fn blanks(text: &str, answers: &str, word_bank: &str) -> AppResult<(String, Vec<String>, Vec<String>)> {
    let gaps = blank_segments(text).len().saturating_sub(1);
    let answers = lines(answers);
    if gaps == 0 {
        return Err(AppError::Validation("Mark each gap in the text with [blank]".into()));
    }
    if gaps != answers.len() {
        return Err(AppError::Validation(format!(
            "The text has {} blank(s) but {} answer(s)",
            gaps,
            answers.len()
        )));
    }
    Ok((text.trim().to_string(), answers, comma_list(word_bank)))
}

fn word_limits(min: &str, max: &str) -> AppResult<(Option<u32>, Option<u32>)> {
    let (min, max) = (optional_u32(min)?, optional_u32(max)?);
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(AppError::Validation("Minimum words exceed the maximum".into()));
        }
    }
    Ok((min, max))
}

fn opt_text(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub id: Option<String>,
    pub kind: String,
    pub prompt: String,
    pub marks: String,
    /// Passage, topic or blank text depending on the type.
    pub text: String,
    pub options: String,
    pub answers: String,
    pub word_bank: String,
    pub min_words: String,
    pub max_words: String,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            id: None,
            kind: QUESTION_TYPES[0].to_string(),
            prompt: String::new(),
            marks: String::new(),
            text: String::new(),
            options: String::new(),
            answers: String::new(),
            word_bank: String::new(),
            min_words: String::new(),
            max_words: String::new(),
        }
    }
}

impl QuestionDraft {
    pub fn from_question(question: &Question) -> Self {
        let mut draft = Self {
            id: Some(question.id.clone()),
            kind: question.body.label().to_string(),
            prompt: question.prompt.clone(),
            marks: question.marks.map(format_score).unwrap_or_default(),
            ..Default::default()
        };
        match &question.body {
            QuestionBody::MultipleChoice { options, correct_answers } => {
                draft.options = options.join("\n");
                draft.answers = correct_answers.join("\n");
            }
            QuestionBody::FillInBlanks { text, answers, word_bank } => {
                draft.text = text.clone();
                draft.answers = answers.join("\n");
                draft.word_bank = word_bank.join(", ");
            }
            QuestionBody::SummarizeText { passage: text, min_words, max_words }
            | QuestionBody::Essay { topic: text, min_words, max_words } => {
                draft.text = text.clone();
                draft.min_words = opt_text(*min_words);
                draft.max_words = opt_text(*max_words);
            }
        }
        draft
    }

    pub fn build(&self) -> AppResult<Question> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Question prompt is required".into()));
        }
        let body = match self.kind.as_str() {
            "multiple-choice" => {
                let (options, correct_answers) = choices(&self.options, &self.answers)?;
                QuestionBody::MultipleChoice { options, correct_answers }
            }
            "fill-in-blanks" => {
                let (text, answers, word_bank) = blanks(&self.text, &self.answers, &self.word_bank)?;
                QuestionBody::FillInBlanks { text, answers, word_bank }
            }
            "summarize-text" | "essay" => {
                let text = self.text.trim().to_string();
                if text.is_empty() {
                    return Err(AppError::Validation("Passage or topic is required".into()));
                }
                if !optional_f64(&self.marks)?.is_some_and(|m| m > 0.0) {
                    return Err(AppError::Validation("Marks are required for written answers".into()));
                }
                let (min_words, max_words) = word_limits(&self.min_words, &self.max_words)?;
                if self.kind == "essay" {
                    QuestionBody::Essay { topic: text, min_words, max_words }
                } else {
                    QuestionBody::SummarizeText { passage: text, min_words, max_words }
                }
            }
            other => return Err(AppError::Validation(format!("Unknown question type '{}'", other))),
        };
        Ok(Question {
            id: self.id.clone().unwrap_or_default(),
            prompt: prompt.to_string(),
            marks: optional_f64(&self.marks)?,
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingDraft {
    pub id: Option<String>,
    pub kind: String,
    pub title: String,
    pub passage: String,
    pub text: String,
    pub options: String,
    pub answers: String,
    pub word_bank: String,
    /// Paragraphs (reorder) or comprehension items, one per line.
    pub items: String,
}

impl Default for ReadingDraft {
    fn default() -> Self {
        Self {
            id: None,
            kind: READING_TYPES[0].to_string(),
            title: String::new(),
            passage: String::new(),
            text: String::new(),
            options: String::new(),
            answers: String::new(),
            word_bank: String::new(),
            items: String::new(),
        }
    }
}

impl ReadingDraft {
    pub fn from_material(material: &ReadingMaterial) -> Self {
        let mut draft = Self {
            id: Some(material.id.clone()),
            kind: material.body.label().to_string(),
            title: material.title.clone(),
            passage: material.passage.clone(),
            ..Default::default()
        };
        match &material.body {
            ReadingBody::Mcq { options, correct_answers } => {
                draft.options = options.join("\n");
                draft.answers = correct_answers.join("\n");
            }
            ReadingBody::FillInBlanks { text, answers, word_bank } => {
                draft.text = text.clone();
                draft.answers = answers.join("\n");
                draft.word_bank = word_bank.join(", ");
            }
            ReadingBody::Reorder { paragraphs } => draft.items = paragraphs.join("\n"),
            ReadingBody::ReadingComprehension { items } => draft.items = format_comprehension(items),
        }
        draft
    }

    pub fn build(&self) -> AppResult<ReadingMaterial> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".into()));
        }
        let body = match self.kind.as_str() {
            "mcq" => {
                let (options, correct_answers) = choices(&self.options, &self.answers)?;
                ReadingBody::Mcq { options, correct_answers }
            }
            "fill-in-blanks" => {
                let (text, answers, word_bank) = blanks(&self.text, &self.answers, &self.word_bank)?;
                ReadingBody::FillInBlanks { text, answers, word_bank }
            }
            "reorder" => {
                let paragraphs = lines(&self.items);
                if paragraphs.len() < 2 {
                    return Err(AppError::Validation("Enter at least two paragraphs".into()));
                }
                ReadingBody::Reorder { paragraphs }
            }
            "reading-comprehension" => {
                let items = parse_comprehension(&self.items)?;
                if items.is_empty() {
                    return Err(AppError::Validation("Enter at least one question".into()));
                }
                ReadingBody::ReadingComprehension { items }
            }
            other => return Err(AppError::Validation(format!("Unknown material type '{}'", other))),
        };
        Ok(ReadingMaterial {
            id: self.id.clone().unwrap_or_default(),
            title: title.to_string(),
            passage: self.passage.trim().to_string(),
            body,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakingDraft {
    pub id: Option<String>,
    pub kind: SpeakingKind,
    pub prompt: String,
    pub image_url: String,
    pub preparation_seconds: String,
    pub response_seconds: String,
}

impl SpeakingDraft {
    pub fn from_question(question: &SpeakingQuestion) -> Self {
        Self {
            id: Some(question.id.clone()),
            kind: question.kind,
            prompt: question.prompt.clone(),
            image_url: question.image_url.clone().unwrap_or_default(),
            preparation_seconds: question.preparation_seconds.to_string(),
            response_seconds: question.response_seconds.to_string(),
        }
    }

    pub fn build(&self) -> AppResult<SpeakingQuestion> {
        let prompt = self.prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::Validation("Speaking prompt is required".into()));
        }
        let image_url = self.image_url.trim();
        Ok(SpeakingQuestion {
            id: self.id.clone().unwrap_or_default(),
            prompt: prompt.to_string(),
            kind: self.kind,
            image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
            preparation_seconds: optional_u32(&self.preparation_seconds)?.unwrap_or(35),
            response_seconds: optional_u32(&self.response_seconds)?.unwrap_or(40),
        })
    }
}

/// Text field bound to one `String` of a draft held in a signal.
#[component]
fn DraftField(
    label: String,
    value: String,
    #[props(default)] multiline: bool,
    #[props(default)] hint: String,
    on_input: EventHandler<String>,
) -> Element {
    rsx! {
        div { class: "form-group",
            label { class: "form-label", "{label}" }
            if multiline {
                textarea {
                    class: "input min-h-[90px]",
                    value: "{value}",
                    oninput: move |e| on_input.call(e.value())
                }
            } else {
                input {
                    class: "input",
                    value: "{value}",
                    oninput: move |e| on_input.call(e.value())
                }
            }
            if !hint.is_empty() {
                p { class: "text-xs text-[var(--text-muted)] mt-1", "{hint}" }
            }
        }
    }
}

#[component]
pub fn AdminQuestionsComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut draft = use_signal(|| None::<QuestionDraft>);
    let mut error = use_signal(|| None::<String>);

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchQuestions);
        let _ = cmd_tx_effect.send(AppCmd::FetchSpeakingQuestions);
    });

    let questions = app_state.questions.read().clone();
    let text_label = match draft.read().as_ref().map(|d| d.kind.as_str()) {
        Some("essay") => "Topic",
        _ => "Passage",
    };

    let cmd_tx_save = cmd_tx.clone();
    let save = move |_| {
        let Some(current) = draft() else { return };
        match current.build() {
            Ok(question) => {
                save_record(&cmd_tx_save, Resource::Questions, current.id.clone(), &question);
                draft.set(None);
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let mut set = move |f: fn(&mut QuestionDraft, String), value: String| {
        draft.with_mut(|d| {
            if let Some(d) = d {
                f(d, value)
            }
        })
    };

    rsx! {
        div { class: "page-header",
            div { class: "flex justify-between items-center",
                h1 { class: "page-title", "Questions" }
                button {
                    class: "btn btn-primary",
                    onclick: move |_| {
                        draft.set(Some(QuestionDraft::default()));
                        error.set(None);
                    },
                    "+ New question"
                }
            }
        }

        if let Some(current) = draft() {
            div { class: "panel mb-6",
                div { class: "panel-header",
                    h2 { class: "panel-title", if current.id.is_some() { "Edit question" } else { "New question" } }
                }
                div { class: "grid md:grid-cols-[200px_1fr_120px] gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Type" }
                        select {
                            class: "input",
                            disabled: current.id.is_some(),
                            onchange: move |e| set(|d, v| d.kind = v, e.value()),
                            for kind in QUESTION_TYPES {
                                option { key: "{kind}", value: "{kind}", selected: current.kind == kind, "{kind}" }
                            }
                        }
                    }
                    DraftField {
                        label: "Prompt",
                        value: current.prompt.clone(),
                        on_input: move |v| set(|d, v| d.prompt = v, v)
                    }
                    DraftField {
                        label: "Marks",
                        value: current.marks.clone(),
                        on_input: move |v| set(|d, v| d.marks = v, v)
                    }
                }

                {match current.kind.as_str() {
                    "multiple-choice" => rsx! {
                        div { class: "grid md:grid-cols-2 gap-4",
                            DraftField {
                                label: "Options",
                                value: current.options.clone(),
                                multiline: true,
                                hint: "One per line",
                                on_input: move |v| set(|d, v| d.options = v, v)
                            }
                            DraftField {
                                label: "Correct answers",
                                value: current.answers.clone(),
                                multiline: true,
                                hint: "Copy the correct options, one per line",
                                on_input: move |v| set(|d, v| d.answers = v, v)
                            }
                        }
                    },
                    "fill-in-blanks" => rsx! {
                        DraftField {
                            label: "Text",
                            value: current.text.clone(),
                            multiline: true,
                            hint: "Write [blank] where each gap goes",
                            on_input: move |v| set(|d, v| d.text = v, v)
                        }
                        div { class: "grid md:grid-cols-2 gap-4",
                            DraftField {
                                label: "Answers",
                                value: current.answers.clone(),
                                multiline: true,
                                hint: "One per blank, in order",
                                on_input: move |v| set(|d, v| d.answers = v, v)
                            }
                            DraftField {
                                label: "Word bank",
                                value: current.word_bank.clone(),
                                hint: "Optional, comma separated",
                                on_input: move |v| set(|d, v| d.word_bank = v, v)
                            }
                        }
                    },
                    _ => rsx! {
                        DraftField {
                            label: text_label,
                            value: current.text.clone(),
                            multiline: true,
                            on_input: move |v| set(|d, v| d.text = v, v)
                        }
                        div { class: "grid grid-cols-2 gap-4",
                            DraftField {
                                label: "Minimum words",
                                value: current.min_words.clone(),
                                on_input: move |v| set(|d, v| d.min_words = v, v)
                            }
                            DraftField {
                                label: "Maximum words",
                                value: current.max_words.clone(),
                                on_input: move |v| set(|d, v| d.max_words = v, v)
                            }
                        }
                    },
                }}

                if let Some(message) = error() {
                    p { class: "text-sm text-[var(--danger)] mb-3", "{message}" }
                }
                div { class: "flex gap-2",
                    button { class: "btn btn-primary", onclick: save, "Save" }
                    button { class: "btn btn-secondary", onclick: move |_| draft.set(None), "Cancel" }
                }
            }
        }

        if questions.is_empty() {
            EmptyState { icon: "❓", message: "No questions yet." }
        } else {
            div { class: "panel overflow-x-auto mb-8",
                table { class: "table",
                    thead {
                        tr {
                            th { "Prompt" }
                            th { "Type" }
                            th { "Marks" }
                            th {}
                        }
                    }
                    tbody {
                        for question in questions {
                            {
                                let cmd_tx = cmd_tx.clone();
                                let editing = QuestionDraft::from_question(&question);
                                let question_id = question.id.clone();
                                let marks = question.marks.map(format_score).unwrap_or_else(|| {
                                    if question.body.is_objective() { "raw".to_string() } else { format_score(DEFAULT_SUBJECTIVE_MARKS) }
                                });
                                rsx! {
                                    tr { key: "{question.id}",
                                        td { class: "max-w-md truncate", "{question.prompt}" }
                                        td { span { class: "badge", "{question.body.label()}" } }
                                        td { "{marks}" }
                                        td { class: "flex gap-2 justify-end",
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| {
                                                    draft.set(Some(editing.clone()));
                                                    error.set(None);
                                                },
                                                "Edit"
                                            }
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| delete_record(&cmd_tx, Resource::Questions, question_id.clone()),
                                                "Delete"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        SpeakingPrompts {}
    }
}

#[component]
fn SpeakingPrompts() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut draft = use_signal(|| None::<SpeakingDraft>);
    let mut error = use_signal(|| None::<String>);

    let prompts = app_state.speaking_questions.read().clone();

    let cmd_tx_save = cmd_tx.clone();
    let save = move |_| {
        let Some(current) = draft() else { return };
        match current.build() {
            Ok(question) => {
                save_record(&cmd_tx_save, Resource::SpeakingQuestions, current.id.clone(), &question);
                draft.set(None);
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let mut set = move |f: fn(&mut SpeakingDraft, String), value: String| {
        draft.with_mut(|d| {
            if let Some(d) = d {
                f(d, value)
            }
        })
    };

    rsx! {
        div { class: "flex justify-between items-center mb-4",
            h2 { class: "text-xl font-bold", "Speaking prompts" }
            button {
                class: "btn btn-secondary",
                onclick: move |_| {
                    draft.set(Some(SpeakingDraft {
                        preparation_seconds: "35".into(),
                        response_seconds: "40".into(),
                        ..Default::default()
                    }));
                    error.set(None);
                },
                "+ New prompt"
            }
        }

        if let Some(current) = draft() {
            div { class: "panel mb-6",
                div { class: "grid md:grid-cols-[220px_1fr] gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Task" }
                        select {
                            class: "input",
                            onchange: move |e| {
                                let label = e.value();
                                if let Some(kind) = SPEAKING_KINDS.iter().find(|k| k.label() == label) {
                                    let kind = *kind;
                                    draft.with_mut(|d| if let Some(d) = d { d.kind = kind });
                                }
                            },
                            for kind in SPEAKING_KINDS {
                                option {
                                    key: "{kind.label()}",
                                    value: "{kind.label()}",
                                    selected: current.kind == kind,
                                    "{kind.label()}"
                                }
                            }
                        }
                    }
                    DraftField {
                        label: "Prompt",
                        value: current.prompt.clone(),
                        multiline: true,
                        on_input: move |v| set(|d, v| d.prompt = v, v)
                    }
                }
                div { class: "grid md:grid-cols-3 gap-4",
                    DraftField {
                        label: "Image URL",
                        value: current.image_url.clone(),
                        hint: "Describe Image tasks only",
                        on_input: move |v| set(|d, v| d.image_url = v, v)
                    }
                    DraftField {
                        label: "Preparation (s)",
                        value: current.preparation_seconds.clone(),
                        on_input: move |v| set(|d, v| d.preparation_seconds = v, v)
                    }
                    DraftField {
                        label: "Response (s)",
                        value: current.response_seconds.clone(),
                        on_input: move |v| set(|d, v| d.response_seconds = v, v)
                    }
                }
                if let Some(message) = error() {
                    p { class: "text-sm text-[var(--danger)] mb-3", "{message}" }
                }
                div { class: "flex gap-2",
                    button { class: "btn btn-primary", onclick: save, "Save" }
                    button { class: "btn btn-secondary", onclick: move |_| draft.set(None), "Cancel" }
                }
            }
        }

        if prompts.is_empty() {
            EmptyState { icon: "🎙️", message: "No speaking prompts yet." }
        } else {
            div { class: "panel overflow-x-auto",
                table { class: "table",
                    tbody {
                        for prompt in prompts {
                            {
                                let cmd_tx = cmd_tx.clone();
                                let editing = SpeakingDraft::from_question(&prompt);
                                let prompt_id = prompt.id.clone();
                                rsx! {
                                    tr { key: "{prompt.id}",
                                        td { span { class: "badge", "{prompt.kind.label()}" } }
                                        td { class: "max-w-md truncate", "{prompt.prompt}" }
                                        td { class: "flex gap-2 justify-end",
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| {
                                                    draft.set(Some(editing.clone()));
                                                    error.set(None);
                                                },
                                                "Edit"
                                            }
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| delete_record(&cmd_tx, Resource::SpeakingQuestions, prompt_id.clone()),
                                                "Delete"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn AdminReadingComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut draft = use_signal(|| None::<ReadingDraft>);
    let mut error = use_signal(|| None::<String>);

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchReadingMaterials);
    });

    let materials = app_state.reading_materials.read().clone();

    let cmd_tx_save = cmd_tx.clone();
    let save = move |_| {
        let Some(current) = draft() else { return };
        match current.build() {
            Ok(material) => {
                save_record(&cmd_tx_save, Resource::ReadingMaterials, current.id.clone(), &material);
                draft.set(None);
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let mut set = move |f: fn(&mut ReadingDraft, String), value: String| {
        draft.with_mut(|d| {
            if let Some(d) = d {
                f(d, value)
            }
        })
    };

    rsx! {
        div { class: "page-header",
            div { class: "flex justify-between items-center",
                h1 { class: "page-title", "Reading materials" }
                button {
                    class: "btn btn-primary",
                    onclick: move |_| {
                        draft.set(Some(ReadingDraft::default()));
                        error.set(None);
                    },
                    "+ New material"
                }
            }
        }

        if let Some(current) = draft() {
            div { class: "panel mb-6",
                div { class: "grid md:grid-cols-[220px_1fr] gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Type" }
                        select {
                            class: "input",
                            disabled: current.id.is_some(),
                            onchange: move |e| set(|d, v| d.kind = v, e.value()),
                            for kind in READING_TYPES {
                                option { key: "{kind}", value: "{kind}", selected: current.kind == kind, "{kind}" }
                            }
                        }
                    }
                    DraftField {
                        label: "Title",
                        value: current.title.clone(),
                        on_input: move |v| set(|d, v| d.title = v, v)
                    }
                }
                DraftField {
                    label: "Passage",
                    value: current.passage.clone(),
                    multiline: true,
                    hint: "Optional reading text shown above the task",
                    on_input: move |v| set(|d, v| d.passage = v, v)
                }

                {match current.kind.as_str() {
                    "mcq" => rsx! {
                        div { class: "grid md:grid-cols-2 gap-4",
                            DraftField {
                                label: "Options",
                                value: current.options.clone(),
                                multiline: true,
                                hint: "One per line",
                                on_input: move |v| set(|d, v| d.options = v, v)
                            }
                            DraftField {
                                label: "Correct answers",
                                value: current.answers.clone(),
                                multiline: true,
                                on_input: move |v| set(|d, v| d.answers = v, v)
                            }
                        }
                    },
                    "fill-in-blanks" => rsx! {
                        DraftField {
                            label: "Text",
                            value: current.text.clone(),
                            multiline: true,
                            hint: "Write [blank] where each gap goes",
                            on_input: move |v| set(|d, v| d.text = v, v)
                        }
                        div { class: "grid md:grid-cols-2 gap-4",
                            DraftField {
                                label: "Answers",
                                value: current.answers.clone(),
                                multiline: true,
                                hint: "One per blank, in order",
                                on_input: move |v| set(|d, v| d.answers = v, v)
                            }
                            DraftField {
                                label: "Word bank",
                                value: current.word_bank.clone(),
                                hint: "Optional, comma separated",
                                on_input: move |v| set(|d, v| d.word_bank = v, v)
                            }
                        }
                    },
                    "reorder" => rsx! {
                        DraftField {
                            label: "Paragraphs",
                            value: current.items.clone(),
                            multiline: true,
                            hint: "One per line, in the correct order. Learners see them shuffled.",
                            on_input: move |v| set(|d, v| d.items = v, v)
                        }
                    },
                    _ => rsx! {
                        DraftField {
                            label: "Questions",
                            value: current.items.clone(),
                            multiline: true,
                            hint: "question | option; option; option | answer",
                            on_input: move |v| set(|d, v| d.items = v, v)
                        }
                    },
                }}

                if let Some(message) = error() {
                    p { class: "text-sm text-[var(--danger)] mb-3", "{message}" }
                }
                div { class: "flex gap-2",
                    button { class: "btn btn-primary", onclick: save, "Save" }
                    button { class: "btn btn-secondary", onclick: move |_| draft.set(None), "Cancel" }
                }
            }
        }

        if materials.is_empty() {
            EmptyState { icon: "📖", message: "No reading materials yet." }
        } else {
            div { class: "panel overflow-x-auto",
                table { class: "table",
                    thead {
                        tr {
                            th { "Title" }
                            th { "Type" }
                            th {}
                        }
                    }
                    tbody {
                        for material in materials {
                            {
                                let cmd_tx = cmd_tx.clone();
                                let editing = ReadingDraft::from_material(&material);
                                let material_id = material.id.clone();
                                rsx! {
                                    tr { key: "{material.id}",
                                        td { "{material.title}" }
                                        td { span { class: "badge", "{material.body.label()}" } }
                                        td { class: "flex gap-2 justify-end",
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| {
                                                    draft.set(Some(editing.clone()));
                                                    error.set(None);
                                                },
                                                "Edit"
                                            }
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| delete_record(&cmd_tx, Resource::ReadingMaterials, material_id.clone()),
                                                "Delete"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_choice_draft() {
        let mut draft = QuestionDraft {
            prompt: "Pick the synonym of rapid".into(),
            options: "slow\nquick\n".into(),
            answers: "fast".into(),
            ..Default::default()
        };
        assert!(draft.build().is_err(), "answer outside options");

        draft.answers = "quick".into();
        draft.marks = "2".into();
        let question = draft.build().expect("Failed to build question");
        assert_eq!(question.marks, Some(2.0));
        assert_eq!(
            question.body,
            QuestionBody::MultipleChoice {
                options: vec!["slow".into(), "quick".into()],
                correct_answers: vec!["quick".into()],
            }
        );
        assert_eq!(QuestionDraft::from_question(&question).build().expect("Failed to rebuild"), question);
    }

    #[test]
    fn test_repeated_options_collapse() {
        let draft = QuestionDraft {
            prompt: "Pick the fruit".into(),
            options: "apple\nApple \npear\nrock".into(),
            answers: "apple\napple".into(),
            ..Default::default()
        };
        match draft.build().expect("Failed to build question").body {
            QuestionBody::MultipleChoice { options, correct_answers } => {
                assert_eq!(options, vec!["apple".to_string(), "pear".into(), "rock".into()]);
                assert_eq!(correct_answers, vec!["apple".to_string()]);
            }
            other => panic!("Unexpected body {:?}", other),
        }

        let single = QuestionDraft { options: "same\nsame".into(), answers: "same".into(), ..draft };
        assert!(single.build().is_err(), "only one distinct option");
    }

    #[test]
    fn test_written_questions_need_marks() {
        let mut draft = QuestionDraft {
            kind: "summarize-text".into(),
            prompt: "Summarize the passage".into(),
            text: "A long passage about rivers.".into(),
            ..Default::default()
        };
        let err = draft.build().expect_err("summary without marks");
        assert!(err.to_string().contains("Marks are required"));

        draft.marks = "0".into();
        assert!(draft.build().is_err());

        draft.marks = "10".into();
        assert_eq!(draft.build().expect("Failed to build summary").marks, Some(10.0));
    }

    #[test]
    fn test_blank_count_must_match_answers() {
        let mut draft = QuestionDraft {
            kind: "fill-in-blanks".into(),
            prompt: "Complete".into(),
            text: "The [blank] sat on the [blank].".into(),
            answers: "cat".into(),
            ..Default::default()
        };
        let err = draft.build().expect_err("one answer for two blanks");
        assert!(err.to_string().contains("2 blank(s) but 1 answer(s)"));

        draft.answers = "cat\nmat".into();
        draft.word_bank = "cat, mat, dog".into();
        match draft.build().expect("Failed to build blanks").body {
            QuestionBody::FillInBlanks { answers, word_bank, .. } => {
                assert_eq!(answers.len(), 2);
                assert_eq!(word_bank.len(), 3);
            }
            other => panic!("Unexpected body {:?}", other),
        }
    }

    #[test]
    fn test_essay_word_limits() {
        let mut draft = QuestionDraft {
            kind: "essay".into(),
            prompt: "Write an essay".into(),
            text: "Remote work".into(),
            min_words: "300".into(),
            max_words: "200".into(),
            marks: "15".into(),
            ..Default::default()
        };
        assert!(draft.build().is_err());

        draft.max_words = "".into();
        let question = draft.build().expect("Failed to build essay");
        assert_eq!(
            question.body,
            QuestionBody::Essay { topic: "Remote work".into(), min_words: Some(300), max_words: None }
        );
    }

    #[test]
    fn test_reading_drafts() {
        let reorder = ReadingDraft {
            kind: "reorder".into(),
            title: "Order these".into(),
            items: "First\nSecond\nThird".into(),
            ..Default::default()
        };
        let material = reorder.build().expect("Failed to build reorder");
        assert_eq!(material.body.label(), "reorder");

        let comprehension = ReadingDraft {
            kind: "reading-comprehension".into(),
            title: "Bees".into(),
            passage: "Bees make honey.".into(),
            items: "What do bees make? | honey; milk | honey".into(),
            ..Default::default()
        };
        let material = comprehension.build().expect("Failed to build comprehension");
        let draft = ReadingDraft::from_material(&material);
        assert_eq!(draft.items, "What do bees make? | honey; milk | honey");

        let single = ReadingDraft { items: "Only one".into(), ..reorder };
        assert!(single.build().is_err());
    }

    #[test]
    fn test_speaking_draft_defaults() {
        let draft = SpeakingDraft {
            prompt: "Read the text aloud".into(),
            ..Default::default()
        };
        let question = draft.build().expect("Failed to build speaking prompt");
        assert_eq!(question.preparation_seconds, 35);
        assert_eq!(question.response_seconds, 40);
        assert_eq!(question.image_url, None);
    }
}
