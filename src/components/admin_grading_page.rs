use dioxus::prelude::*;

use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{ExamResult, GradingStatus, QuestionResult, ResultStatus, SpeakingResponse};
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{format_score, EmptyState, StatusBadge};
use crate::components::forms::optional_f64;
use crate::components::AppState;

/// Marks are required and capped by the question's maximum when there is one.
pub fn parse_marks(text: &str, max: Option<f64>) -> AppResult<f64> {
    let marks = optional_f64(text)?.ok_or_else(|| AppError::Validation("Enter the marks to award".into()))?;
    match max {
        Some(max) if marks > max => Err(AppError::Validation(format!(
            "Marks cannot exceed {}",
            format_score(max)
        ))),
        _ => Ok(marks),
    }
}

/// Pending items start blank; marked and auto-scored items show their current score.
fn initial_marks(item: &QuestionResult) -> String {
    match item.status {
        GradingStatus::Pending => String::new(),
        GradingStatus::Auto | GradingStatus::Graded => format_score(item.score),
    }
}

fn feedback_value(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GradingTab {
    Results,
    Speaking,
}

#[component]
pub fn AdminGradingComponent() -> Element {
    let cmd_tx = use_context::<CmdTx>();
    let mut tab = use_signal(|| GradingTab::Results);

    use_effect(move || {
        for cmd in [AppCmd::FetchAllResults, AppCmd::FetchSpeakingResponses, AppCmd::FetchSpeakingQuestions, AppCmd::FetchUsers] {
            let _ = cmd_tx.send(cmd);
        }
    });

    rsx! {
        div { class: "page-header",
            h1 { class: "page-title", "Grading" }
            p { class: "text-[var(--text-secondary)] mt-1", "Written answers and speaking recordings waiting for a tutor." }
        }
        div { class: "flex gap-2 mb-6",
            button {
                class: if tab() == GradingTab::Results { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                onclick: move |_| tab.set(GradingTab::Results),
                "Exam results"
            }
            button {
                class: if tab() == GradingTab::Speaking { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                onclick: move |_| tab.set(GradingTab::Speaking),
                "Speaking"
            }
        }
        {match tab() {
            GradingTab::Results => rsx! { ResultQueue {} },
            GradingTab::Speaking => rsx! { SpeakingQueue {} },
        }}
    }
}

#[component]
fn ResultQueue() -> Element {
    let app_state = use_context::<AppState>();
    let mut show_graded = use_signal(|| false);

    let users = app_state.users.read().clone();
    let mut results: Vec<ExamResult> = app_state
        .all_results
        .read()
        .iter()
        .filter(|r| show_graded() || r.status == ResultStatus::PendingReview)
        .cloned()
        .collect();
    results.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));

    rsx! {
        label { class: "flex items-center gap-2 text-sm mb-4 cursor-pointer",
            input {
                r#type: "checkbox",
                checked: show_graded(),
                onchange: move |e| show_graded.set(e.checked())
            }
            "Show graded results too"
        }
        if results.is_empty() {
            EmptyState { icon: "✅", message: "Nothing waiting for review." }
        } else {
            div { class: "space-y-4",
                for result in results {
                    {
                        let student = users
                            .iter()
                            .find(|u| u.id == result.user_id)
                            .map(|u| u.name.clone())
                            .unwrap_or_else(|| result.user_id.clone());
                        rsx! {
                            ReviewCard { key: "{result.id}", result: result, student: student }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn ReviewCard(result: ExamResult, student: String) -> Element {
    let mut expanded = use_signal(|| false);
    let submitted = result.submitted_at.format("%Y-%m-%d %H:%M").to_string();
    let awaiting = result.items.iter().filter(|i| i.status == GradingStatus::Pending).count();

    rsx! {
        div { class: "card",
            div { class: "flex justify-between items-center cursor-pointer", onclick: move |_| expanded.set(!expanded()),
                div {
                    h3 { class: "font-semibold", "{result.exam_title}" }
                    p { class: "text-xs text-[var(--text-muted)]", "{student} · {submitted}" }
                }
                div { class: "flex items-center gap-3",
                    if awaiting > 0 {
                        span { class: "badge badge-warning", "{awaiting} to mark" }
                    }
                    StatusBadge { status: result.status }
                    span { class: "font-bold", "{format_score(result.total_score)} / {format_score(result.max_score)}" }
                }
            }
            if expanded() {
                div { class: "mt-4 space-y-3",
                    if awaiting == 0 {
                        p { class: "text-sm text-[var(--text-muted)]", "Nothing left to mark. Scores below can still be corrected." }
                    }
                    for item in result.items.iter() {
                        ItemGrader { key: "{item.question_id}", result_id: result.id.clone(), item: item.clone() }
                    }
                }
            }
        }
    }
}

#[component]
fn ItemGrader(result_id: String, item: QuestionResult) -> Element {
    let cmd_tx = use_context::<CmdTx>();
    let initial_marks = initial_marks(&item);
    let initial_feedback = item.feedback.clone().unwrap_or_default();
    let mut marks = use_signal(move || initial_marks);
    let mut feedback = use_signal(move || initial_feedback);
    let mut error = use_signal(|| None::<String>);

    let answer = item.answer.as_ref().map(|a| a.summary()).unwrap_or_default();
    let max_score = item.max_score;
    let question_id = item.question_id.clone();
    let submit = move |_| match parse_marks(&marks(), Some(max_score)) {
        Ok(value) => {
            error.set(None);
            if let Err(e) = cmd_tx.send(AppCmd::AssignMarks {
                result_id: result_id.clone(),
                question_id: question_id.clone(),
                marks: value,
                feedback: feedback_value(&feedback()),
            }) {
                tracing::error!("Failed to send AssignMarks command: {:?}", e);
            }
        }
        Err(e) => error.set(Some(e.to_string())),
    };

    rsx! {
        div { class: "p-4 rounded-lg bg-[var(--bg-secondary)]",
            div { class: "flex justify-between mb-2",
                span { class: "badge", "{item.question_type}" }
                {match item.status {
                    GradingStatus::Graded => rsx! { span { class: "badge badge-success", "Marked" } },
                    GradingStatus::Auto => rsx! { span { class: "badge", "Auto-scored" } },
                    GradingStatus::Pending => rsx! { span { class: "badge badge-warning", "To mark" } },
                }}
            }
            p { class: "text-sm font-medium mb-2", "{item.prompt}" }
            if answer.is_empty() {
                p { class: "text-sm italic text-[var(--text-muted)] mb-3", "No answer given." }
            } else {
                div { class: "reading-passage text-sm mb-3 whitespace-pre-wrap", "{answer}" }
            }
            div { class: "grid md:grid-cols-[140px_1fr_auto] gap-3 items-end",
                div { class: "form-group mb-0",
                    label { class: "form-label", "Marks / {format_score(max_score)}" }
                    input { class: "input", inputmode: "decimal", value: "{marks}", oninput: move |e| marks.set(e.value()) }
                }
                div { class: "form-group mb-0",
                    label { class: "form-label", "Feedback" }
                    input { class: "input", value: "{feedback}", oninput: move |e| feedback.set(e.value()) }
                }
                button { class: "btn btn-primary btn-sm", onclick: submit, "Save marks" }
            }
            if let Some(message) = error() {
                p { class: "text-sm text-[var(--danger)] mt-2", "{message}" }
            }
        }
    }
}

#[component]
fn SpeakingQueue() -> Element {
    let app_state = use_context::<AppState>();
    let mut show_graded = use_signal(|| false);

    let prompts = app_state.speaking_questions.read().clone();
    let users = app_state.users.read().clone();
    let mut responses: Vec<SpeakingResponse> = app_state
        .speaking_responses
        .read()
        .iter()
        .filter(|r| show_graded() || r.marks.is_none())
        .cloned()
        .collect();
    responses.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));

    rsx! {
        label { class: "flex items-center gap-2 text-sm mb-4 cursor-pointer",
            input {
                r#type: "checkbox",
                checked: show_graded(),
                onchange: move |e| show_graded.set(e.checked())
            }
            "Show graded recordings too"
        }
        if responses.is_empty() {
            EmptyState { icon: "🎧", message: "No recordings waiting for marks." }
        } else {
            div { class: "space-y-4",
                for response in responses {
                    {
                        let prompt = prompts
                            .iter()
                            .find(|q| q.id == response.question_id)
                            .map(|q| format!("{}: {}", q.kind.label(), q.prompt))
                            .unwrap_or_else(|| response.question_id.clone());
                        let student = users
                            .iter()
                            .find(|u| u.id == response.user_id)
                            .map(|u| u.name.clone())
                            .unwrap_or_else(|| response.user_id.clone());
                        rsx! {
                            SpeakingGrader { key: "{response.id}", response: response, prompt: prompt, student: student }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn SpeakingGrader(response: SpeakingResponse, prompt: String, student: String) -> Element {
    let cmd_tx = use_context::<CmdTx>();
    let initial_marks = response.marks.map(format_score).unwrap_or_default();
    let initial_feedback = response.feedback.clone().unwrap_or_default();
    let mut marks = use_signal(move || initial_marks);
    let mut feedback = use_signal(move || initial_feedback);
    let mut error = use_signal(|| None::<String>);

    let submitted = response.submitted_at.format("%Y-%m-%d %H:%M").to_string();
    let response_id = response.id.clone();
    let submit = move |_| match parse_marks(&marks(), None) {
        Ok(value) => {
            error.set(None);
            if let Err(e) = cmd_tx.send(AppCmd::GradeSpeaking {
                response_id: response_id.clone(),
                marks: value,
                feedback: feedback_value(&feedback()),
            }) {
                tracing::error!("Failed to send GradeSpeaking command: {:?}", e);
            }
        }
        Err(e) => error.set(Some(e.to_string())),
    };

    rsx! {
        div { class: "card",
            div { class: "flex justify-between items-start mb-2",
                div {
                    p { class: "font-medium", "{prompt}" }
                    p { class: "text-xs text-[var(--text-muted)]", "{student} · {submitted}" }
                }
                if response.marks.is_some() {
                    span { class: "badge badge-success", "Marked" }
                }
            }
            audio { class: "w-full my-3", controls: true, src: "{response.data_url()}" }
            div { class: "grid md:grid-cols-[140px_1fr_auto] gap-3 items-end",
                div { class: "form-group mb-0",
                    label { class: "form-label", "Marks" }
                    input { class: "input", inputmode: "decimal", value: "{marks}", oninput: move |e| marks.set(e.value()) }
                }
                div { class: "form-group mb-0",
                    label { class: "form-label", "Feedback" }
                    input { class: "input", value: "{feedback}", oninput: move |e| feedback.set(e.value()) }
                }
                button { class: "btn btn-primary btn-sm", onclick: submit, "Save marks" }
            }
            if let Some(message) = error() {
                p { class: "text-sm text-[var(--danger)] mt-2", "{message}" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_marks() {
        assert_eq!(parse_marks("7.5", Some(10.0)).expect("Failed to parse marks"), 7.5);
        assert_eq!(parse_marks(" 0 ", None).expect("Failed to parse zero"), 0.0);
        assert!(parse_marks("", Some(10.0)).is_err());
        assert!(parse_marks("11", Some(10.0)).is_err());
        assert!(parse_marks("-1", None).is_err());
        assert!(parse_marks("abc", None).is_err());
    }

    #[test]
    fn test_auto_scored_items_are_editable() {
        let mut item = QuestionResult {
            question_id: "q1".into(),
            question_type: "multiple-choice".into(),
            prompt: "Pick one".into(),
            answer: None,
            is_correct: Some(false),
            score: 0.5,
            max_score: 1.0,
            status: GradingStatus::Auto,
            feedback: None,
        };
        assert_eq!(initial_marks(&item), format_score(0.5));

        item.status = GradingStatus::Pending;
        assert_eq!(initial_marks(&item), "");
    }

    #[test]
    fn test_feedback_value() {
        assert_eq!(feedback_value("  "), None);
        assert_eq!(feedback_value(" Good structure "), Some("Good structure".to_string()));
    }
}
