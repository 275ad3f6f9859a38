use base64::{engine::general_purpose, Engine as _};
use dioxus::prelude::*;

use crate::backend::models::SpeakingQuestion;
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{EmptyState, RequireLogin};
use crate::components::AppState;

#[component]
pub fn SpeakingComponent() -> Element {
    rsx! {
        RequireLogin { SpeakingTest {} }
    }
}

#[component]
fn SpeakingTest() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    use_effect(move || {
        let _ = cmd_tx.send(AppCmd::FetchSpeakingQuestions);
    });

    let questions = app_state.speaking_questions.read().clone();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "🎙️ Speaking Test" }
                p { class: "text-[var(--text-secondary)] mt-1",
                    "Prepare within the suggested time, record your answer, then upload it for grading."
                }
            }

            if questions.is_empty() {
                EmptyState { icon: "🎧", message: "No speaking tasks available yet." }
            } else {
                div { class: "space-y-4",
                    for (idx, question) in questions.into_iter().enumerate() {
                        SpeakingCard { key: "{question.id}", number: idx + 1, question: question }
                    }
                }
            }
        }
    }
}

#[component]
fn SpeakingCard(number: usize, question: SpeakingQuestion) -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    let submitted = app_state.submitted_speaking.read().contains(&question.id);

    let question_id = question.id.clone();
    let upload_recording = move |evt: Event<FormData>| {
        let cmd_tx = cmd_tx.clone();
        let question_id = question_id.clone();
        let files: Vec<_> = evt.files().into_iter().collect();
        spawn(async move {
            let Some(file_data) = files.into_iter().next() else {
                return;
            };
            let mime_type = file_data.content_type().unwrap_or_else(|| "audio/webm".to_string());
            match file_data.read_bytes().await {
                Ok(bytes) => {
                    let data = general_purpose::STANDARD.encode(&bytes);
                    if let Err(e) = cmd_tx.send(AppCmd::SubmitSpeakingResponse { question_id, mime_type, data }) {
                        tracing::error!("Failed to send SubmitSpeakingResponse command: {:?}", e);
                    }
                }
                Err(e) => tracing::error!("Failed to read recording {}: {:?}", file_data.name(), e),
            }
        });
    };

    rsx! {
        div { class: "card",
            div { class: "flex justify-between items-start mb-2",
                div {
                    span { class: "badge mb-2", "{question.kind.label()}" }
                    h3 { class: "font-semibold", "{number}. {question.prompt}" }
                }
                div { class: "text-right text-xs text-[var(--text-muted)]",
                    div { "Prepare: {question.preparation_seconds}s" }
                    div { "Speak: {question.response_seconds}s" }
                }
            }

            if let Some(url) = question.image_url.as_ref() {
                img { class: "rounded-lg max-h-64 my-3", src: "{url}" }
            }

            if submitted {
                p { class: "text-sm text-[var(--success)] mt-3", "✓ Recording submitted for grading" }
            } else {
                label { class: "btn btn-secondary btn-sm mt-3 cursor-pointer",
                    "🎤 Record or choose audio"
                    input {
                        r#type: "file",
                        accept: "audio/*",
                        "capture": "user",
                        class: "hidden",
                        onchange: upload_recording
                    }
                }
            }
        }
    }
}
