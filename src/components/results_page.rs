use dioxus::prelude::*;

use crate::backend::models::{ExamResult, GradingStatus};
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{format_score, percent, EmptyState, RequireLogin, StatusBadge};
use crate::components::AppState;

#[component]
pub fn ResultsComponent() -> Element {
    rsx! {
        RequireLogin { Results {} }
    }
}

#[component]
fn Results() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchMyResults);
    });

    let cmd_refresh = cmd_tx.clone();

    let pending_uploads = *app_state.pending_uploads.read();
    let mut results = app_state.my_results.read().clone();
    results.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                div { class: "flex justify-between items-center",
                    div {
                        h1 { class: "page-title", "📊 My Results" }
                        p { class: "text-[var(--text-secondary)] mt-1", "Objective questions are marked instantly; written answers after tutor review." }
                    }
                    button {
                        class: "btn btn-secondary",
                        onclick: move |_| {
                            let _ = cmd_refresh.send(AppCmd::FetchMyResults);
                        },
                        "Refresh"
                    }
                }
            }

            if pending_uploads > 0 {
                div { class: "panel mb-6 border-[var(--warning)] flex justify-between items-center",
                    p { "{pending_uploads} result(s) are saved on this device and not yet uploaded." }
                    button {
                        class: "btn btn-primary btn-sm",
                        onclick: move |_| {
                            let _ = cmd_tx.send(AppCmd::UploadPendingResults);
                        },
                        "Retry upload"
                    }
                }
            }

            if results.is_empty() {
                EmptyState { icon: "📭", message: "You have not submitted any exams yet." }
            } else {
                div { class: "space-y-4",
                    for result in results {
                        ResultCard { key: "{result.id}{result.submitted_at}", result: result }
                    }
                }
            }
        }
    }
}

#[component]
fn ResultCard(result: ExamResult) -> Element {
    let mut expanded = use_signal(|| false);
    let submitted = result.submitted_at.format("%Y-%m-%d %H:%M").to_string();
    let score_pct = percent(result.total_score, result.max_score);

    rsx! {
        div { class: "card",
            div { class: "flex justify-between items-center cursor-pointer", onclick: move |_| expanded.set(!expanded()),
                div {
                    h3 { class: "font-semibold", "{result.exam_title}" }
                    p { class: "text-xs text-[var(--text-muted)]", "Submitted {submitted}" }
                }
                div { class: "flex items-center gap-3",
                    StatusBadge { status: result.status }
                    span { class: "font-bold", "{format_score(result.total_score)} / {format_score(result.max_score)} ({score_pct}%)" }
                }
            }

            if expanded() {
                table { class: "table mt-4",
                    thead {
                        tr {
                            th { "#" }
                            th { "Question" }
                            th { "Your answer" }
                            th { "Score" }
                            th { "Feedback" }
                        }
                    }
                    tbody {
                        for (idx, item) in result.items.iter().enumerate() {
                            {
                                let given = item.answer.as_ref().map(|a| a.summary()).unwrap_or_else(|| "—".to_string());
                                let feedback = item.feedback.clone().unwrap_or_default();
                                rsx! {
                                    tr { key: "{item.question_id}",
                                        td { "{idx + 1}" }
                                        td {
                                            div { class: "text-sm", "{item.prompt}" }
                                            span { class: "text-xs text-[var(--text-muted)]", "{item.question_type}" }
                                        }
                                        td { class: "text-sm max-w-xs truncate", "{given}" }
                                        td {
                                            if item.status == GradingStatus::Pending {
                                                span { class: "badge badge-warning", "Awaiting review" }
                                            } else {
                                                "{format_score(item.score)} / {format_score(item.max_score)}"
                                            }
                                        }
                                        td { class: "text-sm", "{feedback}" }
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
