use dioxus::prelude::*;

use crate::backend::models::{blank_segments, Answer, Exam, ExamResult, GradingStatus, Question, QuestionBody};
use crate::backend::session::{format_clock, ExamSession};
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{format_score, percent, EmptyState, RequireLogin, StatusBadge};
use crate::components::forms::word_count;
use crate::components::AppState;
use crate::Route;

fn send(cmd_tx: &CmdTx, cmd: AppCmd) {
    if let Err(e) = cmd_tx.send(cmd) {
        tracing::error!("Failed to send exam command: {:?}", e);
    }
}

#[component]
pub fn GiveExamComponent() -> Element {
    rsx! {
        RequireLogin { GiveExam {} }
    }
}

#[component]
fn GiveExam() -> Element {
    let app_state = use_context::<AppState>();

    let session = app_state.session.read().clone();
    let last_result = app_state.last_result.read().clone();
    let current_exam = app_state.current_exam.read().clone();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            if let Some(session) = session {
                ExamRunner { session: session }
            } else if let Some(result) = last_result {
                ResultSummary { result: result }
            } else if let Some(exam) = current_exam {
                ExamIntro { exam: exam }
            } else {
                EmptyState { icon: "🗒️", message: "No exam selected." }
                div { class: "text-center",
                    Link { to: Route::ExamListComponent {}, class: "btn btn-primary", "Choose an exam" }
                }
            }
        }
    }
}

#[component]
fn ExamIntro(exam: Exam) -> Element {
    let cmd_tx = use_context::<CmdTx>();
    let cmd_tx_abandon = cmd_tx.clone();

    rsx! {
        div { class: "panel max-w-2xl mx-auto",
            h1 { class: "page-title mb-2", "{exam.title}" }
            if !exam.description.is_empty() {
                p { class: "text-[var(--text-secondary)] mb-4", "{exam.description}" }
            }
            table { class: "table mb-6",
                thead {
                    tr {
                        th { "Section" }
                        th { "Questions" }
                        th { "Time" }
                    }
                }
                tbody {
                    for (idx, section) in exam.sections.iter().enumerate() {
                        tr { key: "{idx}",
                            td { "{section.name}" }
                            td { "{section.question_ids.len().max(section.questions.len())}" }
                            td { "{section.duration_minutes} min" }
                        }
                    }
                }
            }
            ul { class: "text-sm text-[var(--text-secondary)] list-disc pl-5 mb-6 space-y-1",
                li { "Each section has its own countdown. When it reaches zero you move to the next section." }
                li { "You cannot go back to a finished section." }
                li { "Your progress is saved, so a page reload will not lose your answers." }
            }
            div { class: "flex justify-between",
                button {
                    class: "btn btn-secondary",
                    onclick: move |_| {
                        send(&cmd_tx_abandon, AppCmd::AbandonExam);
                        navigator().push(Route::ExamListComponent {});
                    },
                    "Back"
                }
                button { class: "btn btn-primary", onclick: move |_| send(&cmd_tx, AppCmd::StartExam), "Start exam" }
            }
        }
    }
}

#[component]
fn ExamRunner(session: ExamSession) -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut confirm_finish = use_signal(|| false);

    let section = session.current_section().clone();
    let section_count = session.exam.sections.len();
    let section_number = session.section_index + 1;
    let question_index = session.question_index;
    let question_count = section.questions.len();
    let answered = session.answered_in_section();
    let is_last_section = session.is_last_section();
    let is_first_question = question_index == 0;
    let is_last_question = question_index + 1 >= question_count;

    let remaining = *app_state.remaining_seconds.read();
    let clock = format_clock(chrono::Duration::seconds(remaining));
    let clock_class = if remaining <= 60 { "exam-clock exam-clock-low" } else { "exam-clock" };

    let question = session.current_question().cloned();
    let answer = question.as_ref().and_then(|q| session.answer_for(&q.id).cloned());

    let cmd_prev = cmd_tx.clone();
    let cmd_next = cmd_tx.clone();
    let cmd_finish = cmd_tx.clone();

    rsx! {
        div { class: "grid lg:grid-cols-[1fr_260px] gap-6",
            div { class: "panel",
                div { class: "flex justify-between items-start mb-4",
                    div {
                        h2 { class: "text-xl font-bold", "{session.exam.title}" }
                        p { class: "text-sm text-[var(--text-secondary)]",
                            "Section {section_number} of {section_count}: {section.name} · Question {question_index + 1} of {question_count}"
                        }
                    }
                    div { class: clock_class, "⏱ {clock}" }
                }

                // Progress bar
                div { class: "w-full bg-[var(--bg-secondary)] rounded-full h-2 mb-6",
                    div {
                        class: "bg-[var(--primary)] h-2 rounded-full transition-all",
                        style: "width: {percent(answered as f64, question_count as f64)}%"
                    }
                }

                if let Some(question) = question {
                    QuestionView { key: "{question.id}", question: question, answer: answer }
                }

                div { class: "flex justify-between gap-4 mt-8",
                    button {
                        class: "btn btn-secondary",
                        disabled: is_first_question,
                        onclick: move |_| send(&cmd_prev, AppCmd::PreviousQuestion),
                        "← Previous"
                    }
                    if is_last_question {
                        button {
                            class: "btn btn-primary",
                            onclick: move |_| confirm_finish.set(true),
                            if is_last_section { "Submit exam" } else { "Finish section" }
                        }
                    } else {
                        button {
                            class: "btn btn-primary",
                            onclick: move |_| send(&cmd_next, AppCmd::NextQuestion),
                            "Next →"
                        }
                    }
                }
            }

            // Question palette
            div { class: "panel h-fit",
                h3 { class: "font-semibold mb-3", "{section.name}" }
                p { class: "text-sm text-[var(--text-secondary)] mb-3", "{answered} of {question_count} answered" }
                div { class: "grid grid-cols-5 gap-2",
                    for (idx, q) in section.questions.iter().enumerate() {
                        {
                            let done = session.answer_for(&q.id).is_some_and(|a| !a.is_empty());
                            let class = match (idx == question_index, done) {
                                (true, _) => "palette-item palette-current",
                                (false, true) => "palette-item palette-done",
                                (false, false) => "palette-item",
                            };
                            let cmd_tx = cmd_tx.clone();
                            rsx! {
                                button {
                                    key: "{q.id}",
                                    class: class,
                                    onclick: move |_| send(&cmd_tx, AppCmd::GoToQuestion(idx)),
                                    "{idx + 1}"
                                }
                            }
                        }
                    }
                }
            }
        }

        if confirm_finish() {
            div { class: "fixed inset-0 bg-black/60 flex items-center justify-center z-50 animate-fade-in",
                div { class: "panel max-w-md w-full mx-4 text-center",
                    h2 { class: "text-xl font-bold mb-2",
                        if is_last_section { "Submit your exam?" } else { "Finish {section.name}?" }
                    }
                    p { class: "text-[var(--text-secondary)] mb-2", "You answered {answered} of {question_count} questions in this section." }
                    p { class: "text-sm text-[var(--text-muted)] mb-6", "You will not be able to come back to this section." }
                    div { class: "flex gap-2",
                        button { class: "btn btn-secondary flex-1", onclick: move |_| confirm_finish.set(false), "Keep working" }
                        button {
                            class: "btn btn-primary flex-1",
                            onclick: move |_| {
                                confirm_finish.set(false);
                                send(&cmd_finish, AppCmd::FinishSection);
                            },
                            "Confirm"
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn QuestionView(question: Question, answer: Option<Answer>) -> Element {
    let cmd_tx = use_context::<CmdTx>();
    let question_id = question.id.clone();
    let record = move |answer: Answer| {
        send(&cmd_tx, AppCmd::AnswerQuestion { question_id: question_id.clone(), answer });
    };

    let marks_note = question.marks.map(|m| format!("{} marks", format_score(m)));

    rsx! {
        div {
            div { class: "flex items-center gap-2 mb-3",
                span { class: "badge", "{question.body.label()}" }
                if let Some(note) = marks_note {
                    span { class: "text-xs text-[var(--text-muted)]", "{note}" }
                }
            }
            h3 { class: "text-lg font-semibold mb-4", "{question.prompt}" }

            match question.body.clone() {
                QuestionBody::MultipleChoice { options, correct_answers } => rsx! {
                    ChoiceInput {
                        options: options,
                        multiple: correct_answers.len() > 1,
                        chosen: match answer { Some(Answer::Choices(v)) => v, _ => vec![] },
                        on_change: move |v| record(Answer::Choices(v)),
                    }
                },
                QuestionBody::FillInBlanks { text, word_bank, .. } => rsx! {
                    BlanksInput {
                        text: text,
                        word_bank: word_bank,
                        given: match answer { Some(Answer::Blanks(v)) => v, _ => vec![] },
                        on_change: move |v| record(Answer::Blanks(v)),
                    }
                },
                QuestionBody::SummarizeText { passage, min_words, max_words } => rsx! {
                    div { class: "reading-passage mb-4", "{passage}" }
                    TextInput {
                        initial: match answer { Some(Answer::Text(t)) => t, _ => String::new() },
                        min_words: min_words,
                        max_words: max_words,
                        on_change: move |t| record(Answer::Text(t)),
                    }
                },
                QuestionBody::Essay { topic, min_words, max_words } => rsx! {
                    div { class: "reading-passage mb-4", "{topic}" }
                    TextInput {
                        initial: match answer { Some(Answer::Text(t)) => t, _ => String::new() },
                        min_words: min_words,
                        max_words: max_words,
                        on_change: move |t| record(Answer::Text(t)),
                    }
                },
            }
        }
    }
}

#[component]
fn ChoiceInput(options: Vec<String>, multiple: bool, chosen: Vec<String>, on_change: EventHandler<Vec<String>>) -> Element {
    rsx! {
        p { class: "text-sm text-[var(--text-secondary)] mb-3",
            if multiple { "Select all that apply." } else { "Select one answer." }
        }
        div { class: "space-y-3",
            for option in options {
                {
                    let is_selected = chosen.contains(&option);
                    let current = chosen.clone();
                    let value = option.clone();
                    rsx! {
                        button {
                            key: "{option}",
                            class: if is_selected { "option option-selected" } else { "option" },
                            onclick: move |_| {
                                let next = if !multiple {
                                    vec![value.clone()]
                                } else if is_selected {
                                    current.iter().filter(|c| **c != value).cloned().collect()
                                } else {
                                    let mut v = current.clone();
                                    v.push(value.clone());
                                    v
                                };
                                on_change.call(next);
                            },
                            div { class: "flex items-center gap-3",
                                div { class: if multiple { "checkmark checkmark-square" } else { "checkmark" },
                                    if is_selected { "✓" }
                                }
                                span { "{option}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn BlanksInput(text: String, word_bank: Vec<String>, given: Vec<String>, on_change: EventHandler<Vec<String>>) -> Element {
    let segments: Vec<String> = blank_segments(&text).into_iter().map(str::to_string).collect();
    let gap_count = segments.len().saturating_sub(1);

    let mut filled = given.clone();
    filled.resize(gap_count, String::new());

    rsx! {
        div { class: "reading-passage leading-loose",
            for (idx, segment) in segments.into_iter().enumerate() {
                {
                    let value = filled.get(idx).cloned().unwrap_or_default();
                    let current = filled.clone();
                    let bank = word_bank.clone();
                    rsx! {
                        span { key: "{idx}",
                            "{segment}"
                            if idx < gap_count {
                                if bank.is_empty() {
                                    input {
                                        class: "input blank-input",
                                        value: "{value}",
                                        oninput: move |e| {
                                            let mut next = current.clone();
                                            next[idx] = e.value();
                                            on_change.call(next);
                                        }
                                    }
                                } else {
                                    select {
                                        class: "input blank-input",
                                        value: "{value}",
                                        onchange: move |e| {
                                            let mut next = current.clone();
                                            next[idx] = e.value();
                                            on_change.call(next);
                                        },
                                        option { value: "", "—" }
                                        for word in bank.iter() {
                                            option { key: "{word}", value: "{word}", selected: *word == value, "{word}" }
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
fn TextInput(initial: String, min_words: Option<u32>, max_words: Option<u32>, on_change: EventHandler<String>) -> Element {
    let mut draft = use_signal(|| initial.clone());
    let words = word_count(&draft());

    let limits = match (min_words, max_words) {
        (Some(min), Some(max)) => format!("{}–{} words", min, max),
        (Some(min), None) => format!("at least {} words", min),
        (None, Some(max)) => format!("at most {} words", max),
        (None, None) => String::new(),
    };
    let out_of_range = min_words.is_some_and(|m| words < m as usize) || max_words.is_some_and(|m| words > m as usize);

    rsx! {
        textarea {
            class: "input w-full",
            style: "min-height: 220px;",
            placeholder: "Type your response here...",
            value: "{draft}",
            oninput: move |e| {
                draft.set(e.value());
                on_change.call(e.value());
            }
        }
        div { class: "flex justify-between text-sm mt-2",
            span { class: if out_of_range && words > 0 { "text-[var(--warning)]" } else { "text-[var(--text-muted)]" },
                "{words} words"
            }
            span { class: "text-[var(--text-muted)]", "{limits}" }
        }
    }
}

#[component]
fn ResultSummary(result: ExamResult) -> Element {
    let pending = result.items.iter().filter(|i| i.status == GradingStatus::Pending).count();
    let score_pct = percent(result.auto_score, result.max_score);

    rsx! {
        div { class: "panel max-w-xl mx-auto text-center",
            div { class: "text-6xl mb-4", if pending == 0 { "🎉" } else { "📬" } }
            h2 { class: "text-2xl font-bold mb-2", "Exam submitted" }
            p { class: "text-[var(--text-secondary)] mb-6", "{result.exam_title}" }

            div { class: "mb-6 p-6 rounded-xl bg-[var(--bg-secondary)]",
                div { class: "text-4xl font-bold mb-2",
                    "{format_score(result.auto_score)} / {format_score(result.max_score)}"
                }
                div { class: "text-sm text-[var(--text-secondary)]", "Automatic score ({score_pct}%)" }
            }

            div { class: "mb-6", StatusBadge { status: result.status } }
            if pending > 0 {
                p { class: "text-sm text-[var(--text-secondary)] mb-6",
                    "{pending} written answer(s) will be marked by a tutor. Your final score will appear under Results."
                }
            }

            div { class: "flex gap-2",
                Link { to: Route::ExamListComponent {}, class: "btn btn-secondary flex-1", "More exams" }
                Link { to: Route::ResultsComponent {}, class: "btn btn-primary flex-1", "View results" }
            }
        }
    }
}
