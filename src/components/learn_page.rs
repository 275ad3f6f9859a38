use dioxus::prelude::*;
use rand::seq::SliceRandom;

use crate::backend::models::{blank_segments, Answer, ReadingBody, ReadingMaterial};
use crate::backend::scoring::{check_reading, is_correct_choice, PracticeOutcome};
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{format_score, EmptyState, RequireLogin};
use crate::components::AppState;

const FILTERS: [(&str, &str); 5] = [
    ("all", "All"),
    ("mcq", "Multiple choice"),
    ("fill-in-blanks", "Fill in blanks"),
    ("reorder", "Reorder"),
    ("reading-comprehension", "Comprehension"),
];

#[component]
pub fn LearnComponent() -> Element {
    rsx! {
        RequireLogin { LearnPage {} }
    }
}

#[component]
fn LearnPage() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    let mut filter = use_signal(|| "all".to_string());
    let mut selected = use_signal(|| None::<ReadingMaterial>);

    use_effect(move || {
        let _ = cmd_tx.send(AppCmd::FetchReadingMaterials);
    });

    if let Some(material) = selected() {
        return rsx! {
            div { class: "page-container py-8 animate-fade-in",
                button { class: "btn btn-secondary btn-sm mb-4", onclick: move |_| selected.set(None), "← All materials" }
                PracticeView { key: "{material.id}", material: material }
            }
        };
    }

    let materials: Vec<ReadingMaterial> = app_state
        .reading_materials
        .read()
        .iter()
        .filter(|m| filter() == "all" || m.body.label() == filter())
        .cloned()
        .collect();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "📖 Reading Practice" }
                p { class: "text-[var(--text-secondary)] mt-1", "Pick a task and check your answers instantly" }
            }

            div { class: "flex flex-wrap gap-2 mb-6",
                for (value, label) in FILTERS {
                    button {
                        key: "{value}",
                        class: if filter() == value { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                        onclick: move |_| filter.set(value.to_string()),
                        "{label}"
                    }
                }
            }

            if materials.is_empty() {
                EmptyState { icon: "📚", message: "No reading materials yet." }
            } else {
                div { class: "grid md:grid-cols-2 gap-4",
                    for material in materials {
                        {
                            let open = material.clone();
                            rsx! {
                                div {
                                    key: "{material.id}",
                                    class: "card cursor-pointer hover:border-[var(--primary)] transition-all",
                                    onclick: move |_| selected.set(Some(open.clone())),
                                    span { class: "badge mb-2", "{material.body.label()}" }
                                    h3 { class: "font-semibold", "{material.title}" }
                                    p { class: "text-sm text-[var(--text-secondary)] line-clamp-2 mt-1", "{material.passage}" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn shuffled_order(len: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if len > 1 {
        let sorted = order.clone();
        // A pre-solved puzzle teaches nothing.
        while order == sorted {
            order.shuffle(&mut rand::thread_rng());
        }
    }
    order
}

fn empty_answer(body: &ReadingBody) -> Answer {
    match body {
        ReadingBody::Mcq { .. } => Answer::Choices(vec![]),
        ReadingBody::FillInBlanks { answers, .. } => Answer::Blanks(vec![String::new(); answers.len()]),
        ReadingBody::Reorder { paragraphs } => Answer::Order(shuffled_order(paragraphs.len())),
        ReadingBody::ReadingComprehension { items } => Answer::Choices(vec![String::new(); items.len()]),
    }
}

#[component]
fn PracticeView(material: ReadingMaterial) -> Element {
    let body = material.body.clone();
    let mut answer = use_signal(|| empty_answer(&body));
    let mut outcome = use_signal(|| None::<PracticeOutcome>);

    let checked = material.clone();
    let on_check = move |_| {
        outcome.set(Some(check_reading(&checked, &answer())));
    };
    let reset_body = material.body.clone();
    let on_reset = move |_| {
        answer.set(empty_answer(&reset_body));
        outcome.set(None);
    };

    let marks = outcome().map(|o| o.marks).unwrap_or_default();
    let current = answer();

    rsx! {
        div { class: "panel",
            div { class: "panel-header",
                h2 { class: "panel-title", "{material.title}" }
                span { class: "badge", "{material.body.label()}" }
            }

            if !material.passage.is_empty() && !matches!(material.body, ReadingBody::FillInBlanks { .. }) {
                div { class: "reading-passage mb-6", "{material.passage}" }
            }

            match (&material.body, &current) {
                (ReadingBody::Mcq { options, correct_answers }, Answer::Choices(chosen)) => {
                    let multiple = correct_answers.len() > 1;
                    rsx! {
                        p { class: "text-sm text-[var(--text-secondary)] mb-3",
                            if multiple { "Select all correct answers." } else { "Select one answer." }
                        }
                        div { class: "space-y-2",
                            for option in options.iter().cloned() {
                                {
                                    let is_selected = chosen.contains(&option);
                                    let mark = outcome().as_ref().map(|_| is_correct_choice(correct_answers, &option));
                                    let option_text = option.clone();
                                    rsx! {
                                        button {
                                            key: "{option}",
                                            class: option_class(is_selected, mark),
                                            onclick: move |_| {
                                                let mut next = match answer() {
                                                    Answer::Choices(v) if multiple => v,
                                                    _ => vec![],
                                                };
                                                if let Some(pos) = next.iter().position(|c| c == &option_text) {
                                                    next.remove(pos);
                                                } else {
                                                    next.push(option_text.clone());
                                                }
                                                answer.set(Answer::Choices(next));
                                                outcome.set(None);
                                            },
                                            "{option}"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                (ReadingBody::FillInBlanks { text, word_bank, .. }, Answer::Blanks(given)) => {
                    let segments: Vec<String> = blank_segments(text).into_iter().map(str::to_string).collect();
                    let gap_count = segments.len().saturating_sub(1);
                    rsx! {
                        if !word_bank.is_empty() {
                            div { class: "flex flex-wrap gap-2 mb-4",
                                for word in word_bank.iter() {
                                    span { key: "{word}", class: "badge", "{word}" }
                                }
                            }
                        }
                        div { class: "reading-passage leading-loose",
                            for (idx, segment) in segments.iter().enumerate() {
                                span { key: "{idx}",
                                    "{segment}"
                                    if idx < gap_count {
                                        input {
                                            class: blank_class(marks.get(idx).copied()),
                                            value: "{given.get(idx).cloned().unwrap_or_default()}",
                                            oninput: move |e| {
                                                if let Answer::Blanks(mut v) = answer() {
                                                    if idx < v.len() {
                                                        v[idx] = e.value();
                                                    }
                                                    answer.set(Answer::Blanks(v));
                                                    outcome.set(None);
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                (ReadingBody::Reorder { paragraphs }, Answer::Order(order)) => {
                    let count = order.len();
                    rsx! {
                        p { class: "text-sm text-[var(--text-secondary)] mb-3", "Put the paragraphs in the right order." }
                        div { class: "space-y-2",
                            for (pos, &paragraph_idx) in order.iter().enumerate() {
                                div { key: "{paragraph_idx}", class: "card flex gap-3 items-start",
                                    div { class: "flex flex-col gap-1",
                                        button {
                                            class: "btn btn-secondary btn-sm",
                                            disabled: pos == 0,
                                            onclick: move |_| move_paragraph(answer, outcome, pos, pos.wrapping_sub(1)),
                                            "▲"
                                        }
                                        button {
                                            class: "btn btn-secondary btn-sm",
                                            disabled: pos + 1 == count,
                                            onclick: move |_| move_paragraph(answer, outcome, pos, pos + 1),
                                            "▼"
                                        }
                                    }
                                    p { class: "flex-1", "{paragraphs.get(paragraph_idx).cloned().unwrap_or_default()}" }
                                }
                            }
                        }
                    }
                }
                (ReadingBody::ReadingComprehension { items }, Answer::Choices(given)) => rsx! {
                    div { class: "space-y-6",
                        for (idx, item) in items.iter().enumerate() {
                            div { key: "{idx}",
                                h4 { class: "font-semibold mb-2",
                                    "{idx + 1}. {item.question} "
                                    match marks.get(idx) {
                                        Some(true) => rsx! { span { class: "text-[var(--success)]", "✓" } },
                                        Some(false) => rsx! { span { class: "text-[var(--danger)]", "✕" } },
                                        None => rsx! {},
                                    }
                                }
                                div { class: "grid gap-2",
                                    for option in item.options.iter().cloned() {
                                        {
                                            let is_selected = given.get(idx) == Some(&option);
                                            let value = option.clone();
                                            rsx! {
                                                button {
                                                    key: "{option}",
                                                    class: option_class(is_selected, None),
                                                    onclick: move |_| {
                                                        if let Answer::Choices(mut v) = answer() {
                                                            if idx < v.len() {
                                                                v[idx] = value.clone();
                                                            }
                                                            answer.set(Answer::Choices(v));
                                                            outcome.set(None);
                                                        }
                                                    },
                                                    "{option}"
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                _ => rsx! {},
            }

            if let Some(result) = outcome() {
                div { class: if result.is_perfect() { "result-banner result-good mt-6" } else { "result-banner mt-6" },
                    "Score: {format_score(result.score)} / {format_score(result.max_score)}"
                    if result.is_perfect() { " 🎉" }
                }
            }

            div { class: "flex gap-2 mt-6",
                button { class: "btn btn-primary", onclick: on_check, "Check answers" }
                button { class: "btn btn-secondary", onclick: on_reset, "Reset" }
            }
        }
    }
}

fn move_paragraph(mut answer: Signal<Answer>, mut outcome: Signal<Option<PracticeOutcome>>, from: usize, to: usize) {
    if let Answer::Order(mut order) = answer() {
        if from < order.len() && to < order.len() {
            order.swap(from, to);
            answer.set(Answer::Order(order));
            outcome.set(None);
        }
    }
}

fn option_class(selected: bool, correct: Option<bool>) -> &'static str {
    match (selected, correct) {
        (true, Some(true)) => "option option-correct",
        (true, Some(false)) => "option option-wrong",
        (false, Some(true)) => "option option-missed",
        (true, None) => "option option-selected",
        _ => "option",
    }
}

fn blank_class(correct: Option<bool>) -> &'static str {
    match correct {
        Some(true) => "input blank-input blank-correct",
        Some(false) => "input blank-input blank-wrong",
        None => "input blank-input",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffled_order_is_a_permutation() {
        let order = shuffled_order(5);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
        assert_ne!(order, sorted);
        assert_eq!(shuffled_order(1), vec![0]);
    }

    #[test]
    fn test_empty_answer_shapes() {
        let body = ReadingBody::FillInBlanks {
            text: "a [blank] b [blank]".into(),
            answers: vec!["x".into(), "y".into()],
            word_bank: vec![],
        };
        assert_eq!(empty_answer(&body), Answer::Blanks(vec![String::new(), String::new()]));
        assert_eq!(
            empty_answer(&ReadingBody::Mcq { options: vec!["a".into()], correct_answers: vec![] }),
            Answer::Choices(vec![])
        );
    }
}
