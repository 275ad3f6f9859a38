use dioxus::prelude::*;

use crate::backend::models::{Exam, User};
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{EmptyState, RequireLogin};
use crate::components::AppState;
use crate::Route;

/// Course-bound exams are unlocked by payment; admins see everything.
pub fn is_unlocked(exam: &Exam, user: &User) -> bool {
    exam.course_id.is_none() || user.is_paid || user.is_admin()
}

#[component]
pub fn ExamListComponent() -> Element {
    rsx! {
        RequireLogin { ExamList {} }
    }
}

#[component]
fn ExamList() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchExams);
    });

    let on_start = EventHandler::new(move |exam: Exam| {
        if let Err(e) = cmd_tx.send(AppCmd::SelectExam(exam)) {
            tracing::error!("Failed to send SelectExam command: {:?}", e);
            return;
        }
        navigator().push(Route::GiveExamComponent {});
    });

    let Some(user) = app_state.user.read().clone() else {
        return rsx! {};
    };
    let exams = app_state.exams.read().clone();
    let active = app_state.session.read().as_ref().map(|s| s.exam.clone());

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "📝 Mock Exams" }
                p { class: "text-[var(--text-secondary)] mt-1", "Each section is timed separately. When time runs out you move on automatically." }
            }

            if let Some(exam) = active {
                div { class: "panel mb-6 border-[var(--warning)]",
                    div { class: "flex justify-between items-center",
                        div {
                            h3 { class: "font-semibold", "Exam in progress: {exam.title}" }
                            p { class: "text-sm text-[var(--text-secondary)]", "Your answers and timer were saved." }
                        }
                        Link { to: Route::GiveExamComponent {}, class: "btn btn-primary", "Resume" }
                    }
                }
            }

            if exams.is_empty() {
                EmptyState { icon: "🗒️", message: "No exams have been published yet." }
            } else {
                div { class: "grid md:grid-cols-2 gap-4",
                    for exam in exams {
                        ExamCard {
                            key: "{exam.id}",
                            unlocked: is_unlocked(&exam, &user),
                            exam: exam,
                            on_start: on_start,
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn ExamCard(exam: Exam, unlocked: bool, on_start: EventHandler<Exam>) -> Element {
    let total_minutes = exam.total_minutes();
    let question_count = exam.question_count();
    let chosen = exam.clone();

    rsx! {
        div { class: "card flex flex-col",
            h3 { class: "font-semibold text-lg", "{exam.title}" }
            if !exam.description.is_empty() {
                p { class: "text-sm text-[var(--text-secondary)] mt-1", "{exam.description}" }
            }
            div { class: "flex flex-wrap gap-2 my-3",
                for (idx, section) in exam.sections.iter().enumerate() {
                    span { key: "{idx}", class: "badge", "{section.name} · {section.duration_minutes} min" }
                }
            }
            div { class: "flex justify-between items-center mt-auto",
                span { class: "text-sm text-[var(--text-muted)]", "{question_count} questions · {total_minutes} min" }
                if unlocked {
                    button { class: "btn btn-primary btn-sm", onclick: move |_| on_start.call(chosen.clone()), "Start" }
                } else {
                    Link { to: Route::PaymentComponent {}, class: "btn btn-secondary btn-sm", "🔒 Unlock" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::Role;

    fn user(role: Role, is_paid: bool) -> User {
        User {
            id: "u".into(),
            name: "U".into(),
            email: "u@example.com".into(),
            phone: None,
            role,
            is_paid,
        }
    }

    #[test]
    fn test_course_exams_need_payment() {
        let mut exam = Exam {
            id: "e".into(),
            title: "Mock".into(),
            description: String::new(),
            course_id: None,
            sections: vec![],
        };
        assert!(is_unlocked(&exam, &user(Role::User, false)));

        exam.course_id = Some("c1".into());
        assert!(!is_unlocked(&exam, &user(Role::User, false)));
        assert!(is_unlocked(&exam, &user(Role::User, true)));
        assert!(is_unlocked(&exam, &user(Role::Admin, false)));
    }
}
