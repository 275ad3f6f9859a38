use dioxus::prelude::*;
use serde::Serialize;

use crate::backend::api::Resource;
use crate::backend::models::{PaymentStatus, ResultStatus};
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::Loading;
use crate::components::AppState;
use crate::Route;

/// Queues a create (no id) or update for any editable record.
pub fn save_record<T: Serialize>(cmd_tx: &CmdTx, resource: Resource, id: Option<String>, record: &T) {
    let body = match serde_json::to_value(record) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Failed to encode {} record: {}", resource.path(), e);
            return;
        }
    };
    if let Err(e) = cmd_tx.send(AppCmd::Save { resource, id, body }) {
        tracing::error!("Failed to send Save command: {:?}", e);
    }
}

pub fn delete_record(cmd_tx: &CmdTx, resource: Resource, id: String) {
    if let Err(e) = cmd_tx.send(AppCmd::Delete { resource, id }) {
        tracing::error!("Failed to send Delete command: {:?}", e);
    }
}

/// Admin shell. Non-admins get an access notice instead of the outlet.
#[component]
pub fn AdminLayout() -> Element {
    let app_state = use_context::<AppState>();

    if !*app_state.ready.read() {
        return rsx! { Loading {} };
    }
    if !app_state.is_admin() {
        return rsx! {
            div { class: "page-container py-16 text-center animate-fade-in",
                div { class: "text-5xl mb-4", "⛔" }
                h2 { class: "text-xl font-bold mb-2", "Administrators only" }
                p { class: "text-[var(--text-secondary)] mb-6", "You do not have access to the back office." }
                Link { to: Route::HomeComponent {}, class: "btn btn-primary", "Back home" }
            }
        };
    }

    rsx! {
        div { class: "page-container py-8 grid md:grid-cols-[200px_1fr] gap-6",
            aside { class: "panel h-fit admin-nav",
                Link { to: Route::AdminDashboardComponent {}, class: "nav-link", active_class: "active", "Dashboard" }
                Link { to: Route::AdminUsersComponent {}, class: "nav-link", active_class: "active", "Users" }
                Link { to: Route::AdminCoursesComponent {}, class: "nav-link", active_class: "active", "Courses" }
                Link { to: Route::AdminExamsComponent {}, class: "nav-link", active_class: "active", "Exams" }
                Link { to: Route::AdminQuestionsComponent {}, class: "nav-link", active_class: "active", "Questions" }
                Link { to: Route::AdminReadingComponent {}, class: "nav-link", active_class: "active", "Reading" }
                Link { to: Route::AdminPaymentsComponent {}, class: "nav-link", active_class: "active", "Payments" }
                Link { to: Route::AdminGradingComponent {}, class: "nav-link", active_class: "active", "Grading" }
            }
            div { class: "animate-fade-in",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
pub fn AdminDashboardComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    use_effect(move || {
        for cmd in [
            AppCmd::FetchUsers,
            AppCmd::FetchCourses,
            AppCmd::FetchExams,
            AppCmd::FetchQuestions,
            AppCmd::FetchReadingMaterials,
            AppCmd::FetchAllResults,
            AppCmd::FetchPayments,
            AppCmd::FetchSpeakingResponses,
        ] {
            let _ = cmd_tx.send(cmd);
        }
    });

    let users = app_state.users.read().len();
    let courses = app_state.courses.read().len();
    let exams = app_state.exams.read().len();
    let questions = app_state.questions.read().len();
    let materials = app_state.reading_materials.read().len();
    let pending_results = app_state
        .all_results
        .read()
        .iter()
        .filter(|r| r.status == ResultStatus::PendingReview)
        .count();
    let ungraded_speaking = app_state
        .speaking_responses
        .read()
        .iter()
        .filter(|r| r.marks.is_none())
        .count();
    let revenue: f64 = app_state
        .payments
        .read()
        .iter()
        .filter(|p| p.status == PaymentStatus::Complete)
        .map(|p| p.amount)
        .sum();

    rsx! {
        div { class: "page-header",
            h1 { class: "page-title", "Dashboard" }
        }
        div { class: "grid grid-cols-2 md:grid-cols-4 gap-4 mb-6",
            StatCard { label: "Users", value: "{users}" }
            StatCard { label: "Courses", value: "{courses}" }
            StatCard { label: "Exams", value: "{exams}" }
            StatCard { label: "Questions", value: "{questions}" }
            StatCard { label: "Reading materials", value: "{materials}" }
            StatCard { label: "Results to review", value: "{pending_results}" }
            StatCard { label: "Speaking to grade", value: "{ungraded_speaking}" }
            StatCard { label: "Revenue (Rs.)", value: "{revenue:.0}" }
        }
        if pending_results + ungraded_speaking > 0 {
            div { class: "panel flex justify-between items-center",
                p { "There are submissions waiting for marks." }
                Link { to: Route::AdminGradingComponent {}, class: "btn btn-primary btn-sm", "Open grading" }
            }
        }
    }
}

#[component]
fn StatCard(label: String, value: String) -> Element {
    rsx! {
        div { class: "card text-center",
            div { class: "text-3xl font-bold", "{value}" }
            div { class: "text-xs text-[var(--text-muted)] mt-1", "{label}" }
        }
    }
}
