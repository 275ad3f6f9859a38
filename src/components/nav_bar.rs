use dioxus::prelude::*;

use crate::backend::session::format_clock;
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::NoticeStack;
use crate::components::AppState;
use crate::Route;

#[component]
pub fn NavComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    let user = app_state.user.read().clone();
    let is_admin = app_state.is_admin();
    let exam_running = app_state.session.read().is_some();
    let clock = format_clock(chrono::Duration::seconds(*app_state.remaining_seconds.read()));

    let on_logout = move |_| {
        if let Err(e) = cmd_tx.send(AppCmd::Logout) {
            tracing::error!("Failed to send Logout command: {:?}", e);
        }
        navigator().push(Route::HomeComponent {});
    };

    rsx! {
        div { class: "min-h-screen flex flex-col",
            nav { class: "nav-bar",
                div { class: "page-container",
                    // Logo section
                    Link { to: Route::HomeComponent {}, class: "nav-logo",
                        div { class: "logo-icon" }
                        span { class: "logo-text", "PTE Prep" }
                        if user.as_ref().is_some_and(|u| u.is_paid) {
                            span { class: "badge badge-success ml-2", "Premium" }
                        }
                    }

                    div { class: "nav-links",
                        Link { to: Route::LearnComponent {}, class: "nav-link", active_class: "active", "Learn" }
                        Link { to: Route::ExamListComponent {}, class: "nav-link", active_class: "active", "Exams" }
                        Link { to: Route::SpeakingComponent {}, class: "nav-link", active_class: "active", "Speaking" }
                        if user.is_some() {
                            Link { to: Route::ResultsComponent {}, class: "nav-link", active_class: "active", "Results" }
                        }
                        if is_admin {
                            Link { to: Route::AdminDashboardComponent {}, class: "nav-link", active_class: "active", "Admin" }
                        }
                    }

                    div { class: "flex items-center gap-2",
                        if exam_running {
                            Link { to: Route::GiveExamComponent {}, class: "badge badge-warning",
                                "⏱ {clock}"
                            }
                        }
                        if let Some(user) = user {
                            span { class: "text-sm text-[var(--text-secondary)] hidden md:inline", "{user.name}" }
                            button { class: "btn btn-secondary btn-sm", onclick: on_logout, "Log out" }
                        } else {
                            Link { to: Route::LoginComponent {}, class: "btn btn-secondary btn-sm", "Log in" }
                            Link { to: Route::RegisterComponent {}, class: "btn btn-primary btn-sm", "Sign up" }
                        }
                    }
                }
            }

            div { class: "fixed-header-spacer" }

            div { class: "flex-1",
                Outlet::<Route> {}
            }

            NoticeStack {}
        }
    }
}
