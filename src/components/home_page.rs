use dioxus::prelude::*;

use crate::backend::{AppCmd, CmdTx};
use crate::components::common::format_score;
use crate::components::AppState;
use crate::Route;

#[component]
pub fn HomeComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    use_effect(move || {
        let _ = cmd_tx.send(AppCmd::FetchCourses);
    });

    let user = app_state.user.read().clone();
    let courses: Vec<_> = app_state
        .courses
        .read()
        .iter()
        .filter(|c| c.is_active)
        .cloned()
        .collect();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            // Hero
            div { class: "panel mb-8 text-center py-12",
                h1 { class: "text-4xl font-bold mb-3", "Prepare for PTE Academic" }
                p { class: "text-[var(--text-secondary)] max-w-2xl mx-auto mb-6",
                    "Practice reading tasks, sit full mock exams under real timing, and record your speaking answers for expert feedback."
                }
                div { class: "flex justify-center gap-3",
                    if let Some(user) = user.as_ref() {
                        Link { to: Route::ExamListComponent {}, class: "btn btn-primary", "Continue, {user.name}" }
                    } else {
                        Link { to: Route::RegisterComponent {}, class: "btn btn-primary", "Get started" }
                        Link { to: Route::LoginComponent {}, class: "btn btn-secondary", "I have an account" }
                    }
                }
            }

            // Sections
            div { class: "grid md:grid-cols-3 gap-4 mb-8",
                FeatureCard {
                    icon: "📖",
                    title: "Reading practice",
                    text: "Multiple choice, fill in the blanks, reorder paragraphs and comprehension, checked instantly.",
                    to: Route::LearnComponent {},
                }
                FeatureCard {
                    icon: "📝",
                    title: "Mock exams",
                    text: "Timed sections with automatic scoring for objective questions and tutor review for writing.",
                    to: Route::ExamListComponent {},
                }
                FeatureCard {
                    icon: "🎙️",
                    title: "Speaking test",
                    text: "Read aloud, repeat sentence, describe image and more. Upload a recording for grading.",
                    to: Route::SpeakingComponent {},
                }
            }

            // Courses
            if !courses.is_empty() {
                div { class: "panel",
                    div { class: "panel-header",
                        h2 { class: "panel-title", "Courses" }
                    }
                    div { class: "grid md:grid-cols-2 gap-4",
                        for course in courses {
                            div { key: "{course.id}", class: "card",
                                h3 { class: "font-semibold text-lg", "{course.title}" }
                                p { class: "text-sm text-[var(--text-secondary)] my-2", "{course.description}" }
                                div { class: "flex justify-between items-center",
                                    span { class: "font-bold", "Rs. {format_score(course.price)}" }
                                    Link { to: Route::PaymentComponent {}, class: "btn btn-primary btn-sm", "Enroll" }
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
fn FeatureCard(icon: String, title: String, text: String, to: Route) -> Element {
    rsx! {
        Link { to: to, class: "card hover:border-[var(--primary)] transition-all",
            div { class: "text-3xl mb-2", "{icon}" }
            h3 { class: "font-semibold mb-1", "{title}" }
            p { class: "text-sm text-[var(--text-secondary)]", "{text}" }
        }
    }
}
