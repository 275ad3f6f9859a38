use dioxus::prelude::*;

use crate::backend::models::ResultStatus;
use crate::backend::NoticeLevel;
use crate::components::AppState;
use crate::Route;

#[component]
pub fn NoticeStack() -> Element {
    let mut app_state = use_context::<AppState>();
    let notices = app_state.notices.read().clone();

    rsx! {
        div { class: "fixed bottom-4 right-4 z-[100] flex flex-col gap-2 max-w-sm",
            for (idx, notice) in notices.into_iter().enumerate() {
                {
                    let tone = match notice.level {
                        NoticeLevel::Info => "notice notice-info",
                        NoticeLevel::Success => "notice notice-success",
                        NoticeLevel::Error => "notice notice-error",
                    };
                    rsx! {
                        div { key: "{idx}-{notice.message}", class: "{tone} animate-fade-in",
                            span { class: "flex-1 text-sm", "{notice.message}" }
                            button {
                                class: "text-xs opacity-70 hover:opacity-100",
                                onclick: move |_| app_state.dismiss_notice(idx),
                                "✕"
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Renders `children` only for a signed-in user.
#[component]
pub fn RequireLogin(children: Element) -> Element {
    let app_state = use_context::<AppState>();

    if !*app_state.ready.read() {
        return rsx! { Loading {} };
    }
    if app_state.user.read().is_none() {
        return rsx! {
            div { class: "page-container py-16 text-center animate-fade-in",
                div { class: "text-5xl mb-4", "🔒" }
                h2 { class: "text-xl font-bold mb-2", "Please log in to continue" }
                p { class: "text-[var(--text-secondary)] mb-6", "This page is only available to registered students." }
                div { class: "flex justify-center gap-2",
                    Link { to: Route::LoginComponent {}, class: "btn btn-primary", "Log in" }
                    Link { to: Route::RegisterComponent {}, class: "btn btn-secondary", "Create account" }
                }
            }
        };
    }

    rsx! { {children} }
}

#[component]
pub fn Loading() -> Element {
    rsx! {
        div { class: "flex items-center justify-center py-16",
            div { class: "spinner" }
        }
    }
}

#[component]
pub fn EmptyState(icon: String, message: String) -> Element {
    rsx! {
        div { class: "text-center py-12 text-[var(--text-muted)]",
            div { class: "text-4xl mb-2", "{icon}" }
            p { "{message}" }
        }
    }
}

#[component]
pub fn StatusBadge(status: ResultStatus) -> Element {
    let class = match status {
        ResultStatus::PendingReview => "badge badge-warning",
        ResultStatus::Graded => "badge badge-success",
    };
    rsx! { span { class: "{class}", "{status.label()}" } }
}

pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{:.1}", score)
    }
}

pub fn percent(score: f64, max: f64) -> u32 {
    if max <= 0.0 {
        return 0;
    }
    ((score / max) * 100.0).round().clamp(0.0, 100.0) as u32
}

#[component]
pub fn NotFoundComponent(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div { class: "page-container py-16 text-center animate-fade-in",
            div { class: "text-6xl mb-4", "🧭" }
            h1 { class: "page-title mb-2", "Page not found" }
            p { class: "text-[var(--text-secondary)] mb-6", "Nothing lives at /{path}" }
            Link { to: Route::HomeComponent {}, class: "btn btn-primary", "Back home" }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(3.0), "3");
        assert_eq!(format_score(2.5), "2.5");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(3.0, 4.0), 75);
        assert_eq!(percent(1.0, 0.0), 0);
        assert_eq!(percent(5.0, 4.0), 100);
    }
}
