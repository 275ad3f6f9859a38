use dioxus::prelude::*;

use crate::backend::{AppCmd, CmdTx};
use crate::components::AppState;
use crate::Route;

/// Sends signed-in users on to where they belong.
fn use_redirect_when_signed_in() {
    let app_state = use_context::<AppState>();
    use_effect(move || {
        if let Some(user) = app_state.user.read().as_ref() {
            if user.is_admin() {
                navigator().push(Route::AdminDashboardComponent {});
            } else {
                navigator().push(Route::ExamListComponent {});
            }
        }
    });
}

#[component]
pub fn LoginComponent() -> Element {
    let cmd_tx = use_context::<CmdTx>();
    use_redirect_when_signed_in();

    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        if email().trim().is_empty() || password().is_empty() {
            error.set(Some("Email and password are required".to_string()));
            return;
        }
        error.set(None);
        if let Err(e) = cmd_tx.send(AppCmd::Login {
            email: email().trim().to_string(),
            password: password(),
        }) {
            tracing::error!("Failed to send Login command: {:?}", e);
        }
    };

    rsx! {
        div { class: "page-container py-12 animate-fade-in",
            div { class: "panel max-w-md mx-auto",
                h1 { class: "page-title mb-6 text-center", "Log in" }
                form { class: "grid gap-4", onsubmit: on_submit,
                    div { class: "form-group",
                        label { class: "form-label", "Email" }
                        input {
                            class: "input",
                            r#type: "email",
                            value: "{email}",
                            oninput: move |e| email.set(e.value())
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Password" }
                        input {
                            class: "input",
                            r#type: "password",
                            value: "{password}",
                            oninput: move |e| password.set(e.value())
                        }
                    }
                    if let Some(message) = error() {
                        p { class: "text-sm text-[var(--danger)]", "{message}" }
                    }
                    button { class: "btn btn-primary w-full", r#type: "submit", "Log in" }
                }
                p { class: "text-sm text-center mt-4 text-[var(--text-secondary)]",
                    "No account yet? "
                    Link { to: Route::RegisterComponent {}, class: "text-[var(--primary)]", "Register" }
                }
            }
        }
    }
}

/// Returns the first problem with a registration form, if any.
pub fn validate_registration(name: &str, email: &str, password: &str, confirm: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        return Some("Name is required");
    }
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Some("Enter a valid email address");
    };
    if local.is_empty() || !domain.contains('.') {
        return Some("Enter a valid email address");
    }
    if password.len() < 6 {
        return Some("Password must be at least 6 characters");
    }
    if password != confirm {
        return Some("Passwords do not match");
    }
    None
}

#[component]
pub fn RegisterComponent() -> Element {
    let cmd_tx = use_context::<CmdTx>();
    use_redirect_when_signed_in();

    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut phone = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);

    let on_submit = move |e: FormEvent| {
        e.prevent_default();
        if let Some(problem) = validate_registration(&name(), &email(), &password(), &confirm()) {
            error.set(Some(problem.to_string()));
            return;
        }
        error.set(None);
        let phone = phone().trim().to_string();
        if let Err(e) = cmd_tx.send(AppCmd::Register {
            name: name().trim().to_string(),
            email: email().trim().to_string(),
            phone: (!phone.is_empty()).then_some(phone),
            password: password(),
        }) {
            tracing::error!("Failed to send Register command: {:?}", e);
        }
    };

    rsx! {
        div { class: "page-container py-12 animate-fade-in",
            div { class: "panel max-w-md mx-auto",
                h1 { class: "page-title mb-6 text-center", "Create your account" }
                form { class: "grid gap-4", onsubmit: on_submit,
                    div { class: "form-group",
                        label { class: "form-label", "Full name" }
                        input { class: "input", value: "{name}", oninput: move |e| name.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Email" }
                        input { class: "input", r#type: "email", value: "{email}", oninput: move |e| email.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Phone (optional)" }
                        input { class: "input", r#type: "tel", value: "{phone}", oninput: move |e| phone.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Password" }
                        input { class: "input", r#type: "password", value: "{password}", oninput: move |e| password.set(e.value()) }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Confirm password" }
                        input { class: "input", r#type: "password", value: "{confirm}", oninput: move |e| confirm.set(e.value()) }
                    }
                    if let Some(message) = error() {
                        p { class: "text-sm text-[var(--danger)]", "{message}" }
                    }
                    button { class: "btn btn-primary w-full", r#type: "submit", "Register" }
                }
                p { class: "text-sm text-center mt-4 text-[var(--text-secondary)]",
                    "Already registered? "
                    Link { to: Route::LoginComponent {}, class: "text-[var(--primary)]", "Log in" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_registration() {
        assert_eq!(validate_registration("Ram", "ram@example.com", "secret1", "secret1"), None);
        assert_eq!(validate_registration(" ", "ram@example.com", "secret1", "secret1"), Some("Name is required"));
        assert!(validate_registration("Ram", "ram.example.com", "secret1", "secret1").is_some());
        assert!(validate_registration("Ram", "@example.com", "secret1", "secret1").is_some());
        assert_eq!(
            validate_registration("Ram", "ram@example.com", "abc", "abc"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(
            validate_registration("Ram", "ram@example.com", "secret1", "secret2"),
            Some("Passwords do not match")
        );
    }
}
