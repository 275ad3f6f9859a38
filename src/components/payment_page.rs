use dioxus::prelude::*;

use crate::backend::esewa::PaymentForm;
use crate::backend::{AppCmd, CmdTx};
use crate::components::common::{format_score, EmptyState, RequireLogin};
use crate::components::AppState;
use crate::Route;

#[component]
pub fn PaymentComponent() -> Element {
    rsx! {
        RequireLogin { Checkout {} }
    }
}

#[component]
fn Checkout() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchCourses);
    });

    let is_paid = app_state.user.read().as_ref().is_some_and(|u| u.is_paid);
    let form = app_state.payment_form.read().clone();
    let courses: Vec<_> = app_state.courses.read().iter().filter(|c| c.is_active).cloned().collect();

    if let Some(form) = form {
        return rsx! {
            div { class: "page-container py-8 animate-fade-in",
                EsewaForm { form: form }
            }
        };
    }

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "💳 Enroll" }
                p { class: "text-[var(--text-secondary)] mt-1", "Payments are processed securely by eSewa." }
            }

            if is_paid {
                div { class: "panel mb-6 border-[var(--success)]",
                    p { "✓ Your account already has full access to all mock exams." }
                }
            }

            if courses.is_empty() {
                EmptyState { icon: "🛒", message: "No courses are open for enrollment." }
            } else {
                div { class: "grid md:grid-cols-2 gap-4",
                    for course in courses {
                        {
                            let cmd_tx = cmd_tx.clone();
                            let course_id = course.id.clone();
                            let amount = course.price;
                            rsx! {
                                div { key: "{course.id}", class: "card flex flex-col",
                                    h3 { class: "font-semibold text-lg", "{course.title}" }
                                    p { class: "text-sm text-[var(--text-secondary)] my-2", "{course.description}" }
                                    div { class: "flex justify-between items-center mt-auto",
                                        span { class: "text-xl font-bold", "Rs. {format_score(course.price)}" }
                                        button {
                                            class: "btn btn-primary",
                                            disabled: amount <= 0.0,
                                            onclick: move |_| {
                                                if let Err(e) = cmd_tx.send(AppCmd::StartPayment {
                                                    course_id: Some(course_id.clone()),
                                                    amount,
                                                }) {
                                                    tracing::error!("Failed to send StartPayment command: {:?}", e);
                                                }
                                            },
                                            "Pay with eSewa"
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

/// The signed form posts straight to the gateway, which redirects back to the
/// success or failure route.
#[component]
fn EsewaForm(form: PaymentForm) -> Element {
    let mut app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    rsx! {
        div { class: "panel max-w-md mx-auto text-center",
            h2 { class: "text-xl font-bold mb-2", "Confirm payment" }
            p { class: "text-[var(--text-secondary)] mb-6", "You will be redirected to eSewa to complete the payment." }

            div { class: "mb-6 p-6 rounded-xl bg-[var(--bg-secondary)]",
                div { class: "text-4xl font-bold mb-1", "Rs. {form.total_amount}" }
                div { class: "text-xs text-[var(--text-muted)]", "Transaction {form.transaction_uuid}" }
            }

            form { action: "{form.action}", method: "POST",
                for (name, value) in form.fields() {
                    input { key: "{name}", r#type: "hidden", name: "{name}", value: "{value}" }
                }
                button { class: "btn btn-primary w-full mb-2", r#type: "submit", "Continue to eSewa" }
            }
            button {
                class: "btn btn-secondary w-full",
                onclick: move |_| {
                    app_state.payment_form.set(None);
                    let _ = cmd_tx.send(AppCmd::CancelPayment);
                },
                "Cancel"
            }
        }
    }
}

#[component]
pub fn PaymentSuccessComponent(data: String) -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();

    use_hook(move || {
        if data.is_empty() {
            tracing::warn!("Payment success page opened without a payload");
            return;
        }
        if let Err(e) = cmd_tx.send(AppCmd::VerifyPayment { data }) {
            tracing::error!("Failed to send VerifyPayment command: {:?}", e);
        }
    });

    let payment = app_state.last_payment.read().clone();

    rsx! {
        div { class: "page-container py-16 animate-fade-in",
            div { class: "panel max-w-md mx-auto text-center",
                if let Some(payment) = payment {
                    div { class: "text-6xl mb-4", "🎉" }
                    h2 { class: "text-2xl font-bold text-[var(--success)] mb-2", "Payment successful" }
                    p { class: "text-[var(--text-secondary)] mb-2", "Rs. {format_score(payment.amount)} received." }
                    if let Some(reference) = payment.ref_id {
                        p { class: "text-xs text-[var(--text-muted)] mb-6", "eSewa reference {reference}" }
                    }
                    Link { to: Route::ExamListComponent {}, class: "btn btn-primary w-full", "Go to exams" }
                } else {
                    div { class: "text-6xl mb-4", "⏳" }
                    h2 { class: "text-xl font-bold mb-2", "Verifying your payment" }
                    p { class: "text-[var(--text-secondary)] mb-6", "This only takes a moment." }
                    Link { to: Route::PaymentComponent {}, class: "btn btn-secondary w-full", "Back to enrollment" }
                }
            }
        }
    }
}

#[component]
pub fn PaymentFailureComponent() -> Element {
    let cmd_tx = use_context::<CmdTx>();

    use_hook(move || {
        if let Err(e) = cmd_tx.send(AppCmd::CancelPayment) {
            tracing::error!("Failed to send CancelPayment command: {:?}", e);
        }
    });

    rsx! {
        div { class: "page-container py-16 animate-fade-in",
            div { class: "panel max-w-md mx-auto text-center",
                div { class: "text-6xl mb-4", "⚠️" }
                h2 { class: "text-2xl font-bold text-[var(--danger)] mb-2", "Payment not completed" }
                p { class: "text-[var(--text-secondary)] mb-6", "No money was taken. You can try again at any time." }
                Link { to: Route::PaymentComponent {}, class: "btn btn-primary w-full", "Try again" }
            }
        }
    }
}
