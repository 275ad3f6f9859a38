use dioxus::prelude::*;

use crate::backend::api::Resource;
use crate::backend::models::{PaymentStatus, Role, User};
use crate::backend::{AppCmd, CmdTx};
use crate::components::admin_page::{delete_record, save_record};
use crate::components::common::{format_score, EmptyState};
use crate::components::AppState;

#[component]
pub fn AdminUsersComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut search = use_signal(String::new);
    let mut confirm_delete = use_signal(|| None::<User>);

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchUsers);
    });

    let needle = search().to_lowercase();
    let users: Vec<User> = app_state
        .users
        .read()
        .iter()
        .filter(|u| needle.is_empty() || u.name.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    let own_id = app_state.user.read().as_ref().map(|u| u.id.clone()).unwrap_or_default();

    let cmd_tx_delete = cmd_tx.clone();

    rsx! {
        div { class: "page-header",
            div { class: "flex justify-between items-center",
                h1 { class: "page-title", "Users" }
                input {
                    class: "input max-w-xs",
                    placeholder: "Search name or email...",
                    value: "{search}",
                    oninput: move |e| search.set(e.value())
                }
            }
        }

        if users.is_empty() {
            EmptyState { icon: "👤", message: "No users found." }
        } else {
            div { class: "panel overflow-x-auto",
                table { class: "table",
                    thead {
                        tr {
                            th { "Name" }
                            th { "Email" }
                            th { "Phone" }
                            th { "Role" }
                            th { "Access" }
                            th {}
                        }
                    }
                    tbody {
                        for user in users {
                            {
                                let is_self = user.id == own_id;
                                let toggle_paid = {
                                    let cmd_tx = cmd_tx.clone();
                                    let mut changed = user.clone();
                                    changed.is_paid = !changed.is_paid;
                                    move |_| save_record(&cmd_tx, Resource::Users, Some(changed.id.clone()), &changed)
                                };
                                let toggle_role = {
                                    let cmd_tx = cmd_tx.clone();
                                    let mut changed = user.clone();
                                    changed.role = if changed.is_admin() { Role::User } else { Role::Admin };
                                    move |_| save_record(&cmd_tx, Resource::Users, Some(changed.id.clone()), &changed)
                                };
                                let doomed = user.clone();
                                rsx! {
                                    tr { key: "{user.id}",
                                        td { "{user.name}" }
                                        td { "{user.email}" }
                                        td { "{user.phone.clone().unwrap_or_default()}" }
                                        td {
                                            button {
                                                class: if user.is_admin() { "badge badge-warning" } else { "badge" },
                                                disabled: is_self,
                                                onclick: toggle_role,
                                                if user.is_admin() { "admin" } else { "user" }
                                            }
                                        }
                                        td {
                                            button {
                                                class: if user.is_paid { "badge badge-success" } else { "badge" },
                                                onclick: toggle_paid,
                                                if user.is_paid { "Paid" } else { "Free" }
                                            }
                                        }
                                        td {
                                            if !is_self {
                                                button {
                                                    class: "btn btn-secondary btn-sm",
                                                    onclick: move |_| confirm_delete.set(Some(doomed.clone())),
                                                    "Delete"
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

        if let Some(user) = confirm_delete() {
            div { class: "fixed inset-0 bg-black/60 flex items-center justify-center z-50 animate-fade-in",
                div { class: "panel max-w-sm w-full mx-4 text-center",
                    h2 { class: "text-lg font-bold mb-2", "Delete {user.name}?" }
                    p { class: "text-sm text-[var(--text-secondary)] mb-6", "Their results and payments stay on record." }
                    div { class: "flex gap-2",
                        button { class: "btn btn-secondary flex-1", onclick: move |_| confirm_delete.set(None), "Cancel" }
                        button {
                            class: "btn btn-primary flex-1",
                            onclick: move |_| {
                                delete_record(&cmd_tx_delete, Resource::Users, user.id.clone());
                                confirm_delete.set(None);
                            },
                            "Delete"
                        }
                    }
                }
            }
        }
    }
}

#[component]
pub fn AdminPaymentsComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut status_filter = use_signal(|| None::<PaymentStatus>);

    use_effect(move || {
        let _ = cmd_tx.send(AppCmd::FetchPayments);
        let _ = cmd_tx.send(AppCmd::FetchUsers);
    });

    let users = app_state.users.read().clone();
    let user_name = move |id: &str| {
        users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut payments: Vec<_> = app_state
        .payments
        .read()
        .iter()
        .filter(|p| status_filter().map_or(true, |s| p.status == s))
        .cloned()
        .collect();
    payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total: f64 = payments.iter().filter(|p| p.status == PaymentStatus::Complete).map(|p| p.amount).sum();

    rsx! {
        div { class: "page-header",
            div { class: "flex justify-between items-center",
                h1 { class: "page-title", "Payment history" }
                span { class: "text-sm text-[var(--text-secondary)]", "Completed: Rs. {format_score(total)}" }
            }
        }

        div { class: "flex flex-wrap gap-2 mb-4",
            button {
                class: if status_filter().is_none() { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                onclick: move |_| status_filter.set(None),
                "All"
            }
            for status in [PaymentStatus::Complete, PaymentStatus::Pending, PaymentStatus::Failed, PaymentStatus::Canceled] {
                button {
                    key: "{status.label()}",
                    class: if status_filter() == Some(status) { "btn btn-primary btn-sm" } else { "btn btn-secondary btn-sm" },
                    onclick: move |_| status_filter.set(Some(status)),
                    "{status.label()}"
                }
            }
        }

        if payments.is_empty() {
            EmptyState { icon: "💳", message: "No payments recorded." }
        } else {
            div { class: "panel overflow-x-auto",
                table { class: "table",
                    thead {
                        tr {
                            th { "Date" }
                            th { "User" }
                            th { "Amount" }
                            th { "Transaction" }
                            th { "Reference" }
                            th { "Status" }
                        }
                    }
                    tbody {
                        for payment in payments {
                            {
                                let date = payment
                                    .created_at
                                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                                    .unwrap_or_default();
                                let badge = match payment.status {
                                    PaymentStatus::Complete => "badge badge-success",
                                    PaymentStatus::Pending | PaymentStatus::Ambiguous => "badge badge-warning",
                                    _ => "badge badge-danger",
                                };
                                rsx! {
                                    tr { key: "{payment.transaction_uuid}",
                                        td { "{date}" }
                                        td { "{user_name(&payment.user_id)}" }
                                        td { "Rs. {format_score(payment.amount)}" }
                                        td { class: "font-mono text-xs", "{payment.transaction_uuid}" }
                                        td { class: "font-mono text-xs", "{payment.ref_id.clone().unwrap_or_default()}" }
                                        td { span { class: badge, "{payment.status.label()}" } }
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
