use dioxus::prelude::*;

use crate::backend::api::Resource;
use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{Course, Exam, Section, SectionKind};
use crate::backend::{AppCmd, CmdTx};
use crate::components::admin_page::{delete_record, save_record};
use crate::components::common::{format_score, EmptyState};
use crate::components::forms::optional_f64;
use crate::components::AppState;

/// Editable text form of a course.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseDraft {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub price: String,
    pub is_active: bool,
}

impl CourseDraft {
    pub fn blank() -> Self {
        Self {
            is_active: true,
            ..Default::default()
        }
    }

    pub fn from_course(course: &Course) -> Self {
        Self {
            id: Some(course.id.clone()),
            title: course.title.clone(),
            description: course.description.clone(),
            price: format_score(course.price),
            is_active: course.is_active,
        }
    }

    pub fn build(&self) -> AppResult<Course> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Course title is required".into()));
        }
        Ok(Course {
            id: self.id.clone().unwrap_or_default(),
            title: title.to_string(),
            description: self.description.trim().to_string(),
            price: optional_f64(&self.price)?.unwrap_or(0.0),
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionDraft {
    pub name: String,
    pub kind: SectionKind,
    pub duration: String,
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamDraft {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub course_id: String,
    pub sections: Vec<SectionDraft>,
}

impl ExamDraft {
    pub fn from_exam(exam: &Exam) -> Self {
        Self {
            id: Some(exam.id.clone()),
            title: exam.title.clone(),
            description: exam.description.clone(),
            course_id: exam.course_id.clone().unwrap_or_default(),
            sections: exam
                .sections
                .iter()
                .map(|s| SectionDraft {
                    name: s.name.clone(),
                    kind: s.kind,
                    duration: s.duration_minutes.to_string(),
                    question_ids: s.question_ids.clone(),
                })
                .collect(),
        }
    }

    /// Sections must each have a positive duration and at least one question.
    pub fn build(&self) -> AppResult<Exam> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Exam title is required".into()));
        }
        if self.sections.is_empty() {
            return Err(AppError::Validation("An exam needs at least one section".into()));
        }

        let mut sections = Vec::with_capacity(self.sections.len());
        for (n, draft) in self.sections.iter().enumerate() {
            let name = match draft.name.trim() {
                "" => draft.kind.label().to_string(),
                name => name.to_string(),
            };
            let duration_minutes: u32 = match draft.duration.trim().parse() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(AppError::Validation(format!(
                        "Section {} needs a duration in minutes",
                        n + 1
                    )))
                }
            };
            if draft.question_ids.is_empty() {
                return Err(AppError::Validation(format!("Section {} has no questions", n + 1)));
            }
            sections.push(Section {
                name,
                kind: draft.kind,
                duration_minutes,
                question_ids: draft.question_ids.clone(),
                questions: Vec::new(),
            });
        }

        let course_id = self.course_id.trim();
        Ok(Exam {
            id: self.id.clone().unwrap_or_default(),
            title: title.to_string(),
            description: self.description.trim().to_string(),
            course_id: (!course_id.is_empty()).then(|| course_id.to_string()),
            sections,
        })
    }
}

#[component]
pub fn AdminCoursesComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut draft = use_signal(|| None::<CourseDraft>);
    let mut error = use_signal(|| None::<String>);

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        let _ = cmd_tx_effect.send(AppCmd::FetchCourses);
    });

    let courses = app_state.courses.read().clone();
    let cmd_tx_save = cmd_tx.clone();
    let save = move |_| {
        let Some(current) = draft() else { return };
        match current.build() {
            Ok(course) => {
                save_record(&cmd_tx_save, Resource::Courses, current.id.clone(), &course);
                draft.set(None);
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    rsx! {
        div { class: "page-header",
            div { class: "flex justify-between items-center",
                h1 { class: "page-title", "Courses" }
                button {
                    class: "btn btn-primary",
                    onclick: move |_| {
                        draft.set(Some(CourseDraft::blank()));
                        error.set(None);
                    },
                    "+ New course"
                }
            }
        }

        if let Some(current) = draft() {
            div { class: "panel mb-6",
                div { class: "panel-header",
                    h2 { class: "panel-title", if current.id.is_some() { "Edit course" } else { "New course" } }
                }
                div { class: "form-group",
                    label { class: "form-label", "Title" }
                    input {
                        class: "input",
                        value: "{current.title}",
                        oninput: move |e| draft.with_mut(|d| if let Some(d) = d { d.title = e.value() })
                    }
                }
                div { class: "form-group",
                    label { class: "form-label", "Description" }
                    textarea {
                        class: "input min-h-[80px]",
                        value: "{current.description}",
                        oninput: move |e| draft.with_mut(|d| if let Some(d) = d { d.description = e.value() })
                    }
                }
                div { class: "grid grid-cols-2 gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Price (Rs.)" }
                        input {
                            class: "input",
                            inputmode: "decimal",
                            value: "{current.price}",
                            oninput: move |e| draft.with_mut(|d| if let Some(d) = d { d.price = e.value() })
                        }
                    }
                    label { class: "flex items-center gap-2 mt-6 cursor-pointer",
                        input {
                            r#type: "checkbox",
                            checked: current.is_active,
                            onchange: move |e| draft.with_mut(|d| if let Some(d) = d { d.is_active = e.checked() })
                        }
                        "Open for enrollment"
                    }
                }
                if let Some(message) = error() {
                    p { class: "text-sm text-[var(--danger)] mb-3", "{message}" }
                }
                div { class: "flex gap-2",
                    button { class: "btn btn-primary", onclick: save, "Save" }
                    button { class: "btn btn-secondary", onclick: move |_| draft.set(None), "Cancel" }
                }
            }
        }

        if courses.is_empty() {
            EmptyState { icon: "📚", message: "No courses yet." }
        } else {
            div { class: "panel overflow-x-auto",
                table { class: "table",
                    thead {
                        tr {
                            th { "Title" }
                            th { "Price" }
                            th { "Status" }
                            th {}
                        }
                    }
                    tbody {
                        for course in courses {
                            {
                                let cmd_tx = cmd_tx.clone();
                                let editing = CourseDraft::from_course(&course);
                                let course_id = course.id.clone();
                                rsx! {
                                    tr { key: "{course.id}",
                                        td {
                                            div { class: "font-medium", "{course.title}" }
                                            div { class: "text-xs text-[var(--text-muted)] truncate max-w-sm", "{course.description}" }
                                        }
                                        td { "Rs. {format_score(course.price)}" }
                                        td {
                                            span {
                                                class: if course.is_active { "badge badge-success" } else { "badge" },
                                                if course.is_active { "Active" } else { "Hidden" }
                                            }
                                        }
                                        td { class: "flex gap-2 justify-end",
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| {
                                                    draft.set(Some(editing.clone()));
                                                    error.set(None);
                                                },
                                                "Edit"
                                            }
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| delete_record(&cmd_tx, Resource::Courses, course_id.clone()),
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
}

#[component]
pub fn AdminExamsComponent() -> Element {
    let app_state = use_context::<AppState>();
    let cmd_tx = use_context::<CmdTx>();
    let mut draft = use_signal(|| None::<ExamDraft>);
    let mut error = use_signal(|| None::<String>);

    let cmd_tx_effect = cmd_tx.clone();
    use_effect(move || {
        for cmd in [AppCmd::FetchExams, AppCmd::FetchCourses, AppCmd::FetchQuestions] {
            let _ = cmd_tx_effect.send(cmd);
        }
    });

    let exams = app_state.exams.read().clone();
    let courses = app_state.courses.read().clone();
    let course_title = {
        let courses = courses.clone();
        move |id: &Option<String>| match id {
            Some(id) => courses
                .iter()
                .find(|c| &c.id == id)
                .map(|c| c.title.clone())
                .unwrap_or_else(|| id.clone()),
            None => "Free".to_string(),
        }
    };

    let cmd_tx_save = cmd_tx.clone();
    let save = move |_| {
        let Some(current) = draft() else { return };
        match current.build() {
            Ok(exam) => {
                save_record(&cmd_tx_save, Resource::Exams, current.id.clone(), &exam);
                draft.set(None);
                error.set(None);
            }
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    rsx! {
        div { class: "page-header",
            div { class: "flex justify-between items-center",
                h1 { class: "page-title", "Exams" }
                button {
                    class: "btn btn-primary",
                    onclick: move |_| {
                        draft.set(Some(ExamDraft::default()));
                        error.set(None);
                    },
                    "+ New exam"
                }
            }
        }

        if let Some(current) = draft() {
            div { class: "panel mb-6",
                div { class: "panel-header",
                    h2 { class: "panel-title", if current.id.is_some() { "Edit exam" } else { "New exam" } }
                }
                div { class: "grid md:grid-cols-2 gap-4",
                    div { class: "form-group",
                        label { class: "form-label", "Title" }
                        input {
                            class: "input",
                            value: "{current.title}",
                            oninput: move |e| draft.with_mut(|d| if let Some(d) = d { d.title = e.value() })
                        }
                    }
                    div { class: "form-group",
                        label { class: "form-label", "Course" }
                        select {
                            class: "input",
                            value: "{current.course_id}",
                            onchange: move |e| draft.with_mut(|d| if let Some(d) = d { d.course_id = e.value() }),
                            option { value: "", selected: current.course_id.is_empty(), "Free for everyone" }
                            for course in courses.iter() {
                                option {
                                    key: "{course.id}",
                                    value: "{course.id}",
                                    selected: current.course_id == course.id,
                                    "{course.title}"
                                }
                            }
                        }
                    }
                }
                div { class: "form-group",
                    label { class: "form-label", "Description" }
                    textarea {
                        class: "input min-h-[60px]",
                        value: "{current.description}",
                        oninput: move |e| draft.with_mut(|d| if let Some(d) = d { d.description = e.value() })
                    }
                }

                div { class: "flex justify-between items-center mb-2",
                    h3 { class: "font-semibold", "Sections" }
                    button {
                        class: "btn btn-secondary btn-sm",
                        onclick: move |_| draft.with_mut(|d| if let Some(d) = d {
                            d.sections.push(SectionDraft { duration: "30".into(), ..Default::default() });
                        }),
                        "+ Add section"
                    }
                }
                for idx in 0..current.sections.len() {
                    SectionEditor { key: "{idx}", draft: draft, index: idx }
                }

                if let Some(message) = error() {
                    p { class: "text-sm text-[var(--danger)] my-3", "{message}" }
                }
                div { class: "flex gap-2 mt-4",
                    button { class: "btn btn-primary", onclick: save, "Save" }
                    button { class: "btn btn-secondary", onclick: move |_| draft.set(None), "Cancel" }
                }
            }
        }

        if exams.is_empty() {
            EmptyState { icon: "📝", message: "No exams yet." }
        } else {
            div { class: "panel overflow-x-auto",
                table { class: "table",
                    thead {
                        tr {
                            th { "Title" }
                            th { "Course" }
                            th { "Sections" }
                            th { "Questions" }
                            th { "Minutes" }
                            th {}
                        }
                    }
                    tbody {
                        for exam in exams {
                            {
                                let cmd_tx = cmd_tx.clone();
                                let editing = ExamDraft::from_exam(&exam);
                                let exam_id = exam.id.clone();
                                let course = course_title(&exam.course_id);
                                rsx! {
                                    tr { key: "{exam.id}",
                                        td { class: "font-medium", "{exam.title}" }
                                        td { "{course}" }
                                        td { "{exam.sections.len()}" }
                                        td { "{exam.question_count()}" }
                                        td { "{exam.total_minutes()}" }
                                        td { class: "flex gap-2 justify-end",
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| {
                                                    draft.set(Some(editing.clone()));
                                                    error.set(None);
                                                },
                                                "Edit"
                                            }
                                            button {
                                                class: "btn btn-secondary btn-sm",
                                                onclick: move |_| delete_record(&cmd_tx, Resource::Exams, exam_id.clone()),
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
}

#[component]
fn SectionEditor(draft: Signal<Option<ExamDraft>>, index: usize) -> Element {
    let app_state = use_context::<AppState>();
    let mut draft = draft;

    let Some(section) = draft.read().as_ref().and_then(|d| d.sections.get(index).cloned()) else {
        return rsx! {};
    };
    let questions = app_state.questions.read().clone();
    let mut edit = move |f: &dyn Fn(&mut SectionDraft)| {
        draft.with_mut(|d| {
            if let Some(section) = d.as_mut().and_then(|d| d.sections.get_mut(index)) {
                f(section);
            }
        })
    };

    rsx! {
        div { class: "card mb-3",
            div { class: "grid md:grid-cols-[1fr_160px_120px_auto] gap-3 items-end",
                div { class: "form-group",
                    label { class: "form-label", "Name" }
                    input {
                        class: "input",
                        value: "{section.name}",
                        oninput: move |e| edit(&|s: &mut SectionDraft| s.name = e.value())
                    }
                }
                div { class: "form-group",
                    label { class: "form-label", "Part" }
                    select {
                        class: "input",
                        onchange: move |e| edit(&|s: &mut SectionDraft| s.kind = SectionKind::parse(&e.value())),
                        for kind in SectionKind::ALL {
                            option {
                                key: "{kind.label()}",
                                value: "{kind.label()}",
                                selected: section.kind == kind,
                                "{kind.label()}"
                            }
                        }
                    }
                }
                div { class: "form-group",
                    label { class: "form-label", "Minutes" }
                    input {
                        class: "input",
                        inputmode: "numeric",
                        value: "{section.duration}",
                        oninput: move |e| edit(&|s: &mut SectionDraft| s.duration = e.value())
                    }
                }
                button {
                    class: "btn btn-secondary btn-sm mb-4",
                    onclick: move |_| draft.with_mut(|d| if let Some(d) = d {
                        if index < d.sections.len() {
                            d.sections.remove(index);
                        }
                    }),
                    "Remove"
                }
            }

            label { class: "form-label", "Questions ({section.question_ids.len()} selected)" }
            if questions.is_empty() {
                p { class: "text-sm text-[var(--text-muted)]", "Create questions first." }
            }
            div { class: "max-h-48 overflow-y-auto space-y-1",
                for question in questions {
                    {
                        let checked = section.question_ids.contains(&question.id);
                        let question_id = question.id.clone();
                        rsx! {
                            label { key: "{question.id}", class: "flex items-center gap-2 text-sm cursor-pointer",
                                input {
                                    r#type: "checkbox",
                                    checked: checked,
                                    onchange: move |e| {
                                        let on = e.checked();
                                        let id = question_id.clone();
                                        edit(&move |s: &mut SectionDraft| {
                                            s.question_ids.retain(|q| q != &id);
                                            if on {
                                                s.question_ids.push(id.clone());
                                            }
                                        })
                                    }
                                }
                                span { class: "badge", "{question.body.label()}" }
                                span { class: "truncate", "{question.prompt}" }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_draft_validation() {
        let mut draft = CourseDraft::blank();
        assert!(draft.build().is_err());

        draft.title = " PTE Academic Full ".into();
        draft.price = "1500".into();
        let course = draft.build().expect("Failed to build course");
        assert_eq!(course.title, "PTE Academic Full");
        assert_eq!(course.price, 1500.0);
        assert!(course.is_active);
        assert!(course.id.is_empty());

        draft.price = "-3".into();
        assert!(draft.build().is_err());
    }

    #[test]
    fn test_course_draft_keeps_id() {
        let course = Course {
            id: "c1".into(),
            title: "Core".into(),
            description: String::new(),
            price: 999.5,
            is_active: false,
        };
        let draft = CourseDraft::from_course(&course);
        assert_eq!(draft.price, "999.5");
        assert_eq!(draft.build().expect("Failed to rebuild course"), course);
    }

    #[test]
    fn test_exam_draft_sections() {
        let mut draft = ExamDraft {
            title: "Mock 1".into(),
            ..Default::default()
        };
        assert!(draft.build().is_err(), "exam without sections");

        draft.sections.push(SectionDraft {
            name: String::new(),
            kind: SectionKind::Writing,
            duration: "20".into(),
            question_ids: vec![],
        });
        assert!(draft.build().is_err(), "section without questions");

        draft.sections[0].question_ids.push("q1".into());
        draft.sections[0].duration = "0".into();
        assert!(draft.build().is_err(), "zero duration");

        draft.sections[0].duration = "20".into();
        let exam = draft.build().expect("Failed to build exam");
        assert_eq!(exam.sections[0].name, "Writing");
        assert_eq!(exam.course_id, None);
        assert_eq!(exam.total_minutes(), 20);

        draft.course_id = "c1".into();
        assert_eq!(draft.build().expect("Failed to build exam").course_id, Some("c1".into()));
    }
}
