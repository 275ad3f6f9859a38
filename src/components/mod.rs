pub mod admin_page;
pub mod admin_catalog_page;
pub mod admin_content_page;
pub mod admin_grading_page;
pub mod admin_people_page;
pub mod auth_page;
pub mod common;
pub mod exam_list_page;
pub mod forms;
pub mod give_exam_page;
pub mod home_page;
pub mod learn_page;
pub mod nav_bar;
pub mod payment_page;
pub mod results_page;
pub mod speaking_page;

use std::collections::HashSet;

use dioxus::prelude::*;

use crate::backend::esewa::PaymentForm;
use crate::backend::models::{
    Course, Exam, ExamResult, Payment, Question, ReadingMaterial, SpeakingQuestion, SpeakingResponse, User,
};
use crate::backend::session::ExamSession;
use crate::backend::{AppEvent, Notice};

const MAX_NOTICES: usize = 4;

#[derive(Clone, Copy)]
pub struct AppState {
    pub ready: Signal<bool>,
    pub user: Signal<Option<User>>,
    pub notices: Signal<Vec<Notice>>,

    pub courses: Signal<Vec<Course>>,
    pub exams: Signal<Vec<Exam>>,
    pub reading_materials: Signal<Vec<ReadingMaterial>>,
    pub questions: Signal<Vec<Question>>,
    pub users: Signal<Vec<User>>,
    pub payments: Signal<Vec<Payment>>,
    pub speaking_questions: Signal<Vec<SpeakingQuestion>>,
    pub speaking_responses: Signal<Vec<SpeakingResponse>>,

    // Exam flow
    pub current_exam: Signal<Option<Exam>>,
    pub session: Signal<Option<ExamSession>>,
    pub remaining_seconds: Signal<i64>,
    pub last_result: Signal<Option<ExamResult>>,
    pub my_results: Signal<Vec<ExamResult>>,
    pub all_results: Signal<Vec<ExamResult>>,
    pub pending_uploads: Signal<usize>,

    pub submitted_speaking: Signal<HashSet<String>>,

    // Payment
    pub payment_form: Signal<Option<PaymentForm>>,
    pub last_payment: Signal<Option<Payment>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            ready: use_signal(|| false),
            user: use_signal(|| None),
            notices: use_signal(Vec::new),
            courses: use_signal(Vec::new),
            exams: use_signal(Vec::new),
            reading_materials: use_signal(Vec::new),
            questions: use_signal(Vec::new),
            users: use_signal(Vec::new),
            payments: use_signal(Vec::new),
            speaking_questions: use_signal(Vec::new),
            speaking_responses: use_signal(Vec::new),
            current_exam: use_signal(|| None),
            session: use_signal(|| None),
            remaining_seconds: use_signal(|| 0),
            last_result: use_signal(|| None),
            my_results: use_signal(Vec::new),
            all_results: use_signal(Vec::new),
            pending_uploads: use_signal(|| 0),
            submitted_speaking: use_signal(HashSet::new),
            payment_form: use_signal(|| None),
            last_payment: use_signal(|| None),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user.read().as_ref().is_some_and(|u| u.is_admin())
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        let mut notices = self.notices.write();
        if index < notices.len() {
            notices.remove(index);
        }
    }

    /// Folds one backend event into the signals.
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Ready => self.ready.set(true),
            AppEvent::SignedIn(user) => self.user.set(Some(user)),
            AppEvent::SignedOut => {
                self.user.set(None);
                self.my_results.set(vec![]);
                self.last_result.set(None);
                self.payment_form.set(None);
            }
            AppEvent::CoursesFetched(courses) => self.courses.set(courses),
            AppEvent::ExamsFetched(exams) => self.exams.set(exams),
            AppEvent::ReadingMaterialsFetched(materials) => self.reading_materials.set(materials),
            AppEvent::QuestionsFetched(questions) => self.questions.set(questions),
            AppEvent::UsersFetched(users) => self.users.set(users),
            AppEvent::PaymentsFetched(payments) => self.payments.set(payments),
            AppEvent::MyResultsFetched(results) => self.my_results.set(results),
            AppEvent::AllResultsFetched(results) => self.all_results.set(results),
            AppEvent::SpeakingQuestionsFetched(questions) => self.speaking_questions.set(questions),
            AppEvent::SpeakingResponsesFetched(responses) => self.speaking_responses.set(responses),
            AppEvent::CurrentExam(exam) => self.current_exam.set(exam),
            AppEvent::SessionUpdated(session) => {
                if session.is_some() {
                    self.last_result.set(None);
                }
                self.session.set(session);
            }
            AppEvent::TimerTick(seconds) => self.remaining_seconds.set(seconds),
            AppEvent::ExamSubmitted(result) => self.last_result.set(Some(result)),
            AppEvent::PendingUploads(count) => self.pending_uploads.set(count),
            AppEvent::SpeakingSubmitted(question_id) => {
                self.submitted_speaking.write().insert(question_id);
            }
            AppEvent::PaymentFormReady(form) => self.payment_form.set(Some(form)),
            AppEvent::PaymentVerified(payment) => {
                self.payment_form.set(None);
                self.last_payment.set(Some(payment));
            }
            AppEvent::Notice(notice) => {
                let mut notices = self.notices.write();
                notices.push(notice);
                let overflow = notices.len().saturating_sub(MAX_NOTICES);
                notices.drain(..overflow);
            }
        }
    }
}
