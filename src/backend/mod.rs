pub mod api;
pub mod error;
pub mod esewa;
pub mod models;
pub mod scoring;
pub mod session;
pub mod store;

use api::{ApiClient, Resource};
use chrono::Utc;
use error::{AppError, AppResult};
use esewa::{PaymentCallback, PaymentForm};
use models::{
    Answer, Course, Credentials, Exam, ExamResult, Payment, PaymentStatus, Question,
    ReadingMaterial, Registration, SpeakingQuestion, SpeakingResponse, User,
};
use session::{ExamSession, TickOutcome};
use store::Store;
use tokio::sync::mpsc;

use crate::config::Config;

pub type CmdTx = mpsc::UnboundedSender<AppCmd>;

#[derive(Debug)]
pub enum AppCmd {
    Init,
    Login { email: String, password: String },
    Register { name: String, email: String, phone: Option<String>, password: String },
    Logout,

    FetchCourses,
    FetchExams,
    FetchReadingMaterials,
    FetchQuestions,
    FetchUsers,
    FetchPayments,
    FetchMyResults,
    FetchAllResults,
    FetchSpeakingQuestions,
    FetchSpeakingResponses,

    // Exam taking
    SelectExam(Exam),
    StartExam,
    AnswerQuestion { question_id: String, answer: Answer },
    NextQuestion,
    PreviousQuestion,
    GoToQuestion(usize),
    FinishSection,
    SubmitExam,
    AbandonExam,
    UploadPendingResults,

    SubmitSpeakingResponse { question_id: String, mime_type: String, data: String },

    // Payment
    StartPayment { course_id: Option<String>, amount: f64 },
    VerifyPayment { data: String },
    CancelPayment,

    // Admin
    Save { resource: Resource, id: Option<String>, body: serde_json::Value },
    Delete { resource: Resource, id: String },
    AssignMarks { result_id: String, question_id: String, marks: f64, feedback: Option<String> },
    GradeSpeaking { response_id: String, marks: f64, feedback: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    SignedIn(User),
    SignedOut,
    CoursesFetched(Vec<Course>),
    ExamsFetched(Vec<Exam>),
    ReadingMaterialsFetched(Vec<ReadingMaterial>),
    QuestionsFetched(Vec<Question>),
    UsersFetched(Vec<User>),
    PaymentsFetched(Vec<Payment>),
    MyResultsFetched(Vec<ExamResult>),
    AllResultsFetched(Vec<ExamResult>),
    SpeakingQuestionsFetched(Vec<SpeakingQuestion>),
    SpeakingResponsesFetched(Vec<SpeakingResponse>),
    CurrentExam(Option<Exam>),
    SessionUpdated(Option<ExamSession>),
    TimerTick(i64),
    ExamSubmitted(ExamResult),
    PendingUploads(usize),
    SpeakingSubmitted(String),
    PaymentFormReady(PaymentForm),
    PaymentVerified(Payment),
    Notice(Notice),
    /// Saved state has been restored; guards may now decide on redirects.
    Ready,
}

pub struct Backend {
    config: Config,
    api: ApiClient,
    store: Store,
    cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    user: Option<User>,
    session: Option<ExamSession>,
}

impl Backend {
    pub fn new(
        config: Config,
        store: Store,
        cmd_rx: mpsc::UnboundedReceiver<AppCmd>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let api = ApiClient::new(&config.api_base_url);
        Self {
            config,
            api,
            store,
            cmd_rx,
            event_tx,
            user: None,
            session: None,
        }
    }

    pub async fn run(&mut self) {
        #[cfg(not(target_arch = "wasm32"))]
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));

        #[cfg(target_arch = "wasm32")]
        let mut ticker = gloo_timers::future::IntervalStream::new(1000);

        loop {
            tokio::select! {
                biased;
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            tracing::info!("Command channel closed, backend stopping");
                            break;
                        }
                    }
                }
                _ = async {
                    #[cfg(not(target_arch = "wasm32"))]
                    {
                        ticker.tick().await;
                    }
                    #[cfg(target_arch = "wasm32")]
                    {
                        use futures::StreamExt;
                        ticker.next().await;
                    }
                } => {
                    if let Err(e) = self.on_tick().await {
                        self.report(e);
                    }
                }
            }
        }
    }

    fn emit(&self, event: AppEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("UI event channel closed");
        }
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(AppEvent::Notice(Notice { level, message: message.into() }));
    }

    fn report(&mut self, error: AppError) {
        tracing::error!("{}", error);
        if matches!(error, AppError::Unauthenticated) {
            if let Err(e) = self.expire_login() {
                tracing::error!("Failed to clear session: {}", e);
            }
            self.notice(NoticeLevel::Error, "Your session has expired. Please log in again.");
            return;
        }
        self.notice(NoticeLevel::Error, error.to_string());
    }

    fn require_user(&self) -> AppResult<&User> {
        self.user.as_ref().ok_or(AppError::Unauthenticated)
    }

    async fn handle_command(&mut self, cmd: AppCmd) {
        tracing::debug!(?cmd, "Handling command");
        if let Err(e) = self.dispatch(cmd).await {
            self.report(e);
        }
    }

    async fn dispatch(&mut self, cmd: AppCmd) -> AppResult<()> {
        match cmd {
            AppCmd::Init => {
                let restored = self.restore();
                self.emit(AppEvent::Ready);
                restored
            }
            AppCmd::Login { email, password } => {
                let session = self.api.login(&Credentials { email, password }).await?;
                self.sign_in(session)
            }
            AppCmd::Register { name, email, phone, password } => {
                if password.chars().count() < 6 {
                    return Err(AppError::Validation("password must be at least 6 characters".into()));
                }
                let session = self
                    .api
                    .register(&Registration { name, email, phone, password })
                    .await?;
                self.sign_in(session)
            }
            AppCmd::Logout => {
                self.sign_out()?;
                self.notice(NoticeLevel::Info, "Logged out");
                Ok(())
            }

            AppCmd::FetchCourses => self.refresh(Resource::Courses).await,
            AppCmd::FetchExams => self.refresh(Resource::Exams).await,
            AppCmd::FetchReadingMaterials => self.refresh(Resource::ReadingMaterials).await,
            AppCmd::FetchQuestions => self.refresh(Resource::Questions).await,
            AppCmd::FetchUsers => self.refresh(Resource::Users).await,
            AppCmd::FetchPayments => self.refresh(Resource::Payments).await,
            AppCmd::FetchAllResults => self.refresh(Resource::ExamResults).await,
            AppCmd::FetchSpeakingQuestions => self.refresh(Resource::SpeakingQuestions).await,
            AppCmd::FetchSpeakingResponses => self.refresh(Resource::SpeakingResponses).await,
            AppCmd::FetchMyResults => {
                let user_id = self.require_user()?.id.clone();
                let results = self
                    .api
                    .list_where(Resource::ExamResults, &[("user_id", user_id.as_str())])
                    .await?;
                self.emit(AppEvent::MyResultsFetched(results));
                Ok(())
            }

            AppCmd::SelectExam(exam) => self.select_exam(exam),
            AppCmd::StartExam => self.start_exam().await,
            AppCmd::AnswerQuestion { question_id, answer } => {
                self.update_session(|s| s.record_answer(&question_id, answer))
            }
            AppCmd::NextQuestion => self.update_session(|s| {
                s.next_question();
                Ok(())
            }),
            AppCmd::PreviousQuestion => self.update_session(|s| {
                s.previous_question();
                Ok(())
            }),
            AppCmd::GoToQuestion(index) => self.update_session(|s| {
                s.go_to_question(index);
                Ok(())
            }),
            AppCmd::FinishSection => {
                let now = Utc::now();
                let is_last = self.session.as_ref().map(|s| s.is_last_section());
                match is_last {
                    None => Err(AppError::Exam("no exam in progress".into())),
                    Some(true) => self.submit_exam().await,
                    Some(false) => self.update_session(|s| {
                        s.advance_section(now);
                        Ok(())
                    }),
                }
            }
            AppCmd::SubmitExam => self.submit_exam().await,
            AppCmd::AbandonExam => {
                self.session = None;
                self.store.clear_exam()?;
                self.emit(AppEvent::SessionUpdated(None));
                self.emit(AppEvent::CurrentExam(None));
                Ok(())
            }
            AppCmd::UploadPendingResults => self.upload_pending_results().await,

            AppCmd::SubmitSpeakingResponse { question_id, mime_type, data } => {
                self.submit_speaking(question_id, mime_type, data).await
            }

            AppCmd::StartPayment { course_id, amount } => self.start_payment(course_id, amount).await,
            AppCmd::VerifyPayment { data } => self.verify_payment(&data).await,
            AppCmd::CancelPayment => self.cancel_payment().await,

            AppCmd::Save { resource, id, body } => {
                self.api.save(resource, id.as_deref(), &body).await?;
                self.notice(NoticeLevel::Success, "Saved successfully");
                self.refresh(resource).await
            }
            AppCmd::Delete { resource, id } => {
                self.api.destroy(resource, &id).await?;
                self.notice(NoticeLevel::Success, "Deleted successfully");
                self.refresh(resource).await
            }
            AppCmd::AssignMarks { result_id, question_id, marks, feedback } => {
                let mut result: ExamResult = self.api.details(Resource::ExamResults, &result_id).await?;
                scoring::assign_marks(&mut result, &question_id, marks, feedback)?;
                self.api.save(Resource::ExamResults, Some(&result_id), &result).await?;
                self.notice(NoticeLevel::Success, format!("Marks saved ({:.1}/{:.1})", result.total_score, result.max_score));
                self.refresh(Resource::ExamResults).await
            }
            AppCmd::GradeSpeaking { response_id, marks, feedback } => {
                if !marks.is_finite() || marks < 0.0 {
                    return Err(AppError::Grading("marks cannot be negative".into()));
                }
                let body = serde_json::json!({ "marks": marks, "feedback": feedback });
                self.api.save(Resource::SpeakingResponses, Some(&response_id), &body).await?;
                self.notice(NoticeLevel::Success, "Speaking response graded");
                self.refresh(Resource::SpeakingResponses).await
            }
        }
    }

    fn restore(&mut self) -> AppResult<()> {
        if let Some(auth) = self.store.auth()? {
            tracing::info!(user = %auth.user.email, "Restored saved login");
            self.api.set_token(Some(auth.token));
            self.user = Some(auth.user.clone());
            self.emit(AppEvent::SignedIn(auth.user));
        }

        self.emit(AppEvent::CurrentExam(self.store.current_exam()?));

        self.load_session()?;
        let (mine, _) = self.pending_results()?;
        self.emit(AppEvent::PendingUploads(mine.len()));
        Ok(())
    }

    /// Picks up a stored exam session only when it belongs to the signed-in user.
    fn load_session(&mut self) -> AppResult<()> {
        let user_id = match &self.user {
            Some(user) => user.id.clone(),
            None => return Ok(()),
        };
        match self.store.exam_session()? {
            Some(session) if session.user_id == user_id => {
                tracing::info!(exam = %session.exam.id, "Restored exam session in progress");
                self.session = Some(session);
            }
            Some(session) => {
                tracing::warn!(exam = %session.exam.id, "Dropping exam session left by another account");
                self.session = None;
                self.store.clear_exam()?;
                self.emit(AppEvent::CurrentExam(None));
            }
            None => self.session = None,
        }
        self.emit(AppEvent::SessionUpdated(self.session.clone()));
        Ok(())
    }

    fn sign_in(&mut self, auth: models::AuthSession) -> AppResult<()> {
        self.store.set_auth(&auth)?;
        self.api.set_token(Some(auth.token.clone()));
        self.user = Some(auth.user.clone());

        if let Some(payment) = self.store.pending_payment()? {
            if payment.user_id != auth.user.id {
                tracing::warn!(transaction = %payment.transaction_uuid, "Dropping payment started by another account");
                self.store.clear_pending_payment()?;
            }
        }
        self.load_session()?;
        let (mine, _) = self.pending_results()?;
        self.emit(AppEvent::PendingUploads(mine.len()));

        self.notice(NoticeLevel::Success, format!("Welcome, {}", auth.user.name));
        self.emit(AppEvent::SignedIn(auth.user));
        Ok(())
    }

    /// Explicit logout: nothing of this user stays on the device except results not yet uploaded.
    fn sign_out(&mut self) -> AppResult<()> {
        self.store.clear_exam()?;
        self.store.clear_pending_payment()?;
        self.emit(AppEvent::CurrentExam(None));
        self.expire_login()
    }

    /// The server rejected the token. The exam in progress stays stored for the next login.
    fn expire_login(&mut self) -> AppResult<()> {
        self.api.set_token(None);
        self.user = None;
        self.session = None;
        self.store.clear_auth()?;
        self.emit(AppEvent::SessionUpdated(None));
        self.emit(AppEvent::PendingUploads(0));
        self.emit(AppEvent::SignedOut);
        Ok(())
    }

    /// Stored results split into the signed-in user's and everyone else's.
    fn pending_results(&self) -> AppResult<(Vec<ExamResult>, Vec<ExamResult>)> {
        let user_id = self.user.as_ref().map(|u| u.id.as_str());
        Ok(self
            .store
            .pending_results()?
            .into_iter()
            .partition(|r| Some(r.user_id.as_str()) == user_id))
    }

    async fn refresh(&mut self, resource: Resource) -> AppResult<()> {
        let event = match resource {
            Resource::Users => AppEvent::UsersFetched(self.api.list(resource).await?),
            Resource::Courses => AppEvent::CoursesFetched(self.api.list(resource).await?),
            Resource::Exams => AppEvent::ExamsFetched(self.api.list(resource).await?),
            Resource::Questions => AppEvent::QuestionsFetched(self.api.list(resource).await?),
            Resource::ReadingMaterials => AppEvent::ReadingMaterialsFetched(self.api.list(resource).await?),
            Resource::ExamResults => AppEvent::AllResultsFetched(self.api.list(resource).await?),
            Resource::Payments => AppEvent::PaymentsFetched(self.api.list(resource).await?),
            Resource::SpeakingQuestions => AppEvent::SpeakingQuestionsFetched(self.api.list(resource).await?),
            Resource::SpeakingResponses => AppEvent::SpeakingResponsesFetched(self.api.list(resource).await?),
        };
        self.emit(event);
        Ok(())
    }

    fn select_exam(&mut self, exam: Exam) -> AppResult<()> {
        if let Some(active) = &self.session {
            if active.exam.id != exam.id {
                return Err(AppError::Exam(format!(
                    "'{}' is still in progress; submit or abandon it first",
                    active.exam.title
                )));
            }
        }
        self.store.set_current_exam(&exam)?;
        self.emit(AppEvent::CurrentExam(Some(exam)));
        Ok(())
    }

    async fn resolve_questions(&self, exam: &mut Exam) -> AppResult<()> {
        for section in exam.sections.iter_mut().filter(|s| !s.is_resolved()) {
            let mut questions = Vec::with_capacity(section.question_ids.len());
            for id in &section.question_ids {
                questions.push(self.api.details::<Question>(Resource::Questions, id).await?);
            }
            section.questions = questions;
        }
        Ok(())
    }

    async fn start_exam(&mut self) -> AppResult<()> {
        let user_id = self.require_user()?.id.clone();

        if let Some(session) = &self.session {
            tracing::info!(exam = %session.exam.id, "Resuming exam session");
            self.emit(AppEvent::SessionUpdated(Some(session.clone())));
            return self.on_tick().await;
        }

        let mut exam = self
            .store
            .current_exam()?
            .ok_or_else(|| AppError::Exam("no exam selected".into()))?;
        self.resolve_questions(&mut exam).await?;

        let now = Utc::now();
        let session = ExamSession::start(exam, &user_id, now)?;
        self.store.set_exam_session(&session)?;
        self.emit(AppEvent::TimerTick(session.timer.remaining(now).num_seconds()));
        self.emit(AppEvent::SessionUpdated(Some(session.clone())));
        self.session = Some(session);
        Ok(())
    }

    fn update_session<F>(&mut self, change: F) -> AppResult<()>
    where
        F: FnOnce(&mut ExamSession) -> AppResult<()>,
    {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| AppError::Exam("no exam in progress".into()))?;
        change(session)?;
        self.store.set_exam_session(session)?;
        let snapshot = session.clone();
        self.emit(AppEvent::SessionUpdated(Some(snapshot)));
        Ok(())
    }

    async fn on_tick(&mut self) -> AppResult<()> {
        let now = Utc::now();
        let outcome = match self.session.as_mut() {
            Some(session) => session.tick(now),
            None => return Ok(()),
        };

        match outcome {
            TickOutcome::Running(remaining) => {
                self.emit(AppEvent::TimerTick(remaining.num_seconds()));
                Ok(())
            }
            TickOutcome::SectionAdvanced => {
                if let Some(session) = &self.session {
                    self.store.set_exam_session(session)?;
                    self.notice(
                        NoticeLevel::Info,
                        format!("Time is up. Moving on to {}", session.current_section().name),
                    );
                    self.emit(AppEvent::SessionUpdated(Some(session.clone())));
                }
                Ok(())
            }
            TickOutcome::Finished => {
                self.notice(NoticeLevel::Info, "Time is up. Your exam has been submitted.");
                self.submit_exam().await
            }
        }
    }

    async fn submit_exam(&mut self) -> AppResult<()> {
        let session = self
            .session
            .take()
            .ok_or_else(|| AppError::Exam("no exam in progress".into()))?;

        let result = session.finish(Utc::now());
        tracing::info!(
            exam = %result.exam_id,
            auto_score = result.auto_score,
            max_score = result.max_score,
            "Exam submitted"
        );

        self.store.push_pending_result(&result)?;
        self.store.clear_exam()?;
        self.emit(AppEvent::SessionUpdated(None));
        self.emit(AppEvent::CurrentExam(None));
        self.emit(AppEvent::ExamSubmitted(result));

        self.upload_pending_results().await
    }

    /// Results stay in local storage until the server accepts them.
    async fn upload_pending_results(&mut self) -> AppResult<()> {
        let (pending, others) = self.pending_results()?;
        if pending.is_empty() {
            self.emit(AppEvent::PendingUploads(0));
            return Ok(());
        }

        let mut remaining = Vec::new();
        for result in pending {
            match self.api.save(Resource::ExamResults, None, &result).await {
                Ok(()) => tracing::info!(exam = %result.exam_id, "Uploaded exam result"),
                Err(e) => {
                    tracing::warn!(exam = %result.exam_id, "Result upload failed: {}", e);
                    remaining.push(result);
                }
            }
        }

        let count = remaining.len();
        remaining.extend(others);
        self.store.set_pending_results(&remaining)?;
        self.emit(AppEvent::PendingUploads(count));
        if count == 0 {
            self.notice(NoticeLevel::Success, "Your answers were submitted for review.");
        } else {
            self.notice(
                NoticeLevel::Error,
                "Could not reach the server. Your result is saved on this device and will be uploaded later.",
            );
        }
        Ok(())
    }

    async fn submit_speaking(&mut self, question_id: String, mime_type: String, data: String) -> AppResult<()> {
        if data.is_empty() {
            return Err(AppError::Validation("recording is empty".into()));
        }
        let user_id = self.require_user()?.id.clone();

        let response = SpeakingResponse {
            id: String::new(),
            question_id: question_id.clone(),
            user_id,
            mime_type,
            audio: data,
            submitted_at: Utc::now(),
            marks: None,
            feedback: None,
        };
        self.api.save(Resource::SpeakingResponses, None, &response).await?;
        self.notice(NoticeLevel::Success, "Recording submitted for grading");
        self.emit(AppEvent::SpeakingSubmitted(question_id));
        Ok(())
    }

    async fn start_payment(&mut self, course_id: Option<String>, amount: f64) -> AppResult<()> {
        let user_id = self.require_user()?.id.clone();
        let now = Utc::now();
        let transaction_uuid = esewa::new_transaction_uuid(now);
        let form = PaymentForm::new(&self.config, amount, 0.0, &transaction_uuid)?;

        let mut payment = Payment {
            id: String::new(),
            user_id,
            course_id,
            amount,
            transaction_uuid,
            ref_id: None,
            status: PaymentStatus::Pending,
            created_at: Some(now),
        };
        match self.api.store::<_, Payment>(Resource::Payments, &payment).await {
            Ok(saved) => payment = saved,
            Err(e) => tracing::warn!("Could not record pending payment: {}", e),
        }

        self.store.set_pending_payment(&payment)?;
        self.emit(AppEvent::PaymentFormReady(form));
        Ok(())
    }

    async fn persist_payment(&self, payment: &Payment) -> AppResult<()> {
        let id = (!payment.id.is_empty()).then_some(payment.id.as_str());
        self.api.save(Resource::Payments, id, payment).await
    }

    async fn verify_payment(&mut self, data: &str) -> AppResult<()> {
        let callback = PaymentCallback::decode(data)?;
        callback.verify(&self.config.esewa_secret_key)?;
        let user_id = self.require_user()?.id.clone();

        let mut payment = self
            .store
            .pending_payment()?
            .ok_or_else(|| AppError::Payment("no payment is awaiting confirmation".into()))?;
        if payment.transaction_uuid != callback.transaction_uuid {
            return Err(AppError::Payment("transaction does not match the pending payment".into()));
        }
        if payment.user_id != user_id {
            return Err(AppError::Payment("the pending payment belongs to another account".into()));
        }

        payment.status = PaymentStatus::Complete;
        payment.ref_id = Some(callback.transaction_code.clone());
        self.persist_payment(&payment).await?;
        self.store.clear_pending_payment()?;

        if let Some(mut auth) = self.store.auth()? {
            auth.user.is_paid = true;
            self.store.set_auth(&auth)?;
            self.user = Some(auth.user.clone());
            self.emit(AppEvent::SignedIn(auth.user));
        }

        tracing::info!(transaction = %payment.transaction_uuid, "Payment verified");
        self.notice(NoticeLevel::Success, "Payment successful");
        self.emit(AppEvent::PaymentVerified(payment));
        Ok(())
    }

    async fn cancel_payment(&mut self) -> AppResult<()> {
        if let Some(mut payment) = self.store.pending_payment()? {
            payment.status = PaymentStatus::Failed;
            self.store.clear_pending_payment()?;
            if let Err(e) = self.persist_payment(&payment).await {
                tracing::warn!("Could not mark payment failed: {}", e);
            }
        }
        self.notice(NoticeLevel::Error, "Payment was not completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{AuthSession, QuestionBody, Role, Section, SectionKind};
    use std::time::Duration;

    // Nothing listens on the discard port, so every request fails fast.
    fn offline_config() -> Config {
        Config {
            api_base_url: "http://127.0.0.1:9/api".to_string(),
            ..Config::default()
        }
    }

    fn auth() -> AuthSession {
        AuthSession {
            user: User {
                id: "user-1".into(),
                name: "Sita".into(),
                email: "sita@example.com".into(),
                phone: None,
                role: Role::User,
                is_paid: false,
            },
            token: "token".into(),
        }
    }

    fn exam() -> Exam {
        Exam {
            id: "exam-1".into(),
            title: "Mock Test".into(),
            description: String::new(),
            course_id: None,
            sections: vec![Section {
                name: "Reading".into(),
                kind: SectionKind::Reading,
                duration_minutes: 30,
                question_ids: vec!["q1".into(), "q2".into()],
                questions: vec![
                    Question {
                        id: "q1".into(),
                        prompt: "Capital of Nepal?".into(),
                        marks: None,
                        body: QuestionBody::MultipleChoice {
                            options: vec!["Kathmandu".into(), "Pokhara".into()],
                            correct_answers: vec!["Kathmandu".into()],
                        },
                    },
                    Question {
                        id: "q2".into(),
                        prompt: "Summarize".into(),
                        marks: Some(10.0),
                        body: QuestionBody::SummarizeText {
                            passage: "Long passage".into(),
                            min_words: None,
                            max_words: Some(75),
                        },
                    },
                ],
            }],
        }
    }

    fn spawn_backend(store: Store) -> (CmdTx, mpsc::UnboundedReceiver<AppEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut backend = Backend::new(offline_config(), store, cmd_rx, event_tx);
        tokio::spawn(async move {
            backend.run().await;
        });
        (cmd_tx, event_rx)
    }

    async fn wait_for<F>(event_rx: &mut mpsc::UnboundedReceiver<AppEvent>, mut matches: F) -> AppEvent
    where
        F: FnMut(&AppEvent) -> bool,
    {
        let start = std::time::Instant::now();
        loop {
            if start.elapsed() > Duration::from_secs(10) {
                panic!("Timed out waiting for event");
            }
            if let Ok(Some(event)) = tokio::time::timeout(Duration::from_millis(200), event_rx.recv()).await {
                if matches(&event) {
                    return event;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_exam_flow_keeps_result_when_offline() {
        let store = Store::new_in_memory().unwrap();
        store.set_auth(&auth()).unwrap();
        let (cmd_tx, mut event_rx) = spawn_backend(store.clone());

        cmd_tx.send(AppCmd::Init).unwrap();
        wait_for(&mut event_rx, |e| matches!(e, AppEvent::SignedIn(_))).await;

        cmd_tx.send(AppCmd::SelectExam(exam())).unwrap();
        cmd_tx.send(AppCmd::StartExam).unwrap();
        wait_for(&mut event_rx, |e| matches!(e, AppEvent::SessionUpdated(Some(_)))).await;

        cmd_tx
            .send(AppCmd::AnswerQuestion {
                question_id: "q1".into(),
                answer: Answer::Choices(vec!["Kathmandu".into()]),
            })
            .unwrap();
        cmd_tx
            .send(AppCmd::AnswerQuestion {
                question_id: "q2".into(),
                answer: Answer::Text("A short summary.".into()),
            })
            .unwrap();
        cmd_tx.send(AppCmd::SubmitExam).unwrap();

        let result = match wait_for(&mut event_rx, |e| matches!(e, AppEvent::ExamSubmitted(_))).await {
            AppEvent::ExamSubmitted(result) => result,
            _ => unreachable!(),
        };
        assert_eq!(result.auto_score, 1.0);
        assert_eq!(result.max_score, 11.0);
        assert_eq!(result.status, models::ResultStatus::PendingReview);

        match wait_for(&mut event_rx, |e| matches!(e, AppEvent::PendingUploads(_))).await {
            AppEvent::PendingUploads(count) => assert_eq!(count, 1),
            _ => unreachable!(),
        }
        assert_eq!(store.pending_results().unwrap().len(), 1);
        assert!(store.exam_session().unwrap().is_none());
        assert!(store.current_exam().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_restored_after_reload() {
        let store = Store::new_in_memory().unwrap();
        store.set_auth(&auth()).unwrap();

        let (cmd_tx, mut event_rx) = spawn_backend(store.clone());
        cmd_tx.send(AppCmd::Init).unwrap();
        cmd_tx.send(AppCmd::SelectExam(exam())).unwrap();
        cmd_tx.send(AppCmd::StartExam).unwrap();
        cmd_tx
            .send(AppCmd::AnswerQuestion {
                question_id: "q1".into(),
                answer: Answer::Choices(vec!["Pokhara".into()]),
            })
            .unwrap();
        let first = match wait_for(&mut event_rx, |e| {
            matches!(e, AppEvent::SessionUpdated(Some(s)) if !s.answers.is_empty())
        })
        .await
        {
            AppEvent::SessionUpdated(Some(session)) => session,
            _ => unreachable!(),
        };
        drop(cmd_tx);

        // A fresh backend over the same storage picks up where the page left off.
        let (cmd_tx, mut event_rx) = spawn_backend(store.clone());
        cmd_tx.send(AppCmd::Init).unwrap();
        let restored = match wait_for(&mut event_rx, |e| matches!(e, AppEvent::SessionUpdated(Some(_)))).await {
            AppEvent::SessionUpdated(Some(session)) => session,
            _ => unreachable!(),
        };
        assert_eq!(restored.timer.ends_at, first.timer.ends_at);
        assert_eq!(restored.answers, first.answers);
    }

    #[tokio::test]
    async fn test_start_exam_requires_login() {
        let store = Store::new_in_memory().unwrap();
        let (cmd_tx, mut event_rx) = spawn_backend(store);

        cmd_tx.send(AppCmd::SelectExam(exam())).unwrap();
        cmd_tx.send(AppCmd::StartExam).unwrap();

        wait_for(&mut event_rx, |e| matches!(e, AppEvent::SignedOut)).await;
        match wait_for(&mut event_rx, |e| matches!(e, AppEvent::Notice(_))).await {
            AppEvent::Notice(notice) => assert_eq!(notice.level, NoticeLevel::Error),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_selecting_other_exam_while_in_progress_is_rejected() {
        let store = Store::new_in_memory().unwrap();
        store.set_auth(&auth()).unwrap();
        let (cmd_tx, mut event_rx) = spawn_backend(store.clone());

        cmd_tx.send(AppCmd::Init).unwrap();
        cmd_tx.send(AppCmd::SelectExam(exam())).unwrap();
        cmd_tx.send(AppCmd::StartExam).unwrap();
        wait_for(&mut event_rx, |e| matches!(e, AppEvent::SessionUpdated(Some(_)))).await;

        let mut other = exam();
        other.id = "exam-2".into();
        cmd_tx.send(AppCmd::SelectExam(other)).unwrap();

        match wait_for(&mut event_rx, |e| matches!(e, AppEvent::Notice(_))).await {
            AppEvent::Notice(notice) => {
                assert_eq!(notice.level, NoticeLevel::Error);
                assert!(notice.message.contains("in progress"));
            }
            _ => unreachable!(),
        }
        assert_eq!(store.current_exam().unwrap().map(|e| e.id), Some("exam-1".to_string()));
    }

    fn account(id: &str) -> AuthSession {
        let mut session = auth();
        session.user.id = id.to_string();
        session.user.email = format!("{}@example.com", id);
        session
    }

    fn offline_backend(store: Store) -> (Backend, mpsc::UnboundedReceiver<AppEvent>) {
        let (_cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Backend::new(offline_config(), store, cmd_rx, event_tx), event_rx)
    }

    fn pending_payment(user_id: &str, transaction_uuid: &str) -> Payment {
        Payment {
            id: String::new(),
            user_id: user_id.to_string(),
            course_id: Some("course-1".into()),
            amount: 1000.0,
            transaction_uuid: transaction_uuid.to_string(),
            ref_id: None,
            status: PaymentStatus::Pending,
            created_at: None,
        }
    }

    /// Base64 success payload signed the way the gateway signs it.
    fn success_callback(config: &Config, transaction_uuid: &str) -> String {
        use base64::{engine::general_purpose, Engine as _};

        let fields = "transaction_code,status,total_amount,transaction_uuid,product_code,signed_field_names";
        let message = format!(
            "transaction_code=000AWEO,status=COMPLETE,total_amount=1000.0,transaction_uuid={},product_code={},signed_field_names={}",
            transaction_uuid, config.esewa_product_code, fields
        );
        let callback = PaymentCallback {
            transaction_code: "000AWEO".into(),
            status: "COMPLETE".into(),
            total_amount: serde_json::Value::String("1000.0".into()),
            transaction_uuid: transaction_uuid.to_string(),
            product_code: config.esewa_product_code.clone(),
            signed_field_names: fields.into(),
            signature: esewa::sign(&config.esewa_secret_key, &message).unwrap(),
        };
        general_purpose::STANDARD.encode(serde_json::to_vec(&callback).unwrap())
    }

    fn result_for(user_id: &str) -> ExamResult {
        let session = ExamSession::start(exam(), user_id, Utc::now()).unwrap();
        session.finish(Utc::now())
    }

    #[tokio::test]
    async fn test_expired_token_keeps_exam_in_progress() {
        let store = Store::new_in_memory().unwrap();
        store.set_auth(&auth()).unwrap();
        store.set_current_exam(&exam()).unwrap();
        let mut session = ExamSession::start(exam(), "user-1", Utc::now()).unwrap();
        session.record_answer("q1", Answer::Choices(vec!["Kathmandu".into()])).unwrap();
        store.set_exam_session(&session).unwrap();

        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.restore().unwrap();
        assert!(backend.session.is_some());

        backend.report(AppError::Unauthenticated);
        assert!(backend.user.is_none());
        assert!(store.auth().unwrap().is_none());
        assert_eq!(store.exam_session().unwrap().map(|s| s.answers), Some(session.answers.clone()));

        backend.sign_in(auth()).unwrap();
        assert_eq!(backend.session.as_ref().map(|s| s.answers.len()), Some(1));
    }

    #[tokio::test]
    async fn test_other_account_does_not_inherit_exam_session() {
        let store = Store::new_in_memory().unwrap();
        store.set_current_exam(&exam()).unwrap();
        store
            .set_exam_session(&ExamSession::start(exam(), "user-1", Utc::now()).unwrap())
            .unwrap();

        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.sign_in(account("user-2")).unwrap();
        assert!(backend.session.is_none());
        assert!(store.exam_session().unwrap().is_none());
        assert!(store.current_exam().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_drops_exam_and_payment() {
        let store = Store::new_in_memory().unwrap();
        store.set_auth(&auth()).unwrap();
        store
            .set_exam_session(&ExamSession::start(exam(), "user-1", Utc::now()).unwrap())
            .unwrap();
        store.set_pending_payment(&pending_payment("user-1", "240501-090000-1234")).unwrap();

        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.restore().unwrap();
        backend.dispatch(AppCmd::Logout).await.unwrap();

        assert!(store.exam_session().unwrap().is_none());
        assert!(store.pending_payment().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_results_stay_with_their_owner() {
        let store = Store::new_in_memory().unwrap();
        store.push_pending_result(&result_for("user-1")).unwrap();
        store.push_pending_result(&result_for("user-2")).unwrap();

        let (mut backend, mut event_rx) = offline_backend(store.clone());
        backend.sign_in(account("user-2")).unwrap();
        let (mine, others) = backend.pending_results().unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, "user-2");
        assert_eq!(others[0].user_id, "user-1");

        backend.upload_pending_results().await.unwrap();
        let mut last_count = None;
        while let Ok(event) = event_rx.try_recv() {
            if let AppEvent::PendingUploads(count) = event {
                last_count = Some(count);
            }
        }
        assert_eq!(last_count, Some(1));
        assert_eq!(store.pending_results().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_pending_payment_of_other_account_is_dropped_on_login() {
        let store = Store::new_in_memory().unwrap();
        store.set_pending_payment(&pending_payment("user-1", "240501-090000-1234")).unwrap();

        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.sign_in(account("user-2")).unwrap();
        assert!(store.pending_payment().unwrap().is_none());

        store.set_pending_payment(&pending_payment("user-2", "240501-090000-5678")).unwrap();
        backend.sign_in(account("user-2")).unwrap();
        assert!(store.pending_payment().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verify_payment_without_pending_payment() {
        let store = Store::new_in_memory().unwrap();
        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.sign_in(auth()).unwrap();

        let data = success_callback(&backend.config, "240501-090000-1234");
        let err = backend.verify_payment(&data).await.expect_err("nothing was pending");
        assert!(matches!(err, AppError::Payment(_)));
        assert!(!store.auth().unwrap().unwrap().user.is_paid);
    }

    #[tokio::test]
    async fn test_verify_payment_rejects_other_transaction() {
        let store = Store::new_in_memory().unwrap();
        store.set_pending_payment(&pending_payment("user-1", "240501-090000-1234")).unwrap();
        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.sign_in(auth()).unwrap();

        let data = success_callback(&backend.config, "240501-090000-9999");
        let err = backend.verify_payment(&data).await.expect_err("different transaction");
        assert!(err.to_string().contains("does not match"));
        assert!(store.pending_payment().unwrap().is_some());
        assert!(!store.auth().unwrap().unwrap().user.is_paid);
    }

    #[tokio::test]
    async fn test_verify_payment_rejects_other_account() {
        let store = Store::new_in_memory().unwrap();
        let (mut backend, _event_rx) = offline_backend(store.clone());
        backend.sign_in(account("user-2")).unwrap();
        // Started by someone else after this login.
        store.set_pending_payment(&pending_payment("user-1", "240501-090000-1234")).unwrap();

        let data = success_callback(&backend.config, "240501-090000-1234");
        let err = backend.verify_payment(&data).await.expect_err("payment of another account");
        assert!(err.to_string().contains("another account"));
    }

    #[tokio::test]
    async fn test_register_counts_password_characters() {
        let store = Store::new_in_memory().unwrap();
        let (mut backend, _event_rx) = offline_backend(store);

        // Six bytes but only three characters.
        let err = backend
            .dispatch(AppCmd::Register {
                name: "Sita".into(),
                email: "sita@example.com".into(),
                phone: None,
                password: "ñññ".into(),
            })
            .await
            .expect_err("short password");
        assert!(matches!(err, AppError::Validation(_)));

        // Long enough in characters, so it gets as far as the (unreachable) server.
        let err = backend
            .dispatch(AppCmd::Register {
                name: "Sita".into(),
                email: "sita@example.com".into(),
                phone: None,
                password: "ñññññññ".into(),
            })
            .await
            .expect_err("offline");
        assert!(!matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_logout_clears_saved_login() {
        let store = Store::new_in_memory().unwrap();
        store.set_auth(&auth()).unwrap();
        let (cmd_tx, mut event_rx) = spawn_backend(store.clone());

        cmd_tx.send(AppCmd::Init).unwrap();
        wait_for(&mut event_rx, |e| matches!(e, AppEvent::SignedIn(_))).await;
        cmd_tx.send(AppCmd::Logout).unwrap();
        wait_for(&mut event_rx, |e| matches!(e, AppEvent::SignedOut)).await;

        assert!(store.auth().unwrap().is_none());
    }
}
