mod backend;
mod components;
mod config;

use components::admin_catalog_page::{AdminCoursesComponent, AdminExamsComponent};
use components::admin_content_page::{AdminQuestionsComponent, AdminReadingComponent};
use components::admin_grading_page::AdminGradingComponent;
use components::admin_page::{AdminDashboardComponent, AdminLayout};
use components::admin_people_page::{AdminPaymentsComponent, AdminUsersComponent};
use components::auth_page::{LoginComponent, RegisterComponent};
use components::common::NotFoundComponent;
use components::exam_list_page::ExamListComponent;
use components::give_exam_page::GiveExamComponent;
use components::home_page::HomeComponent;
use components::learn_page::LearnComponent;
use components::nav_bar::NavComponent;
use components::payment_page::{PaymentComponent, PaymentFailureComponent, PaymentSuccessComponent};
use components::results_page::ResultsComponent;
use components::speaking_page::SpeakingComponent;
use components::AppState;

use backend::store::Store;
use backend::{AppCmd, Backend, CmdTx};
use config::Config;
use dioxus::prelude::*;
use tokio::sync::mpsc;

#[derive(Routable, Clone, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(NavComponent)]
        #[route("/")]
        HomeComponent {},
        #[route("/login")]
        LoginComponent {},
        #[route("/register")]
        RegisterComponent {},
        #[route("/learn")]
        LearnComponent {},
        #[route("/exams")]
        ExamListComponent {},
        #[route("/give-exam")]
        GiveExamComponent {},
        #[route("/results")]
        ResultsComponent {},
        #[route("/speaking")]
        SpeakingComponent {},
        #[route("/payment")]
        PaymentComponent {},
        #[route("/payment/success?:data")]
        PaymentSuccessComponent { data: String },
        #[route("/payment/failure")]
        PaymentFailureComponent {},
        #[nest("/admin")]
            #[layout(AdminLayout)]
                #[route("/")]
                AdminDashboardComponent {},
                #[route("/users")]
                AdminUsersComponent {},
                #[route("/courses")]
                AdminCoursesComponent {},
                #[route("/exams")]
                AdminExamsComponent {},
                #[route("/questions")]
                AdminQuestionsComponent {},
                #[route("/reading-materials")]
                AdminReadingComponent {},
                #[route("/payments")]
                AdminPaymentsComponent {},
                #[route("/grading")]
                AdminGradingComponent {},
            #[end_layout]
        #[end_nest]
        #[route("/:..segments")]
        NotFoundComponent { segments: Vec<String> },
}

fn main() {
    init_logging();
    dioxus::launch(App);
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let config = Config::from_env();
    let filter = EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Logger already initialized: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    if let Err(e) = dioxus::logger::init(dioxus::logger::tracing::Level::INFO) {
        web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn open_store(config: &Config) -> backend::error::AppResult<Store> {
    Store::new(&config.store_path).or_else(|e| {
        tracing::error!("Could not open {}: {}. Falling back to memory", config.store_path, e);
        Store::new_in_memory()
    })
}

#[cfg(target_arch = "wasm32")]
fn open_store(config: &Config) -> backend::error::AppResult<Store> {
    Store::new(&config.store_path)
}

#[component]
fn App() -> Element {
    let app_state = AppState::new();
    use_context_provider(|| app_state);

    let cmd_tx: CmdTx = use_hook(|| {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let config = Config::from_env();
        tracing::info!(api = %config.api_base_url, "Starting PTE prep client");
        match open_store(&config) {
            Ok(store) => {
                let mut backend = Backend::new(config, store, cmd_rx, event_tx);
                spawn(async move {
                    backend.run().await;
                });
            }
            Err(e) => tracing::error!("Backend not started: {}", e),
        }

        let mut app_state = app_state;
        spawn(async move {
            while let Some(event) = event_rx.recv().await {
                app_state.apply(event);
            }
        });

        if let Err(e) = cmd_tx.send(AppCmd::Init) {
            tracing::error!("Failed to send Init command: {:?}", e);
        }
        cmd_tx
    });
    use_context_provider(|| cmd_tx);

    rsx! {
        document::Script { src: "https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" }
        document::Stylesheet { href: asset!("/assets/main.css") }
        Router::<Route> {}
    }
}
