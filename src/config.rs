// src/config.rs

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_ESEWA_GATEWAY_URL: &str = "https://rc-epay.esewa.com.np/api/epay/main/v2/form";
const DEFAULT_ESEWA_PRODUCT_CODE: &str = "EPAYTEST";
// Public sandbox key published by eSewa for EPAYTEST.
const DEFAULT_ESEWA_SECRET_KEY: &str = "8gBm/:&EnhH.1/q";
const DEFAULT_APP_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub esewa_gateway_url: String,
    pub esewa_product_code: String,
    pub esewa_secret_key: String,
    pub payment_success_url: String,
    pub payment_failure_url: String,
    pub store_path: String,
    pub rust_log: String,
}

impl Config {
    /// Native builds read the process environment (after loading `.env`).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let var = |key: &str, compiled: Option<&'static str>, default: &str| {
            std::env::var(key)
                .ok()
                .or_else(|| compiled.map(str::to_string))
                .unwrap_or_else(|| default.to_string())
        };

        let app_url = var("PTE_APP_URL", option_env!("PTE_APP_URL"), DEFAULT_APP_URL);

        Self {
            api_base_url: var("PTE_API_BASE_URL", option_env!("PTE_API_BASE_URL"), DEFAULT_API_BASE_URL),
            esewa_gateway_url: var("ESEWA_GATEWAY_URL", option_env!("ESEWA_GATEWAY_URL"), DEFAULT_ESEWA_GATEWAY_URL),
            esewa_product_code: var("ESEWA_PRODUCT_CODE", option_env!("ESEWA_PRODUCT_CODE"), DEFAULT_ESEWA_PRODUCT_CODE),
            esewa_secret_key: var("ESEWA_SECRET_KEY", option_env!("ESEWA_SECRET_KEY"), DEFAULT_ESEWA_SECRET_KEY),
            payment_success_url: format!("{}/payment/success", app_url.trim_end_matches('/')),
            payment_failure_url: format!("{}/payment/failure", app_url.trim_end_matches('/')),
            store_path: var("PTE_STORE_PATH", None, "pte_prep.db"),
            rust_log: var("RUST_LOG", None, "info"),
        }
    }

    /// The browser has no process environment, so values are fixed at build time.
    #[cfg(target_arch = "wasm32")]
    pub fn from_env() -> Self {
        let app_url = option_env!("PTE_APP_URL").unwrap_or(DEFAULT_APP_URL);

        Self {
            api_base_url: option_env!("PTE_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL).to_string(),
            esewa_gateway_url: option_env!("ESEWA_GATEWAY_URL").unwrap_or(DEFAULT_ESEWA_GATEWAY_URL).to_string(),
            esewa_product_code: option_env!("ESEWA_PRODUCT_CODE").unwrap_or(DEFAULT_ESEWA_PRODUCT_CODE).to_string(),
            esewa_secret_key: option_env!("ESEWA_SECRET_KEY").unwrap_or(DEFAULT_ESEWA_SECRET_KEY).to_string(),
            payment_success_url: format!("{}/payment/success", app_url.trim_end_matches('/')),
            payment_failure_url: format!("{}/payment/failure", app_url.trim_end_matches('/')),
            store_path: "pte-prep".to_string(),
            rust_log: option_env!("RUST_LOG").unwrap_or("info").to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            esewa_gateway_url: DEFAULT_ESEWA_GATEWAY_URL.to_string(),
            esewa_product_code: DEFAULT_ESEWA_PRODUCT_CODE.to_string(),
            esewa_secret_key: DEFAULT_ESEWA_SECRET_KEY.to_string(),
            payment_success_url: format!("{}/payment/success", DEFAULT_APP_URL),
            payment_failure_url: format!("{}/payment/failure", DEFAULT_APP_URL),
            store_path: "pte_prep.db".to_string(),
            rust_log: "info".to_string(),
        }
    }
}
