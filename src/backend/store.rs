#[cfg(not(target_arch = "wasm32"))]
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::backend::error::{AppError, AppResult};
use crate::backend::models::{AuthSession, Exam, ExamResult, Payment};
use crate::backend::session::ExamSession;

const AUTH_KEY: &str = "auth";
const CURRENT_EXAM_KEY: &str = "current_exam";
const EXAM_SESSION_KEY: &str = "exam_session";
const PENDING_RESULTS_KEY: &str = "pending_results";
const PENDING_PAYMENT_KEY: &str = "pending_payment";

/// Persisted key-value storage. SQLite natively, `localStorage` in the browser.
#[derive(Clone)]
pub struct Store {
    #[cfg(not(target_arch = "wasm32"))]
    conn: std::sync::Arc<std::sync::Mutex<Connection>>,
    #[cfg(target_arch = "wasm32")]
    namespace: String,
}

impl Store {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> AppResult<Self> {
        Self::init(Connection::open(path)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: std::sync::Arc::new(std::sync::Mutex::new(conn)) })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(namespace: &str) -> AppResult<Self> {
        Ok(Self { namespace: namespace.to_string() })
    }

    #[cfg(target_arch = "wasm32")]
    fn local_storage(&self) -> AppResult<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| AppError::Storage("no window".to_string()))?
            .local_storage()
            .map_err(|e| AppError::Storage(format!("{:?}", e)))?
            .ok_or_else(|| AppError::Storage("localStorage unavailable".to_string()))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| AppError::Storage(e.to_string()))?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    #[cfg(target_arch = "wasm32")]
    fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        self.local_storage()?
            .get_item(&format!("{}:{}", self.namespace, key))
            .map_err(|e| AppError::Storage(format!("{:?}", e)))
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn put_raw(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|e| AppError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn put_raw(&self, key: &str, value: &str) -> AppResult<()> {
        self.local_storage()?
            .set_item(&format!("{}:{}", self.namespace, key), value)
            .map_err(|e| AppError::Storage(format!("{:?}", e)))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn remove(&self, key: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|e| AppError::Storage(e.to_string()))?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    pub fn remove(&self, key: &str) -> AppResult<()> {
        self.local_storage()?
            .remove_item(&format!("{}:{}", self.namespace, key))
            .map_err(|e| AppError::Storage(format!("{:?}", e)))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put_raw(key, &raw)
    }

    // Auth store

    pub fn auth(&self) -> AppResult<Option<AuthSession>> {
        self.get(AUTH_KEY)
    }

    pub fn set_auth(&self, session: &AuthSession) -> AppResult<()> {
        self.put(AUTH_KEY, session)
    }

    pub fn clear_auth(&self) -> AppResult<()> {
        self.remove(AUTH_KEY)
    }

    // Exam store

    pub fn current_exam(&self) -> AppResult<Option<Exam>> {
        self.get(CURRENT_EXAM_KEY)
    }

    pub fn set_current_exam(&self, exam: &Exam) -> AppResult<()> {
        self.put(CURRENT_EXAM_KEY, exam)
    }

    pub fn exam_session(&self) -> AppResult<Option<ExamSession>> {
        self.get(EXAM_SESSION_KEY)
    }

    pub fn set_exam_session(&self, session: &ExamSession) -> AppResult<()> {
        self.put(EXAM_SESSION_KEY, session)
    }

    /// Drops the selected exam together with any session in progress.
    pub fn clear_exam(&self) -> AppResult<()> {
        self.remove(EXAM_SESSION_KEY)?;
        self.remove(CURRENT_EXAM_KEY)
    }

    pub fn pending_results(&self) -> AppResult<Vec<ExamResult>> {
        Ok(self.get(PENDING_RESULTS_KEY)?.unwrap_or_default())
    }

    pub fn push_pending_result(&self, result: &ExamResult) -> AppResult<()> {
        let mut pending = self.pending_results()?;
        pending.push(result.clone());
        self.put(PENDING_RESULTS_KEY, &pending)
    }

    pub fn set_pending_results(&self, results: &[ExamResult]) -> AppResult<()> {
        if results.is_empty() {
            self.remove(PENDING_RESULTS_KEY)
        } else {
            self.put(PENDING_RESULTS_KEY, &results)
        }
    }

    // Payment

    pub fn pending_payment(&self) -> AppResult<Option<Payment>> {
        self.get(PENDING_PAYMENT_KEY)
    }

    pub fn set_pending_payment(&self, payment: &Payment) -> AppResult<()> {
        self.put(PENDING_PAYMENT_KEY, payment)
    }

    pub fn clear_pending_payment(&self) -> AppResult<()> {
        self.remove(PENDING_PAYMENT_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::models::{Role, User};
    use tempfile::tempdir;

    fn auth() -> AuthSession {
        AuthSession {
            user: User {
                id: "u1".into(),
                name: "Asha".into(),
                email: "asha@example.com".into(),
                phone: None,
                role: Role::User,
                is_paid: false,
            },
            token: "token-123".into(),
        }
    }

    #[test]
    fn test_store_put_get_remove() {
        let store = Store::new_in_memory().expect("Failed to create store");
        assert!(store.auth().unwrap().is_none());

        store.set_auth(&auth()).expect("Failed to save auth");
        assert_eq!(store.auth().unwrap(), Some(auth()));

        store.clear_auth().unwrap();
        assert!(store.auth().unwrap().is_none());
    }

    #[test]
    fn test_store_persists_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");

        {
            let store = Store::new(&path).expect("Failed to open store");
            store.set_auth(&auth()).unwrap();
        }

        let reopened = Store::new(&path).expect("Failed to reopen store");
        assert_eq!(reopened.auth().unwrap().map(|a| a.token), Some("token-123".to_string()));
    }

    #[test]
    fn test_clear_exam_removes_session_and_selection() {
        let store = Store::new_in_memory().unwrap();
        let exam = Exam {
            id: "e1".into(),
            title: "Mock".into(),
            description: String::new(),
            course_id: None,
            sections: vec![],
        };
        store.set_current_exam(&exam).unwrap();
        store.put(EXAM_SESSION_KEY, &"placeholder").unwrap();

        store.clear_exam().unwrap();
        assert!(store.current_exam().unwrap().is_none());
        assert!(store.get::<String>(EXAM_SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_value_surfaces_error() {
        let store = Store::new_in_memory().unwrap();
        store.put_raw(AUTH_KEY, "{not json").unwrap();
        assert!(matches!(store.auth(), Err(AppError::Serialization(_))));
    }
}
