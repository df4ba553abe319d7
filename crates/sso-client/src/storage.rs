//! Session persistence backends

use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tracing::debug;

use sso_shared::constants::DEFAULT_COOKIE_MAX_AGE_DAYS;

use crate::config::{SsoConfig, TokenStorage};
use crate::error::ClientError;
use crate::session::ClientSession;

pub trait SessionStorage: Send + Sync {
    fn save(&self, session: &ClientSession) -> Result<(), ClientError>;
    fn load(&self) -> Result<Option<ClientSession>, ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

impl TokenStorage {
    /// Pick the backend once, at client construction.
    pub fn open(self, config: &SsoConfig) -> Box<dyn SessionStorage> {
        match self {
            TokenStorage::LocalStorage => Box::new(FileStorage::new(
                config.storage_dir().join(format!("{}.session.json", config.app_id())),
            )),
            TokenStorage::SessionStorage => Box::new(ProcessStorage::new(config.app_id())),
            TokenStorage::Cookie => {
                Box::new(CookieStorage::new(config.app_url().scheme() == "https"))
            }
            TokenStorage::Memory => Box::new(MemoryStorage::default()),
        }
    }
}

/// JSON file per app, the durable backend.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStorage for FileStorage {
    fn save(&self, session: &ClientSession) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(session)?)?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<ClientSession>, ClientError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

static PROCESS_SESSIONS: LazyLock<DashMap<String, ClientSession>> = LazyLock::new(DashMap::new);

/// Shared by every client in this process with the same app id; nothing
/// outlives the process.
pub struct ProcessStorage {
    app_id: String,
}

impl ProcessStorage {
    pub fn new(app_id: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
        }
    }
}

impl SessionStorage for ProcessStorage {
    fn save(&self, session: &ClientSession) -> Result<(), ClientError> {
        PROCESS_SESSIONS.insert(self.app_id.clone(), session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<ClientSession>, ClientError> {
        Ok(PROCESS_SESSIONS.get(&self.app_id).map(|s| s.clone()))
    }

    fn clear(&self) -> Result<(), ClientError> {
        PROCESS_SESSIONS.remove(&self.app_id);
        Ok(())
    }
}

const ACCESS_TOKEN_COOKIE: &str = "sso_access_token";
const REFRESH_TOKEN_COOKIE: &str = "sso_refresh_token";
const EXPIRES_AT_COOKIE: &str = "sso_expires_at";

/// Keeps the session as three cookies. `set_cookie_headers` yields what
/// changed since the jar was seeded.
pub struct CookieStorage {
    jar: Mutex<CookieJar>,
    secure: bool,
}

impl CookieStorage {
    pub fn new(secure: bool) -> Self {
        Self {
            jar: Mutex::new(CookieJar::new()),
            secure,
        }
    }

    /// Seed from an incoming `Cookie` request header.
    pub fn from_cookie_header(header: &str, secure: bool) -> Self {
        let mut jar = CookieJar::new();
        for cookie in Cookie::split_parse(header.to_string()).flatten() {
            jar.add_original(cookie);
        }
        Self {
            jar: Mutex::new(jar),
            secure,
        }
    }

    pub fn set_cookie_headers(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.lock()?.delta().map(|c| c.to_string()).collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, CookieJar>, ClientError> {
        self.jar
            .lock()
            .map_err(|_| ClientError::Storage("cookie jar lock poisoned".into()))
    }

    fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(CookieDuration::days(DEFAULT_COOKIE_MAX_AGE_DAYS))
            .build()
    }
}

impl SessionStorage for CookieStorage {
    fn save(&self, session: &ClientSession) -> Result<(), ClientError> {
        let access = self.cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone());
        let refresh = self.cookie(REFRESH_TOKEN_COOKIE, session.refresh_token.clone());
        let expires = self.cookie(EXPIRES_AT_COOKIE, session.expires_at.to_string());
        let mut jar = self.lock()?;
        jar.add(access);
        jar.add(refresh);
        jar.add(expires);
        Ok(())
    }

    fn load(&self) -> Result<Option<ClientSession>, ClientError> {
        let jar = self.lock()?;
        let (Some(access), Some(refresh), Some(expires)) = (
            jar.get(ACCESS_TOKEN_COOKIE),
            jar.get(REFRESH_TOKEN_COOKIE),
            jar.get(EXPIRES_AT_COOKIE),
        ) else {
            return Ok(None);
        };
        let expires_at = expires
            .value()
            .parse()
            .map_err(|_| ClientError::Storage("malformed expiry cookie".into()))?;
        Ok(Some(ClientSession {
            access_token: access.value().to_string(),
            refresh_token: refresh.value().to_string(),
            expires_at,
        }))
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut jar = self.lock()?;
        for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, EXPIRES_AT_COOKIE] {
            jar.remove(Cookie::build(name).path("/"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    session: Mutex<Option<ClientSession>>,
}

impl MemoryStorage {
    fn lock(&self) -> Result<MutexGuard<'_, Option<ClientSession>>, ClientError> {
        self.session
            .lock()
            .map_err(|_| ClientError::Storage("session lock poisoned".into()))
    }
}

impl SessionStorage for MemoryStorage {
    fn save(&self, session: &ClientSession) -> Result<(), ClientError> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<ClientSession>, ClientError> {
        Ok(self.lock()?.clone())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ClientSession {
        ClientSession {
            access_token: "eyJhbGciOi.at".into(),
            refresh_token: "rt-1".into(),
            expires_at: 1_700_000_000_000,
        }
    }

    fn assert_round_trip(storage: &dyn SessionStorage) {
        assert!(storage.load().unwrap().is_none());
        storage.save(&session()).unwrap();
        assert_eq!(storage.load().unwrap(), Some(session()));
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
        // clearing twice is fine
        storage.clear().unwrap();
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("energy.session.json"));
        assert_round_trip(&storage);
    }

    #[test]
    fn test_file_storage_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("energy.session.json");
        FileStorage::new(&path).save(&session()).unwrap();
        assert_eq!(FileStorage::new(&path).load().unwrap(), Some(session()));
    }

    #[test]
    fn test_process_storage_round_trip() {
        assert_round_trip(&ProcessStorage::new("storage-test-app"));
    }

    #[test]
    fn test_process_storage_is_per_app() {
        let a = ProcessStorage::new("storage-test-a");
        let b = ProcessStorage::new("storage-test-b");
        a.save(&session()).unwrap();
        assert!(b.load().unwrap().is_none());
        a.clear().unwrap();
    }

    #[test]
    fn test_cookie_storage_round_trip() {
        assert_round_trip(&CookieStorage::new(true));
    }

    #[test]
    fn test_cookie_storage_headers() {
        let storage = CookieStorage::from_cookie_header(
            "sso_access_token=at; sso_refresh_token=rt; sso_expires_at=42",
            false,
        );
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "at");
        assert_eq!(loaded.expires_at, 42);
        assert!(storage.set_cookie_headers().unwrap().is_empty());

        storage.clear().unwrap();
        let headers = storage.set_cookie_headers().unwrap();
        assert_eq!(headers.len(), 3);
        assert!(headers.iter().all(|h| h.contains("Max-Age=0")));
    }

    #[test]
    fn test_memory_storage_round_trip() {
        assert_round_trip(&MemoryStorage::default());
    }
}
