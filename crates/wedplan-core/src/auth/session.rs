use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::DataProvider;
use crate::local::LocalStorage;

/// The one local-storage key holding the signed-in session
const SESSION_KEY: &str = "session";

/// Sessions last a working day.
const SESSION_EXPIRY_HOURS: i64 = 12;

const TOKEN_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(username: impl Into<String>) -> Self {
        let token = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();
        Self {
            token,
            username: username.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.created_at + Duration::hours(SESSION_EXPIRY_HOURS)
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.created_at + Duration::hours(SESSION_EXPIRY_HOURS) - Utc::now()
    }

    /// Minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_minutes().max(0)
    }
}

pub struct Session {
    storage: Arc<LocalStorage>,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self {
            storage,
            data: None,
        }
    }

    /// Load the stored session; false if there is none or it has expired.
    pub fn load(&mut self) -> Result<bool> {
        if let Some(contents) = self.storage.get(SESSION_KEY)? {
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session")?;
            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Start a session for a user whose credentials were already checked.
    pub fn sign_in(&mut self, username: &str) -> Result<&SessionData> {
        let data = SessionData::new(username);
        let contents = serde_json::to_string(&data)?;
        self.storage
            .set(SESSION_KEY, &contents)
            .context("Failed to save session")?;
        info!(username, "Signed in");
        let data: &SessionData = self.data.insert(data);
        Ok(data)
    }

    /// End the session and drop everything the provider has cached.
    pub async fn sign_out(&mut self, provider: &DataProvider) -> Result<()> {
        self.data = None;
        self.storage.remove(SESSION_KEY)?;
        provider.clear().await;
        info!("Signed out");
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.username.as_str())
    }

    /// Session exists and is not expired
    pub fn is_authenticated(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }
}
