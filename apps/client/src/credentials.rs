//! Participant credentials
//!
//! The participant id and session code are persisted outside the client.
//! A session only starts once both are present.

use std::env;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const PARTICIPANT_ID_VAR: &str = "QUIZ_PARTICIPANT_ID";
pub const SESSION_CODE_VAR: &str = "QUIZ_SESSION_CODE";

/// Source of the two persisted credential values
pub trait CredentialStore: Send + Sync {
    /// Raw participant id and session code, as stored
    fn load(&self) -> (Option<String>, Option<String>);

    /// Forget both values
    fn clear(&self);
}

/// Credentials captured from `QUIZ_PARTICIPANT_ID` and `QUIZ_SESSION_CODE`
///
/// The environment is read once, in [`EnvCredentialStore::from_env`].
/// Clearing forgets the captured values and never touches the process
/// environment.
#[derive(Debug, Default)]
pub struct EnvCredentialStore {
    snapshot: MemoryCredentialStore,
}

impl EnvCredentialStore {
    pub fn from_env() -> Self {
        let participant_id = env::var(PARTICIPANT_ID_VAR).ok();
        let session_code = env::var(SESSION_CODE_VAR).ok();
        Self {
            snapshot: MemoryCredentialStore {
                values: Mutex::new((participant_id, session_code)),
            },
        }
    }
}

impl CredentialStore for EnvCredentialStore {
    fn load(&self) -> (Option<String>, Option<String>) {
        self.snapshot.load()
    }

    fn clear(&self) {
        self.snapshot.clear();
        debug!("Forgot credentials captured from the environment");
    }
}

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: Mutex<(Option<String>, Option<String>)>,
}

impl MemoryCredentialStore {
    pub fn new(participant_id: impl Into<String>, session_code: impl Into<String>) -> Self {
        Self {
            values: Mutex::new((Some(participant_id.into()), Some(session_code.into()))),
        }
    }

    pub fn is_empty(&self) -> bool {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.0.is_none() && values.1.is_none()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> (Option<String>, Option<String>) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        *self.values.lock().unwrap_or_else(PoisonError::into_inner) = (None, None);
    }
}

/// Validated participant credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub participant_id: u64,
    pub session_code: String,
}

impl SessionCredentials {
    pub fn new(participant_id: u64, session_code: impl Into<String>) -> Self {
        Self {
            participant_id,
            session_code: session_code.into(),
        }
    }

    /// Read and validate both values from a store
    pub fn resolve(store: &dyn CredentialStore) -> ClientResult<Self> {
        let (participant_id, session_code) = store.load();

        let participant_id = participant_id
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ClientError::MissingCredentials("participant id"))?;
        let session_code = session_code
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ClientError::MissingCredentials("session code"))?;

        let participant_id = participant_id.parse::<u64>().map_err(|_| {
            ClientError::InvalidCredentials(format!(
                "participant id must be an integer, got '{}'",
                participant_id
            ))
        })?;

        Ok(Self {
            participant_id,
            session_code,
        })
    }
}
