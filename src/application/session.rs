use crate::domain::{SignatureImage, SignerRole};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("No signature is awaiting capture")]
    NotAwaitingCapture,

    #[error("A signature save is already in progress")]
    SaveInProgress,
}

/// Identity of a signature request. The pair is the whole key; no session
/// id is ever minted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub record_id: String,
    pub role: SignerRole,
}

impl SessionKey {
    pub fn new(record_id: impl Into<String>, role: SignerRole) -> Self {
        Self {
            record_id: record_id.into(),
            role,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.record_id, self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    AwaitingCapture,
    Captured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    AlreadyOpen,
}

/// Ticket for a capture handed to the persistence gateway
#[derive(Debug, Clone)]
pub struct PendingCapture {
    key: SessionKey,
    image: SignatureImage,
    epoch: u64,
}

impl PendingCapture {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn image(&self) -> &SignatureImage {
        &self.image
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Persisted; the session has closed
    Completed {
        key: SessionKey,
        image: SignatureImage,
    },
    /// Persistence failed; the session still awaits capture
    Failed { key: SessionKey, message: String },
    /// The session moved on before the gateway answered
    Discarded { key: SessionKey },
}

/// State machine for one signature request
#[derive(Debug)]
pub struct SignatureSession {
    key: Option<SessionKey>,
    state: SessionState,
    image: Option<SignatureImage>,
    in_flight: bool,
    // Bumped whenever an open capture is abandoned
    epoch: u64,
}

impl Default for SignatureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureSession {
    pub fn new() -> Self {
        Self {
            key: None,
            state: SessionState::Closed,
            image: None,
            in_flight: false,
            epoch: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn key(&self) -> Option<&SessionKey> {
        self.key.as_ref()
    }

    /// Last image captured by this session, if any
    pub fn image(&self) -> Option<&SignatureImage> {
        self.image.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight
    }

    pub fn is_awaiting(&self, key: &SessionKey) -> bool {
        self.state == SessionState::AwaitingCapture && self.key.as_ref() == Some(key)
    }

    pub fn open(&mut self, key: SessionKey) -> OpenOutcome {
        if self.is_awaiting(&key) {
            debug!("Signature session {} already open", key);
            return OpenOutcome::AlreadyOpen;
        }
        if self.state == SessionState::AwaitingCapture {
            self.abandon();
        }

        info!("Opening signature session {}", key);
        self.key = Some(key);
        self.state = SessionState::AwaitingCapture;
        self.image = None;
        OpenOutcome::Opened
    }

    pub fn cancel(&mut self) -> Result<SessionKey, SessionError> {
        if self.state != SessionState::AwaitingCapture {
            return Err(SessionError::NotAwaitingCapture);
        }
        self.abandon();
        self.state = SessionState::Closed;
        let key = self.key.clone().ok_or(SessionError::NotAwaitingCapture)?;
        info!("Signature session {} cancelled", key);
        Ok(key)
    }

    /// Hand a capture off for persistence
    pub fn begin_save(&mut self, image: SignatureImage) -> Result<PendingCapture, SessionError> {
        if self.state != SessionState::AwaitingCapture {
            return Err(SessionError::NotAwaitingCapture);
        }
        if self.in_flight {
            return Err(SessionError::SaveInProgress);
        }
        let key = self.key.clone().ok_or(SessionError::NotAwaitingCapture)?;

        self.in_flight = true;
        debug!("Saving signature for {}", key);
        Ok(PendingCapture {
            key,
            image,
            epoch: self.epoch,
        })
    }

    /// Apply the gateway's answer to a pending capture
    pub fn complete(
        &mut self,
        pending: PendingCapture,
        result: Result<(), String>,
    ) -> CaptureOutcome {
        let PendingCapture { key, image, epoch } = pending;

        if epoch != self.epoch || !self.is_awaiting(&key) {
            match &result {
                Ok(()) => info!("Signature for {} persisted after its session closed", key),
                Err(e) => warn!("Signature for {} failed after its session closed: {}", key, e),
            }
            return CaptureOutcome::Discarded { key };
        }

        self.in_flight = false;
        match result {
            Ok(()) => {
                self.image = Some(image.clone());
                self.state = SessionState::Captured;
                info!("Signature captured for {}", key);
                self.state = SessionState::Closed;
                CaptureOutcome::Completed { key, image }
            }
            Err(message) => {
                warn!("Failed to save signature for {}: {}", key, message);
                CaptureOutcome::Failed { key, message }
            }
        }
    }

    fn abandon(&mut self) {
        self.epoch += 1;
        self.in_flight = false;
    }
}
