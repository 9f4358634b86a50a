use docsign::application::{
    CaptureOutcome, OpenOutcome, SessionError, SessionKey, SessionState, SignatureSession,
};
use docsign::domain::{SignatureImage, SignerRole};

fn image(bytes: &[u8]) -> SignatureImage {
    SignatureImage::from_png(bytes).unwrap()
}

#[test]
fn test_new_session_is_closed() {
    let session = SignatureSession::default();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.key().is_none());
    assert!(!session.is_saving());
}

#[test]
fn test_successful_save_closes_and_keeps_image() {
    let mut session = SignatureSession::new();
    let key = SessionKey::new("R42", SignerRole::Sender);
    session.open(key.clone());
    assert_eq!(session.state(), SessionState::AwaitingCapture);

    let pending = session.begin_save(image(b"sender ink")).unwrap();
    assert!(session.is_saving());
    assert_eq!(pending.key(), &key);

    let outcome = session.complete(pending, Ok(()));
    assert_eq!(
        outcome,
        CaptureOutcome::Completed {
            key: key.clone(),
            image: image(b"sender ink"),
        }
    );
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(session.image(), Some(&image(b"sender ink")));
    assert!(!session.is_saving());
    assert_eq!(session.key(), Some(&key));
}

#[test]
fn test_failed_save_stays_awaiting_for_retry() {
    let mut session = SignatureSession::new();
    let key = SessionKey::new("R42", SignerRole::Carrier);
    session.open(key.clone());

    let pending = session.begin_save(image(b"ink")).unwrap();
    let outcome = session.complete(pending, Err("disk full".to_string()));
    assert_eq!(
        outcome,
        CaptureOutcome::Failed {
            key: key.clone(),
            message: "disk full".to_string(),
        }
    );
    assert!(session.is_awaiting(&key));
    assert!(!session.is_saving());

    // Retry goes through
    let retry = session.begin_save(image(b"ink")).unwrap();
    assert!(matches!(session.complete(retry, Ok(())), CaptureOutcome::Completed { .. }));
}

#[test]
fn test_opening_other_key_abandons_in_flight_capture() {
    let mut session = SignatureSession::new();
    let first = SessionKey::new("R1", SignerRole::Sender);
    let second = SessionKey::new("R1", SignerRole::Carrier);

    session.open(first.clone());
    let pending = session.begin_save(image(b"ink")).unwrap();
    assert_eq!(session.open(second.clone()), OpenOutcome::Opened);
    assert!(!session.is_saving());

    assert_eq!(
        session.complete(pending, Ok(())),
        CaptureOutcome::Discarded { key: first }
    );
    assert!(session.is_awaiting(&second));
}

#[test]
fn test_begin_save_requires_awaiting_state() {
    let mut session = SignatureSession::new();
    assert_eq!(
        session.begin_save(image(b"ink")).unwrap_err(),
        SessionError::NotAwaitingCapture
    );
}

#[test]
fn test_cancel_returns_key_and_closes() {
    let mut session = SignatureSession::new();
    let key = SessionKey::new("R7", SignerRole::Carrier);
    session.open(key.clone());
    assert_eq!(session.cancel().unwrap(), key);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(!session.is_awaiting(&key));
}

#[test]
fn test_reopen_after_close_starts_fresh() {
    let mut session = SignatureSession::new();
    let key = SessionKey::new("R7", SignerRole::Carrier);
    session.open(key.clone());
    let pending = session.begin_save(image(b"first")).unwrap();
    session.complete(pending, Ok(()));

    assert_eq!(session.open(key.clone()), OpenOutcome::Opened);
    assert!(session.image().is_none());
    assert!(session.is_awaiting(&key));
}

#[test]
fn test_session_key_display() {
    let key = SessionKey::new("R42", SignerRole::Sender);
    assert_eq!(key.to_string(), "R42/sender");
}
