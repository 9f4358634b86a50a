use super::helpers::{sample_declaration, scribble, TestService};
use docsign::application::{SaveOutcome, SessionKey, SessionState, View};
use docsign::domain::SignerRole;
use docsign::infrastructure::api_client;
use hyper::Method;

#[tokio::test]
async fn test_carrier_signs_on_second_device() {
    let service = TestService::start().await;
    api_client::save_declaration(&service.client, &service.api_url, &sample_declaration("R1", 1), "op")
        .await
        .unwrap();

    // Operator asks for the driver's signature
    let mut desk = service.workspace("op");
    desk.refresh(&service.client, &service.api_url).await.unwrap();
    desk.select_record("R1").unwrap();
    let request = desk.request_signature(SignerRole::Carrier).unwrap();
    assert!(request.link.url.ends_with("/#/sign/R1/carrier"));

    // Driver opens the link on a phone that has nothing loaded
    let mut phone = service.workspace("driver");
    phone.navigate(&request.link.url);
    assert_eq!(phone.pending_link(), Some(SessionKey::new("R1", SignerRole::Carrier)));
    assert!(phone.resolve_remote(&service.client, &service.api_url).await.unwrap());
    assert_eq!(phone.view(), View::SignatureMode);

    scribble(phone.surface_mut());
    let outcome = phone.save_over_http(&service.client, &service.api_url).await.unwrap();
    assert_eq!(outcome, SaveOutcome::Saved(request.key.clone()));
    assert_eq!(phone.view(), View::Preview);
    assert_eq!(phone.session().state(), SessionState::Closed);

    // Desk sees the signature after a refresh
    desk.refresh(&service.client, &service.api_url).await.unwrap();
    let record = desk.record("R1").unwrap();
    assert!(record.signature_carrier.is_some());
    assert!(record.signature_sender.is_none());
    assert_eq!(desk.cancel().unwrap(), request.key);

    let (_, logs) = service.send_json(Method::GET, "/logs?limit=1", None).await;
    assert_eq!(logs[0]["action"], "SIGN");
    assert_eq!(logs[0]["username"], "driver");
}

#[tokio::test]
async fn test_both_roles_end_up_signed() {
    let service = TestService::start().await;
    api_client::save_declaration(&service.client, &service.api_url, &sample_declaration("R42", 42), "op")
        .await
        .unwrap();

    // Sender signs on the desk
    let mut desk = service.workspace("op");
    desk.refresh(&service.client, &service.api_url).await.unwrap();
    desk.select_record("R42").unwrap();
    desk.request_signature(SignerRole::Sender).unwrap();
    scribble(desk.surface_mut());
    let saved = desk.save_over_http(&service.client, &service.api_url).await.unwrap();
    assert!(matches!(saved, SaveOutcome::Saved(_)));

    // Carrier signs from the link afterwards
    let mut phone = service.workspace("driver");
    phone.refresh(&service.client, &service.api_url).await.unwrap();
    phone.navigate("#/sign/R42/carrier");
    assert_eq!(phone.view(), View::SignatureMode);
    scribble(phone.surface_mut());
    phone.save_over_http(&service.client, &service.api_url).await.unwrap();

    let stored = api_client::fetch_declaration(&service.client, &service.api_url, "R42")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_fully_signed());
    assert_eq!(
        stored.signature_sender,
        desk.record("R42").unwrap().signature_sender
    );

    // Replaying the carrier link shows the signed record
    phone.navigate("#/sign/R42/carrier");
    assert_eq!(phone.view(), View::Preview);
    assert_eq!(phone.session().state(), SessionState::Closed);
}

#[tokio::test]
async fn test_link_for_unknown_record_stays_pending() {
    let service = TestService::start().await;
    let mut phone = service.workspace("driver");
    phone.navigate("#/sign/ghost/sender");

    assert!(!phone.resolve_remote(&service.client, &service.api_url).await.unwrap());
    assert_eq!(phone.view(), View::Edit);
    assert_eq!(phone.session().state(), SessionState::Closed);
    assert!(phone.pending_link().is_some());
}

#[tokio::test]
async fn test_save_failure_over_http_keeps_drawing() {
    let service = TestService::start().await;
    let mut phone = service.workspace("driver");
    phone.load_records(vec![sample_declaration("R1", 1)]);
    phone.navigate("#/sign/R1/sender");
    scribble(phone.surface_mut());

    // Nothing listens on this port
    let outcome = phone.save_over_http(&service.client, "http://127.0.0.1:1/api").await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Failed { .. }));
    assert!(!phone.surface().is_empty());

    let retried = phone.save_over_http(&service.client, &service.api_url).await.unwrap();
    assert_eq!(retried, SaveOutcome::Saved(SessionKey::new("R1", SignerRole::Sender)));
}
