use super::fixtures::declaration;
use docsign::domain::{Declaration, SignatureImage, SignerRole};
use serde_json::json;

#[test]
fn test_new_declaration_formats_number_and_city() {
    let decl = declaration("R1", 42);
    assert_eq!(decl.number, "00000042");
    assert_eq!(decl.city, "CAMPINAS");
    assert!(decl.date.contains(" DE "));
    assert_eq!(decl.date, decl.date.to_uppercase());
    assert!(!decl.is_signed_by(SignerRole::Sender));
    assert_eq!(decl.total_value(), 4000.0);
}

#[test]
fn test_wire_format_uses_camel_case_fields() {
    let mut decl = declaration("R1", 1);
    decl.set_signature(SignerRole::Carrier, Some(SignatureImage::from_png(b"ink").unwrap()));

    let value = serde_json::to_value(&decl).unwrap();
    assert_eq!(value["id"], "R1");
    assert_eq!(value["recipient"]["cityState"], "Campinas - SP");
    assert_eq!(value["equipment"][0]["serialNumber"], "CGWSYP3");
    assert_eq!(value["carrier"]["driverName"], "Carlos");
    assert!(value["signatureCarrier"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    // Unsigned roles are omitted
    assert!(value.get(SignerRole::Sender.field_name()).is_none());
}

#[test]
fn test_sparse_payload_fills_defaults() {
    let decl: Declaration = serde_json::from_value(json!({
        "id": "R5",
        "number": "00000005",
        "date": "01/02/2026",
        "city": "SAO PAULO",
        "sender": { "name": "Ana" }
    }))
    .unwrap();

    assert_eq!(decl.sender.name, "Ana");
    assert!(decl.sender.email.is_empty());
    assert!(decl.equipment.is_empty());
    assert!(decl.signature_sender.is_none());
    assert!(decl.signature_carrier.is_none());
}

#[test]
fn test_invalid_signature_rejects_payload() {
    let result: Result<Declaration, _> = serde_json::from_value(json!({
        "id": "R5",
        "number": "00000005",
        "date": "01/02/2026",
        "city": "SAO PAULO",
        "signatureSender": "data:text/html;base64,PGI+"
    }));
    assert!(result.is_err());
}

#[test]
fn test_fully_signed_needs_both_roles() {
    let mut decl = declaration("R1", 1);
    let image = SignatureImage::from_png(b"ink").unwrap();

    decl.set_signature(SignerRole::Sender, Some(image.clone()));
    assert!(!decl.is_fully_signed());
    decl.set_signature(SignerRole::Carrier, Some(image));
    assert!(decl.is_fully_signed());

    decl.set_signature(SignerRole::Sender, None);
    assert!(decl.is_signed_by(SignerRole::Carrier));
    assert!(!decl.is_signed_by(SignerRole::Sender));
}

#[test]
fn test_role_literals_are_exact() {
    assert_eq!("sender".parse::<SignerRole>(), Ok(SignerRole::Sender));
    assert_eq!("carrier".parse::<SignerRole>(), Ok(SignerRole::Carrier));
    assert!("Carrier".parse::<SignerRole>().is_err());
    assert!("driver".parse::<SignerRole>().is_err());
    assert_eq!(serde_json::to_value(SignerRole::Carrier).unwrap(), "carrier");
}
