use capa_domain::{non_blank, ActorId, EvidenceRef, EvidenceUpload, Nature, WorkflowStatus};
use pretty_assertions::assert_eq;

#[test]
fn test_blank_actor_is_rejected() {
    assert!(ActorId::new("  ").is_err());
    let a = ActorId::new("inspector-7").unwrap();
    assert_eq!(a.to_string(), "inspector-7");
}

#[test]
fn test_evidence_reference_is_content_addressed() {
    let a = EvidenceUpload::new("IMG_0001.JPG", vec![1, 2, 3]).unwrap();
    let b = EvidenceUpload::new("copy.jpg", vec![1, 2, 3]).unwrap();
    let ra = EvidenceRef::content_addressed(&a);
    let rb = EvidenceRef::content_addressed(&b);
    // mismo contenido y extensión -> misma referencia
    assert_eq!(ra, rb);
    assert!(ra.as_str().starts_with("evidence/"));
    assert!(ra.as_str().ends_with(".jpg"));
    // sha256 hex = 64 chars
    assert_eq!(a.digest().len(), 64);
}

#[test]
fn test_evidence_without_extension_defaults_to_bin() {
    let up = EvidenceUpload::new("photo", vec![9]).unwrap();
    assert_eq!(up.extension(), "bin");
    assert!(EvidenceUpload::new("empty.png", vec![]).is_err());
}

#[test]
fn test_status_display_uses_snake_case() {
    assert_eq!(WorkflowStatus::SubmittedBlocked.to_string(), "submitted_blocked");
    assert_eq!("preventive".parse::<Nature>().unwrap(), Nature::Preventive);
}

#[test]
fn test_non_blank_keeps_text_as_given() {
    assert_eq!(non_blank(Some("  fixed ")), Some("  fixed ".to_string()));
    assert_eq!(non_blank(Some("line 1\n  line 2\n")), Some("line 1\n  line 2\n".to_string()));
    assert_eq!(non_blank(Some("   ")), None);
    assert_eq!(non_blank(None), None);
}
