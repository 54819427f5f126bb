use crate::diagnostics::{DiagnosticKind, EmitDiagnostic, Severity};

#[test]
fn skipped_attributes_are_warnings() {
    let d = EmitDiagnostic::new(DiagnosticKind::AttributeSkipped, None, "Signature dropped");

    assert_eq!(d.severity, Severity::Warning);
    assert!(d.is_warning());
    assert_eq!(d.to_string(), "warning: Signature dropped");
}

#[test]
fn member_diagnostics_name_the_member() {
    let d = EmitDiagnostic::new(
        DiagnosticKind::CodeTooLarge,
        Some("run()V".to_string()),
        "70000 bytes of code (max 65535)",
    );

    assert!(d.is_error());
    assert_eq!(d.to_string(), "error: run()V: 70000 bytes of code (max 65535)");
}

#[test]
fn empty_message_uses_fallback() {
    let d = EmitDiagnostic::new(DiagnosticKind::FrameOrder, None, "");

    assert_eq!(d.message, "stack map frames are not strictly ordered");
}
