use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    Export,
    Upload,
    Transcribe,
    AiInvoke,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Read => "read",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Export => "export",
            AuditAction::Upload => "upload",
            AuditAction::Transcribe => "transcribe",
            AuditAction::AiInvoke => "ai_invoke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Professional,
    Patient,
    Session,
    Evolution,
    Transcript,
    SmartNotes,
    Document,
    ChatHistory,
    Subscription,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Professional => "professional",
            ResourceType::Patient => "patient",
            ResourceType::Session => "session",
            ResourceType::Evolution => "evolution",
            ResourceType::Transcript => "transcript",
            ResourceType::SmartNotes => "smart_notes",
            ResourceType::Document => "document",
            ResourceType::ChatHistory => "chat_history",
            ResourceType::Subscription => "subscription",
        }
    }
}

/// One audit record. Logged as a structured `tracing` event so it lands in
/// CloudWatch next to the request log; never contains clinical text.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: String,
    /// Cognito `sub` of the professional who acted.
    pub actor: String,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: impl ToString,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource_type,
            resource_id: resource_id.to_string(),
            actor: actor.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(
            audit.action = self.action.as_str(),
            audit.resource_type = self.resource_type.as_str(),
            audit.resource_id = %self.resource_id,
            audit.actor = %self.actor,
            audit.details = %details,
            "audit event"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn serializes_with_snake_case_names() {
        let event = AuditEvent::new(AuditAction::AiInvoke, ResourceType::SmartNotes, 42, "sub-1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "ai_invoke");
        assert_eq!(json["resource_type"], "smart_notes");
        assert_eq!(json["resource_id"], "42");
        assert!(json["details"].is_null());
    }

    #[test]
    fn emit_writes_structured_fields() {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(move || sink.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            AuditEvent::new(AuditAction::Delete, ResourceType::Patient, "p-1", "sub-9")
                .with_details(serde_json::json!({ "sessions_removed": 3 }))
                .emit();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(line["fields"]["message"], "audit event");
        assert_eq!(line["fields"]["audit.action"], "delete");
        assert_eq!(line["fields"]["audit.actor"], "sub-9");
        assert!(
            line["fields"]["audit.details"]
                .as_str()
                .unwrap()
                .contains("sessions_removed")
        );
    }
}
