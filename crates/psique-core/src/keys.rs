//! Object key conventions.
//!
//! Pure string functions with no AWS SDK dependency. Every tenant's data lives
//! under `tenants/{professional_id}/`, so one professional can never list
//! another's objects by prefix.

use uuid::Uuid;

pub fn tenant_prefix(professional_id: &str) -> String {
    format!("tenants/{professional_id}/")
}

pub fn profile(professional_id: &str) -> String {
    format!("tenants/{professional_id}/profile.json")
}

pub fn subscription(professional_id: &str) -> String {
    format!("tenants/{professional_id}/subscription.json")
}

pub fn patients_prefix(professional_id: &str) -> String {
    format!("tenants/{professional_id}/patients/")
}

pub fn patient(professional_id: &str, id: Uuid) -> String {
    format!("tenants/{professional_id}/patients/{id}.json")
}

pub fn sessions_prefix(professional_id: &str) -> String {
    format!("tenants/{professional_id}/sessions/")
}

pub fn session(professional_id: &str, id: Uuid) -> String {
    format!("tenants/{professional_id}/sessions/{id}.json")
}

pub fn evolutions_prefix(professional_id: &str) -> String {
    format!("tenants/{professional_id}/evolutions/")
}

pub fn evolution(professional_id: &str, session_id: Uuid) -> String {
    format!("tenants/{professional_id}/evolutions/{session_id}.json")
}

pub fn smart_notes(professional_id: &str, session_id: Uuid) -> String {
    format!("tenants/{professional_id}/smart_notes/{session_id}.json")
}

pub fn transcript(professional_id: &str, session_id: Uuid) -> String {
    format!("tenants/{professional_id}/transcripts/{session_id}.json")
}

pub fn session_audio_prefix(professional_id: &str, session_id: Uuid) -> String {
    format!("tenants/{professional_id}/audio/{session_id}/")
}

pub fn session_audio(professional_id: &str, session_id: Uuid, filename: &str) -> String {
    format!(
        "tenants/{professional_id}/audio/{session_id}/{}",
        sanitize_filename(filename)
    )
}

pub fn documents_prefix(professional_id: &str, patient_id: Uuid) -> String {
    format!("tenants/{professional_id}/documents/{patient_id}/")
}

pub fn document_file(
    professional_id: &str,
    patient_id: Uuid,
    doc_id: Uuid,
    filename: &str,
) -> String {
    format!(
        "tenants/{professional_id}/documents/{patient_id}/{doc_id}/{}",
        sanitize_filename(filename)
    )
}

pub fn document_meta_prefix(professional_id: &str, patient_id: Uuid) -> String {
    format!("tenants/{professional_id}/document_meta/{patient_id}/")
}

pub fn document_meta(professional_id: &str, patient_id: Uuid, doc_id: Uuid) -> String {
    format!("tenants/{professional_id}/document_meta/{patient_id}/{doc_id}.json")
}

pub fn chat_history(professional_id: &str, patient_id: Uuid) -> String {
    format!("tenants/{professional_id}/chats/{patient_id}.json")
}

pub fn ai_transaction(professional_id: &str, id: Uuid) -> String {
    format!("tenants/{professional_id}/ai_transactions/{id}.json")
}

/// Global index from payment-provider customer to tenant, written at checkout.
pub fn billing_customer(customer_id: &str) -> String {
    format!("billing/customers/{customer_id}.json")
}

/// Extra instructions the professional adds to the assistant prompt.
pub fn assistant_instructions(professional_id: &str) -> String {
    format!("tenants/{professional_id}/assistant-instructions.md")
}

/// Keep only characters that are safe in an object key path segment.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tenant_key_lives_under_the_tenant_prefix() {
        let id = Uuid::new_v4();
        let prefix = tenant_prefix("sub-1");
        for key in [
            profile("sub-1"),
            subscription("sub-1"),
            patient("sub-1", id),
            session("sub-1", id),
            evolution("sub-1", id),
            smart_notes("sub-1", id),
            transcript("sub-1", id),
            session_audio("sub-1", id, "a.mp3"),
            document_file("sub-1", id, id, "x.pdf"),
            document_meta("sub-1", id, id),
            chat_history("sub-1", id),
            ai_transaction("sub-1", id),
            assistant_instructions("sub-1"),
        ] {
            assert!(key.starts_with(&prefix), "{key}");
        }
    }

    #[test]
    fn filenames_cannot_escape_their_folder() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("laudo médico.pdf"), "laudo_m_dico.pdf");
        assert_eq!(sanitize_filename("..."), "file");
        assert_eq!(sanitize_filename("C:\\docs\\a b.docx"), "a_b.docx");
    }
}
