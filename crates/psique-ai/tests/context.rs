use jiff::civil::date;

use psique_ai::context::{EvolutionEntry, MAX_CONTEXT_EVOLUTIONS, assistant_system_prompt, build_patient_context};
use psique_core::models::patient::{Patient, PatientInput};

fn patient() -> Patient {
    let mut p = Patient::from_input(
        "pro-1",
        PatientInput {
            name: "Joana Lima".to_string(),
            email: Some("joana@example.com".to_string()),
            phone: Some("+55 11 99999-0000".to_string()),
            birth_date: Some(date(1994, 3, 2)),
            status: None,
            session_price_cents: None,
            emergency_contact: None,
            notes: Some("Encaminhada pela psiquiatra.".to_string()),
        },
        jiff::Timestamp::UNIX_EPOCH,
    );
    p.id = uuid::Uuid::nil();
    p
}

#[test]
fn block_has_profile_but_no_contact_details() {
    let block = build_patient_context(&patient(), &[], date(2026, 10, 19));
    assert!(block.starts_with("<patient_context>"));
    assert!(block.ends_with("</patient_context>"));
    assert!(block.contains("<name>Joana Lima</name>"));
    assert!(block.contains("<age>32</age>"));
    assert!(block.contains("Encaminhada pela psiquiatra."));
    assert!(!block.contains("joana@example.com"));
    assert!(!block.contains("99999"));
}

#[test]
fn only_recent_evolutions_are_included_oldest_first() {
    let evolutions: Vec<EvolutionEntry> = (1..=8)
        .map(|day| EvolutionEntry {
            date: date(2026, 9, day),
            content: format!("<p>Sessão do dia {day}</p>"),
        })
        .collect();
    let block = build_patient_context(&patient(), &evolutions, date(2026, 10, 19));

    assert_eq!(block.matches("<evolution ").count(), MAX_CONTEXT_EVOLUTIONS);
    assert!(!block.contains("Sessão do dia 3\n"));
    let first = block.find("Sessão do dia 4").unwrap();
    let last = block.find("Sessão do dia 8").unwrap();
    assert!(first < last);
    assert!(block.contains("<evolution date=\"2026-09-08\">"));
}

#[test]
fn system_prompt_appends_instructions_then_context() {
    let prompt = assistant_system_prompt("<patient_context>\n</patient_context>", Some("Abordagem TCC."));
    let instructions = prompt.find("Abordagem TCC.").unwrap();
    let context = prompt.find("<patient_context>").unwrap();
    assert!(instructions < context);

    let bare = assistant_system_prompt("<patient_context>\n</patient_context>", Some("   "));
    assert!(!bare.contains("\n\n\n\n"));
}
