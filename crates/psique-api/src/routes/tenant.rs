//! Loading and removing one professional's records.
//!
//! Every helper takes the tenant id from [`AuthUser`], so a handler can only
//! ever reach keys under its own `tenants/{sub}/` prefix.

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use tracing::info;
use uuid::Uuid;

use psique_ai::context::EvolutionEntry;
use psique_billing::plans::{Entitlements, entitlements};
use psique_core::keys;
use psique_core::models::evolution::Evolution;
use psique_core::models::patient::Patient;
use psique_core::models::professional::Professional;
use psique_core::models::session::Session;
use psique_core::models::subscription::Subscription;
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// The caller's profile, created with defaults on first access.
pub async fn profile(state: &AppState, user: &AuthUser) -> Result<Professional, ApiError> {
    let key = keys::profile(&user.sub);
    if let Some(profile) = records::load_optional::<Professional>(&state.bucket, &key).await? {
        return Ok(profile);
    }
    let profile = Professional::new(
        user.sub.as_str(),
        user.email.clone().unwrap_or_default(),
        Timestamp::now(),
    );
    records::save(&state.bucket, &key, &profile).await?;
    info!(professional_id = %user.sub, "created profile");
    Ok(profile)
}

pub async fn time_zone(state: &AppState, user: &AuthUser) -> Result<TimeZone, ApiError> {
    Ok(profile(state, user).await?.time_zone()?)
}

pub fn today(tz: &TimeZone) -> Date {
    Timestamp::now().to_zoned(tz.clone()).date()
}

/// A tenant without a subscription record is on the free plan.
pub async fn subscription(state: &AppState, professional_id: &str) -> Result<Subscription, ApiError> {
    Ok(
        records::load_optional(&state.bucket, &keys::subscription(professional_id))
            .await?
            .unwrap_or_else(|| Subscription::free(professional_id, Timestamp::now())),
    )
}

pub async fn current_entitlements(state: &AppState, user: &AuthUser) -> Result<Entitlements, ApiError> {
    let subscription = subscription(state, &user.sub).await?;
    Ok(entitlements(&subscription, Timestamp::now()))
}

pub async fn patients(state: &AppState, user: &AuthUser) -> Result<Vec<Patient>, ApiError> {
    Ok(records::load_all(&state.bucket, &keys::patients_prefix(&user.sub)).await?)
}

pub async fn patient(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Patient, ApiError> {
    Ok(records::load(&state.bucket, &keys::patient(&user.sub, id)).await?)
}

pub async fn sessions(state: &AppState, user: &AuthUser) -> Result<Vec<Session>, ApiError> {
    Ok(records::load_all(&state.bucket, &keys::sessions_prefix(&user.sub)).await?)
}

pub async fn session(state: &AppState, user: &AuthUser, id: Uuid) -> Result<Session, ApiError> {
    Ok(records::load(&state.bucket, &keys::session(&user.sub, id)).await?)
}

/// A patient's sessions, oldest first.
pub async fn patient_sessions(
    state: &AppState,
    user: &AuthUser,
    patient_id: Uuid,
) -> Result<Vec<Session>, ApiError> {
    let mut own: Vec<Session> = sessions(state, user)
        .await?
        .into_iter()
        .filter(|s| s.patient_id == patient_id)
        .collect();
    own.sort_by_key(|s| s.starts_at);
    Ok(own)
}

pub async fn patient_evolutions(
    state: &AppState,
    user: &AuthUser,
    patient_id: Uuid,
) -> Result<Vec<Evolution>, ApiError> {
    let all: Vec<Evolution> =
        records::load_all(&state.bucket, &keys::evolutions_prefix(&user.sub)).await?;
    Ok(all.into_iter().filter(|e| e.patient_id == patient_id).collect())
}

/// Evolutions dated by the local day of their session, for prompt context.
/// Evolutions whose session is gone are dropped.
pub fn evolution_entries(evolutions: &[Evolution], sessions: &[Session], tz: &TimeZone) -> Vec<EvolutionEntry> {
    evolutions
        .iter()
        .filter_map(|e| {
            let session = sessions.iter().find(|s| s.id == e.session_id)?;
            Some(EvolutionEntry {
                date: session.starts_at.to_zoned(tz.clone()).date(),
                content: e.content.clone(),
            })
        })
        .collect()
}

/// Delete a session and everything recorded for it.
pub async fn remove_session(state: &AppState, user: &AuthUser, session_id: Uuid) -> Result<(), ApiError> {
    let bucket = &state.bucket;
    bucket.delete(&keys::evolution(&user.sub, session_id)).await?;
    bucket.delete(&keys::smart_notes(&user.sub, session_id)).await?;
    bucket.delete(&keys::transcript(&user.sub, session_id)).await?;
    bucket
        .delete_prefix(&keys::session_audio_prefix(&user.sub, session_id))
        .await?;
    bucket.delete(&keys::session(&user.sub, session_id)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use psique_core::models::session::{Modality, SessionPayment, SessionStatus};

    fn session_on(day: i8) -> Session {
        let starts_at = date(2026, 3, day)
            .at(23, 0, 0, 0)
            .to_zoned(TimeZone::get("America/Sao_Paulo").unwrap())
            .unwrap()
            .timestamp();
        Session {
            id: Uuid::new_v4(),
            professional_id: "p".into(),
            patient_id: Uuid::from_u128(7),
            starts_at,
            duration_minutes: 50,
            modality: Modality::Online,
            status: SessionStatus::Completed,
            payment: SessionPayment::pending(0),
            recurrence_id: None,
            cancellation_reason: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn evolution_for(session: &Session) -> Evolution {
        Evolution {
            session_id: session.id,
            patient_id: session.patient_id,
            content: "<p>Relata melhora do sono.</p>".into(),
            smart_notes_id: None,
            created_at: session.starts_at,
            updated_at: session.starts_at,
        }
    }

    #[test]
    fn evolution_entries_use_the_local_session_date() {
        let tz = TimeZone::get("America/Sao_Paulo").unwrap();
        let session = session_on(10);
        let orphan = Evolution {
            session_id: Uuid::new_v4(),
            ..evolution_for(&session)
        };
        let entries = evolution_entries(&[evolution_for(&session), orphan], &[session], &tz);

        assert_eq!(entries.len(), 1);
        // 23:00 in São Paulo is already March 11th in UTC.
        assert_eq!(entries[0].date, date(2026, 3, 10));
    }
}
