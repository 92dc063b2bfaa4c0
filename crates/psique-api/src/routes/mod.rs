pub mod assistant;
pub mod billing;
pub mod calendar;
pub mod documents;
pub mod evolution;
pub mod export;
pub mod financial;
pub mod health;
pub mod me;
pub mod patients;
pub mod sessions;
pub mod smart_notes;
pub mod tenant;
pub mod transcription;
