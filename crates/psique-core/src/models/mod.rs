pub mod ai_transaction;
pub mod chat_history;
pub mod document;
pub mod evolution;
pub mod patient;
pub mod professional;
pub mod session;
pub mod smart_notes;
pub mod subscription;
pub mod token_count;
pub mod transcript;
