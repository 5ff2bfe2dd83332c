//! Domain models shared by the API and the notifier

pub mod check_in;
pub mod contact;
pub mod user;

// Re-export for convenience
pub use check_in::{CheckIn, CheckInStatus};
pub use contact::{EmergencyContact, MAX_CONTACTS, MissedCheckIn, NewContact};
pub use user::{DEFAULT_REMINDER_HOUR, NewUser, ReminderSettings, Role, User};
