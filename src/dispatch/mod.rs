//! Dispatch form: typed draft, per-dispatcher session and webhook submission.

pub mod form;
pub mod session;
pub mod submission;

pub use form::{AddressInput, ContactDetails, FormDraft, VehicleSelection};
pub use session::FormSession;
pub use submission::{SubmissionPayload, WebhookClient};
