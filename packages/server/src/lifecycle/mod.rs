//! Registration lead lifecycle: `Partial -> Completed | Abandoned`.
//!
//! Field handling is pure ([`draft`], [`gate`]); all database I/O goes
//! through [`service::LeadService`], and the client-side autosave cadence
//! is modelled by [`autosave::DraftAutosaver`].

pub mod autosave;
pub mod draft;
pub mod error;
pub mod gate;
pub mod service;

pub use draft::{FieldEdit, RegistrationDraft};
pub use error::RegistrationError;
pub use gate::{GateRules, PaymentProofs, ProofPresence};
pub use service::{DraftOutcome, LeadService, Transition, TransitionResult};
