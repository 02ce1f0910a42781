pub mod category;
pub mod event;
pub mod registration_status;
pub mod storage;

pub use category::{CodeCategory, SubmissionState};
pub use event::{ChangeEvent, ChangeKind};
pub use registration_status::RegistrationStatus;
