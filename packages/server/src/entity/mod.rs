pub mod code;
pub mod registration;
pub mod submission;
