pub mod event;
pub mod redemption;
pub mod registration;
