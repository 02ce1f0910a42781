pub mod events;
pub mod files;
pub mod redemption;
pub mod registration;
