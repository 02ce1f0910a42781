pub mod storage;
pub mod upload;
