pub mod json;
pub mod operator;
