pub mod auth;
pub mod common;
pub mod script;
pub mod training;
