pub mod auth_handler;
pub mod script_handler;
pub mod training_handler;
