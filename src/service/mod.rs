pub mod script_service;
pub mod token_service;
pub mod training_service;
