pub mod grass_repository;
pub mod script_repository;
pub mod training_repository;
pub mod users_repository;
