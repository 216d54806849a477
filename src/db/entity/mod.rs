pub mod grass;
pub mod script;
pub mod training;
pub mod user;
