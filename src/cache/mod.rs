pub mod token_store;
pub mod valkey_cache;
