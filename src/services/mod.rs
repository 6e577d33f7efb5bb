pub mod capture_service;
pub mod log_service;
pub mod log_store;
pub mod memory_store;
pub mod replay_service;
pub mod trigger;
