pub mod ai_service;
pub mod attempt_service;
pub mod buffer_service;
pub mod export_service;
pub mod generator;
