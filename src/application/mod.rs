// Application layer - Use cases over the domain and the history repository
pub mod bounded_table;
pub mod checklist_service;
pub mod degradation_service;
pub mod history_repository;
pub mod history_service;
pub mod input_session_service;
pub mod performance_service;
pub mod streaming_service;
