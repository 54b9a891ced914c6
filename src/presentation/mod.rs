// Presentation layer - HTTP routes, request bodies and error mapping
pub mod api_error;
pub mod app_state;
pub mod dto;
pub mod handlers;
