pub mod auth_service;
pub mod health_service;
pub mod identity_provider;
pub mod token_service;
pub mod user_service;
