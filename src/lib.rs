pub mod api_client;
pub mod auth;
pub mod config;
pub mod error;
pub mod token_store;
pub mod vendor_view;
