pub mod models;
pub mod retry;
pub mod settings;
pub mod store;
