use std::sync::Arc;

pub mod repository;
pub mod service;

pub use repository::PersistedTask;

pub type Repository = Arc<Box<dyn repository::Repository>>;
