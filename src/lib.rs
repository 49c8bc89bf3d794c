pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod transport;

pub use config::Config;
pub use error::{AppError, AppResult};
