mod adapter;
mod models;

pub use adapter::{GeminiProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
