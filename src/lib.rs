pub mod error;
pub mod config;
pub mod diagnostics;
pub mod source;
pub mod parser;
pub mod multiline;
pub mod vectorizer;
pub mod kmeans;
pub mod projection;
pub mod analysis;
pub mod anomaly;
pub mod tokens;
pub mod pipeline;
