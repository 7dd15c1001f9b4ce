pub mod api;
pub mod brief;
pub mod config;
pub mod errors;
pub mod llm;
pub mod models;
pub mod patch;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod resources;
pub mod state;
pub mod store;
pub mod synthesis;
