pub mod api;
pub mod cli;
pub mod core;
pub mod engine;
pub mod graph;
pub mod jobs;
