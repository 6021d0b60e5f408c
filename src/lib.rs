// src/lib.rs
pub mod analysis;
pub mod config;
pub mod error;
pub mod fetch;
pub mod process;
