pub mod binding;
pub mod block;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod level;
pub mod names;
pub mod persistence;
pub mod registry;
pub mod services;
pub mod sync;
pub mod waystone;
