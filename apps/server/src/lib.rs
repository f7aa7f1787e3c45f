pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
mod main_lib;

pub use main_lib::{
    adapters_from_config, build_state, build_state_with_adapters, init_tracing, AppState,
    ServerOrchestrator,
};
