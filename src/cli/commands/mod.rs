//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod index;
mod search;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use index::run_index;
pub use search::run_search;
pub use serve::run_serve;
