pub mod handlers;
pub mod models;
pub mod moniker;
pub mod registry;
#[allow(clippy::module_inception)]
pub mod room;
pub mod sweep_task;
pub mod types;
