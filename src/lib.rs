// Library crate for the planning poker session server
// This file exposes the public API for integration tests

pub mod event;
pub mod jira;
pub mod room;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use event::{EventBus, RoomEvent, RoomSubscription};
pub use jira::client::TicketProvider;
pub use room::{
    models::{Player, RoomSnapshot, Ticket, Vote},
    registry::RoomRegistry,
    room::{Room, RoomError},
    sweep_task::SweepConfig,
};
pub use shared::{AppError, AppState};
