// Event-driven architecture components
//
// Each room owns an EventBus that fans domain events out to every live
// subscriber (one subscriber per open event stream).

pub use bus::{BusClosed, EventBus, RoomSubscription};
pub use events::RoomEvent;

mod bus;
mod events;
