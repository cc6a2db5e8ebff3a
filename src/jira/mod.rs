// Ticket-tracking integration (Atlassian Jira)
//
// A thin collaborator around the room engine: OAuth code exchange, issue
// search and bulk fetch. The engine only sees the `TicketProvider` trait.

pub mod client;
pub mod handlers;
pub mod options;
pub mod sanitizer;
pub mod types;
