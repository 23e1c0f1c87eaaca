//! Session link handshake

pub mod link;

pub use link::{LinkStatus, LinkTicket, SessionLinkManager, VerifiedNotice};
