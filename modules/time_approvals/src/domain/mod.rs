pub mod accounting;
pub mod approvals;
pub mod error;
pub mod events;
pub mod inbox;
pub mod ports;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod templates;
