pub mod attendance;
pub mod backup;
pub mod core;
pub mod dashboard;
pub mod qr;
pub mod reports;
pub mod roster;
pub mod setup;
pub mod templates;
