pub mod attendance;
pub mod dashboard;
pub mod error;
pub mod reports;
pub mod settings;
pub mod users;
