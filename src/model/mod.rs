pub mod attendance;
pub mod role;
pub mod settings;
pub mod user;
