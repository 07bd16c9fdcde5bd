pub mod admin;
pub mod billing;
pub mod health;
pub mod me;
