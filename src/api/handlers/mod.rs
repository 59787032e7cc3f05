pub mod root;
pub mod auth;
pub mod departments;
pub mod makers;
pub mod assignments;
pub mod balance;
pub mod announcements;
pub mod reports;
pub mod admin;
