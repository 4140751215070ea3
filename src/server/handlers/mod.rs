pub mod auth;
pub mod chat;
pub mod conversations;
pub mod courses;
pub mod enrollments;
pub mod files;
pub mod health;
pub mod notes;
pub mod profile;
pub mod progress;
