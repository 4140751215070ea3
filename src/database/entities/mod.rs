pub mod conversations;
pub mod courses;
pub mod enrollments;
pub mod files;
pub mod lesson_progress;
pub mod lessons;
pub mod messages;
pub mod notes;
pub mod profiles;
pub mod sections;
pub mod user_sessions;
