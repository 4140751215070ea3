pub mod auth_service;
pub mod catalog_service;
pub mod conversation_service;
pub mod enrollment_service;
pub mod note_service;
pub mod profile_service;
pub mod progress_service;
pub mod storage_service;
pub mod validation;

pub use auth_service::{AuthService, AuthSession};
pub use catalog_service::{
    apply_catalog_query, CatalogQuery, CatalogService, CatalogSort, CourseInput, CourseOutline,
    CoursePage, CourseSummary, CourseUpdate, LessonInput, LessonSummary, LessonUpdate,
    SectionInput, SectionOutline,
};
pub use conversation_service::{ChatTurn, ConversationHistory, ConversationService};
pub use enrollment_service::{EnrollmentService, EnrollmentSummary};
pub use note_service::{NoteInput, NoteService, NoteUpdate};
pub use profile_service::{ProfileService, ProfileUpdate};
pub use progress_service::{CourseProgress, LessonView, ProgressService, ProgressUpdate};
pub use storage_service::{StorageService, StoredFile};
pub use validation::ValidationService;
