#![cfg(test)]

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::database::entities::{courses, lessons, profiles, sections};

/// Lowest cost bcrypt accepts
pub const TEST_HASH_COST: u32 = 4;

pub async fn setup_test_db() -> DatabaseConnection {
    // In-memory SQLite; sea-orm keeps a single connection for memory URLs
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    crate::database::setup_database(&db)
        .await
        .expect("Failed to run migrations");

    db
}

pub async fn create_profile(db: &DatabaseConnection, role: &str) -> profiles::Model {
    let now = Utc::now();
    profiles::ActiveModel {
        email: Set(format!("{}-{}@example.com", role, Uuid::new_v4())),
        password_hash: Set("unused".into()),
        full_name: Set(format!("Test {}", role)),
        role: Set(role.into()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create profile")
}

pub struct CourseFixture {
    pub instructor: profiles::Model,
    pub course: courses::Model,
    /// Lesson ids in playback order
    pub lesson_ids: Vec<i32>,
}

/// A course whose lessons are 100 seconds long, two per section
pub async fn create_course(
    db: &DatabaseConnection,
    published: bool,
    lesson_count: usize,
) -> CourseFixture {
    let instructor = create_profile(db, profiles::ROLE_INSTRUCTOR).await;
    let now = Utc::now();

    let course = courses::ActiveModel {
        instructor_id: Set(instructor.id),
        title: Set("Fixture course".into()),
        slug: Set(format!("fixture-{}", Uuid::new_v4())),
        category: Set("General".into()),
        level: Set("beginner".into()),
        price_cents: Set(0),
        is_published: Set(published),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create course");

    let mut lesson_ids = Vec::with_capacity(lesson_count);
    let mut section_id = 0;

    for index in 0..lesson_count {
        if index % 2 == 0 {
            section_id = sections::ActiveModel {
                course_id: Set(course.id),
                title: Set(format!("Section {}", index / 2 + 1)),
                position: Set((index / 2 + 1) as i32),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create section")
            .id;
        }

        let lesson = lessons::ActiveModel {
            section_id: Set(section_id),
            course_id: Set(course.id),
            title: Set(format!("Lesson {}", index + 1)),
            duration_seconds: Set(100),
            position: Set((index % 2 + 1) as i32),
            is_preview: Set(index == 0),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create lesson");
        lesson_ids.push(lesson.id);
    }

    CourseFixture {
        instructor,
        course,
        lesson_ids,
    }
}
