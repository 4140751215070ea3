use anyhow::Result;
use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::database::entities::{courses, lessons, profiles, sections};
use crate::services::AuthService;

const DEMO_INSTRUCTOR_EMAIL: &str = "instructor@lectern.dev";
const DEMO_INSTRUCTOR_PASSWORD: &str = "lectern-demo";

struct DemoLesson {
    title: &'static str,
    video_url: &'static str,
    duration_seconds: i32,
    is_preview: bool,
}

struct DemoSection {
    title: &'static str,
    lessons: &'static [DemoLesson],
}

struct DemoCourse {
    title: &'static str,
    slug: &'static str,
    description: &'static str,
    category: &'static str,
    level: &'static str,
    price_cents: i64,
    sections: &'static [DemoSection],
}

const DEMO_COURSES: &[DemoCourse] = &[
    DemoCourse {
        title: "Rust for Backend Developers",
        slug: "rust-for-backend-developers",
        description: "Ownership, async and building HTTP services in Rust.",
        category: "Programming",
        level: "intermediate",
        price_cents: 4900,
        sections: &[
            DemoSection {
                title: "Getting started",
                lessons: &[
                    DemoLesson {
                        title: "Welcome",
                        video_url: "https://videos.lectern.dev/rust/welcome.mp4",
                        duration_seconds: 180,
                        is_preview: true,
                    },
                    DemoLesson {
                        title: "Ownership in practice",
                        video_url: "https://videos.lectern.dev/rust/ownership.mp4",
                        duration_seconds: 900,
                        is_preview: false,
                    },
                ],
            },
            DemoSection {
                title: "Async services",
                lessons: &[
                    DemoLesson {
                        title: "Tokio basics",
                        video_url: "https://videos.lectern.dev/rust/tokio.mp4",
                        duration_seconds: 1200,
                        is_preview: false,
                    },
                    DemoLesson {
                        title: "Routing with axum",
                        video_url: "https://videos.lectern.dev/rust/axum.mp4",
                        duration_seconds: 1500,
                        is_preview: false,
                    },
                ],
            },
        ],
    },
    DemoCourse {
        title: "Prompting Fundamentals",
        slug: "prompting-fundamentals",
        description: "Write clear prompts and evaluate model answers.",
        category: "AI",
        level: "beginner",
        price_cents: 0,
        sections: &[DemoSection {
            title: "Foundations",
            lessons: &[
                DemoLesson {
                    title: "What a model sees",
                    video_url: "https://videos.lectern.dev/ai/context.mp4",
                    duration_seconds: 600,
                    is_preview: true,
                },
                DemoLesson {
                    title: "Iterating on prompts",
                    video_url: "https://videos.lectern.dev/ai/iterate.mp4",
                    duration_seconds: 840,
                    is_preview: false,
                },
            ],
        }],
    },
];

/// Insert a demo instructor with two published courses. Safe to re-run.
pub async fn seed_demo(db: &DatabaseConnection, hash_cost: u32) -> Result<()> {
    let existing = profiles::Entity::find()
        .filter(profiles::Column::Email.eq(DEMO_INSTRUCTOR_EMAIL))
        .one(db)
        .await?;

    if existing.is_some() {
        info!("Demo data already present, skipping seed");
        return Ok(());
    }

    info!("Creating demo instructor {}", DEMO_INSTRUCTOR_EMAIL);
    let now = Utc::now();
    let password_hash = AuthService::hash_password(DEMO_INSTRUCTOR_PASSWORD, hash_cost)?;
    let instructor = profiles::ActiveModel {
        email: Set(DEMO_INSTRUCTOR_EMAIL.to_string()),
        password_hash: Set(password_hash),
        full_name: Set("Demo Instructor".to_string()),
        role: Set(profiles::ROLE_INSTRUCTOR.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for demo in DEMO_COURSES {
        let course = courses::ActiveModel {
            instructor_id: Set(instructor.id),
            title: Set(demo.title.to_string()),
            slug: Set(demo.slug.to_string()),
            description: Set(Some(demo.description.to_string())),
            category: Set(demo.category.to_string()),
            level: Set(demo.level.to_string()),
            price_cents: Set(demo.price_cents),
            is_published: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for (section_index, demo_section) in demo.sections.iter().enumerate() {
            let section = sections::ActiveModel {
                course_id: Set(course.id),
                title: Set(demo_section.title.to_string()),
                position: Set(section_index as i32 + 1),
                ..Default::default()
            }
            .insert(db)
            .await?;

            for (lesson_index, demo_lesson) in demo_section.lessons.iter().enumerate() {
                lessons::ActiveModel {
                    section_id: Set(section.id),
                    course_id: Set(course.id),
                    title: Set(demo_lesson.title.to_string()),
                    video_url: Set(Some(demo_lesson.video_url.to_string())),
                    duration_seconds: Set(demo_lesson.duration_seconds),
                    position: Set(lesson_index as i32 + 1),
                    is_preview: Set(demo_lesson.is_preview),
                    ..Default::default()
                }
                .insert(db)
                .await?;
            }
        }

        info!("Seeded course '{}' (id {})", demo.title, course.id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{setup_test_db, TEST_HASH_COST};

    #[tokio::test]
    async fn seed_is_idempotent() {
        let db = setup_test_db().await;

        seed_demo(&db, TEST_HASH_COST).await.expect("first seed");
        seed_demo(&db, TEST_HASH_COST).await.expect("second seed");

        let course_count = courses::Entity::find().count(&db).await.unwrap();
        assert_eq!(course_count, DEMO_COURSES.len() as u64);

        let lesson_count = lessons::Entity::find().count(&db).await.unwrap();
        assert_eq!(lesson_count, 6);
    }
}
