use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::database::entities::{courses, enrollments, lesson_progress};
use crate::errors::{CoreError, CoreErrorKind, CoreResult};
use crate::services::{CourseProgress, ProgressService};

/// An enrolled course with the learner's progress through it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EnrollmentSummary {
    pub enrollment_id: i32,
    #[schema(value_type = Object)]
    pub course: courses::Model,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: CourseProgress,
}

#[derive(Clone)]
pub struct EnrollmentService {
    db: DatabaseConnection,
}

impl EnrollmentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Enroll in a published course. Enrolling twice returns the existing row.
    pub async fn enroll(&self, profile_id: i32, course_id: i32) -> CoreResult<enrollments::Model> {
        let course = courses::Entity::find_by_id(course_id)
            .one(&self.db)
            .await?
            .filter(|course| course.is_published)
            .ok_or_else(|| CoreError::not_found("Course", course_id.to_string()))?;

        if let Some(existing) = self.find(profile_id, course.id).await? {
            return Ok(existing);
        }

        let inserted = enrollments::ActiveModel {
            profile_id: Set(profile_id),
            course_id: Set(course.id),
            enrolled_at: Set(Utc::now()),
            completed_at: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        let enrollment = match inserted.map_err(CoreError::from) {
            Ok(enrollment) => enrollment,
            // A concurrent enroll won the insert
            Err(err) if err.kind() == CoreErrorKind::Conflict => {
                return self.find(profile_id, course.id).await?.ok_or(err);
            }
            Err(err) => return Err(err),
        };

        tracing::info!(profile_id, course_id, "Enrolled");
        Ok(enrollment)
    }

    /// Drop an enrollment together with the progress recorded under it
    pub async fn unenroll(&self, profile_id: i32, course_id: i32) -> CoreResult<()> {
        let enrollment = self
            .find(profile_id, course_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Enrollment", course_id.to_string()))?;

        let txn = self.db.begin().await?;

        lesson_progress::Entity::delete_many()
            .filter(lesson_progress::Column::ProfileId.eq(profile_id))
            .filter(lesson_progress::Column::CourseId.eq(course_id))
            .exec(&txn)
            .await?;
        enrollments::Entity::delete_by_id(enrollment.id).exec(&txn).await?;

        txn.commit().await?;

        tracing::info!(profile_id, course_id, "Unenrolled");
        Ok(())
    }

    pub async fn list_enrollments(&self, profile_id: i32) -> CoreResult<Vec<EnrollmentSummary>> {
        let rows = enrollments::Entity::find()
            .filter(enrollments::Column::ProfileId.eq(profile_id))
            .order_by_desc(enrollments::Column::EnrolledAt)
            .find_also_related(courses::Entity)
            .all(&self.db)
            .await?;

        let progress = ProgressService::new(self.db.clone());
        let mut summaries = Vec::with_capacity(rows.len());

        for (enrollment, course) in rows {
            let Some(course) = course else {
                continue;
            };
            summaries.push(EnrollmentSummary {
                enrollment_id: enrollment.id,
                progress: progress.progress_summary(profile_id, course.id).await?,
                course,
                enrolled_at: enrollment.enrolled_at,
                completed_at: enrollment.completed_at,
            });
        }

        Ok(summaries)
    }

    pub async fn is_enrolled(&self, profile_id: i32, course_id: i32) -> CoreResult<bool> {
        let count = enrollments::Entity::find()
            .filter(enrollments::Column::ProfileId.eq(profile_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn find(
        &self,
        profile_id: i32,
        course_id: i32,
    ) -> CoreResult<Option<enrollments::Model>> {
        Ok(enrollments::Entity::find()
            .filter(enrollments::Column::ProfileId.eq(profile_id))
            .filter(enrollments::Column::CourseId.eq(course_id))
            .one(&self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::profiles;
    use crate::database::test_utils::{create_course, create_profile, setup_test_db};
    use crate::errors::CoreErrorKind;

    #[tokio::test]
    async fn enrolling_twice_is_idempotent() {
        let db = setup_test_db().await;
        let fixture = create_course(&db, true, 3).await;
        let learner = create_profile(&db, profiles::ROLE_STUDENT).await;
        let service = EnrollmentService::new(db);

        let first = service.enroll(learner.id, fixture.course.id).await.unwrap();
        let second = service.enroll(learner.id, fixture.course.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(service.is_enrolled(learner.id, fixture.course.id).await.unwrap());

        let listed = service.list_enrollments(learner.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].progress.total_lessons, 3);
        assert_eq!(listed[0].progress.percent, 0);
    }

    #[tokio::test]
    async fn concurrent_enrolls_share_one_row() {
        let db = setup_test_db().await;
        let fixture = create_course(&db, true, 1).await;
        let learner = create_profile(&db, profiles::ROLE_STUDENT).await;
        let service = EnrollmentService::new(db.clone());

        let (a, b) = tokio::join!(
            service.enroll(learner.id, fixture.course.id),
            service.enroll(learner.id, fixture.course.id)
        );
        assert_eq!(a.unwrap().id, b.unwrap().id);
        assert_eq!(enrollments::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn drafts_cannot_be_enrolled() {
        let db = setup_test_db().await;
        let fixture = create_course(&db, false, 1).await;
        let learner = create_profile(&db, profiles::ROLE_STUDENT).await;

        let err = EnrollmentService::new(db)
            .enroll(learner.id, fixture.course.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn unenroll_removes_progress() {
        let db = setup_test_db().await;
        let fixture = create_course(&db, true, 2).await;
        let learner = create_profile(&db, profiles::ROLE_STUDENT).await;
        let service = EnrollmentService::new(db.clone());
        service.enroll(learner.id, fixture.course.id).await.unwrap();

        ProgressService::new(db.clone())
            .record_progress(&learner, fixture.lesson_ids[1], 50, None)
            .await
            .unwrap();

        service.unenroll(learner.id, fixture.course.id).await.unwrap();
        assert!(!service.is_enrolled(learner.id, fixture.course.id).await.unwrap());

        let remaining = lesson_progress::Entity::find().count(&db).await.unwrap();
        assert_eq!(remaining, 0);

        let err = service
            .unenroll(learner.id, fixture.course.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }
}
