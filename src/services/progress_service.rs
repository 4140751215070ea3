//! Lesson player state: per-lesson progress, course completion and resume points

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::database::entities::{courses, enrollments, lesson_progress, lessons, profiles};
use crate::errors::{CoreError, CoreResult};
use crate::services::catalog_service::can_edit;
use crate::services::{CatalogService, LessonSummary};

/// Share of a lesson's duration that counts as watched, in tenths
const COMPLETION_THRESHOLD_TENTHS: i64 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CourseProgress {
    pub course_id: i32,
    pub completed_lessons: u64,
    pub total_lessons: u64,
    /// 0..=100, rounded down
    pub percent: u8,
    pub last_lesson_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressUpdate {
    /// `None` for preview lessons watched without an enrollment
    #[schema(value_type = Option<Object>)]
    pub progress: Option<lesson_progress::Model>,
    pub course_progress: Option<CourseProgress>,
    pub next_lesson_id: Option<i32>,
    pub course_completed: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LessonView {
    #[schema(value_type = Object)]
    pub lesson: lessons::Model,
    pub course_id: i32,
    pub course_title: String,
    pub is_enrolled: bool,
    #[schema(value_type = Option<Object>)]
    pub progress: Option<lesson_progress::Model>,
    pub previous_lesson_id: Option<i32>,
    pub next_lesson_id: Option<i32>,
}

/// Whether a playback position counts as having watched the lesson
pub fn reaches_completion(position_seconds: i32, duration_seconds: i32) -> bool {
    i64::from(position_seconds) * 10 >= i64::from(duration_seconds) * COMPLETION_THRESHOLD_TENTHS
}

pub fn percent_complete(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (completed.min(total) * 100 / total) as u8
}

fn is_visible(course: &courses::Model, viewer: &profiles::Model) -> bool {
    course.is_published || can_edit(course, viewer)
}

#[derive(Clone)]
pub struct ProgressService {
    db: DatabaseConnection,
    catalog: CatalogService,
}

impl ProgressService {
    pub fn new(db: DatabaseConnection) -> Self {
        let catalog = CatalogService::new(db.clone());
        Self { db, catalog }
    }

    pub async fn record_progress(
        &self,
        viewer: &profiles::Model,
        lesson_id: i32,
        position_seconds: i32,
        completed: Option<bool>,
    ) -> CoreResult<ProgressUpdate> {
        let profile_id = viewer.id;
        let lesson = self.catalog.find_lesson(lesson_id).await?;
        let course = self.load_course(lesson.course_id).await?;
        if !is_visible(&course, viewer) {
            return Err(CoreError::not_found("Lesson", lesson_id.to_string()));
        }
        let outline = self.catalog.outline_for(course).await?;
        let next_lesson_id = outline.next_lesson(lesson.id).map(|next| next.id);

        let Some(enrollment) = self.find_enrollment(profile_id, lesson.course_id).await? else {
            if lesson.is_preview {
                return Ok(ProgressUpdate {
                    progress: None,
                    course_progress: None,
                    next_lesson_id,
                    course_completed: false,
                });
            }
            return Err(CoreError::forbidden("Enroll in this course to track progress"));
        };

        let position = position_seconds.clamp(0, lesson.duration_seconds.max(0));
        let now = Utc::now();
        let existing = lesson_progress::Entity::find()
            .filter(lesson_progress::Column::ProfileId.eq(profile_id))
            .filter(lesson_progress::Column::LessonId.eq(lesson.id))
            .one(&self.db)
            .await?;

        let was_completed = existing.as_ref().is_some_and(|row| row.completed);
        let is_completed = was_completed
            || completed.unwrap_or(false)
            || reaches_completion(position, lesson.duration_seconds);

        let progress = match existing {
            Some(row) => {
                let completed_at = row.completed_at.or(is_completed.then_some(now));
                let mut active: lesson_progress::ActiveModel = row.into();
                active.position_seconds = Set(position);
                active.completed = Set(is_completed);
                active.completed_at = Set(completed_at);
                active.updated_at = Set(now);
                active.update(&self.db).await?
            }
            None => {
                lesson_progress::ActiveModel {
                    profile_id: Set(profile_id),
                    lesson_id: Set(lesson.id),
                    course_id: Set(lesson.course_id),
                    position_seconds: Set(position),
                    completed: Set(is_completed),
                    completed_at: Set(is_completed.then_some(now)),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
        };

        if is_completed && !was_completed {
            tracing::debug!(profile_id, lesson_id, "Lesson completed");
        }

        let course_progress = self.progress_summary(profile_id, lesson.course_id).await?;
        let mut course_completed = enrollment.completed_at.is_some();

        if !course_completed
            && course_progress.total_lessons > 0
            && course_progress.completed_lessons >= course_progress.total_lessons
        {
            let mut active: enrollments::ActiveModel = enrollment.into();
            active.completed_at = Set(Some(now));
            active.update(&self.db).await?;
            course_completed = true;

            tracing::info!(profile_id, course_id = lesson.course_id, "Course completed");
        }

        Ok(ProgressUpdate {
            progress: Some(progress),
            course_progress: Some(course_progress),
            next_lesson_id,
            course_completed,
        })
    }

    pub async fn course_progress(
        &self,
        viewer: &profiles::Model,
        course_id: i32,
    ) -> CoreResult<CourseProgress> {
        let course = self.visible_course(viewer, course_id).await?;
        self.progress_summary(viewer.id, course.id).await
    }

    /// Completion counts without a visibility check
    pub(crate) async fn progress_summary(
        &self,
        profile_id: i32,
        course_id: i32,
    ) -> CoreResult<CourseProgress> {
        let total_lessons = lessons::Entity::find()
            .filter(lessons::Column::CourseId.eq(course_id))
            .count(&self.db)
            .await?;

        let completed_lessons = lesson_progress::Entity::find()
            .filter(lesson_progress::Column::ProfileId.eq(profile_id))
            .filter(lesson_progress::Column::CourseId.eq(course_id))
            .filter(lesson_progress::Column::Completed.eq(true))
            .count(&self.db)
            .await?;

        let last_lesson_id = lesson_progress::Entity::find()
            .select_only()
            .column(lesson_progress::Column::LessonId)
            .filter(lesson_progress::Column::ProfileId.eq(profile_id))
            .filter(lesson_progress::Column::CourseId.eq(course_id))
            .order_by_desc(lesson_progress::Column::UpdatedAt)
            .order_by_desc(lesson_progress::Column::Id)
            .into_tuple::<i32>()
            .one(&self.db)
            .await?;

        Ok(CourseProgress {
            course_id,
            completed_lessons,
            total_lessons,
            percent: percent_complete(completed_lessons, total_lessons),
            last_lesson_id,
        })
    }

    /// First lesson not yet completed in outline order, else the last lesson
    pub async fn resume_lesson(
        &self,
        viewer: &profiles::Model,
        course_id: i32,
    ) -> CoreResult<Option<LessonSummary>> {
        let profile_id = viewer.id;
        let course = self.visible_course(viewer, course_id).await?;
        let outline = self.catalog.outline_for(course).await?;

        let completed: HashSet<i32> = lesson_progress::Entity::find()
            .select_only()
            .column(lesson_progress::Column::LessonId)
            .filter(lesson_progress::Column::ProfileId.eq(profile_id))
            .filter(lesson_progress::Column::CourseId.eq(course_id))
            .filter(lesson_progress::Column::Completed.eq(true))
            .into_tuple::<i32>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let resume = outline
            .ordered_lessons()
            .find(|lesson| !completed.contains(&lesson.id))
            .or_else(|| outline.ordered_lessons().last())
            .cloned();

        Ok(resume)
    }

    /// A lesson with the viewer's progress. Needs an enrollment, a preview lesson or edit rights.
    pub async fn lesson_view(
        &self,
        viewer: &profiles::Model,
        lesson_id: i32,
    ) -> CoreResult<LessonView> {
        let lesson = self.catalog.find_lesson(lesson_id).await?;
        let course = self.load_course(lesson.course_id).await?;
        let editor = can_edit(&course, viewer);

        if !is_visible(&course, viewer) {
            return Err(CoreError::not_found("Lesson", lesson_id.to_string()));
        }

        let is_enrolled = self
            .find_enrollment(viewer.id, course.id)
            .await?
            .is_some();
        if !is_enrolled && !lesson.is_preview && !editor {
            return Err(CoreError::forbidden("Enroll in this course to watch this lesson"));
        }

        let progress = lesson_progress::Entity::find()
            .filter(lesson_progress::Column::ProfileId.eq(viewer.id))
            .filter(lesson_progress::Column::LessonId.eq(lesson.id))
            .one(&self.db)
            .await?;

        let course_id = course.id;
        let course_title = course.title.clone();
        let outline = self.catalog.outline_for(course).await?;

        Ok(LessonView {
            previous_lesson_id: outline.previous_lesson(lesson.id).map(|l| l.id),
            next_lesson_id: outline.next_lesson(lesson.id).map(|l| l.id),
            lesson,
            course_id,
            course_title,
            is_enrolled,
            progress,
        })
    }

    async fn load_course(&self, course_id: i32) -> CoreResult<courses::Model> {
        courses::Entity::find_by_id(course_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Course", course_id.to_string()))
    }

    /// Drafts resolve only for their owner and admins
    async fn visible_course(
        &self,
        viewer: &profiles::Model,
        course_id: i32,
    ) -> CoreResult<courses::Model> {
        let course = self.load_course(course_id).await?;
        if !is_visible(&course, viewer) {
            return Err(CoreError::not_found("Course", course_id.to_string()));
        }
        Ok(course)
    }

    async fn find_enrollment(
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
