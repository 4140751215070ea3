//! Course catalog, outlines and instructor authoring
//!
//! Listing loads every published course and then filters, sorts and pages in
//! memory via [`apply_catalog_query`]. Outlines nest lessons inside their
//! sections, both ordered by `position`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::database::entities::{courses, enrollments, lessons, profiles, sections};
use crate::errors::{CoreError, CoreResult};
use crate::services::ValidationService;

pub const DEFAULT_PER_PAGE: u64 = 12;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSort {
    #[default]
    Newest,
    Oldest,
    Title,
    PriceAsc,
    PriceDesc,
    Popular,
}

/// Catalog filters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub sort: Option<CatalogSort>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseSummary {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub level: String,
    pub price_cents: i64,
    pub thumbnail_url: Option<String>,
    pub instructor_id: i32,
    pub instructor_name: String,
    pub enrollment_count: u64,
    pub lesson_count: u64,
    pub created_at: DateTime<Utc>,
}

impl CourseSummary {
    fn new(course: courses::Model, instructor_name: String, enrollment_count: u64, lesson_count: u64) -> Self {
        Self {
            id: course.id,
            slug: course.slug,
            title: course.title,
            description: course.description,
            category: course.category,
            level: course.level,
            price_cents: course.price_cents,
            thumbnail_url: course.thumbnail_url,
            instructor_id: course.instructor_id,
            instructor_name,
            enrollment_count,
            lesson_count,
            created_at: course.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CoursePage {
    pub items: Vec<CourseSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Lesson as listed in an outline. Video and body are only served by the lesson view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LessonSummary {
    pub id: i32,
    pub section_id: i32,
    pub title: String,
    pub duration_seconds: i32,
    pub position: i32,
    pub is_preview: bool,
}

impl From<&lessons::Model> for LessonSummary {
    fn from(lesson: &lessons::Model) -> Self {
        Self {
            id: lesson.id,
            section_id: lesson.section_id,
            title: lesson.title.clone(),
            duration_seconds: lesson.duration_seconds,
            position: lesson.position,
            is_preview: lesson.is_preview,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SectionOutline {
    pub id: i32,
    pub title: String,
    pub position: i32,
    pub lessons: Vec<LessonSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseOutline {
    #[schema(value_type = Object)]
    pub course: courses::Model,
    pub instructor_name: String,
    pub sections: Vec<SectionOutline>,
}

impl CourseOutline {
    /// Lessons flattened in playback order
    pub fn ordered_lessons(&self) -> impl Iterator<Item = &LessonSummary> {
        self.sections.iter().flat_map(|section| section.lessons.iter())
    }

    pub fn lesson_count(&self) -> usize {
        self.ordered_lessons().count()
    }

    pub fn contains_lesson(&self, lesson_id: i32) -> bool {
        self.ordered_lessons().any(|lesson| lesson.id == lesson_id)
    }

    /// The lesson after `current_id`, or `None` at the end or for an unknown id
    pub fn next_lesson(&self, current_id: i32) -> Option<&LessonSummary> {
        let mut lessons = self.ordered_lessons();
        lessons.by_ref().find(|lesson| lesson.id == current_id)?;
        lessons.next()
    }

    pub fn previous_lesson(&self, current_id: i32) -> Option<&LessonSummary> {
        let mut previous = None;
        for lesson in self.ordered_lessons() {
            if lesson.id == current_id {
                return previous;
            }
            previous = Some(lesson);
        }
        None
    }
}

/// Filter, sort and page a catalog result set
pub fn apply_catalog_query(mut items: Vec<CourseSummary>, query: &CatalogQuery) -> CoursePage {
    let search = non_blank(query.search.as_deref()).map(str::to_lowercase);
    let category = non_blank(query.category.as_deref());
    let level = non_blank(query.level.as_deref());

    items.retain(|course| {
        let matches_search = search.as_deref().map_or(true, |needle| {
            course.title.to_lowercase().contains(needle)
                || course
                    .description
                    .as_deref()
                    .is_some_and(|description| description.to_lowercase().contains(needle))
        });
        let matches_category =
            category.map_or(true, |category| course.category.eq_ignore_ascii_case(category));
        let matches_level = level.map_or(true, |level| course.level.eq_ignore_ascii_case(level));

        matches_search && matches_category && matches_level
    });

    match query.sort.unwrap_or_default() {
        CatalogSort::Newest => items.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
        }),
        CatalogSort::Oldest => items.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
        }),
        CatalogSort::Title => items.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        }),
        CatalogSort::PriceAsc => items.sort_by(|a, b| {
            a.price_cents.cmp(&b.price_cents).then_with(|| a.id.cmp(&b.id))
        }),
        CatalogSort::PriceDesc => items.sort_by(|a, b| {
            b.price_cents.cmp(&a.price_cents).then_with(|| a.id.cmp(&b.id))
        }),
        CatalogSort::Popular => items.sort_by(|a, b| {
            b.enrollment_count
                .cmp(&a.enrollment_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        }),
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let total = items.len() as u64;
    let start = (page - 1).saturating_mul(per_page);

    let items = items
        .into_iter()
        .skip(usize::try_from(start).unwrap_or(usize::MAX))
        .take(per_page as usize)
        .collect();

    CoursePage {
        items,
        total,
        page,
        per_page,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CourseInput {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub level: String,
    #[serde(default)]
    pub price_cents: i64,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price_cents: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SectionInput {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LessonInput {
    pub title: String,
    pub video_url: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub duration_seconds: i32,
    #[serde(default)]
    pub is_preview: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub content: Option<String>,
    pub duration_seconds: Option<i32>,
    pub is_preview: Option<bool>,
}

#[derive(Clone)]
pub struct CatalogService {
    db: DatabaseConnection,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_courses(&self, query: &CatalogQuery) -> CoreResult<CoursePage> {
        let published = courses::Entity::find()
            .filter(courses::Column::IsPublished.eq(true))
            .all(&self.db)
            .await?;

        let enrollment_counts = self.enrollment_counts().await?;
        let lesson_counts = self.lesson_counts().await?;
        let instructor_names = self
            .instructor_names(published.iter().map(|course| course.instructor_id))
            .await?;

        let summaries = published
            .into_iter()
            .map(|course| {
                let enrolled = enrollment_counts.get(&course.id).copied().unwrap_or(0);
                let lesson_count = lesson_counts.get(&course.id).copied().unwrap_or(0);
                let instructor = instructor_names
                    .get(&course.instructor_id)
                    .cloned()
                    .unwrap_or_default();
                CourseSummary::new(course, instructor, enrolled, lesson_count)
            })
            .collect();

        Ok(apply_catalog_query(summaries, query))
    }

    /// Distinct categories of published courses
    pub async fn categories(&self) -> CoreResult<Vec<String>> {
        let mut categories: Vec<String> = courses::Entity::find()
            .select_only()
            .column(courses::Column::Category)
            .filter(courses::Column::IsPublished.eq(true))
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;

        categories.sort_by_key(|category| category.to_lowercase());
        categories.dedup();
        Ok(categories)
    }

    /// Resolve a course by numeric id or slug
    /// Look up by id when `key` is numeric, falling back to the slug
    pub async fn find_course(&self, key: &str) -> CoreResult<courses::Model> {
        if let Ok(id) = key.parse::<i32>() {
            if let Some(course) = courses::Entity::find_by_id(id).one(&self.db).await? {
                return Ok(course);
            }
        }

        courses::Entity::find()
            .filter(courses::Column::Slug.eq(key))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Course", key))
    }

    /// Outline for a viewer. Unpublished courses only exist for their instructor and admins.
    pub async fn get_course_outline(
        &self,
        key: &str,
        viewer: Option<&profiles::Model>,
    ) -> CoreResult<CourseOutline> {
        let course = self.find_course(key).await?;

        if !course.is_published && !viewer.is_some_and(|viewer| can_edit(&course, viewer)) {
            return Err(CoreError::not_found("Course", key));
        }

        self.outline_for(course).await
    }

    /// Build the nested outline for an already loaded course
    pub async fn outline_for(&self, course: courses::Model) -> CoreResult<CourseOutline> {
        let course_sections = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course.id))
            .order_by_asc(sections::Column::Position)
            .order_by_asc(sections::Column::Id)
            .all(&self.db)
            .await?;

        let course_lessons = lessons::Entity::find()
            .filter(lessons::Column::CourseId.eq(course.id))
            .order_by_asc(lessons::Column::Position)
            .order_by_asc(lessons::Column::Id)
            .all(&self.db)
            .await?;

        let sections = course_sections
            .into_iter()
            .map(|section| SectionOutline {
                lessons: course_lessons
                    .iter()
                    .filter(|lesson| lesson.section_id == section.id)
                    .map(LessonSummary::from)
                    .collect(),
                id: section.id,
                title: section.title,
                position: section.position,
            })
            .collect();

        let instructor_name = profiles::Entity::find_by_id(course.instructor_id)
            .one(&self.db)
            .await?
            .map(|profile| profile.full_name)
            .unwrap_or_default();

        Ok(CourseOutline {
            course,
            instructor_name,
            sections,
        })
    }

    pub async fn create_course(
        &self,
        author: &profiles::Model,
        input: CourseInput,
    ) -> CoreResult<courses::Model> {
        if !author.can_author() {
            return Err(CoreError::forbidden("Only instructors can create courses"));
        }

        let title = ValidationService::required_text("title", &input.title, 200)?;
        let slug = self.unique_slug(&ValidationService::slugify(&title)).await?;
        let now = Utc::now();

        let course = courses::ActiveModel {
            instructor_id: Set(author.id),
            slug: Set(slug),
            description: Set(ValidationService::optional_text(
                "description",
                input.description.as_deref(),
                5000,
            )?),
            category: Set(ValidationService::required_text("category", &input.category, 50)?),
            level: Set(validate_level(&input.level)?),
            price_cents: Set(ValidationService::non_negative("price_cents", input.price_cents)?),
            thumbnail_url: Set(optional_url("thumbnail_url", input.thumbnail_url.as_deref())?),
            is_published: Set(input.is_published),
            title: Set(title),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::info!(course_id = course.id, slug = %course.slug, "Course created");
        Ok(course)
    }

    /// Apply a partial update. The slug stays fixed so existing links keep working.
    pub async fn update_course(
        &self,
        editor: &profiles::Model,
        course_id: i32,
        update: CourseUpdate,
    ) -> CoreResult<courses::Model> {
        let course = self.ensure_can_edit(editor, course_id).await?;
        let mut active: courses::ActiveModel = course.into();

        if let Some(title) = update.title.as_deref() {
            active.title = Set(ValidationService::required_text("title", title, 200)?);
        }
        if let Some(description) = update.description.as_deref() {
            active.description =
                Set(ValidationService::optional_text("description", Some(description), 5000)?);
        }
        if let Some(category) = update.category.as_deref() {
            active.category = Set(ValidationService::required_text("category", category, 50)?);
        }
        if let Some(level) = update.level.as_deref() {
            active.level = Set(validate_level(level)?);
        }
        if let Some(price_cents) = update.price_cents {
            active.price_cents = Set(ValidationService::non_negative("price_cents", price_cents)?);
        }
        if let Some(thumbnail_url) = update.thumbnail_url.as_deref() {
            active.thumbnail_url = Set(optional_url("thumbnail_url", Some(thumbnail_url))?);
        }
        if let Some(is_published) = update.is_published {
            active.is_published = Set(is_published);
        }

        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_course(&self, editor: &profiles::Model, course_id: i32) -> CoreResult<()> {
        let course = self.ensure_can_edit(editor, course_id).await?;
        courses::Entity::delete_by_id(course.id).exec(&self.db).await?;

        tracing::info!(course_id, "Course deleted");
        Ok(())
    }

    pub async fn add_section(
        &self,
        editor: &profiles::Model,
        course_id: i32,
        input: SectionInput,
    ) -> CoreResult<sections::Model> {
        let course = self.ensure_can_edit(editor, course_id).await?;

        let position = sections::Entity::find()
            .filter(sections::Column::CourseId.eq(course.id))
            .order_by_desc(sections::Column::Position)
            .one(&self.db)
            .await?
            .map_or(1, |last| last.position + 1);

        let section = sections::ActiveModel {
            course_id: Set(course.id),
            title: Set(ValidationService::required_text("title", &input.title, 200)?),
            position: Set(position),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(section)
    }

    pub async fn add_lesson(
        &self,
        editor: &profiles::Model,
        section_id: i32,
        input: LessonInput,
    ) -> CoreResult<lessons::Model> {
        let section = sections::Entity::find_by_id(section_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Section", section_id.to_string()))?;
        self.ensure_can_edit(editor, section.course_id).await?;

        let position = lessons::Entity::find()
            .filter(lessons::Column::SectionId.eq(section.id))
            .order_by_desc(lessons::Column::Position)
            .one(&self.db)
            .await?
            .map_or(1, |last| last.position + 1);

        let lesson = lessons::ActiveModel {
            section_id: Set(section.id),
            course_id: Set(section.course_id),
            title: Set(ValidationService::required_text("title", &input.title, 200)?),
            video_url: Set(optional_url("video_url", input.video_url.as_deref())?),
            content: Set(ValidationService::optional_text(
                "content",
                input.content.as_deref(),
                50_000,
            )?),
            duration_seconds: Set(validate_duration(input.duration_seconds)?),
            position: Set(position),
            is_preview: Set(input.is_preview),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        tracing::debug!(lesson_id = lesson.id, section_id, "Lesson added");
        Ok(lesson)
    }

    pub async fn update_lesson(
        &self,
        editor: &profiles::Model,
        lesson_id: i32,
        update: LessonUpdate,
    ) -> CoreResult<lessons::Model> {
        let lesson = self.find_lesson(lesson_id).await?;
        self.ensure_can_edit(editor, lesson.course_id).await?;
        let mut active: lessons::ActiveModel = lesson.into();

        if let Some(title) = update.title.as_deref() {
            active.title = Set(ValidationService::required_text("title", title, 200)?);
        }
        if let Some(video_url) = update.video_url.as_deref() {
            active.video_url = Set(optional_url("video_url", Some(video_url))?);
        }
        if let Some(content) = update.content.as_deref() {
            active.content = Set(ValidationService::optional_text("content", Some(content), 50_000)?);
        }
        if let Some(duration_seconds) = update.duration_seconds {
            active.duration_seconds = Set(validate_duration(duration_seconds)?);
        }
        if let Some(is_preview) = update.is_preview {
            active.is_preview = Set(is_preview);
        }

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_lesson(&self, editor: &profiles::Model, lesson_id: i32) -> CoreResult<()> {
        let lesson = self.find_lesson(lesson_id).await?;
        self.ensure_can_edit(editor, lesson.course_id).await?;
        lessons::Entity::delete_by_id(lesson.id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn find_lesson(&self, lesson_id: i32) -> CoreResult<lessons::Model> {
        lessons::Entity::find_by_id(lesson_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Lesson", lesson_id.to_string()))
    }

    async fn ensure_can_edit(
        &self,
        editor: &profiles::Model,
        course_id: i32,
    ) -> CoreResult<courses::Model> {
        let course = courses::Entity::find_by_id(course_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Course", course_id.to_string()))?;

        if !can_edit(&course, editor) {
            return Err(CoreError::forbidden(
                "Only the course instructor can change this course",
            ));
        }

        Ok(course)
    }

    async fn unique_slug(&self, base: &str) -> CoreResult<String> {
        let mut candidate = base.to_string();
        let mut suffix = 2;

        loop {
            let taken = courses::Entity::find()
                .filter(courses::Column::Slug.eq(candidate.as_str()))
                .count(&self.db)
                .await?;
            if taken == 0 {
                return Ok(candidate);
            }
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
    }

    async fn enrollment_counts(&self) -> CoreResult<HashMap<i32, u64>> {
        let rows: Vec<(i32, i64)> = enrollments::Entity::find()
            .select_only()
            .column(enrollments::Column::CourseId)
            .column_as(Expr::col(enrollments::Column::Id).count(), "count")
            .group_by(enrollments::Column::CourseId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(course_id, count)| (course_id, count.max(0) as u64))
            .collect())
    }

    async fn lesson_counts(&self) -> CoreResult<HashMap<i32, u64>> {
        let rows: Vec<(i32, i64)> = lessons::Entity::find()
            .select_only()
            .column(lessons::Column::CourseId)
            .column_as(Expr::col(lessons::Column::Id).count(), "count")
            .group_by(lessons::Column::CourseId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(course_id, count)| (course_id, count.max(0) as u64))
            .collect())
    }

    async fn instructor_names(
        &self,
        ids: impl Iterator<Item = i32>,
    ) -> CoreResult<HashMap<i32, String>> {
        let mut ids: Vec<i32> = ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let instructors = profiles::Entity::find()
            .filter(profiles::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;

        Ok(instructors
            .into_iter()
            .map(|profile| (profile.id, profile.full_name))
            .collect())
    }
}

pub(crate) fn can_edit(course: &courses::Model, profile: &profiles::Model) -> bool {
    profile.is_admin() || course.is_owned_by(profile.id)
}

fn validate_level(level: &str) -> CoreResult<String> {
    let level = level.trim().to_lowercase();
    if !courses::LEVELS.contains(&level.as_str()) {
        return Err(CoreError::invalid_field(
            "level",
            format!("Level must be one of {}", courses::LEVELS.join(", ")),
        ));
    }
    Ok(level)
}

fn validate_duration(duration_seconds: i32) -> CoreResult<i32> {
    ValidationService::non_negative("duration_seconds", i64::from(duration_seconds))?;
    Ok(duration_seconds)
}

fn optional_url(field: &str, value: Option<&str>) -> CoreResult<Option<String>> {
    match non_blank(value) {
        Some(url) => ValidationService::validate_url(field, url).map(Some),
        None => Ok(None),
    }
}
