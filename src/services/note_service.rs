use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::database::entities::{lessons, notes};
use crate::errors::{CoreError, CoreResult};
use crate::services::ValidationService;

const MAX_NOTE_CHARS: usize = 5000;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NoteInput {
    pub lesson_id: i32,
    pub body: String,
    /// Video position the note refers to
    pub timestamp_seconds: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NoteUpdate {
    pub body: Option<String>,
    pub timestamp_seconds: Option<i32>,
}

#[derive(Clone)]
pub struct NoteService {
    db: DatabaseConnection,
}

impl NoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_note(&self, profile_id: i32, input: NoteInput) -> CoreResult<notes::Model> {
        let body = ValidationService::required_text("body", &input.body, MAX_NOTE_CHARS)?;
        let timestamp_seconds = validate_timestamp(input.timestamp_seconds)?;

        let lesson = lessons::Entity::find_by_id(input.lesson_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Lesson", input.lesson_id.to_string()))?;

        let now = Utc::now();
        let note = notes::ActiveModel {
            profile_id: Set(profile_id),
            lesson_id: Set(lesson.id),
            body: Set(body),
            timestamp_seconds: Set(timestamp_seconds),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(note)
    }

    /// The caller's notes, newest first, optionally for a single lesson
    pub async fn list_notes(
        &self,
        profile_id: i32,
        lesson_id: Option<i32>,
    ) -> CoreResult<Vec<notes::Model>> {
        let mut query = notes::Entity::find().filter(notes::Column::ProfileId.eq(profile_id));
        if let Some(lesson_id) = lesson_id {
            query = query.filter(notes::Column::LessonId.eq(lesson_id));
        }

        Ok(query
            .order_by_desc(notes::Column::CreatedAt)
            .order_by_desc(notes::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn update_note(
        &self,
        profile_id: i32,
        note_id: i32,
        update: NoteUpdate,
    ) -> CoreResult<notes::Model> {
        let note = self.find_owned(profile_id, note_id).await?;
        let mut active: notes::ActiveModel = note.into();

        if let Some(body) = update.body.as_deref() {
            active.body = Set(ValidationService::required_text("body", body, MAX_NOTE_CHARS)?);
        }
        if update.timestamp_seconds.is_some() {
            active.timestamp_seconds = Set(validate_timestamp(update.timestamp_seconds)?);
        }

        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_note(&self, profile_id: i32, note_id: i32) -> CoreResult<()> {
        let note = self.find_owned(profile_id, note_id).await?;
        notes::Entity::delete_by_id(note.id).exec(&self.db).await?;
        Ok(())
    }

    // Notes of other users are reported as missing
    async fn find_owned(&self, profile_id: i32, note_id: i32) -> CoreResult<notes::Model> {
        notes::Entity::find_by_id(note_id)
            .filter(notes::Column::ProfileId.eq(profile_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Note", note_id.to_string()))
    }
}

fn validate_timestamp(timestamp_seconds: Option<i32>) -> CoreResult<Option<i32>> {
    match timestamp_seconds {
        Some(seconds) => {
            ValidationService::non_negative("timestamp_seconds", i64::from(seconds))?;
            Ok(Some(seconds))
        }
        None => Ok(None),
    }
}
