use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::chat::{ChatMessage, ChatRelay, ChatRole};
use crate::database::entities::{conversations, messages};
use crate::errors::{CoreError, CoreResult};
use crate::services::ValidationService;

pub const DEFAULT_TITLE: &str = "New chat";
const TITLE_CHARS: usize = 60;
const MAX_MESSAGE_CHARS: usize = 20_000;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationHistory {
    #[schema(value_type = Object)]
    pub conversation: conversations::Model,
    #[schema(value_type = Vec<Object>)]
    pub messages: Vec<messages::Model>,
}

/// Result of a chat turn inside a stored conversation
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatTurn {
    #[schema(value_type = Object)]
    pub conversation: conversations::Model,
    #[schema(value_type = Object)]
    pub user_message: messages::Model,
    #[schema(value_type = Object)]
    pub reply: messages::Model,
}

/// Title derived from a message: whitespace collapsed, first 60 characters
pub fn title_from_message(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let title: String = collapsed.chars().take(TITLE_CHARS).collect();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

#[derive(Clone)]
pub struct ConversationService {
    db: DatabaseConnection,
}

impl ConversationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_conversation(
        &self,
        profile_id: i32,
        title: Option<&str>,
    ) -> CoreResult<conversations::Model> {
        let title = ValidationService::optional_text("title", title, 200)?
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let now = Utc::now();

        let conversation = conversations::ActiveModel {
            profile_id: Set(profile_id),
            title: Set(title),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(conversation)
    }

    /// Most recently active first
    pub async fn list_conversations(&self, profile_id: i32) -> CoreResult<Vec<conversations::Model>> {
        Ok(conversations::Entity::find()
            .filter(conversations::Column::ProfileId.eq(profile_id))
            .order_by_desc(conversations::Column::UpdatedAt)
            .order_by_desc(conversations::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn get_history(
        &self,
        profile_id: i32,
        conversation_id: i32,
    ) -> CoreResult<ConversationHistory> {
        let conversation = self.find_owned(profile_id, conversation_id).await?;
        let messages = self.messages(conversation.id).await?;

        Ok(ConversationHistory {
            conversation,
            messages,
        })
    }

    pub async fn rename(
        &self,
        profile_id: i32,
        conversation_id: i32,
        title: &str,
    ) -> CoreResult<conversations::Model> {
        let conversation = self.find_owned(profile_id, conversation_id).await?;
        let mut active: conversations::ActiveModel = conversation.into();
        active.title = Set(ValidationService::required_text("title", title, 200)?);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete(&self, profile_id: i32, conversation_id: i32) -> CoreResult<()> {
        let conversation = self.find_owned(profile_id, conversation_id).await?;
        conversations::Entity::delete_by_id(conversation.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Store a message and bump the conversation's `updated_at`.
    /// Only user input is length-checked; replies are stored as returned.
    pub async fn append_message(
        &self,
        conversation_id: i32,
        role: ChatRole,
        content: &str,
    ) -> CoreResult<messages::Model> {
        let content = match role {
            ChatRole::User => {
                ValidationService::required_text("content", content, MAX_MESSAGE_CHARS)?
            }
            ChatRole::Assistant | ChatRole::System => content.to_string(),
        };
        let now = Utc::now();

        let message = messages::ActiveModel {
            conversation_id: Set(conversation_id),
            role: Set(role.as_str().to_string()),
            content: Set(content),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        conversations::ActiveModel {
            id: Set(conversation_id),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(message)
    }

    /// Store the user's message, relay the whole history and store the reply.
    /// On relay failure the user's message stays stored and the error is returned.
    pub async fn send_message(
        &self,
        profile_id: i32,
        conversation_id: i32,
        content: &str,
        relay: &ChatRelay,
    ) -> CoreResult<ChatTurn> {
        let conversation = self.find_owned(profile_id, conversation_id).await?;
        let user_message = self
            .append_message(conversation.id, ChatRole::User, content)
            .await?;

        let stored = self.messages(conversation.id).await?;
        let history = stored
            .iter()
            .map(|message| -> CoreResult<ChatMessage> {
                let role = message.role.parse::<ChatRole>()?;
                Ok(ChatMessage::new(role, message.content.clone()))
            })
            .collect::<CoreResult<Vec<_>>>()?;

        if conversation.title == DEFAULT_TITLE {
            if let Some(first) = history.iter().find(|m| m.role == ChatRole::User) {
                self.retitle(conversation.id, &title_from_message(&first.content))
                    .await?;
            }
        }

        let reply = relay.relay(&history).await.map_err(|e| {
            tracing::warn!(conversation_id, error = %e, "Chat relay failed");
            CoreError::from(e)
        })?;

        let reply = self
            .append_message(conversation.id, ChatRole::Assistant, &reply)
            .await?;
        let conversation = self.find_owned(profile_id, conversation.id).await?;

        Ok(ChatTurn {
            conversation,
            user_message,
            reply,
        })
    }

    async fn retitle(&self, conversation_id: i32, title: &str) -> CoreResult<()> {
        conversations::ActiveModel {
            id: Set(conversation_id),
            title: Set(title.to_string()),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn messages(&self, conversation_id: i32) -> CoreResult<Vec<messages::Model>> {
        Ok(messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(conversation_id))
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn find_owned(
        &self,
        profile_id: i32,
        conversation_id: i32,
    ) -> CoreResult<conversations::Model> {
        conversations::Entity::find_by_id(conversation_id)
            .filter(conversations::Column::ProfileId.eq(profile_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("Conversation", conversation_id.to_string()))
    }
}
