//! Conversation Service
//!
//! Direct (two-person) conversations and their messages.

use std::sync::Arc;

use crate::application::dto::request::SendMessageRequest;
use crate::domain::{
    ConversationRepository, ConversationSummary, Message, NewMessage, RelationshipRepository,
    UserRepository,
};
use crate::shared::error::AppError;
use crate::shared::pagination::{Page, PageRequest};
use crate::shared::snowflake::SnowflakeGenerator;

pub struct ConversationService {
    users: Arc<dyn UserRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    conversations: Arc<dyn ConversationRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl ConversationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        conversations: Arc<dyn ConversationRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            users,
            relationships,
            conversations,
            id_generator,
        }
    }

    /// Most recently active first.
    pub async fn list(&self, user_id: i64, page: PageRequest) -> Result<Page<ConversationSummary>, AppError> {
        let rows = self.conversations.list_for_user(user_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    /// Find or create the direct conversation with `participant_id`.
    /// The flag is true when it was created by this call.
    pub async fn open(
        &self,
        user_id: i64,
        participant_id: i64,
    ) -> Result<(ConversationSummary, bool), AppError> {
        if user_id == participant_id {
            return Err(AppError::BadRequest("You cannot message yourself".into()));
        }

        let other = self
            .users
            .find_by_id(participant_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if self
            .relationships
            .is_blocked_between(user_id, participant_id)
            .await?
        {
            return Err(AppError::forbidden());
        }

        let (conversation, created) = match self.conversations.find_direct(user_id, participant_id).await? {
            Some(existing) => (existing, false),
            None => {
                self.conversations
                    .create_direct(self.id_generator.generate(), user_id, participant_id)
                    .await?
            }
        };

        if created {
            tracing::debug!(conversation_id = conversation.id, "Conversation created");
        }

        Ok((
            ConversationSummary {
                conversation,
                other: other.summary(),
                last_message: None,
            },
            created,
        ))
    }

    /// Newest first. Participants only.
    pub async fn messages(
        &self,
        user_id: i64,
        conversation_id: i64,
        page: PageRequest,
    ) -> Result<Page<Message>, AppError> {
        self.ensure_participant(conversation_id, user_id).await?;

        let rows = self.conversations.messages(conversation_id, page).await?;
        Ok(Page::from_overfetch(rows, page.limit))
    }

    pub async fn send(
        &self,
        user_id: i64,
        conversation_id: i64,
        req: SendMessageRequest,
    ) -> Result<Message, AppError> {
        let content = req.content.trim().to_string();
        let media_url = req.media_url.filter(|url| !url.trim().is_empty());
        if content.is_empty() && media_url.is_none() {
            return Err(AppError::invalid_field(
                "content",
                "A message needs content or an attachment",
            ));
        }

        self.ensure_participant(conversation_id, user_id).await?;

        for other in self.conversations.participants(conversation_id).await? {
            if other != user_id && self.relationships.is_blocked_between(user_id, other).await? {
                return Err(AppError::forbidden());
            }
        }

        self.conversations
            .send_message(&NewMessage {
                id: self.id_generator.generate(),
                conversation_id,
                sender_id: user_id,
                content,
                media_url,
            })
            .await
    }

    async fn ensure_participant(&self, conversation_id: i64, user_id: i64) -> Result<(), AppError> {
        if !self
            .conversations
            .is_participant(conversation_id, user_id)
            .await?
        {
            return Err(AppError::forbidden());
        }
        Ok(())
    }
}
