//! Read receipts for direct chats.
//!
//! A mark is the last message id a participant acknowledged in a
//! conversation. Marks only move forward; unread counts are derived on
//! demand from the message store.

use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{ReadMark, UnreadCount};
use crate::repository::{ConversationDirectory, MessageStore, ReadMarkStore};

pub struct ReadReceiptTracker {
    marks: Arc<dyn ReadMarkStore>,
    messages: Arc<dyn MessageStore>,
    directory: Arc<dyn ConversationDirectory>,
}

impl ReadReceiptTracker {
    pub fn new(
        marks: Arc<dyn ReadMarkStore>,
        messages: Arc<dyn MessageStore>,
        directory: Arc<dyn ConversationDirectory>,
    ) -> Self {
        Self {
            marks,
            messages,
            directory,
        }
    }

    /// Record that `participant_id` has read up to `message_id`.
    ///
    /// Older or repeated acknowledgments leave the mark untouched. Returns
    /// the mark as it stands afterwards.
    pub async fn acknowledge(
        &self,
        conversation_id: i64,
        participant_id: i64,
        message_id: i64,
    ) -> AppResult<ReadMark> {
        let update = self
            .marks
            .advance(conversation_id, participant_id, message_id)
            .await?;

        metrics::record_acknowledgment(update.advanced);
        debug!(
            chat_id = conversation_id,
            user_id = participant_id,
            message_id,
            advanced = update.advanced,
            "read acknowledgment"
        );
        Ok(update.mark)
    }

    /// Stored mark, or a "never read" mark when the pair has none.
    pub async fn get_mark(&self, conversation_id: i64, participant_id: i64) -> AppResult<ReadMark> {
        Ok(self
            .marks
            .load(conversation_id, participant_id)
            .await?
            .unwrap_or_else(|| ReadMark::never_read(conversation_id, participant_id)))
    }

    /// Messages from other participants after the mark, or all of them
    /// when nothing was acknowledged yet.
    pub async fn get_unread_count(
        &self,
        conversation_id: i64,
        participant_id: i64,
    ) -> AppResult<i64> {
        let after = self
            .marks
            .load(conversation_id, participant_id)
            .await?
            .and_then(|mark| mark.last_acknowledged_message_id);

        self.messages
            .count_messages_after(conversation_id, participant_id, after)
            .await
    }

    /// One count per conversation of the participant, in directory order.
    pub async fn get_unread_counts(&self, participant_id: i64) -> AppResult<Vec<UnreadCount>> {
        let conversations = self.directory.list_conversations_for(participant_id).await?;

        // try_join_all keeps input order
        try_join_all(conversations.into_iter().map(|conversation_id| async move {
            Ok::<_, AppError>(UnreadCount {
                conversation_id,
                unread_count: self.get_unread_count(conversation_id, participant_id).await?,
            })
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MarkUpdate;
    use crate::repository::memory::MemoryStore;
    use crate::repository::ChatRepository;
    use async_trait::async_trait;

    const A: i64 = 1;
    const B: i64 = 2;

    fn tracker(store: &Arc<MemoryStore>) -> ReadReceiptTracker {
        ReadReceiptTracker::new(store.clone(), store.clone(), store.clone())
    }

    /// Chat between A and B with messages 1..=5: A, B, A, B, A.
    async fn five_message_chat(store: &MemoryStore) -> i64 {
        let chat = store.find_or_create(A, B).await.unwrap();
        for sender in [A, B, A, B, A] {
            store.create_message(chat.id, sender, "msg").await.unwrap();
        }
        chat.id
    }

    #[tokio::test]
    async fn test_everything_from_others_is_unread_before_any_ack() {
        let store = Arc::new(MemoryStore::new());
        let chat_id = five_message_chat(&store).await;
        let tracker = tracker(&store);

        assert_eq!(tracker.get_unread_count(chat_id, B).await.unwrap(), 3);
        assert_eq!(tracker.get_unread_count(chat_id, A).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_ack_counts_only_later_messages_from_others() {
        let store = Arc::new(MemoryStore::new());
        let chat_id = five_message_chat(&store).await;
        let tracker = tracker(&store);

        let mark = tracker.acknowledge(chat_id, B, 3).await.unwrap();
        assert_eq!(mark.last_acknowledged_message_id, Some(3));
        // only message 5 is from A and after 3
        assert_eq!(tracker.get_unread_count(chat_id, B).await.unwrap(), 1);

        tracker.acknowledge(chat_id, B, 5).await.unwrap();
        assert_eq!(tracker.get_unread_count(chat_id, B).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_acknowledgments_are_monotonic_in_any_order() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(&store);

        tracker.acknowledge(10, A, 4).await.unwrap();
        let mark = tracker.acknowledge(10, A, 9).await.unwrap();
        assert_eq!(mark.last_acknowledged_message_id, Some(9));

        tracker.acknowledge(11, A, 9).await.unwrap();
        let replay = tracker.acknowledge(11, A, 4).await.unwrap();
        assert_eq!(replay.last_acknowledged_message_id, Some(9));
        assert_eq!(
            tracker.get_mark(11, A).await.unwrap().last_acknowledged_message_id,
            Some(9)
        );
    }

    #[tokio::test]
    async fn test_unknown_pair_reads_as_never_read() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(&store);

        let mark = tracker.get_mark(99, A).await.unwrap();
        assert_eq!(mark, ReadMark::never_read(99, A));
        assert_eq!(tracker.get_unread_count(99, A).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unread_counts_follow_directory_order() {
        let store = Arc::new(MemoryStore::new());
        let first = five_message_chat(&store).await;
        let second = store.find_or_create(B, 3).await.unwrap().id;
        store.create_message(second, 3, "hey").await.unwrap();
        let tracker = tracker(&store);

        tracker.acknowledge(first, B, 3).await.unwrap();

        let counts = tracker.get_unread_counts(B).await.unwrap();
        assert_eq!(
            counts,
            vec![
                UnreadCount {
                    conversation_id: first,
                    unread_count: 1
                },
                UnreadCount {
                    conversation_id: second,
                    unread_count: 1
                },
            ]
        );
        for count in counts {
            assert_eq!(
                tracker
                    .get_unread_count(count.conversation_id, B)
                    .await
                    .unwrap(),
                count.unread_count
            );
        }
    }

    struct UnavailableMarks;

    #[async_trait]
    impl ReadMarkStore for UnavailableMarks {
        async fn load(&self, _: i64, _: i64) -> AppResult<Option<ReadMark>> {
            Err(AppError::StorageUnavailable("pool timed out".into()))
        }

        async fn advance(&self, _: i64, _: i64, _: i64) -> AppResult<MarkUpdate> {
            Err(AppError::StorageUnavailable("pool timed out".into()))
        }
    }

    #[tokio::test]
    async fn test_storage_outage_propagates_without_retry() {
        let store = Arc::new(MemoryStore::new());
        let tracker = ReadReceiptTracker::new(Arc::new(UnavailableMarks), store.clone(), store);

        let err = tracker.acknowledge(1, A, 1).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(tracker.get_unread_count(1, A).await.unwrap_err().is_retryable());
    }
}
