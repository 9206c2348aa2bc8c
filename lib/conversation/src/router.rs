//! Activity routing.
//!
//! Every inbound activity is classified into a [`Route`]. Activities that
//! post replies are handled while holding their conversation's lock, so one
//! conversation sees one activity at a time while different conversations
//! proceed independently.

use crate::activity::{Activity, ActivityType, ChannelAccount};
use crate::dialog::RootDialog;
use crate::error::RouterError;
use crate::outbound::ReplySender;
use crate::state::{ConversationKey, ConversationStateStore};
use rootcause::prelude::{Report, ResultExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

/// Message text that triggers the diagnostic dump.
pub const DIAGNOSTICS_TRIGGER: &str = "done";

/// Final reply of the diagnostic dump.
pub const DIAGNOSTICS_CLOSING: &str = "woooah nelly";

/// How an activity is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Echo channel, sender and conversation details plus stored data.
    Diagnostics,
    /// Report members added to and removed from the conversation.
    MembersChanged,
    /// Start or resume the root dialog.
    Dialog,
    /// Recognized but unhandled activity.
    System(ActivityType),
}

/// Classifies an activity.
///
/// Conversation updates are recognized by their type; the message text is
/// not consulted.
#[must_use]
pub fn classify(activity: &Activity) -> Route {
    match &activity.activity_type {
        ActivityType::Message if activity.text.as_deref() == Some(DIAGNOSTICS_TRIGGER) => {
            Route::Diagnostics
        }
        ActivityType::Message => Route::Dialog,
        ActivityType::ConversationUpdate => Route::MembersChanged,
        other => Route::System(other.clone()),
    }
}

/// Replies for a conversation update.
#[must_use]
pub fn members_changed_replies(activity: &Activity) -> Vec<String> {
    vec![
        "Conversation Updated!".to_string(),
        format!("Names Added: {}", member_names(&activity.members_added)),
        format!("Names Removed: {}", member_names(&activity.members_removed)),
    ]
}

fn member_names(members: &[ChannelAccount]) -> String {
    members
        .iter()
        .map(ChannelAccount::display_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-conversation locks.
///
/// An entry lives only while some activity for its conversation holds or
/// waits on it.
#[derive(Debug, Default)]
struct ConversationLocks {
    locks: Mutex<HashMap<ConversationKey, Arc<Mutex<()>>>>,
}

impl ConversationLocks {
    async fn acquire(&self, key: &ConversationKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    async fn release(&self, key: &ConversationKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.locks.lock().await;
        // Waiters clone the Arc under the map lock, so a count of one means
        // nobody else is queued on this conversation.
        if locks
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// Routes inbound activities to their handlers and posts the replies.
pub struct ActivityRouter {
    store: Arc<dyn ConversationStateStore>,
    sender: Arc<dyn ReplySender>,
    locks: ConversationLocks,
}

impl ActivityRouter {
    /// Creates a router over the given state store and reply sender.
    #[must_use]
    pub fn new(store: Arc<dyn ConversationStateStore>, sender: Arc<dyn ReplySender>) -> Self {
        Self {
            store,
            sender,
            locks: ConversationLocks::default(),
        }
    }

    /// Handles one inbound activity to completion, including its replies.
    ///
    /// Activities that post replies hold their conversation's lock until the
    /// last reply is sent. System activities take no lock.
    ///
    /// # Errors
    ///
    /// Returns an error if state cannot be loaded or saved, or if a reply
    /// cannot be delivered. Delivery stops at the first failed reply.
    #[instrument(
        skip_all,
        fields(
            channel_id = %activity.channel_id,
            conversation_id = %activity.conversation.id,
            activity_type = %activity.activity_type,
        )
    )]
    pub async fn route(&self, activity: &Activity) -> Result<Route, Report<RouterError>> {
        let route = classify(activity);
        let key = activity.conversation_key();

        let reply_count = match &route {
            Route::System(activity_type) => {
                debug!(%activity_type, "ignoring system activity");
                0
            }
            _ => {
                let guard = self.locks.acquire(&key).await;
                let handled = self.handle(&route, activity, &key).await;
                self.locks.release(&key, guard).await;
                handled?
            }
        };

        info!(?route, reply_count, "activity handled");
        Ok(route)
    }

    async fn handle(
        &self,
        route: &Route,
        activity: &Activity,
        key: &ConversationKey,
    ) -> Result<usize, Report<RouterError>> {
        let replies = match route {
            Route::Diagnostics => self.diagnostics(activity, key).await?,
            Route::MembersChanged => replies_to(activity, members_changed_replies(activity)),
            Route::Dialog => replies_to(activity, self.dialog_turn(activity, key).await?),
            Route::System(_) => Vec::new(),
        };

        for reply in &replies {
            self.sender
                .send_to_conversation(reply)
                .await
                .context(RouterError::Delivery { key: key.clone() })?;
        }
        Ok(replies.len())
    }

    async fn diagnostics(
        &self,
        activity: &Activity,
        key: &ConversationKey,
    ) -> Result<Vec<Activity>, Report<RouterError>> {
        let state = self
            .store
            .load(key)
            .await
            .context(RouterError::LoadState { key: key.clone() })?;

        let from = &activity.from;
        let conversation = &activity.conversation;
        let mut replies = replies_to(
            activity,
            vec![
                format!("ChannelId: {}", activity.channel_id),
                format!("User: {} {}", from.id, from.name.as_deref().unwrap_or_default()),
                format!(
                    "Conversation: {} {} {}",
                    conversation.id,
                    conversation.name.as_deref().unwrap_or_default(),
                    conversation.is_group
                ),
                state.data.to_json_string(),
            ],
        );
        // The sign-off is a standalone message, not a reply.
        replies.push(activity.create_message(DIAGNOSTICS_CLOSING));
        Ok(replies)
    }

    async fn dialog_turn(
        &self,
        activity: &Activity,
        key: &ConversationKey,
    ) -> Result<Vec<String>, Report<RouterError>> {
        let mut state = self
            .store
            .load(key)
            .await
            .context(RouterError::LoadState { key: key.clone() })?;

        let mut replies = Vec::new();
        let dialog = match state.dialog.take() {
            Some(dialog) => dialog,
            None => {
                let (dialog, greeting) = RootDialog::start(activity.from.display_name());
                replies.push(greeting);
                dialog
            }
        };

        let turn = dialog
            .on_message(activity.message_text(), &mut state.data)
            .context(RouterError::DialogTurn { key: key.clone() })?;
        if let Some(order) = &turn.completed {
            info!(%order, initiated_by = turn.dialog.initiated_by(), "coffee order completed");
        }
        replies.extend(turn.replies);
        state.dialog = Some(turn.dialog);

        // Saved before any reply goes out so a delivery failure never rewinds the dialog.
        self.store
            .save(key, &state)
            .await
            .context(RouterError::SaveState { key: key.clone() })?;

        Ok(replies)
    }
}

fn replies_to(activity: &Activity, texts: Vec<String>) -> Vec<Activity> {
    texts
        .into_iter()
        .map(|text| activity.create_reply(text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ConversationAccount;
    use crate::dialog::ORDER_KEY;
    use crate::error::DeliveryError;
    use crate::form::{DISMISSAL_MESSAGE, OrderForm};
    use crate::order::{Coffee, CoffeeOrder, Milk, Size, Sugar};
    use crate::state::InMemoryStateStore;
    use async_trait::async_trait;
    use coffeebot_core::ActivityId;
    use std::sync::Mutex as StdMutex;

    /// Records every reply it is asked to send.
    #[derive(Default)]
    struct RecordingSender {
        sent: StdMutex<Vec<Activity>>,
    }

    impl RecordingSender {
        fn texts(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|a| a.message_text().to_string())
                .collect()
        }

        fn texts_for(&self, conversation_id: &str) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.conversation.id.as_str() == conversation_id)
                .map(|a| a.message_text().to_string())
                .collect()
        }

        fn clear(&self) {
            self.sent.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn send_to_conversation(&self, reply: &Activity) -> Result<(), Report<DeliveryError>> {
            self.sent.lock().unwrap().push(reply.clone());
            Ok(())
        }
    }

    /// Fails every delivery.
    struct FailingSender;

    #[async_trait]
    impl ReplySender for FailingSender {
        async fn send_to_conversation(&self, reply: &Activity) -> Result<(), Report<DeliveryError>> {
            Err(DeliveryError::SendFailed {
                conversation_id: reply.conversation.id.clone(),
            }
            .into())
        }
    }

    /// Yields to the scheduler around every reply it records.
    #[derive(Default)]
    struct YieldingSender {
        texts: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl ReplySender for YieldingSender {
        async fn send_to_conversation(&self, reply: &Activity) -> Result<(), Report<DeliveryError>> {
            tokio::task::yield_now().await;
            self.texts
                .lock()
                .unwrap()
                .push(reply.message_text().to_string());
            tokio::task::yield_now().await;
            Ok(())
        }
    }

    struct Harness {
        store: Arc<InMemoryStateStore>,
        sender: Arc<RecordingSender>,
        router: ActivityRouter,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryStateStore::new());
        let sender = Arc::new(RecordingSender::default());
        let router = ActivityRouter::new(store.clone(), sender.clone());
        Harness {
            store,
            sender,
            router,
        }
    }

    fn alice() -> ChannelAccount {
        ChannelAccount::new("user-alice", Some("Alice".to_string()))
    }

    fn message(conversation_id: &str, text: &str) -> Activity {
        Activity::message(
            "emulator",
            ConversationAccount::new(conversation_id),
            alice(),
            text,
        )
    }

    async fn send_all(router: &ActivityRouter, conversation_id: &str, texts: &[&str]) {
        for text in texts {
            router
                .route(&message(conversation_id, text))
                .await
                .expect("route");
        }
    }

    async fn stored_order(store: &InMemoryStateStore, conversation_id: &str) -> Option<CoffeeOrder> {
        store
            .load(&ConversationKey::new("emulator", conversation_id))
            .await
            .expect("load")
            .data
            .get_value(ORDER_KEY)
            .expect("get")
    }

    #[test]
    fn classify_routes() {
        assert_eq!(classify(&message("c", "done")), Route::Diagnostics);
        assert_eq!(classify(&message("c", "Done")), Route::Dialog);
        assert_eq!(classify(&message("c", "latte")), Route::Dialog);

        let update = Activity::new(
            ActivityType::ConversationUpdate,
            "emulator",
            ConversationAccount::new("c"),
            alice(),
        );
        assert_eq!(classify(&update), Route::MembersChanged);

        let typing = Activity::new(
            ActivityType::Typing,
            "emulator",
            ConversationAccount::new("c"),
            alice(),
        )
        .with_text("done");
        assert_eq!(classify(&typing), Route::System(ActivityType::Typing));
    }

    #[test]
    fn message_text_naming_an_update_is_still_a_message() {
        let activity = message("c", "conversationUpdate");
        assert_eq!(classify(&activity), Route::Dialog);
    }

    #[test]
    fn members_changed_renders_names() {
        let mut update = Activity::new(
            ActivityType::ConversationUpdate,
            "emulator",
            ConversationAccount::new("c"),
            alice(),
        );
        update.members_added = vec![alice()];

        assert_eq!(
            members_changed_replies(&update),
            vec![
                "Conversation Updated!".to_string(),
                "Names Added: Alice".to_string(),
                "Names Removed: ".to_string(),
            ]
        );

        update.members_removed = vec![
            ChannelAccount::new("user-bob", Some("Bob".to_string())),
            ChannelAccount::new("user-nameless", None),
        ];
        assert_eq!(
            members_changed_replies(&update)[2],
            "Names Removed: Bob, user-nameless"
        );
    }

    #[tokio::test]
    async fn first_message_greets_and_prompts() {
        let h = harness();
        h.router.route(&message("conv-1", "hi")).await.expect("route");

        assert_eq!(
            h.sender.texts(),
            vec![
                "Alice is going on a coffee run!".to_string(),
                OrderForm::Coffee.prompt(),
            ]
        );
    }

    #[tokio::test]
    async fn full_order_is_confirmed_and_persisted() {
        let h = harness();
        send_all(&h.router, "conv-1", &["hi", "latte", "skim", "large", "1"]).await;

        let texts = h.sender.texts();
        assert_eq!(
            texts.last().map(String::as_str),
            Some("Thanks! You ordered a: Latte Skim Large Zero")
        );
        assert_eq!(
            stored_order(&h.store, "conv-1").await,
            Some(CoffeeOrder {
                coffee: Coffee::Latte,
                milk: Milk::Skim,
                size: Size::Large,
                sugar: Sugar::Zero,
            })
        );
    }

    #[tokio::test]
    async fn greeting_is_only_posted_once() {
        let h = harness();
        send_all(&h.router, "conv-1", &["hi", "1", "1", "1", "1"]).await;
        h.sender.clear();

        send_all(&h.router, "conv-1", &["more coffee"]).await;
        assert_eq!(h.sender.texts(), vec![OrderForm::Coffee.prompt()]);
    }

    #[tokio::test]
    async fn cancel_posts_only_the_dismissal() {
        let h = harness();
        send_all(&h.router, "conv-1", &["hi", "cappuccino"]).await;
        h.sender.clear();

        send_all(&h.router, "conv-1", &["quit"]).await;

        assert_eq!(h.sender.texts(), vec![DISMISSAL_MESSAGE.to_string()]);
        assert!(stored_order(&h.store, "conv-1").await.is_none());
    }

    #[tokio::test]
    async fn done_dumps_diagnostics_with_stored_order() {
        let h = harness();
        send_all(&h.router, "conv-1", &["hi", "2", "3", "2", "3"]).await;
        h.sender.clear();

        let mut activity = message("conv-1", "done");
        activity.conversation.name = Some("Coffee crew".to_string());
        activity.conversation.is_group = true;
        let route = h.router.route(&activity).await.expect("route");

        assert_eq!(route, Route::Diagnostics);
        assert_eq!(
            h.sender.texts(),
            vec![
                "ChannelId: emulator".to_string(),
                "User: user-alice Alice".to_string(),
                "Conversation: conv-1 Coffee crew true".to_string(),
                r#"{"CoffeeOrder":{"Coffee":"Latte","Milk":"Soy","Size":"Large","Sugar":"Two"}}"#
                    .to_string(),
                DIAGNOSTICS_CLOSING.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn done_sign_off_is_not_a_reply() {
        let h = harness();
        let mut activity = message("conv-1", "done");
        activity.id = Some(ActivityId::new("act-1"));
        h.router.route(&activity).await.expect("route");

        let sent = h.sender.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 5);
        for reply in &sent[..4] {
            assert_eq!(reply.reply_to_id, activity.id);
        }
        assert_eq!(sent[4].message_text(), DIAGNOSTICS_CLOSING);
        assert!(sent[4].reply_to_id.is_none());
        assert_eq!(sent[4].conversation, activity.conversation);
    }

    #[tokio::test]
    async fn done_without_history_still_sends_every_reply() {
        let h = harness();
        h.router.route(&message("conv-1", "done")).await.expect("route");

        let texts = h.sender.texts();
        assert_eq!(texts.len(), 5);
        assert_eq!(texts[3], "{}");
        assert_eq!(texts[4], DIAGNOSTICS_CLOSING);
        // Diagnostics never start a dialog.
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn system_activities_are_ignored() {
        let h = harness();
        for activity_type in [
            ActivityType::DeleteUserData,
            ActivityType::ContactRelationUpdate,
            ActivityType::Typing,
            ActivityType::Ping,
            ActivityType::Unknown("invoke".to_string()),
        ] {
            let activity = Activity::new(
                activity_type.clone(),
                "emulator",
                ConversationAccount::new("conv-1"),
                alice(),
            );
            let route = h.router.route(&activity).await.expect("route");
            assert_eq!(route, Route::System(activity_type));
        }

        assert!(h.sender.texts().is_empty());
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn lock_entries_do_not_outlive_their_activity() {
        let h = harness();
        for i in 0..1000 {
            let typing = Activity::new(
                ActivityType::Typing,
                "emulator",
                ConversationAccount::new(format!("conv-{i}")),
                alice(),
            );
            h.router.route(&typing).await.expect("route");
        }
        assert_eq!(h.router.locks.len().await, 0);
        assert!(h.store.is_empty().await);

        let update = Activity::new(
            ActivityType::ConversationUpdate,
            "emulator",
            ConversationAccount::new("conv-update"),
            alice(),
        );
        h.router.route(&update).await.expect("route");
        send_all(&h.router, "conv-1", &["hi", "latte", "done"]).await;

        assert_eq!(h.router.locks.len().await, 0);
    }

    #[tokio::test]
    async fn lock_entry_is_dropped_after_a_failed_delivery() {
        let router = ActivityRouter::new(
            Arc::new(InMemoryStateStore::new()),
            Arc::new(FailingSender),
        );

        assert!(router.route(&message("conv-1", "hi")).await.is_err());
        assert_eq!(router.locks.len().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn same_conversation_activities_run_one_at_a_time() {
        for _ in 0..20 {
            let sender = Arc::new(YieldingSender::default());
            let router = Arc::new(ActivityRouter::new(
                Arc::new(InMemoryStateStore::new()),
                sender.clone(),
            ));

            let tasks: Vec<_> = (0..2)
                .map(|_| {
                    let router = Arc::clone(&router);
                    tokio::spawn(async move {
                        router
                            .route(&message("conv-1", "latte"))
                            .await
                            .expect("route");
                    })
                })
                .collect();
            for task in tasks {
                task.await.expect("task");
            }

            // One turn greets and prompts, the other answers: never two greetings
            // and never one turn's replies split by the other's.
            assert_eq!(
                *sender.texts.lock().unwrap(),
                vec![
                    "Alice is going on a coffee run!".to_string(),
                    OrderForm::Coffee.prompt(),
                    OrderForm::Milk {
                        coffee: Coffee::Latte
                    }
                    .prompt(),
                ]
            );
            assert_eq!(router.locks.len().await, 0);
        }
    }

    #[tokio::test]
    async fn concurrent_sessions_keep_their_own_orders() {
        let h = Arc::new(harness());

        let first = {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                send_all(&h.router, "conv-a", &["hi", "latte", "soy", "regular", "zero"]).await;
            })
        };
        let second = {
            let h = Arc::clone(&h);
            tokio::spawn(async move {
                send_all(&h.router, "conv-b", &["hi", "long black", "skim", "large", "two"]).await;
            })
        };
        first.await.expect("first session");
        second.await.expect("second session");

        assert_eq!(
            stored_order(&h.store, "conv-a").await,
            Some(CoffeeOrder {
                coffee: Coffee::Latte,
                milk: Milk::Soy,
                size: Size::Regular,
                sugar: Sugar::Zero,
            })
        );
        assert_eq!(
            stored_order(&h.store, "conv-b").await,
            Some(CoffeeOrder {
                coffee: Coffee::LongBlack,
                milk: Milk::Skim,
                size: Size::Large,
                sugar: Sugar::Two,
            })
        );
        assert_eq!(
            h.sender.texts_for("conv-a").last().map(String::as_str),
            Some("Thanks! You ordered a: Latte Soy Regular Zero")
        );
        assert_eq!(
            h.sender.texts_for("conv-b").last().map(String::as_str),
            Some("Thanks! You ordered a: LongBlack Skim Large Two")
        );
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_after_state_is_saved() {
        let store = Arc::new(InMemoryStateStore::new());
        let router = ActivityRouter::new(store.clone(), Arc::new(FailingSender));

        let result = router.route(&message("conv-1", "hi")).await;

        let err = result.expect_err("delivery should fail");
        assert!(err.to_string().contains("failed to deliver replies"));
        let state = store
            .load(&ConversationKey::new("emulator", "conv-1"))
            .await
            .expect("load");
        assert!(matches!(state.dialog, Some(RootDialog::Ordering { .. })));
    }
}
