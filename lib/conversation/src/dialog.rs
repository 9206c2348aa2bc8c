//! The root dialog: greet once, then take coffee orders forever.
//!
//! ```text
//! Start ──greeting──▶ AwaitingMessage ──any message──▶ Ordering(form)
//!                          ▲                                │
//!                          └──── completed / cancelled ─────┘
//! ```
//!
//! `Start` is transient: [`RootDialog::start`] posts the greeting and
//! returns the dialog already waiting for a message.

use crate::error::StateStoreError;
use crate::form::{FormStep, OrderForm};
use crate::order::CoffeeOrder;
use crate::state::ConversationData;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

/// Conversation data key the last completed order is stored under.
pub const ORDER_KEY: &str = "CoffeeOrder";

/// Persisted position of the root dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RootDialog {
    /// Idle; the next message starts an order.
    AwaitingMessage { initiated_by: String },
    /// An order form is in progress.
    Ordering {
        initiated_by: String,
        form: OrderForm,
    },
}

/// Result of one dialog turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogTurn {
    /// The dialog state to persist.
    pub dialog: RootDialog,
    /// Replies to post, in order.
    pub replies: Vec<String>,
    /// The order completed in this turn, if any.
    pub completed: Option<CoffeeOrder>,
}

impl RootDialog {
    /// Starts the dialog for a new conversation.
    ///
    /// Returns the dialog waiting for a message, and the greeting to post.
    #[must_use]
    pub fn start(initiated_by: impl Into<String>) -> (Self, String) {
        let initiated_by = initiated_by.into();
        let greeting = format!("{initiated_by} is going on a coffee run!");
        (Self::AwaitingMessage { initiated_by }, greeting)
    }

    /// Returns the name of the user who started the dialog.
    #[must_use]
    pub fn initiated_by(&self) -> &str {
        match self {
            Self::AwaitingMessage { initiated_by } | Self::Ordering { initiated_by, .. } => {
                initiated_by
            }
        }
    }

    /// Handles one message.
    ///
    /// A completed order is written to `data` under [`ORDER_KEY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the completed order cannot be stored.
    pub fn on_message(
        self,
        text: &str,
        data: &mut ConversationData,
    ) -> Result<DialogTurn, Report<StateStoreError>> {
        match self {
            Self::AwaitingMessage { initiated_by } => {
                // The message that wakes the dialog only opens the form.
                let (form, prompt) = OrderForm::start();
                Ok(DialogTurn {
                    dialog: Self::Ordering { initiated_by, form },
                    replies: vec![prompt],
                    completed: None,
                })
            }
            Self::Ordering { initiated_by, form } => {
                let turn = form.advance(text);
                let mut replies = turn.replies;

                let (dialog, completed) = match turn.step {
                    FormStep::Continue(form) => (Self::Ordering { initiated_by, form }, None),
                    FormStep::Completed(order) => {
                        replies.push(format!("Thanks! You ordered a: {order}"));
                        data.set_value(ORDER_KEY, &order)?;
                        (Self::AwaitingMessage { initiated_by }, Some(order))
                    }
                    FormStep::Cancelled => (Self::AwaitingMessage { initiated_by }, None),
                };

                Ok(DialogTurn {
                    dialog,
                    replies,
                    completed,
                })
            }
        }
    }
}
