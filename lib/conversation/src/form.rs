//! The coffee ordering form.
//!
//! The form walks the user through four fields in a fixed order:
//! coffee, milk, size, sugar. Each state carries the answers given so far,
//! so a state can only be reached once every earlier field is filled and a
//! [`CoffeeOrder`] can only be built from the last state.
//!
//! Besides answers the form understands a few commands:
//! - `quit` / `cancel` / `stop` / `goodbye`: abandon the order
//! - `help` / `?` / `choices`: show the current prompt again
//! - `status`: show the answers so far

use crate::order::{Choice, Coffee, CoffeeOrder, Milk, Size, Sugar};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply posted when the user abandons the form.
pub const DISMISSAL_MESSAGE: &str = "What? Had enough coffee?!";

const UNSPECIFIED: &str = "Unspecified";

/// A field of the order, in the order the form asks for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Coffee,
    Milk,
    Size,
    Sugar,
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Coffee => Coffee::FIELD,
            Self::Milk => Milk::FIELD,
            Self::Size => Size::FIELD,
            Self::Sugar => Sugar::FIELD,
        };
        f.write_str(name)
    }
}

/// Commands recognized at any field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormCommand {
    Quit,
    Help,
    Status,
}

impl FormCommand {
    /// Parses a command from user input.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "quit" | "cancel" | "stop" | "goodbye" | "good bye" => Some(Self::Quit),
            "help" | "?" | "choices" => Some(Self::Help),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// In-progress form state: one variant per unanswered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum OrderForm {
    /// Waiting for the coffee choice.
    Coffee,
    /// Waiting for the milk choice.
    Milk { coffee: Coffee },
    /// Waiting for the size choice.
    Size { coffee: Coffee, milk: Milk },
    /// Waiting for the sugar choice.
    Sugar {
        coffee: Coffee,
        milk: Milk,
        size: Size,
    },
}

/// Where the form ended up after one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStep {
    /// Still collecting fields.
    Continue(OrderForm),
    /// Every field was answered.
    Completed(CoffeeOrder),
    /// The user abandoned the form.
    Cancelled,
}

/// Result of feeding one input to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTurn {
    /// The next state.
    pub step: FormStep,
    /// Replies to post, in order.
    pub replies: Vec<String>,
}

impl OrderForm {
    /// Starts a new form, returning it with the first prompt.
    #[must_use]
    pub fn start() -> (Self, String) {
        let form = Self::Coffee;
        (form, form.prompt())
    }

    /// Returns the field this state is waiting for.
    #[must_use]
    pub fn field(&self) -> OrderField {
        match self {
            Self::Coffee => OrderField::Coffee,
            Self::Milk { .. } => OrderField::Milk,
            Self::Size { .. } => OrderField::Size,
            Self::Sugar { .. } => OrderField::Sugar,
        }
    }

    /// Returns the prompt for the current field.
    #[must_use]
    pub fn prompt(&self) -> String {
        match self.field() {
            OrderField::Coffee => prompt_for::<Coffee>(),
            OrderField::Milk => prompt_for::<Milk>(),
            OrderField::Size => prompt_for::<Size>(),
            OrderField::Sugar => prompt_for::<Sugar>(),
        }
    }

    /// Summarizes the answers given so far.
    #[must_use]
    pub fn status(&self) -> String {
        let (coffee, milk, size) = match *self {
            Self::Coffee => (None, None, None),
            Self::Milk { coffee } => (Some(coffee), None, None),
            Self::Size { coffee, milk } => (Some(coffee), Some(milk), None),
            Self::Sugar { coffee, milk, size } => (Some(coffee), Some(milk), Some(size)),
        };

        format!(
            "Coffee: {}\nMilk: {}\nSize: {}\nSugar: {}",
            label_or_unspecified(coffee),
            label_or_unspecified(milk),
            label_or_unspecified(size),
            UNSPECIFIED,
        )
    }

    /// Feeds one user input to the form.
    #[must_use]
    pub fn advance(self, input: &str) -> FormTurn {
        match FormCommand::parse(input) {
            Some(FormCommand::Quit) => FormTurn {
                step: FormStep::Cancelled,
                replies: vec![DISMISSAL_MESSAGE.to_string()],
            },
            Some(FormCommand::Help) => self.stay(Vec::new()),
            Some(FormCommand::Status) => self.stay(vec![self.status()]),
            None => self.answer(input.trim()),
        }
    }

    fn answer(self, input: &str) -> FormTurn {
        match self {
            Self::Coffee => match Coffee::parse_choice(input) {
                Some(coffee) => Self::Milk { coffee }.stay(Vec::new()),
                None => self.reject::<Coffee>(input),
            },
            Self::Milk { coffee } => match Milk::parse_choice(input) {
                Some(milk) => Self::Size { coffee, milk }.stay(Vec::new()),
                None => self.reject::<Milk>(input),
            },
            Self::Size { coffee, milk } => match Size::parse_choice(input) {
                Some(size) => Self::Sugar { coffee, milk, size }.stay(Vec::new()),
                None => self.reject::<Size>(input),
            },
            Self::Sugar { coffee, milk, size } => match Sugar::parse_choice(input) {
                Some(sugar) => FormTurn {
                    step: FormStep::Completed(CoffeeOrder {
                        coffee,
                        milk,
                        size,
                        sugar,
                    }),
                    replies: Vec::new(),
                },
                None => self.reject::<Sugar>(input),
            },
        }
    }

    /// Remains in (or moves to) this state and asks for its field.
    fn stay(self, mut replies: Vec<String>) -> FormTurn {
        replies.push(self.prompt());
        FormTurn {
            step: FormStep::Continue(self),
            replies,
        }
    }

    fn reject<C: Choice>(self, input: &str) -> FormTurn {
        self.stay(vec![format!("\"{input}\" is not a {} option.", C::FIELD)])
    }
}

fn prompt_for<C: Choice>() -> String {
    let mut prompt = format!("Please select a {}:", C::FIELD);
    for (position, option) in C::ALL.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {}", position + 1, option.label()));
    }
    prompt
}

fn label_or_unspecified<C: Choice>(value: Option<C>) -> &'static str {
    value.map_or(UNSPECIFIED, Choice::label)
}
