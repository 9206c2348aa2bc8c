//! Coffee order types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An enumerated value the user picks from a numbered list.
pub trait Choice: Copy + Eq + fmt::Display + 'static {
    /// Field name used in prompts ("coffee", "milk", ...).
    const FIELD: &'static str;

    /// Every option, in prompt order.
    const ALL: &'static [Self];

    /// Human-readable label shown in prompts.
    fn label(self) -> &'static str;

    /// Resolves user input to an option.
    ///
    /// Accepts the 1-based position in the prompt list, the identifier or the
    /// label. Case, whitespace, `-` and `_` are ignored.
    fn parse_choice(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(position) = input.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| Self::ALL.get(index))
                .copied();
        }

        let wanted = normalize(input);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|option| {
            normalize(&option.to_string()) == wanted || normalize(option.label()) == wanted
        })
    }
}

fn normalize(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! define_choice {
    ($(#[$meta:meta])* $name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl Choice for $name {
            const FIELD: &'static str = $field;
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str(stringify!($variant))),+
                }
            }
        }
    };
}

define_choice!(
    /// Coffee style.
    Coffee, "coffee", {
        Cappuccino => "Cappuccino",
        Latte => "Latte",
        FlatWhite => "Flat White",
        LongBlack => "Long Black",
    }
);

define_choice!(
    /// Milk type.
    Milk, "milk", {
        FullCream => "Full Cream",
        Skim => "Skim",
        Soy => "Soy",
    }
);

define_choice!(
    /// Cup size.
    Size, "size", {
        Regular => "Regular",
        Large => "Large",
    }
);

define_choice!(
    /// Sugars.
    Sugar, "sugar", {
        Zero => "Zero",
        One => "One",
        Two => "Two",
    }
);

/// A completed coffee order.
///
/// Only the ordering form produces these, and only once every field has been
/// answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CoffeeOrder {
    pub coffee: Coffee,
    pub milk: Milk,
    pub size: Size,
    pub sugar: Sugar,
}

impl fmt::Display for CoffeeOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.coffee, self.milk, self.size, self.sugar)
    }
}
