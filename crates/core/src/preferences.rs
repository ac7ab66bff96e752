//! Travel preferences injected into the system instructions.

use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The model used when nothing else is configured.
pub const DEFAULT_MODEL_ID: &str = "llama3-8b-8192";

macro_rules! labeled_enum {
    (
        $(#[$attrs:meta])*
        $name:ident {
            $(
                $(#[$variant_attrs:meta])*
                $variant:ident => $label:literal $(| $alias:literal)*,
            )+
        }
    ) => {
        $(#[$attrs])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize,
            Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$variant_attrs])*
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// All legal values, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the human-readable label.
            #[inline]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParsePreferenceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($label)
                        $(|| s.eq_ignore_ascii_case($alias))*
                    {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParsePreferenceError {
                    field: stringify!($name),
                    value: s.to_owned(),
                })
            }
        }
    };
}

labeled_enum! {
    /// The preferred style of travel.
    TravelType {
        /// Outdoor activity and thrills.
        #[default]
        Adventure => "Adventure",
        /// Beaches, spas and slow days.
        Relaxation => "Relaxation",
        /// Museums, heritage and local life.
        CulturalExploration => "Cultural Exploration" | "cultural",
        /// Premium stays and experiences.
        Luxury => "Luxury",
        /// Getting the most out of a tight budget.
        BudgetFriendly => "Budget-friendly" | "budget",
    }
}

labeled_enum! {
    /// The season of the trip.
    Season {
        /// December to February in the northern hemisphere.
        #[default]
        Winter => "Winter",
        /// March to May.
        Spring => "Spring",
        /// June to August.
        Summer => "Summer",
        /// September to November.
        Autumn => "Autumn" | "fall",
    }
}

labeled_enum! {
    /// How much detail an itinerary should have.
    ItineraryStyle {
        /// Day-by-day plans.
        #[default]
        Detailed => "Detailed",
        /// Highlights only.
        QuickOverview => "Quick Overview" | "quick" | "overview",
    }
}

/// A value that is not one of the legal choices for a preference field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsePreferenceError {
    field: &'static str,
    value: String,
}

impl ParsePreferenceError {
    /// Returns the name of the rejected field.
    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl Display for ParsePreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} is not a valid {}", self.value, self.field)
    }
}

impl Error for ParsePreferenceError {}

/// A budget in whole US dollars, `0 < min <= max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u32, u32)", into = "(u32, u32)")]
pub struct BudgetRange {
    min: u32,
    max: u32,
}

impl BudgetRange {
    /// Creates a budget range, or `None` if the bounds are not positive
    /// and ordered.
    #[inline]
    pub fn new(min: u32, max: u32) -> Option<Self> {
        (min > 0 && min <= max).then_some(Self { min, max })
    }

    /// The lower bound.
    #[inline]
    pub fn min(self) -> u32 {
        self.min
    }

    /// The upper bound.
    #[inline]
    pub fn max(self) -> u32 {
        self.max
    }
}

impl Default for BudgetRange {
    fn default() -> Self {
        Self {
            min: 1000,
            max: 5000,
        }
    }
}

impl TryFrom<(u32, u32)> for BudgetRange {
    type Error = InvalidBudgetError;

    fn try_from((min, max): (u32, u32)) -> Result<Self, Self::Error> {
        Self::new(min, max).ok_or(InvalidBudgetError { min, max })
    }
}

impl From<BudgetRange> for (u32, u32) {
    fn from(range: BudgetRange) -> Self {
        (range.min, range.max)
    }
}

/// A budget whose bounds are not positive and ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidBudgetError {
    min: u32,
    max: u32,
}

impl Display for InvalidBudgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid budget range {} to {}: bounds must be positive and ordered",
            self.min, self.max
        )
    }
}

impl Error for InvalidBudgetError {}

/// A snapshot of the user's travel preferences.
///
/// A new snapshot replaces the old one whenever the user changes any
/// control; a snapshot itself never changes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreferenceSet {
    /// Preferred style of travel.
    pub travel_type: TravelType,
    /// Budget in USD.
    pub budget: BudgetRange,
    /// Season of the trip.
    pub season: Season,
    /// Level of detail for itineraries.
    pub itinerary_style: ItineraryStyle,
    /// The completion model to ask, passed through to the provider.
    pub model_id: String,
}

impl Default for PreferenceSet {
    fn default() -> Self {
        Self {
            travel_type: TravelType::default(),
            budget: BudgetRange::default(),
            season: Season::default(),
            itinerary_style: ItineraryStyle::default(),
            model_id: DEFAULT_MODEL_ID.to_owned(),
        }
    }
}
