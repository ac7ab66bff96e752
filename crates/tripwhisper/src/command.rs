//! Parsing of the lines typed into the REPL.

use std::error::Error;
use std::fmt::{self, Display};

use tripwhisper_core::{
    BudgetRange, ItineraryStyle, MAX_WINDOW_SIZE, MIN_WINDOW_SIZE,
    PreferenceSet, Season, TravelType,
};

/// Smallest budget the host accepts, in USD.
pub const MIN_BUDGET: u32 = 500;
/// Largest budget the host accepts, in USD.
pub const MAX_BUDGET: u32 = 10000;

/// Models offered by the default provider.
pub const KNOWN_MODELS: &[&str] = &[
    "llama3-8b-8192",
    "Llama3-70b-8192",
    "Gemma2-9b-It",
    "Llama-3.1-8b-Instant",
    "Mixtral-8x7b-32768",
];

/// A line of user input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// A message for the advisor.
    Chat(String),
    /// Changes one of the session settings.
    Set(Setting),
    /// Prints the current settings.
    ShowPrefs,
    /// Prints the remembered conversation.
    ShowHistory,
    /// Starts a new conversation.
    Clear,
    /// Prints the command reference.
    Help,
    /// Leaves the program.
    Quit,
}

/// A change to the session settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Setting {
    /// Sets the travel type.
    TravelType(TravelType),
    /// Sets the budget range.
    Budget(BudgetRange),
    /// Sets the season.
    Season(Season),
    /// Sets the itinerary style.
    ItineraryStyle(ItineraryStyle),
    /// Sets how many exchanges are remembered.
    Memory(usize),
    /// Sets the model.
    Model(String),
}

impl Setting {
    /// Applies the change to a copy of the settings.
    pub fn apply(
        self,
        preferences: &mut PreferenceSet,
        window_size: &mut usize,
    ) {
        match self {
            Setting::TravelType(value) => preferences.travel_type = value,
            Setting::Budget(value) => preferences.budget = value,
            Setting::Season(value) => preferences.season = value,
            Setting::ItineraryStyle(value) => {
                preferences.itinerary_style = value
            }
            Setting::Memory(value) => *window_size = value,
            Setting::Model(value) => preferences.model_id = value,
        }
    }
}

impl Command {
    /// Parses a line of input. Lines not starting with `/` are chat
    /// messages.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Chat(line.to_owned()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "type" => Command::Set(Setting::TravelType(parse_arg("type", arg)?)),
            "budget" => Command::Set(Setting::Budget(parse_budget(arg)?)),
            "season" => Command::Set(Setting::Season(parse_arg("season", arg)?)),
            "style" => {
                Command::Set(Setting::ItineraryStyle(parse_arg("style", arg)?))
            }
            "memory" => Command::Set(Setting::Memory(parse_memory(arg)?)),
            "model" => {
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument("model"));
                }
                Command::Set(Setting::Model(arg.to_owned()))
            }
            "prefs" => Command::ShowPrefs,
            "history" => Command::ShowHistory,
            "clear" => Command::Clear,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name.to_owned())),
        };
        Ok(command)
    }
}

fn parse_arg<T>(name: &'static str, arg: &str) -> Result<T, CommandError>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(name));
    }
    arg.parse()
        .map_err(|err: T::Err| CommandError::InvalidArgument(err.to_string()))
}

fn parse_budget(arg: &str) -> Result<BudgetRange, CommandError> {
    let mut parts = arg
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .filter(|part| !part.is_empty());
    let (Some(min), Some(max), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CommandError::MissingArgument("budget"));
    };

    let parse = |value: &str| {
        value
            .trim_start_matches('$')
            .parse::<u32>()
            .ok()
            .filter(|value| (MIN_BUDGET..=MAX_BUDGET).contains(value))
            .ok_or_else(|| {
                CommandError::InvalidArgument(format!(
                    "budget must be between {MIN_BUDGET} and {MAX_BUDGET} USD, got {value:?}"
                ))
            })
    };
    let (min, max) = (parse(min)?, parse(max)?);
    BudgetRange::new(min, max).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "minimum budget {min} is above maximum {max}"
        ))
    })
}

fn parse_memory(arg: &str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument("memory"));
    }
    arg.parse()
        .ok()
        .filter(|size| (MIN_WINDOW_SIZE..=MAX_WINDOW_SIZE).contains(size))
        .ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "memory must be between {MIN_WINDOW_SIZE} and {MAX_WINDOW_SIZE}, got {arg:?}"
            ))
        })
}

/// A line that could not be understood.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandError {
    /// No such command.
    Unknown(String),
    /// The command needs an argument.
    MissingArgument(&'static str),
    /// The argument is out of range or not recognized.
    InvalidArgument(String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(name) => {
                write!(f, "unknown command /{name}, try /help")
            }
            CommandError::MissingArgument(name) => {
                write!(f, "/{name} needs a value, try /help")
            }
            CommandError::InvalidArgument(msg) => f.write_str(msg),
        }
    }
}

impl Error for CommandError {}

/// Returns the command reference printed by `/help`.
pub fn help_text() -> String {
    fn labels<T: Display>(values: &[T]) -> String {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    format!(
        "\
/type <travel type>   {}
/budget <min> <max>   budget in USD, {MIN_BUDGET} to {MAX_BUDGET}
/season <season>      {}
/style <style>        {}
/memory <n>           remembered exchanges, {MIN_WINDOW_SIZE} to {MAX_WINDOW_SIZE}
/model <id>           e.g. {}
/prefs                show the current settings
/history              show the remembered conversation
/clear                start a new conversation
/quit                 leave",
        labels(TravelType::ALL),
        labels(Season::ALL),
        labels(ItineraryStyle::ALL),
        KNOWN_MODELS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_lines() {
        assert_eq!(
            Command::parse("  Where should I go in May?\n"),
            Ok(Command::Chat("Where should I go in May?".to_owned()))
        );
        assert_eq!(Command::parse("   "), Ok(Command::Chat(String::new())));
    }

    #[test]
    fn test_preference_commands() {
        assert_eq!(
            Command::parse("/type cultural"),
            Ok(Command::Set(Setting::TravelType(
                TravelType::CulturalExploration
            )))
        );
        assert_eq!(
            Command::parse("/Season summer"),
            Ok(Command::Set(Setting::Season(Season::Summer)))
        );
        assert_eq!(
            Command::parse("/style Quick Overview"),
            Ok(Command::Set(Setting::ItineraryStyle(
                ItineraryStyle::QuickOverview
            )))
        );
        assert_eq!(
            Command::parse("/model llama3-70b-8192"),
            Ok(Command::Set(Setting::Model("llama3-70b-8192".to_owned())))
        );
        assert!(matches!(
            Command::parse("/type skiing"),
            Err(CommandError::InvalidArgument(_))
        ));
        assert_eq!(
            Command::parse("/season"),
            Err(CommandError::MissingArgument("season"))
        );
    }

    #[test]
    fn test_budget_range() {
        assert_eq!(
            Command::parse("/budget 800 - 2500"),
            Ok(Command::Set(Setting::Budget(
                BudgetRange::new(800, 2500).unwrap()
            )))
        );
        assert!(Command::parse("/budget 400 2000").is_err());
        assert!(Command::parse("/budget 1000 20000").is_err());
        assert!(Command::parse("/budget 3000 1000").is_err());
        assert!(Command::parse("/budget 1000").is_err());
    }

    #[test]
    fn test_memory_range() {
        assert_eq!(
            Command::parse("/memory 2"),
            Ok(Command::Set(Setting::Memory(2)))
        );
        assert!(Command::parse("/memory 1").is_err());
        assert!(Command::parse("/memory 11").is_err());
        assert!(Command::parse("/memory many").is_err());
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(Command::parse("/prefs"), Ok(Command::ShowPrefs));
        assert_eq!(Command::parse("/history"), Ok(Command::ShowHistory));
        assert_eq!(Command::parse("/clear"), Ok(Command::Clear));
        assert_eq!(Command::parse("/help"), Ok(Command::Help));
        assert_eq!(Command::parse("/exit"), Ok(Command::Quit));
        assert_eq!(
            Command::parse("/fly"),
            Err(CommandError::Unknown("fly".to_owned()))
        );
    }

    #[test]
    fn test_apply_setting() {
        let mut prefs = PreferenceSet::default();
        let mut window_size = 5;
        Setting::Season(Season::Spring).apply(&mut prefs, &mut window_size);
        Setting::Memory(3).apply(&mut prefs, &mut window_size);
        assert_eq!(prefs.season, Season::Spring);
        assert_eq!(prefs.travel_type, TravelType::Adventure);
        assert_eq!(window_size, 3);
    }

    #[test]
    fn test_help_lists_choices() {
        let help = help_text();
        assert!(help.contains("Budget-friendly"));
        assert!(help.contains("Quick Overview"));
        assert!(help.contains("Mixtral-8x7b-32768"));
        assert!(help.contains("Llama-3.1-8b-Instant"));
        assert_eq!(KNOWN_MODELS.len(), 5);
    }
}
