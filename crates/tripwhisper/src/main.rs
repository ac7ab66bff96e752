//! Terminal front end of the TripWhisper travel advisor.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tripwhisper::command::{Command, help_text};
use tripwhisper::config::Config;
use tripwhisper_core::{Advisor, Error, Role, SessionBuilder};
use tripwhisper_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", "error:".bright_red().bold());
            return ExitCode::FAILURE;
        }
    };
    debug!("starting with {config:?}");

    let mut provider_config = OpenAIConfigBuilder::with_api_key(&config.api_key)
        .with_model(&config.model);
    if let Some(base_url) = &config.base_url {
        provider_config = provider_config.with_base_url(base_url);
    }
    let model_provider = OpenAIProvider::new(provider_config.build());

    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<String>();

    let mut builder = SessionBuilder::with_model_provider(model_provider)
        .with_preferences(config.initial_preferences())
        .with_window_size(config.window_size)
        .on_transcript(move |delta| {
            delta_tx.send(delta.to_owned()).ok();
        });
    if let Some(timeout) = config.timeout {
        builder = builder.with_timeout(timeout);
    }
    if let Some(backoff) = config.backoff() {
        builder = builder.with_retry(backoff);
    }
    let advisor = builder.spawn();

    println!("{}", "✈️TripWhisper - Your Trip Planner".bright_white().bold());
    println!(
        "{}",
        "Ask your travel advisor anything, e.g., 'What are the best destinations for relaxation?'"
            .dimmed()
    );
    println!("{}", "Type /help to change your travel preferences.".dimmed());

    let mut stdin = io::BufReader::new(io::stdin());

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                print_failure(&err.to_string());
                continue;
            }
        };

        let result = match command {
            Command::Chat(text) if text.is_empty() => Ok(()),
            Command::Chat(text) => {
                run_turn(&advisor, text, &mut delta_rx).await
            }
            Command::Set(setting) => {
                async {
                    let (mut prefs, mut window_size) =
                        advisor.preferences().await?;
                    setting.apply(&mut prefs, &mut window_size);
                    advisor.configure(prefs, window_size).await?;
                    print_notice("Preferences updated.");
                    Ok::<_, Error>(())
                }
                .await
            }
            Command::ShowPrefs => show_prefs(&advisor).await,
            Command::ShowHistory => show_history(&advisor).await,
            Command::Clear => advisor.clear().await.map(|_| {
                print_notice("Started a new conversation.");
            }),
            Command::Help => {
                println!("{}", help_text());
                Ok(())
            }
            Command::Quit => break,
        };

        match result {
            Ok(()) => {}
            Err(Error::Provider(err)) => {
                print_failure(&format!("Failed to get a reply: {err}"));
            }
            Err(Error::SessionClosed) => {
                error!("the advisor session ended unexpectedly");
                return ExitCode::FAILURE;
            }
        }
    }

    advisor.close();
    ExitCode::SUCCESS
}

/// Submits one turn, printing the reply as it streams in.
async fn run_turn(
    advisor: &Advisor,
    text: String,
    delta_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), Error> {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style);
    progress_bar.set_message("🤔 Thinking...");

    let mut printer = ReplyPrinter::default();
    let turn = advisor.submit_turn(text);
    tokio::pin!(turn);

    let result = loop {
        let tick = sleep(Duration::from_millis(100));
        select! {
            biased;

            Some(delta) = delta_rx.recv() => {
                progress_bar.finish_and_clear();
                printer.print(&delta);
            },
            result = &mut turn => break result,
            _ = tick => {
                progress_bar.inc(1);
            }
        }
    };

    progress_bar.finish_and_clear();
    while let Ok(delta) = delta_rx.try_recv() {
        printer.print(&delta);
    }
    printer.finish();

    result.map(|_| ())
}

#[derive(Default)]
struct ReplyPrinter {
    started: bool,
}

impl ReplyPrinter {
    fn print(&mut self, delta: &str) {
        if !self.started {
            print!("{}🧳 ", BAR_CHAR.bright_cyan());
            self.started = true;
        }
        // Keep the bar at the start of every line of the reply.
        let delta = delta.replace('\n', &format!("\n{}", BAR_CHAR.bright_cyan()));
        print!("{}", delta.bright_white());
        std::io::stdout().flush().ok();
    }

    fn finish(self) {
        if self.started {
            println!();
        }
    }
}

async fn show_prefs(advisor: &Advisor) -> Result<(), Error> {
    let (prefs, window_size) = advisor.preferences().await?;
    let bar = BAR_CHAR.bright_green();
    println!("{bar}Travel type: {}", prefs.travel_type.bold());
    println!(
        "{bar}Budget: {}",
        format!("{} - {} USD", prefs.budget.min(), prefs.budget.max()).bold()
    );
    println!("{bar}Season: {}", prefs.season.bold());
    println!("{bar}Itinerary style: {}", prefs.itinerary_style.bold());
    println!("{bar}Memory: {} exchanges", window_size.bold());
    println!("{bar}Model: {}", prefs.model_id.bold());
    Ok(())
}

async fn show_history(advisor: &Advisor) -> Result<(), Error> {
    let history = advisor.history().await?;
    if history.is_empty() {
        print_notice("Nothing remembered yet.");
        return Ok(());
    }
    for msg in history {
        match msg.role {
            Role::User => {
                println!("{}You: {}", BAR_CHAR.bright_yellow(), msg.content)
            }
            Role::Assistant => println!(
                "{}🧳 {}",
                BAR_CHAR.bright_cyan(),
                msg.content.bright_white()
            ),
        }
    }
    Ok(())
}

fn print_notice(msg: &str) {
    println!("{}{}", BAR_CHAR.bright_green(), msg.dimmed());
}

fn print_failure(msg: &str) {
    println!("{}❌ {}", BAR_CHAR.bright_red(), msg.bright_red());
}

/// Reads one line. The reader must outlive the loop, as it may hold
/// lines beyond the first.
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut line = String::new();

    match reader.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_keeps_buffered_lines() {
        let mut reader = io::BufReader::new(&b"/season summer\n/prefs\n"[..]);
        assert_eq!(
            read_line(&mut reader).await.as_deref(),
            Some("/season summer\n")
        );
        assert_eq!(read_line(&mut reader).await.as_deref(), Some("/prefs\n"));
        assert_eq!(read_line(&mut reader).await, None);
    }
}
