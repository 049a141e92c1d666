//! Terminal front-end (`haven chat`)
//!
//! Same controller as the web page. Plain lines are typed turns; `/speak`
//! runs a voice turn.

use std::io;

use dialoguer::Input;

use crate::controller::{
    InteractionController, LISTENING_NOTICE, TurnOrigin, TurnOutcome, you_said,
};
use crate::prompt::format_emotions;
use crate::{Error, Result};

/// A line entered at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Say(String),
    Speak,
    History,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ReplCommand {
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        match line {
            "/speak" | "/s" => Self::Speak,
            "/history" | "/h" => Self::History,
            "/help" | "/?" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            other if other.starts_with('/') => Self::Unknown(other.to_string()),
            other => Self::Say(other.to_string()),
        }
    }
}

const HELP: &str = "Type a message and press enter.
  /speak    talk instead of typing
  /history  show the whole conversation
  /quit     leave";

/// Run the prompt loop until `/quit`, Ctrl-D or Ctrl-C
///
/// # Errors
///
/// Returns error if the terminal cannot be read
pub async fn run(controller: &mut InteractionController) -> Result<()> {
    if let Some(greeting) = controller.greeting() {
        println!("Bot: {greeting}");
    }
    println!("(/help for commands)\n");

    loop {
        let Some(line) = read_line().await? else {
            println!();
            break;
        };

        let outcome = match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                println!("{HELP}");
                continue;
            }
            ReplCommand::History => {
                for utterance in controller.history() {
                    println!("{utterance}");
                }
                continue;
            }
            ReplCommand::Unknown(cmd) => {
                println!("Unknown command {cmd}; try /help");
                continue;
            }
            ReplCommand::Speak => {
                if controller.voice_enabled() {
                    println!("{LISTENING_NOTICE}");
                }
                controller.speak().await
            }
            ReplCommand::Say(text) => controller.submit_text(&text).await,
        };

        print_outcome(&outcome);
    }

    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Completed {
            origin,
            user,
            reply,
            emotions,
            ..
        } => {
            if *origin == TurnOrigin::Voice {
                println!("{}", you_said(user));
            }
            if let Some(line) = format_emotions(emotions) {
                println!("  ({line})");
            }
            println!("Bot: {reply}\n");
        }
        TurnOutcome::Aborted { notice } => println!("{notice}\n"),
        TurnOutcome::Ignored => {}
    }
}

/// Next line from the terminal, or `None` once the user closes input
async fn read_line() -> Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        match Input::<String>::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => Ok(Some(line)),
            Err(e) if is_end_of_input(&e) => Ok(None),
            Err(e) => Err(Error::Io(io::Error::other(e.to_string()))),
        }
    })
    .await
    .map_err(|e| Error::Io(io::Error::other(e.to_string())))?
}

fn is_end_of_input(err: &dialoguer::Error) -> bool {
    matches!(
        err,
        dialoguer::Error::IO(e)
            if matches!(e.kind(), io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted)
    )
}
