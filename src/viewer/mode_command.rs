//! Command mode handler (`:` prompt).

use std::io;

use super::input::PromptAction;
use super::state::Layout;
use super::terminal;
use super::{Effect, Nav, ViewerMode};
use crate::location::Location;

/// Mutable state for command mode (`:` prompt).
pub(super) struct CommandState {
    pub input: String,
}

impl CommandState {
    pub(super) fn new() -> Self {
        Self {
            input: String::new(),
        }
    }
}

/// Parsed `:` command.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Empty,
    Quit,
    Random,
    Poem(Location),
    Search(String),
    Open,
    Similar,
    Back,
    Forward,
    Unknown(String),
}

fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let (name, arg) = match input.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (input, ""),
    };
    match (name, arg) {
        ("", _) => Command::Empty,
        ("q" | "quit", _) => Command::Quit,
        ("r" | "random", _) => Command::Random,
        ("p" | "poem", arg) if !arg.is_empty() => Command::Poem(Location::parse_arg(arg)),
        ("s" | "search", arg) if !arg.is_empty() => Command::Search(arg.to_string()),
        ("open", _) => Command::Open,
        ("similar", _) => Command::Similar,
        ("back", _) => Command::Back,
        ("forward" | "fwd", _) => Command::Forward,
        _ => Command::Unknown(input.to_string()),
    }
}

/// `current_url` is the browser URL of the displayed poem, if one can be built.
pub(super) fn handle(
    action: PromptAction,
    cs: &mut CommandState,
    layout: &Layout,
    current_url: Option<String>,
) -> io::Result<Vec<Effect>> {
    match action {
        PromptAction::Type(c) => {
            cs.input.push(c);
            terminal::draw_prompt_bar(layout, ':', &cs.input)?;
            Ok(vec![])
        }
        PromptAction::Backspace => {
            if cs.input.is_empty() {
                // Empty input + Backspace → cancel (vim behavior)
                Ok(vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty])
            } else {
                cs.input.pop();
                terminal::draw_prompt_bar(layout, ':', &cs.input)?;
                Ok(vec![])
            }
        }
        PromptAction::Execute => Ok(execute(parse_command(&cs.input), current_url)),
        PromptAction::Cancel => Ok(vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty]),
    }
}

fn execute(cmd: Command, current_url: Option<String>) -> Vec<Effect> {
    let nav = match cmd {
        Command::Empty => return vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty],
        Command::Quit => return vec![Effect::Exit],
        Command::Random => Nav::Random,
        Command::Poem(location) => match location.poem_id() {
            Some(id) => Nav::Poem(id.to_string()),
            None => Nav::Random,
        },
        Command::Search(query) => Nav::Search(query),
        Command::Similar => Nav::ReloadSimilar,
        Command::Back => Nav::Back,
        Command::Forward => Nav::Forward,
        Command::Open => {
            let mut effects = vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty];
            match current_url {
                Some(url) => {
                    effects.push(Effect::Flash(format!("Opening {url}")));
                    effects.push(Effect::OpenUrl(url));
                }
                None => effects.push(Effect::Flash(
                    "Nothing to open (no poem shown or web_url not configured)".into(),
                )),
            }
            return effects;
        }
        Command::Unknown(cmd) => {
            return vec![
                Effect::SetMode(ViewerMode::Normal),
                Effect::Flash(format!("Unknown command: {cmd}")),
                Effect::MarkDirty,
            ];
        }
    };
    vec![
        Effect::SetMode(ViewerMode::Normal),
        Effect::Navigate(nav),
        Effect::MarkDirty,
    ]
}
