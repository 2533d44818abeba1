//! Search prompt (`/`): collects a query and hands it to the poem search.

use std::io;

use super::input::PromptAction;
use super::state::Layout;
use super::terminal;
use super::{Effect, Nav, ViewerMode};

/// Mutable state while the `/` prompt is open.
pub(super) struct SearchState {
    pub query: String,
}

impl SearchState {
    pub(super) fn new() -> Self {
        Self {
            query: String::new(),
        }
    }
}

pub(super) fn handle(
    action: PromptAction,
    ss: &mut SearchState,
    layout: &Layout,
) -> io::Result<Vec<Effect>> {
    match action {
        PromptAction::Type(c) => {
            ss.query.push(c);
            terminal::draw_prompt_bar(layout, '/', &ss.query)?;
            Ok(vec![])
        }
        PromptAction::Backspace => {
            if ss.query.is_empty() {
                Ok(vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty])
            } else {
                ss.query.pop();
                terminal::draw_prompt_bar(layout, '/', &ss.query)?;
                Ok(vec![])
            }
        }
        PromptAction::Execute => Ok(submit(ss)),
        PromptAction::Cancel => Ok(vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty]),
    }
}

/// Effects for submitting the current query. A blank query just closes the prompt.
fn submit(ss: &SearchState) -> Vec<Effect> {
    let query = ss.query.trim();
    if query.is_empty() {
        return vec![Effect::SetMode(ViewerMode::Normal), Effect::MarkDirty];
    }
    vec![
        Effect::SetMode(ViewerMode::Normal),
        Effect::Navigate(Nav::Search(query.to_string())),
        Effect::MarkDirty,
    ]
}
