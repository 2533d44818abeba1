//! Normal mode handler: scrolling, navigation, yanking, mode transitions.

use log::debug;

use super::input::Action;
use super::mode_command::CommandState;
use super::mode_search::SearchState;
use super::state::ViewState;
use super::{Effect, Nav, ViewerMode};
use crate::location::Location;
use crate::view::PoemView;

pub(super) struct NormalCtx<'a> {
    pub state: &'a ViewState,
    pub view: &'a PoemView,
    pub max_scroll: usize,
    pub scroll_step: usize,
    pub half_page: usize,
    /// Page URL for opening poems in the browser, if configured.
    pub web_url: Option<&'a str>,
}

pub(super) fn handle(action: Action, ctx: &NormalCtx) -> Vec<Effect> {
    match action {
        Action::Quit => vec![Effect::Exit],

        Action::CancelInput | Action::Digit => vec![Effect::RedrawStatusBar],

        Action::ScrollDown(count) => {
            let y = (ctx.state.scroll + count as usize * ctx.scroll_step).min(ctx.max_scroll);
            debug!("scroll down: {} → {y} (count={count})", ctx.state.scroll);
            vec![Effect::ScrollTo(y)]
        }
        Action::ScrollUp(count) => {
            let y = ctx
                .state
                .scroll
                .saturating_sub(count as usize * ctx.scroll_step);
            debug!("scroll up: {} → {y} (count={count})", ctx.state.scroll);
            vec![Effect::ScrollTo(y)]
        }
        Action::HalfPageDown(count) => {
            let y = (ctx.state.scroll + count as usize * ctx.half_page).min(ctx.max_scroll);
            vec![Effect::ScrollTo(y)]
        }
        Action::HalfPageUp(count) => {
            let y = ctx
                .state
                .scroll
                .saturating_sub(count as usize * ctx.half_page);
            vec![Effect::ScrollTo(y)]
        }
        Action::JumpToTop => vec![Effect::ScrollTo(0)],
        Action::JumpToBottom => vec![Effect::ScrollTo(ctx.max_scroll)],

        Action::Random => vec![Effect::Navigate(Nav::Random)],
        Action::Back => vec![Effect::Navigate(Nav::Back)],
        Action::Forward => vec![Effect::Navigate(Nav::Forward)],

        Action::EnterSearch => vec![Effect::SetMode(ViewerMode::Search(SearchState::new()))],
        Action::EnterCommand => vec![Effect::SetMode(ViewerMode::Command(CommandState::new()))],

        Action::OpenSimilarPrompt => vec![
            Effect::Flash("Type No to open similar poem N (NO: in browser)".into()),
            Effect::RedrawStatusBar,
        ],
        Action::OpenSimilar(n) => match similar_index(ctx.view, n) {
            Some(idx) => vec![Effect::Navigate(Nav::Similar(idx))],
            None => out_of_range(ctx.view, n),
        },
        Action::OpenSimilarExternal(n) => {
            let Some(idx) = similar_index(ctx.view, n) else {
                return out_of_range(ctx.view, n);
            };
            let id = &ctx.view.similar.entries()[idx].id;
            match ctx.web_url {
                Some(page) => {
                    let url = Location::poem(id.clone()).to_url(page);
                    vec![
                        Effect::OpenUrl(url.clone()),
                        Effect::Flash(format!("Opening {url}")),
                        Effect::RedrawStatusBar,
                    ]
                }
                None => vec![
                    Effect::Flash("web_url is not configured".into()),
                    Effect::RedrawStatusBar,
                ],
            }
        }

        Action::Yank => {
            if !ctx.view.has_poem() {
                return vec![
                    Effect::Flash("Nothing to yank".into()),
                    Effect::RedrawStatusBar,
                ];
            }
            let text = yank_text(ctx.view);
            let line_count = text.lines().count();
            debug!("yank: {} bytes, {line_count} lines", text.len());
            vec![
                Effect::Yank(text),
                Effect::Flash(format!("Yanked poem ({line_count} lines)")),
                Effect::RedrawStatusBar,
            ]
        }
    }
}

/// 1-based entry number → index, if such an entry is displayed.
fn similar_index(view: &PoemView, n: u32) -> Option<usize> {
    let idx = (n as usize).checked_sub(1)?;
    (idx < view.similar.entries().len()).then_some(idx)
}

fn out_of_range(view: &PoemView, n: u32) -> Vec<Effect> {
    let count = view.similar.entries().len();
    let msg = if count == 0 {
        "No similar poems to open".to_string()
    } else {
        format!("Similar poem {n} out of range (1-{count})")
    };
    vec![Effect::Flash(msg), Effect::RedrawStatusBar]
}

fn yank_text(view: &PoemView) -> String {
    let mut text = format!("{}\n{}\n", view.title, view.author);
    if let Some(date) = &view.date {
        text.push_str(date);
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&view.text);
    text
}
