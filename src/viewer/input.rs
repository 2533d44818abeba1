//! Input processing layer: key mapping and numeric prefix accumulator.
//!
//! Pure logic, no I/O. All functions are deterministic and testable.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const MAX_COUNT: u32 = 9_999;

/// Accumulated numeric prefix for vim/less-style commands.
///
/// Users type digits then a command character: `10j` scrolls 10 steps down,
/// `2o` opens the second similar poem.
pub(super) struct InputAccumulator {
    count: Option<u32>,
}

impl InputAccumulator {
    pub(super) fn new() -> Self {
        Self { count: None }
    }

    /// Feed a digit. Returns false if overflow would occur.
    fn push_digit(&mut self, d: u32) -> bool {
        let current = self.count.unwrap_or(0);
        let new = current.saturating_mul(10).saturating_add(d);
        if new > MAX_COUNT {
            return false;
        }
        self.count = Some(new);
        true
    }

    fn take(&mut self) -> Option<u32> {
        self.count.take()
    }

    pub(super) fn peek(&self) -> Option<u32> {
        self.count
    }

    pub(super) fn reset(&mut self) {
        self.count = None;
    }

    pub(super) fn is_active(&self) -> bool {
        self.count.is_some()
    }
}

/// Actions produced by key input in normal mode.
pub(super) enum Action {
    Quit,
    ScrollDown(u32),
    ScrollUp(u32),
    HalfPageDown(u32),
    HalfPageUp(u32),
    JumpToTop,
    JumpToBottom,
    Random,
    Back,
    Forward,
    EnterSearch,
    EnterCommand,
    /// Open the N-th (1-based) similar poem in place.
    OpenSimilar(u32),
    /// Open the N-th (1-based) similar poem in the system browser.
    OpenSimilarExternal(u32),
    OpenSimilarPrompt,
    Yank,
    CancelInput,
    /// A digit was accumulated; caller should redraw status bar.
    Digit,
}

/// Line-editing actions shared by the `/` and `:` prompts.
pub(super) enum PromptAction {
    Type(char),
    Backspace,
    Execute,
    Cancel,
}

/// Map a key event to an `Action`, consuming/updating the accumulator as needed.
///
/// Returns `None` for unknown keys (caller should reset accumulator).
pub(super) fn map_key_event(key: KeyEvent, acc: &mut InputAccumulator) -> Option<Action> {
    let KeyEvent {
        code, modifiers, ..
    } = key;

    match (code, modifiers) {
        (KeyCode::Char('q'), _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Action::Quit),

        (KeyCode::Esc, _) => {
            acc.reset();
            Some(Action::CancelInput)
        }

        (KeyCode::Char(c @ '0'..='9'), KeyModifiers::NONE) => {
            acc.push_digit(c as u32 - '0' as u32);
            Some(Action::Digit)
        }

        (KeyCode::Left, KeyModifiers::ALT) | (KeyCode::Char('H'), _) => {
            acc.reset();
            Some(Action::Back)
        }
        (KeyCode::Right, KeyModifiers::ALT) | (KeyCode::Char('L'), _) => {
            acc.reset();
            Some(Action::Forward)
        }

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => {
            Some(Action::ScrollDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(Action::ScrollUp(acc.take().unwrap_or(1))),
        (KeyCode::Char('d'), _) | (KeyCode::PageDown, _) => {
            Some(Action::HalfPageDown(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('u'), _) | (KeyCode::PageUp, _) => {
            Some(Action::HalfPageUp(acc.take().unwrap_or(1)))
        }
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => {
            acc.reset();
            Some(Action::JumpToTop)
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            acc.reset();
            Some(Action::JumpToBottom)
        }

        (KeyCode::Char('o'), _) | (KeyCode::Enter, _) => match acc.take() {
            None => Some(Action::OpenSimilarPrompt),
            Some(n) => Some(Action::OpenSimilar(n)),
        },
        (KeyCode::Char('O'), _) => match acc.take() {
            None => Some(Action::OpenSimilarPrompt),
            Some(n) => Some(Action::OpenSimilarExternal(n)),
        },

        (KeyCode::Char('r'), _) => {
            acc.reset();
            Some(Action::Random)
        }
        (KeyCode::Char('/'), _) => {
            acc.reset();
            Some(Action::EnterSearch)
        }
        (KeyCode::Char(':'), _) => {
            acc.reset();
            Some(Action::EnterCommand)
        }
        (KeyCode::Char('y'), _) => {
            acc.reset();
            Some(Action::Yank)
        }

        _ => None,
    }
}

/// Map a key event while a prompt is open.
pub(super) fn map_prompt_key(key: KeyEvent) -> Option<PromptAction> {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
            Some(PromptAction::Cancel)
        }
        (KeyCode::Enter, _) => Some(PromptAction::Execute),
        (KeyCode::Backspace, _) => Some(PromptAction::Backspace),
        (KeyCode::Char(c), m) if !m.contains(KeyModifiers::CONTROL) => Some(PromptAction::Type(c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn simple_key(code: KeyCode) -> KeyEvent {
        key(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_5j_scroll_down() {
        let mut acc = InputAccumulator::new();
        let a = map_key_event(simple_key(KeyCode::Char('5')), &mut acc);
        assert!(matches!(a, Some(Action::Digit)));
        let a = map_key_event(simple_key(KeyCode::Char('j')), &mut acc);
        assert!(matches!(a, Some(Action::ScrollDown(5))));
    }

    #[test]
    fn test_2o_opens_second_similar() {
        let mut acc = InputAccumulator::new();
        map_key_event(simple_key(KeyCode::Char('2')), &mut acc);
        let a = map_key_event(simple_key(KeyCode::Char('o')), &mut acc);
        assert!(matches!(a, Some(Action::OpenSimilar(2))));
        assert!(!acc.is_active());
    }

    #[test]
    fn test_shift_o_opens_externally() {
        let mut acc = InputAccumulator::new();
        map_key_event(simple_key(KeyCode::Char('3')), &mut acc);
        let a = map_key_event(key(KeyCode::Char('O'), KeyModifiers::SHIFT), &mut acc);
        assert!(matches!(a, Some(Action::OpenSimilarExternal(3))));
    }

    #[test]
    fn test_o_without_prefix_prompts() {
        let mut acc = InputAccumulator::new();
        let a = map_key_event(simple_key(KeyCode::Char('o')), &mut acc);
        assert!(matches!(a, Some(Action::OpenSimilarPrompt)));
    }

    #[test]
    fn test_history_keys() {
        let mut acc = InputAccumulator::new();
        let a = map_key_event(key(KeyCode::Char('H'), KeyModifiers::SHIFT), &mut acc);
        assert!(matches!(a, Some(Action::Back)));
        let a = map_key_event(key(KeyCode::Right, KeyModifiers::ALT), &mut acc);
        assert!(matches!(a, Some(Action::Forward)));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut acc = InputAccumulator::new();
        let a = map_key_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL), &mut acc);
        assert!(matches!(a, Some(Action::Quit)));
    }

    #[test]
    fn test_esc_cancels_input() {
        let mut acc = InputAccumulator::new();
        map_key_event(simple_key(KeyCode::Char('5')), &mut acc);
        assert!(acc.is_active());
        let a = map_key_event(simple_key(KeyCode::Esc), &mut acc);
        assert!(matches!(a, Some(Action::CancelInput)));
        assert!(!acc.is_active());
    }

    #[test]
    fn test_unknown_key_returns_none() {
        let mut acc = InputAccumulator::new();
        let a = map_key_event(simple_key(KeyCode::Char('x')), &mut acc);
        assert!(a.is_none());
    }

    #[test]
    fn test_count_saturates() {
        let mut acc = InputAccumulator::new();
        for _ in 0..8 {
            map_key_event(simple_key(KeyCode::Char('9')), &mut acc);
        }
        assert_eq!(acc.peek(), Some(9_999));
    }

    #[test]
    fn test_prompt_keys() {
        assert!(matches!(
            map_prompt_key(simple_key(KeyCode::Char('я'))),
            Some(PromptAction::Type('я'))
        ));
        assert!(matches!(
            map_prompt_key(key(KeyCode::Char('S'), KeyModifiers::SHIFT)),
            Some(PromptAction::Type('S'))
        ));
        assert!(matches!(
            map_prompt_key(simple_key(KeyCode::Enter)),
            Some(PromptAction::Execute)
        ));
        assert!(matches!(
            map_prompt_key(simple_key(KeyCode::Esc)),
            Some(PromptAction::Cancel)
        ));
        assert!(map_prompt_key(key(KeyCode::Char('w'), KeyModifiers::CONTROL)).is_none());
    }
}
