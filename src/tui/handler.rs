use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    MoveToTop,
    MoveToBottom,
    MarkDone,
    LogWithNote,
    SkipStart,
    ToggleArchive,
    DeleteRoutine,
    OpenLink,
    CycleFilter,
    CycleTag,
    CycleSeason,
    CycleView,
    ShowHelp,
    HideHelp,
    // Prompt input actions
    InputChar(char),
    InputBackspace,
    InputConfirm,
    InputCancel,
}

pub fn handle_key_event(key: KeyEvent, input_active: bool, show_help: bool) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    if input_active {
        return match key.code {
            KeyCode::Enter => Some(AppAction::InputConfirm),
            KeyCode::Esc => Some(AppAction::InputCancel),
            KeyCode::Backspace => Some(AppAction::InputBackspace),
            KeyCode::Char(c) => Some(AppAction::InputChar(c)),
            _ => None,
        };
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),
        (KeyCode::Char('<'), _) | (KeyCode::Home, _) => Some(AppAction::MoveToTop),
        (KeyCode::Char('>'), _) | (KeyCode::End, _) => Some(AppAction::MoveToBottom),

        (KeyCode::Char('d'), _) => Some(AppAction::MarkDone),
        (KeyCode::Char('n'), _) => Some(AppAction::LogWithNote),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(AppAction::SkipStart),
        (KeyCode::Char('S'), _) => Some(AppAction::CycleSeason),
        (KeyCode::Char('a'), _) => Some(AppAction::ToggleArchive),
        (KeyCode::Char('X'), _) => Some(AppAction::DeleteRoutine),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenLink),
        (KeyCode::Char('f'), _) => Some(AppAction::CycleFilter),
        (KeyCode::Char('t'), _) => Some(AppAction::CycleTag),
        (KeyCode::Tab, _) => Some(AppAction::CycleView),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn help_swallows_any_key() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('q')), false, true),
            Some(AppAction::HideHelp)
        ));
    }

    #[test]
    fn prompt_captures_letters() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('q')), true, false),
            Some(AppAction::InputChar('q'))
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Esc), true, false),
            Some(AppAction::InputCancel)
        ));
    }

    #[test]
    fn shifted_s_cycles_season() {
        let shifted = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT);
        assert!(matches!(
            handle_key_event(shifted, false, false),
            Some(AppAction::CycleSeason)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('s')), false, false),
            Some(AppAction::SkipStart)
        ));
    }
}
