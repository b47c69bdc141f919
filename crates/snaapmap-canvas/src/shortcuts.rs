use keyboard_types::{Key, KeyState, KeyboardEvent, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorShortcut {
    Undo,
    Redo,
}

/// Ctrl/Cmd+Z undoes; Ctrl/Cmd+Y and Ctrl/Cmd+Shift+Z redo. Unmodified keys never match.
pub fn shortcut_for(key: &Key, modifiers: Modifiers) -> Option<EditorShortcut> {
    if !modifiers.intersects(Modifiers::CONTROL | Modifiers::META) {
        return None;
    }
    let Key::Character(text) = key else {
        return None;
    };
    let shift = modifiers.contains(Modifiers::SHIFT);
    match text.to_lowercase().as_str() {
        "z" if shift => Some(EditorShortcut::Redo),
        "z" => Some(EditorShortcut::Undo),
        "y" => Some(EditorShortcut::Redo),
        _ => None,
    }
}

pub fn shortcut_for_event(event: &KeyboardEvent) -> Option<EditorShortcut> {
    if event.state != KeyState::Down || event.is_composing {
        return None;
    }
    shortcut_for(&event.key, event.modifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: &str) -> Key {
        Key::Character(c.to_string())
    }

    #[test]
    fn modifier_gated_undo_and_redo() {
        assert_eq!(shortcut_for(&key("z"), Modifiers::CONTROL), Some(EditorShortcut::Undo));
        assert_eq!(shortcut_for(&key("z"), Modifiers::META), Some(EditorShortcut::Undo));
        assert_eq!(shortcut_for(&key("y"), Modifiers::CONTROL), Some(EditorShortcut::Redo));
        assert_eq!(
            shortcut_for(&key("Z"), Modifiers::META | Modifiers::SHIFT),
            Some(EditorShortcut::Redo)
        );
    }

    #[test]
    fn plain_and_shift_only_keys_do_not_match() {
        assert_eq!(shortcut_for(&key("z"), Modifiers::empty()), None);
        assert_eq!(shortcut_for(&key("y"), Modifiers::empty()), None);
        assert_eq!(shortcut_for(&key("Z"), Modifiers::SHIFT), None);
        assert_eq!(shortcut_for(&key("x"), Modifiers::CONTROL), None);
    }

    #[test]
    fn key_up_events_are_ignored() {
        let mut event = KeyboardEvent {
            key: key("z"),
            modifiers: Modifiers::CONTROL,
            ..KeyboardEvent::default()
        };
        assert_eq!(shortcut_for_event(&event), Some(EditorShortcut::Undo));
        event.state = KeyState::Up;
        assert_eq!(shortcut_for_event(&event), None);
    }
}
