//! Keyboard shortcut resolution for editor history commands.

/// History command triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Undo,
    Redo,
}

/// Maps `Ctrl/Cmd+Z` to undo and `Ctrl/Cmd+Shift+Z` to redo.
pub fn resolve_shortcut(key: &str, ctrl_or_meta: bool, shift: bool) -> Option<EditorCommand> {
    if !ctrl_or_meta || !key.eq_ignore_ascii_case("z") {
        return None;
    }
    Some(if shift {
        EditorCommand::Redo
    } else {
        EditorCommand::Undo
    })
}

/// Parses chords such as `ctrl+z`, `cmd+shift+z` or `Meta+Z`.
pub fn parse_chord(chord: &str) -> Option<EditorCommand> {
    let mut ctrl_or_meta = false;
    let mut shift = false;
    let mut key = None;
    for part in chord.split('+').map(str::trim) {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "cmd" | "meta" => ctrl_or_meta = true,
            "shift" => shift = true,
            "" => return None,
            _ if key.is_none() => key = Some(part),
            _ => return None,
        }
    }
    resolve_shortcut(key?, ctrl_or_meta, shift)
}
