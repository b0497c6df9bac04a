//! Key bindings for the diagram editor.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s:
//! - Escape cancels the gesture in flight and clears the selection
//! - Delete / Backspace removes the selection (edges cascade)
//! - ⌘D clones the selection, ⌘A selects everything
//! - ⌘0 resets the view, ⌘= / ⌘- zoom about the viewport centre
//! - G, U and ` toggle the grid, UI and debug layers

use crate::input::Modifiers;
use dg_core::Layer;

/// What a bound key combo asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Edit ──
    Delete,
    SelectAll,
    Duplicate,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ResetView,
    ToggleLayer(Layer),

    // ── UI ──
    Cancel,
}

/// Key + modifier lookup. `ctrl` and `meta` both count as the command
/// modifier, so ⌘ and Ctrl bindings are the same table.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `None` for unbound combos.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if modifiers.command() {
            return match key {
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ResetView),
                _ => None,
            };
        }

        if modifiers.shift || modifiers.alt {
            return None;
        }

        // Bare keys.
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Cancel),
            "g" | "G" => Some(ShortcutAction::ToggleLayer(Layer::Grid)),
            "u" | "U" => Some(ShortcutAction::ToggleLayer(Layer::Ui)),
            "`" => Some(ShortcutAction::ToggleLayer(Layer::Debug)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_edit_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("Delete", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("d", Modifiers::CTRL),
            Some(ShortcutAction::Duplicate)
        );
        // Cmd+A → SelectAll
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(
            ShortcutMap::resolve("a", meta),
            Some(ShortcutAction::SelectAll)
        );
    }

    #[test]
    fn resolve_view_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("0", Modifiers::CTRL),
            Some(ShortcutAction::ResetView)
        );
        assert_eq!(
            ShortcutMap::resolve("=", Modifiers::CTRL),
            Some(ShortcutAction::ZoomIn)
        );
        assert_eq!(
            ShortcutMap::resolve("-", Modifiers::CTRL),
            Some(ShortcutAction::ZoomOut)
        );
        assert_eq!(
            ShortcutMap::resolve("g", Modifiers::NONE),
            Some(ShortcutAction::ToggleLayer(Layer::Grid))
        );
    }

    #[test]
    fn resolve_escape_and_unbound() {
        assert_eq!(
            ShortcutMap::resolve("Escape", Modifiers::NONE),
            Some(ShortcutAction::Cancel)
        );
        assert_eq!(ShortcutMap::resolve("d", Modifiers::NONE), None);
        assert_eq!(ShortcutMap::resolve("Delete", Modifiers::SHIFT), None);
        assert_eq!(ShortcutMap::resolve("q", Modifiers::CTRL), None);
    }
}
