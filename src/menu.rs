//! Highlight interaction state and menu contents
//!
//! A highlight element moves through
//! `Unselected -> Selected -> MenuVisible -> {ColorChanged | NoteEdited | Removed | Dismissed}`.
//! Outcomes are terminal for that interaction; the next tap starts a new one.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::Rect;
use crate::highlights::HighlightStyle;

/// Which set of items the menu offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuMode {
    /// Plain text selection
    Default,
    /// Tap on existing highlight markup
    ExistingHighlight,
    /// Color picker for an existing highlight
    Colors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuItem {
    Play,
    Highlight,
    HighlightWithNote,
    Define,
    Colors,
    EditNote,
    Remove,
    Share,
    Color(HighlightStyle),
}

/// Inputs that decide which optional items appear
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuOptions {
    pub allow_sharing: bool,
    /// Book has audio, or text-to-speech is enabled
    pub narration_available: bool,
    pub is_one_word: bool,
}

/// Items offered for `mode`, in display order
pub fn menu_items(mode: MenuMode, options: MenuOptions) -> Vec<MenuItem> {
    let mut items = Vec::new();

    match mode {
        MenuMode::Default => {
            if options.narration_available {
                items.push(MenuItem::Play);
            }
            items.push(MenuItem::Highlight);
            if options.is_one_word {
                items.push(MenuItem::Define);
            }
            items.push(MenuItem::HighlightWithNote);
            if options.allow_sharing {
                items.push(MenuItem::Share);
            }
        }
        MenuMode::ExistingHighlight => {
            items.extend([MenuItem::Colors, MenuItem::EditNote, MenuItem::Remove]);
            if options.allow_sharing {
                items.push(MenuItem::Share);
            }
        }
        MenuMode::Colors => {
            items.extend(HighlightStyle::PALETTE.iter().copied().map(MenuItem::Color));
        }
    }

    items
}

/// Whether a selection is a single word (offers "define")
pub fn is_one_word(selection: &str) -> bool {
    let trimmed = selection.trim();
    !trimmed.is_empty() && !trimmed.contains(char::is_whitespace)
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Unselected,
    Selected,
    MenuVisible { rect: Rect, mode: MenuMode },
    ColorChanged { id: String, style: HighlightStyle },
    NoteEdited { id: String },
    Removed { id: String },
    Dismissed,
}

impl InteractionState {
    fn name(&self) -> &'static str {
        match self {
            InteractionState::Unselected => "unselected",
            InteractionState::Selected => "selected",
            InteractionState::MenuVisible { .. } => "menu-visible",
            InteractionState::ColorChanged { .. } => "color-changed",
            InteractionState::NoteEdited { .. } => "note-edited",
            InteractionState::Removed { .. } => "removed",
            InteractionState::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MenuError {
    #[error("Cannot {event} while highlight interaction is {from}")]
    InvalidTransition { from: &'static str, event: &'static str },
}

/// Interaction with the highlight under the user's finger
#[derive(Debug, Clone)]
pub struct HighlightInteraction {
    state: InteractionState,
}

impl Default for HighlightInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightInteraction {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Unselected,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_menu_visible(&self) -> bool {
        matches!(self.state, InteractionState::MenuVisible { .. })
    }

    pub fn menu_mode(&self) -> Option<MenuMode> {
        match self.state {
            InteractionState::MenuVisible { mode, .. } => Some(mode),
            _ => None,
        }
    }

    /// A tap always starts a fresh interaction
    pub fn select(&mut self) {
        self.state = InteractionState::Selected;
    }

    /// Show (or switch) the menu. A zero rect keeps the current anchor.
    pub fn show_menu(&mut self, rect: Rect, mode: MenuMode) -> Result<Rect, MenuError> {
        let anchor = match &self.state {
            InteractionState::Selected => rect,
            InteractionState::MenuVisible { rect: current, .. } if rect.is_zero() => *current,
            InteractionState::MenuVisible { .. } => rect,
            other => return Err(self.invalid(other, "show menu")),
        };

        self.state = InteractionState::MenuVisible { rect: anchor, mode };
        Ok(anchor)
    }

    pub fn change_color(&mut self, id: &str, style: HighlightStyle) -> Result<(), MenuError> {
        self.finish("change color", InteractionState::ColorChanged {
            id: id.to_string(),
            style,
        })
    }

    pub fn edit_note(&mut self, id: &str) -> Result<(), MenuError> {
        self.finish("edit note", InteractionState::NoteEdited { id: id.to_string() })
    }

    pub fn remove(&mut self, id: &str) -> Result<(), MenuError> {
        self.finish("remove", InteractionState::Removed { id: id.to_string() })
    }

    /// Close the menu without acting. Returns false when nothing was open.
    pub fn dismiss(&mut self) -> bool {
        match self.state {
            InteractionState::Selected | InteractionState::MenuVisible { .. } => {
                self.state = InteractionState::Dismissed;
                true
            }
            _ => false,
        }
    }

    fn finish(&mut self, event: &'static str, outcome: InteractionState) -> Result<(), MenuError> {
        if !self.is_menu_visible() {
            return Err(self.invalid(&self.state, event));
        }
        self.state = outcome;
        Ok(())
    }

    fn invalid(&self, from: &InteractionState, event: &'static str) -> MenuError {
        MenuError::InvalidTransition {
            from: from.name(),
            event,
        }
    }
}
