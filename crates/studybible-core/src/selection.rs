//! Hover and verse selection. The two are tracked independently: hovering
//! never changes the selection and a selection never blocks hover.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseSelection {
    pub verse: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A new verse became the selection.
    Selected(VerseSelection),
    /// The selected verse was clicked again.
    Deselected,
}

/// Visual flags for one verse row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerseFlags {
    pub hovered: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    hover: Option<u32>,
    selected: Option<VerseSelection>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hover(&mut self, verse: u32) {
        self.hover = Some(verse);
    }

    pub fn unhover(&mut self) {
        self.hover = None;
    }

    /// Select `verse`, or clear the selection if `verse` is already selected.
    pub fn click(&mut self, verse: u32, text: &str) -> ClickOutcome {
        if self.selected.as_ref().is_some_and(|s| s.verse == verse) {
            self.selected = None;
            return ClickOutcome::Deselected;
        }

        let selection = VerseSelection {
            verse,
            text: text.to_string(),
        };
        self.selected = Some(selection.clone());
        ClickOutcome::Selected(selection)
    }

    /// Drop both hover and selection (navigation changed).
    pub fn clear(&mut self) {
        self.hover = None;
        self.selected = None;
    }

    pub fn hovered(&self) -> Option<u32> {
        self.hover
    }

    pub fn selected(&self) -> Option<&VerseSelection> {
        self.selected.as_ref()
    }

    pub fn flags(&self, verse: u32) -> VerseFlags {
        VerseFlags {
            hovered: self.hover == Some(verse),
            selected: self.selected.as_ref().is_some_and(|s| s.verse == verse),
        }
    }
}
