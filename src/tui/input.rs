//! Text input field for the terminal user interface.
//!
//! The cursor is a byte offset into the value and is always kept on a char
//! boundary, so editing text with multi-byte characters never splits a
//! UTF-8 sequence.

/// A text input field with cursor position and active state management.
#[derive(Clone, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.len(),
            active: false,
        }
    }

    /// Insert a character at the cursor.
    pub fn handle_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if let Some(c) = self.value[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.value.remove(self.cursor);
        }
    }

    /// Delete the character at the cursor.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    /// Move the cursor one character to the left.
    pub fn move_cursor_left(&mut self) {
        if let Some(c) = self.value[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    /// Move the cursor one character to the right.
    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.value[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    /// Reset to an empty field.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typing_after_multibyte_character() {
        let mut field = InputField::new();
        for c in "café".chars() {
            field.handle_char(c);
        }
        field.handle_char('x');
        assert_eq!(field.value, "caféx");
        assert_eq!(field.cursor, field.value.len());
    }

    #[test]
    fn backspace_removes_whole_character() {
        let mut field = InputField::with_value("café");
        field.handle_backspace();
        assert_eq!(field.value, "caf");
        field.handle_backspace();
        assert_eq!(field.value, "ca");
    }

    #[test]
    fn cursor_steps_over_multibyte_boundaries() {
        let mut field = InputField::with_value("café");
        field.move_cursor_left();
        field.move_cursor_left();
        field.handle_char('f');
        assert_eq!(field.value, "caffé");

        field.move_cursor_right();
        field.move_cursor_right();
        assert_eq!(field.cursor, field.value.len());
        field.move_cursor_right();
        assert_eq!(field.cursor, field.value.len());
    }

    #[test]
    fn delete_at_cursor() {
        let mut field = InputField::with_value("café");
        field.move_cursor_left();
        field.handle_delete();
        assert_eq!(field.value, "caf");
        field.handle_delete();
        assert_eq!(field.value, "caf");
    }
}
