/// Text buffer behind one form field. Cursor columns count chars, not bytes.
#[derive(Debug, Clone)]
pub struct TextEditor {
    pub content: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize,
    pub multiline: bool,
    pub is_dirty: bool,
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map(|(i, _)| i).unwrap_or(line.len())
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

impl TextEditor {
    pub fn single_line(content: &str) -> Self {
        Self::new(content, false)
    }

    pub fn multi_line(content: &str) -> Self {
        Self::new(content, true)
    }

    fn new(content: &str, multiline: bool) -> Self {
        let lines: Vec<String> = if content.is_empty() {
            vec![String::new()]
        } else if multiline {
            content.lines().map(|s| s.to_string()).collect()
        } else {
            vec![content.replace('\n', " ")]
        };

        let cursor_row = lines.len() - 1;
        let cursor_col = char_len(&lines[cursor_row]);
        TextEditor {
            content: lines,
            cursor_row,
            cursor_col,
            scroll_offset: 0,
            multiline,
            is_dirty: false,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let line = &mut self.content[self.cursor_row];
        self.cursor_col = self.cursor_col.min(char_len(line));
        let at = byte_index(line, self.cursor_col);
        line.insert(at, c);
        self.cursor_col += 1;
        self.is_dirty = true;
    }

    /// Splits the line at the cursor. Ignored by single-line fields.
    pub fn insert_newline(&mut self) {
        if !self.multiline {
            return;
        }
        let line = &mut self.content[self.cursor_row];
        let at = byte_index(line, self.cursor_col);
        let remaining = line.split_off(at);

        self.cursor_row += 1;
        self.cursor_col = 0;
        self.content.insert(self.cursor_row, remaining);
        self.is_dirty = true;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_col > 0 {
            let line = &mut self.content[self.cursor_row];
            let at = byte_index(line, self.cursor_col - 1);
            if at < line.len() {
                line.remove(at);
            }
            self.cursor_col -= 1;
            self.is_dirty = true;
        } else if self.cursor_row > 0 {
            // Join with previous line
            let current_line = self.content.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.content[self.cursor_row]);
            self.content[self.cursor_row].push_str(&current_line);
            self.is_dirty = true;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = char_len(&self.content[self.cursor_row]);
        }
    }

    pub fn move_cursor_right(&mut self) {
        let line_len = char_len(&self.content[self.cursor_row]);
        if self.cursor_col < line_len {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.content.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.cursor_col.min(char_len(&self.content[self.cursor_row]));
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_row + 1 < self.content.len() {
            self.cursor_row += 1;
            self.cursor_col = self.cursor_col.min(char_len(&self.content[self.cursor_row]));
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor_col = char_len(&self.content[self.cursor_row]);
    }

    // Keep the cursor row inside the visible window
    pub fn adjust_scroll_with_height(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor_row < self.scroll_offset {
            self.scroll_offset = self.cursor_row;
        } else if self.cursor_row >= self.scroll_offset + visible_height {
            self.scroll_offset = self.cursor_row - visible_height + 1;
        }
    }

    pub fn get_content(&self) -> String {
        self.content.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_splits_and_backspace_joins() {
        let mut editor = TextEditor::multi_line("");
        for c in "abcd".chars() {
            editor.insert_char(c);
        }
        editor.move_cursor_left();
        editor.move_cursor_left();
        editor.insert_newline();
        assert_eq!(editor.get_content(), "ab\ncd");
        assert_eq!((editor.cursor_row, editor.cursor_col), (1, 0));

        editor.delete_char();
        assert_eq!(editor.get_content(), "abcd");
        assert_eq!((editor.cursor_row, editor.cursor_col), (0, 2));
    }

    #[test]
    fn single_line_ignores_newline() {
        let mut editor = TextEditor::single_line("2026-10-20");
        editor.insert_newline();
        assert_eq!(editor.get_content(), "2026-10-20");
        assert!(!editor.is_dirty);
    }

    #[test]
    fn cursor_counts_chars_not_bytes() {
        let mut editor = TextEditor::single_line("café");
        assert_eq!(editor.cursor_col, 4);
        editor.delete_char();
        editor.insert_char('e');
        assert_eq!(editor.get_content(), "cafe");
        editor.move_to_start_of_line();
        editor.insert_char('¡');
        assert_eq!(editor.get_content(), "¡cafe");
    }

    #[test]
    fn prefilled_text_puts_cursor_at_the_end() {
        let editor = TextEditor::multi_line("one\ntwo");
        assert_eq!((editor.cursor_row, editor.cursor_col), (1, 3));
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut editor = TextEditor::multi_line("1\n2\n3\n4\n5");
        editor.adjust_scroll_with_height(2);
        assert_eq!(editor.scroll_offset, 3);
        editor.move_cursor_up();
        editor.move_cursor_up();
        editor.move_cursor_up();
        editor.adjust_scroll_with_height(2);
        assert_eq!(editor.scroll_offset, 1);
    }
}
