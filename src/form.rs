use crate::time::parse_task_duration;

/// Single-line text input with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    pub text: String,
    pub cursor: usize,
}

impl LineInput {
    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.text.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.text.remove(at);
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn move_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Text split around the cursor, for drawing it.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Duration,
}

/// The "add task" popup: a title and a duration.
#[derive(Debug, Clone)]
pub struct AddTaskForm {
    pub title: LineInput,
    pub duration: LineInput,
    pub focus: FormField,
    pub error: Option<String>,
}

impl Default for AddTaskForm {
    fn default() -> Self {
        AddTaskForm {
            title: LineInput::default(),
            duration: LineInput::default(),
            focus: FormField::Title,
            error: None,
        }
    }
}

impl AddTaskForm {
    pub fn focused_mut(&mut self) -> &mut LineInput {
        match self.focus {
            FormField::Title => &mut self.title,
            FormField::Duration => &mut self.duration,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Title => FormField::Duration,
            FormField::Duration => FormField::Title,
        };
    }

    /// Title and duration in seconds, or a message to show in the form.
    pub fn validate(&self) -> Result<(String, i64), String> {
        let title = self.title.text.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }

        match parse_task_duration(&self.duration.text) {
            Some(secs) => Ok((title.to_string(), secs)),
            None => Err("Duration must be H:MM:SS or e.g. \"25 minutes\"".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> LineInput {
        let mut input = LineInput::default();
        for c in text.chars() {
            input.insert_char(c);
        }
        input
    }

    #[test]
    fn test_line_input_editing() {
        let mut input = typed("héllo");
        assert_eq!(input.cursor, 5);

        input.move_cursor_left();
        input.move_cursor_left();
        input.delete_char();
        assert_eq!(input.text, "hélo");

        input.move_to_start();
        input.insert_char('>');
        assert_eq!(input.text, ">hélo");
        assert_eq!(input.split_at_cursor(), (">", "hélo"));

        input.move_to_end();
        input.move_cursor_right();
        assert_eq!(input.cursor, 5);
    }

    #[test]
    fn test_validate_form() {
        let mut form = AddTaskForm::default();
        assert!(form.validate().is_err());

        form.title = typed("Deep work");
        form.duration = typed("0:00:00");
        assert!(form.validate().is_err());

        form.duration = typed("5124095576030431 hours");
        assert!(form.validate().is_err());

        form.duration = typed("1 hour 30 minutes");
        assert_eq!(form.validate(), Ok(("Deep work".to_string(), 5400)));
    }

    #[test]
    fn test_focus_switches_fields() {
        let mut form = AddTaskForm::default();
        form.focused_mut().insert_char('a');
        form.toggle_focus();
        form.focused_mut().insert_char('5');
        assert_eq!(form.title.text, "a");
        assert_eq!(form.duration.text, "5");
    }
}
