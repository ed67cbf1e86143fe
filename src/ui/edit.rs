use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::contact::{Contact, ContactId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(ContactId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Phone,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "NAME",
            FormField::Phone => "PHONE",
        }
    }

    fn other(self) -> Self {
        match self {
            FormField::Name => FormField::Phone,
            FormField::Phone => FormField::Name,
        }
    }
}

/// Add/edit form with one input per field.
#[derive(Debug, Clone)]
pub struct ContactForm {
    pub mode: FormMode,
    pub focus: FormField,
    name: Input,
    phone: Input,
}

impl ContactForm {
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            focus: FormField::Name,
            name: Input::default(),
            phone: Input::default(),
        }
    }

    pub fn edit(contact: &Contact) -> Self {
        Self {
            mode: FormMode::Edit(contact.id.clone()),
            focus: FormField::Name,
            name: Input::new(contact.name.clone()),
            phone: Input::new(contact.phone.clone()),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Add => "NEW CONTACT",
            FormMode::Edit(_) => "EDIT CONTACT",
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = self.focus.other();
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => self.name.value(),
            FormField::Phone => self.phone.value(),
        }
    }

    pub fn visual_cursor(&self) -> usize {
        match self.focus {
            FormField::Name => self.name.visual_cursor(),
            FormField::Phone => self.phone.visual_cursor(),
        }
    }

    /// Both fields hold something besides whitespace.
    pub fn is_filled(&self) -> bool {
        !self.name.value().trim().is_empty() && !self.phone.value().trim().is_empty()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let input = match self.focus {
            FormField::Name => &mut self.name,
            FormField::Phone => &mut self.phone,
        };
        input.handle_event(&Event::Key(key)).is_some()
    }
}
