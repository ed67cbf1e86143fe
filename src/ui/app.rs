use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::book::{Book, BookError, Command, Outcome};
use crate::config::{Config, UiColors};
use crate::contact::{Contact, ContactId};
use crate::import::converter::DocumentConverter;
use crate::import::ImportError;
use crate::slot::Slot;
use crate::store::StoreError;

use super::draw;
use super::edit::{ContactForm, FormField, FormMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    List,
}

#[derive(Debug, Clone)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when confirm modal is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteContact(ContactId),
}

/// Document path prompt for import
#[derive(Debug, Clone, Default)]
pub struct ImportModal {
    pub input: Input,
}

pub struct App<'a, S: Slot> {
    book: &'a mut Book<S>,
    config: &'a Config,
    converter: &'a dyn DocumentConverter,
    pub search_input: Input,
    pub focus: Focus,
    pub rows: Vec<Contact>,
    pub selected: Option<usize>,
    pub form: Option<ContactForm>,
    pub confirm_modal: Option<ConfirmModal>,
    pub import_modal: Option<ImportModal>,
    // Popup state for modal dialog (tui-widgets popup)
    pub modal_popup: PopupState,
    pub status: Option<String>,
}

impl<'a, S: Slot> App<'a, S> {
    pub fn new(
        book: &'a mut Book<S>,
        config: &'a Config,
        converter: &'a dyn DocumentConverter,
    ) -> Self {
        let mut app = Self {
            book,
            config,
            converter,
            search_input: Input::default(),
            focus: Focus::List,
            rows: Vec::new(),
            selected: None,
            form: None,
            confirm_modal: None,
            import_modal: None,
            modal_popup: PopupState::default(),
            status: None,
        };
        app.refresh_rows(None);
        app
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return true;
        }
        // Status messages last until the next key press
        self.status = None;

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return false;
        }
        if self.import_modal.is_some() {
            self.handle_import_modal_key(key);
            return false;
        }
        if self.form.is_some() {
            self.handle_form_key(key);
            return false;
        }

        match self.focus {
            Focus::Search => {
                self.handle_search_key(key);
                false
            }
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') | KeyCode::Home => self.select_index(0),
            KeyCode::Char('G') | KeyCode::End => {
                let last = self.rows.len().saturating_sub(1);
                self.select_index(last);
            }
            KeyCode::Char('/') => self.focus = Focus::Search,
            KeyCode::Char('a') => self.form = Some(ContactForm::add()),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(contact) = self.selected_contact() {
                    self.form = Some(ContactForm::edit(contact));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => self.ask_delete_selected(),
            KeyCode::Char('i') => self.import_modal = Some(ImportModal::default()),
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.focus = Focus::List,
            KeyCode::Down => self.move_selection(1),
            KeyCode::Up => self.move_selection(-1),
            _ => {
                if let Some(change) = self.search_input.handle_event(&Event::Key(key)) {
                    if change.value {
                        let keep = self.selected_contact().map(|c| c.id.clone());
                        self.refresh_rows(keep.as_ref());
                    }
                }
            }
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.form = None;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_focus(),
            KeyCode::Enter => self.submit_form(),
            _ => {
                form.handle_key_event(key);
            }
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };
        if !form.is_filled() {
            self.set_status("Please fill in both name and phone");
            self.form = Some(form);
            return;
        }

        let name = form.value(FormField::Name).to_string();
        let phone = form.value(FormField::Phone).to_string();
        let command = match &form.mode {
            FormMode::Add => Command::Add { name, phone },
            FormMode::Edit(id) => Command::Update {
                id: id.clone(),
                name,
                phone,
            },
        };

        match self.book.execute(command) {
            Ok(Outcome::Added(contact)) => {
                self.set_status(format!("Added {}", contact.name));
                self.refresh_rows(Some(&contact.id));
            }
            Ok(Outcome::Updated(contact)) => {
                self.set_status(format!("Updated {}", contact.name));
                self.refresh_rows(Some(&contact.id));
            }
            Ok(_) => self.refresh_rows(None),
            Err(BookError::Store(err @ (StoreError::EmptyName | StoreError::EmptyPhone))) => {
                self.set_status(err.to_string());
                self.form = Some(form);
            }
            Err(err) => {
                self.set_status(format!("Error: {err}"));
                self.refresh_rows(None);
            }
        }
    }

    fn ask_delete_selected(&mut self) {
        let Some(contact) = self.selected_contact() else {
            return;
        };
        self.confirm_modal = Some(ConfirmModal {
            title: "DELETE CONTACT".to_string(),
            message: format!("Delete {} ({})?", contact.name, contact.phone),
            action: ConfirmAction::DeleteContact(contact.id.clone()),
        });
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };

        match key.code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') => {}
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => match modal.action {
                ConfirmAction::DeleteContact(id) => self.delete_contact(id),
            },
            // Put the modal back if key wasn't handled
            _ => self.confirm_modal = Some(modal),
        }
    }

    fn delete_contact(&mut self, id: ContactId) {
        let index = self.selected;
        match self.book.execute(Command::Remove { id }) {
            Ok(Outcome::Removed(contact)) => {
                self.set_status(format!("Deleted {}", contact.name));
            }
            Ok(_) => {}
            Err(err) => self.set_status(format!("Error: {err}")),
        }
        self.refresh_rows(None);
        if let Some(index) = index {
            self.select_index(index);
        }
    }

    fn handle_import_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.import_modal.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.import_modal = None,
            KeyCode::Enter => {
                let raw = modal.input.value().trim().to_string();
                if raw.is_empty() {
                    self.set_status("Enter the path of a .doc or .docx file");
                    return;
                }
                self.import_modal = None;
                self.import_path(expand_path(&raw));
            }
            _ => {
                let _ = modal.input.handle_event(&Event::Key(key));
            }
        }
    }

    fn import_path(&mut self, path: PathBuf) {
        match self.book.import_document(&path, self.converter) {
            Ok(report) => {
                let mut message = format!("Imported {} contacts", report.added);
                if report.skipped_duplicates > 0 {
                    message.push_str(&format!(
                        ", skipped {} already present",
                        report.skipped_duplicates
                    ));
                }
                self.set_status(message);
            }
            Err(BookError::Import(ImportError::UnsupportedFormat(_))) => {
                self.set_status("Only .doc and .docx files can be imported");
            }
            Err(BookError::Import(ImportError::NoCandidates)) => {
                self.set_status("No contacts found in document");
            }
            Err(err) => self.set_status(format!("Import failed: {err}")),
        }
        self.refresh_rows(None);
    }

    /// Re-query the book with the current search text.
    fn refresh_rows(&mut self, keep: Option<&ContactId>) {
        self.rows = self.book.find(self.search_input.value());
        let position = keep.and_then(|id| self.rows.iter().position(|c| &c.id == id));
        self.selected = match (position, self.selected) {
            (Some(index), _) => Some(index),
            _ if self.rows.is_empty() => None,
            (None, Some(index)) => Some(index.min(self.rows.len() - 1)),
            (None, None) => Some(0),
        };
    }

    fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.selected.unwrap_or(0) as isize;
        let last = self.rows.len() as isize - 1;
        self.selected = Some((current + delta).clamp(0, last) as usize);
    }

    fn select_index(&mut self, index: usize) {
        self.selected = if self.rows.is_empty() {
            None
        } else {
            Some(index.min(self.rows.len() - 1))
        };
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.selected.and_then(|index| self.rows.get(index))
    }

    pub fn total_contacts(&self) -> usize {
        self.book.store().len()
    }

    fn set_status<T: Into<String>>(&mut self, message: T) {
        self.status = Some(message.into());
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim_matches(|c| c == '"' || c == '\'');
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = home::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}
