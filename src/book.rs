//! Session orchestration: the store plus its durable slot.
//!
//! Callers send `Command`s. Every successful mutation is written back to the
//! slot before `execute` returns. When that write fails the mutation is kept
//! in memory and `BookError::Persist` is returned, so the caller can tell the
//! user the change is not yet on disk.

use std::path::Path;

use log::{error, info, warn};
use thiserror::Error;

use crate::contact::{Contact, ContactId};
use crate::import::converter::{DocumentConverter, DocumentFormat};
use crate::import::parser::TextParser;
use crate::import::ImportError;
use crate::phone;
use crate::slot::{Slot, SlotError};
use crate::store::{ContactStore, MergeReport, StoreError};

pub const DEFAULT_STORAGE_KEY: &str = "contacts";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("failed to encode contacts: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored contacts are not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BookError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("failed to load contacts: {0}")]
    Load(#[source] PersistError),
    #[error("change kept in memory but not saved: {0}")]
    Persist(#[source] PersistError),
}

/// A user-triggered request against the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Typed form entry; the phone is formatted before it is stored.
    Add { name: String, phone: String },
    Update {
        id: ContactId,
        name: String,
        phone: String,
    },
    Remove { id: ContactId },
    /// Plain text already extracted from a document.
    Import { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Added(Contact),
    Updated(Contact),
    Removed(Contact),
    Imported(MergeReport),
}

pub struct Book<S: Slot> {
    store: ContactStore,
    slot: S,
    key: String,
    parser: TextParser,
}

impl<S: Slot> Book<S> {
    /// Load the contact list stored under `key`. An absent entry is an empty book.
    pub fn open(slot: S, key: impl Into<String>, parser: TextParser) -> Result<Self, BookError> {
        let key = key.into();
        let stored = slot
            .load(&key)
            .map_err(|err| BookError::Load(PersistError::Slot(err)))?;

        let mut store = ContactStore::new();
        if let Some(text) = stored {
            let contacts: Vec<Contact> = if text.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&text)
                    .map_err(|err| BookError::Load(PersistError::Decode(err)))?
            };
            let dropped = store.replace_all(contacts);
            if dropped > 0 {
                warn!("event=book_open status=dropped_records key={} count={}", key, dropped);
            }
            info!(
                "event=book_open key={} contacts={} dropped={}",
                key,
                store.len(),
                dropped
            );
        } else {
            info!("event=book_open key={} contacts=0 fresh=true", key);
        }

        Ok(Self {
            store,
            slot,
            key,
            parser,
        })
    }

    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    #[cfg(test)]
    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn find(&self, query: &str) -> Vec<Contact> {
        self.store.find(query)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, BookError> {
        let outcome = match command {
            Command::Add { name, phone } => {
                let contact = self.store.add(&name, &phone::format_display(phone.trim()))?;
                info!("event=contact_add id={}", contact.id);
                Outcome::Added(contact)
            }
            Command::Update { id, name, phone } => {
                let contact =
                    self.store
                        .update(&id, &name, &phone::format_display(phone.trim()))?;
                info!("event=contact_update id={}", contact.id);
                Outcome::Updated(contact)
            }
            Command::Remove { id } => {
                let contact = self.store.remove(&id)?;
                info!("event=contact_remove id={}", contact.id);
                Outcome::Removed(contact)
            }
            Command::Import { text } => return self.import_text(&text).map(Outcome::Imported),
        };

        self.persist()?;
        Ok(outcome)
    }

    /// Convert a `.doc`/`.docx` file to text and import it.
    pub fn import_document(
        &mut self,
        path: &Path,
        converter: &dyn DocumentConverter,
    ) -> Result<MergeReport, BookError> {
        let format = DocumentFormat::from_path(path)?;
        let text = converter.convert(path, format)?;
        self.import_text(&text)
    }

    fn import_text(&mut self, text: &str) -> Result<MergeReport, BookError> {
        let candidates = self.parser.parse(text);
        if candidates.is_empty() {
            info!("event=import status=no_candidates");
            return Err(ImportError::NoCandidates.into());
        }
        let report = self.store.merge_imported(&candidates);
        info!(
            "event=import status=ok candidates={} added={} duplicates={} invalid={}",
            candidates.len(),
            report.added,
            report.skipped_duplicates,
            report.skipped_invalid
        );
        if report.added > 0 {
            self.persist()?;
        }
        Ok(report)
    }

    fn persist(&mut self) -> Result<(), BookError> {
        let json = serde_json::to_string(&self.store.snapshot())
            .map_err(|err| BookError::Persist(PersistError::Encode(err)))?;
        self.slot.save(&self.key, &json).map_err(|err| {
            error!("event=persist_failed key={} error={}", self.key, err);
            BookError::Persist(PersistError::Slot(err))
        })
    }
}
