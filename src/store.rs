//! In-memory contact store.
//!
//! The store owns the canonical list of contacts. After every mutation the
//! list is re-sorted by name collation, so reads never need to sort. It does
//! not persist anything itself; `book::Book` decides when to write.

use std::collections::HashSet;

use log::warn;
use thiserror::Error;

use crate::contact::{Candidate, Contact, ContactId};
use crate::search::{self, Query};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("phone must not be empty")]
    EmptyPhone,
    #[error("no contact with id {0}")]
    NotFound(ContactId),
}

/// Counts reported back to the user after an import merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ContactStore {
    contacts: Vec<Contact>,
}

impl ContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: &ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| &c.id == id)
    }

    pub fn add(&mut self, name: &str, phone: &str) -> Result<Contact, StoreError> {
        let (name, phone) = validate(name, phone)?;
        let contact = Contact {
            id: self.fresh_id(),
            name,
            phone,
        };
        self.contacts.push(contact.clone());
        self.sort();
        Ok(contact)
    }

    /// Replace name and phone of an existing contact, keeping its id.
    pub fn update(
        &mut self,
        id: &ContactId,
        name: &str,
        phone: &str,
    ) -> Result<Contact, StoreError> {
        let (name, phone) = validate(name, phone)?;
        let contact = self
            .contacts
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        contact.name = name;
        contact.phone = phone;
        let updated = contact.clone();
        self.sort();
        Ok(updated)
    }

    pub fn remove(&mut self, id: &ContactId) -> Result<Contact, StoreError> {
        let index = self
            .contacts
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(self.contacts.remove(index))
    }

    /// Contacts whose name contains the query (case-insensitive) or whose
    /// phone digits contain the query digits. Always in name order.
    pub fn find(&self, query: &str) -> Vec<Contact> {
        let query = Query::parse(query);
        self.contacts
            .iter()
            .filter(|c| query.matches(&c.name, &c.phone))
            .cloned()
            .collect()
    }

    /// Bulk load. Records with an empty field or an id already seen are
    /// dropped; the number dropped is returned.
    pub fn replace_all(&mut self, contacts: Vec<Contact>) -> usize {
        let mut seen = HashSet::new();
        let mut dropped = 0usize;
        let mut kept = Vec::with_capacity(contacts.len());
        for contact in contacts {
            if !contact.is_complete() {
                warn!("event=store_load_drop reason=incomplete id={}", contact.id);
                dropped += 1;
                continue;
            }
            if !seen.insert(contact.id.clone()) {
                warn!("event=store_load_drop reason=duplicate_id id={}", contact.id);
                dropped += 1;
                continue;
            }
            kept.push(contact);
        }
        self.contacts = kept;
        self.sort();
        dropped
    }

    pub fn snapshot(&self) -> Vec<Contact> {
        self.contacts.clone()
    }

    /// Add every candidate whose phone is not already present in the store.
    ///
    /// Duplicates are detected against the contacts that existed before the
    /// merge started, comparing phones verbatim. Two identical phones inside
    /// the same batch are both added.
    pub fn merge_imported(&mut self, candidates: &[Candidate]) -> MergeReport {
        let existing: HashSet<String> = self.contacts.iter().map(|c| c.phone.clone()).collect();
        let mut report = MergeReport::default();

        for candidate in candidates {
            if existing.contains(&candidate.phone) {
                report.skipped_duplicates += 1;
                continue;
            }
            match validate(&candidate.name, &candidate.phone) {
                Ok((name, phone)) => {
                    let id = self.fresh_id();
                    self.contacts.push(Contact { id, name, phone });
                    report.added += 1;
                }
                Err(_) => report.skipped_invalid += 1,
            }
        }

        if report.added > 0 {
            self.sort();
        }
        report
    }

    fn fresh_id(&self) -> ContactId {
        loop {
            let id = ContactId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn sort(&mut self) {
        // sort_by_cached_key is stable, so equal names keep insertion order
        self.contacts.sort_by_cached_key(|c| search::collation_key(&c.name));
    }
}

fn validate(name: &str, phone: &str) -> Result<(String, String), StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(StoreError::EmptyPhone);
    }
    Ok((name.to_string(), phone.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(contacts: &[Contact]) -> Vec<&str> {
        contacts.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_add_then_find_by_name() {
        let mut store = ContactStore::new();
        let added = store.add("  Maria Silva ", " (11) 98888-7777 ").unwrap();
        assert_eq!(added.name, "Maria Silva");
        assert_eq!(added.phone, "(11) 98888-7777");

        let found = store.find("Maria Silva");
        assert_eq!(found, vec![added]);
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let mut store = ContactStore::new();
        assert_eq!(store.add("   ", "123"), Err(StoreError::EmptyName));
        assert_eq!(store.add("Ana", "  "), Err(StoreError::EmptyPhone));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut store = ContactStore::new();
        let a = store.add("Ana", "1").unwrap();
        let b = store.add("Ana", "1").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_results_sorted_by_collation() {
        let mut store = ContactStore::new();
        for name in ["zélia", "Érica", "bruno", "Álvaro", "carla"] {
            store.add(name, "1").unwrap();
        }
        assert_eq!(
            names(&store.find("")),
            vec!["Álvaro", "bruno", "carla", "Érica", "zélia"]
        );
    }

    #[test]
    fn test_update_preserves_id_and_resorts() {
        let mut store = ContactStore::new();
        let ana = store.add("Ana", "1").unwrap();
        store.add("Bruno", "2").unwrap();

        let updated = store.update(&ana.id, "Zeca", "3").unwrap();
        assert_eq!(updated.id, ana.id);
        assert_eq!(names(&store.find("")), vec!["Bruno", "Zeca"]);
        assert_eq!(store.get(&ana.id).unwrap().phone, "3");
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut store = ContactStore::new();
        store.add("Ana", "1").unwrap();
        let missing = ContactId::from("missing");
        assert_eq!(
            store.update(&missing, "X", "2"),
            Err(StoreError::NotFound(missing))
        );
        assert_eq!(store.find("")[0].name, "Ana");
    }

    #[test]
    fn test_update_validation_leaves_record_untouched() {
        let mut store = ContactStore::new();
        let ana = store.add("Ana", "1").unwrap();
        assert_eq!(store.update(&ana.id, "", "2"), Err(StoreError::EmptyName));
        assert_eq!(store.get(&ana.id), Some(&ana));
    }

    #[test]
    fn test_remove() {
        let mut store = ContactStore::new();
        let ana = store.add("Ana", "1").unwrap();
        store.add("Bruno", "2").unwrap();

        store.remove(&ana.id).unwrap();
        assert!(store.find("").iter().all(|c| c.id != ana.id));

        let before = store.len();
        assert_eq!(
            store.remove(&ana.id),
            Err(StoreError::NotFound(ana.id.clone()))
        );
        assert_eq!(store.len(), before);
    }

    #[test]
    fn test_find_is_side_effect_free() {
        let mut store = ContactStore::new();
        store.add("Bruno", "(21) 97777-6666").unwrap();
        store.add("Ana", "(11) 98888-7777").unwrap();
        let first = store.find("9");
        let second = store.find("9");
        assert_eq!(first, second);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_find_by_phone_digits() {
        let mut store = ContactStore::new();
        store.add("Ana", "(11) 98888-7777").unwrap();
        store.add("Bruno", "(21) 97777-6666").unwrap();
        assert_eq!(names(&store.find("2197777")), vec!["Bruno"]);
        assert_eq!(names(&store.find("ana")), vec!["Ana"]);
    }

    #[test]
    fn test_replace_all_drops_incomplete_and_duplicate_ids() {
        let mut store = ContactStore::new();
        let dropped = store.replace_all(vec![
            Contact {
                id: "1".into(),
                name: "Bruno".into(),
                phone: "2".into(),
            },
            Contact {
                id: "2".into(),
                name: "".into(),
                phone: "3".into(),
            },
            Contact {
                id: "1".into(),
                name: "Ana".into(),
                phone: "4".into(),
            },
            Contact {
                id: "3".into(),
                name: "Ana".into(),
                phone: "5".into(),
            },
        ]);
        assert_eq!(dropped, 2);
        assert_eq!(names(&store.snapshot()), vec!["Ana", "Bruno"]);
    }

    #[test]
    fn test_merge_skips_existing_phones_verbatim() {
        let mut store = ContactStore::new();
        store.add("Ana", "(11) 98888-7777").unwrap();

        let report = store.merge_imported(&[
            Candidate::new("Ana de novo", "(11) 98888-7777"),
            Candidate::new("Ana sem formato", "11988887777"),
            Candidate::new("Bruno", "21977776666"),
        ]);
        assert_eq!(
            report,
            MergeReport {
                added: 2,
                skipped_duplicates: 1,
                skipped_invalid: 0,
            }
        );
        assert_eq!(store.len(), 3);
        assert_eq!(
            names(&store.find("")),
            vec!["Ana", "Ana sem formato", "Bruno"]
        );
    }

    #[test]
    fn test_merge_keeps_duplicates_within_one_batch() {
        let mut store = ContactStore::new();
        store.add("Ana", "1").unwrap();
        let report = store.merge_imported(&[
            Candidate::new("Contato 1", "21977776666"),
            Candidate::new("Contato 2", "21977776666"),
        ]);
        assert_eq!(report.added, 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_merge_counts_invalid_candidates() {
        let mut store = ContactStore::new();
        let report = store.merge_imported(&[Candidate::new(" ", "123")]);
        assert_eq!(report.skipped_invalid, 1);
        assert!(store.is_empty());
    }
}
