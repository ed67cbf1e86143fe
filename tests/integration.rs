//! Integration tests for the agenda CLI

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Isolated config and data directory
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    data_dir: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_extra_config("")
    }

    fn with_extra_config(extra: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let data_dir = temp_dir.path().join("data");

        let content = format!(
            "data_dir = \"{}\"\nlog_level = \"debug\"\n{}",
            data_dir.display(),
            extra
        );
        fs::write(&config_path, content).unwrap();

        Self {
            temp_dir,
            config_path,
            data_dir,
        }
    }

    fn cmd(&self) -> AssertCommand {
        let mut cmd = agenda_cmd();
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }

    fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn add(&self, name: &str, phone: &str) {
        self.cmd().args(["add", name, phone]).assert().success();
    }

    /// Rows of `list` as (name, phone, id).
    fn rows(&self, query: Option<&str>) -> Vec<(String, String, String)> {
        let mut cmd = self.cmd();
        cmd.arg("list");
        if let Some(query) = query {
            cmd.arg(query);
        }
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout)
            .unwrap()
            .lines()
            .filter_map(|line| {
                let mut parts = line.split('\t');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(phone), Some(id)) => {
                        Some((name.to_string(), phone.to_string(), id.to_string()))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    fn store_file(&self) -> PathBuf {
        self.data_dir.join("contacts.json")
    }
}

fn agenda_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("agenda").unwrap()
}

fn names(rows: &[(String, String, String)]) -> Vec<&str> {
    rows.iter().map(|(name, _, _)| name.as_str()).collect()
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// CRUD Tests
// =============================================================================

#[test]
fn test_list_empty_book() {
    let env = TestEnv::new();
    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No contacts"));
}

#[test]
fn test_query_on_empty_book_reports_no_contacts() {
    let env = TestEnv::new();
    env.cmd()
        .args(["list", "ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No contacts"))
        .stdout(predicate::str::contains("No matches").not());
}

#[test]
fn test_add_formats_phone_and_persists() {
    let env = TestEnv::new();

    env.cmd()
        .args(["add", "  Maria Silva ", "11988887777"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Maria Silva <(11) 98888-7777>"));

    let rows = env.rows(None);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "Maria Silva");
    assert_eq!(rows[0].1, "(11) 98888-7777");

    let stored = read_json(&env.store_file());
    let records = stored.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Maria Silva");
    assert_eq!(records[0]["phone"], "(11) 98888-7777");
    assert_eq!(records[0]["id"], rows[0].2.as_str());
}

#[test]
fn test_add_rejects_blank_fields() {
    let env = TestEnv::new();

    env.cmd()
        .args(["add", "   ", "11988887777"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("name must not be empty"));

    env.cmd()
        .args(["add", "Ana", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("phone must not be empty"));

    assert!(env.rows(None).is_empty());
}

#[test]
fn test_list_is_sorted_by_name_ignoring_accents() {
    let env = TestEnv::new();
    env.add("bruno", "1133334444");
    env.add("Álvaro", "1144445555");
    env.add("Carla", "1155556666");

    let rows = env.rows(None);
    assert_eq!(names(&rows), vec!["Álvaro", "bruno", "Carla"]);
}

#[test]
fn test_list_query_filters_by_name_and_digits() {
    let env = TestEnv::new();
    env.add("Ana Paula", "11988887777");
    env.add("Bruno", "2133334444");

    assert_eq!(names(&env.rows(Some("ana"))), vec!["Ana Paula"]);
    assert_eq!(names(&env.rows(Some("(21) 3333"))), vec!["Bruno"]);
    assert_eq!(names(&env.rows(Some("98888-7777"))), vec!["Ana Paula"]);

    env.cmd()
        .args(["list", "zzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches for \"zzz\""));
}

#[test]
fn test_edit_keeps_id() {
    let env = TestEnv::new();
    env.add("Ana", "11988887777");
    let id = env.rows(None)[0].2.clone();

    env.cmd()
        .args(["edit", &id, "Ana Lima", "2133334444"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated Ana Lima <(21) 3333-4444>"));

    let rows = env.rows(None);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "Ana Lima");
    assert_eq!(rows[0].1, "(21) 3333-4444");
    assert_eq!(rows[0].2, id);
}

#[test]
fn test_remove_contact() {
    let env = TestEnv::new();
    env.add("Ana", "11988887777");
    env.add("Bruno", "2133334444");
    let rows = env.rows(None);
    let ana_id = rows[0].2.clone();

    env.cmd()
        .args(["rm", &ana_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed Ana"));

    assert_eq!(names(&env.rows(None)), vec!["Bruno"]);
}

#[test]
fn test_unknown_id_fails() {
    let env = TestEnv::new();
    env.add("Ana", "11988887777");

    env.cmd()
        .args(["rm", "missing-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no contact with id missing-id"));

    env.cmd()
        .args(["edit", "missing-id", "X", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no contact with id missing-id"));

    assert_eq!(env.rows(None).len(), 1);
}

#[test]
fn test_corrupt_store_is_reported() {
    let env = TestEnv::new();
    fs::create_dir_all(&env.data_dir).unwrap();
    fs::write(env.store_file(), "{not json").unwrap();

    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load contacts"));

    // Left untouched for manual recovery
    assert_eq!(fs::read_to_string(env.store_file()).unwrap(), "{not json");
}

// =============================================================================
// Import Tests
// =============================================================================

#[test]
fn test_import_text_and_dedup_on_reimport() {
    let env = TestEnv::new();
    let input = env.write_file(
        "lista.txt",
        "Lista de contatos\nAna: (11) 98888-7777\n21977776666\nBia 1133334444\n",
    );

    env.cmd()
        .args(["import", "--text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 3 contacts."));

    let rows = env.rows(None);
    assert_eq!(names(&rows), vec!["Ana", "Bia", "Contato 1"]);
    // Imported phones are kept as written
    assert_eq!(rows[1].1, "1133334444");

    env.cmd()
        .args(["import", "--text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 contacts."))
        .stdout(predicate::str::contains("Skipped 3 contacts (phone already present)."));

    assert_eq!(env.rows(None).len(), 3);
}

#[test]
fn test_import_dedup_is_verbatim() {
    let env = TestEnv::new();
    env.add("Ana", "11988887777");

    // Stored as "(11) 98888-7777", so the bare digits are not a duplicate
    let input = env.write_file("lista.txt", "Ana Celular 11988887777\n");
    env.cmd()
        .args(["import", "--text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 contacts."));

    assert_eq!(env.rows(None).len(), 2);
}

#[test]
fn test_import_without_candidates_fails() {
    let env = TestEnv::new();
    let input = env.write_file("vazio.txt", "Apto 42\nBloco 7\n");

    env.cmd()
        .args(["import", "--text"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no contacts found in document"));

    assert!(!env.store_file().exists());
}

#[test]
fn test_import_rejects_unsupported_extension() {
    let env = TestEnv::new();
    let input = env.write_file("contatos.pdf", "Ana: (11) 98888-7777\n");

    env.cmd()
        .arg("import")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file format \"pdf\""));
}

#[cfg(unix)]
#[test]
fn test_import_docx_through_configured_converter() {
    let env = TestEnv::with_extra_config(
        "\n[import]\nplaceholder = \"Contact\"\ndocx_command = [\"cat\", \"{file}\"]\n",
    );
    let input = env.write_file("agenda.DOCX", "Ana: (11) 98888-7777\n(21) 3333-4444\n");

    env.cmd()
        .arg("import")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 contacts."));

    assert_eq!(names(&env.rows(None)), vec!["Ana", "Contact 1"]);
}

#[cfg(unix)]
#[test]
fn test_import_reports_converter_failure() {
    let env = TestEnv::with_extra_config("\n[import]\ndoc_command = [\"false\"]\n");
    let input = env.write_file("agenda.doc", "Ana: (11) 98888-7777\n");

    env.cmd()
        .arg("import")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("document conversion failed"));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_missing_explicit_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    agenda_cmd()
        .arg("--config")
        .arg(temp_dir.path().join("nope.toml"))
        .arg("list")
        .assert()
        .failure();
}

#[test]
fn test_custom_storage_key() {
    let env = TestEnv::with_extra_config("storage_key = \"work\"\n");
    env.add("Ana", "11988887777");

    assert!(env.data_dir.join("work.json").exists());
    assert!(!env.store_file().exists());
}
