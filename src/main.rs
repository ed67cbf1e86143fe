mod book;
mod config;
mod contact;
mod import;
mod logging;
mod phone;
mod search;
mod slot;
mod store;
mod ui;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use book::{Book, Command as BookCommand, Outcome};
use config::Config;
use contact::ContactId;
use import::converter::CommandConverter;
use import::parser::TextParser;
use slot::FileSlot;
use store::MergeReport;

#[derive(Parser, Debug)]
#[command(name = "agenda", about = "Terminal contact book")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List contacts in name order, optionally filtered by name or phone digits
    List(ListArgs),
    /// Add a contact
    Add(AddArgs),
    /// Replace name and phone of an existing contact
    Edit(EditArgs),
    /// Delete a contact
    Rm(RmArgs),
    /// Import name/phone pairs from a .doc/.docx file
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    query: Option<String>,
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,
    phone: String,
}

#[derive(Args, Debug)]
struct EditArgs {
    id: String,
    name: String,
    phone: String,
}

#[derive(Args, Debug)]
struct RmArgs {
    id: String,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Treat the input as already-extracted plain text
    #[arg(long, default_value_t = false)]
    text: bool,

    #[arg(value_name = "PATH")]
    input: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    if let Err(err) = logging::init_logging(&config.log_level, &config.log_dir()) {
        eprintln!("warning: file logging disabled: {err:#}");
    }
    info!(
        "event=config_loaded path={} data_dir={}",
        config.config_path.display(),
        config.data_dir.display()
    );

    let mut book = open_book(&config)?;

    match cli.command {
        Some(Command::List(args)) => handle_list(&book, args),
        Some(Command::Add(args)) => {
            let outcome = book.execute(BookCommand::Add {
                name: args.name,
                phone: args.phone,
            })?;
            print_outcome(&outcome);
            Ok(())
        }
        Some(Command::Edit(args)) => {
            let outcome = book.execute(BookCommand::Update {
                id: ContactId::from(args.id),
                name: args.name,
                phone: args.phone,
            })?;
            print_outcome(&outcome);
            Ok(())
        }
        Some(Command::Rm(args)) => {
            let outcome = book.execute(BookCommand::Remove {
                id: ContactId::from(args.id),
            })?;
            print_outcome(&outcome);
            Ok(())
        }
        Some(Command::Import(args)) => handle_import(&mut book, &config, args),
        None => {
            let converter = converter_for(&config);
            let mut app = ui::app::App::new(&mut book, &config, &converter);
            app.run()
        }
    }
}

fn open_book(config: &Config) -> Result<Book<FileSlot>> {
    let slot = FileSlot::new(&config.data_dir);
    let parser = TextParser::new(config.import.placeholder.clone());
    Book::open(slot, config.storage_key.clone(), parser).with_context(|| {
        format!(
            "failed to open contact book in {}",
            config.data_dir.display()
        )
    })
}

fn converter_for(config: &Config) -> CommandConverter {
    CommandConverter::new(
        config.import.doc_command.clone(),
        config.import.docx_command.clone(),
    )
}

fn handle_list(book: &Book<FileSlot>, args: ListArgs) -> Result<()> {
    let query = args.query.unwrap_or_default();
    let results = book.find(&query);

    if results.is_empty() {
        if book.store().is_empty() {
            println!("No contacts");
        } else {
            println!("No matches for \"{}\"", query);
        }
        return Ok(());
    }

    // name<TAB>phone<TAB>id
    for contact in results {
        println!("{}\t{}\t{}", contact.name, contact.phone, contact.id);
    }
    Ok(())
}

fn handle_import(book: &mut Book<FileSlot>, config: &Config, args: ImportArgs) -> Result<()> {
    let report = if args.text {
        let text = fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read {}", args.input.display()))?;
        match book.execute(BookCommand::Import { text })? {
            Outcome::Imported(report) => report,
            _ => MergeReport::default(),
        }
    } else {
        book.import_document(&args.input, &converter_for(config))?
    };

    print_import_report(&report);
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Added(contact) => {
            println!("Added {} <{}> ({})", contact.name, contact.phone, contact.id)
        }
        Outcome::Updated(contact) => {
            println!("Updated {} <{}> ({})", contact.name, contact.phone, contact.id)
        }
        Outcome::Removed(contact) => println!("Removed {} ({})", contact.name, contact.id),
        Outcome::Imported(report) => print_import_report(report),
    }
}

fn print_import_report(report: &MergeReport) {
    println!("Imported {} contacts.", report.added);
    if report.skipped_duplicates > 0 {
        println!(
            "Skipped {} contacts (phone already present).",
            report.skipped_duplicates
        );
    }
    if report.skipped_invalid > 0 {
        println!(
            "Skipped {} entries (empty name or phone).",
            report.skipped_invalid
        );
    }
}
