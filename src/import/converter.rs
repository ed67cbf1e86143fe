//! Document-to-text conversion.
//!
//! The core never reads `.doc`/`.docx` internals. An external program
//! (antiword, pandoc, ...) turns the document into plain text, which is then
//! handed to the parser.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use log::{debug, warn};

use super::ImportError;

/// Argument token replaced by the document path.
pub const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Doc,
    Docx,
}

impl DocumentFormat {
    /// Detect from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "doc" => Ok(DocumentFormat::Doc),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Doc => "doc",
            DocumentFormat::Docx => "docx",
        }
    }
}

/// Trait for document-to-text converters
pub trait DocumentConverter {
    /// Extract plain text from the document at `path`.
    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ImportError>;
}

/// Converter that runs a configured command per format.
///
/// `{file}` in the argument list is replaced by the document path. When no
/// argument contains it, the document bytes are piped to the command's stdin.
/// The command's stdout is the extracted text.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    doc_command: Vec<String>,
    docx_command: Vec<String>,
}

impl CommandConverter {
    pub fn new(doc_command: Vec<String>, docx_command: Vec<String>) -> Self {
        Self {
            doc_command,
            docx_command,
        }
    }

    fn command_for(&self, format: DocumentFormat) -> &[String] {
        match format {
            DocumentFormat::Doc => &self.doc_command,
            DocumentFormat::Docx => &self.docx_command,
        }
    }
}

impl DocumentConverter for CommandConverter {
    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ImportError> {
        let argv = self.command_for(format);
        let Some((program, args)) = argv.split_first() else {
            return Err(ImportError::Conversion(format!(
                "no converter command configured for .{}",
                format.extension()
            )));
        };

        let path_str = path.to_string_lossy();
        let uses_file_arg = args.iter().any(|arg| arg.contains(FILE_PLACEHOLDER));
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.replace(FILE_PLACEHOLDER, &path_str))
            .collect();

        debug!(
            "event=convert_start program={} format={} stdin={}",
            program,
            format.extension(),
            !uses_file_arg
        );

        let output = if uses_file_arg {
            Command::new(program)
                .args(&args)
                .stdin(Stdio::null())
                .output()
                .map_err(|err| {
                    ImportError::Conversion(format!("failed to run {program}: {err}"))
                })?
        } else {
            let bytes = std::fs::read(path).map_err(|err| {
                ImportError::Conversion(format!("failed to read {}: {err}", path.display()))
            })?;
            let mut child = Command::new(program)
                .args(&args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|err| {
                    ImportError::Conversion(format!("failed to run {program}: {err}"))
                })?;
            let mut stdin = child.stdin.take().ok_or_else(|| {
                ImportError::Conversion(format!("failed to open {program} stdin"))
            })?;
            // The child may fill stdout before it drains stdin.
            let writer = thread::spawn(move || stdin.write_all(&bytes));
            let output = child.wait_with_output().map_err(|err| {
                ImportError::Conversion(format!("failed to wait for {program}: {err}"))
            })?;
            match writer.join() {
                Ok(Ok(())) => {}
                // The converter may exit without draining its input.
                Ok(Err(err)) if err.kind() == io::ErrorKind::BrokenPipe => {}
                Ok(Err(err)) => {
                    return Err(ImportError::Conversion(format!(
                        "failed to write to {program}: {err}"
                    )))
                }
                Err(_) => {
                    return Err(ImportError::Conversion(format!(
                        "stdin writer for {program} panicked"
                    )))
                }
            }
            output
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "event=convert_failed program={} status={}",
                program, output.status
            );
            return Err(ImportError::Conversion(format!(
                "{program} failed: {}",
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|err| {
            ImportError::Conversion(format!("{program} output is not valid UTF-8: {err}"))
        })
    }
}
