use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::settings::Destination;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("cannot copy to the clipboard: {reason}")]
    ClipboardFailed { reason: String },

    #[error("cannot create '{}': {}", path.display(), source)]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write output: {0}")]
    Write(#[from] io::Error),
}

/// Hand the generated text to its destination. `output` names the file a
/// new document is created as; without it the document goes to stdout.
pub fn deliver(
    text: &str,
    destination: Destination,
    output: Option<&Path>,
) -> Result<(), DeliveryError> {
    match destination {
        Destination::Clipboard => {
            copy_to_clipboard(text)?;
            eprintln!("Copied CSS format to clipboard");
            Ok(())
        }
        Destination::NewDocument => match output {
            Some(path) => create_document(path, text),
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                if !text.is_empty() && !text.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
                stdout.flush()?;
                Ok(())
            }
        },
    }
}

/// Write `text` to a file that must not exist yet.
pub fn create_document(path: &Path, text: &str) -> Result<(), DeliveryError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| DeliveryError::CreateFile {
            path: path.to_path_buf(),
            source,
        })?;
    file.write_all(text.as_bytes())?;
    info!(path = %path.display(), bytes = text.len(), "created document");
    Ok(())
}

fn copy_to_clipboard(text: &str) -> Result<(), DeliveryError> {
    cli_clipboard::set_contents(text.to_owned()).map_err(|error| {
        debug!(%error, "clipboard rejected the text");
        DeliveryError::ClipboardFailed {
            reason: error.to_string(),
        }
    })?;
    info!(bytes = text.len(), "copied to clipboard");
    Ok(())
}
