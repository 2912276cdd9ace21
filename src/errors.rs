use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::taxonomy::TaxId;

/// Errors raised while loading the taxonomy, reading records, or resolving taxa.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("taxon {taxon} references unknown parent {parent}")]
    MissingParent { taxon: TaxId, parent: TaxId },

    #[error("parent chain of taxon {0} does not reach the root")]
    Cycle(TaxId),

    #[error("taxonomy has no root (a node whose parent is itself)")]
    NoRoot,

    #[error("taxonomy has more than one root: {0} and {1}")]
    MultipleRoots(TaxId, TaxId),

    #[error("none of the given taxa are present in the taxonomy")]
    NoValidTaxa,

    #[error("record store error: {0}")]
    Database(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Prints the error chain and terminates the process with status 1.
pub fn exit_with_error(err: &anyhow::Error) -> ! {
    eprintln!("Error: {:#}", err);
    std::process::exit(1);
}
