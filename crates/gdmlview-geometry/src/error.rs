//! Error types for geometry construction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading GDML or building the volume store.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// The active constructor has no source configured.
    #[error("no GDML file configured - use /gdmlview/read first")]
    NoSource,

    /// The GDML file could not be read.
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed XML.
    #[error("malformed XML")]
    Xml(#[from] roxmltree::Error),

    /// The root element is not `<gdml>`.
    #[error("not a GDML document: root element is <{0}>")]
    NotGdml(String),

    /// A required attribute is absent.
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },

    /// An attribute expression could not be evaluated.
    #[error("cannot evaluate '{expression}': {reason}")]
    Expression { expression: String, reason: String },

    /// A reference names nothing defined earlier in the document.
    #[error("undefined {kind} '{name}'")]
    UndefinedReference { kind: &'static str, name: String },

    /// The document uses a solid type the reader does not know.
    #[error("unsupported solid <{0}>")]
    UnsupportedSolid(String),

    /// A solid's dimensions are inconsistent.
    #[error("solid '{name}' has invalid dimensions: {reason}")]
    InvalidDimensions { name: String, reason: String },

    /// A name that must be unique is already taken.
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    /// The requested setup is not in the document.
    #[error("setup '{0}' not found")]
    SetupNotFound(String),

    /// The document has no `<setup>` at all.
    #[error("document defines no setup")]
    NoSetup,

    /// Configuration targeted a constructor type that is not active.
    #[error("active geometry constructor is '{active}', not '{expected}'")]
    WrongConstructor {
        expected: &'static str,
        active: String,
    },
}

/// A specialized Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
