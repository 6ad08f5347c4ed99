use thiserror::Error;

/// Errors raised while reading, editing or submitting a proposal document
#[derive(Debug, Error)]
pub enum SaltError {
    /// A path template references a namespace token the document never declared
    #[error("namespace token '{0}' is not declared in this document")]
    MissingNamespace(String),

    /// Two different namespace URIs in one document share the same token
    #[error("namespace token '{token}' matches several namespaces: {candidates:?}")]
    AmbiguousNamespace {
        token: String,
        candidates: Vec<String>,
    },

    /// A required node is absent on get or set
    #[error("no node matches path '{0}'")]
    NodeNotFound(String),

    /// Leaf text does not parse into the field's semantic type
    #[error("cannot read '{value}' from field '{field}' as {expected}")]
    TypeCoercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    /// An attachment that is neither bytes, a readable stream nor a regular file
    #[error("unsupported attachment: {0}")]
    UnsupportedAttachmentType(String),

    /// The response envelope carried an `Error` element, or a failed response had no envelope
    #[error("server rejected submission: {0}")]
    ServerError(String),

    /// A view was handed to a document other than the one it was taken from
    #[error("view belongs to a different document")]
    ForeignView,

    /// Input that is not a well-formed single-root XML document
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    // wrapped library errors
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Transport failure; never retried
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for document and submission operations
pub type SaltResult<T> = Result<T, SaltError>;
