use chrono::Utc;
use log::debug;
use rand::Rng;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{SaltError, SaltResult};

const CRLF: &str = "\r\n";
const BOUNDARY_LEN: usize = 16;
const BOUNDARY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Scalar form field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    Bool(bool),
}

impl FormValue {
    /// Wire form; booleans become `true` / `false`
    pub fn render(&self) -> &str {
        match self {
            FormValue::Text(text) => text,
            FormValue::Bool(true) => "true",
            FormValue::Bool(false) => "false",
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        FormValue::Bool(value)
    }
}

/// Readers that can be rewound before their content is read
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Binary content for a file part. Streams are borrowed; closing them stays with the caller.
pub enum Attachment<'a> {
    Bytes(&'a [u8]),
    Path(&'a Path),
    Stream(&'a mut dyn ReadSeek),
}

impl Attachment<'_> {
    fn read_all(&mut self) -> SaltResult<Vec<u8>> {
        match self {
            Attachment::Bytes(bytes) => Ok(bytes.to_vec()),
            Attachment::Path(path) => {
                if !path.is_file() {
                    return Err(SaltError::UnsupportedAttachmentType(format!(
                        "{} is not a regular file",
                        path.display()
                    )));
                }
                Ok(std::fs::read(path)?)
            }
            Attachment::Stream(stream) => {
                stream.seek(SeekFrom::Start(0))?;
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl std::fmt::Debug for Attachment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attachment::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Attachment::Path(path) => write!(f, "Path({})", path.display()),
            Attachment::Stream(_) => write!(f, "Stream"),
        }
    }
}

/// An encoded request body and the content type that describes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl EncodedBody {
    /// Value for the explicit `Content-Length` header
    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}

/// Byte-exact `multipart/form-data` writer.
///
/// Boundary and part timestamp are random and taken from the clock unless fixed.
#[derive(Debug, Clone, Default)]
pub struct MultipartEncoder {
    boundary: Option<String>,
    timestamp: Option<i64>,
}

impl MultipartEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Unix seconds used in file part names
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn encode(
        &self,
        fields: &[(String, FormValue)],
        attachments: &mut [Attachment<'_>],
    ) -> SaltResult<EncodedBody> {
        let boundary = self.boundary.clone().unwrap_or_else(random_boundary);
        let timestamp = self.timestamp.unwrap_or_else(|| Utc::now().timestamp());
        let mut body: Vec<u8> = Vec::new();

        for (key, value) in fields {
            let part = format!(
                "--{boundary}{CRLF}\
                 Content-Disposition: form-data; name=\"{key}\"{CRLF}\
                 Content-Type: text/plain; charset=US-ASCII{CRLF}\
                 Content-Transfer-Encoding: 8bit{CRLF}\
                 {CRLF}\
                 {value}{CRLF}",
                value = value.render()
            );
            body.extend_from_slice(part.as_bytes());
        }

        for (index, attachment) in attachments.iter_mut().enumerate() {
            let name = format!("file_{}_{}", timestamp, index);
            let header = format!(
                "--{boundary}{CRLF}\
                 Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.zip\"{CRLF}\
                 Content-Type: application/zip{CRLF}\
                 Content-Transfer-Encoding: binary{CRLF}\
                 {CRLF}"
            );
            body.extend_from_slice(header.as_bytes());
            body.extend_from_slice(&attachment.read_all()?);
            body.extend_from_slice(CRLF.as_bytes());
        }

        body.extend_from_slice(format!("--{boundary}--").as_bytes());
        debug!(
            "encoded {} fields and {} attachments into {} bytes",
            fields.len(),
            attachments.len(),
            body.len()
        );

        Ok(EncodedBody {
            content_type: format!("multipart/form-data; boundary={}", boundary),
            body,
        })
    }
}

/// 16 characters drawn from uppercase letters and digits
pub fn random_boundary() -> String {
    let mut rng = rand::thread_rng();
    (0..BOUNDARY_LEN)
        .map(|_| BOUNDARY_CHARSET[rng.gen_range(0..BOUNDARY_CHARSET.len())] as char)
        .collect()
}
