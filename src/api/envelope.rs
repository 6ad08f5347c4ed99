use crate::error::SaltResult;
use crate::model::XmlTree;

/// Local name of the element that marks a rejected submission
pub const ERROR_ELEMENT: &str = "Error";

/// Outcome carried by a response envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Accepted,
    Rejected(String),
}

impl Envelope {
    /// Parse a response body. The first `Error` element anywhere in the
    /// document, root included, makes it a rejection carrying its text.
    pub fn parse(body: &[u8]) -> SaltResult<Self> {
        let tree = XmlTree::parse(body)?;
        let error = tree
            .descendants(tree.root())
            .into_iter()
            .find(|id| tree.node(*id).name.local == ERROR_ELEMENT);
        Ok(match error {
            Some(id) => Envelope::Rejected(tree.text_content(id).trim().to_string()),
            None => Envelope::Accepted,
        })
    }
}
