use log::debug;
use std::collections::BTreeMap;

use crate::error::{SaltError, SaltResult};
use crate::model::XmlTree;

/// Path segment that marks the start of a proposal namespace family
pub const FAMILY_ANCHOR: &str = "/PIPT";

/// Maps version-independent namespace tokens (e.g. `/PIPT/Proposal/Phase2`)
/// to the concrete namespace URIs declared by one loaded document.
///
/// Built once per document load and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl NamespaceMap {
    /// Collect every namespace declaration in the tree
    pub fn from_tree(tree: &XmlTree) -> Self {
        Self::from_uris(
            tree.namespace_declarations()
                .into_iter()
                .map(|(_, uri)| uri),
        )
    }

    pub fn from_uris<'a>(uris: impl IntoIterator<Item = &'a str>) -> Self {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for uri in uris {
            match abstract_token(uri) {
                Some(token) => {
                    let candidates = entries.entry(token.to_string()).or_default();
                    if !candidates.iter().any(|c| c == uri) {
                        candidates.push(uri.to_string());
                    }
                }
                None => debug!("ignoring namespace outside the {} family: {}", FAMILY_ANCHOR, uri),
            }
        }
        Self { entries }
    }

    /// Concrete namespace URI for an abstract token
    pub fn resolve(&self, token: &str) -> SaltResult<&str> {
        match self.entries.get(token).map(Vec::as_slice) {
            Some([uri]) => Ok(uri.as_str()),
            Some(candidates) if !candidates.is_empty() => Err(SaltError::AmbiguousNamespace {
                token: token.to_string(),
                candidates: candidates.to_vec(),
            }),
            _ => Err(SaltError::MissingNamespace(token.to_string())),
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip the trailing version segment and everything before the family anchor:
/// `http://www.salt.ac.za/PIPT/Proposal/Phase2/4.8` becomes `/PIPT/Proposal/Phase2`.
pub fn abstract_token(uri: &str) -> Option<&str> {
    let start = uri.find(FAMILY_ANCHOR)?;
    let end = uri.rfind('/')?;
    if end <= start {
        return None;
    }
    Some(&uri[start..end])
}
