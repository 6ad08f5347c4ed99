use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{SaltError, SaltResult};
use crate::model::{
    Block, ExpandedName, FieldInfo, FieldSpec, FieldType, FieldValue, NamespaceMap, NodeId,
    PathTemplate, ResolvedPath, XmlTree,
};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

/// Address of one element inside one document. Entity wrappers are thin
/// views holding nothing but this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub document: DocumentId,
    pub node: NodeId,
}

/// A loaded proposal document: the element tree, its namespace map and a
/// cache of resolved path templates.
///
/// All reads and writes of entity properties go through `get`, `set` and
/// `get_objects`, which address nodes by abstract path templates.
#[derive(Debug)]
pub struct ElementView {
    id: DocumentId,
    tree: XmlTree,
    namespaces: NamespaceMap,
    paths: RefCell<HashMap<String, Rc<ResolvedPath>>>,
}

impl ElementView {
    pub fn parse(bytes: &[u8]) -> SaltResult<Self> {
        let tree = XmlTree::parse(bytes)?;
        let namespaces = NamespaceMap::from_tree(&tree);
        let id = DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed));
        debug!(
            "loaded document {:?} with namespace tokens {:?}",
            id,
            namespaces.tokens().collect::<Vec<_>>()
        );
        Ok(Self {
            id,
            tree,
            namespaces,
            paths: RefCell::new(HashMap::new()),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> SaltResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// View on the document's root element
    pub fn root(&self) -> NodeRef {
        NodeRef {
            document: self.id,
            node: self.tree.root(),
        }
    }

    /// The root element as a block
    pub fn block(&self) -> Block {
        Block::wrap(self.root())
    }

    /// Serialize the current state of the tree
    pub fn to_bytes(&self) -> SaltResult<Vec<u8>> {
        self.tree.to_bytes()
    }

    /// Compile and resolve `path` once per document
    pub fn resolve(&self, path: &str) -> SaltResult<Rc<ResolvedPath>> {
        if let Some(resolved) = self.paths.borrow().get(path) {
            return Ok(Rc::clone(resolved));
        }
        let resolved = Rc::new(PathTemplate::compile(path).resolve(&self.namespaces)?);
        self.paths
            .borrow_mut()
            .insert(path.to_string(), Rc::clone(&resolved));
        Ok(resolved)
    }

    /// Concrete namespace for an abstract token
    pub fn namespace(&self, token: &str) -> SaltResult<&str> {
        self.namespaces.resolve(token)
    }

    /// Element name in the document's version of the namespace family
    pub fn element_name(&self, token: &str, local: &str) -> SaltResult<ExpandedName> {
        Ok(ExpandedName::new(Some(self.namespace(token)?), local))
    }

    fn search_root(&self, root: Option<NodeRef>) -> SaltResult<NodeId> {
        match root {
            Some(view) => self.check(view),
            None => Ok(self.tree.root()),
        }
    }

    /// Node id of a view, rejecting views taken from another document
    pub fn check(&self, view: NodeRef) -> SaltResult<NodeId> {
        if view.document != self.id {
            return Err(SaltError::ForeignView);
        }
        Ok(view.node)
    }

    /// First node matching `path` under `root`
    pub fn find(&self, path: &str, root: Option<NodeRef>) -> SaltResult<Option<NodeId>> {
        let from = self.search_root(root)?;
        Ok(self.resolve(path)?.find_first(&self.tree, from))
    }

    /// Every node matching `path` under `root`, in document order
    pub fn find_all(&self, path: &str, root: Option<NodeRef>) -> SaltResult<Vec<NodeId>> {
        let from = self.search_root(root)?;
        Ok(self.resolve(path)?.find_all(&self.tree, from))
    }

    /// Text of the first node matching `path`.
    ///
    /// An absent node yields `default` when one is given and `NodeNotFound`
    /// otherwise. A present node without text yields an empty string.
    pub fn get(&self, path: &str, root: Option<NodeRef>, default: Option<&str>) -> SaltResult<String> {
        match self.find(path, root)? {
            Some(node) => Ok(self.tree.text(node).unwrap_or_default().to_string()),
            None => default
                .map(str::to_string)
                .ok_or_else(|| SaltError::NodeNotFound(path.to_string())),
        }
    }

    /// Overwrite the text of the first node matching `path`. Never creates nodes.
    pub fn set(&mut self, path: &str, value: impl Display, root: Option<NodeRef>) -> SaltResult<()> {
        let node = self
            .find(path, root)?
            .ok_or_else(|| SaltError::NodeNotFound(path.to_string()))?;
        self.tree.set_text(node, value.to_string());
        Ok(())
    }

    /// Wrap every node matching `path`; empty when nothing matches
    pub fn get_objects<T>(
        &self,
        path: &str,
        constructor: impl Fn(NodeRef) -> T,
        root: Option<NodeRef>,
    ) -> SaltResult<Vec<T>> {
        Ok(self
            .find_all(path, root)?
            .into_iter()
            .map(|node| {
                constructor(NodeRef {
                    document: self.id,
                    node,
                })
            })
            .collect())
    }

    /// Typed read of a described field relative to `root`
    pub fn read_field<T: FieldType>(&self, field: &FieldSpec<T>, root: NodeRef) -> SaltResult<T> {
        let raw = self.get(field.info.path, Some(root), field.info.default)?;
        field.parse(&raw)
    }

    /// Typed write of a described field relative to `root`
    pub fn write_field<T: FieldType>(
        &mut self,
        field: &FieldSpec<T>,
        root: NodeRef,
        value: &T,
    ) -> SaltResult<()> {
        self.set(field.info.path, value.render(), Some(root))
    }

    /// Untyped read driven only by the field table row
    pub fn read_value(&self, info: &FieldInfo, root: NodeRef) -> SaltResult<FieldValue> {
        let raw = self.get(info.path, Some(root), info.default)?;
        FieldValue::from_text(info, &raw)
    }

    /// Mutable access for structural edits that paths cannot express
    pub(crate) fn tree_mut(&mut self) -> &mut XmlTree {
        &mut self.tree
    }
}

/// A typed view over one element, described by a static field table
pub trait Entity: Sized {
    /// Element kind, used in listings
    const KIND: &'static str;

    /// Scalar properties of this entity
    const FIELDS: &'static [FieldInfo];

    fn wrap(node: NodeRef) -> Self;

    fn node(&self) -> NodeRef;

    fn get<T: FieldType>(&self, doc: &ElementView, field: &FieldSpec<T>) -> SaltResult<T> {
        doc.read_field(field, self.node())
    }

    fn set<T: FieldType>(&self, doc: &mut ElementView, field: &FieldSpec<T>, value: T) -> SaltResult<()> {
        doc.write_field(field, self.node(), &value)
    }

    /// Every field in the table with its current value
    fn describe(&self, doc: &ElementView) -> SaltResult<Vec<(&'static str, FieldValue)>> {
        Self::FIELDS
            .iter()
            .map(|info| Ok((info.name, doc.read_value(info, self.node())?)))
            .collect()
    }
}
