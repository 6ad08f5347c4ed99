use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

use crate::error::{SaltError, SaltResult};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Index of a node inside an [`XmlTree`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Namespace URI plus local name, the identity used for path matching
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub namespace: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(namespace: Option<&str>, local: &str) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local: local.to_string(),
        }
    }
}

/// A single element. Text layout follows the ElementTree model: `text` is the
/// content before the first child, `tail` the content after this element's end tag.
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Name as written in the source, prefix included
    pub qname: String,
    pub name: ExpandedName,
    /// Attributes in source order, namespace declarations included
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

/// Arena-allocated element tree. Detached nodes stay in the arena but are
/// unreachable from the root.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
    root: NodeId,
    declaration: bool,
}

type Scope = Vec<(Option<String>, String)>;

impl XmlTree {
    /// Parse a document from raw bytes
    pub fn parse(bytes: &[u8]) -> SaltResult<Self> {
        let mut reader = Reader::from_reader(bytes);
        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut open: Vec<NodeId> = Vec::new();
        let mut scopes: Vec<Scope> = Vec::new();
        let mut root = None;
        let mut declaration = false;

        loop {
            match reader.read_event()? {
                Event::Decl(_) => declaration = true,
                Event::Start(start) => {
                    let id = Self::open_element(&mut nodes, &mut scopes, &open, &start)?;
                    if open.is_empty() {
                        Self::claim_root(&mut root, id)?;
                    }
                    open.push(id);
                }
                Event::Empty(start) => {
                    let id = Self::open_element(&mut nodes, &mut scopes, &open, &start)?;
                    if open.is_empty() {
                        Self::claim_root(&mut root, id)?;
                    }
                    scopes.pop();
                }
                Event::End(_) => {
                    open.pop();
                    scopes.pop();
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    Self::push_text(&mut nodes, &open, &text);
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| SaltError::MalformedDocument(e.to_string()))?;
                    Self::push_text(&mut nodes, &open, text);
                }
                Event::Eof => break,
                // comments, processing instructions and doctypes are not part of the model
                _ => {}
            }
        }

        if !open.is_empty() {
            return Err(SaltError::MalformedDocument(
                "document ended inside an open element".to_string(),
            ));
        }
        let root = root
            .ok_or_else(|| SaltError::MalformedDocument("document has no root element".to_string()))?;

        Ok(Self {
            nodes,
            root,
            declaration,
        })
    }

    fn claim_root(root: &mut Option<NodeId>, id: NodeId) -> SaltResult<()> {
        if root.is_some() {
            return Err(SaltError::MalformedDocument(
                "document has more than one root element".to_string(),
            ));
        }
        *root = Some(id);
        Ok(())
    }

    fn open_element(
        nodes: &mut Vec<XmlNode>,
        scopes: &mut Vec<Scope>,
        open: &[NodeId],
        start: &BytesStart<'_>,
    ) -> SaltResult<NodeId> {
        let qname = utf8(start.name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        let mut scope: Scope = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            if key == "xmlns" {
                scope.push((None, value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                scope.push((Some(prefix.to_string()), value.clone()));
            }
            attributes.push((key, value));
        }
        scopes.push(scope);

        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qname.as_str()),
        };
        let namespace = Self::lookup_namespace(scopes, prefix)?;
        let name = ExpandedName::new(namespace.as_deref(), local);

        let id = NodeId(nodes.len());
        let parent = open.last().copied();
        nodes.push(XmlNode {
            qname,
            name,
            attributes,
            text: None,
            tail: None,
            children: Vec::new(),
            parent,
        });
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }
        Ok(id)
    }

    fn lookup_namespace(scopes: &[Scope], prefix: Option<&str>) -> SaltResult<Option<String>> {
        if prefix == Some("xml") {
            return Ok(Some(XML_NAMESPACE.to_string()));
        }
        for scope in scopes.iter().rev() {
            if let Some((_, uri)) = scope.iter().rev().find(|(p, _)| p.as_deref() == prefix) {
                // xmlns="" undeclares the default namespace
                return Ok(if uri.is_empty() { None } else { Some(uri.clone()) });
            }
        }
        match prefix {
            None => Ok(None),
            Some(prefix) => Err(SaltError::MalformedDocument(format!(
                "undeclared namespace prefix '{}'",
                prefix
            ))),
        }
    }

    fn push_text(nodes: &mut [XmlNode], open: &[NodeId], text: &str) {
        // whitespace around the root element is dropped
        let Some(current) = open.last() else {
            return;
        };
        let slot = match nodes[current.0].children.last().copied() {
            Some(last_child) => &mut nodes[last_child.0].tail,
            None => &mut nodes[current.0].text,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    /// Serialize the tree back to bytes
    pub fn to_bytes(&self) -> SaltResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        self.write_node(&mut writer, self.root, false)?;
        Ok(writer.into_inner())
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId, with_tail: bool) -> SaltResult<()> {
        let node = &self.nodes[id.0];
        let mut start = BytesStart::new(node.qname.as_str());
        for (key, value) in &node.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        let has_text = node.text.as_deref().is_some_and(|t| !t.is_empty());
        if node.children.is_empty() && !has_text {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            if let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            for child in &node.children {
                self.write_node(writer, *child, true)?;
            }
            writer.write_event(Event::End(BytesEnd::new(node.qname.as_str())))?;
        }

        if with_tail {
            if let Some(tail) = node.tail.as_deref().filter(|t| !t.is_empty()) {
                writer.write_event(Event::Text(BytesText::new(tail)))?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Text before the first child, `None` when the element has none
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = Some(text.into());
    }

    /// Text after the element's end tag
    pub fn tail(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].tail.as_deref()
    }

    pub fn set_tail(&mut self, id: NodeId, tail: Option<String>) {
        self.nodes[id.0].tail = tail;
    }

    /// All text inside an element, children included, in document order
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        if let Some(text) = &node.text {
            out.push_str(text);
        }
        for child in &node.children {
            self.collect_text(*child, out);
            if let Some(tail) = &self.nodes[child.0].tail {
                out.push_str(tail);
            }
        }
    }

    /// Direct children of `id` matching `name`, in document order
    pub fn matching_children<'a>(
        &'a self,
        id: NodeId,
        name: &'a ExpandedName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| &self.nodes[child.0].name == name)
    }

    /// `id` followed by all its descendants, depth first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev());
        }
        out
    }

    /// Every namespace declaration in the document as `(prefix, uri)`, in document order
    pub fn namespace_declarations(&self) -> Vec<(Option<&str>, &str)> {
        let mut out = Vec::new();
        for id in self.descendants(self.root) {
            for (key, value) in &self.nodes[id.0].attributes {
                if key == "xmlns" {
                    out.push((None, value.as_str()));
                } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                    out.push((Some(prefix), value.as_str()));
                }
            }
        }
        out
    }

    /// Append a new, empty element as the last child of `parent`.
    ///
    /// The qualified name uses whichever prefix the document declared for the
    /// namespace; an undeclared namespace gets an `xmlns` attribute on the new element.
    pub fn append_element(&mut self, parent: NodeId, name: ExpandedName) -> NodeId {
        let mut attributes = Vec::new();
        let qname = match name.namespace.as_deref() {
            None => name.local.clone(),
            Some(uri) => match self.prefix_for(parent, uri) {
                Some(Some(prefix)) => format!("{}:{}", prefix, name.local),
                Some(None) => name.local.clone(),
                None => {
                    attributes.push(("xmlns".to_string(), uri.to_string()));
                    name.local.clone()
                }
            },
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(XmlNode {
            qname,
            name,
            attributes,
            text: None,
            tail: None,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Detach `child` from `parent`; its tail text goes with it
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|c| *c != child);
        self.nodes[child.0].parent = None;
    }

    /// Prefix bound to `uri` at `scope`: `Some(None)` for the default namespace,
    /// `None` when no in-scope declaration maps to it
    fn prefix_for(&self, scope: NodeId, uri: &str) -> Option<Option<&str>> {
        let mut shadowed: Vec<Option<&str>> = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            for (key, value) in &node.attributes {
                let prefix = if key == "xmlns" {
                    None
                } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                    Some(prefix)
                } else {
                    continue;
                };
                if shadowed.contains(&prefix) {
                    continue;
                }
                shadowed.push(prefix);
                if value == uri {
                    return Some(prefix);
                }
            }
            current = node.parent;
        }
        None
    }
}

fn utf8(bytes: &[u8]) -> SaltResult<Cow<'_, str>> {
    std::str::from_utf8(bytes)
        .map(Cow::Borrowed)
        .map_err(|e| SaltError::MalformedDocument(e.to_string()))
}
