use crate::error::SaltResult;
use crate::model::{ExpandedName, NamespaceMap, NodeId, XmlTree};

/// One step of a path template: an optional abstract namespace token and a local name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub token: Option<String>,
    pub local: String,
}

/// A version-agnostic element path such as
/// `./{/PIPT/Proposal/Phase2}BlockSemester/{/PIPT/Proposal/Phase2}Year`.
///
/// Compiled once from its text; resolved per document against a [`NamespaceMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    steps: Vec<PathStep>,
}

impl PathTemplate {
    /// Split the template into steps. A `.` step means "the search root" and is skipped.
    /// Tokens may contain `/`, so splitting only happens outside braces.
    pub fn compile(source: &str) -> Self {
        let mut steps = Vec::new();
        let mut token: Option<String> = None;
        let mut current = String::new();
        let mut in_token = false;

        for ch in source.chars() {
            match ch {
                '{' if !in_token => {
                    in_token = true;
                    token = Some(String::new());
                }
                '}' if in_token => in_token = false,
                '/' if !in_token => {
                    push_step(&mut steps, token.take(), std::mem::take(&mut current));
                }
                _ if in_token => {
                    if let Some(t) = token.as_mut() {
                        t.push(ch);
                    }
                }
                _ => current.push(ch),
            }
        }
        push_step(&mut steps, token, current);

        Self {
            source: source.to_string(),
            steps,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Bind every token to the document's concrete namespace
    pub fn resolve(&self, namespaces: &NamespaceMap) -> SaltResult<ResolvedPath> {
        let steps = self
            .steps
            .iter()
            .map(|step| {
                let namespace = match &step.token {
                    Some(token) => Some(namespaces.resolve(token)?),
                    None => None,
                };
                Ok(ExpandedName::new(namespace, &step.local))
            })
            .collect::<SaltResult<Vec<_>>>()?;

        Ok(ResolvedPath {
            source: self.source.clone(),
            steps,
        })
    }
}

fn push_step(steps: &mut Vec<PathStep>, token: Option<String>, local: String) {
    if token.is_none() && (local.is_empty() || local == ".") {
        return;
    }
    steps.push(PathStep { token, local });
}

/// A path whose steps carry concrete namespace URIs for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    source: String,
    steps: Vec<ExpandedName>,
}

impl ResolvedPath {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every node reached from `from`, in document order. Each step matches
    /// the direct children of the previous step's nodes.
    pub fn find_all(&self, tree: &XmlTree, from: NodeId) -> Vec<NodeId> {
        let mut current = vec![from];
        for step in &self.steps {
            current = current
                .iter()
                .flat_map(|node| tree.matching_children(*node, step))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    pub fn find_first(&self, tree: &XmlTree, from: NodeId) -> Option<NodeId> {
        self.find_all(tree, from).into_iter().next()
    }
}
