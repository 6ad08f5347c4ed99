use crate::error::SaltResult;
use crate::model::{ElementView, Entity, FieldInfo, FieldSpec, NodeRef, Observation};

/// A telescope aim point inside a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointing {
    node: NodeRef,
}

impl Pointing {
    pub const NAME: FieldSpec<String> = FieldSpec::required("name", "./{/PIPT/Proposal/Phase2}Name");

    const OBSERVATIONS: &'static str = "./{/PIPT/Proposal/Phase2}Observation";

    pub fn observations(&self, doc: &ElementView) -> SaltResult<Vec<Observation>> {
        doc.get_objects(Self::OBSERVATIONS, Observation::wrap, Some(self.node))
    }
}

impl Entity for Pointing {
    const KIND: &'static str = "Pointing";
    const FIELDS: &'static [FieldInfo] = &[Self::NAME.info];

    fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}
