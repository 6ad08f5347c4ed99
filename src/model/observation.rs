use crate::error::SaltResult;
use crate::model::{
    ElementView, Entity, FieldInfo, FieldSpec, InstrumentConfig, NodeRef, Rss, Salticam, Target,
};

/// One observation of a pointing: instrument setups plus acquisition targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    node: NodeRef,
}

impl Observation {
    pub const NAME: FieldSpec<String> = FieldSpec::required("name", "./{/PIPT/Proposal/Phase2}Name");

    const RSS: &'static str = "./{/PIPT/Proposal/Phase2}TelescopeConfig\
        /{/PIPT/Proposal/Phase2}PayloadConfig\
        /{/PIPT/RSS/Phase2}Rss";
    const SALTICAM: &'static str = "./{/PIPT/Proposal/Phase2}TelescopeConfig\
        /{/PIPT/Proposal/Phase2}PayloadConfig\
        /{/PIPT/Salticam/Phase2}Salticam";
    const TARGETS: &'static str =
        "./{/PIPT/Proposal/Phase2}Acquisition/{/PIPT/Proposal/Shared}Target";

    pub fn rss_configs(&self, doc: &ElementView) -> SaltResult<Vec<Rss>> {
        doc.get_objects(Self::RSS, Rss::wrap, Some(self.node))
    }

    pub fn salticam_configs(&self, doc: &ElementView) -> SaltResult<Vec<Salticam>> {
        doc.get_objects(Self::SALTICAM, Salticam::wrap, Some(self.node))
    }

    /// All RSS configurations followed by all Salticam configurations,
    /// each group in document order
    pub fn instrument_configs(&self, doc: &ElementView) -> SaltResult<Vec<InstrumentConfig>> {
        let rss = self.rss_configs(doc)?.into_iter().map(InstrumentConfig::Rss);
        let salticam = self
            .salticam_configs(doc)?
            .into_iter()
            .map(InstrumentConfig::Salticam);
        Ok(rss.chain(salticam).collect())
    }

    pub fn targets(&self, doc: &ElementView) -> SaltResult<Vec<Target>> {
        doc.get_objects(Self::TARGETS, Target::wrap, Some(self.node))
    }
}

impl Entity for Observation {
    const KIND: &'static str = "Observation";
    const FIELDS: &'static [FieldInfo] = &[Self::NAME.info];

    fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}
