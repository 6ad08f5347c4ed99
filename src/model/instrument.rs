use crate::error::SaltResult;
use crate::model::{ElementView, Entity, FieldInfo, FieldSpec, FieldValue, NodeRef};

/// Robert Stobie Spectrograph configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rss {
    node: NodeRef,
}

impl Rss {
    pub const NAME: FieldSpec<String> = FieldSpec::required("name", "./{/PIPT/RSS/Phase2}Name");
    /// Seconds
    pub const EXPOSURE_TIME: FieldSpec<f64> = FieldSpec::required(
        "exposure_time",
        "./{/PIPT/RSS/Phase2}RssDetector/{/PIPT/RSS/Phase2}ExposureTime/{/PIPT/Shared}Value",
    );
}

impl Entity for Rss {
    const KIND: &'static str = "Rss";
    const FIELDS: &'static [FieldInfo] = &[Self::NAME.info, Self::EXPOSURE_TIME.info];

    fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}

/// Salticam imager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salticam {
    node: NodeRef,
}

impl Salticam {
    pub const NAME: FieldSpec<String> =
        FieldSpec::required("name", "./{/PIPT/Salticam/Phase2}Name");
}

impl Entity for Salticam {
    const KIND: &'static str = "Salticam";
    const FIELDS: &'static [FieldInfo] = &[Self::NAME.info];

    fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}

/// Any instrument configuration found under an observation's payload config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentConfig {
    Rss(Rss),
    Salticam(Salticam),
}

impl InstrumentConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            InstrumentConfig::Rss(_) => Rss::KIND,
            InstrumentConfig::Salticam(_) => Salticam::KIND,
        }
    }

    pub fn name(&self, doc: &ElementView) -> SaltResult<String> {
        match self {
            InstrumentConfig::Rss(rss) => rss.get(doc, &Rss::NAME),
            InstrumentConfig::Salticam(salticam) => salticam.get(doc, &Salticam::NAME),
        }
    }

    pub fn describe(&self, doc: &ElementView) -> SaltResult<Vec<(&'static str, FieldValue)>> {
        match self {
            InstrumentConfig::Rss(rss) => rss.describe(doc),
            InstrumentConfig::Salticam(salticam) => salticam.describe(doc),
        }
    }
}
