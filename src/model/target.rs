use chrono::NaiveDateTime;

use crate::error::SaltResult;
use crate::model::{
    Dms, ElementView, Entity, FieldInfo, FieldSpec, Hms, NodeRef, SkyCoord, DEFAULT_EQUINOX,
};

const SHARED: &str = "/PIPT/Proposal/Shared";

/// An astronomical target attached to an observation's acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    node: NodeRef,
}

impl Target {
    pub const NAME: FieldSpec<String> = FieldSpec::required("name", "./{/PIPT/Proposal/Shared}Name");
    pub const CODE: FieldSpec<String> =
        FieldSpec::required("code", "./{/PIPT/Proposal/Shared}TargetCode");
    pub const TYPE: FieldSpec<String> =
        FieldSpec::required("type", "./{/PIPT/Proposal/Shared}TargetType");
    pub const PM_RA: FieldSpec<f64> = FieldSpec::defaulted(
        "pm_ra",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}ProperMotionAndEpoch\
         /{/PIPT/Shared}RightAscensionDot/{/PIPT/Shared}Value",
        "0",
    );
    pub const PM_DEC: FieldSpec<f64> = FieldSpec::defaulted(
        "pm_dec",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}ProperMotionAndEpoch\
         /{/PIPT/Shared}DeclinationDot/{/PIPT/Shared}Value",
        "0",
    );
    pub const EPOCH: FieldSpec<Option<NaiveDateTime>> = FieldSpec::defaulted(
        "epoch",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}ProperMotionAndEpoch\
         /{/PIPT/Shared}Epoch",
        "",
    );
    /// Magnitude range leaves; a target without a range reads `None` for all three
    pub const MAG_FILTER: FieldSpec<Option<String>> = FieldSpec::defaulted(
        "mag_filter",
        "./{/PIPT/Proposal/Shared}MagnitudeRange/{/PIPT/Proposal/Shared}Bandpass",
        "",
    );
    pub const MAG_MIN: FieldSpec<Option<f64>> = FieldSpec::defaulted(
        "mag_min",
        "./{/PIPT/Proposal/Shared}MagnitudeRange/{/PIPT/Proposal/Shared}Minimum",
        "",
    );
    pub const MAG_MAX: FieldSpec<Option<f64>> = FieldSpec::defaulted(
        "mag_max",
        "./{/PIPT/Proposal/Shared}MagnitudeRange/{/PIPT/Proposal/Shared}Maximum",
        "",
    );

    // coordinate leaves, composed by `coordinates`
    const RA_HOURS: FieldSpec<i32> = FieldSpec::required(
        "ra_hours",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}RightAscension/{/PIPT/Shared}Hours",
    );
    const RA_MINUTES: FieldSpec<i32> = FieldSpec::required(
        "ra_minutes",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}RightAscension/{/PIPT/Shared}Minutes",
    );
    const RA_SECONDS: FieldSpec<f64> = FieldSpec::required(
        "ra_seconds",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}RightAscension/{/PIPT/Shared}Seconds",
    );
    const DEC_SIGN: FieldSpec<String> = FieldSpec::required(
        "dec_sign",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}Declination/{/PIPT/Shared}Sign",
    );
    const DEC_DEGREES: FieldSpec<i32> = FieldSpec::required(
        "dec_degrees",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}Declination/{/PIPT/Shared}Degrees",
    );
    const DEC_ARCMINUTES: FieldSpec<i32> = FieldSpec::required(
        "dec_arcminutes",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}Declination/{/PIPT/Shared}Arcminutes",
    );
    const DEC_ARCSECONDS: FieldSpec<f64> = FieldSpec::required(
        "dec_arcseconds",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}Declination/{/PIPT/Shared}Arcseconds",
    );
    const EQUINOX: FieldSpec<f64> = FieldSpec::defaulted(
        "equinox",
        "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}Equinox",
        "2000",
    );

    const FINDING_CHART: &'static str = "./{/PIPT/Proposal/Shared}FindingChart";
    const FINDING_CHART_PATH: &'static str =
        "./{/PIPT/Proposal/Shared}FindingChart/{/PIPT/Proposal/Shared}Path";

    /// Compose the sexagesimal leaves into one coordinate pair
    pub fn coordinates(&self, doc: &ElementView) -> SaltResult<SkyCoord> {
        let ra = Hms {
            hours: self.get(doc, &Self::RA_HOURS)?.unsigned_abs(),
            minutes: self.get(doc, &Self::RA_MINUTES)?.unsigned_abs(),
            seconds: self.get(doc, &Self::RA_SECONDS)?,
        };

        let degrees = self.get(doc, &Self::DEC_DEGREES)?;
        let sign = self.get(doc, &Self::DEC_SIGN)?;
        let dec = Dms {
            negative: sign.trim() == "-" || degrees < 0,
            degrees: degrees.unsigned_abs(),
            arcminutes: self.get(doc, &Self::DEC_ARCMINUTES)?.unsigned_abs(),
            arcseconds: self.get(doc, &Self::DEC_ARCSECONDS)?,
        };

        let equinox = self.get(doc, &Self::EQUINOX)?;
        Ok(SkyCoord::from_sexagesimal(ra, dec, Some(equinox)))
    }

    /// Write a coordinate pair back into the sexagesimal leaves. Seconds get six
    /// decimals, the sign is `-` or empty, a missing equinox is written as 2000.
    pub fn set_coordinates(&self, doc: &mut ElementView, coord: &SkyCoord) -> SaltResult<()> {
        let ra = coord.ra_hms();
        let node = self.node;
        doc.set(Self::RA_HOURS.info.path, ra.hours, Some(node))?;
        doc.set(Self::RA_MINUTES.info.path, ra.minutes, Some(node))?;
        doc.set(Self::RA_SECONDS.info.path, format!("{:.6}", ra.seconds), Some(node))?;

        let dec = coord.dec_dms();
        doc.set(Self::DEC_SIGN.info.path, if dec.negative { "-" } else { "" }, Some(node))?;
        doc.set(Self::DEC_DEGREES.info.path, dec.degrees, Some(node))?;
        doc.set(Self::DEC_ARCMINUTES.info.path, dec.arcminutes, Some(node))?;
        doc.set(
            Self::DEC_ARCSECONDS.info.path,
            format!("{:.6}", dec.arcseconds),
            Some(node),
        )?;

        let equinox = match coord.equinox {
            Some(equinox) => format!("{:.6}", equinox),
            None => format!("{}", DEFAULT_EQUINOX),
        };
        doc.set(Self::EQUINOX.info.path, equinox, Some(node))
    }

    /// Paths of the attached finding charts, in document order
    pub fn finding_charts(&self, doc: &ElementView) -> SaltResult<Vec<String>> {
        Ok(doc
            .find_all(Self::FINDING_CHART_PATH, Some(self.node))?
            .into_iter()
            .map(|id| doc.tree().text(id).unwrap_or_default().to_string())
            .collect())
    }

    /// Replace every finding chart with `charts`, keeping the given order
    pub fn set_finding_charts(
        &self,
        doc: &mut ElementView,
        charts: impl Into<ChartList>,
    ) -> SaltResult<()> {
        let charts = charts.into();
        let target = doc.check(self.node)?;
        let existing = doc.find_all(Self::FINDING_CHART, Some(self.node))?;
        let chart_name = doc.element_name(SHARED, "FindingChart")?;
        let path_name = doc.element_name(SHARED, "Path")?;

        let tree = doc.tree_mut();
        // new charts take over the trailing whitespace of the last removed chart
        let spacing = existing
            .last()
            .and_then(|chart| tree.tail(*chart))
            .map(str::to_string);
        for chart in existing {
            tree.remove_child(target, chart);
        }
        for path in charts.0 {
            let chart = tree.append_element(target, chart_name.clone());
            tree.set_tail(chart, spacing.clone());
            let leaf = tree.append_element(chart, path_name.clone());
            tree.set_text(leaf, path);
        }
        Ok(())
    }
}

impl Entity for Target {
    const KIND: &'static str = "Target";
    const FIELDS: &'static [FieldInfo] = &[
        Self::NAME.info,
        Self::CODE.info,
        Self::TYPE.info,
        Self::PM_RA.info,
        Self::PM_DEC.info,
        Self::EPOCH.info,
        Self::MAG_FILTER.info,
        Self::MAG_MIN.info,
        Self::MAG_MAX.info,
    ];

    fn wrap(node: NodeRef) -> Self {
        Self { node }
    }

    fn node(&self) -> NodeRef {
        self.node
    }
}

/// Finding chart paths for [`Target::set_finding_charts`]: a single path or an ordered list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartList(pub Vec<String>);

impl From<&str> for ChartList {
    fn from(path: &str) -> Self {
        Self(vec![path.to_string()])
    }
}

impl From<String> for ChartList {
    fn from(path: String) -> Self {
        Self(vec![path])
    }
}

impl From<Vec<String>> for ChartList {
    fn from(paths: Vec<String>) -> Self {
        Self(paths)
    }
}

impl From<Vec<&str>> for ChartList {
    fn from(paths: Vec<&str>) -> Self {
        Self(paths.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ChartList {
    fn from(paths: &[&str]) -> Self {
        Self(paths.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ChartList {
    fn from(paths: [&str; N]) -> Self {
        Self(paths.iter().map(|p| p.to_string()).collect())
    }
}
