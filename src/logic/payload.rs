use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SaltError, SaltResult};
use crate::model::{Block, ElementView, Entity, Rss, SkyCoord, Target};

/// Bundled block template for gamma-ray burst follow-ups
pub const GRB_TEMPLATE: &[u8] = include_bytes!("../../templates/grb.xml");

fn default_mag_filter() -> String {
    "V".to_string()
}

fn default_finding_charts() -> Vec<String> {
    vec!["auto-generated".to_string()]
}

/// What a follow-up request knows about its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub target_id: i64,
    pub target_name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    #[serde(default = "default_mag_filter")]
    pub mag_filter: String,
    #[serde(default = "default_finding_charts")]
    pub finding_charts: Vec<String>,
    /// Applied to every RSS configuration in the template when given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f64>,
}

impl FollowUpRequest {
    pub fn new(target_id: i64, target_name: impl Into<String>, ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            target_id,
            target_name: target_name.into(),
            ra_deg,
            dec_deg,
            mag_filter: default_mag_filter(),
            finding_charts: default_finding_charts(),
            exposure_time: None,
        }
    }
}

/// A filled-in block ready for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPayload {
    pub target_id: i64,
    pub block_code: String,
    pub xml: String,
}

/// Fill `template` for `request`, stamping the semester that `as_of` falls into
pub fn build_follow_up_payload(
    template: &[u8],
    request: &FollowUpRequest,
    as_of: NaiveDate,
) -> SaltResult<ObservationPayload> {
    let mut doc = ElementView::parse(template)?;
    let block = doc.block();

    let block_code = Uuid::new_v4().to_string();
    block.set(&mut doc, &Block::CODE, block_code.clone())?;
    block.set(&mut doc, &Block::COMMENT, request.target_name.clone())?;
    block.assign_semester(&mut doc, as_of)?;

    let target = block
        .targets(&doc)?
        .into_iter()
        .next()
        .ok_or_else(|| SaltError::NodeNotFound("block template has no target".to_string()))?;
    target.set(&mut doc, &Target::NAME, request.target_name.clone())?;
    target.set(&mut doc, &Target::CODE, Uuid::new_v4().to_string())?;
    target.set_coordinates(&mut doc, &SkyCoord::new(request.ra_deg, request.dec_deg))?;
    target.set(&mut doc, &Target::MAG_FILTER, Some(request.mag_filter.clone()))?;
    target.set_finding_charts(&mut doc, request.finding_charts.clone())?;

    if let Some(exposure_time) = request.exposure_time {
        for pointing in block.pointings(&doc)? {
            for observation in pointing.observations(&doc)? {
                for rss in observation.rss_configs(&doc)? {
                    rss.set(&mut doc, &Rss::EXPOSURE_TIME, exposure_time)?;
                }
            }
        }
    }

    let xml = String::from_utf8(doc.to_bytes()?)
        .map_err(|e| SaltError::MalformedDocument(e.to_string()))?;
    info!(
        "prepared block {} for target {} ({})",
        block_code, request.target_name, request.target_id
    );

    Ok(ObservationPayload {
        target_id: request.target_id,
        block_code,
        xml,
    })
}
