use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;

use crate::api::{block_archive, Attachment, EncodedBody, Envelope, FormValue, MultipartEncoder};
use crate::config::SubmissionConfig;
use crate::error::{SaltError, SaltResult};
use crate::model::{Block, ElementView, Entity};

/// Portal method name for proposal uploads
pub const SEND_PROPOSAL: &str = "sendProposal";

/// Confirmation of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub block_code: String,
}

/// Blocking client for the proposal intake service. One request per call,
/// no timeout and no retries.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    http: Client,
    config: SubmissionConfig,
}

impl SubmissionClient {
    pub fn new(config: SubmissionConfig) -> SaltResult<Self> {
        let http = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Protocol fields in the order the portal expects them
    pub fn protocol_fields(&self) -> Vec<(String, FormValue)> {
        let config = &self.config;
        vec![
            field("username", STANDARD.encode(config.username.as_bytes())),
            field("password", STANDARD.encode(config.password.as_bytes())),
            field("method", SEND_PROPOSAL),
            field("asyncCode", ""),
            field("proposalCode", config.proposal_code.as_str()),
            field("emails", config.emails),
            field("retainProposalStatus", config.retain_proposal_status),
            field("semester", config.protocol_semester.as_str()),
            field("noValidation", config.no_validation),
            field("blocksOnly", config.blocks_only),
        ]
    }

    /// Encode the protocol fields plus `archive` as the only attachment
    pub fn encode_request(&self, archive: &[u8]) -> SaltResult<EncodedBody> {
        MultipartEncoder::new().encode(&self.protocol_fields(), &mut [Attachment::Bytes(archive)])
    }

    /// Serialize, archive and send the block rooted at `doc`
    pub fn submit_block(&self, doc: &ElementView) -> SaltResult<SubmissionReceipt> {
        let block_code = doc.block().get(doc, &Block::CODE)?;
        let archive = block_archive(&doc.to_bytes()?)?;
        info!(
            "submitting block {} to proposal {}",
            block_code, self.config.proposal_code
        );
        self.submit_archive(&archive)?;
        Ok(SubmissionReceipt { block_code })
    }

    /// Send a ready-made archive and interpret the response envelope
    pub fn submit_archive(&self, archive: &[u8]) -> SaltResult<()> {
        let encoded = self.encode_request(archive)?;
        let length = encoded.content_length();

        let response = self
            .http
            .post(&self.config.portal_url)
            .header(CONTENT_TYPE, encoded.content_type)
            .header(CONTENT_LENGTH, length.to_string())
            .body(encoded.body)
            .send()?;

        let status = response.status();
        let body = response.bytes()?;
        interpret_response(status, &body)
    }
}

fn field(name: &str, value: impl Into<FormValue>) -> (String, FormValue) {
    (name.to_string(), value.into())
}

/// Map a response onto success or `ServerError`
pub fn interpret_response(status: StatusCode, body: &[u8]) -> SaltResult<()> {
    match Envelope::parse(body) {
        Ok(Envelope::Accepted) => {
            if !status.is_success() {
                warn!("portal answered {} without an error element", status);
            }
            Ok(())
        }
        Ok(Envelope::Rejected(message)) => {
            warn!("portal rejected submission: {}", message);
            Err(SaltError::ServerError(message))
        }
        Err(_) if !status.is_success() => Err(SaltError::ServerError(format!("HTTP {}", status))),
        Err(e) => Err(e),
    }
}
