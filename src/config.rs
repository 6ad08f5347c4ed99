use serde::{Deserialize, Serialize};

/// Everything a submission needs to know about the intake service.
///
/// Passed explicitly to the submission client; the library never reads
/// process-wide configuration on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionConfig {
    pub portal_url: String,
    pub username: String,
    pub password: String,
    pub proposal_code: String,
    /// Protocol version tag sent as the `semester` field, unrelated to the block's semester
    pub protocol_semester: String,
    pub emails: bool,
    pub retain_proposal_status: bool,
    pub no_validation: bool,
    pub blocks_only: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            portal_url: String::new(),
            username: String::new(),
            password: String::new(),
            proposal_code: String::new(),
            protocol_semester: "2017-2".to_string(),
            emails: false,
            retain_proposal_status: false,
            no_validation: false,
            blocks_only: true,
        }
    }
}

impl SubmissionConfig {
    /// Load configuration from defaults, an optional `saltofi` config file and
    /// `SALT_*` environment variables, in that order of precedence
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&SubmissionConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("saltofi").required(false));

        // Add environment variables with prefix "SALT_", e.g. SALT_PORTAL_URL
        config = config.add_source(
            config::Environment::with_prefix("SALT")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = config.build()?;
        let submission_config: SubmissionConfig = config.try_deserialize()?;

        Ok(submission_config)
    }

    /// Fail early on settings the portal would reject anyway
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.portal_url.trim().is_empty() {
            anyhow::bail!("portal_url is not configured");
        }
        if self.username.is_empty() || self.password.is_empty() {
            anyhow::bail!("username and password must both be configured");
        }
        if self.proposal_code.trim().is_empty() {
            anyhow::bail!("proposal_code is not configured");
        }
        Ok(())
    }
}
