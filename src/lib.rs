pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;

// Export submission types
pub use api::{
    block_archive, Attachment, EncodedBody, Envelope, FormValue, MultipartEncoder,
    SubmissionClient, SubmissionReceipt,
};

pub use config::SubmissionConfig;
pub use error::{SaltError, SaltResult};

// Export logic types
pub use logic::{
    build_follow_up_payload, semester_for, FollowUpRequest, ObservationPayload, SemesterTag,
    GRB_TEMPLATE,
};

// Export all model types
pub use model::*;
