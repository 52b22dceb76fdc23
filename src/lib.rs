// Uploadify S3 - Signed S3 POST policies for direct browser uploads

pub mod builder;
pub mod conditions;
pub mod config;
pub mod options;
pub mod policy;
pub mod signer;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use builder::UploadifyS3;
pub use conditions::{Condition, ConditionMap};
pub use config::Config;
pub use signer::SignedPolicy;
pub use types::{Options, PostData, UploadError, UploadResult};
