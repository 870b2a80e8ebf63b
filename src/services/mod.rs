pub mod asset_uploader;
pub mod audit_recorder;
pub mod authenticator;
pub mod body_resolver;
pub mod form_inspector;
pub mod submission_validator;
pub mod text_filler;

pub use asset_uploader::{AssetUploader, UploadStep, UploadTiming};
pub use audit_recorder::AuditRecorder;
pub use authenticator::{Authenticator, Credentials, LoginLocators, LoginState};
pub use body_resolver::BodyResolver;
pub use form_inspector::{inspect, FormReport};
pub use submission_validator::{SubmissionValidator, Verdict};
