//! Pipeline steps against a CPI tenant
//!
//! Each step is an independent request/response flow: read the service
//! key, fetch a bearer token, call the API, and hand at most one value to
//! the common pipeline environment.

pub mod error;
pub mod get_package_list;
pub mod poll;
pub mod script_collection_deploy;
pub mod value_mapping_upload;

pub use error::StepError;
pub use get_package_list::{run_get_package_list, GetPackageListOptions};
pub use poll::{poll_until, PollDecision, PollPolicy};
pub use script_collection_deploy::{
    run_script_collection_deploy, DeployStatus, ScriptCollectionDeployOptions,
};
pub use value_mapping_upload::{run_value_mapping_upload, ValueMappingUploadOptions};
