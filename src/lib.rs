//! cpi-steps - CI/CD pipeline steps for SAP Cloud Platform Integration

pub mod cli;
pub mod client;
pub mod core;
pub mod cpi;
pub mod persistence;
pub mod steps;

// Re-export commonly used types
pub use client::{ClientConfig, HttpError, HttpRequest, HttpResponse, HttpSender, ReqwestSender};
pub use core::{CommonPipelineEnvironment, RunRecord, RunStatus};
pub use cpi::{ServiceKey, ServiceKeySource};
pub use steps::{PollPolicy, StepError};
