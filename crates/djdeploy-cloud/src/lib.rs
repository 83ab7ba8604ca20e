//! gcloud-backed probes and provisioners for djdeploy.
//!
//! Every remote operation goes through [`GcloudExecutor`]. Existence checks
//! go through a [`ResourceInspector`], and anything that creates a costly
//! resource asks a [`Confirmer`] first.

pub mod client;
pub mod command;
pub mod confirm;
pub mod executor;
pub mod gcloud;
pub mod inspector;

pub use client::{
    ApiCheck, CheckResult, DEPLOYED_ENV_VAR, DoctorReport, GcloudClient, PreflightError,
    ProvisionError, Provisioned, REQUIRED_APIS,
};
pub use command::{GcloudCommand, REDACTED};
pub use confirm::{AutoApprove, ConfirmError, Confirmer, Declined};
pub use executor::{CommandOutput, GcloudExecutor, RealExecutor};
pub use gcloud::GcloudError;
pub use inspector::{
    EMPTY_LIST_MARKER, JsonInspector, Presence, Resource, ResourceInspector, TextInspector,
    inspector_for,
};
