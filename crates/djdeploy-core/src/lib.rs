//! Core types and configuration for djdeploy.
//!
//! This crate defines the `djdeploy.toml` schema ([`DeployConfig`]),
//! Django project discovery ([`DjangoProject`]), resource naming
//! ([`ResourceNames`], [`ServiceName`]), and shared error types.

pub mod config;
pub mod error;
pub mod naming;
pub mod project;
pub mod secret;

pub use config::{
    ArtifactsConfig, CONFIG_FILE_NAME, DatabaseConfig, DeployConfig, JobConfig, ProbeConfig,
    ProbeFormat, ProjectConfig,
};
pub use error::{Error, Result};
pub use naming::{DeployTarget, POSTGRES_MAX_NAME_LENGTH, ResourceNames, ServiceName};
pub use project::{DependencyFile, DjangoProject};
pub use secret::{PASSWORD_LENGTH, SECRET_KEY_LENGTH, random_secret};
