mod confirm;
mod deploy;
mod deploy_pipeline;
mod doctor;
mod messages;

pub use deploy::{DeployOptions, deploy};
pub use doctor::doctor;
