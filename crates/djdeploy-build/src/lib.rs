//! Local file changes that prepare a Django project for Cloud Run.
//!
//! # Files touched
//!
//! ```text
//! djdeploy deploy
//!   1. Procfile          ── web + migrate processes for buildpacks
//!   2. .gcloudignore     ── keeps the virtualenv and caches out of uploads
//!   3. cloudbuild.yaml   ── build, push, migrate, deploy
//!   4. settings.py       ── ON_CLOUDRUN block appended once
//!   5. requirements.txt  ── or Pipfile [packages]
//! ```
//!
//! Every mutator leaves an existing file alone when it already carries what
//! deployment needs, and reports what it did as a [`FileChange`]. Running
//! the whole set twice changes nothing the second time.

pub mod cloudbuild;
pub mod error;
mod files;
pub mod git;
pub mod ignore;
pub mod packages;
pub mod procfile;
pub mod render;
pub mod settings;

pub use error::BuildError;

/// What a mutator did to its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Created,
    Updated,
    Kept,
}

impl FileChange {
    pub fn changed(self) -> bool {
        self != Self::Kept
    }
}

/// Files the deploy command writes to the git root, relative to it.
/// Settings and dependency files live elsewhere and are added by the caller.
pub const MANAGED_FILES: &[&str] = &[
    procfile::FILE_NAME,
    ignore::GCLOUDIGNORE,
    ignore::GITIGNORE,
    cloudbuild::FILE_NAME,
    "djdeploy.toml",
];
