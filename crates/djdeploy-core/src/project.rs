//! Django project discovery.
//!
//! Locates `manage.py`, reads `DJANGO_SETTINGS_MODULE` from it, and resolves
//! the settings file and dependency file that deployment will touch:
//!
//! - Flat layout: `manage.py` sits in the git root
//!   (`django-admin startproject blog .`)
//! - Nested layout: `manage.py` sits one directory down
//!   (`django-admin startproject blog`)

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SETTINGS_MODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"DJANGO_SETTINGS_MODULE["']\s*,\s*["']([A-Za-z_][\w.]*)["']"#)
        .expect("settings module pattern is valid")
});

/// How the project declares its Python dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyFile {
    Requirements(PathBuf),
    Pipfile(PathBuf),
    None,
}

/// A Django project checked out in a git repository.
///
/// # Examples
///
/// ```no_run
/// use djdeploy_core::DjangoProject;
/// use std::path::Path;
///
/// let project = DjangoProject::discover(Path::new(".")).unwrap();
/// println!("Configuring {} ({})", project.name, project.settings_path.display());
/// ```
#[derive(Debug, Clone)]
pub struct DjangoProject {
    /// Django project package name (first component of the settings module)
    pub name: String,
    /// Dotted settings module, e.g. `blog.settings`
    pub settings_module: String,
    /// Directory holding the git repository; deployment files are written here
    pub git_root: PathBuf,
    /// Directory holding `manage.py`
    pub project_root: PathBuf,
    /// Absolute path of the settings file
    pub settings_path: PathBuf,
    /// `manage.py` lives in a subdirectory of the git root
    pub nested: bool,
    pub dependency_file: DependencyFile,
}

impl DjangoProject {
    /// Discover the Django project rooted at `git_root`.
    ///
    /// # Errors
    ///
    /// - [`Error::ManagePyNotFound`](crate::Error::ManagePyNotFound) if no `manage.py` is found
    /// - [`Error::MultipleManagePy`](crate::Error::MultipleManagePy) if several subdirectories have one
    /// - [`Error::SettingsModuleNotFound`](crate::Error::SettingsModuleNotFound) if `manage.py`
    ///   does not set `DJANGO_SETTINGS_MODULE`
    /// - [`Error::SettingsFileMissing`](crate::Error::SettingsFileMissing) if the module has no file
    pub fn discover(git_root: &Path) -> crate::Result<Self> {
        let git_root = git_root
            .canonicalize()
            .map_err(|e| crate::Error::ProjectDirResolve {
                path: git_root.to_path_buf(),
                source: e,
            })?;

        let (project_root, nested) = locate_manage_py(&git_root)?;
        let manage_py = project_root.join("manage.py");
        tracing::debug!(path = %manage_py.display(), nested, "found manage.py");

        let content =
            std::fs::read_to_string(&manage_py).map_err(|e| crate::Error::ManagePyRead {
                path: manage_py.clone(),
                source: e,
            })?;

        let settings_module = parse_settings_module(&content).ok_or_else(|| {
            crate::Error::SettingsModuleNotFound {
                path: manage_py.clone(),
            }
        })?;

        let relative = format!("{}.py", settings_module.replace('.', "/"));
        let settings_path = project_root.join(relative);
        if !settings_path.is_file() {
            return Err(crate::Error::SettingsFileMissing {
                module: settings_module,
                path: settings_path,
            });
        }

        let name = match settings_module.split_once('.') {
            Some((package, _)) => package.to_owned(),
            None => settings_module.clone(),
        };

        let dependency_file = detect_dependency_file(&git_root, &project_root);

        tracing::debug!(
            name = %name,
            settings = %settings_path.display(),
            ?dependency_file,
            "django project discovered"
        );

        Ok(Self {
            name,
            settings_module,
            git_root,
            project_root,
            settings_path,
            nested,
            dependency_file,
        })
    }

    /// Dotted path of the WSGI application as seen from the git root.
    pub fn wsgi_module(&self) -> String {
        if self.nested {
            format!("{name}.{name}.wsgi", name = self.name)
        } else {
            format!("{}.wsgi", self.name)
        }
    }
}

fn locate_manage_py(git_root: &Path) -> crate::Result<(PathBuf, bool)> {
    if git_root.join("manage.py").is_file() {
        return Ok((git_root.to_path_buf(), false));
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(git_root)
        .map_err(|e| crate::Error::ProjectDirResolve {
            path: git_root.to_path_buf(),
            source: e,
        })?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| path.is_dir() && path.join("manage.py").is_file())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(crate::Error::ManagePyNotFound {
            dir: git_root.to_path_buf(),
        }),
        1 => Ok((candidates.remove(0), true)),
        _ => Err(crate::Error::MultipleManagePy { candidates }),
    }
}

/// Extract the settings module from `manage.py` source.
pub fn parse_settings_module(manage_py: &str) -> Option<String> {
    SETTINGS_MODULE_RE
        .captures(manage_py)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn detect_dependency_file(git_root: &Path, project_root: &Path) -> DependencyFile {
    for dir in [git_root, project_root] {
        let requirements = dir.join("requirements.txt");
        if requirements.is_file() {
            return DependencyFile::Requirements(requirements);
        }
        let pipfile = dir.join("Pipfile");
        if pipfile.is_file() {
            return DependencyFile::Pipfile(pipfile);
        }
    }
    DependencyFile::None
}
