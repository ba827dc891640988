//! Staging of uploaded files into the tool's intake directory.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::build::BuildError;
use crate::upload::{PairedUpload, UploadedFile};

/// Files staged for one build. Dropping the value deletes them, whatever the
/// outcome of the build.
#[derive(Debug)]
pub struct StagedIntake {
    dir: PathBuf,
    staged: Vec<PathBuf>,
    primary: String,
    texture: Option<String>,
    icon: Option<String>,
}

impl StagedIntake {
    /// Write the paired files into `dir`. Leftovers from an earlier run are purged first.
    pub fn stage(dir: &Path, assets: &PairedUpload) -> Result<Self, BuildError> {
        std::fs::create_dir_all(dir)?;
        let purged = purge(dir)?;
        if purged > 0 {
            tracing::warn!(dir = %dir.display(), purged, "removed stale intake files");
        }

        let mut intake = Self {
            dir: dir.to_path_buf(),
            staged: Vec::new(),
            primary: String::new(),
            texture: None,
            icon: None,
        };
        let mut seen = HashSet::new();

        intake.primary = intake.write(&assets.primary, &mut seen)?;
        if let Some(texture) = &assets.texture {
            intake.texture = Some(intake.write(texture, &mut seen)?);
        }
        if let Some(icon) = &assets.icon {
            intake.icon = Some(intake.write(icon, &mut seen)?);
        }
        Ok(intake)
    }

    fn write(&mut self, file: &UploadedFile, seen: &mut HashSet<String>) -> Result<String, BuildError> {
        let name = plain_file_name(file.file_name())
            .ok_or_else(|| BuildError::InvalidFileName(file.file_name().to_string()))?;
        if !seen.insert(name.to_ascii_lowercase()) {
            return Err(BuildError::DuplicateFileName(name));
        }

        let path = self.dir.join(&name);
        self.staged.push(path.clone());
        std::fs::write(&path, &file.bytes)?;
        tracing::debug!(file = %path.display(), bytes = file.bytes.len(), "staged");
        Ok(name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

impl Drop for StagedIntake {
    fn drop(&mut self) {
        for path in &self.staged {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                // the tool deletes its own intake files on success
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "failed to clean intake file")
                }
            }
        }
    }
}

/// Last path component of an uploaded name, rejecting anything that is not a plain file name
fn plain_file_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    match name {
        "" | "." | ".." | shared::MISSING_SENTINEL => None,
        name => Some(name.to_string()),
    }
}

/// Delete every regular file in `dir`, returning how many were removed
pub fn purge(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Number of regular files in `dir` (0 if it does not exist)
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .count()
        })
        .unwrap_or(0)
}
