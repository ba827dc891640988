//! Upload boundary: multipart form -> uploaded assets + viewer-space transform.

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use shared::transform::{parse_scalar, parse_vector};
use shared::{match_icons, AssetFile, AssetRole, AxisFlip, Named, TransformError, TransformSpec};
use thiserror::Error;

use crate::build::BuildError;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("file field '{0}' has no file name")]
    MissingFileName(String),
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("invalid value for '{field}': {value}")]
    InvalidFlag { field: String, value: String },
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// One uploaded file held in memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub asset: AssetFile,
    /// Role came from a dedicated form field rather than the file name
    pub explicit: bool,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: &str, role: AssetRole, bytes: impl Into<Bytes>) -> Self {
        Self {
            asset: AssetFile::new(file_name, role),
            explicit: true,
            bytes: bytes.into(),
        }
    }

    /// Role derived from the file name
    pub fn classify(file_name: &str, bytes: impl Into<Bytes>) -> Result<Self, UploadError> {
        let role = AssetRole::from_file_name(file_name)
            .ok_or_else(|| UploadError::UnsupportedFile(file_name.to_string()))?;
        Ok(Self {
            explicit: false,
            ..Self::new(file_name, role, bytes)
        })
    }
}

impl UploadedFile {
    pub fn file_name(&self) -> &str {
        &self.asset.file_name
    }
}

impl Named for UploadedFile {
    fn name(&self) -> &str {
        &self.asset.name
    }
}

/// Loosely named set of uploaded files
#[derive(Debug, Clone, Default)]
pub struct AssetUpload {
    pub files: Vec<UploadedFile>,
}

/// Files resolved for a single build
#[derive(Debug, Clone)]
pub struct PairedUpload {
    pub primary: UploadedFile,
    pub texture: Option<UploadedFile>,
    pub icon: Option<UploadedFile>,
}

impl AssetUpload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file: UploadedFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn push(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    /// Pick the single primary asset, its texture and its icon.
    ///
    /// Icons go through the naming matcher; an icon sent through the
    /// dedicated `icon` field is bound even when its name does not match,
    /// provided it is the only icon.
    pub fn pair(self) -> Result<PairedUpload, BuildError> {
        let mut primaries = Vec::new();
        let mut textures = Vec::new();
        let mut icons = Vec::new();
        for file in self.files {
            match file.asset.role {
                AssetRole::Primary => primaries.push(file),
                AssetRole::Texture => textures.push(file),
                AssetRole::Icon => icons.push(file),
            }
        }

        let primary = match primaries.len() {
            0 => return Err(BuildError::MissingModel),
            1 => primaries.remove(0),
            n => return Err(BuildError::MultipleModels(n)),
        };

        if textures.len() > 1 {
            tracing::warn!(
                ignored = textures.len() - 1,
                "more than one texture uploaded, using the first"
            );
        }
        let texture = textures.into_iter().next();

        let matched = match_icons([primary.name()], icons.iter().map(|f| f.name()))
            .into_iter()
            .next()
            .and_then(|pair| pair.icon)
            .map(str::to_string);

        let icon = match matched {
            Some(name) => icons
                .iter()
                .position(|f| f.name() == name)
                .map(|pos| icons.swap_remove(pos)),
            None if icons.len() == 1 && icons[0].explicit => {
                tracing::debug!(icon = %icons[0].file_name(), "binding explicitly uploaded icon");
                icons.pop()
            }
            None => {
                if !icons.is_empty() {
                    tracing::warn!(
                        model = %primary.file_name(),
                        candidates = icons.len(),
                        "no uploaded icon matches the model name"
                    );
                }
                None
            }
        };

        Ok(PairedUpload {
            primary,
            texture,
            icon,
        })
    }
}

/// Parsed `POST /upload` form
#[derive(Debug)]
pub struct UploadForm {
    pub assets: AssetUpload,
    pub transform: TransformSpec,
}

impl UploadForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut assets = AssetUpload::new();
        let mut transform = TransformSpec::default();
        let mut flip = AxisFlip::default();
        let mut axes_swapped = false;

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            let role = match field_name.as_str() {
                "model" => Some(AssetRole::Primary),
                "texture" => Some(AssetRole::Texture),
                "icon" => Some(AssetRole::Icon),
                _ => None,
            };

            if role.is_some() || field_name == "files" {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| UploadError::MissingFileName(field_name.clone()))?;
                let bytes = field.bytes().await?;
                let file = match role {
                    Some(role) => UploadedFile::new(&file_name, role, bytes),
                    None => UploadedFile::classify(&file_name, bytes)?,
                };
                assets.push(file);
                continue;
            }

            let text = field.text().await?;
            match field_name.as_str() {
                "position" => transform.position = parse_vector(&text)?,
                "rotation" => transform.rotation = parse_vector(&text)?,
                "scale" => transform.scale = parse_scalar(&text)?,
                "flip_position" => flip.position = parse_flag(&field_name, &text)?,
                "flip_rotation" => flip.rotation = parse_flag(&field_name, &text)?,
                "axes_swapped" => axes_swapped = parse_flag(&field_name, &text)?,
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }

        let mut transform = transform.with_flip(flip);
        if axes_swapped {
            transform = transform.already_swapped();
        }
        Ok(Self { assets, transform })
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool, UploadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        _ => Err(UploadError::InvalidFlag {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}
