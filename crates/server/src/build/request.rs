//! Typed build request and its positional argument form.
//!
//! This is the only place that knows the order of the tool's arguments.

use shared::transform::{format_scalar, format_vector, parse_scalar, parse_vector};
use shared::{NormalizedTransform, TransformError, MISSING_SENTINEL};
use thiserror::Error;

/// Number of positional arguments the tool accepts
pub const TOOL_ARG_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("primary asset file name is empty")]
    EmptyPrimary,
    #[error("'{0}' is not a plain file name")]
    InvalidFileName(String),
    #[error("file name '{0}' collides with the missing-file marker")]
    SentinelName(String),
    #[error("expected 6 positional arguments, got {0}")]
    ArgCount(usize),
    #[error("scale must be positive, got {0}")]
    NonPositiveScale(f64),
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Everything one tool invocation needs
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    /// Namespaces all artifacts of this build
    pub id: String,
    /// Staged file names, relative to the intake directory
    pub primary_asset: String,
    pub texture: Option<String>,
    pub icon: Option<String>,
    pub transform: NormalizedTransform,
}

impl BuildRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.primary_asset.is_empty() {
            return Err(RequestError::EmptyPrimary);
        }
        for name in self.file_names() {
            validate_file_name(name)?;
        }
        self.transform.validate()?;
        if self.transform.scale <= 0.0 {
            return Err(RequestError::NonPositiveScale(self.transform.scale));
        }
        Ok(())
    }

    /// Staged files in argument order
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_asset.as_str())
            .chain(self.texture.as_deref())
            .chain(self.icon.as_deref())
    }

    /// Asset, position, rotation, scale, texture-or-sentinel, icon-or-sentinel
    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.primary_asset.clone(),
            format_vector(&self.transform.position),
            format_vector(&self.transform.rotation),
            format_scalar(self.transform.scale),
            optional_arg(self.texture.as_deref()),
            optional_arg(self.icon.as_deref()),
        ]
    }

    /// Inverse of [`BuildRequest::to_args`], used on the tool side
    pub fn from_args(id: &str, args: &[String]) -> Result<Self, RequestError> {
        let [asset, position, rotation, scale, texture, icon] = args else {
            return Err(RequestError::ArgCount(args.len()));
        };

        let request = Self {
            id: id.to_string(),
            primary_asset: unquote(asset).to_string(),
            texture: parse_optional(texture),
            icon: parse_optional(icon),
            transform: NormalizedTransform {
                position: parse_vector(position)?,
                rotation: parse_vector(rotation)?,
                scale: parse_scalar(scale)?,
            },
        };
        request.validate()?;
        Ok(request)
    }
}

fn validate_file_name(name: &str) -> Result<(), RequestError> {
    if name == MISSING_SENTINEL {
        return Err(RequestError::SentinelName(name.to_string()));
    }
    let plain = std::path::Path::new(name)
        .file_name()
        .and_then(|f| f.to_str())
        .is_some_and(|f| f == name);
    if name.is_empty() || !plain || name.contains('\\') {
        return Err(RequestError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

fn optional_arg(name: Option<&str>) -> String {
    name.unwrap_or(MISSING_SENTINEL).to_string()
}

fn parse_optional(arg: &str) -> Option<String> {
    match unquote(arg) {
        "" | MISSING_SENTINEL => None,
        name => Some(name.to_string()),
    }
}

fn unquote(arg: &str) -> &str {
    arg.trim().trim_matches('"')
}

/// Timestamp-derived unique id: `20261018153012345_1a2b3c4d`
pub fn generate_build_id() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{stamp}_{}", &suffix[..8])
}
