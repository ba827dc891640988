//! Reference compilation tool.
//!
//! Reads the staged files named by its six positional arguments from
//! `Assets/Uploads`, packs them into a bundle at
//! `Assets/StreamingAssets/AssetBundles/hat` and deletes its intake files.
//! Icons and textures are renamed after the primary asset so the runtime
//! naming convention pairs them.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use shared::{
    file_stem, AssetFile, AssetRole, BundleArchive, BundleError, MaterialDesc, BUILD_ID_ENV,
    ICON_SUFFIX, INTAKE_DIR, OUTPUT_BUNDLE_PATH, TEXTURE_SUFFIX,
};
use thiserror::Error;

use crate::build::{generate_build_id, BuildRequest, RequestError};

/// Shader written into bundled materials; the runtime rebinds it
pub const BUNDLE_SHADER: &str = "Standard";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("intake file '{0}' not found")]
    MissingInput(String),
    #[error("intake holds files not named by this build: {}", .0.join(", "))]
    ForeignIntake(Vec<String>),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where the tool reads and writes
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub project_dir: PathBuf,
    pub build_id: String,
}

impl ToolContext {
    /// Current directory as project, build id from the environment or a fresh one
    pub fn from_env() -> io::Result<Self> {
        Ok(Self {
            project_dir: std::env::current_dir()?,
            build_id: std::env::var(BUILD_ID_ENV).unwrap_or_else(|_| generate_build_id()),
        })
    }

    pub fn intake_dir(&self) -> PathBuf {
        self.project_dir.join(INTAKE_DIR)
    }

    pub fn output_path(&self) -> PathBuf {
        self.project_dir.join(OUTPUT_BUNDLE_PATH)
    }
}

/// Build one bundle. Returns the output path.
pub fn run(ctx: &ToolContext, args: &[String]) -> Result<PathBuf, ToolError> {
    let request = BuildRequest::from_args(&ctx.build_id, args)?;
    let intake = ctx.intake_dir();
    check_intake(&intake, &request)?;

    let bundle = assemble(&intake, &request)?;
    let output = ctx.output_path();
    bundle.write(&output)?;
    tracing::info!(
        bundle = %bundle.manifest.bundle_name,
        entries = bundle.entries().len(),
        output = %output.display(),
        "bundle written"
    );

    for name in request.file_names() {
        std::fs::remove_file(intake.join(name))?;
    }
    Ok(output)
}

/// The intake must hold exactly the files named by the request
fn check_intake(intake: &Path, request: &BuildRequest) -> Result<(), ToolError> {
    let expected: BTreeSet<&str> = request.file_names().collect();
    for name in &expected {
        if !intake.join(name).is_file() {
            return Err(ToolError::MissingInput(name.to_string()));
        }
    }

    let mut foreign = Vec::new();
    for entry in std::fs::read_dir(intake)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_file() && !expected.contains(name.as_str()) {
            foreign.push(name);
        }
    }
    if !foreign.is_empty() {
        foreign.sort();
        return Err(ToolError::ForeignIntake(foreign));
    }
    Ok(())
}

fn assemble(intake: &Path, request: &BuildRequest) -> Result<BundleArchive, ToolError> {
    let base = file_stem(&request.primary_asset).to_string();
    let mut bundle = BundleArchive::new(format!("hat_{}", request.id), request.id.clone());

    let texture_name = request.texture.as_ref().map(|_| format!("{base}{TEXTURE_SUFFIX}"));

    let mesh = std::fs::read(intake.join(&request.primary_asset))?;
    let entry = bundle.add(&base, AssetRole::Primary, &request.primary_asset, mesh);
    entry.transform = Some(request.transform);
    entry.material = Some(MaterialDesc {
        shader: BUNDLE_SHADER.to_string(),
        texture: texture_name.clone(),
    });

    if let (Some(file), Some(name)) = (&request.texture, texture_name) {
        let bytes = std::fs::read(intake.join(file))?;
        let renamed = renamed_file(&AssetFile::new(file, AssetRole::Texture), &name);
        bundle.add(name, AssetRole::Texture, &renamed, bytes);
    }

    if let Some(file) = &request.icon {
        let name = format!("{base}{ICON_SUFFIX}");
        let bytes = std::fs::read(intake.join(file))?;
        let renamed = renamed_file(&AssetFile::new(file, AssetRole::Icon), &name);
        bundle.add(name, AssetRole::Icon, &renamed, bytes);
    }

    Ok(bundle)
}

/// `photo.PNG` renamed to `Fez_icon` -> `Fez_icon.PNG`
fn renamed_file(original: &AssetFile, name: &str) -> String {
    match original.extension() {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}
