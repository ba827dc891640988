//! Build orchestration: stage uploads, run the external compilation tool,
//! collect the packaged bundle.
//!
//! Builds share one intake directory, so they are serialized by a lock.

pub mod intake;
pub mod request;

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use shared::{TransformError, TransformSpec, BUILD_ID_ENV};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{Mutex, MutexGuard};
use tracing::Instrument;

use crate::config::{BusyPolicy, BuildConfig};
use crate::upload::{AssetUpload, PairedUpload};
use intake::StagedIntake;
pub use request::{generate_build_id, BuildRequest, RequestError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No model file uploaded")]
    MissingModel,
    #[error("expected exactly one model file, got {0}")]
    MultipleModels(usize),
    #[error("'{0}' is not a usable file name")]
    InvalidFileName(String),
    #[error("two uploaded files share the name '{0}'")]
    DuplicateFileName(String),
    #[error("invalid transform: {0}")]
    Transform(#[from] TransformError),
    #[error("invalid build request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("another build is already running")]
    Busy,
    #[error("failed to start build tool: {0}")]
    Spawn(#[source] io::Error),
    #[error("build tool exited with {status}: {}", .diagnostics.as_deref().unwrap_or("no output"))]
    ToolFailed {
        status: String,
        diagnostics: Option<String>,
    },
    #[error("build tool timed out after {0:?}")]
    Timeout(Duration),
    #[error("build tool produced no bundle at {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("build I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BuildError {
    /// Caused by the uploaded input rather than the build machinery
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BuildError::MissingModel
                | BuildError::MultipleModels(_)
                | BuildError::InvalidFileName(_)
                | BuildError::DuplicateFileName(_)
                | BuildError::Transform(_)
                | BuildError::InvalidRequest(_)
        )
    }
}

/// A finished bundle, moved out of the tool's output location
#[derive(Debug, Clone)]
pub struct PackagedBundle {
    pub id: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Runs at most one build at a time
#[derive(Debug)]
pub struct BuildOrchestrator {
    config: BuildConfig,
    lock: Mutex<()>,
}

impl BuildOrchestrator {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// A build currently holds the intake directory
    pub fn is_busy(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    pub async fn build(
        &self,
        upload: AssetUpload,
        transform: TransformSpec,
    ) -> Result<PackagedBundle, BuildError> {
        let assets = upload.pair()?;
        let transform = transform.normalize();
        transform.validate()?;

        let _guard = self.acquire().await?;
        let id = generate_build_id();
        let span = tracing::info_span!("build", build_id = %id);

        async {
            let staged = StagedIntake::stage(&self.config.intake_dir(), &assets)?;
            let request = BuildRequest {
                id: id.clone(),
                primary_asset: staged.primary().to_string(),
                texture: staged.texture().map(str::to_string),
                icon: staged.icon().map(str::to_string),
                transform,
            };
            request.validate()?;
            log_request(&assets, &request);

            let output = self.config.output_path();
            remove_stale_output(&output)?;

            let outcome = self.invoke(&request).await;
            drop(staged);
            outcome?;

            self.collect(&id, &output)
        }
        .instrument(span)
        .await
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, ()>, BuildError> {
        match self.config.busy_policy {
            BusyPolicy::Queue => {
                if self.is_busy() {
                    tracing::info!("build in progress, queueing");
                }
                Ok(self.lock.lock().await)
            }
            BusyPolicy::Reject => self.lock.try_lock().map_err(|_| BuildError::Busy),
        }
    }

    async fn invoke(&self, request: &BuildRequest) -> Result<(), BuildError> {
        let tool = &self.config.tool;
        let mut command = Command::new(&tool.program);
        command
            .args(&tool.leading_args)
            .args(request.to_args())
            .args(&tool.trailing_args)
            .current_dir(&self.config.project_dir)
            .env(BUILD_ID_ENV, &request.id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!(program = %tool.program.display(), "invoking build tool");
        let child = command.spawn().map_err(BuildError::Spawn)?;

        let timeout = self.config.timeout();
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                tracing::error!(?timeout, "build tool timed out");
                return Err(BuildError::Timeout(timeout));
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let diagnostics = diagnostics(&output.stderr).or_else(|| diagnostics(&output.stdout));
        tracing::error!(status = %output.status, diagnostics = ?diagnostics, "build tool failed");
        Err(BuildError::ToolFailed {
            status: output.status.to_string(),
            diagnostics,
        })
    }

    fn collect(&self, id: &str, output: &Path) -> Result<PackagedBundle, BuildError> {
        if !output.is_file() {
            tracing::error!(output = %output.display(), "build tool reported success but wrote no bundle");
            return Err(BuildError::MissingOutput(output.to_path_buf()));
        }

        std::fs::create_dir_all(&self.config.bundles_dir)?;
        let dest = self.config.bundles_dir.join(format!("hat_{id}"));
        move_file(output, &dest)?;
        let bytes = std::fs::read(&dest)?;

        tracing::info!(bundle = %dest.display(), bytes = bytes.len(), "bundle ready");
        Ok(PackagedBundle {
            id: id.to_string(),
            path: dest,
            bytes,
        })
    }
}

fn log_request(assets: &PairedUpload, request: &BuildRequest) {
    tracing::info!(
        model = %assets.primary.file_name(),
        texture = request.texture.is_some(),
        icon = request.icon.is_some(),
        position = ?request.transform.position,
        rotation = ?request.transform.rotation,
        scale = request.transform.scale,
        "starting build"
    );
}

fn remove_stale_output(output: &Path) -> io::Result<()> {
    match std::fs::remove_file(output) {
        Ok(()) => {
            tracing::debug!(output = %output.display(), "removed stale bundle");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}

fn diagnostics(stream: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stream);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
