//! Factory functions for build tests.
//!
//! Uploads, configs rooted in a scratch directory, stand-in tools and
//! hand-built multipart bodies.

use std::path::{Path, PathBuf};

use shared::AssetRole;

use crate::config::{BuildConfig, BusyPolicy, ServerConfig, ToolConfig};
use crate::upload::{AssetUpload, UploadedFile};

pub const MESH_BYTES: &[u8] = b"glTF-binary-mesh";
pub const TEXTURE_BYTES: &[u8] = b"\x89PNG-texture";
pub const ICON_BYTES: &[u8] = b"\x89PNG-icon";

// ── Uploads ─────────────────────────────────────────────────────

/// Model plus optional texture and icon, each sent through its dedicated field
pub fn upload(model: &str, texture: Option<&str>, icon: Option<&str>) -> AssetUpload {
    let mut upload = AssetUpload::new().with(UploadedFile::new(model, AssetRole::Primary, MESH_BYTES));
    if let Some(texture) = texture {
        upload.push(UploadedFile::new(texture, AssetRole::Texture, TEXTURE_BYTES));
    }
    if let Some(icon) = icon {
        upload.push(UploadedFile::new(icon, AssetRole::Icon, ICON_BYTES));
    }
    upload
}

// ── Configs ─────────────────────────────────────────────────────

/// Build config with project, bundles and timeout under `root`
pub fn build_config(root: &Path, tool: ToolConfig) -> BuildConfig {
    BuildConfig {
        project_dir: root.join("project"),
        intake_dir: None,
        output_path: None,
        bundles_dir: root.join("bundles"),
        tool,
        timeout_secs: 30,
        busy_policy: BusyPolicy::Queue,
    }
}

pub fn server_config(root: &Path, tool: ToolConfig) -> ServerConfig {
    ServerConfig {
        public_dir: root.join("public"),
        build: build_config(root, tool),
        ..Default::default()
    }
}

/// The reference tool binary
pub fn reference_tool(program: impl Into<PathBuf>) -> ToolConfig {
    ToolConfig {
        program: program.into(),
        ..Default::default()
    }
}

/// `sh -c <script>`; the six build arguments land in `$1..$6`
pub fn shell_tool(script: &str) -> ToolConfig {
    ToolConfig {
        program: PathBuf::from("sh"),
        leading_args: vec!["-c".into(), script.into(), "tool".into()],
        trailing_args: Vec::new(),
    }
}

/// Tool that prints to stderr and exits with `code`
pub fn failing_tool(code: i32) -> ToolConfig {
    shell_tool(&format!("echo 'compilation failed for '$1 >&2; exit {code}"))
}

/// Tool that sleeps, then fails
pub fn sleeping_tool(secs: f32) -> ToolConfig {
    shell_tool(&format!("sleep {secs}; exit 1"))
}

/// Tool that succeeds without writing anything
pub fn silent_tool() -> ToolConfig {
    shell_tool("exit 0")
}

// ── Multipart ───────────────────────────────────────────────────

pub const BOUNDARY: &str = "hatbundle-test-boundary";

/// One part of a multipart body
pub enum Part<'a> {
    File {
        field: &'a str,
        file_name: &'a str,
        data: &'a [u8],
    },
    Text {
        field: &'a str,
        value: &'a str,
    },
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                field,
                file_name,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { field, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}").as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
