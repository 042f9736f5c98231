//! Download bridge: persist rendered files and hand them to the OS viewer.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::export::ExportedFile;

/// Where a saved file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub success: bool,
    pub path: PathBuf,
}

/// Sink for generated documents.
pub trait DownloadBridge: Send + Sync {
    /// Persist `bytes` as `file_name`. Existing files are never overwritten.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<DownloadOutcome>;
}

/// Saves into a folder, suffixing ` (n)` when the name is taken.
#[derive(Debug, Clone)]
pub struct FolderDownload {
    dir: PathBuf,
}

impl FolderDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, file_name: &str, attempt: u32) -> PathBuf {
        if attempt == 0 {
            return self.dir.join(file_name);
        }
        let path = Path::new(file_name);
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.dir.join(format!("{stem} ({attempt}).{ext}")),
            None => self.dir.join(format!("{stem} ({attempt})")),
        }
    }
}

impl DownloadBridge for FolderDownload {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<DownloadOutcome> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("Nombre de archivo inválido"))?;

        std::fs::create_dir_all(&self.dir)?;

        for attempt in 0..1000 {
            let path = self.candidate(file_name, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)?;
                    file.sync_all()?;
                    info!("Saved {} ({} bytes)", path.display(), bytes.len());
                    return Ok(DownloadOutcome { success: true, path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::export(format!("No hay un nombre libre para {file_name}")))
    }
}

/// Save a rendered export through `bridge`.
pub fn save_export(bridge: &dyn DownloadBridge, file: &ExportedFile) -> Result<DownloadOutcome> {
    bridge.save(&file.file_name, &file.bytes)
}

/// Decode a base64 payload and save it. Decoding failures report `success: false`.
///
/// Line breaks inside the payload are ignored, as piped encoders wrap lines.
pub fn download_base64(
    bridge: &dyn DownloadBridge,
    file_name: &str,
    payload: &str,
    mime_type: &str,
) -> Result<DownloadOutcome> {
    let compact: String = payload.split_whitespace().collect();
    let bytes = match BASE64.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Invalid base64 payload for {} ({}): {}", file_name, mime_type, e);
            return Ok(DownloadOutcome {
                success: false,
                path: PathBuf::from(file_name),
            });
        }
    };
    bridge.save(file_name, &bytes)
}

/// Ask the desktop to open `path` with its default viewer.
pub fn open_with_viewer(path: &Path) -> Result<()> {
    let status = viewer_command(path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(AppError::Io(std::io::Error::other(format!(
            "viewer exited with {status}"
        ))))
    }
}

/// Notification after saving: opened, or where to find it.
pub fn open_or_notice(path: &Path) -> String {
    match open_with_viewer(path) {
        Ok(()) => format!("Archivo generado: {}", file_label(path)),
        Err(e) => {
            warn!("Could not open {}: {}", path.display(), e);
            format!(
                "Archivo guardado. Búscalo en la carpeta {}.",
                path.parent().map(|p| p.display().to_string()).unwrap_or_default()
            )
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(target_os = "windows")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(path);
    cmd
}

#[cfg(target_os = "macos")]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(path);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn viewer_command(path: &Path) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(path);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FolderDownload::new(dir.path());

        let first = bridge.save("reporte.pdf", b"uno").unwrap();
        let second = bridge.save("reporte.pdf", b"dos").unwrap();
        let third = bridge.save("reporte.pdf", b"tres").unwrap();

        assert_eq!(first.path, dir.path().join("reporte.pdf"));
        assert_eq!(second.path, dir.path().join("reporte (1).pdf"));
        assert_eq!(third.path, dir.path().join("reporte (2).pdf"));
        assert_eq!(std::fs::read(&first.path).unwrap(), b"uno");
        assert_eq!(std::fs::read(&second.path).unwrap(), b"dos");
    }

    #[test]
    fn test_save_strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FolderDownload::new(dir.path().join("nested"));

        let outcome = bridge.save("../../escape.xlsx", b"x").unwrap();
        assert_eq!(outcome.path, dir.path().join("nested").join("escape.xlsx"));
    }

    #[test]
    fn test_download_base64() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FolderDownload::new(dir.path());

        let ok = download_base64(&bridge, "hola.txt", &BASE64.encode("hola"), "text/plain").unwrap();
        assert!(ok.success);
        assert_eq!(std::fs::read_to_string(ok.path).unwrap(), "hola");

        let bad = download_base64(&bridge, "malo.txt", "%%%", "text/plain").unwrap();
        assert!(!bad.success);
        assert!(!dir.path().join("malo.txt").exists());
    }

    #[test]
    fn test_download_base64_accepts_wrapped_stdin_payload() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FolderDownload::new(dir.path());

        let encoded = BASE64.encode("reporte de stock mensual, octubre 2026");
        let (first, rest) = encoded.split_at(20);
        let piped = format!("{first}\n{rest}\n");

        let outcome = download_base64(&bridge, "stock.txt", &piped, "text/plain").unwrap();
        assert!(outcome.success);
        assert_eq!(
            std::fs::read_to_string(outcome.path).unwrap(),
            "reporte de stock mensual, octubre 2026"
        );
    }

    #[test]
    fn test_save_export() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FolderDownload::new(dir.path());
        let file = ExportedFile {
            file_name: "reporte_stock_octubre_2026_20261017_101500_000.xlsx".to_string(),
            mime_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            bytes: vec![0x50, 0x4b],
        };
        let outcome = save_export(&bridge, &file).unwrap();
        assert!(outcome.path.exists());
    }
}
