//! Device capability requests.
//!
//! The mobile shell asked the OS for camera, storage and location grants.
//! On the desktop these map onto folder checks and config toggles behind
//! the same [`CapabilityBridge`] seam.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::{ExportConfig, PermissionsConfig};
use crate::error::{AppError, Result};

/// Capability the app may ask the device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Camera,
    Filesystem,
    Geolocation,
    Haptics,
    StatusBar,
}

impl Capability {
    /// Requested right after sign-in.
    pub const SIGN_IN: [Capability; 2] = [Self::Camera, Self::Filesystem];

    /// Spanish name used in notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Camera => "cámara",
            Self::Filesystem => "almacenamiento",
            Self::Geolocation => "ubicación",
            Self::Haptics => "vibración",
            Self::StatusBar => "barra de estado",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a check or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// The platform has no such capability. Never blocks a flow.
    Unavailable,
}

impl PermissionState {
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// Platform seam for capability grants.
pub trait CapabilityBridge: Send + Sync {
    /// Current state without prompting.
    fn check(&self, capability: Capability) -> PermissionState;

    /// Ask for the capability. Defaults to [`check`](Self::check) on
    /// platforms without an interactive prompt.
    fn request(&self, capability: Capability) -> PermissionState {
        self.check(capability)
    }
}

/// Fail with [`AppError::PermissionDenied`] unless the capability is usable.
pub fn ensure(bridge: &dyn CapabilityBridge, capability: Capability) -> Result<()> {
    let state = bridge.request(capability);
    debug!("Permission {:?}: {:?}", capability, state);
    if state.is_usable() {
        Ok(())
    } else {
        warn!("Permission denied: {}", capability);
        Err(AppError::PermissionDenied(capability))
    }
}

/// Request every capability in `capabilities`, stopping at the first denial.
pub fn ensure_all(bridge: &dyn CapabilityBridge, capabilities: &[Capability]) -> Result<()> {
    capabilities.iter().try_for_each(|c| ensure(bridge, *c))
}

/// Desktop grants: the export folder must be writable, the rest come from config.
#[derive(Debug, Clone)]
pub struct DesktopCapabilities {
    export_dir: PathBuf,
    camera: bool,
    geolocation: bool,
}

impl DesktopCapabilities {
    pub fn new(export: &ExportConfig, permissions: &PermissionsConfig) -> Self {
        Self {
            export_dir: export.resolved_output_dir(),
            camera: permissions.camera,
            geolocation: permissions.geolocation,
        }
    }

    fn folder_writable(&self) -> bool {
        if std::fs::create_dir_all(&self.export_dir).is_err() {
            return false;
        }
        std::fs::metadata(&self.export_dir)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }
}

impl CapabilityBridge for DesktopCapabilities {
    fn check(&self, capability: Capability) -> PermissionState {
        let granted = match capability {
            Capability::Filesystem => self.folder_writable(),
            Capability::Camera => self.camera,
            Capability::Geolocation => self.geolocation,
            Capability::Haptics | Capability::StatusBar => return PermissionState::Unavailable,
        };
        if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop(dir: PathBuf, camera: bool) -> DesktopCapabilities {
        let export = ExportConfig {
            output_dir: Some(dir),
            ..ExportConfig::default()
        };
        let permissions = PermissionsConfig {
            camera,
            geolocation: false,
        };
        DesktopCapabilities::new(&export, &permissions)
    }

    #[test]
    fn test_filesystem_granted_for_writable_folder() {
        let dir = tempfile::tempdir().unwrap();
        let caps = desktop(dir.path().join("reportes"), true);
        assert_eq!(caps.check(Capability::Filesystem), PermissionState::Granted);
        assert!(dir.path().join("reportes").is_dir());
    }

    #[test]
    fn test_camera_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let caps = desktop(dir.path().to_path_buf(), false);
        assert_eq!(caps.check(Capability::Camera), PermissionState::Denied);

        let err = ensure_all(&caps, &Capability::SIGN_IN).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(Capability::Camera)));
    }

    #[test]
    fn test_unavailable_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let caps = desktop(dir.path().to_path_buf(), true);
        assert_eq!(caps.check(Capability::Haptics), PermissionState::Unavailable);
        assert!(ensure(&caps, Capability::StatusBar).is_ok());
    }
}
