//! Install-time side effects
//!
//! On first launch the agent can copy itself into its base directory,
//! relaunch from there and register itself to start on login.
//! All of it is best-effort: [`Installer::prepare`] logs failures and
//! carries on, and the agent starts normally whatever happened here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Name used for the autostart registration
const APP_NAME: &str = "DDNSAgent";

/// Errors that can occur during installation steps
#[derive(Debug, Error)]
pub enum InstallError {
    /// The running executable's location is unknown
    #[error("Could not determine executable path: {0}")]
    NoExecutable(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The OS autostart mechanism rejected the registration
    #[error("Autostart registration failed: {0}")]
    Registration(String),
}

/// Where the process should go after [`Installer::prepare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// Keep running in this process
    InPlace,
    /// A copy was launched from the base directory; this process should exit
    Relaunched,
}

/// Performs the one-time install steps against a base directory
#[derive(Debug, Clone)]
pub struct Installer {
    base_dir: PathBuf,
    autostart_dir: Option<PathBuf>,
}

impl Installer {
    /// Creates an installer targeting `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            autostart_dir: default_autostart_dir(),
        }
    }

    /// Overrides where autostart entries are written (macOS and Linux)
    pub fn with_autostart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.autostart_dir = Some(dir.into());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Runs every step, swallowing failures
    pub fn prepare(&self) -> Relocation {
        if let Err(e) = self.ensure_base_dir() {
            tracing::warn!("Could not create {}: {}", self.base_dir.display(), e);
        }

        match self.ensure_exe_location() {
            Ok(Relocation::Relaunched) => return Relocation::Relaunched,
            Ok(Relocation::InPlace) => {}
            Err(e) => tracing::warn!("Could not relocate executable: {}", e),
        }

        match self.ensure_autostart() {
            Ok(true) => tracing::info!("Registered autostart"),
            Ok(false) => tracing::debug!("Autostart already registered"),
            Err(e) => tracing::warn!("Could not register autostart: {}", e),
        }

        Relocation::InPlace
    }

    /// Creates the base directory if needed
    pub fn ensure_base_dir(&self) -> Result<(), InstallError> {
        fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }

    /// Where the executable lives once installed
    pub fn installed_exe(&self, exe: &Path) -> Option<PathBuf> {
        exe.file_name().map(|name| self.base_dir.join(name))
    }

    /// Returns true if `exe` is not running from the base directory
    pub fn needs_relocation(&self, exe: &Path) -> bool {
        match self.installed_exe(exe) {
            Some(target) => !same_path(exe, &target),
            None => false,
        }
    }

    /// Makes sure the agent runs from its base directory
    ///
    /// If it doesn't, the executable is copied there and the copy launched
    /// with the same arguments.
    pub fn ensure_exe_location(&self) -> Result<Relocation, InstallError> {
        let exe = current_exe()?;
        self.relocate_from(&exe)
    }

    fn relocate_from(&self, exe: &Path) -> Result<Relocation, InstallError> {
        if !self.needs_relocation(exe) {
            return Ok(Relocation::InPlace);
        }
        let target = self
            .installed_exe(exe)
            .ok_or_else(|| InstallError::NoExecutable(exe.display().to_string()))?;

        fs::copy(exe, &target)?;
        Command::new(&target)
            .args(std::env::args_os().skip(1))
            .current_dir(&self.base_dir)
            .spawn()?;

        tracing::info!("Relaunched from {}", target.display());
        Ok(Relocation::Relaunched)
    }

    /// Registers the installed executable to start on login, unless it
    /// already is
    ///
    /// Returns true if a new registration was made.
    pub fn ensure_autostart(&self) -> Result<bool, InstallError> {
        let exe = current_exe()?;
        let target = self.installed_exe(&exe).unwrap_or(exe);
        self.register_autostart(&target)
    }

    // ========================================================================
    // Windows auto-start (Registry)
    // ========================================================================

    #[cfg(target_os = "windows")]
    fn register_autostart(&self, exe: &Path) -> Result<bool, InstallError> {
        const RUN_KEY: &str = r"HKCU\Software\Microsoft\Windows\CurrentVersion\Run";

        let registered = Command::new("reg")
            .args(["query", RUN_KEY, "/v", APP_NAME])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if registered {
            return Ok(false);
        }

        let output = Command::new("reg")
            .args([
                "add",
                RUN_KEY,
                "/v",
                APP_NAME,
                "/t",
                "REG_SZ",
                "/d",
                &exe.to_string_lossy(),
                "/f",
            ])
            .output()?;

        if !output.status.success() {
            return Err(InstallError::Registration(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(true)
    }

    // ========================================================================
    // macOS auto-start (LaunchAgent plist)
    // ========================================================================

    #[cfg(target_os = "macos")]
    fn register_autostart(&self, exe: &Path) -> Result<bool, InstallError> {
        let dir = self
            .autostart_dir
            .as_ref()
            .ok_or_else(|| InstallError::Registration("no LaunchAgents directory".into()))?;
        let plist_path = dir.join("com.ddnsagent.agent.plist");
        if plist_path.exists() {
            return Ok(false);
        }

        let plist_content = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>com.ddnsagent.agent</string>
    <key>ProgramArguments</key>
    <array>
        <string>{}</string>
    </array>
    <key>WorkingDirectory</key>
    <string>{}</string>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <false/>
</dict>
</plist>
"#,
            exe.display(),
            self.base_dir.display()
        );

        fs::create_dir_all(dir)?;
        fs::write(&plist_path, plist_content)?;
        Ok(true)
    }

    // ========================================================================
    // Linux auto-start (.desktop file in autostart)
    // ========================================================================

    #[cfg(target_os = "linux")]
    fn register_autostart(&self, exe: &Path) -> Result<bool, InstallError> {
        let dir = self
            .autostart_dir
            .as_ref()
            .ok_or_else(|| InstallError::Registration("no autostart directory".into()))?;
        let desktop_path = dir.join("ddns-agent.desktop");
        if desktop_path.exists() {
            return Ok(false);
        }

        let desktop_content = format!(
            r#"[Desktop Entry]
Type=Application
Name={}
Comment=Keeps a dynamic DNS record up to date
Exec="{}"
Path={}
Terminal=false
Categories=Network;
StartupNotify=false
X-GNOME-Autostart-enabled=true
"#,
            APP_NAME,
            exe.display(),
            self.base_dir.display()
        );

        fs::create_dir_all(dir)?;
        fs::write(&desktop_path, desktop_content)?;
        Ok(true)
    }

    // Fallback for other platforms
    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    fn register_autostart(&self, _exe: &Path) -> Result<bool, InstallError> {
        Ok(false)
    }
}

fn current_exe() -> Result<PathBuf, InstallError> {
    std::env::current_exe().map_err(|e| InstallError::NoExecutable(e.to_string()))
}

#[cfg(target_os = "macos")]
fn default_autostart_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join("Library/LaunchAgents"))
}

#[cfg(target_os = "linux")]
fn default_autostart_dir() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("HOME").ok().map(|p| PathBuf::from(p).join(".config")))
        .map(|p| p.join("autostart"))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn default_autostart_dir() -> Option<PathBuf> {
    None
}

/// Compares paths the way the platform's file system does
fn same_path(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (a.canonicalize(), b.canonicalize()) {
        return a == b;
    }

    if cfg!(windows) {
        a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
    } else {
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_base_dir_creates_nested_dirs() {
        let dir = TempDir::new().unwrap();
        let installer = Installer::new(dir.path().join("a").join("b"));

        installer.ensure_base_dir().unwrap();
        assert!(installer.base_dir().is_dir());

        // Idempotent
        installer.ensure_base_dir().unwrap();
    }

    #[test]
    fn test_needs_relocation() {
        let dir = TempDir::new().unwrap();
        let installer = Installer::new(dir.path());

        assert!(!installer.needs_relocation(&dir.path().join("ddns-agent")));
        assert!(installer.needs_relocation(Path::new("/somewhere/else/ddns-agent")));
        assert_eq!(
            installer.installed_exe(Path::new("/somewhere/else/ddns-agent")),
            Some(dir.path().join("ddns-agent"))
        );
    }

    #[test]
    fn test_installed_exe_is_left_in_place() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("ddns-agent");
        fs::write(&exe, b"binary").unwrap();

        let installer = Installer::new(dir.path());
        assert_eq!(installer.relocate_from(&exe).unwrap(), Relocation::InPlace);
    }

    #[test]
    fn test_relocation_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let installer = Installer::new(dir.path().join("missing"));

        let result = installer.relocate_from(&dir.path().join("not-there"));
        assert!(matches!(result, Err(InstallError::Io(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_autostart_entry_written_once() {
        let dir = TempDir::new().unwrap();
        let autostart = dir.path().join("autostart");
        let installer = Installer::new(dir.path().join("base")).with_autostart_dir(&autostart);

        let exe = dir.path().join("base").join("ddns-agent");
        assert!(installer.register_autostart(&exe).unwrap());

        let entry = autostart.join("ddns-agent.desktop");
        let content = fs::read_to_string(&entry).unwrap();
        assert!(content.contains(&format!("Exec=\"{}\"", exe.display())));

        fs::write(&entry, "user edited").unwrap();
        assert!(!installer.register_autostart(&exe).unwrap());
        assert_eq!(fs::read_to_string(&entry).unwrap(), "user edited");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_prepare_swallows_failures() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();

        // Base dir below a regular file can't be created, copied to or launched from
        let installer = Installer::new(blocker.join("base"))
            .with_autostart_dir(blocker.join("autostart"));

        assert_eq!(installer.prepare(), Relocation::InPlace);
    }
}
