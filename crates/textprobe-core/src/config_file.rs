use std::path::{Path, PathBuf};

use serde::Deserialize;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub service: Option<ServiceConfig>,
    pub display: Option<DisplayConfig>,
    pub drive: Option<DriveConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    pub base_url: Option<String>,
    pub predict_path: Option<String>,
    pub extract_path: Option<String>,
    pub drive_status_path: Option<String>,
    pub drive_auth_path: Option<String>,
    pub drive_download_path: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayConfig {
    pub render_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriveConfig {
    pub poll_interval_ms: Option<u64>,
    pub auth_message_type: Option<String>,
}

/// Platform config directory path: `<config_dir>/textprobe/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("textprobe").join("config.toml"))
}

/// Load config by cascading CWD `.textprobe.toml` over platform config.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".textprobe.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bs, os) = (base.service.as_ref(), overlay.service.as_ref());
    let (bd, od) = (base.display.as_ref(), overlay.display.as_ref());
    let (bv, ov) = (base.drive.as_ref(), overlay.drive.as_ref());
    ConfigFile {
        service: Some(ServiceConfig {
            base_url: pick(os, bs, |s| s.base_url.clone()),
            predict_path: pick(os, bs, |s| s.predict_path.clone()),
            extract_path: pick(os, bs, |s| s.extract_path.clone()),
            drive_status_path: pick(os, bs, |s| s.drive_status_path.clone()),
            drive_auth_path: pick(os, bs, |s| s.drive_auth_path.clone()),
            drive_download_path: pick(os, bs, |s| s.drive_download_path.clone()),
            request_timeout_secs: pick(os, bs, |s| s.request_timeout_secs),
        }),
        display: Some(DisplayConfig {
            render_mode: pick(od, bd, |d| d.render_mode.clone()),
        }),
        drive: Some(DriveConfig {
            poll_interval_ms: pick(ov, bv, |d| d.poll_interval_ms),
            auth_message_type: pick(ov, bv, |d| d.auth_message_type.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_deserializes() {
        let toml_str = "[service]\nbase_url = \"http://scanner:9000\"\n\n[display]\nrender_mode = \"basic\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let service = parsed.service.unwrap();
        assert_eq!(service.base_url.as_deref(), Some("http://scanner:9000"));
        assert!(service.request_timeout_secs.is_none());
        assert!(parsed.drive.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            service: Some(ServiceConfig {
                base_url: Some("http://base:8000".to_string()),
                request_timeout_secs: Some(10),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            service: Some(ServiceConfig {
                base_url: Some("http://overlay:8000".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).service.unwrap();
        assert_eq!(merged.base_url.as_deref(), Some("http://overlay:8000"));
        assert_eq!(merged.request_timeout_secs, Some(10));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            drive: Some(DriveConfig {
                poll_interval_ms: Some(250),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.drive.unwrap().poll_interval_ms, Some(250));
    }

    #[test]
    fn missing_or_broken_file_is_none() {
        let dir = std::env::temp_dir().join(format!("textprobe-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let broken = dir.join("broken.toml");
        std::fs::write(&broken, "[service\nbase_url = ").unwrap();

        assert!(load_from_path(&dir.join("absent.toml")).is_none());
        assert!(load_from_path(&broken).is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cwd_file_layers_over_platform_file() {
        let dir = std::env::temp_dir().join(format!("config-cascade-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let platform = dir.join("config.toml");
        let cwd = dir.join(".textprobe.toml");
        std::fs::write(
            &platform,
            "[service]\nbase_url = \"http://platform:8000\"\nrequest_timeout_secs = 20\n\n[drive]\npoll_interval_ms = 750\n",
        )
        .unwrap();
        std::fs::write(&cwd, "[service]\nbase_url = \"http://local:8000\"\n").unwrap();

        let merged = merge(
            load_from_path(&platform).unwrap(),
            load_from_path(&cwd).unwrap(),
        );
        let service = merged.service.unwrap();
        assert_eq!(service.base_url.as_deref(), Some("http://local:8000"));
        assert_eq!(service.request_timeout_secs, Some(20));
        assert_eq!(merged.drive.unwrap().poll_interval_ms, Some(750));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
