use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub site: Option<SiteConfig>,
    pub filter: Option<FilterConfig>,
    pub extraction: Option<ExtractionConfig>,
    pub network: Option<NetworkConfig>,
    pub delivery: Option<DeliveryConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: Option<String>,
    pub max_pages: Option<u32>,
    pub days_back: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub excluded_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub ocr_languages: Option<String>,
    pub ocr_dpi: Option<u32>,
    pub tesseract_path: Option<String>,
    pub max_archive_size_mb: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub download_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub webhook_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub delay_ms: Option<u64>,
}

/// Platform config directory path: `<config_dir>/tender-scan/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tender-scan").join("config.toml"))
}

/// Load config by cascading CWD `.tender-scan.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".tender-scan.toml"));

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

fn pick<S, T>(
    overlay: Option<&S>,
    base: Option<&S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bs, os) = (base.site.as_ref(), overlay.site.as_ref());
    let (bf, of) = (base.filter.as_ref(), overlay.filter.as_ref());
    let (be, oe) = (base.extraction.as_ref(), overlay.extraction.as_ref());
    let (bn, on) = (base.network.as_ref(), overlay.network.as_ref());
    let (bd, od) = (base.delivery.as_ref(), overlay.delivery.as_ref());

    ConfigFile {
        site: Some(SiteConfig {
            base_url: pick(os, bs, |s| s.base_url.clone()),
            max_pages: pick(os, bs, |s| s.max_pages),
            days_back: pick(os, bs, |s| s.days_back),
        }),
        filter: Some(FilterConfig {
            excluded_keywords: pick(of, bf, |f| f.excluded_keywords.clone()),
        }),
        extraction: Some(ExtractionConfig {
            ocr_languages: pick(oe, be, |e| e.ocr_languages.clone()),
            ocr_dpi: pick(oe, be, |e| e.ocr_dpi),
            tesseract_path: pick(oe, be, |e| e.tesseract_path.clone()),
            max_archive_size_mb: pick(oe, be, |e| e.max_archive_size_mb),
        }),
        network: Some(NetworkConfig {
            download_timeout_secs: pick(on, bn, |n| n.download_timeout_secs),
        }),
        delivery: Some(DeliveryConfig {
            webhook_url: pick(od, bd, |d| d.webhook_url.clone()),
            timeout_secs: pick(od, bd, |d| d.timeout_secs),
            delay_ms: pick(od, bd, |d| d.delay_ms),
        }),
    }
}
