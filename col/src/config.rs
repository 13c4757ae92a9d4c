use std::path::Path;

use ini::Ini;
use num_traits::FromPrimitive;

use crate::{
    consts::ColVersion,
    error::{ColError, Result},
};

/// Reader and writer options, loadable from the `[col]` section of an ini file:
///
/// ```ini
/// [col]
/// headerless_fallback = true
/// export_version = 3
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColConfig {
    /// Read a buffer that does not start with a `COL` magic as one headerless
    /// version 1 model.
    pub headerless_fallback: bool,
    /// Convert every model to this version when writing.
    pub export_version: Option<ColVersion>,
}

impl Default for ColConfig {
    fn default() -> Self {
        Self {
            headerless_fallback: true,
            export_version: None,
        }
    }
}

impl ColConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| ColError::Config(format!("{}: {e}", path.display())))?;
        Self::from_ini(&ini)
    }

    pub fn from_ini(ini: &Ini) -> Result<Self> {
        let mut config = Self::default();

        let Some(section) = ini.section(Some("col")) else {
            return Ok(config);
        };

        if let Some(fallback) = section.get("headerless_fallback") {
            config.headerless_fallback = fallback.trim().parse().map_err(|_| {
                ColError::Config(format!("headerless_fallback must be true or false, got {fallback:?}"))
            })?;
        }

        if let Some(version) = section.get("export_version") {
            let version = version
                .trim()
                .parse::<u32>()
                .ok()
                .and_then(ColVersion::from_u32)
                .ok_or_else(|| {
                    ColError::Config(format!("export_version must be 1, 2, 3 or 4, got {version:?}"))
                })?;
            config.export_version = Some(version);
        }

        Ok(config)
    }
}
