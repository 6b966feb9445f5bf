//! Viewer configuration: where the geometry comes from, how it is rigged,
//! and how fast the joints move.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::rig::{RigConfig, RigError};

/// Joint speed used when none is given, in degrees per input tick
pub const DEFAULT_JOINT_STEP: f32 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rig config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid rig config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Rig(#[from] RigError),
    #[error("joint step must be a finite, non-negative number of degrees (got {0})")]
    InvalidJointStep(f32),
    #[error("no asset given; pass a mesh path or --demo")]
    MissingAsset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    /// The built-in box arm
    Demo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub asset: AssetSource,
    pub rig: RigConfig,
    pub joint_step: f32,
}

impl ViewerConfig {
    pub fn new(asset: AssetSource) -> Self {
        Self {
            asset,
            rig: RigConfig::default(),
            joint_step: DEFAULT_JOINT_STEP,
        }
    }

    pub fn demo() -> Self {
        Self::new(AssetSource::Demo)
    }

    pub fn with_joint_step(mut self, step: f32) -> Result<Self, ConfigError> {
        if !step.is_finite() || step < 0.0 {
            return Err(ConfigError::InvalidJointStep(step));
        }
        self.joint_step = step;
        Ok(self)
    }
}

impl RigConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: RigConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Command-line surface shared by the frontends
#[cfg(feature = "cli")]
#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Interactive viewer for a three-joint manipulator mesh")]
#[command(group(clap::ArgGroup::new("source").required(true).args(["asset", "demo"])))]
pub struct ViewerArgs {
    /// Mesh asset to load (.obj or .stl)
    pub asset: Option<PathBuf>,

    /// Show the built-in demo arm instead of loading an asset
    #[arg(long)]
    pub demo: bool,

    /// JSON rig description (reference names, level table, joint limits)
    #[arg(long, value_name = "FILE")]
    pub rig: Option<PathBuf>,

    /// Joint speed in degrees per input tick
    #[arg(long, default_value_t = DEFAULT_JOINT_STEP)]
    pub joint_step: f32,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[cfg(feature = "cli")]
impl ViewerArgs {
    pub fn to_config(&self) -> Result<ViewerConfig, ConfigError> {
        let asset = match (&self.asset, self.demo) {
            (_, true) => AssetSource::Demo,
            (Some(path), false) => AssetSource::File(path.clone()),
            (None, false) => return Err(ConfigError::MissingAsset),
        };
        let mut config = ViewerConfig::new(asset).with_joint_step(self.joint_step)?;
        if let Some(path) = &self.rig {
            config.rig = RigConfig::load(path)?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::Level;
    use std::io::Write;

    #[test]
    fn test_joint_step_validation() {
        assert!(ViewerConfig::demo().with_joint_step(1.5).is_ok());
        assert!(matches!(
            ViewerConfig::demo().with_joint_step(-1.0),
            Err(ConfigError::InvalidJointStep(_))
        ));
        assert!(ViewerConfig::demo().with_joint_step(f32::NAN).is_err());
    }

    #[test]
    fn test_rig_from_json_validates() {
        let config = RigConfig::from_json(r#"{ "levels": ["base", "wrist"] }"#).unwrap();
        assert_eq!(config.levels, vec![Level::Base, Level::Wrist]);

        let bad_limits =
            r#"{ "shoulder": { "axis": [1, 0, 0], "limits": { "min": 9, "max": 1 } } }"#;
        assert!(matches!(
            RigConfig::from_json(bad_limits),
            Err(ConfigError::Rig(RigError::InvalidLimits { .. }))
        ));
        assert!(matches!(
            RigConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rig_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "wrist_reference": "Hand" }}"#).unwrap();
        let config = RigConfig::load(file.path()).unwrap();
        assert_eq!(config.wrist_reference, "Hand");

        let missing = RigConfig::load(Path::new("/nonexistent/rig.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_args_to_config() {
        use clap::Parser;

        let args = ViewerArgs::parse_from(["viewer", "arm.obj", "--joint-step", "2"]);
        let config = args.to_config().unwrap();
        assert_eq!(config.asset, AssetSource::File(PathBuf::from("arm.obj")));
        assert_eq!(config.joint_step, 2.0);

        let args = ViewerArgs::parse_from(["viewer", "--demo"]);
        assert_eq!(args.to_config().unwrap().asset, AssetSource::Demo);

        assert!(ViewerArgs::try_parse_from(["viewer"]).is_err());
        assert!(ViewerArgs::try_parse_from(["viewer", "arm.obj", "--demo"]).is_err());
    }
}
