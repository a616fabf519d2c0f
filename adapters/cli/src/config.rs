use std::{fs, path::Path, time::Duration};

use caveslave_core::TILE_RESOLUTION;
use caveslave_system_motion::{Damping, MotionConfig};
use caveslave_world::WorldSettings;
use serde::Deserialize;
use thiserror::Error;

const MAX_GRID_DIMENSION: u32 = 4096;
const MAX_SUBSTEPS_PER_SECOND: u32 = 10_000;
const MAX_FRAME_DELTA_MS: u64 = 1_000;

/// Errors raised while loading the game configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Top-level configuration assembled from the optional TOML file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) window: WindowConfig,
    pub(crate) grid: GridConfig,
    pub(crate) physics: PhysicsConfig,
    pub(crate) camera: CameraConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WindowConfig {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) vsync: bool,
    pub(crate) show_fps: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            vsync: false,
            show_fps: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridConfig {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) tile_length: f32,
    pub(crate) player_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 64,
            rows: 64,
            tile_length: TILE_RESOLUTION as f32,
            player_size: 8.0,
        }
    }
}

/// How horizontal velocity decays in play mode without input.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum DampingConfig {
    PerFrame { factor: f32 },
    Exponential { half_life: f32 },
}

impl Default for DampingConfig {
    fn default() -> Self {
        Self::PerFrame { factor: 0.1 }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct PhysicsConfig {
    pub(crate) gravity: f32,
    pub(crate) jump_power: f32,
    pub(crate) free_fly_speed: f32,
    pub(crate) max_horizontal_speed: f32,
    pub(crate) max_fall_speed: f32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) substeps_per_second: u32,
    pub(crate) damping: DampingConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 800.0,
            jump_power: 200.0,
            free_fly_speed: 400.0,
            max_horizontal_speed: 100.0,
            max_fall_speed: 600.0,
            max_frame_delta_ms: 250,
            substeps_per_second: 240,
            damping: DampingConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CameraConfig {
    pub(crate) zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { zoom: 2.0 }
    }
}

impl GameConfig {
    /// Reads and validates the configuration stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would produce a degenerate world or simulation.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window", "dimensions must be positive"));
        }
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return Err(invalid("grid", "dimensions must be positive"));
        }
        if self.grid.columns > MAX_GRID_DIMENSION || self.grid.rows > MAX_GRID_DIMENSION {
            return Err(invalid("grid", "dimensions must not exceed 4096"));
        }
        positive("grid.tile_length", self.grid.tile_length)?;
        positive("grid.player_size", self.grid.player_size)?;
        if self.grid.player_size > self.grid.tile_length {
            return Err(invalid(
                "grid.player_size",
                "must not exceed grid.tile_length",
            ));
        }
        positive("physics.max_horizontal_speed", self.physics.max_horizontal_speed)?;
        positive("physics.max_fall_speed", self.physics.max_fall_speed)?;
        positive("physics.free_fly_speed", self.physics.free_fly_speed)?;
        if !self.physics.gravity.is_finite() || !self.physics.jump_power.is_finite() {
            return Err(invalid("physics", "gravity and jump_power must be finite"));
        }
        if !(1..=MAX_SUBSTEPS_PER_SECOND).contains(&self.physics.substeps_per_second) {
            return Err(invalid(
                "physics.substeps_per_second",
                "must lie in 1..=10000",
            ));
        }
        if !(1..=MAX_FRAME_DELTA_MS).contains(&self.physics.max_frame_delta_ms) {
            return Err(invalid("physics.max_frame_delta_ms", "must lie in 1..=1000"));
        }
        match self.physics.damping {
            DampingConfig::PerFrame { factor } if !(0.0..=1.0).contains(&factor) => {
                return Err(invalid("physics.damping.factor", "must lie in 0..=1"));
            }
            DampingConfig::Exponential { half_life } => {
                positive("physics.damping.half_life", half_life)?;
            }
            DampingConfig::PerFrame { .. } => {}
        }
        positive("camera.zoom", self.camera.zoom)?;
        Ok(())
    }

    /// Settings used to construct the world.
    pub(crate) fn world_settings(&self) -> WorldSettings {
        WorldSettings {
            columns: self.grid.columns,
            rows: self.grid.rows,
            tile_length: self.grid.tile_length,
            player_size: self.grid.player_size,
            max_horizontal_speed: self.physics.max_horizontal_speed,
        }
    }

    /// Tunables handed to the motion system.
    pub(crate) fn motion_config(&self) -> MotionConfig {
        let physics = &self.physics;
        MotionConfig {
            gravity: physics.gravity,
            jump_power: physics.jump_power,
            free_fly_speed: physics.free_fly_speed,
            max_fall_speed: physics.max_fall_speed,
            damping: match physics.damping {
                DampingConfig::PerFrame { factor } => Damping::PerFrame { factor },
                DampingConfig::Exponential { half_life } => Damping::Exponential { half_life },
            },
            max_frame_delta: Duration::from_millis(physics.max_frame_delta_ms),
            max_substep: Duration::from_secs_f64(1.0 / f64::from(physics.substeps_per_second)),
        }
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a positive finite number"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<GameConfig, ConfigError> {
        GameConfig::parse(contents, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse("").expect("empty config"), GameConfig::default());
    }

    #[test]
    fn defaults_match_motion_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.motion_config(), MotionConfig::default());
        assert_eq!(config.world_settings(), WorldSettings::default());
    }

    #[test]
    fn partial_tables_override_selected_fields() {
        let config = parse(
            r#"
            [window]
            width = 1280

            [physics]
            gravity = 500.0

            [physics.damping]
            kind = "exponential"
            half_life = 0.08
            "#,
        )
        .expect("valid config");

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.physics.gravity, 500.0);
        assert_eq!(
            config.motion_config().damping,
            Damping::Exponential { half_life: 0.08 }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            parse("[grid]\nwidth = 3\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn degenerate_values_are_rejected() {
        assert!(matches!(
            parse("[grid]\ncolumns = 0\n"),
            Err(ConfigError::Invalid { field: "grid", .. })
        ));
        assert!(matches!(
            parse("[camera]\nzoom = -1.0\n"),
            Err(ConfigError::Invalid {
                field: "camera.zoom",
                ..
            })
        ));
        assert!(matches!(
            parse("[physics.damping]\nkind = \"per_frame\"\nfactor = 3.0\n"),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn player_must_fit_inside_a_tile() {
        assert!(matches!(
            parse("[grid]\nplayer_size = 30.0\n"),
            Err(ConfigError::Invalid {
                field: "grid.player_size",
                ..
            })
        ));
        assert!(parse("[grid]\nplayer_size = 8.0\ntile_length = 8.0\n").is_ok());
        assert!(parse("[grid]\nplayer_size = 12.0\ntile_length = 16.0\n").is_ok());
    }

    #[test]
    fn oversized_grids_and_substep_rates_are_rejected() {
        assert!(matches!(
            parse("[grid]\ncolumns = 100000\nrows = 100000\n"),
            Err(ConfigError::Invalid { field: "grid", .. })
        ));
        assert!(parse("[grid]\ncolumns = 4096\nrows = 4096\n").is_ok());
        assert!(matches!(
            parse("[physics]\nmax_frame_delta_ms = 60000\n"),
            Err(ConfigError::Invalid {
                field: "physics.max_frame_delta_ms",
                ..
            })
        ));
        assert!(matches!(
            parse("[physics]\nsubsteps_per_second = 1000000000\n"),
            Err(ConfigError::Invalid {
                field: "physics.substeps_per_second",
                ..
            })
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("caveslave.toml");
        fs::write(&path, "[camera]\nzoom = 4.0\n").expect("write config");

        let config = GameConfig::load(&path).expect("load config");
        assert_eq!(config.camera.zoom, 4.0);

        assert!(matches!(
            GameConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
