use crate::error::Result as SimResult;
use crate::model::{default_circular_bodies, default_elliptical_bodies, Body};
use crate::moon::{MoonSim, DEFAULT_CYCLE_LENGTH};
use crate::orbit::{OrbitKind, OrbitSim, DEFAULT_ELLIPSE_RATIO};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const ORBIT_SCALE_MIN: f64 = 50.0;
pub const ORBIT_SCALE_MAX: f64 = 150.0;

pub fn clamp_scale(v: f64) -> f64 {
    if v.is_nan() {
        return 100.0;
    }
    v.clamp(ORBIT_SCALE_MIN, ORBIT_SCALE_MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Orbit,
    Moon,
    Today,
}

impl ViewKind {
    pub fn next(self) -> Self {
        match self {
            ViewKind::Orbit => ViewKind::Moon,
            ViewKind::Moon => ViewKind::Today,
            ViewKind::Today => ViewKind::Orbit,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Orbit => "Planetary Orbits",
            ViewKind::Moon => "Moon Phases",
            ViewKind::Today => "Today's Moon",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub model: OrbitKind,
    pub speed: f64,
    /// Display only: percent of the half-view the outermost ring spans.
    pub scale: f64,
    pub ellipse_ratio: f64,
    /// Replaces the model's default body set when present.
    pub bodies: Option<Vec<Body>>,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            model: OrbitKind::Circular,
            speed: 1.0,
            scale: 100.0,
            ellipse_ratio: DEFAULT_ELLIPSE_RATIO,
            bodies: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MoonSettings {
    pub cycle_length: f64,
    pub speed: f64,
    /// Cycle day the animation opens on; folded into the cycle.
    pub initial_phase: f64,
}

impl Default for MoonSettings {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            speed: 1.0,
            initial_phase: 0.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    pub autoplay: bool,
    pub start_view: ViewKind,
    pub seed: u64,
    pub orbit: OrbitSettings,
    pub moon: MoonSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            autoplay: true,
            start_view: ViewKind::Orbit,
            seed: 0x5A17_5A17,
            orbit: OrbitSettings::default(),
            moon: MoonSettings::default(),
        }
    }
}

/// Command-line values that win over the settings file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub view: Option<ViewKind>,
    pub model: Option<OrbitKind>,
    pub speed: Option<f64>,
    pub scale: Option<f64>,
    pub cycle_length: Option<f64>,
    pub initial_phase: Option<f64>,
    pub fps: Option<u32>,
    pub paused: bool,
    pub mono: bool,
}

impl Settings {
    pub fn apply(&mut self, o: &Overrides) {
        if let Some(v) = o.view {
            self.start_view = v;
        }
        if let Some(m) = o.model {
            self.orbit.model = m;
        }
        if let Some(s) = o.speed {
            self.orbit.speed = s;
            self.moon.speed = s;
        }
        if let Some(s) = o.scale {
            self.orbit.scale = s;
        }
        if let Some(c) = o.cycle_length {
            self.moon.cycle_length = c;
        }
        if let Some(p) = o.initial_phase {
            self.moon.initial_phase = p;
        }
        if let Some(f) = o.fps {
            self.fps_cap = f;
        }
        if o.paused {
            self.autoplay = false;
        }
        if o.mono {
            self.enable_color = false;
        }
        self.orbit.scale = clamp_scale(self.orbit.scale);
        self.fps_cap = self.fps_cap.clamp(10, 240);
    }

    pub fn bodies_for(&self, kind: OrbitKind) -> Vec<Body> {
        match (&self.orbit.bodies, kind) {
            (Some(custom), _) => custom.clone(),
            (None, OrbitKind::Circular) => default_circular_bodies(),
            (None, OrbitKind::Elliptical) => default_elliptical_bodies(),
        }
    }

    pub fn orbit_sim(&self, kind: OrbitKind) -> SimResult<OrbitSim> {
        OrbitSim::new(kind, self.bodies_for(kind), self.orbit.ellipse_ratio)
    }

    pub fn moon_sim(&self) -> SimResult<MoonSim> {
        MoonSim::new(self.moon.cycle_length)
    }

    /// Build both simulators once so bad config fails before the terminal is taken over.
    pub fn validate(&self) -> SimResult<()> {
        self.orbit_sim(OrbitKind::Circular)?;
        self.orbit_sim(OrbitKind::Elliptical)?;
        self.moon_sim()?;
        Ok(())
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "lunarium", "Lunarium")
        .context("could not resolve project directories")?;
    let dir = proj.config_dir().to_path_buf();
    Ok(Paths {
        settings_path: dir.join("settings.json"),
    })
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed settings");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// For a path the user named explicitly: any failure is an error.
pub fn load_settings_strict(path: &Path) -> Result<Settings> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing settings in {}", path.display()))
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

/// Writes defaults unless a file is already there. Returns whether it wrote.
pub fn write_default_settings(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_settings_atomic(path, &Settings::default())?;
    Ok(true)
}

pub fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename-over-existing is not atomic on Windows; remove first
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn overrides_win_and_clamp() {
        let mut s = Settings::default();
        s.apply(&Overrides {
            view: Some(ViewKind::Moon),
            model: Some(OrbitKind::Elliptical),
            speed: Some(2.5),
            scale: Some(400.0),
            fps: Some(1000),
            paused: true,
            mono: true,
            ..Overrides::default()
        });
        assert_eq!(s.start_view, ViewKind::Moon);
        assert_eq!(s.orbit.model, OrbitKind::Elliptical);
        assert_eq!(s.moon.speed, 2.5);
        assert_eq!(s.orbit.scale, ORBIT_SCALE_MAX);
        assert_eq!(s.fps_cap, 240);
        assert!(!s.autoplay);
        assert!(!s.enable_color);
    }

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut s = Settings::default();
        s.moon.cycle_length = 27.3;
        s.orbit.model = OrbitKind::Elliptical;
        save_settings_atomic(&path, &s).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let back = load_settings(&path);
        assert_eq!(back.moon.cycle_length, 27.3);
        assert_eq!(back.orbit.model, OrbitKind::Elliptical);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "moon": { "cycle_length": 10.0 } }"#).unwrap();
        let s = load_settings_strict(&path).unwrap();
        assert_eq!(s.moon.cycle_length, 10.0);
        assert_eq!(s.moon.speed, 1.0);
        assert_eq!(s.moon.initial_phase, 0.0);
        assert_eq!(s.fps_cap, 30);
    }

    #[test]
    fn malformed_file_is_lenient_unless_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings(&path).fps_cap, 30);
        assert!(load_settings_strict(&path).is_err());
        assert!(load_settings_strict(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn default_settings_are_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom").join("lunarium.json");
        assert!(write_default_settings(&path).unwrap());
        fs::write(&path, r#"{ "fps_cap": 60 }"#).unwrap();
        assert!(!write_default_settings(&path).unwrap());
        assert_eq!(load_settings_strict(&path).unwrap().fps_cap, 60);
    }

    #[test]
    fn validate_reports_bad_cycle_once() {
        let mut s = Settings::default();
        s.moon.cycle_length = 0.0;
        assert_eq!(s.validate().unwrap_err(), SimError::InvalidCycleLength(0.0));
    }

    #[test]
    fn custom_bodies_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "orbit": { "bodies": [
                { "name": "Io", "orbital_radius": 0.5, "angular_speed": 3.0,
                  "color": { "r": 250, "g": 220, "b": 80 }, "size": 4.0 }
            ] } }"#,
        )
        .unwrap();
        let s = load_settings_strict(&path).unwrap();
        let sim = s.orbit_sim(OrbitKind::Elliptical).unwrap();
        assert_eq!(sim.bodies().len(), 1);
        assert_eq!(sim.bodies()[0].initial_angle, 0.0);
    }
}
