use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::pipeline::ModelOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
    pub bend_angle_deg: f64,
    pub tick_ms: u64,
    pub run_length: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Model {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

fn default_initial_char() -> char {
    'A'
}

#[derive(Debug, Clone, Deserialize)]
pub struct Behavior {
    #[serde(default)]
    pub reset_on_missed_detection: bool,
    #[serde(default = "default_initial_char")]
    pub initial_char: char,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            reset_on_missed_detection: false,
            initial_char: default_initial_char(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    pub model: Model,
    #[serde(default)]
    pub behavior: Behavior,
}

impl Profile {
    pub fn parse(txt: &str) -> Result<Self> {
        let p: Profile = toml::from_str(txt)?;
        validate_profile(&p)?;
        Ok(p)
    }

    pub fn bundled() -> Result<Self> {
        Self::parse(default_profile_text())
    }

    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            min_detection_confidence: self.model.min_detection_confidence,
            min_tracking_confidence: self.model.min_tracking_confidence,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigState {
    pub active_name: String,
    pub profile: Profile,
    pub config_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub active_ptr: PathBuf,
}

pub fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("fingerspell"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    pub fn load_or_install_default() -> Result<Self> {
        Self::load_from(config_dir()?)
    }

    /// Load from `cfgdir`, installing the bundled profile and the active
    /// pointer on first use.
    pub fn load_from(cfgdir: PathBuf) -> Result<Self> {
        let profdir = cfgdir.join("profiles");
        fs::create_dir_all(&profdir)?;

        let def_path = profdir.join("default.toml");
        if !def_path.exists() {
            fs::write(&def_path, default_profile_text())?;
            info!("installed default profile at {}", def_path.display());
        }

        let active_ptr = cfgdir.join("active");
        if !active_ptr.exists() {
            fs::write(&active_ptr, b"default")?;
        }

        let active_name = fs::read_to_string(&active_ptr)?.trim().to_string();
        let profile = load_profile(&profdir, &active_name)?;

        Ok(Self {
            active_name,
            profile,
            config_dir: cfgdir,
            profiles_dir: profdir,
            active_ptr,
        })
    }

    /// Load a profile by name without changing the active pointer.
    pub fn profile_named(&self, name: &str) -> Result<Profile> {
        load_profile(&self.profiles_dir, name)
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        let profile = load_profile(&self.profiles_dir, name)?;
        fs::write(&self.active_ptr, name.as_bytes())?;
        self.active_name = name.to_string();
        self.profile = profile;
        Ok(())
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let p = e.path();
                if p.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }
}

fn load_profile(profdir: &Path, name: &str) -> Result<Profile> {
    let path = profdir.join(format!("{name}.toml"));
    if !path.exists() {
        return Err(anyhow!("profile not found: {}", path.display()));
    }
    let txt = fs::read_to_string(&path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    Profile::parse(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))
}

fn validate_profile(p: &Profile) -> Result<()> {
    let t = &p.thresholds;
    if !(t.bend_angle_deg > 0.0 && t.bend_angle_deg <= 180.0) {
        return Err(anyhow!("thresholds.bend_angle_deg must be in (0, 180]"));
    }
    if t.tick_ms == 0 {
        return Err(anyhow!("thresholds.tick_ms must be a positive duration"));
    }
    if t.run_length == 0 {
        return Err(anyhow!("thresholds.run_length must be at least 1"));
    }

    for (key, v) in [
        ("min_detection_confidence", p.model.min_detection_confidence),
        ("min_tracking_confidence", p.model.min_tracking_confidence),
    ] {
        if !(0.0..=1.0).contains(&v) {
            return Err(anyhow!("model.{key} must be in [0, 1]"));
        }
    }

    if u32::from(p.behavior.initial_char) > 0xFF {
        return Err(anyhow!(
            "behavior.initial_char must be a single-byte code point, got {:?}",
            p.behavior.initial_char
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("fingerspell-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn bundled_profile_matches_defaults() {
        let p = Profile::bundled().unwrap();
        assert_eq!(p.meta.name.as_deref(), Some("default"));
        assert_eq!(p.thresholds.bend_angle_deg, 160.0);
        assert_eq!(p.thresholds.tick_ms, 750);
        assert_eq!(p.thresholds.run_length, 3);
        assert_eq!(p.model_options(), ModelOptions::default());
        assert!(!p.behavior.reset_on_missed_detection);
        assert_eq!(p.behavior.initial_char, 'A');
    }

    #[test]
    fn behavior_section_is_optional() {
        let p = Profile::parse(
            r#"
            [meta]
            [thresholds]
            bend_angle_deg = 150.0
            tick_ms = 500
            run_length = 4
            [model]
            min_detection_confidence = 0.7
            min_tracking_confidence = 0.4
            "#,
        )
        .unwrap();
        assert_eq!(p.meta.name, None);
        assert_eq!(p.behavior.initial_char, 'A');
    }

    #[test]
    fn rejects_bad_values() {
        let base = default_profile_text();
        for (from, to) in [
            ("tick_ms = 750", "tick_ms = 0"),
            ("run_length = 3", "run_length = 0"),
            ("bend_angle_deg = 160.0", "bend_angle_deg = 200.0"),
            ("min_tracking_confidence = 0.5", "min_tracking_confidence = 1.5"),
            ("initial_char = \"A\"", "initial_char = \"\u{263a}\""),
        ] {
            let txt = base.replace(from, to);
            assert_ne!(txt, base, "pattern {from} not in bundled profile");
            assert!(Profile::parse(&txt).is_err(), "accepted {to}");
        }
    }

    #[test]
    fn installs_and_switches_profiles() {
        let dir = scratch_dir("cfg");
        let mut st = ConfigState::load_from(dir.clone()).unwrap();
        assert_eq!(st.active_name, "default");
        assert_eq!(st.list_profiles(), vec!["default".to_string()]);

        let slow = default_profile_text().replace("tick_ms = 750", "tick_ms = 1500");
        fs::write(st.profiles_dir.join("slow.toml"), slow).unwrap();
        assert_eq!(st.profile_named("slow").unwrap().thresholds.tick_ms, 1500);
        assert_eq!(st.active_name, "default");

        st.set_active("slow").unwrap();
        assert_eq!(st.profile.thresholds.tick_ms, 1500);
        assert!(st.set_active("missing").is_err());
        assert_eq!(st.active_name, "slow");

        let reloaded = ConfigState::load_from(dir.clone()).unwrap();
        assert_eq!(reloaded.active_name, "slow");
        let _ = fs::remove_dir_all(dir);
    }
}
