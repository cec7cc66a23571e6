//! Camera device discovery & environment checks for `doctor`.

use std::{fs, path::Path};

use crate::config::ConfigState;

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
}

/// V4L2 capture nodes under `/dev`, with the kernel's device name when sysfs
/// has one.
pub fn discover_cameras() -> Vec<DeviceInfo> {
    discover_in(Path::new("/dev"), Path::new("/sys/class/video4linux"))
}

fn discover_in(dev: &Path, sysfs: &Path) -> Vec<DeviceInfo> {
    let mut out = vec![];
    if let Ok(rd) = fs::read_dir(dev) {
        for e in rd.flatten() {
            let p = e.path();
            let Some(node) = p.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_video_node(node) {
                continue;
            }
            let name = fs::read_to_string(sysfs.join(node).join("name"))
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            out.push(DeviceInfo {
                path: p.display().to_string(),
                name,
            });
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

fn is_video_node(name: &str) -> bool {
    name.strip_prefix("video")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn user_in_group(group_file: &str, group: &str, user: &str) -> bool {
    let prefix = format!("{group}:");
    group_file
        .lines()
        .filter(|l| l.starts_with(&prefix))
        .any(|l| l.split(':').nth(3).unwrap_or("").split(',').any(|u| u == user))
}

fn check_in_video_group() -> bool {
    match fs::read_to_string("/etc/group") {
        Ok(s) => user_in_group(&s, "video", &whoami::username()),
        Err(_) => false,
    }
}

pub fn doctor_report(cfg: &ConfigState) -> serde_json::Value {
    let cameras: Vec<String> = discover_cameras()
        .into_iter()
        .map(|d| format!("{} ({})", d.name, d.path))
        .collect();
    serde_json::json!({
        "cameras": cameras,
        "video_group_member": check_in_video_group(),
        "config_dir": cfg.config_dir,
        "profiles_dir": cfg.profiles_dir,
        "active_profile": cfg.active_name,
        "profiles": cfg.list_profiles(),
        "hints": {
            "add_user_to_video_group": "sudo usermod -aG video $USER && newgrp video",
            "replay": "fingerspell run --replay <recording.jsonl>"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_node_names() {
        assert!(is_video_node("video0"));
        assert!(is_video_node("video12"));
        assert!(!is_video_node("video"));
        assert!(!is_video_node("video0p1"));
        assert!(!is_video_node("media0"));
    }

    #[test]
    fn group_membership() {
        let groups = "input:x:104:alice\nvideo:x:44:bob,carol\nvideos:x:45:dave\n";
        assert!(user_in_group(groups, "video", "carol"));
        assert!(user_in_group(groups, "video", "bob"));
        assert!(!user_in_group(groups, "video", "alice"));
        assert!(!user_in_group(groups, "video", "dave"));
    }

    #[test]
    fn discovers_nodes_with_sysfs_names() {
        let root = std::env::temp_dir().join(format!("fingerspell-dev-{}", std::process::id()));
        let dev = root.join("dev");
        let sys = root.join("sys");
        fs::create_dir_all(&dev).unwrap();
        fs::create_dir_all(sys.join("video0")).unwrap();
        fs::write(dev.join("video0"), b"").unwrap();
        fs::write(dev.join("video1"), b"").unwrap();
        fs::write(dev.join("null"), b"").unwrap();
        fs::write(sys.join("video0").join("name"), "Integrated Camera\n").unwrap();

        let found = discover_in(&dev, &sys);
        let _ = fs::remove_dir_all(&root);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "Integrated Camera");
        assert!(found[0].path.ends_with("video0"));
        assert_eq!(found[1].name, "unknown");
    }
}
