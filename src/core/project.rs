//! SE-014: The project directory: `res://` path mapping, file listing and
//! `project.godot` settings.

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Marker file that makes a directory a project root.
pub const PROJECT_FILE: &str = "project.godot";
pub const RES_PREFIX: &str = "res://";

pub const SCENE_EXTENSIONS: &[&str] = &["tscn", "scn"];
pub const SCRIPT_EXTENSIONS: &[&str] = &["gd"];
pub const RESOURCE_EXTENSIONS: &[&str] = &["tres", "res"];

/// Directories never descended into by the lister.
const SKIPPED_DIRS: &[&str] = &["addons"];

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([A-Za-z0-9_.\-]+)\]\s*$").expect("Invalid regex"));
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_/.\-]+)\s*=\s*(.*)$").expect("Invalid regex"));
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("Invalid regex"));

pub fn is_project_dir(dir: &Path) -> bool {
    dir.join(PROJECT_FILE).is_file()
}

/// Maps project paths (`res://...` or relative) to filesystem paths
/// confined to the project root.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve to a filesystem path. Paths escaping the root are rejected.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err("empty path".to_string());
        }
        let rel = trimmed.strip_prefix(RES_PREFIX).unwrap_or(trimmed);
        let candidate = Path::new(rel);
        let rel = if candidate.is_absolute() {
            candidate
                .strip_prefix(&self.root)
                .map_err(|_| format!("path {} is outside the project root", path))?
        } else {
            candidate
        };

        let mut out = self.root.clone();
        let mut depth = 0usize;
        for component in rel.components() {
            match component {
                Component::Normal(part) => {
                    out.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(format!("path {} escapes the project root", path));
                    }
                    out.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(format!("path {} is outside the project root", path));
                }
            }
        }
        if depth == 0 {
            return Err(format!("path {} names the project root itself", path));
        }
        Ok(out)
    }

    /// `res://` form of a filesystem path under the root.
    pub fn to_res(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(p) => Some(p.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        format!("{}{}", RES_PREFIX, parts.join("/"))
    }
}

/// All files under `root` with one of `extensions`, as sorted `res://`
/// paths. Hidden entries and `addons` are skipped.
pub fn list_files(root: &Path, extensions: &[&str]) -> Result<Vec<String>, String> {
    let paths = ProjectPaths::new(root);
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };
    let mut found = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/**/*.{}", base, ext);
        let entries = glob::glob_with(&pattern, options)
            .map_err(|e| format!("invalid pattern {}: {}", pattern, e))?;
        for entry in entries {
            let path = entry.map_err(|e| format!("cannot list {}: {}", root.display(), e))?;
            let rel = path.strip_prefix(root).unwrap_or(&path);
            let skipped = rel.components().any(|c| match c {
                Component::Normal(p) => {
                    let p = p.to_string_lossy();
                    p.starts_with('.') || SKIPPED_DIRS.contains(&p.as_ref())
                }
                _ => false,
            });
            if !skipped && path.is_file() {
                found.push(paths.to_res(&path));
            }
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

// ============================================================================
// project.godot
// ============================================================================

/// Parsed `project.godot`: global keys live under the `""` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectSettings {
    sections: IndexMap<String, IndexMap<String, String>>,
}

impl ProjectSettings {
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();
        let mut current = String::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some(caps) = SECTION_RE.captures(line) {
                current = caps[1].to_string();
                continue;
            }
            if let Some(caps) = ENTRY_RE.captures(line) {
                settings
                    .sections
                    .entry(current.clone())
                    .or_default()
                    .insert(caps[1].to_string(), caps[2].trim().to_string());
            }
        }
        settings
    }

    pub fn load(root: &Path) -> Result<Self, String> {
        let path = root.join(PROJECT_FILE);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Ok(Self::parse(&text))
    }

    /// Raw value text of `key` in `section`.
    pub fn raw(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// First quoted string in the value, or the raw value if unquoted.
    pub fn string(&self, section: &str, key: &str) -> Option<String> {
        let raw = self.raw(section, key)?;
        Some(quoted(raw).into_iter().next().unwrap_or_else(|| raw.to_string()))
    }

    /// Every quoted string in the value (`PackedStringArray("4.2", "GL")`).
    pub fn strings(&self, section: &str, key: &str) -> Vec<String> {
        self.raw(section, key).map(quoted).unwrap_or_default()
    }
}

fn quoted(raw: &str) -> Vec<String> {
    QUOTED_RE
        .captures_iter(raw)
        .map(|c| c[1].replace("\\\"", "\"").replace("\\\\", "\\"))
        .collect()
}

/// Summary reported by `get_project_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_scene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_version: Option<i64>,
    pub features: Vec<String>,
    pub scene_count: usize,
    pub script_count: usize,
    pub resource_count: usize,
}

impl ProjectInfo {
    pub fn gather(root: &Path) -> Result<Self, String> {
        let settings = ProjectSettings::load(root)?;
        let fallback_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name: settings
                .string("application", "config/name")
                .unwrap_or(fallback_name),
            path: root.display().to_string(),
            main_scene: settings.string("application", "run/main_scene"),
            config_version: settings
                .raw("", "config_version")
                .and_then(|v| v.parse().ok()),
            features: settings.strings("application", "config/features"),
            scene_count: list_files(root, SCENE_EXTENSIONS)?.len(),
            script_count: list_files(root, SCRIPT_EXTENSIONS)?.len(),
            resource_count: list_files(root, RESOURCE_EXTENSIONS)?.len(),
        })
    }
}
