//! Run configuration.
//!
//! Each component receives an explicit config value; nothing reads global
//! state. Values come from [`Default`], optionally overlaid by a YAML file
//! ([`ConfigFile::load`]) and finally by CLI flags.
//!
//! ```yaml
//! pipeline:
//!   extensions: [jpg, jpeg, png]
//!   concurrency: 4
//!   progress_every: 100
//!   background: "#000000"
//!   suffixes:
//!     rot90: _aug_rot90
//!     rot180: _aug_rot180
//!     rot270: _aug_rot270
//!     mirror: _aug_mirror
//! convert:
//!   splits: [train, val, test]
//!   primary_split: train
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::PrepError;

/// Top-level layout of a `--config` YAML file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub pipeline: PipelineConfig,
    pub convert: ConvertConfig,
}

impl ConfigFile {
    /// Reads and parses a YAML config file; unknown keys are rejected.
    pub fn load(path: &Path) -> Result<Self, PrepError> {
        let data = fs::read_to_string(path).map_err(|source| PrepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&data).map_err(|source| PrepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Settings shared by the letterbox and augmentation batches.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_root: Option<PathBuf>,

    /// Letterbox: required. Augmentation: variants go beside the source when unset.
    pub output_root: Option<PathBuf>,

    /// Recognized image extensions, compared case-insensitively.
    pub extensions: Vec<String>,

    pub suffixes: AugmentSuffixes,

    /// Letterbox canvas colour.
    pub background: RgbColor,

    /// Worker threads; 0 means one per CPU.
    pub concurrency: usize,

    /// Log progress every N processed files; 0 disables progress lines.
    pub progress_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_root: None,
            output_root: None,
            extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            suffixes: AugmentSuffixes::default(),
            background: RgbColor::BLACK,
            concurrency: 0,
            progress_every: 100,
        }
    }
}

impl PipelineConfig {
    /// Checks the extension list and the augmentation suffixes.
    pub fn validate(&self) -> Result<(), PrepError> {
        if self.extensions.is_empty() {
            return Err(PrepError::InvalidConfig(
                "at least one image extension is required".to_string(),
            ));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(PrepError::InvalidConfig(format!(
                "invalid extension '{ext}'; use bare extensions such as 'jpg'"
            )));
        }
        self.suffixes.validate()
    }

    /// Whether `ext` (without the dot) is in the recognized set.
    pub fn is_recognized_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    /// The input root, or a config error naming the missing setting.
    pub fn require_input_root(&self) -> Result<&Path, PrepError> {
        self.input_root
            .as_deref()
            .ok_or_else(|| PrepError::InvalidConfig("input root is not set".to_string()))
    }

    /// The output root, or a config error naming the missing setting.
    pub fn require_output_root(&self) -> Result<&Path, PrepError> {
        self.output_root
            .as_deref()
            .ok_or_else(|| PrepError::InvalidConfig("output root is not set".to_string()))
    }
}

/// File-name suffixes appended to the stem of each augmentation variant.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentSuffixes {
    pub rot90: String,
    pub rot180: String,
    pub rot270: String,
    pub mirror: String,
}

impl Default for AugmentSuffixes {
    fn default() -> Self {
        Self {
            rot90: "_aug_rot90".into(),
            rot180: "_aug_rot180".into(),
            rot270: "_aug_rot270".into(),
            mirror: "_aug_mirror".into(),
        }
    }
}

impl AugmentSuffixes {
    /// The four suffixes in variant order.
    pub fn all(&self) -> [&str; 4] {
        [&self.rot90, &self.rot180, &self.rot270, &self.mirror]
    }

    fn validate(&self) -> Result<(), PrepError> {
        let all = self.all();
        for (i, suffix) in all.iter().enumerate() {
            if suffix.is_empty() {
                return Err(PrepError::InvalidConfig(
                    "augmentation suffixes must not be empty".to_string(),
                ));
            }
            if suffix.contains(['/', '\\', '.']) {
                return Err(PrepError::InvalidConfig(format!(
                    "augmentation suffix '{suffix}' must not contain '/', '\\' or '.'"
                )));
            }
            if all[..i].contains(suffix) {
                return Err(PrepError::InvalidConfig(format!(
                    "augmentation suffix '{suffix}' is used twice"
                )));
            }
        }
        Ok(())
    }
}

/// An opaque RGB colour, parsed from `r,g,b` or `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    pub const BLACK: RgbColor = RgbColor([0, 0, 0]);
}

impl FromStr for RgbColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("invalid colour '{s}'; expected #rrggbb"));
            }
            let mut rgb = [0u8; 3];
            for (i, channel) in rgb.iter_mut().enumerate() {
                *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                    .map_err(|_| format!("invalid colour '{s}'; expected #rrggbb"))?;
            }
            return Ok(RgbColor(rgb));
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("invalid colour '{s}'; expected r,g,b or #rrggbb"));
        }
        let mut rgb = [0u8; 3];
        for (channel, part) in rgb.iter_mut().zip(&parts) {
            *channel = part
                .parse::<u8>()
                .map_err(|_| format!("invalid colour component '{part}'; expected 0-255"))?;
        }
        Ok(RgbColor(rgb))
    }
}

impl TryFrom<String> for RgbColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

/// Settings for a COCO to YOLO conversion run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Directory holding `<split>.json` documents.
    pub annotations_dir: PathBuf,

    /// Root that `file_name` entries are resolved against.
    pub images_dir: PathBuf,

    pub output_root: PathBuf,

    /// Splits to convert, in order.
    pub splits: Vec<String>,

    /// The split whose run writes `data.yaml`. A run that does not include
    /// it leaves any existing manifest untouched.
    pub primary_split: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            annotations_dir: PathBuf::from("annotations"),
            images_dir: PathBuf::from("images"),
            output_root: PathBuf::from("dataset"),
            splits: vec!["train".into(), "val".into(), "test".into()],
            primary_split: "train".into(),
        }
    }
}

impl ConvertConfig {
    /// Rejects an empty split list, path-like split names and duplicates.
    pub fn validate(&self) -> Result<(), PrepError> {
        if self.splits.is_empty() {
            return Err(PrepError::InvalidConfig(
                "at least one split is required".to_string(),
            ));
        }
        for (i, split) in self.splits.iter().enumerate() {
            if split.is_empty() || split.contains(['/', '\\']) || split == "." || split == ".." {
                return Err(PrepError::InvalidConfig(format!(
                    "invalid split name '{split}'"
                )));
            }
            if self.splits[..i].contains(split) {
                return Err(PrepError::InvalidConfig(format!(
                    "split '{split}' is listed twice"
                )));
            }
        }
        Ok(())
    }

    /// Annotation document path for `split`.
    pub fn annotation_path(&self, split: &str) -> PathBuf {
        self.annotations_dir.join(format!("{split}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_triplets_and_hex() {
        assert_eq!("0,0,0".parse::<RgbColor>(), Ok(RgbColor([0, 0, 0])));
        assert_eq!(" 114, 114 ,114".parse::<RgbColor>(), Ok(RgbColor([114, 114, 114])));
        assert_eq!("#ff8000".parse::<RgbColor>(), Ok(RgbColor([255, 128, 0])));
        assert!("256,0,0".parse::<RgbColor>().is_err());
        assert!("#fff".parse::<RgbColor>().is_err());
        assert!("1,2".parse::<RgbColor>().is_err());
    }

    #[test]
    fn colour_displays_as_hex() {
        assert_eq!(RgbColor([255, 128, 0]).to_string(), "#ff8000");
    }

    #[test]
    fn yaml_overrides_only_given_fields() {
        let yaml = r#"
pipeline:
  concurrency: 2
  background: "10,20,30"
  suffixes:
    mirror: _flip
convert:
  splits: [train, val]
"#;
        let config: ConfigFile = serde_yaml::from_str(yaml).expect("parse config");

        assert_eq!(config.pipeline.concurrency, 2);
        assert_eq!(config.pipeline.background, RgbColor([10, 20, 30]));
        assert_eq!(config.pipeline.suffixes.mirror, "_flip");
        assert_eq!(config.pipeline.suffixes.rot90, "_aug_rot90");
        assert_eq!(config.pipeline.extensions, vec!["jpg", "jpeg", "png"]);
        assert_eq!(config.convert.splits, vec!["train", "val"]);
        assert_eq!(config.convert.primary_split, "train");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = serde_yaml::from_str::<ConfigFile>("pipeline:\n  workers: 3\n").unwrap_err();
        assert!(err.to_string().contains("workers"), "{err}");
    }

    #[test]
    fn duplicate_suffixes_are_invalid() {
        let mut config = PipelineConfig::default();
        config.suffixes.rot270 = config.suffixes.rot90.clone();
        assert!(matches!(config.validate(), Err(PrepError::InvalidConfig(_))));
    }

    #[test]
    fn extension_match_ignores_case() {
        let config = PipelineConfig::default();
        assert!(config.is_recognized_extension("JPG"));
        assert!(!config.is_recognized_extension("bmp"));
    }

    #[test]
    fn split_names_must_be_plain() {
        let config = ConvertConfig {
            splits: vec!["train".into(), "../escape".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(
            ConvertConfig::default().annotation_path("val"),
            PathBuf::from("annotations").join("val.json")
        );
    }

    #[test]
    fn load_reports_missing_file_as_config_read() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = ConfigFile::load(&temp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, PrepError::ConfigRead { .. }));
    }
}
