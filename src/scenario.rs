use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::{
    engine::{DEFAULT_DEPTH, DEFAULT_WIDTH},
    seeding::{ResetError, SeedSpec},
    species::{Species, SpeciesError, SpeciesTable},
    terrain::TerrainLayoutConfig,
};

const DEFAULT_TICKS: u64 = 500;

fn default_seed() -> u64 {
    42
}

fn default_depth() -> i64 {
    DEFAULT_DEPTH as i64
}

fn default_width() -> i64 {
    DEFAULT_WIDTH as i64
}

fn default_level() -> String {
    "info".to_string()
}

fn default_report_interval() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub spawn: SeedSpec,
    #[serde(default)]
    pub terrain: TerrainLayoutConfig,
    #[serde(default)]
    pub species: SpeciesTable,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Field dimensions as written in the file; non-positive values are
/// replaced when the engine is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "default_depth")]
    pub depth: i64,
    #[serde(default = "default_width")]
    pub width: i64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            width: default_width(),
        }
    }
}

impl FieldConfig {
    pub fn dimensions(&self) -> (usize, usize) {
        match (usize::try_from(self.depth), usize::try_from(self.width)) {
            (Ok(depth), Ok(width)) if depth > 0 && width > 0 => (depth, width),
            _ => {
                warn!(
                    depth = self.depth,
                    width = self.width,
                    "field dimensions must be positive, using {DEFAULT_DEPTH}x{DEFAULT_WIDTH}"
                );
                (DEFAULT_DEPTH, DEFAULT_WIDTH)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Ticks between population reports; 0 disables them.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            report_interval: default_report_interval(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("line {line}: expected key=value, key: value or key value, found '{text}'")]
    Malformed { line: usize, text: String },
    #[error("line {line}: unable to parse {kind} from '{value}'")]
    Value {
        line: usize,
        kind: &'static str,
        value: String,
    },
    #[error("invalid species table: {0}")]
    Species(#[from] SpeciesError),
    #[error("invalid spawn probabilities: {0}")]
    Spawn(#[from] ResetError),
}

impl Scenario {
    /// A scenario with every default filled in.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            seed: default_seed(),
            ticks: None,
            field: FieldConfig::default(),
            spawn: SeedSpec::default(),
            terrain: TerrainLayoutConfig::default(),
            species: SpeciesTable::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(DEFAULT_TICKS)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.species.validate()?;
        self.spawn.validate()?;
        Ok(())
    }

    /// Parse the flat `key=value` format. Keys that are absent keep their
    /// defaults; unknown keys are logged and skipped.
    pub fn from_properties(name: &str, text: &str) -> Result<Self, ScenarioError> {
        Parser::new(text).parse(Self::named(name))
    }

    /// Write the keys understood by [`Scenario::from_properties`].
    pub fn to_properties(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "simulation.name={}", self.name);
        let _ = writeln!(out, "simulation.seed={}", self.seed);
        let _ = writeln!(out, "simulation.steps={}", self.ticks(None));
        let _ = writeln!(out, "field.width={}", self.field.width);
        let _ = writeln!(out, "field.height={}", self.field.depth);
        for species in Species::ALL {
            let _ = writeln!(
                out,
                "animal.{species}.probability={}",
                self.spawn.probability(species)
            );
        }
        out
    }
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text.lines().collect();
        Self { lines, index: 0 }
    }

    fn parse(&mut self, mut scenario: Scenario) -> Result<Scenario, ScenarioError> {
        while let Some((line, raw)) = self.next_line() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            let Some((key, value)) = split_entry(trimmed) else {
                return Err(ScenarioError::Malformed {
                    line,
                    text: trimmed.to_string(),
                });
            };

            match key.trim() {
                "simulation.name" => scenario.name = clean_string(value),
                "simulation.seed" => scenario.seed = parse_u64(line, value)?,
                "simulation.steps" => scenario.ticks = Some(parse_u64(line, value)?),
                "field.width" => scenario.field.width = parse_i64(line, value)?,
                "field.height" | "field.depth" => scenario.field.depth = parse_i64(line, value)?,
                other => match spawn_key(other) {
                    Some(species) => scenario
                        .spawn
                        .set_probability(species, parse_f64(line, value)?),
                    None => warn!(line, key = other, "ignoring unknown configuration key"),
                },
            }
        }
        Ok(scenario)
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = *self.lines.get(self.index)?;
        self.index += 1;
        Some((self.index, line))
    }
}

/// Split `key=value`, `key: value` or `key value`. The key ends at the first
/// separator; one `=` or `:` after surrounding blanks belongs to it.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let end = line.find(|c: char| c == '=' || c == ':' || c.is_whitespace())?;
    let (key, rest) = line.split_at(end);
    let rest = rest.trim_start();
    let value = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    Some((key, value.trim()))
}

fn spawn_key(key: &str) -> Option<Species> {
    let name = key.strip_prefix("animal.")?.strip_suffix(".probability")?;
    Species::ALL.into_iter().find(|species| species.name() == name)
}

fn parse_u64(line: usize, value: &str) -> Result<u64, ScenarioError> {
    value.parse::<u64>().map_err(|_| ScenarioError::Value {
        line,
        kind: "unsigned integer",
        value: value.to_string(),
    })
}

fn parse_i64(line: usize, value: &str) -> Result<i64, ScenarioError> {
    value.parse::<i64>().map_err(|_| ScenarioError::Value {
        line,
        kind: "integer",
        value: value.to_string(),
    })
}

fn parse_f64(line: usize, value: &str) -> Result<f64, ScenarioError> {
    value.parse::<f64>().map_err(|_| ScenarioError::Value {
        line,
        kind: "float",
        value: value.to_string(),
    })
}

fn clean_string(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Load and validate a scenario. `.txt` and `.properties` files use the
    /// flat key-value format, anything else is read as YAML.
    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;

        let key_value = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("txt" | "properties")
        );
        let scenario = if key_value {
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("scenario");
            Scenario::from_properties(stem, &data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_yaml::from_str::<Scenario>(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };

        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;

    #[test]
    fn test_yaml_defaults() {
        let scenario: Scenario = serde_yaml::from_str("name: bare\n").unwrap();
        assert_eq!(scenario.seed, 42);
        assert_eq!(scenario.ticks(None), 500);
        assert_eq!(scenario.ticks(Some(7)), 7);
        assert_eq!(scenario.field.dimensions(), (50, 50));
        assert_eq!(scenario.spawn, SeedSpec::default());
        assert_eq!(scenario.species, SpeciesTable::default());
        assert_eq!(scenario.logging.report_interval, 50);
    }

    #[test]
    fn test_yaml_overrides() {
        let text = r#"
name: tuned
seed: 9
ticks: 20
field:
  depth: 12
  width: 8
spawn:
  rabbit: 0.5
  human: 0.0
terrain:
  kind: uniform
  terrain: plains
species:
  fox:
    max_age: 40
    breeding_age: 4
    breeding_probability: 0.3
    max_litter_size: 2
    food_cap: 9
    diet:
      - species: rabbit
        feed_value: 6
"#;
        let scenario: Scenario = serde_yaml::from_str(text).unwrap();
        assert_eq!(scenario.field.dimensions(), (12, 8));
        assert_eq!(scenario.spawn.rabbit, 0.5);
        assert_eq!(scenario.spawn.fox, 0.02);
        assert_eq!(
            scenario.terrain,
            TerrainLayoutConfig::Uniform {
                terrain: Terrain::Plains
            }
        );
        assert_eq!(scenario.species.fox.food_cap, Some(9));
        assert_eq!(scenario.species.lion, crate::species::SpeciesConfig::lion());
        scenario.validate().unwrap();
    }

    #[test]
    fn test_non_positive_dimensions_fall_back() {
        let field = FieldConfig {
            depth: -3,
            width: 10,
        };
        assert_eq!(field.dimensions(), (DEFAULT_DEPTH, DEFAULT_WIDTH));
        let field = FieldConfig { depth: 4, width: 0 };
        assert_eq!(field.dimensions(), (DEFAULT_DEPTH, DEFAULT_WIDTH));
    }

    #[test]
    fn test_properties_format() {
        let text = "\
# saved field
field.width=30
field.height = 20
animal.rabbit.probability=0.1
animal.human.probability=0
simulation.steps=250
simulation.seed=5
colour.scheme=dark
";
        let scenario = Scenario::from_properties("saved", text).unwrap();
        assert_eq!(scenario.name, "saved");
        assert_eq!(scenario.field.dimensions(), (20, 30));
        assert_eq!(scenario.spawn.rabbit, 0.1);
        assert_eq!(scenario.spawn.human, 0.0);
        assert_eq!(scenario.spawn.lion, 0.005);
        assert_eq!(scenario.ticks(None), 250);
        assert_eq!(scenario.seed, 5);
    }

    #[test]
    fn test_properties_errors_name_the_line() {
        let err = Scenario::from_properties("x", "field.width=30\nfield.height=tall\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Value { line: 2, .. }), "{err}");

        let err = Scenario::from_properties("x", "orphan\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Malformed { line: 1, .. }), "{err}");
    }

    #[test]
    fn test_properties_accept_colon_and_blank_separators() {
        let text = "\
field.width: 30
field.height 20
simulation.seed =7
animal.fox.probability:0.04
simulation.name = \"plain field\"
";
        let scenario = Scenario::from_properties("saved", text).unwrap();
        assert_eq!(scenario.field.dimensions(), (20, 30));
        assert_eq!(scenario.seed, 7);
        assert_eq!(scenario.spawn.fox, 0.04);
        assert_eq!(scenario.name, "plain field");
    }

    #[test]
    fn test_properties_round_trip() {
        let mut scenario = Scenario::named("saved");
        scenario.seed = 77;
        scenario.ticks = Some(120);
        scenario.field.width = 64;
        scenario.spawn.fox = 0.03;

        let reparsed = Scenario::from_properties("other", &scenario.to_properties()).unwrap();
        assert_eq!(reparsed.name, "saved");
        assert_eq!(reparsed.seed, 77);
        assert_eq!(reparsed.ticks, Some(120));
        assert_eq!(reparsed.field, scenario.field);
        assert_eq!(reparsed.spawn, scenario.spawn);
    }

    #[test]
    fn test_validate_reports_spawn_overflow() {
        let mut scenario = Scenario::named("crowded");
        scenario.spawn.rabbit = 0.99;
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Spawn(ResetError::ProbabilityOverflow { .. }))
        ));
    }
}
