use crate::core::models::simbox::{Dimensions, SimBox};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Conflicting configuration: {0}")]
    Conflict(&'static str),

    #[error("Invalid fallback box: {0}")]
    InvalidFallbackBox(String),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Options applied when turning decoded DCD frames into [`Frame`](crate::core::models::frame::Frame)s.
///
/// DCD files store coordinates only. Anything else a frame should carry,
/// such as particle types or the dimensionality of the system, is supplied
/// here explicitly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReaderConfig {
    /// With [`Dimensions::Two`], the third coordinate is read as an in-plane rotation angle.
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Type name given to every particle when no per-particle list is set.
    #[serde(default)]
    pub default_type: Option<String>,
    /// One type name per particle.
    #[serde(default)]
    pub types: Option<Vec<String>>,
    /// Box reported for files whose frames carry no unit cell.
    #[serde(default)]
    pub fallback_box: Option<SimBox>,
}

impl ReaderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.types.is_some() && self.default_type.is_some() {
            return Err(ConfigError::Conflict(
                "set either per-particle `types` or a `default-type`, not both",
            ));
        }
        if let Some(fallback) = &self.fallback_box {
            check_fallback_box(fallback, self.dimensions)?;
        }
        Ok(())
    }

    /// Per-particle type names for `num_particles` particles, if any were configured.
    pub(crate) fn particle_types(&self, num_particles: usize) -> Option<Vec<String>> {
        match (&self.types, &self.default_type) {
            (Some(types), _) => Some(types.clone()),
            (None, Some(default_type)) => Some(vec![default_type.clone(); num_particles]),
            (None, None) => None,
        }
    }
}

/// A fallback box must be usable as-is for every frame that lacks a unit cell.
fn check_fallback_box(simbox: &SimBox, dimensions: Dimensions) -> Result<(), ConfigError> {
    if simbox.dimensions != dimensions {
        return Err(ConfigError::InvalidFallbackBox(format!(
            "box is {}-D but the reader is configured for {}-D",
            simbox.dimensions, dimensions
        )));
    }

    let edges = [("lx", simbox.lx), ("ly", simbox.ly), ("lz", simbox.lz)];
    let checked = match dimensions {
        Dimensions::Two => &edges[..2],
        Dimensions::Three => &edges[..],
    };
    if let Some((name, value)) = checked.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
        return Err(ConfigError::InvalidFallbackBox(format!(
            "edge `{}` must be positive and finite, got {}",
            name, value
        )));
    }

    let tilts = [("xy", simbox.xy), ("xz", simbox.xz), ("yz", simbox.yz)];
    if let Some((name, value)) = tilts.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ConfigError::InvalidFallbackBox(format!(
            "tilt `{}` must be finite, got {}",
            name, value
        )));
    }
    if dimensions == Dimensions::Two && (simbox.xz != 0.0 || simbox.yz != 0.0) {
        return Err(ConfigError::InvalidFallbackBox(
            "a 2-D box cannot have `xz` or `yz` tilts".to_string(),
        ));
    }
    Ok(())
}

#[derive(Default)]
pub struct ReaderConfigBuilder {
    dimensions: Option<Dimensions>,
    default_type: Option<String>,
    types: Option<Vec<String>>,
    fallback_box: Option<SimBox>,
}

impl ReaderConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
    pub fn default_type(mut self, name: impl Into<String>) -> Self {
        self.default_type = Some(name.into());
        self
    }
    pub fn types(mut self, types: Vec<String>) -> Self {
        self.types = Some(types);
        self
    }
    pub fn fallback_box(mut self, simbox: SimBox) -> Self {
        self.fallback_box = Some(simbox);
        self
    }

    pub fn build(self) -> Result<ReaderConfig, ConfigError> {
        let config = ReaderConfig {
            dimensions: self.dimensions.unwrap_or_default(),
            default_type: self.default_type,
            types: self.types,
            fallback_box: self.fallback_box,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_three_dimensional_without_types() {
        let config = ReaderConfig::default();
        assert_eq!(config.dimensions, Dimensions::Three);
        assert_eq!(config.particle_types(3), None);
    }

    #[test]
    fn builder_sets_fields_and_repeats_default_type() {
        let config = ReaderConfigBuilder::new()
            .dimensions(Dimensions::Two)
            .default_type("A")
            .build()
            .unwrap();
        assert_eq!(config.dimensions, Dimensions::Two);
        assert_eq!(config.particle_types(2), Some(vec!["A".to_string(), "A".to_string()]));
    }

    #[test]
    fn builder_rejects_types_together_with_default_type() {
        let result = ReaderConfigBuilder::new()
            .default_type("A")
            .types(vec!["B".into()])
            .build();
        assert!(matches!(result, Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn toml_config_parses_all_fields() {
        let config = ReaderConfig::from_toml_str(
            r#"
            dimensions = 2
            types = ["A", "B", "A"]

            [fallback-box]
            lx = 4.0
            ly = 5.0
            lz = 1.0
            xy = 0.5
            dimensions = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.dimensions, Dimensions::Two);
        assert_eq!(config.particle_types(3).unwrap(), vec!["A", "B", "A"]);
        let fallback = config.fallback_box.unwrap();
        assert_eq!((fallback.lx, fallback.xy, fallback.xz), (4.0, 0.5, 0.0));
        assert_eq!(fallback.dimensions, Dimensions::Two);
    }

    #[test]
    fn toml_config_rejects_invalid_dimensions_and_unknown_keys() {
        assert!(matches!(
            ReaderConfig::from_toml_str("dimensions = 4"),
            Err(ConfigError::Toml { .. })
        ));
        assert!(matches!(
            ReaderConfig::from_toml_str("colour = \"red\""),
            Err(ConfigError::Toml { .. })
        ));
    }

    #[test]
    fn toml_config_rejects_conflicting_type_settings() {
        let result = ReaderConfig::from_toml_str("default-type = \"A\"\ntypes = [\"B\"]");
        assert!(matches!(result, Err(ConfigError::Conflict(_))));
    }

    #[test]
    fn fallback_box_edges_must_be_positive_and_finite() {
        for simbox in [
            SimBox::orthorhombic(0.0, 1.0, 1.0),
            SimBox::orthorhombic(1.0, -2.0, 1.0),
            SimBox::orthorhombic(1.0, 1.0, f64::NAN),
            SimBox::orthorhombic(1.0, f64::INFINITY, 1.0),
        ] {
            let result = ReaderConfigBuilder::new().fallback_box(simbox).build();
            assert!(
                matches!(&result, Err(ConfigError::InvalidFallbackBox(msg)) if msg.contains("positive and finite")),
                "{:?} was accepted",
                simbox
            );
        }
        let tilted = SimBox::new(1.0, 1.0, 1.0, f64::NAN, 0.0, 0.0, Dimensions::Three);
        assert!(matches!(
            ReaderConfigBuilder::new().fallback_box(tilted).build(),
            Err(ConfigError::InvalidFallbackBox(_))
        ));
    }

    #[test]
    fn two_dimensional_fallback_box_ignores_lz() {
        let flat = SimBox::new(2.0, 3.0, 0.0, 0.25, 0.0, 0.0, Dimensions::Two);
        let config = ReaderConfigBuilder::new()
            .dimensions(Dimensions::Two)
            .fallback_box(flat)
            .build()
            .unwrap();
        assert_eq!(config.fallback_box, Some(flat));
    }

    #[test]
    fn fallback_box_dimensions_must_match_reader() {
        let result = ReaderConfigBuilder::new()
            .dimensions(Dimensions::Two)
            .fallback_box(SimBox::orthorhombic(1.0, 1.0, 1.0))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidFallbackBox(msg)) if msg.contains("3-D")));

        let result = ReaderConfig::from_toml_str(
            r#"
            [fallback-box]
            lx = 4.0
            ly = 5.0
            lz = 1.0
            dimensions = 2
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidFallbackBox(_))));
    }

    #[test]
    fn toml_two_dimensional_fallback_box_rejects_cross_tilts() {
        let result = ReaderConfig::from_toml_str(
            r#"
            dimensions = 2

            [fallback-box]
            lx = 4.0
            ly = 5.0
            lz = 1.0
            xz = 0.5
            dimensions = 2
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidFallbackBox(msg)) if msg.contains("xz")));
    }

    #[test]
    fn load_reads_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(&path, "default-type = \"W\"\n").unwrap();
        let config = ReaderConfig::load(&path).unwrap();
        assert_eq!(config.default_type.as_deref(), Some("W"));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = ReaderConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
