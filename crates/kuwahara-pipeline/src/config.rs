use std::{fmt, path::Path, str::FromStr};

use kuwahara_imgproc::{filter::kernels::DEFAULT_KERNEL_SIZE, lic::DEFAULT_LIC_SIGMA};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest kernel edge where every sector of up to 8 keeps some support.
pub const MIN_KERNEL_SIZE: usize = 4;

/// The filter applied in the last stage of the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterVariant {
    /// Anisotropic filter rotating a single kernel per sector.
    #[serde(rename = "sector-filter-1")]
    SectorFilter1,
    /// Anisotropic filter sampling four packed kernels at once.
    #[default]
    #[serde(rename = "sector-filter-4")]
    SectorFilter4,
    /// Isotropic sector filter.
    #[serde(rename = "generic-kuwahara")]
    GenericKuwahara,
    /// Classic four quadrant filter.
    #[serde(rename = "kuwahara")]
    Kuwahara,
}

impl FilterVariant {
    /// The name used on the command line and in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            FilterVariant::SectorFilter1 => "sector-filter-1",
            FilterVariant::SectorFilter4 => "sector-filter-4",
            FilterVariant::GenericKuwahara => "generic-kuwahara",
            FilterVariant::Kuwahara => "kuwahara",
        }
    }
}

impl fmt::Display for FilterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FilterVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sector-filter-1" | "akf-v1" => Ok(FilterVariant::SectorFilter1),
            "sector-filter-4" | "akf-v2" => Ok(FilterVariant::SectorFilter4),
            "generic-kuwahara" | "gkf" => Ok(FilterVariant::GenericKuwahara),
            "kuwahara" => Ok(FilterVariant::Kuwahara),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

/// Parameters of one pipeline run.
///
/// Missing fields of a configuration file take their default value.
///
/// # Example
///
/// ```
/// use kuwahara_pipeline::PipelineParams;
///
/// let params = PipelineParams::default().with_radius(6.0).with_iterations(4);
///
/// assert!(params.validate().is_ok());
/// assert_eq!(params.iterations, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineParams {
    /// Number of sectors, 3 to 8.
    pub iterations: usize,
    /// Sigma of the structure tensor smoothing, 0 to 10.
    pub sigma_t: f32,
    /// How much the filter shape follows the anisotropy, at least 1.
    pub alpha: f32,
    /// Filter radius in pixels, 1 to 20.
    pub radius: f32,
    /// Smoothing of the sector boundaries relative to the radial falloff, 0 to 1.
    pub smoothing: f32,
    /// Sharpness of the sector weighting, 1 to 16.
    pub q: f32,
    /// Integration sigma of the LIC visualization, greater than 0.
    pub lic_sigma: f32,
    /// Edge size of the sector kernels, even and at least [`MIN_KERNEL_SIZE`].
    pub kernel_size: usize,
    /// The final filter.
    pub variant: FilterVariant,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            iterations: 8,
            sigma_t: 5.0,
            alpha: 1.0,
            radius: 10.0,
            smoothing: 0.5,
            q: 8.0,
            lic_sigma: DEFAULT_LIC_SIGMA,
            kernel_size: DEFAULT_KERNEL_SIZE,
            variant: FilterVariant::default(),
        }
    }
}

fn check_range(
    name: &'static str,
    value: f64,
    ok: bool,
    range: &'static str,
) -> Result<(), ConfigError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value, range })
    }
}

impl PipelineParams {
    /// Load parameters from a JSON file and validate them.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse parameters from a JSON string and validate them.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Check every parameter against its range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let iterations = self.iterations;
        check_range(
            "iterations",
            iterations as f64,
            (3..=8).contains(&iterations),
            "[3, 8]",
        )?;
        check_range(
            "sigma_t",
            self.sigma_t as f64,
            (0.0..=10.0).contains(&self.sigma_t),
            "[0, 10]",
        )?;
        check_range("alpha", self.alpha as f64, self.alpha >= 1.0, "[1, inf)")?;
        check_range(
            "radius",
            self.radius as f64,
            (1.0..=20.0).contains(&self.radius),
            "[1, 20]",
        )?;
        check_range(
            "smoothing",
            self.smoothing as f64,
            (0.0..=1.0).contains(&self.smoothing),
            "[0, 1]",
        )?;
        check_range("q", self.q as f64, (1.0..=16.0).contains(&self.q), "[1, 16]")?;
        check_range(
            "lic_sigma",
            self.lic_sigma as f64,
            self.lic_sigma > 0.0,
            "(0, inf)",
        )?;
        check_range(
            "kernel_size",
            self.kernel_size as f64,
            self.kernel_size >= MIN_KERNEL_SIZE && self.kernel_size % 2 == 0,
            "even, >= 4",
        )?;
        Ok(())
    }

    /// Set the number of sectors.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the structure tensor smoothing.
    pub fn with_sigma_t(mut self, sigma_t: f32) -> Self {
        self.sigma_t = sigma_t;
        self
    }

    /// Set the anisotropy control.
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the filter radius.
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Set the sector boundary smoothing.
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set the sector weighting sharpness.
    pub fn with_q(mut self, q: f32) -> Self {
        self.q = q;
        self
    }

    /// Set the final filter.
    pub fn with_variant(mut self, variant: FilterVariant) -> Self {
        self.variant = variant;
        self
    }
}
