use kuwahara_imgproc::kuwahara::SectorFilterParams;

use crate::{
    buffer::{BufferKind, BufferRole},
    error::BackendError,
};

/// A stage of the compute backend together with its scalar parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Stage {
    /// Copy the `tex` slot.
    Identity,
    /// Anisotropic Kuwahara filter rotating the single kernel `K0` per sector.
    SectorFilter1 {
        /// Number of sectors.
        sectors: usize,
        /// Radius, sharpness and anisotropy control.
        params: SectorFilterParams,
    },
    /// Anisotropic Kuwahara filter reading the packed kernels `K0123`.
    SectorFilter4 {
        /// Number of sectors.
        sectors: usize,
        /// Radius, sharpness and anisotropy control.
        params: SectorFilterParams,
    },
    /// Gaussian blur of the `src` slot.
    Gaussian {
        /// The blur sigma in pixels.
        sigma: f32,
    },
    /// Isotropic sector filter with smooth kernels.
    GenericKuwahara {
        /// Number of sectors.
        sectors: usize,
        /// Sampling radius in pixels.
        radius: f32,
        /// Sharpness of the sector weighting.
        q: f32,
    },
    /// Classic four quadrant Kuwahara filter.
    Kuwahara {
        /// Quadrant edge minus one, in pixels.
        radius: usize,
    },
    /// Line integral convolution of the `src` slot along `tfm`.
    LineIntegralConvolution {
        /// The integration sigma in pixels.
        sigma: f32,
    },
    /// Map the anisotropy of `tfm` through the `jet` colormap.
    OrientationColorize,
    /// Structure tensor of the `src` slot.
    StructureTensor,
    /// Tensor field of the smoothed tensor in `src`.
    TensorField,
}

impl Stage {
    /// The backend name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Identity => "identity",
            Stage::SectorFilter1 { .. } => "sector-filter-1",
            Stage::SectorFilter4 { .. } => "sector-filter-4",
            Stage::Gaussian { .. } => "gaussian",
            Stage::GenericKuwahara { .. } => "generic-kuwahara",
            Stage::Kuwahara { .. } => "kuwahara",
            Stage::LineIntegralConvolution { .. } => "line-integral-convolution",
            Stage::OrientationColorize => "orientation-colorize",
            Stage::StructureTensor => "structure-tensor",
            Stage::TensorField => "tensor-field",
        }
    }

    /// The texture slots the stage reads, all of which must be bound.
    pub fn slots(&self) -> &'static [&'static str] {
        match self {
            Stage::Identity => &["tex"],
            Stage::SectorFilter1 { .. } => &["src", "K0", "tfm"],
            Stage::SectorFilter4 { .. } => &["src", "K0123", "tfm"],
            Stage::Gaussian { .. } => &["src"],
            Stage::GenericKuwahara { .. } => &["src", "K0"],
            Stage::Kuwahara { .. } => &["src"],
            Stage::LineIntegralConvolution { .. } => &["tfm", "src"],
            Stage::OrientationColorize => &["tfm", "jet"],
            Stage::StructureTensor => &["src"],
            Stage::TensorField => &["src"],
        }
    }

    /// The kind of buffer the stage produces, `None` when it follows its input.
    pub fn output_kind(&self) -> Option<BufferKind> {
        match self {
            Stage::Identity | Stage::Gaussian { .. } => None,
            Stage::LineIntegralConvolution { .. } => Some(BufferKind::Scalar),
            _ => Some(BufferKind::Rgba),
        }
    }
}

/// One invocation of a stage: which buffer feeds each slot and which buffer receives the
/// output.
#[derive(Clone, Debug, PartialEq)]
pub struct Dispatch {
    stage: Stage,
    inputs: Vec<(&'static str, BufferRole)>,
    output: BufferRole,
}

impl Dispatch {
    /// Bind the slots of a stage.
    ///
    /// # Errors
    ///
    /// Fails when a slot of the stage is left unbound, or when a binding names a slot the stage
    /// does not have or names it twice.
    ///
    /// # Example
    ///
    /// ```
    /// use kuwahara_pipeline::{BufferRole, Dispatch, Stage};
    ///
    /// let dispatch = Dispatch::new(
    ///     Stage::Gaussian { sigma: 2.0 },
    ///     &[("src", BufferRole::StructureTensor)],
    ///     BufferRole::SmoothedTensor,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(dispatch.input("src").unwrap(), BufferRole::StructureTensor);
    /// ```
    pub fn new(
        stage: Stage,
        inputs: &[(&str, BufferRole)],
        output: BufferRole,
    ) -> Result<Self, BackendError> {
        let slots = stage.slots();
        let mut bound: Vec<(&'static str, BufferRole)> = Vec::with_capacity(slots.len());

        for (slot, role) in inputs {
            let known = slots.iter().find(|s| **s == *slot);
            match known {
                Some(s) if !bound.iter().any(|(b, _)| b == s) => bound.push((*s, *role)),
                _ => {
                    return Err(BackendError::UnknownSlot {
                        stage: stage.name(),
                        slot: slot.to_string(),
                    })
                }
            }
        }

        if let Some(slot) = slots.iter().find(|s| !bound.iter().any(|(b, _)| b == *s)) {
            return Err(BackendError::MissingSlot {
                stage: stage.name(),
                slot: *slot,
            });
        }

        Ok(Self {
            stage,
            inputs: bound,
            output,
        })
    }

    /// The stage to run.
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The slot bindings, in the order they were given.
    pub fn inputs(&self) -> &[(&'static str, BufferRole)] {
        &self.inputs
    }

    /// The buffer bound to a slot.
    pub fn input(&self, slot: &str) -> Result<BufferRole, BackendError> {
        self.inputs
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, role)| *role)
            .ok_or_else(|| BackendError::UnknownSlot {
                stage: self.stage.name(),
                slot: slot.to_string(),
            })
    }

    /// The buffer receiving the output.
    pub fn output(&self) -> BufferRole {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_binds_all_slots() -> Result<(), BackendError> {
        let dispatch = Dispatch::new(
            Stage::OrientationColorize,
            &[("jet", BufferRole::ColorMap), ("tfm", BufferRole::TensorField)],
            BufferRole::Colorized,
        )?;
        assert_eq!(dispatch.stage().name(), "orientation-colorize");
        assert_eq!(dispatch.input("tfm")?, BufferRole::TensorField);
        assert_eq!(dispatch.input("jet")?, BufferRole::ColorMap);
        assert_eq!(dispatch.output(), BufferRole::Colorized);
        Ok(())
    }

    #[test]
    fn test_dispatch_rejects_bad_bindings() {
        let missing = Dispatch::new(
            Stage::LineIntegralConvolution { sigma: 3.0 },
            &[("tfm", BufferRole::TensorField)],
            BufferRole::Lic,
        );
        assert!(matches!(
            missing,
            Err(BackendError::MissingSlot {
                stage: "line-integral-convolution",
                slot: "src"
            })
        ));

        let unknown = Dispatch::new(
            Stage::StructureTensor,
            &[("src", BufferRole::Source), ("tfm", BufferRole::TensorField)],
            BufferRole::StructureTensor,
        );
        assert!(matches!(unknown, Err(BackendError::UnknownSlot { .. })));

        let twice = Dispatch::new(
            Stage::Identity,
            &[("tex", BufferRole::Source), ("tex", BufferRole::Source)],
            BufferRole::Destination,
        );
        assert!(matches!(twice, Err(BackendError::UnknownSlot { .. })));
    }

    #[test]
    fn test_stage_output_kinds() {
        assert_eq!(
            Stage::LineIntegralConvolution { sigma: 1.0 }.output_kind(),
            Some(BufferKind::Scalar)
        );
        assert_eq!(Stage::Gaussian { sigma: 1.0 }.output_kind(), None);
        assert_eq!(
            Stage::Kuwahara { radius: 2 }.output_kind(),
            Some(BufferKind::Rgba)
        );
    }
}
