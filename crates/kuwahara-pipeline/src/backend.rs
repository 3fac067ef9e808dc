use kuwahara_image::{Image, ImageError};
use kuwahara_imgproc::{
    colormap::colorize_anisotropy,
    filter::{gaussian_blur, kernels::MAX_PACKED_CHANNELS},
    kuwahara::{
        anisotropic_kuwahara, generalized_kuwahara, kuwahara, SectorFilterParams, SectorWeights,
    },
    lic::line_integral_convolution,
    parallel::{ExecutionStrategy, Executor},
    structure::{structure_tensor, tensor_field},
};

use crate::{
    buffer::{Buffer, BufferRole, BufferSet},
    error::BackendError,
    stage::{Dispatch, Stage},
};

/// The device side of the pipeline: owns the buffers and executes stages on them.
///
/// Buffers hold their rows bottom-up, the way textures are addressed; callers flip images on
/// the way in and out. A dispatch may complete asynchronously, its output is only readable
/// after [`ComputeBackend::synchronize`].
pub trait ComputeBackend {
    /// A human readable name of the backend.
    fn name(&self) -> &str;

    /// Store a buffer under a role, replacing the previous one.
    fn upload(&mut self, role: BufferRole, buffer: Buffer) -> Result<(), BackendError>;

    /// Run one stage.
    fn dispatch(&mut self, dispatch: &Dispatch) -> Result<(), BackendError>;

    /// Wait until every dispatch issued so far has completed.
    fn synchronize(&mut self) -> Result<(), BackendError>;

    /// Copy a buffer back to the host.
    fn read_back(&self, role: BufferRole) -> Result<Buffer, BackendError>;

    /// Drop every buffer.
    fn release(&mut self);
}

/// Compute backend running every stage on the CPU, rows in parallel.
pub struct CpuBackend {
    executor: Executor,
    buffers: BufferSet,
    pending: Vec<BufferRole>,
}

impl CpuBackend {
    /// Create a backend with the given execution strategy.
    ///
    /// # Errors
    ///
    /// Fails with [`BackendError::Init`] when the worker pool can not be built.
    pub fn new(strategy: ExecutionStrategy) -> Result<Self, BackendError> {
        let executor = Executor::new(strategy)?;
        log::debug!("cpu backend ready: {:?}", executor.strategy());
        Ok(Self {
            executor,
            buffers: BufferSet::new(),
            pending: Vec::new(),
        })
    }

    /// The execution strategy of the backend.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.executor.strategy()
    }

    fn rgba(&self, dispatch: &Dispatch, slot: &str) -> Result<&Image<f32, 4>, BackendError> {
        self.buffers.rgba(dispatch.input(slot)?)
    }

    fn scalar(&self, dispatch: &Dispatch, slot: &str) -> Result<&Image<f32, 1>, BackendError> {
        self.buffers.scalar(dispatch.input(slot)?)
    }

    // run one stage into a freshly allocated output buffer
    fn run_stage(&self, dispatch: &Dispatch) -> Result<Buffer, BackendError> {
        let stage = dispatch.stage();
        let failed = |source: ImageError| BackendError::Stage {
            stage: stage.name(),
            source,
        };

        match *stage {
            Stage::Identity => Ok(self.buffers.get(dispatch.input("tex")?)?.clone()),
            Stage::StructureTensor => {
                let src = self.rgba(dispatch, "src")?;
                rgba_output(src, |dst| structure_tensor(src, dst)).map_err(failed)
            }
            Stage::Gaussian { sigma } => match self.buffers.get(dispatch.input("src")?)? {
                Buffer::Scalar(src) => {
                    let mut dst = Image::from_size_val(src.size(), 0.0).map_err(failed)?;
                    gaussian_blur(src, &mut dst, sigma).map_err(failed)?;
                    Ok(Buffer::Scalar(dst))
                }
                Buffer::Rgba(src) => {
                    rgba_output(src, |dst| gaussian_blur(src, dst, sigma)).map_err(failed)
                }
            },
            Stage::TensorField => {
                let src = self.rgba(dispatch, "src")?;
                rgba_output(src, |dst| tensor_field(src, dst)).map_err(failed)
            }
            Stage::LineIntegralConvolution { sigma } => {
                let tfm = self.rgba(dispatch, "tfm")?;
                let src = self.scalar(dispatch, "src")?;
                let mut dst = Image::from_size_val(src.size(), 0.0).map_err(failed)?;
                line_integral_convolution(tfm, src, &mut dst, sigma).map_err(failed)?;
                Ok(Buffer::Scalar(dst))
            }
            Stage::OrientationColorize => {
                let tfm = self.rgba(dispatch, "tfm")?;
                let jet = self.rgba(dispatch, "jet")?;
                rgba_output(tfm, |dst| colorize_anisotropy(tfm, jet, dst)).map_err(failed)
            }
            Stage::SectorFilter1 { sectors, params } => {
                let src = self.rgba(dispatch, "src")?;
                let kernel = self.scalar(dispatch, "K0")?;
                let tfm = self.rgba(dispatch, "tfm")?;
                rgba_output(src, |dst| {
                    anisotropic_kuwahara(
                        src,
                        tfm,
                        SectorWeights::Single(kernel),
                        sectors,
                        &params,
                        dst,
                    )
                })
                .map_err(failed)
            }
            Stage::SectorFilter4 { sectors, params } => {
                let src = self.rgba(dispatch, "src")?;
                let kernels = self.rgba(dispatch, "K0123")?;
                let tfm = self.rgba(dispatch, "tfm")?;
                let weights = SectorWeights::Packed {
                    kernels,
                    channels: sectors.min(MAX_PACKED_CHANNELS),
                };
                rgba_output(src, |dst| {
                    anisotropic_kuwahara(src, tfm, weights, sectors, &params, dst)
                })
                .map_err(failed)
            }
            Stage::GenericKuwahara { sectors, radius, q } => {
                let src = self.rgba(dispatch, "src")?;
                let kernel = self.scalar(dispatch, "K0")?;
                let params = SectorFilterParams {
                    radius,
                    q,
                    ..Default::default()
                };
                rgba_output(src, |dst| {
                    generalized_kuwahara(src, kernel, sectors, &params, dst)
                })
                .map_err(failed)
            }
            Stage::Kuwahara { radius } => {
                let src = self.rgba(dispatch, "src")?;
                rgba_output(src, |dst| kuwahara(src, radius, dst)).map_err(failed)
            }
        }
    }
}

// allocate an rgba output the size of `src` and run `op` into it
fn rgba_output(
    src: &Image<f32, 4>,
    op: impl FnOnce(&mut Image<f32, 4>) -> Result<(), ImageError>,
) -> Result<Buffer, ImageError> {
    let mut dst = Image::from_size_val(src.size(), 0.0)?;
    op(&mut dst)?;
    Ok(Buffer::Rgba(dst))
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn upload(&mut self, role: BufferRole, buffer: Buffer) -> Result<(), BackendError> {
        log::debug!("upload {role}: {}", buffer.size());
        self.buffers.insert(role, buffer)?;
        self.pending.retain(|r| *r != role);
        Ok(())
    }

    fn dispatch(&mut self, dispatch: &Dispatch) -> Result<(), BackendError> {
        let output = dispatch.output();
        if let Some(produced) = dispatch.stage().output_kind() {
            if produced != output.kind() {
                return Err(BackendError::KindMismatch {
                    role: output,
                    expected: output.kind(),
                    found: produced,
                });
            }
        }

        let result = self.executor.install(|| self.run_stage(dispatch))?;
        self.buffers.insert(output, result)?;
        self.pending.push(output);
        Ok(())
    }

    fn synchronize(&mut self) -> Result<(), BackendError> {
        // stages run to completion inside `dispatch`, only the bookkeeping is left
        self.pending.clear();
        Ok(())
    }

    fn read_back(&self, role: BufferRole) -> Result<Buffer, BackendError> {
        if self.pending.contains(&role) {
            return Err(BackendError::NotSynchronized(role));
        }
        Ok(self.buffers.get(role)?.clone())
    }

    fn release(&mut self) {
        self.buffers.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuwahara_imgproc::parallel::ParallelError;

    fn backend() -> Result<CpuBackend, BackendError> {
        CpuBackend::new(ExecutionStrategy::Serial)
    }

    #[test]
    fn test_init_failure() {
        let res = CpuBackend::new(ExecutionStrategy::Fixed(0));
        assert!(matches!(
            res,
            Err(BackendError::Init(ParallelError::InvalidThreadCount(0)))
        ));
    }

    #[test]
    fn test_identity_requires_synchronize() -> Result<(), Box<dyn std::error::Error>> {
        let mut backend = backend()?;
        let src = Image::<f32, 4>::from_fn([3, 2].into(), |r, c| {
            [r as f32, c as f32, 0.5, 1.0]
        })?;
        backend.upload(BufferRole::Source, src.clone().into())?;

        let dispatch = Dispatch::new(
            Stage::Identity,
            &[("tex", BufferRole::Source)],
            BufferRole::Destination,
        )?;
        backend.dispatch(&dispatch)?;
        assert!(matches!(
            backend.read_back(BufferRole::Destination),
            Err(BackendError::NotSynchronized(BufferRole::Destination))
        ));

        backend.synchronize()?;
        assert_eq!(backend.read_back(BufferRole::Destination)?, Buffer::Rgba(src));
        Ok(())
    }

    #[test]
    fn test_stage_kind_must_match_output() -> Result<(), Box<dyn std::error::Error>> {
        let mut backend = backend()?;
        let src = Image::<f32, 4>::from_size_val([2, 2].into(), 0.5)?;
        backend.upload(BufferRole::Source, src.into())?;

        let dispatch = Dispatch::new(
            Stage::StructureTensor,
            &[("src", BufferRole::Source)],
            BufferRole::Lic,
        )?;
        assert!(matches!(
            backend.dispatch(&dispatch),
            Err(BackendError::KindMismatch {
                role: BufferRole::Lic,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_missing_input_buffer() -> Result<(), Box<dyn std::error::Error>> {
        let mut backend = backend()?;
        let dispatch = Dispatch::new(
            Stage::TensorField,
            &[("src", BufferRole::SmoothedTensor)],
            BufferRole::TensorField,
        )?;
        assert!(matches!(
            backend.dispatch(&dispatch),
            Err(BackendError::MissingBuffer(BufferRole::SmoothedTensor))
        ));
        Ok(())
    }

    #[test]
    fn test_gaussian_follows_input_kind() -> Result<(), Box<dyn std::error::Error>> {
        let mut backend = backend()?;
        let noise = Image::<f32, 1>::from_size_val([4, 4].into(), 0.25)?;
        backend.upload(BufferRole::Noise, noise.into())?;

        let dispatch = Dispatch::new(
            Stage::Gaussian { sigma: 1.0 },
            &[("src", BufferRole::Noise)],
            BufferRole::Lic,
        )?;
        backend.dispatch(&dispatch)?;
        backend.synchronize()?;
        match backend.read_back(BufferRole::Lic)? {
            Buffer::Scalar(img) => {
                assert!(img.as_slice().iter().all(|v| (v - 0.25).abs() < 1e-6))
            }
            other => panic!("unexpected buffer {:?}", other.kind()),
        }

        backend.release();
        assert!(matches!(
            backend.read_back(BufferRole::Noise),
            Err(BackendError::MissingBuffer(BufferRole::Noise))
        ));
        Ok(())
    }

    #[test]
    fn test_stage_failure_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let mut backend = backend()?;
        let src = Image::<f32, 4>::from_size_val([2, 2].into(), 0.5)?;
        backend.upload(BufferRole::Source, src.into())?;

        let dispatch = Dispatch::new(
            Stage::Kuwahara { radius: 0 },
            &[("src", BufferRole::Source)],
            BufferRole::Destination,
        )?;
        assert!(matches!(
            backend.dispatch(&dispatch),
            Err(BackendError::Stage {
                stage: "kuwahara",
                ..
            })
        ));
        Ok(())
    }
}
