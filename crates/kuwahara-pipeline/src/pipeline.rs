use kuwahara_image::{Image, ImageError, ImageSize};
use kuwahara_imgproc::{
    color::{rgb8_to_rgbaf32, rgbaf32_to_rgb8},
    colormap::{jet_colormap, DEFAULT_COLORMAP_LEN},
    filter::kernels::{KernelError, KernelSet},
    flip::vertical_flip,
    kuwahara::SectorFilterParams,
    noise::{noise_field, DEFAULT_NOISE_SEED},
};

use crate::{
    backend::ComputeBackend,
    buffer::{Buffer, BufferKind, BufferRole},
    config::{FilterVariant, PipelineParams},
    error::{BackendError, PipelineError},
    stage::{Dispatch, Stage},
};

/// Where a buffer stands in the current run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferState {
    /// Not produced yet.
    Empty,
    /// Uploaded from the host.
    Uploaded,
    /// Written by a completed, synchronized dispatch of the named stage.
    Written(&'static str),
}

impl BufferState {
    /// Whether the buffer can be read by a dispatch.
    pub fn is_ready(&self) -> bool {
        !matches!(self, BufferState::Empty)
    }
}

/// Everything a run depends on besides the backend: parameters, kernels, and the record of
/// which buffers are ready and which dispatches completed.
#[derive(Debug)]
pub struct PipelineContext {
    params: PipelineParams,
    kernels: KernelSet,
    size: Option<ImageSize>,
    states: [BufferState; BufferRole::COUNT],
    ledger: Vec<Dispatch>,
}

impl PipelineContext {
    /// Validate the parameters and build the sector kernels.
    pub fn new(params: PipelineParams) -> Result<Self, PipelineError> {
        params.validate()?;
        let kernels = build_kernels(&params)?;
        Ok(Self {
            params,
            kernels,
            size: None,
            states: [BufferState::Empty; BufferRole::COUNT],
            ledger: Vec::new(),
        })
    }

    /// Replace the parameters.
    ///
    /// The kernels are rebuilt when the sector count, the smoothing or the kernel size change.
    /// Returns whether they were rebuilt.
    pub fn set_params(&mut self, params: PipelineParams) -> Result<bool, PipelineError> {
        params.validate()?;
        let rebuild = params.iterations != self.params.iterations
            || params.smoothing != self.params.smoothing
            || params.kernel_size != self.params.kernel_size;
        if rebuild {
            self.kernels = build_kernels(&params)?;
        }
        self.params = params;
        Ok(rebuild)
    }

    /// The parameters of the run.
    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// The sector kernels.
    pub fn kernels(&self) -> &KernelSet {
        &self.kernels
    }

    /// The size of the image being processed, once a source was uploaded.
    pub fn size(&self) -> Option<ImageSize> {
        self.size
    }

    /// The state of a buffer.
    pub fn state(&self, role: BufferRole) -> BufferState {
        self.states[role.index()]
    }

    /// The dispatches completed in the current run, in order.
    pub fn ledger(&self) -> &[Dispatch] {
        &self.ledger
    }

    fn begin(&mut self, size: ImageSize) {
        self.size = Some(size);
        self.states = [BufferState::Empty; BufferRole::COUNT];
        self.ledger.clear();
    }

    fn mark_uploaded(&mut self, role: BufferRole) {
        self.states[role.index()] = BufferState::Uploaded;
    }

    // every input must be ready and none may be the output
    fn check(&self, dispatch: &Dispatch) -> Result<(), PipelineError> {
        let stage = dispatch.stage().name();
        for (_, role) in dispatch.inputs() {
            if *role == dispatch.output() {
                return Err(PipelineError::ReadWriteConflict { stage, role: *role });
            }
            if !self.state(*role).is_ready() {
                return Err(PipelineError::DependencyNotReady { stage, role: *role });
            }
        }
        Ok(())
    }

    fn complete(&mut self, dispatch: &Dispatch) {
        self.states[dispatch.output().index()] = BufferState::Written(dispatch.stage().name());
        self.ledger.push(dispatch.clone());
    }
}

fn build_kernels(params: &PipelineParams) -> Result<KernelSet, PipelineError> {
    log::debug!(
        "building {} sector kernels of {}x{}",
        params.iterations,
        params.kernel_size,
        params.kernel_size
    );
    Ok(KernelSet::new(
        params.iterations,
        params.kernel_size,
        params.smoothing,
    )?)
}

/// Drives the stages of the stylization over a compute backend.
///
/// # Example
///
/// ```no_run
/// use kuwahara_image::Image;
/// use kuwahara_imgproc::parallel::ExecutionStrategy;
/// use kuwahara_pipeline::{CpuBackend, Pipeline, PipelineParams};
///
/// let backend = CpuBackend::new(ExecutionStrategy::default()).unwrap();
/// let mut pipeline = Pipeline::new(backend, PipelineParams::default()).unwrap();
///
/// let image = Image::<u8, 3>::from_size_val([64, 48].into(), 128).unwrap();
/// let stylized = pipeline.run(&image).unwrap();
///
/// assert_eq!(stylized.size(), image.size());
/// ```
pub struct Pipeline<B: ComputeBackend> {
    backend: B,
    context: PipelineContext,
    visualization: bool,
}

impl<B: ComputeBackend> Pipeline<B> {
    /// Create a pipeline, validating the parameters and building the kernels.
    pub fn new(backend: B, params: PipelineParams) -> Result<Self, PipelineError> {
        Ok(Self {
            backend,
            context: PipelineContext::new(params)?,
            visualization: true,
        })
    }

    /// Enable or disable the LIC and anisotropy visualization stages.
    pub fn with_visualization(mut self, enabled: bool) -> Self {
        self.visualization = enabled;
        self
    }

    /// Replace the parameters, see [`PipelineContext::set_params`].
    pub fn set_params(&mut self, params: PipelineParams) -> Result<bool, PipelineError> {
        self.context.set_params(params)
    }

    /// The context of the pipeline.
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// The dispatches completed in the current run, in order.
    pub fn ledger(&self) -> &[Dispatch] {
        self.context.ledger()
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start a run: upload the source image and the constant buffers the plan reads.
    ///
    /// The source is flipped to bottom-up row order on the way in.
    pub fn upload_source(&mut self, image: &Image<u8, 3>) -> Result<(), PipelineError> {
        let size = image.size();
        if size.width == 0 || size.height == 0 {
            return Err(ImageError::EmptyImage(size.width, size.height).into());
        }
        self.context.begin(size);

        let source = vertical_flip(&rgb8_to_rgbaf32(image)?)?;
        self.upload(BufferRole::Source, source.into())?;

        let variant = self.context.params().variant;
        let kernels = self.context.kernels();
        let missing = || KernelError::InvalidSectorCount(0);
        match variant {
            FilterVariant::SectorFilter1 | FilterVariant::GenericKuwahara => {
                let kernel = kernels.kernel(0).cloned().ok_or_else(missing)?;
                self.upload(BufferRole::Kernel, kernel.into())?;
            }
            FilterVariant::SectorFilter4 => {
                let packed = kernels.packed().clone();
                self.upload(BufferRole::PackedKernel, packed.into())?;
            }
            FilterVariant::Kuwahara => {}
        }

        if self.visualization {
            self.upload(BufferRole::Noise, noise_field(size, DEFAULT_NOISE_SEED)?.into())?;
            self.upload(
                BufferRole::ColorMap,
                jet_colormap(DEFAULT_COLORMAP_LEN)?.into(),
            )?;
        }

        Ok(())
    }

    fn upload(&mut self, role: BufferRole, buffer: Buffer) -> Result<(), PipelineError> {
        self.backend.upload(role, buffer)?;
        self.context.mark_uploaded(role);
        Ok(())
    }

    /// The dispatches of a run, in execution order.
    pub fn plan(&self) -> Result<Vec<Dispatch>, PipelineError> {
        use BufferRole::*;

        let params = self.context.params();
        let sectors = params.iterations;
        let filter = SectorFilterParams {
            radius: params.radius,
            q: params.q,
            alpha: params.alpha,
        };

        let mut plan = vec![
            Dispatch::new(Stage::StructureTensor, &[("src", Source)], StructureTensor)?,
            Dispatch::new(
                Stage::Gaussian {
                    sigma: params.sigma_t,
                },
                &[("src", StructureTensor)],
                SmoothedTensor,
            )?,
            Dispatch::new(Stage::TensorField, &[("src", SmoothedTensor)], TensorField)?,
        ];

        if self.visualization {
            plan.push(Dispatch::new(
                Stage::LineIntegralConvolution {
                    sigma: params.lic_sigma,
                },
                &[("tfm", TensorField), ("src", Noise)],
                Lic,
            )?);
            plan.push(Dispatch::new(
                Stage::OrientationColorize,
                &[("tfm", TensorField), ("jet", ColorMap)],
                Colorized,
            )?);
        }

        let last = match params.variant {
            FilterVariant::SectorFilter1 => Dispatch::new(
                Stage::SectorFilter1 {
                    sectors,
                    params: filter,
                },
                &[("src", Source), ("K0", Kernel), ("tfm", TensorField)],
                Destination,
            )?,
            FilterVariant::SectorFilter4 => Dispatch::new(
                Stage::SectorFilter4 {
                    sectors,
                    params: filter,
                },
                &[("src", Source), ("K0123", PackedKernel), ("tfm", TensorField)],
                Destination,
            )?,
            FilterVariant::GenericKuwahara => Dispatch::new(
                Stage::GenericKuwahara {
                    sectors,
                    radius: params.radius,
                    q: params.q,
                },
                &[("src", Source), ("K0", Kernel)],
                Destination,
            )?,
            FilterVariant::Kuwahara => Dispatch::new(
                Stage::Kuwahara {
                    radius: params.radius.round().max(1.0) as usize,
                },
                &[("src", Source)],
                Destination,
            )?,
        };
        plan.push(last);

        Ok(plan)
    }

    /// Run one dispatch after checking its dependencies, then wait for it.
    pub fn execute(&mut self, dispatch: &Dispatch) -> Result<(), PipelineError> {
        self.context.check(dispatch)?;
        log::debug!(
            "dispatch {} -> {} on {}",
            dispatch.stage().name(),
            dispatch.output(),
            self.backend.name()
        );
        self.backend.dispatch(dispatch)?;
        self.backend.synchronize()?;
        self.context.complete(dispatch);
        Ok(())
    }

    /// Read a buffer of the current run back in top-down row order.
    pub fn read_buffer(&self, role: BufferRole) -> Result<Buffer, PipelineError> {
        if !matches!(self.context.state(role), BufferState::Written(_)) {
            return Err(PipelineError::NotComputed(role));
        }
        Ok(self.backend.read_back(role)?.flipped()?)
    }

    /// Stylize an image.
    ///
    /// # Arguments
    ///
    /// * `image` - The source image, top-down rgb8.
    ///
    /// # Returns
    ///
    /// The filtered image, top-down rgb8, with the size of the source.
    pub fn run(&mut self, image: &Image<u8, 3>) -> Result<Image<u8, 3>, PipelineError> {
        log::info!(
            "stylizing {} with {} ({} sectors, radius {})",
            image.size(),
            self.context.params().variant,
            self.context.params().iterations,
            self.context.params().radius
        );

        self.upload_source(image)?;
        for dispatch in self.plan()? {
            self.execute(&dispatch)?;
        }

        let output = match self.read_buffer(BufferRole::Destination)? {
            Buffer::Rgba(img) => rgbaf32_to_rgb8(&img)?,
            other => {
                return Err(BackendError::KindMismatch {
                    role: BufferRole::Destination,
                    expected: BufferKind::Rgba,
                    found: other.kind(),
                }
                .into())
            }
        };

        log::info!("completed {} dispatches", self.ledger().len());
        Ok(output)
    }
}
