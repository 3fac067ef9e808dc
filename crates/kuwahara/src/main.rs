use argh::FromArgs;
use std::path::{Path, PathBuf};

use kuwahara::{
    imgproc::{
        color::{grayf32_to_gray8, rgbaf32_to_rgb8},
        parallel::ExecutionStrategy,
    },
    io::{functional as F, png},
    pipeline::{Buffer, BufferRole, CpuBackend, FilterVariant, Pipeline, PipelineParams},
};

#[derive(FromArgs)]
/// Stylize an image with the anisotropic Kuwahara filter
struct Args {
    /// path to the input image
    #[argh(positional)]
    input: PathBuf,

    /// path to the output png
    #[argh(positional)]
    output: PathBuf,

    /// json file with the pipeline parameters
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// number of sectors, 3 to 8
    #[argh(option, short = 'n')]
    iterations: Option<usize>,

    /// sigma of the structure tensor smoothing
    #[argh(option)]
    sigma_t: Option<f32>,

    /// how much the filter shape follows the anisotropy
    #[argh(option)]
    alpha: Option<f32>,

    /// filter radius in pixels
    #[argh(option, short = 'r')]
    radius: Option<f32>,

    /// smoothing of the sector boundaries
    #[argh(option)]
    smoothing: Option<f32>,

    /// sharpness of the sector weighting
    #[argh(option)]
    q: Option<f32>,

    /// final filter: sector-filter-1, sector-filter-4, generic-kuwahara, kuwahara
    #[argh(option, short = 'v')]
    variant: Option<FilterVariant>,

    /// number of worker threads (default: all cores)
    #[argh(option)]
    num_threads: Option<usize>,

    /// write the line integral convolution of the orientation field to this png
    #[argh(option)]
    lic: Option<PathBuf>,

    /// write the colorized anisotropy to this png
    #[argh(option)]
    anisotropy: Option<PathBuf>,
}

impl Args {
    // file values first, then the command line on top
    fn params(&self) -> Result<PipelineParams, Box<dyn std::error::Error>> {
        let mut params = match &self.config {
            Some(path) => PipelineParams::from_json_file(path)?,
            None => PipelineParams::default(),
        };
        if let Some(iterations) = self.iterations {
            params = params.with_iterations(iterations);
        }
        if let Some(sigma_t) = self.sigma_t {
            params = params.with_sigma_t(sigma_t);
        }
        if let Some(alpha) = self.alpha {
            params = params.with_alpha(alpha);
        }
        if let Some(radius) = self.radius {
            params = params.with_radius(radius);
        }
        if let Some(smoothing) = self.smoothing {
            params = params.with_smoothing(smoothing);
        }
        if let Some(q) = self.q {
            params = params.with_q(q);
        }
        if let Some(variant) = self.variant {
            params = params.with_variant(variant);
        }
        params.validate()?;
        Ok(params)
    }
}

fn write_diagnostic(
    pipeline: &Pipeline<CpuBackend>,
    role: BufferRole,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match pipeline.read_buffer(role)? {
        Buffer::Scalar(img) => png::write_image_png_gray8(path, &grayf32_to_gray8(&img)?)?,
        Buffer::Rgba(img) => png::write_image_png_rgb8(path, &rgbaf32_to_rgb8(&img)?)?,
    }
    log::info!("wrote {} to {}", role, path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let params = args.params()?;
    let strategy = match args.num_threads {
        Some(n) => ExecutionStrategy::Fixed(n),
        None => ExecutionStrategy::default(),
    };

    // bring the backend up before touching the image
    let backend = CpuBackend::new(strategy)?;
    let visualization = args.lic.is_some() || args.anisotropy.is_some();
    let mut pipeline = Pipeline::new(backend, params)?.with_visualization(visualization);

    let image = F::read_image_any_rgb8(&args.input)?;
    log::info!("read {} ({})", args.input.display(), image.size());

    let stylized = pipeline.run(&image)?;
    png::write_image_png_rgb8(&args.output, &stylized)?;
    log::info!("wrote {}", args.output.display());

    if let Some(path) = &args.lic {
        write_diagnostic(&pipeline, BufferRole::Lic, path)?;
    }
    if let Some(path) = &args.anisotropy {
        write_diagnostic(&pipeline, BufferRole::Colorized, path)?;
    }

    Ok(())
}
