use kuwahara_image::Image;
use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how the rows of an image are distributed over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool and process rows in parallel.
    #[default]
    ParallelRows,

    /// Run sequentially on a single worker thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a dedicated thread pool with `n` threads.
    Fixed(usize),
}

/// Runs row-parallel work according to an [`ExecutionStrategy`].
///
/// The dedicated pool, if any, is built once on construction and reused for every call.
pub struct Executor {
    strategy: ExecutionStrategy,
    pool: Option<rayon::ThreadPool>,
}

impl Executor {
    /// Build an executor for the given strategy.
    ///
    /// # Errors
    ///
    /// Fails when the thread count is zero or the thread pool can not be created.
    pub fn new(strategy: ExecutionStrategy) -> Result<Self, ParallelError> {
        let threads = match strategy {
            ExecutionStrategy::ParallelRows => None,
            ExecutionStrategy::Serial => Some(1),
            ExecutionStrategy::Fixed(0) => return Err(ParallelError::InvalidThreadCount(0)),
            ExecutionStrategy::Fixed(n) => Some(n),
        };

        let pool = match threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ParallelError::BuildError(e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self { strategy, pool })
    }

    /// The strategy this executor was built with.
    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Run `op` inside the executor's pool. Parallel iterators used by `op` run on that pool.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

/// Apply a function to every row of the destination image in parallel.
///
/// The closure receives the row index and the interleaved samples of that row.
pub fn par_iter_rows<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send,
{
    let stride = dst.cols() * C;
    if stride == 0 {
        return;
    }
    dst.as_slice_mut()
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(row, chunk)| f(row, chunk));
}

/// Apply a function to every pixel of the destination image, rows in parallel.
///
/// The closure receives `(row, col)` and the channels of that pixel.
pub fn par_iter_pixels<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, usize, &mut [T]) + Send + Sync,
) where
    T: Send,
{
    par_iter_rows(dst, |row, chunk| {
        chunk
            .chunks_exact_mut(C)
            .enumerate()
            .for_each(|(col, pixel)| f(row, col, pixel));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuwahara_image::ImageError;

    #[test]
    fn test_par_iter_pixels() -> Result<(), ImageError> {
        let mut image = Image::<usize, 2>::from_size_val([3, 2].into(), 0)?;
        par_iter_pixels(&mut image, |row, col, px| {
            px[0] = row;
            px[1] = col;
        });
        assert_eq!(image.as_slice(), &[0, 0, 0, 1, 0, 2, 1, 0, 1, 1, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_executor_serial() -> Result<(), Box<dyn std::error::Error>> {
        let executor = Executor::new(ExecutionStrategy::Serial)?;
        let threads = executor.install(rayon::current_num_threads);
        assert_eq!(threads, 1);
        Ok(())
    }

    #[test]
    fn test_executor_fixed() -> Result<(), Box<dyn std::error::Error>> {
        let executor = Executor::new(ExecutionStrategy::Fixed(2))?;
        assert_eq!(executor.strategy(), ExecutionStrategy::Fixed(2));
        let mut image = Image::<f32, 1>::from_size_val([4, 4].into(), 0.0)?;
        executor.install(|| par_iter_rows(&mut image, |row, chunk| chunk.fill(row as f32)));
        assert_eq!(image.get([3, 0, 0]), Some(&3.0));
        Ok(())
    }

    #[test]
    fn test_executor_fixed_error() {
        let res = Executor::new(ExecutionStrategy::Fixed(0));
        assert!(matches!(res, Err(ParallelError::InvalidThreadCount(0))));
    }
}
