#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use kuwahara_image as image;

#[doc(inline)]
pub use kuwahara_imgproc as imgproc;

#[doc(inline)]
pub use kuwahara_io as io;

#[doc(inline)]
pub use kuwahara_pipeline as pipeline;
