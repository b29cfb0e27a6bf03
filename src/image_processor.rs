//! # Image Processing Module
//!
//! Codec adapter used by the compression routine. Everything here is a pure
//! function of the input buffer: no filesystem access, no logging of outcomes.
//!
//! ## Pipelines
//!
//! | Source | Re-encode                                             | WebP copy                 |
//! |--------|-------------------------------------------------------|---------------------------|
//! | JPEG   | mozjpeg at `quality`, optimized Huffman + progressive | libwebp at `webp_quality` |
//! | PNG    | `image` PNG encoder, `Best` + adaptive filter         | libwebp at `webp_quality` |
//!
//! The PNG target carries `quality` as well. The lossless encoder has no use
//! for it; it is handed over unchanged so the PNG and JPEG paths receive the
//! same knob.
//!
//! ## Seam
//!
//! [`ImageCodec`] is the boundary between the traversal policy and the pixel
//! work. [`ImageProcessor`] is the production implementation; tests use
//! a scripted codec that records every call.

use crate::error::CompressError;
use crate::file_manager::SourceFormat;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// What a buffer should be re-encoded into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeTarget {
    /// Lossy JPEG at the given quality (0-100)
    Jpeg { quality: u8 },
    /// Lossless PNG at the strongest compression level
    Png { quality: u8 },
    /// Lossy WebP at the given quality (0-100)
    WebP { quality: u8 },
}

impl EncodeTarget {
    /// Re-encode target for a source format, keeping the same format
    pub fn recompress(source: SourceFormat, quality: u8) -> Self {
        match source {
            SourceFormat::Jpeg => Self::Jpeg { quality },
            SourceFormat::Png => Self::Png { quality },
        }
    }
}

/// Trait for codec backends.
///
/// Implementations must be shareable across the blocking pool, since every
/// file encodes on its own blocking task.
pub trait ImageCodec: Send + Sync {
    /// Decode `input` as `source` and encode it as `target`.
    fn encode(
        &self,
        input: &[u8],
        source: SourceFormat,
        target: EncodeTarget,
    ) -> Result<Vec<u8>, CompressError>;
}

/// Production codec backed by `mozjpeg`, `image` and `webp`
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    fn decode(input: &[u8], source: SourceFormat) -> Result<DynamicImage, CompressError> {
        let format = match source {
            SourceFormat::Jpeg => ImageFormat::Jpeg,
            SourceFormat::Png => ImageFormat::Png,
        };
        Ok(image::load_from_memory_with_format(input, format)?)
    }

    /// mozjpeg with optimized Huffman tables and progressive scans.
    ///
    /// libjpeg reports fatal errors by unwinding, so the whole compression is
    /// run under `catch_unwind` and turned into `CompressError::Jpeg`.
    fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let (color_space, pixels) = match img {
            DynamicImage::ImageLuma8(gray) => (ColorSpace::JCS_GRAYSCALE, gray.as_raw().clone()),
            other => (ColorSpace::JCS_RGB, other.to_rgb8().into_raw()),
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
            let mut comp = Compress::new(color_space);
            comp.set_size(width, height);
            comp.set_quality(quality.clamp(1, 100) as f32);
            comp.set_optimize_coding(true);
            comp.set_progressive_mode();

            let mut started = comp.start_compress(Vec::new())?;
            started.write_scanlines(&pixels)?;
            started.finish()
        }));

        match result {
            Ok(encoded) => Ok(encoded?),
            Err(_) => Err(CompressError::Jpeg(format!(
                "mozjpeg failed on {}x{} image",
                width, height
            ))),
        }
    }

    fn encode_png(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
        debug!("PNG encode: best compression, quality {} (unused by lossless encoder)", quality);

        let mut out = Vec::new();
        let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
        img.write_with_encoder(encoder)?;
        Ok(out)
    }

    fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CompressError> {
        let (width, height) = (img.width(), img.height());

        let memory = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                .encode_simple(false, quality.min(100) as f32)
        } else {
            let rgb = img.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height)
                .encode_simple(false, quality.min(100) as f32)
        }
        .map_err(|e| CompressError::WebP(format!("{:?}", e)))?;

        Ok(memory.to_vec())
    }
}

impl ImageCodec for ImageProcessor {
    fn encode(
        &self,
        input: &[u8],
        source: SourceFormat,
        target: EncodeTarget,
    ) -> Result<Vec<u8>, CompressError> {
        let img = Self::decode(input, source)?;

        match target {
            EncodeTarget::Jpeg { quality } => Self::encode_jpeg(&img, quality),
            EncodeTarget::Png { quality } => Self::encode_png(&img, quality),
            EncodeTarget::WebP { quality } => Self::encode_webp(&img, quality),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageEncoder, RgbImage, RgbaImage};
    use std::sync::Mutex;

    /// Prefix marking the scripted WebP output; the original bytes follow it
    pub const WEBP_MAGIC: &[u8] = b"RIFFWEBP";

    /// One call recorded by [`ScriptedCodec`]
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedEncode {
        pub input_len: usize,
        pub source: SourceFormat,
        pub target: EncodeTarget,
    }

    /// Codec returning buffers of preset sizes instead of decoding anything.
    ///
    /// - JPEG/PNG targets yield `jpeg_len` / `png_len` bytes of `b'c'`
    /// - WebP yields `WEBP_MAGIC` followed by the input, so tests can check
    ///   which bytes the copy was built from
    /// - inputs starting with `b"corrupt"` fail like an undecodable image
    /// - with `fail_webp` set, only the WebP target fails
    #[derive(Default)]
    pub struct ScriptedCodec {
        pub jpeg_len: usize,
        pub png_len: usize,
        pub fail_webp: bool,
        pub calls: Mutex<Vec<RecordedEncode>>,
    }

    impl ScriptedCodec {
        pub fn new(jpeg_len: usize, png_len: usize) -> Self {
            Self {
                jpeg_len,
                png_len,
                fail_webp: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_webp(jpeg_len: usize, png_len: usize) -> Self {
            Self {
                fail_webp: true,
                ..Self::new(jpeg_len, png_len)
            }
        }

        pub fn recorded(&self) -> Vec<RecordedEncode> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageCodec for ScriptedCodec {
        fn encode(
            &self,
            input: &[u8],
            source: SourceFormat,
            target: EncodeTarget,
        ) -> Result<Vec<u8>, CompressError> {
            self.calls.lock().unwrap().push(RecordedEncode {
                input_len: input.len(),
                source,
                target,
            });

            if input.starts_with(b"corrupt") {
                return Err(CompressError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "scripted decode failure",
                )));
            }

            if self.fail_webp && matches!(target, EncodeTarget::WebP { .. }) {
                return Err(CompressError::WebP("scripted WebP failure".to_string()));
            }

            Ok(match target {
                EncodeTarget::Jpeg { .. } => vec![b'c'; self.jpeg_len],
                EncodeTarget::Png { .. } => vec![b'c'; self.png_len],
                EncodeTarget::WebP { .. } => [WEBP_MAGIC, input].concat(),
            })
        }
    }

    /// Encode a noisy RGB image as JPEG at maximum quality
    pub fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(31) ^ y.wrapping_mul(17)).wrapping_mul(2654435761) >> 24;
            image::Rgb([v as u8, (x * 7 % 256) as u8, (y * 13 % 256) as u8])
        });
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 100)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    /// Encode an RGBA gradient as PNG with the fastest settings
    pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    #[test]
    fn recompress_target_follows_source() {
        assert_eq!(
            EncodeTarget::recompress(SourceFormat::Jpeg, 72),
            EncodeTarget::Jpeg { quality: 72 }
        );
        assert_eq!(
            EncodeTarget::recompress(SourceFormat::Png, 72),
            EncodeTarget::Png { quality: 72 }
        );
    }

    #[test]
    fn jpeg_recompression_at_lower_quality_shrinks() {
        let original = noisy_jpeg(128, 96);
        let codec = ImageProcessor::new();

        let out = codec
            .encode(&original, SourceFormat::Jpeg, EncodeTarget::Jpeg { quality: 50 })
            .unwrap();

        assert!(out.len() < original.len());
        let decoded = image::load_from_memory_with_format(&out, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (128, 96));
    }

    #[test]
    fn mozjpeg_output_not_larger_than_baseline_encoder() {
        let original = noisy_jpeg(160, 120);
        let decoded = image::load_from_memory_with_format(&original, ImageFormat::Jpeg).unwrap();

        let mut baseline = Vec::new();
        decoded
            .write_with_encoder(JpegEncoder::new_with_quality(&mut baseline, 75))
            .unwrap();

        let out = ImageProcessor::new()
            .encode(&original, SourceFormat::Jpeg, EncodeTarget::Jpeg { quality: 75 })
            .unwrap();

        assert!(
            out.len() <= baseline.len(),
            "mozjpeg {} bytes, baseline {} bytes",
            out.len(),
            baseline.len()
        );
    }

    #[test]
    fn grayscale_jpeg_stays_grayscale() {
        let img = image::GrayImage::from_fn(64, 48, |x, y| image::Luma([((x * 3 + y * 5) % 256) as u8]));
        let mut original = Vec::new();
        JpegEncoder::new_with_quality(&mut original, 100)
            .write_image(img.as_raw(), 64, 48, image::ExtendedColorType::L8)
            .unwrap();

        let out = ImageProcessor::new()
            .encode(&original, SourceFormat::Jpeg, EncodeTarget::Jpeg { quality: 60 })
            .unwrap();

        let decoded = image::load_from_memory_with_format(&out, ImageFormat::Jpeg).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn png_recompression_is_lossless() {
        let original = gradient_png(64, 64);
        let codec = ImageProcessor::new();

        let out = codec
            .encode(&original, SourceFormat::Png, EncodeTarget::recompress(SourceFormat::Png, 80))
            .unwrap();

        let before = image::load_from_memory(&original).unwrap().to_rgba8();
        let after = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(before, after);
    }

    #[test]
    fn webp_output_has_riff_header() {
        let original = gradient_png(32, 32);
        let codec = ImageProcessor::new();

        let out = codec
            .encode(&original, SourceFormat::Png, EncodeTarget::WebP { quality: 80 })
            .unwrap();

        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
    }

    #[test]
    fn garbage_input_is_an_image_error() {
        let codec = ImageProcessor::new();
        let result = codec.encode(b"not a jpeg", SourceFormat::Jpeg, EncodeTarget::Jpeg { quality: 80 });
        assert!(matches!(result, Err(CompressError::Image(_))));
    }
}
