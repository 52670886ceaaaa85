//! Media rendering
//!
//! Entry media is authored at full size and shrunk here for the web. Outputs are
//! written into the media directory and reused on later runs: if the output file
//! already exists it is not regenerated unless `force_rewrite` is set. The cache
//! is keyed on the output name only, so an edited source with the same name is
//! not picked up without a forced rewrite.
//!
//! Animated GIFs stay animated. Animated PNG and WebP sources are detected but
//! flattened to their first frame, since neither format can be encoded here;
//! a warning names the file.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, DynamicImage, Frame, ImageDecoder, ImageFormat, ImageReader, Rgba, RgbaImage};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ImagesConfig;
use crate::error::{PortfolioError, Result};
use crate::markdown::render_markdown;
use crate::schema::LocalMedia;

/// Rendered form of a [`LocalMedia`]. `path` is relative to the media directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLocalMedia {
    /// HTML
    pub label: String,
    pub path: String,
}

/// How an individual image is modified for inclusion in the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConfig {
    /// Bounding box the output is scaled to fit in
    pub max_dimensions: (u32, u32),
    /// Encoder quality for lossy formats
    pub quality: u8,
    pub force_rewrite: bool,
}

/// The three size profiles used across the portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSizes {
    pub large: ImageConfig,
    pub small: ImageConfig,
    pub icon: ImageConfig,
}

impl From<&ImagesConfig> for ImageSizes {
    fn from(config: &ImagesConfig) -> Self {
        let profile = |max_dimensions| ImageConfig {
            max_dimensions,
            quality: config.quality,
            force_rewrite: config.force_rewrite,
        };
        Self {
            large: profile(config.large_max_dimensions),
            small: profile(config.small_max_dimensions),
            icon: profile(config.icon_max_dimensions),
        }
    }
}

/// Copies and processes an image from its entry directory into `media_directory`.
///
/// `new_file_name` overrides the output name, which otherwise matches the source.
pub fn render_local_media(
    media_directory: &Path,
    yaml_path: &Path,
    new_file_name: Option<&str>,
    image_config: &ImageConfig,
    local_media: &LocalMedia,
) -> Result<RenderedLocalMedia> {
    let source = resolve_media_path(yaml_path, &local_media.path);
    let name = match new_file_name {
        Some(name) => name.to_string(),
        None => local_media
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PortfolioError::MediaSourceMissing { path: source.clone() })?,
    };
    let output_path = media_directory.join(&name);

    if output_path.exists() && !image_config.force_rewrite {
        debug!(output = %output_path.display(), "Reusing rendered media");
    } else {
        transform_image(&source, &output_path, image_config)?;
        debug!(source = %source.display(), output = %output_path.display(), "Rendered media");
    }

    Ok(RenderedLocalMedia {
        label: render_markdown(&local_media.label),
        path: name,
    })
}

/// Media paths in a descriptor are relative to the descriptor.
pub fn resolve_media_path(yaml_path: &Path, media_path: &Path) -> PathBuf {
    yaml_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(media_path)
}

/// Renders a list of media on a pool of `workers` threads, preserving order.
///
/// Only the first item with a given file name is rendered; later items with
/// the same name reuse its output. Every rendered item writes a distinct file,
/// so workers share nothing.
pub fn render_media_list(
    pool: &rayon::ThreadPool,
    media_directory: &Path,
    yaml_path: &Path,
    image_config: &ImageConfig,
    media: &[LocalMedia],
) -> Result<Vec<RenderedLocalMedia>> {
    let mut first_by_name: HashMap<Option<&OsStr>, usize> = HashMap::new();
    let owner: Vec<usize> = media
        .iter()
        .enumerate()
        .map(|(index, item)| *first_by_name.entry(item.path.file_name()).or_insert(index))
        .collect();

    let rendered: Vec<Option<RenderedLocalMedia>> = pool.install(|| {
        media
            .par_iter()
            .enumerate()
            .map(|(index, item)| {
                if owner[index] == index {
                    render_local_media(media_directory, yaml_path, None, image_config, item).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect::<Result<_>>()
    })?;

    Ok(media
        .iter()
        .zip(&owner)
        .filter_map(|(item, &first)| {
            rendered[first].as_ref().map(|output| RenderedLocalMedia {
                label: render_markdown(&item.label),
                path: output.path.clone(),
            })
        })
        .collect())
}

/// Largest size that fits `(width, height)` in the bounding box without upscaling.
pub fn bounded_dimensions(width: u32, height: u32, max_dimensions: (u32, u32)) -> (u32, u32) {
    let (max_width, max_height) = max_dimensions;
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

fn transform_image(source: &Path, output_path: &Path, image_config: &ImageConfig) -> Result<()> {
    if !source.is_file() {
        return Err(PortfolioError::MediaSourceMissing {
            path: source.to_path_buf(),
        });
    }

    let reader = ImageReader::open(source)?
        .with_guessed_format()?;

    if reader.format() == Some(ImageFormat::Gif) {
        let frames = read_gif_frames(source)?;
        if frames.len() > 1 {
            return write_animation(frames, output_path, image_config);
        }
    } else if is_flattened_animation(source, reader.format())? {
        warn!(source = %source.display(), "Animated source, keeping only the first frame");
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| PortfolioError::image(source, e))?;
    let orientation = decoder
        .orientation()
        .map_err(|e| PortfolioError::image(source, e))?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| PortfolioError::image(source, e))?;
    image.apply_orientation(orientation);

    let image = flatten_alpha(image);
    let (width, height) = bounded_dimensions(image.width(), image.height(), image_config.max_dimensions);
    let image = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Lanczos3)
    };

    save_image(&image, output_path, image_config.quality)
}

/// Whether `source` is an animation in a format only its first frame survives.
fn is_flattened_animation(source: &Path, format: Option<ImageFormat>) -> Result<bool> {
    let reader = || File::open(source).map(BufReader::new);
    match format {
        Some(ImageFormat::Png) => PngDecoder::new(reader()?)
            .and_then(|decoder| decoder.is_apng())
            .map_err(|e| PortfolioError::image(source, e)),
        Some(ImageFormat::WebP) => WebPDecoder::new(reader()?)
            .map(|decoder| decoder.has_animation())
            .map_err(|e| PortfolioError::image(source, e)),
        _ => Ok(false),
    }
}

fn read_gif_frames(source: &Path) -> Result<Vec<Frame>> {
    let decoder = GifDecoder::new(BufReader::new(File::open(source)?))
        .map_err(|e| PortfolioError::image(source, e))?;
    decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| PortfolioError::image(source, e))
}

/// Each frame is bounded independently; delays and looping are kept.
fn write_animation(frames: Vec<Frame>, output_path: &Path, image_config: &ImageConfig) -> Result<()> {
    let frames = frames.into_iter().map(|frame| {
        let delay = frame.delay();
        let (left, top) = (frame.left(), frame.top());
        let buffer = frame.into_buffer();
        let (width, height) = bounded_dimensions(buffer.width(), buffer.height(), image_config.max_dimensions);
        let buffer = if (width, height) == buffer.dimensions() {
            buffer
        } else {
            imageops::resize(&buffer, width, height, FilterType::Lanczos3)
        };
        Frame::from_parts(buffer, left, top, delay)
    });

    let mut encoder = GifEncoder::new(BufWriter::new(File::create(output_path)?));
    encoder
        .set_repeat(Repeat::Infinite)
        .map_err(|e| PortfolioError::image(output_path, e))?;
    encoder
        .encode_frames(frames)
        .map_err(|e| PortfolioError::image(output_path, e))
}

/// Alpha is composited onto black, then dropped.
fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return DynamicImage::ImageRgb8(image.to_rgb8());
    }

    let foreground = image.to_rgba8();
    let mut background = RgbaImage::from_pixel(foreground.width(), foreground.height(), Rgba([0, 0, 0, 255]));
    imageops::overlay(&mut background, &foreground, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(background).to_rgb8())
}

fn save_image(image: &DynamicImage, output_path: &Path, quality: u8) -> Result<()> {
    let format = ImageFormat::from_path(output_path).map_err(|e| PortfolioError::image(output_path, e))?;
    match format {
        ImageFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(output_path)?);
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
            image
                .write_with_encoder(encoder)
                .map_err(|e| PortfolioError::image(output_path, e))
        }
        other => image
            .save_with_format(output_path, other)
            .map_err(|e| PortfolioError::image(output_path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Delay, Rgb, RgbImage};
    use tempfile::tempdir;

    fn media(path: &str) -> LocalMedia {
        LocalMedia {
            label: "A *test* image.".to_string(),
            path: PathBuf::from(path),
        }
    }

    fn config(max: (u32, u32)) -> ImageConfig {
        ImageConfig {
            max_dimensions: max,
            quality: 80,
            force_rewrite: false,
        }
    }

    #[test]
    fn test_bounded_dimensions() {
        assert_eq!(bounded_dimensions(400, 200, (100, 100)), (100, 50));
        assert_eq!(bounded_dimensions(200, 400, (100, 100)), (50, 100));
        assert_eq!(bounded_dimensions(50, 20, (100, 100)), (50, 20));
        assert_eq!(bounded_dimensions(1000, 1, (10, 10)), (10, 1));
    }

    #[test]
    fn test_downscales_and_renders_label() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        RgbImage::from_pixel(400, 200, Rgb([200, 10, 10]))
            .save(src.path().join("photo.png"))
            .unwrap();
        let yaml = src.path().join("entry.yaml");

        let rendered = render_local_media(out.path(), &yaml, None, &config((100, 100)), &media("photo.png")).unwrap();
        assert_eq!(rendered.path, "photo.png");
        assert_eq!(rendered.label, "<p>A <em>test</em> image.</p>");

        let written = image::open(out.path().join("photo.png")).unwrap();
        assert_eq!((written.width(), written.height()), (100, 50));
    }

    #[test]
    fn test_never_upscales() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        RgbImage::new(30, 20).save(src.path().join("tiny.png")).unwrap();
        let yaml = src.path().join("entry.yaml");

        render_local_media(out.path(), &yaml, Some("tiny_icon.png"), &config((100, 100)), &media("tiny.png")).unwrap();
        let written = image::open(out.path().join("tiny_icon.png")).unwrap();
        assert_eq!((written.width(), written.height()), (30, 20));
    }

    #[test]
    fn test_alpha_flattened_onto_black() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 0]))
            .save(src.path().join("clear.png"))
            .unwrap();
        let yaml = src.path().join("entry.yaml");

        render_local_media(out.path(), &yaml, None, &config((100, 100)), &media("clear.png")).unwrap();
        let written = image::open(out.path().join("clear.png")).unwrap();
        assert!(!written.color().has_alpha());
        assert_eq!(written.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_missing_source() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let yaml = src.path().join("entry.yaml");
        let result = render_local_media(out.path(), &yaml, None, &config((100, 100)), &media("nope.png"));
        assert!(matches!(result, Err(PortfolioError::MediaSourceMissing { .. })));
    }

    #[test]
    fn test_existing_output_is_reused() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        RgbImage::new(300, 300).save(src.path().join("photo.png")).unwrap();
        let yaml = src.path().join("entry.yaml");
        std::fs::write(out.path().join("photo.png"), b"already here").unwrap();

        render_local_media(out.path(), &yaml, None, &config((100, 100)), &media("photo.png")).unwrap();
        assert_eq!(std::fs::read(out.path().join("photo.png")).unwrap(), b"already here");

        let forced = ImageConfig {
            force_rewrite: true,
            ..config((100, 100))
        };
        render_local_media(out.path(), &yaml, None, &forced, &media("photo.png")).unwrap();
        let written = image::open(out.path().join("photo.png")).unwrap();
        assert_eq!((written.width(), written.height()), (100, 100));
    }

    #[test]
    fn test_animated_gif_keeps_frames() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let frames = [Rgba([255, 0, 0, 255]), Rgba([0, 0, 255, 255]), Rgba([0, 255, 0, 255])]
            .into_iter()
            .map(|color| Frame::from_parts(RgbaImage::from_pixel(200, 100, color), 0, 0, Delay::from_numer_denom_ms(100, 1)));
        {
            let file = File::create(src.path().join("spin.gif")).unwrap();
            let mut encoder = GifEncoder::new(file);
            encoder.set_repeat(Repeat::Infinite).unwrap();
            encoder.encode_frames(frames).unwrap();
        }
        let yaml = src.path().join("entry.yaml");

        render_local_media(out.path(), &yaml, None, &config((50, 50)), &media("spin.gif")).unwrap();

        let decoder = GifDecoder::new(BufReader::new(File::open(out.path().join("spin.gif")).unwrap())).unwrap();
        let written = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(written[0].buffer().dimensions(), (50, 25));
        assert_eq!(written[1].delay(), Delay::from_numer_denom_ms(100, 1));
    }

    #[test]
    fn test_media_list_preserves_order() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let names: Vec<String> = (0..7).map(|i| format!("img{}.png", i)).collect();
        for name in &names {
            RgbImage::new(20, 20).save(src.path().join(name)).unwrap();
        }
        let yaml = src.path().join("entry.yaml");
        let pool = rayon::ThreadPoolBuilder::new().num_threads(5).build().unwrap();
        let list: Vec<LocalMedia> = names.iter().map(|n| media(n)).collect();

        let rendered = render_media_list(&pool, out.path(), &yaml, &config((10, 10)), &list).unwrap();
        let paths: Vec<&str> = rendered.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, names.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn test_media_list_shared_name_rendered_once() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        RgbImage::new(40, 40).save(src.path().join("board.png")).unwrap();
        RgbImage::new(40, 40).save(src.path().join("case.png")).unwrap();
        let yaml = src.path().join("entry.yaml");
        let pool = rayon::ThreadPoolBuilder::new().num_threads(5).build().unwrap();
        let list = vec![
            LocalMedia {
                label: "Front.".to_string(),
                path: PathBuf::from("board.png"),
            },
            media("case.png"),
            LocalMedia {
                label: "Back.".to_string(),
                path: PathBuf::from("./board.png"),
            },
        ];

        let rendered = render_media_list(&pool, out.path(), &yaml, &config((10, 10)), &list).unwrap();
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0].path, "board.png");
        assert_eq!(rendered[2].path, "board.png");
        assert_eq!(rendered[0].label, "<p>Front.</p>");
        assert_eq!(rendered[2].label, "<p>Back.</p>");
        assert_eq!(image::image_dimensions(out.path().join("board.png")).unwrap(), (10, 10));
    }

    #[test]
    fn test_still_png_is_not_a_flattened_animation() {
        let src = tempdir().unwrap();
        let path = src.path().join("still.png");
        RgbImage::new(8, 8).save(&path).unwrap();
        assert!(!is_flattened_animation(&path, Some(ImageFormat::Png)).unwrap());
        assert!(!is_flattened_animation(&path, None).unwrap());
    }
}
