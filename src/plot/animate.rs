//! Animation exporter
//!
//! Renders one frame per selected zone and serializes the ordered frames
//! into a single animated GIF at a fixed playback rate. Frames are drawn
//! independently but against the same resolved color scale and colormap, so
//! the sequence is visually comparable frame to frame: the scale is fixed
//! first, then every frame is rendered against it.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use super::error::{PlotError, Result};
use super::parser::{AxisSelection, Dataset};
use super::render::{render_figure, Figure};
use super::scale::ColorScale;
use crate::config::RenderConfig;

/// Default delay between frames, in milliseconds
pub const DEFAULT_FRAME_DELAY_MS: u32 = 500;

/// Render one equally-sized frame per zone, in selection order
///
/// Each frame is a complete single-row figure (axes, colorbar, zone title)
/// normalized against the already-resolved scale.
pub fn render_frames(
    dataset: &Dataset,
    zones: &[usize],
    axes: &AxisSelection,
    scale: &ColorScale,
    config: &RenderConfig,
) -> Result<Vec<Figure>> {
    zones
        .iter()
        .map(|&zone| render_figure(std::slice::from_ref(dataset), &[zone], axes, scale, config))
        .collect()
}

/// Serialize ordered frames into an animated GIF byte stream
pub fn encode_gif(frames: &[Figure], delay_ms: u32) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(PlotError::Render("no frames to encode".to_string()));
    }

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| PlotError::Render(format!("GIF encoding failed: {}", e)))?;

        for figure in frames {
            let rgba = rgb_to_rgba(figure);
            let frame = Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            encoder
                .encode_frame(frame)
                .map_err(|e| PlotError::Render(format!("GIF encoding failed: {}", e)))?;
        }
    }
    Ok(out)
}

/// Export an animated GIF for exactly one dataset
///
/// Requesting more than one dataset is rejected before any rendering work
/// begins; the multi-column layout only exists for static figures.
pub fn export_animation(
    datasets: &[Dataset],
    zones: &[usize],
    axes: &AxisSelection,
    scale: &ColorScale,
    config: &RenderConfig,
    delay_ms: u32,
) -> Result<Vec<u8>> {
    let dataset = match datasets {
        [single] => single,
        _ => {
            return Err(PlotError::UnsupportedCombination(format!(
                "animation export supports exactly one dataset, got {}",
                datasets.len()
            )))
        }
    };

    let frames = render_frames(dataset, zones, axes, scale, config)?;
    encode_gif(&frames, delay_ms)
}

fn rgb_to_rgba(figure: &Figure) -> RgbaImage {
    let mut rgba = Vec::with_capacity(figure.rgb.len() / 3 * 4);
    for px in figure.rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    RgbaImage::from_raw(figure.width, figure.height, rgba)
        .expect("buffer length matches figure dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::parser::parse_text;
    use std::path::Path;

    fn dataset(label: &str) -> Dataset {
        parse_text(
            "Variables = x y P\nboilerplate\n1 1 10\n2 2 20\nZONE\n1 1 30\n2 2 40\n",
            Path::new(label),
            label.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_datasets_rejected_before_rendering() {
        let datasets = vec![dataset("a"), dataset("b")];
        let axes = AxisSelection::new("x", "y", "P");
        let scale = ColorScale {
            min: 10.0,
            max: 40.0,
        };
        let config = RenderConfig::default();

        let err = export_animation(
            &datasets,
            &[0, 1],
            &axes,
            &scale,
            &config,
            DEFAULT_FRAME_DELAY_MS,
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::UnsupportedCombination(_)));
    }

    #[test]
    fn test_gif_export_single_dataset() {
        let ds = dataset("a");
        let axes = AxisSelection::new("x", "y", "P");
        let scale = ColorScale {
            min: 10.0,
            max: 40.0,
        };
        let config = RenderConfig {
            width: 200,
            height: 200,
            ..RenderConfig::default()
        };

        let gif = export_animation(
            std::slice::from_ref(&ds),
            &[0, 1],
            &axes,
            &scale,
            &config,
            100,
        )
        .unwrap();
        // GIF89a signature
        assert_eq!(&gif[..6], b"GIF89a");
    }

    #[test]
    fn test_frames_equal_size() {
        let ds = dataset("a");
        let axes = AxisSelection::new("x", "y", "P");
        let scale = ColorScale {
            min: 10.0,
            max: 40.0,
        };
        let config = RenderConfig {
            width: 200,
            height: 150,
            ..RenderConfig::default()
        };

        let frames = render_frames(&ds, &[0, 1], &axes, &scale, &config).unwrap();
        assert_eq!(frames.len(), 2);
        for frame in &frames {
            assert_eq!((frame.width, frame.height), (200, 150));
        }
    }

    #[test]
    fn test_encode_gif_rejects_empty() {
        assert!(matches!(
            encode_gif(&[], 100),
            Err(PlotError::Render(_))
        ));
    }
}
