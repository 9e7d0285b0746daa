//! PDF assembly: one capture, sliced into A4 pages

use super::pagination::{paginate, pixel_rows, PagePolicy};
use super::ExportError;
use image::{DynamicImage, GenericImageView};
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use std::io::{BufWriter, Write};
use std::path::Path;

const LAYER: &str = "Layer 1";

/// Write `capture` to `output` as a paginated PDF. Returns the page count.
/// The file appears only once it is complete.
pub fn assemble(
    capture: &DynamicImage,
    policy: &PagePolicy,
    title: &str,
    output: &Path,
) -> Result<usize, ExportError> {
    let rgb = DynamicImage::ImageRgb8(capture.to_rgb8());
    let (width, height) = rgb.dimensions();
    let segments = paginate(
        policy.scaled_height(width, height),
        policy.page_height,
        policy.margin,
    );
    if segments.is_empty() {
        return Err(ExportError::EmptyCapture);
    }

    let px_per_mm = width as f64 / policy.printable_width();
    let dpi = (width as f64 * 25.4 / policy.printable_width()) as f32;

    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(policy.page_width as f32),
        Mm(policy.page_height as f32),
        LAYER,
    );

    for (i, segment) in segments.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(
                Mm(policy.page_width as f32),
                Mm(policy.page_height as f32),
                LAYER,
            );
            doc.get_page(page).get_layer(layer)
        };

        let (top, bottom) = pixel_rows(segment, px_per_mm, height);
        if bottom == top {
            continue;
        }
        let slice = rgb.crop_imm(0, top, width, bottom - top);
        let slice_height = (bottom - top) as f64 / px_per_mm;

        // PDF y runs bottom-up; pin the slice under the top margin
        Image::from_dynamic_image(&slice).add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(policy.margin as f32)),
                translate_y: Some(Mm((policy.page_height - policy.margin - slice_height) as f32)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let io_err = |source: std::io::Error| ExportError::Io {
        path: output.to_path_buf(),
        source,
    };
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        doc.save(&mut writer)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        writer.flush().map_err(io_err)?;
    }
    temp.persist(output).map_err(|e| io_err(e.error))?;

    log::debug!("Wrote {} page(s) to {}", segments.len(), output.display());
    Ok(segments.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn striped(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |_, y| {
            if (y / 50) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([30, 30, 30])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_long_capture_spans_pages() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("report.pdf");
        // 170 px wide => 1 px per mm; 600 mm of content => 3 pages of 257 mm
        let pages = assemble(&striped(170, 600), &PagePolicy::A4, "Report", &output).unwrap();
        assert_eq!(pages, 3);
        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_short_capture_is_one_page() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("short.pdf");
        let pages = assemble(&striped(340, 100), &PagePolicy::A4, "Report", &output).unwrap();
        assert_eq!(pages, 1);
    }

    #[test]
    fn test_empty_capture_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("empty.pdf");
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let err = assemble(&empty, &PagePolicy::A4, "Report", &output).unwrap_err();
        assert!(matches!(err, ExportError::EmptyCapture));
        assert!(!output.exists());
    }
}
