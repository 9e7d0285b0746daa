//! Page geometry and slicing of one tall capture into page-height segments

/// Fixed page layout for PDF export. All lengths in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePolicy {
    pub page_width: f64,
    pub page_height: f64,
    /// Uniform margin on all four sides
    pub margin: f64,
    /// Device pixels per CSS pixel used for the capture
    pub scale: f64,
    /// Viewport width of the capture, CSS pixels
    pub capture_width: u32,
    /// Tallest page the capture can hold, CSS pixels
    pub capture_max_height: u32,
}

impl PagePolicy {
    /// A4 portrait, 20 mm margins, 2x capture
    pub const A4: PagePolicy = PagePolicy {
        page_width: 210.0,
        page_height: 297.0,
        margin: 20.0,
        scale: 2.0,
        capture_width: 1000,
        capture_max_height: 12_000,
    };

    pub fn printable_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    pub fn printable_height(&self) -> f64 {
        self.page_height - 2.0 * self.margin
    }

    /// Height in millimetres of an image `width_px` x `height_px` scaled to the printable width
    pub fn scaled_height(&self, width_px: u32, height_px: u32) -> f64 {
        if width_px == 0 {
            return 0.0;
        }
        height_px as f64 * self.printable_width() / width_px as f64
    }
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self::A4
    }
}

/// One page's slice of the capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Distance from the top of the capture
    pub offset: f64,
    pub height: f64,
}

impl Segment {
    pub fn end(&self) -> f64 {
        self.offset + self.height
    }
}

/// Leftovers shorter than this are rounding noise, not a page
const EPSILON: f64 = 1e-6;

/// Slice content of height `total` into pages of height `page`, each losing
/// `margin` at top and bottom. Segments are contiguous, in order, and together
/// cover `total` exactly. Empty content or a page with no printable height
/// yields no segments.
pub fn paginate(total: f64, page: f64, margin: f64) -> Vec<Segment> {
    let printable = page - 2.0 * margin;
    if !total.is_finite() || !printable.is_finite() || total <= EPSILON || printable <= EPSILON {
        return Vec::new();
    }

    let count = ((total - EPSILON) / printable).ceil().max(1.0) as usize;
    (0..count)
        .map(|i| {
            let offset = i as f64 * printable;
            let height = if i + 1 == count {
                total - offset
            } else {
                printable
            };
            Segment { offset, height }
        })
        .collect()
}

/// Map a segment (millimetres) to a pixel row range of an image of `height_px`
/// rows, given `px_per_mm`. Adjacent segments map to adjacent ranges.
pub fn pixel_rows(segment: &Segment, px_per_mm: f64, height_px: u32) -> (u32, u32) {
    let to_px = |mm: f64| ((mm * px_per_mm).round().max(0.0) as u32).min(height_px);
    let start = to_px(segment.offset);
    let end = to_px(segment.end());
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_printable_area() {
        let p = PagePolicy::A4;
        assert_eq!(p.printable_width(), 170.0);
        assert_eq!(p.printable_height(), 257.0);
    }

    #[test]
    fn test_short_content_is_one_page() {
        let segments = paginate(100.0, 297.0, 20.0);
        assert_eq!(segments, vec![Segment { offset: 0.0, height: 100.0 }]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let segments = paginate(514.0, 297.0, 20.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].offset, 257.0);
        assert_eq!(segments[1].height, 257.0);
    }

    #[test]
    fn test_last_page_is_partial() {
        let segments = paginate(600.0, 297.0, 20.0);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].offset, 514.0);
        assert!((segments[2].height - 86.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(paginate(0.0, 297.0, 20.0).is_empty());
        assert!(paginate(100.0, 40.0, 20.0).is_empty());
        assert!(paginate(f64::NAN, 297.0, 20.0).is_empty());
    }

    #[test]
    fn test_scaled_height() {
        let p = PagePolicy::A4;
        assert_eq!(p.scaled_height(1700, 3400), 340.0);
        assert_eq!(p.scaled_height(0, 3400), 0.0);
    }

    #[test]
    fn test_pixel_rows_are_adjacent() {
        let segments = paginate(600.0, 297.0, 20.0);
        let px_per_mm = 10.0;
        let rows: Vec<(u32, u32)> = segments
            .iter()
            .map(|s| pixel_rows(s, px_per_mm, 6000))
            .collect();
        assert_eq!(rows, vec![(0, 2570), (2570, 5140), (5140, 6000)]);
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn segments_cover_total_without_overlap(
            total in 0.1f64..20_000.0,
            page in 50.0f64..500.0,
            margin in 0.0f64..20.0,
        ) {
            let segments = paginate(total, page, margin);
            let printable = page - 2.0 * margin;
            prop_assert!(!segments.is_empty());
            prop_assert_eq!(segments[0].offset, 0.0);
            for pair in segments.windows(2) {
                prop_assert!((pair[0].end() - pair[1].offset).abs() < 1e-6);
            }
            for s in &segments {
                prop_assert!(s.height > 0.0);
                prop_assert!(s.height <= printable + 1e-5);
            }
            let last = segments[segments.len() - 1];
            prop_assert!((last.end() - total).abs() < 1e-6);
        }

        #[test]
        fn page_count_is_ceiling(total in 1.0f64..10_000.0) {
            let segments = paginate(total, 297.0, 20.0);
            let expected = ((total - 1e-6) / 257.0).ceil().max(1.0) as usize;
            prop_assert_eq!(segments.len(), expected);
        }
    }
}
