//! Bar layout.
//!
//! Splits the drawable width into `bar_count` integer-width bars. The width left
//! over after integer division (`mark`) is handed out one pixel at a time to the
//! leading bars, so the bars fill the budget without a gap on the right.

/// Default number of bars drawn across the window.
pub const BAR_COUNT: usize = 64;

/// Layout settings that only change when the configuration changes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub bar_count: usize,
    /// Pixels between neighbouring bars
    pub padding: i32,
    pub left_offset: i32,
    pub right_offset: i32,
    pub top_offset: i32,
    pub bottom_offset: i32,
    /// Multiplier applied to smoothed magnitudes before clamping to 1.0
    pub scale: f32,
    /// Use half of the drawable height (desktop mode)
    pub halve_height: bool,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            bar_count: BAR_COUNT,
            padding: 0,
            left_offset: 0,
            right_offset: 0,
            top_offset: 0,
            bottom_offset: 0,
            scale: 1.0,
            halve_height: false,
        }
    }
}

/// Derived drawing metrics, recomputed on resize only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Width available to the bars themselves, padding excluded
    pub drawable_width: i32,
    /// Width of every bar at or past `mark`, never below 1
    pub bar_width: i32,
    /// Number of leading bars that are one pixel wider
    pub mark: usize,
    pub drawable_height: f32,
    pub window_height: i32,
    /// Bottom edge every bar stands on
    pub baseline: i32,
}

impl Geometry {
    /// Computes the geometry for a window of the given size.
    ///
    /// Never fails: a window too small for the bars still gets one-pixel bars
    /// and simply overflows.
    pub fn compute(window_width: u32, window_height: u32, params: &LayoutParams) -> Self {
        let width = i32::try_from(window_width).unwrap_or(i32::MAX);
        let height = i32::try_from(window_height).unwrap_or(i32::MAX);
        let bars = i32::try_from(params.bar_count).unwrap_or(i32::MAX);

        let drawable_width = width
            .saturating_sub(params.right_offset)
            .saturating_sub(params.left_offset)
            .saturating_sub(params.padding.saturating_mul(bars.saturating_sub(1).max(0)));

        let (bar_width, mark) = if bars > 0 {
            (
                drawable_width.div_euclid(bars).max(1),
                drawable_width.rem_euclid(bars) as usize,
            )
        } else {
            (1, 0)
        };

        let mut drawable_height = height
            .saturating_sub(params.top_offset)
            .saturating_sub(params.bottom_offset) as f32;
        if params.halve_height {
            drawable_height /= 2.0;
        }

        Self {
            drawable_width,
            bar_width,
            mark,
            drawable_height: drawable_height.max(0.0),
            window_height: height,
            baseline: height.saturating_sub(params.bottom_offset),
        }
    }

    /// Width of the bar at `index`.
    pub fn bar_width_at(&self, index: usize) -> i32 {
        self.bar_width.saturating_add(i32::from(index < self.mark))
    }
}

/// One bar, anchored at `bottom` and growing upward by `height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub x: i32,
    pub width: i32,
    pub bottom: i32,
    pub height: f32,
}

/// Lays out one bar per index in `0..bar_count`.
///
/// Heights are `drawable_height * clamp(scale * value, 0, 1)`. Indices with no
/// smoothed value yet get a zero-height bar.
pub fn layout(smoothed: &[f32], params: &LayoutParams, geometry: &Geometry) -> Vec<BarRect> {
    let mut x = params.left_offset;

    (0..params.bar_count)
        .map(|i| {
            let width = geometry.bar_width_at(i);
            let value = smoothed.get(i).copied().filter(|v| v.is_finite()).unwrap_or(0.0);
            let level = (params.scale * value).clamp(0.0, 1.0);
            let bar = BarRect {
                x,
                width,
                bottom: geometry.baseline,
                height: geometry.drawable_height * level,
            };
            x = x.saturating_add(width.saturating_add(params.padding));
            bar
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(bar_count: usize, padding: i32) -> LayoutParams {
        LayoutParams {
            bar_count,
            padding,
            ..LayoutParams::default()
        }
    }

    #[test]
    fn test_remainder_goes_to_leading_bars() {
        // drawable width = 28 - 2 * 3 = 22
        let params = params(4, 2);
        let geometry = Geometry::compute(28, 10, &params);
        assert_eq!(geometry.drawable_width, 22);
        assert_eq!(geometry.bar_width, 5);
        assert_eq!(geometry.mark, 2);

        let bars = layout(&[0.0; 4], &params, &geometry);
        let widths: Vec<i32> = bars.iter().map(|b| b.width).collect();
        let xs: Vec<i32> = bars.iter().map(|b| b.x).collect();
        assert_eq!(widths, vec![6, 6, 5, 5]);
        assert_eq!(xs, vec![0, 8, 16, 23]);
        assert_eq!(widths.iter().sum::<i32>() + 2 * 3, 28);
    }

    #[test]
    fn test_width_sum_law() {
        for bar_count in 1..=12usize {
            for padding in 0..4 {
                let gaps = padding * (bar_count as i32 - 1);
                for drawable in bar_count as i32..300 {
                    let params = params(bar_count, padding);
                    let geometry = Geometry::compute((drawable + gaps) as u32, 10, &params);
                    assert_eq!(geometry.drawable_width, drawable);
                    assert!(geometry.mark < bar_count);

                    let total: i32 = (0..bar_count).map(|i| geometry.bar_width_at(i)).sum();
                    assert_eq!(total, drawable);
                }
            }
        }
    }

    #[test]
    fn test_last_bar_ends_at_right_edge() {
        let params = LayoutParams {
            padding: 1,
            left_offset: 3,
            right_offset: 2,
            ..LayoutParams::default()
        };
        let geometry = Geometry::compute(300, 40, &params);
        let bars = layout(&[], &params, &geometry);
        let last = bars.last().unwrap();
        assert_eq!(last.x + last.width, 300 - 2);
    }

    #[test]
    fn test_tiny_window_keeps_one_pixel_bars() {
        let params = params(64, 1);
        let geometry = Geometry::compute(20, 10, &params);
        assert!(geometry.drawable_width < 0);
        assert_eq!(geometry.bar_width, 1);
        assert!(geometry.mark < 64);

        let bars = layout(&[], &params, &geometry);
        assert_eq!(bars.len(), 64);
        assert!(bars.iter().all(|b| b.width >= 1));
    }

    #[test]
    fn test_zero_bars_does_not_panic() {
        let params = params(0, 2);
        let geometry = Geometry::compute(100, 10, &params);
        assert_eq!(geometry.bar_width, 1);
        assert_eq!(geometry.mark, 0);
        assert!(layout(&[0.5], &params, &geometry).is_empty());
    }

    #[test]
    fn test_height_is_clamped_to_drawable_height() {
        let params = LayoutParams {
            bar_count: 5,
            scale: 3.0,
            ..LayoutParams::default()
        };
        let geometry = Geometry::compute(50, 20, &params);
        let bars = layout(&[0.0, 0.1, 0.5, 2.0, -1.0], &params, &geometry);

        for bar in &bars {
            assert!(bar.height >= 0.0 && bar.height <= geometry.drawable_height);
        }
        assert_eq!(bars[0].height, 0.0);
        assert!((bars[1].height - 6.0).abs() < 1e-4);
        assert_eq!(bars[2].height, 20.0);
        assert_eq!(bars[3].height, 20.0);
        assert_eq!(bars[4].height, 0.0);
    }

    #[test]
    fn test_offsets_and_halved_height() {
        let params = LayoutParams {
            top_offset: 4,
            bottom_offset: 2,
            halve_height: true,
            ..LayoutParams::default()
        };
        let geometry = Geometry::compute(200, 30, &params);
        assert_eq!(geometry.drawable_height, 12.0);
        assert_eq!(geometry.baseline, 28);
        assert_eq!(geometry.window_height, 30);

        let bars = layout(&[1.0], &params, &geometry);
        assert_eq!(bars[0].bottom, 28);
        assert_eq!(bars[0].height, 12.0);
    }

    #[test]
    fn test_extreme_offsets_saturate() {
        let params = LayoutParams {
            padding: 1,
            left_offset: i32::MAX,
            ..LayoutParams::default()
        };
        let geometry = Geometry::compute(200, 40, &params);
        assert_eq!(geometry.bar_width, 1);
        let bars = layout(&[1.0; 64], &params, &geometry);
        assert_eq!(bars.len(), 64);
        assert_eq!(bars[0].x, i32::MAX);
        assert_eq!(bars[63].x, i32::MAX);

        let params = LayoutParams {
            padding: i32::MAX,
            left_offset: i32::MIN,
            right_offset: i32::MIN,
            top_offset: i32::MIN,
            bottom_offset: i32::MAX,
            ..LayoutParams::default()
        };
        let geometry = Geometry::compute(u32::MAX, u32::MAX, &params);
        assert!(geometry.mark < params.bar_count);
        assert!(geometry.drawable_height >= 0.0);
        assert_eq!(geometry.baseline, 0);
        let bars = layout(&[0.5; 64], &params, &geometry);
        assert!(bars.iter().all(|b| b.width >= 1 && b.height >= 0.0));
    }

    #[test]
    fn test_negative_drawable_height_is_floored() {
        let params = LayoutParams {
            top_offset: 8,
            bottom_offset: 8,
            ..LayoutParams::default()
        };
        let geometry = Geometry::compute(200, 10, &params);
        assert_eq!(geometry.drawable_height, 0.0);
    }

    #[test]
    fn test_missing_values_give_empty_bars() {
        let params = params(4, 0);
        let geometry = Geometry::compute(40, 10, &params);
        let bars = layout(&[1.0, 1.0], &params, &geometry);
        assert_eq!(bars[1].height, 10.0);
        assert_eq!(bars[2].height, 0.0);
        assert_eq!(bars[3].height, 0.0);
    }
}
