//! Conversion between absolute screen rectangles and monitor-relative
//! fractions.
//!
//! A window's position is remembered as a [`RelativeRect`]: each edge is a
//! fraction of the owning monitor's width or height, measured from the
//! monitor's origin.  Restoring the window on another (possibly differently
//! sized) display multiplies those fractions back out against the new
//! monitor's bounds.
//!
//! Fractions are never clamped to `[0, 1]`.  A window hanging off the edge
//! of its display keeps hanging off the edge after being restored.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An absolute rectangle in virtual-screen pixels.
///
/// `right` and `bottom` are exclusive, matching what the window system
/// reports for window and monitor bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from an origin and a size.
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Whether the point `(x, y)` lies inside this rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// A rectangle expressed as fractions of a monitor's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativeRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl fmt::Display for RelativeRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3},{:.3})-({:.3},{:.3})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

fn check_bounds(monitor: &Rect) -> Result<(f64, f64), CoreError> {
    let (w, h) = (monitor.width(), monitor.height());
    if w <= 0 || h <= 0 {
        return Err(CoreError::InvalidGeometry {
            width: w,
            height: h,
        });
    }
    Ok((w as f64, h as f64))
}

/// Express `window` as fractions of `monitor`.
///
/// Fails with [`CoreError::InvalidGeometry`] when the monitor has no area.
pub fn to_relative(monitor: &Rect, window: &Rect) -> Result<RelativeRect, CoreError> {
    let (w, h) = check_bounds(monitor)?;
    Ok(RelativeRect {
        left: (window.left - monitor.left) as f64 / w,
        top: (window.top - monitor.top) as f64 / h,
        right: (window.right - monitor.left) as f64 / w,
        bottom: (window.bottom - monitor.top) as f64 / h,
    })
}

/// Map a relative rectangle back onto `monitor`, rounding to whole pixels.
pub fn to_absolute(monitor: &Rect, rel: &RelativeRect) -> Result<Rect, CoreError> {
    let (w, h) = check_bounds(monitor)?;
    let x = |f: f64| (monitor.left as f64 + f * w).round() as i32;
    let y = |f: f64| (monitor.top as f64 + f * h).round() as i32;
    Ok(Rect {
        left: x(rel.left),
        top: y(rel.top),
        right: x(rel.right),
        bottom: y(rel.bottom),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fhd_at(x: i32, y: i32) -> Rect {
        Rect::from_origin_size(x, y, 1920, 1080)
    }

    fn close(a: i32, b: i32) -> bool {
        (a - b).abs() <= 1
    }

    #[test]
    fn relative_of_full_monitor_is_unit() {
        let m = fhd_at(1920, 0);
        let r = to_relative(&m, &m).unwrap();
        assert_eq!(
            r,
            RelativeRect {
                left: 0.0,
                top: 0.0,
                right: 1.0,
                bottom: 1.0
            }
        );
    }

    #[test]
    fn relative_is_measured_from_monitor_origin() {
        let m = fhd_at(1920, 0);
        let w = Rect::new(1920 + 480, 270, 1920 + 960, 540);
        let r = to_relative(&m, &w).unwrap();
        assert_eq!(r.left, 0.25);
        assert_eq!(r.top, 0.25);
        assert_eq!(r.right, 0.5);
        assert_eq!(r.bottom, 0.5);
    }

    #[test]
    fn absolute_scales_to_other_monitor() {
        let small = fhd_at(0, 0);
        let big = Rect::from_origin_size(-2560, 0, 2560, 1440);
        let w = Rect::new(960, 540, 1920, 1080);
        let rel = to_relative(&small, &w).unwrap();
        let moved = to_absolute(&big, &rel).unwrap();
        assert_eq!(moved, Rect::new(-1280, 720, 0, 1440));
    }

    #[test]
    fn off_screen_windows_stay_off_screen() {
        let m = fhd_at(0, 0);
        let w = Rect::new(-100, -50, 500, 300);
        let rel = to_relative(&m, &w).unwrap();
        assert!(rel.left < 0.0);
        assert!(rel.top < 0.0);
        assert_eq!(to_absolute(&m, &rel).unwrap(), w);
    }

    #[test]
    fn degenerate_monitor_is_rejected() {
        let flat = Rect::from_origin_size(0, 0, 1, 0);
        let thin = Rect::from_origin_size(0, 0, 0, 1);
        let w = Rect::new(0, 0, 10, 10);
        assert!(matches!(
            to_relative(&flat, &w),
            Err(CoreError::InvalidGeometry { width: 1, height: 0 })
        ));
        assert!(matches!(
            to_relative(&thin, &w),
            Err(CoreError::InvalidGeometry { width: 0, height: 1 })
        ));
        assert!(to_absolute(&flat, &RelativeRect::default()).is_err());
    }

    #[test]
    fn round_trip_within_one_pixel() {
        let monitors = [
            fhd_at(0, 0),
            Rect::from_origin_size(-1366, 200, 1366, 768),
            Rect::from_origin_size(3840, -1080, 3, 7),
            Rect::from_origin_size(17, 23, 2560, 1600),
        ];
        let rels = [
            RelativeRect {
                left: 0.0,
                top: 0.0,
                right: 1.0,
                bottom: 1.0,
            },
            RelativeRect {
                left: 0.1234,
                top: 0.5678,
                right: 0.9,
                bottom: 0.99,
            },
            RelativeRect {
                left: -0.3,
                top: 1.2,
                right: 0.333,
                bottom: 1.7,
            },
        ];
        for m in &monitors {
            for r in &rels {
                let abs = to_absolute(m, r).unwrap();
                let back = to_absolute(m, &to_relative(m, &abs).unwrap()).unwrap();
                assert!(close(abs.left, back.left), "{} vs {}", abs, back);
                assert!(close(abs.top, back.top), "{} vs {}", abs, back);
                assert!(close(abs.right, back.right), "{} vs {}", abs, back);
                assert!(close(abs.bottom, back.bottom), "{} vs {}", abs, back);

                // The relative value itself may drift by at most one pixel's
                // worth of the monitor size.
                let rel = to_relative(m, &abs).unwrap();
                let px = 1.0 / m.width() as f64;
                let py = 1.0 / m.height() as f64;
                assert!((rel.left - r.left).abs() <= px);
                assert!((rel.right - r.right).abs() <= px);
                assert!((rel.top - r.top).abs() <= py);
                assert!((rel.bottom - r.bottom).abs() <= py);
            }
        }
    }

    #[test]
    fn contains_is_half_open() {
        let m = fhd_at(0, 0);
        assert!(m.contains(0, 0));
        assert!(m.contains(1919, 1079));
        assert!(!m.contains(1920, 0));
        assert!(!m.contains(-1, 5));
    }
}
