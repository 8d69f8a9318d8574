//! Diverging `coolwarm` color ramp over a render-value range.

use plotters::style::RGBColor;

/// Anchor stops of the coolwarm ramp (blue -> light grey -> red).
const COOLWARM: [(f64, RGBColor); 5] = [
    (0.00, RGBColor(59, 76, 192)),
    (0.25, RGBColor(141, 176, 254)),
    (0.50, RGBColor(221, 221, 221)),
    (0.75, RGBColor(244, 154, 123)),
    (1.00, RGBColor(180, 4, 38)),
];

/// Color at position `t` in [0, 1]; out-of-range values clamp, NaN maps to the midpoint.
pub fn coolwarm(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
    for pair in COOLWARM.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            return RGBColor(lerp(c0.0, c1.0, f), lerp(c0.1, c1.1, f), lerp(c0.2, c1.2, f));
        }
    }
    COOLWARM[COOLWARM.len() - 1].1
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round().clamp(0.0, 255.0) as u8
}

/// Linear normalization of a render-value range onto the ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Position of `v` in [0, 1]. A degenerate range maps everything to the middle.
    pub fn normalize(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            0.5
        } else {
            ((v - self.min) / span).clamp(0.0, 1.0)
        }
    }

    pub fn color(&self, v: f64) -> RGBColor {
        coolwarm(self.normalize(v))
    }

    /// `n` evenly spaced render values from min to max (inclusive).
    pub fn ticks(&self, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![self.min],
            _ => (0..n)
                .map(|i| self.min + (self.max - self.min) * i as f64 / (n - 1) as f64)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_midpoint() {
        assert_eq!(coolwarm(0.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(0.5), RGBColor(221, 221, 221));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(7.0), RGBColor(180, 4, 38));
    }

    #[test]
    fn degenerate_range_is_centered() {
        let s = ColorScale::new(3.0, 3.0);
        assert_eq!(s.normalize(3.0), 0.5);
        assert_eq!(s.ticks(3), vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn ticks_span_the_range() {
        let s = ColorScale::new(0.0, 4.0);
        assert_eq!(s.ticks(5), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }
}
