//! RGB ↔ HSL conversion on 8-bit channel values.
//!
//! Hue is in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
//! RGB values are `[0, 255]` on both sides; `hsl_to_rgb` returns unrounded
//! floats so callers decide when to quantize.
//!
//! # Round trip
//! For every 8-bit triple, `hsl_to_rgb(rgb_to_hsl(r, g, b))` rounds back to
//! the original values (tested with a ±1 tolerance).

/// Convert 8-bit RGB to HSL.
///
/// Achromatic input (`max == min`) yields `h = 0, s = 0`.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    rgb_to_hsl_f32(r as f32, g as f32, b as f32)
}

/// Same as [`rgb_to_hsl`] for unquantized channel values in `[0, 255]`.
pub fn rgb_to_hsl_f32(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let r = r / 255.0;
    let g = g / 255.0;
    let b = b / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let lum = (max + min) * 0.5;

    let delta = max - min;
    if delta <= 0.0 {
        return (0.0, 0.0, lum);
    }

    let sat = if lum > 0.5 {
        delta / (2.0 - max - min)
    } else {
        delta / (max + min)
    };

    let hue = if max == r {
        (g - b) / delta + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    (normalize_hue(hue * 60.0), sat, lum)
}

/// Convert HSL back to RGB in `[0, 255]` (unrounded).
///
/// `hue` may be any angle; it is normalized first.
pub fn hsl_to_rgb(hue: f32, sat: f32, lum: f32) -> [f32; 3] {
    let sat = sat.clamp(0.0, 1.0);
    let lum = lum.clamp(0.0, 1.0);

    if sat <= 0.0 {
        let v = lum * 255.0;
        return [v, v, v];
    }

    let q = if lum < 0.5 {
        lum * (1.0 + sat)
    } else {
        lum + sat - lum * sat
    };
    let p = 2.0 * lum - q;
    let h = normalize_hue(hue) / 360.0;

    [
        hue_to_channel(p, q, h + 1.0 / 3.0) * 255.0,
        hue_to_channel(p, q, h) * 255.0,
        hue_to_channel(p, q, h - 1.0 / 3.0) * 255.0,
    ]
}

fn hue_to_channel(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Wrap any angle into `[0, 360)`.
#[inline]
pub fn normalize_hue(degrees: f32) -> f32 {
    let h = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if h >= 360.0 { 0.0 } else { h }
}

/// Shortest angular distance between two hues, in `[0, 180]`.
#[inline]
pub fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (normalize_hue(a) - normalize_hue(b)).abs();
    if d > 180.0 { 360.0 - d } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_round_trip_within_one_step() {
        // Stride 5 covers 0 and 255 on every axis (52³ samples).
        for r in (0..=255u16).step_by(5) {
            for g in (0..=255u16).step_by(5) {
                for b in (0..=255u16).step_by(5) {
                    let (r, g, b) = (r as u8, g as u8, b as u8);
                    let (h, s, l) = rgb_to_hsl(r, g, b);
                    let back = hsl_to_rgb(h, s, l);
                    for (orig, out) in [r, g, b].iter().zip(back) {
                        assert!(
                            (*orig as f32 - out.round()).abs() <= 1.0,
                            "({r},{g},{b}) -> ({h},{s},{l}) -> {back:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_trip_odd_values() {
        for &(r, g, b) in &[(1, 2, 3), (254, 1, 127), (13, 200, 77), (99, 99, 98)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let back = hsl_to_rgb(h, s, l).map(|c| c.round() as u8);
            assert_eq!(back, [r, g, b]);
        }
    }

    #[test]
    fn test_achromatic_has_zero_hue_and_saturation() {
        let (h, s, l) = rgb_to_hsl(128, 128, 128);
        assert_eq!(h, 0.0);
        assert_eq!(s, 0.0);
        assert!((l - 128.0 / 255.0).abs() < EPSILON);
    }

    #[test]
    fn test_primary_hues() {
        assert!((rgb_to_hsl(255, 0, 0).0 - 0.0).abs() < EPSILON);
        assert!((rgb_to_hsl(0, 255, 0).0 - 120.0).abs() < EPSILON);
        assert!((rgb_to_hsl(0, 0, 255).0 - 240.0).abs() < EPSILON);
        // Magenta-ish red sits just below 360, never at it.
        let (h, _, _) = rgb_to_hsl(255, 0, 1);
        assert!(h > 359.0 && h < 360.0, "{h}");
    }

    #[test]
    fn test_hsl_to_rgb_accepts_out_of_range_hue() {
        let a = hsl_to_rgb(-120.0, 1.0, 0.5);
        let b = hsl_to_rgb(240.0, 1.0, 0.5);
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_normalize_hue_wraps() {
        assert_eq!(normalize_hue(360.0), 0.0);
        assert!((normalize_hue(-30.0) - 330.0).abs() < EPSILON);
        assert!((normalize_hue(725.0) - 5.0).abs() < EPSILON);
        assert!(normalize_hue(-1e-9) < 360.0);
    }

    #[test]
    fn test_hue_distance_is_circular() {
        assert!((hue_distance(350.0, 10.0) - 20.0).abs() < EPSILON);
        assert!((hue_distance(10.0, 350.0) - 20.0).abs() < EPSILON);
        assert!((hue_distance(90.0, 270.0) - 180.0).abs() < EPSILON);
    }
}
