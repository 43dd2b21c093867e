// Interpolation helpers and logging bootstrap.

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp to [0, 1]; NaN collapses to 0 so it never reaches a draw call.
pub fn clamp01(t: f64) -> f64 {
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Cubic ease-out over [0, 1].
pub fn ease_out(t: f64) -> f64 {
    let u = 1.0 - clamp01(t);
    1.0 - u * u * u
}

pub fn init_logging() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) is harmless; keep the first logger.
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_out_hits_endpoints() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!(ease_out(0.5) > 0.5);
    }

    #[test]
    fn clamp01_swallows_nan() {
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(3.0), 1.0);
        assert_eq!(clamp01(-1.0), 0.0);
    }
}
