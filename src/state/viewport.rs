// Viewport and input-device state.

/// Layout size of the drawing surface in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Zero or non-finite dimensions mean the host has not laid out yet.
    pub fn is_laid_out(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// What the host reports about the input device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceProfile {
    pub coarse_pointer: bool,
    pub reduced_motion: bool,
    pub viewport_width: f64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            coarse_pointer: false,
            reduced_motion: false,
            viewport_width: 1280.0,
        }
    }
}

impl DeviceProfile {
    pub fn desktop(viewport_width: f64) -> Self {
        Self { viewport_width, ..Self::default() }
    }

    pub fn touch(viewport_width: f64) -> Self {
        Self { coarse_pointer: true, viewport_width, ..Self::default() }
    }
}
