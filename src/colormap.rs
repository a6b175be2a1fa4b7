use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Cyclic colour maps: 0 and 1 map to the same colour, so a phase colouring
/// has no seam where the angle wraps.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Full-saturation hue sweep, red → yellow → green → cyan → blue → magenta → red.
    #[default]
    Hsv,
    Sinebow,
    CyclicGrey,
}

impl Colormap {
    /// Map `t` in [0, 1] to RGB components in [0, 1]. Values outside the range are clamped.
    pub fn rgb(&self, t: f64) -> [f64; 3] {
        let t = if t.is_nan() { 0.0 } else { num::clamp(t, 0.0, 1.0) };
        match self {
            Colormap::Hsv => hsv_to_rgb(360.0 * t, 1.0, 1.0),
            Colormap::Sinebow => {
                // shifted half a turn so that t = 0 is red, as for hsv
                let t = 0.5 - t;
                let channel = |offset: f64| (PI * (t + offset)).sin().powi(2);
                [channel(0.0), channel(1.0 / 3.0), channel(2.0 / 3.0)]
            }
            Colormap::CyclicGrey => {
                let v = 0.5 - 0.5 * (2.0 * PI * t).cos();
                [v, v, v]
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Hsv => "hsv",
            Colormap::Sinebow => "sinebow",
            Colormap::CyclicGrey => "cyclic_grey",
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hsv" => Ok(Colormap::Hsv),
            "sinebow" => Ok(Colormap::Sinebow),
            "cyclic_grey" | "cyclic_gray" => Ok(Colormap::CyclicGrey),
            _ => Err(Error::UnknownColormap(s.to_string())),
        }
    }
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let h = h % 360.0;
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [r + m, g + m, b + m]
}
