//! Colormaps for community coloring.
//!
//! Each channel is a piecewise-linear ramp over `[0, 1]`, defined by
//! `(position, value)` anchors in the same form as matplotlib segment data.

use crate::error::{Error, Result};
use std::str::FromStr;

type Segment = &'static [(f64, f64)];

/// An RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colormap {
    name: &'static str,
    red: Segment,
    green: Segment,
    blue: Segment,
}

const JET: Colormap = Colormap {
    name: "jet",
    red: &[(0.0, 0.0), (0.35, 0.0), (0.66, 1.0), (0.89, 1.0), (1.0, 0.5)],
    green: &[
        (0.0, 0.0),
        (0.125, 0.0),
        (0.375, 1.0),
        (0.64, 1.0),
        (0.91, 0.0),
        (1.0, 0.0),
    ],
    blue: &[(0.0, 0.5), (0.11, 1.0), (0.34, 1.0), (0.65, 0.0), (1.0, 0.0)],
};

const HOT: Colormap = Colormap {
    name: "hot",
    red: &[(0.0, 0.0416), (0.365079, 1.0), (1.0, 1.0)],
    green: &[(0.0, 0.0), (0.365079, 0.0), (0.746032, 1.0), (1.0, 1.0)],
    blue: &[(0.0, 0.0), (0.746032, 0.0), (1.0, 1.0)],
};

const COOL: Colormap = Colormap {
    name: "cool",
    red: &[(0.0, 0.0), (1.0, 1.0)],
    green: &[(0.0, 1.0), (1.0, 0.0)],
    blue: &[(0.0, 1.0), (1.0, 1.0)],
};

const GRAY: Colormap = Colormap {
    name: "gray",
    red: &[(0.0, 0.0), (1.0, 1.0)],
    green: &[(0.0, 0.0), (1.0, 1.0)],
    blue: &[(0.0, 0.0), (1.0, 1.0)],
};

impl Default for Colormap {
    fn default() -> Self {
        JET
    }
}

impl Colormap {
    pub fn jet() -> Self {
        JET
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Color at `t`, clamped to `[0, 1]`.
    pub fn rgb(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        Rgb(
            channel(self.red, t),
            channel(self.green, t),
            channel(self.blue, t),
        )
    }

    pub fn hex(&self, t: f64) -> String {
        self.rgb(t).to_hex()
    }
}

impl FromStr for Colormap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jet" => Ok(JET),
            "hot" => Ok(HOT),
            "cool" => Ok(COOL),
            "gray" | "grey" => Ok(GRAY),
            _ => Err(Error::UnknownColormap(s.to_string())),
        }
    }
}

fn channel(segment: Segment, t: f64) -> u8 {
    let value = segment
        .windows(2)
        .find(|w| t <= w[1].0)
        .map(|w| {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if x1 > x0 {
                y0 + (y1 - y0) * (t - x0) / (x1 - x0)
            } else {
                y1
            }
        })
        .unwrap_or_else(|| segment.last().map(|&(_, y)| y).unwrap_or(0.0));

    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Linear map from `[vmin, vmax]` onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    /// A degenerate range maps everything to 0.
    pub fn apply(&self, value: f64) -> f64 {
        if self.vmax <= self.vmin {
            0.0
        } else {
            (value - self.vmin) / (self.vmax - self.vmin)
        }
    }
}
