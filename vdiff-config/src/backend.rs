//! The closed set of rendering backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A document-to-raster rendering engine.
///
/// `Reference` is the ground truth (a pre-rendered PNG stored next to each
/// document); every other variant is an external Java rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Reference,
    Batik,
    Jsvg,
    SvgSalamander,
    EchoSvg,
}

impl Backend {
    /// Stable identifier used in cache file names and on the command line.
    pub fn stable_name(&self) -> &'static str {
        match self {
            Backend::Reference => "reference",
            Backend::Batik => "batik",
            Backend::Jsvg => "jsvg",
            Backend::SvgSalamander => "svgsalamander",
            Backend::EchoSvg => "echosvg",
        }
    }

    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Backend::Reference => "Reference",
            Backend::Batik => "Batik",
            Backend::Jsvg => "JSVG",
            Backend::SvgSalamander => "SVGSalamander",
            Backend::EchoSvg => "EchoSVG",
        }
    }

    /// All backends in declaration order.
    pub fn all() -> &'static [Backend] {
        &[
            Backend::Reference,
            Backend::Batik,
            Backend::Jsvg,
            Backend::SvgSalamander,
            Backend::EchoSvg,
        ]
    }

    /// Backends that are driven through an external process.
    pub fn external() -> &'static [Backend] {
        &Self::all()[1..]
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Backend::Reference)
    }

    /// Text the rasterizer prints when it produced its output.
    ///
    /// Only Batik and EchoSVG report one; `None` means the output is never
    /// inspected.
    pub fn success_marker(&self) -> Option<&'static str> {
        match self {
            Backend::Batik | Backend::EchoSvg => Some("success"),
            Backend::Reference | Backend::Jsvg | Backend::SvgSalamander => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Backend::all()
            .iter()
            .copied()
            .find(|b| b.stable_name() == lower)
            .ok_or_else(|| format!("unknown backend '{s}'"))
    }
}
