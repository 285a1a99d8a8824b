// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marking colours
//!
//! Unusual metallic shades with simple base colour names. The order is the
//! order the colour grid is shown in.

use crate::error::{MarkError, Result};
use serde::Serialize;

/// A named marking colour with channels in 0..=1
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Colour {
    pub name: &'static str,
    pub rgb: [f64; 3],
}

impl Colour {
    /// `#rrggbb`, each channel truncated to 0..=255
    pub fn hex(&self) -> String {
        let [r, g, b] = self.rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

pub const PALETTE: [Colour; 9] = [
    Colour { name: "Hvit", rgb: [1.0, 1.0, 1.0] },     // White
    Colour { name: "Rosa", rgb: [1.0, 0.5, 0.4] },     // Coral
    Colour { name: "Grønn", rgb: [0.4, 0.9, 0.7] },    // Mint
    Colour { name: "Magenta", rgb: [0.9, 0.2, 0.6] },  // Fuchsia
    Colour { name: "Gul", rgb: [0.85, 0.65, 0.2] },    // Gold
    Colour { name: "Lilla", rgb: [0.7, 0.5, 0.9] },    // Lavender
    Colour { name: "Blå", rgb: [0.1, 0.5, 0.5] },      // Petrol
    Colour { name: "Oransje", rgb: [1.0, 0.7, 0.5] },  // Apricot
    Colour { name: "Rød", rgb: [0.5, 0.2, 0.4] },      // Plum
];

/// Look up a palette colour by name
pub fn find_colour(name: &str) -> Result<&'static Colour> {
    PALETTE
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| MarkError::UnknownColour(name.to_string()))
}
