// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metallic surface styles for marking colours
//!
//! One `IfcSurfaceStyle` per colour, named `NOSKI_Eksisterende_<colour>`,
//! reused when the file already has it:
//!
//! ```text
//! IfcSurfaceStyle(name, .BOTH., (rendering))
//!   IfcSurfaceStyleRendering(surface, 0.0, diffuse, $, $, $, specular,
//!                            IFCSPECULARROUGHNESS(0.2), .METAL.)
//! ```

use crate::error::{MarkError, Result};
use crate::palette::Colour;
use ifc_marker_core::{AttributeValue, IfcModel};

/// Name of the marker property set, also the prefix of style names
pub const PSET_NAME: &str = "NOSKI_Eksisterende";

/// Low roughness reads as shiny
const SPECULAR_ROUGHNESS: f64 = 0.2;

/// Style name for a colour
pub fn style_name(colour: &str) -> String {
    format!("{}_{}", PSET_NAME, colour)
}

/// Style to put in `IfcStyledItem.Styles`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleHandle {
    /// The `IfcSurfaceStyle`
    pub style_id: u32,
    /// `IfcPresentationStyleAssignment` wrapping the style (IFC2X3 only)
    pub assignment_id: Option<u32>,
    /// Whether the style was created in this run
    pub created: bool,
}

impl StyleHandle {
    /// Instance referenced from a styled item
    pub fn reference(&self) -> u32 {
        self.assignment_id.unwrap_or(self.style_id)
    }

    /// `Styles` attribute value: a one-element list
    pub fn styles_attribute(&self) -> AttributeValue {
        AttributeValue::ref_list([self.reference()])
    }
}

/// Find the colour's surface style, or create it
pub fn get_or_create_style(model: &mut IfcModel, colour: &Colour) -> Result<StyleHandle> {
    if colour.rgb.iter().any(|c| !(0.0..=1.0).contains(c)) {
        return Err(MarkError::Style(format!(
            "{} has channels outside 0..1: {:?}",
            colour.name, colour.rgb
        )));
    }

    let name = style_name(colour.name);
    let (style_id, created) = match find_style(model, &name)? {
        Some(id) => {
            tracing::debug!(style = %name, id, "Reusing surface style");
            (id, false)
        }
        None => {
            let id = create_style(model, &name, colour);
            tracing::debug!(style = %name, id, "Created surface style");
            (id, true)
        }
    };

    let assignment_id = if model.schema().requires_style_assignment() {
        Some(get_or_create_assignment(model, style_id)?)
    } else {
        None
    };

    Ok(StyleHandle {
        style_id,
        assignment_id,
        created,
    })
}

fn find_style(model: &mut IfcModel, name: &str) -> Result<Option<u32>> {
    for id in model.ids_of_type("IFCSURFACESTYLE") {
        if model.get(id)?.get_string(0) == Some(name) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

fn colour_rgb(model: &mut IfcModel, [r, g, b]: [f64; 3]) -> u32 {
    model.add(
        "IFCCOLOURRGB",
        vec![
            AttributeValue::Null,
            AttributeValue::Float(r),
            AttributeValue::Float(g),
            AttributeValue::Float(b),
        ],
    )
}

fn create_style(model: &mut IfcModel, name: &str, colour: &Colour) -> u32 {
    let surface = colour_rgb(model, colour.rgb);
    let diffuse = colour_rgb(model, colour.rgb);
    let specular = colour_rgb(model, [1.0, 1.0, 1.0]);

    let rendering = model.add(
        "IFCSURFACESTYLERENDERING",
        vec![
            AttributeValue::EntityRef(surface),
            AttributeValue::Float(0.0),
            AttributeValue::EntityRef(diffuse),
            AttributeValue::Null,
            AttributeValue::Null,
            AttributeValue::Null,
            AttributeValue::EntityRef(specular),
            AttributeValue::typed("IFCSPECULARROUGHNESS", AttributeValue::Float(SPECULAR_ROUGHNESS)),
            AttributeValue::Enum("METAL".into()),
        ],
    );

    model.add(
        "IFCSURFACESTYLE",
        vec![
            AttributeValue::String(name.to_string()),
            AttributeValue::Enum("BOTH".into()),
            AttributeValue::ref_list([rendering]),
        ],
    )
}

/// IFC2X3: reuse an assignment holding exactly this style, else add one
fn get_or_create_assignment(model: &mut IfcModel, style_id: u32) -> Result<u32> {
    for id in model.ids_of_type("IFCPRESENTATIONSTYLEASSIGNMENT") {
        if model.get(id)?.get_refs(0) == [style_id] {
            return Ok(id);
        }
    }
    Ok(model.add(
        "IFCPRESENTATIONSTYLEASSIGNMENT",
        vec![AttributeValue::ref_list([style_id])],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::find_colour;

    fn file(schema: &str, data: &str) -> String {
        format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('{}'));\nENDSEC;\nDATA;\n{}ENDSEC;\nEND-ISO-10303-21;\n",
            schema, data
        )
    }

    #[test]
    fn creates_metallic_style() {
        let content = file("IFC4", "#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,$,$,$,$,$,$,$);\n");
        let mut model = IfcModel::open(&content).unwrap();
        let handle = get_or_create_style(&mut model, find_colour("Rosa").unwrap()).unwrap();

        assert!(handle.created);
        assert_eq!(handle.assignment_id, None);
        assert_eq!(handle.reference(), handle.style_id);

        let text = model.to_step_string();
        assert!(text.contains("#2=IFCCOLOURRGB($,1.0,0.5,0.4);"));
        assert!(text.contains("#4=IFCCOLOURRGB($,1.0,1.0,1.0);"));
        assert!(text.contains(
            "#5=IFCSURFACESTYLERENDERING(#2,0.0,#3,$,$,$,#4,IFCSPECULARROUGHNESS(0.2),.METAL.);"
        ));
        assert!(text.contains("#6=IFCSURFACESTYLE('NOSKI_Eksisterende_Rosa',.BOTH.,(#5));"));
    }

    #[test]
    fn existing_style_is_reused() {
        let content = file(
            "IFC4",
            "#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,$,$,$,$,$,$,$);\n#2=IFCSURFACESTYLE('NOSKI_Eksisterende_Gul',.BOTH.,());\n",
        );
        let mut model = IfcModel::open(&content).unwrap();
        let handle = get_or_create_style(&mut model, find_colour("Gul").unwrap()).unwrap();
        assert_eq!(handle.style_id, 2);
        assert!(!handle.created);
        assert_eq!(model.added_count(), 0);
    }

    #[test]
    fn ifc2x3_wraps_style_in_assignment() {
        let content = file("IFC2X3", "#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,$,$,$,$,$,$);\n");
        let mut model = IfcModel::open(&content).unwrap();
        let colour = find_colour("Blå").unwrap();
        let first = get_or_create_style(&mut model, colour).unwrap();
        let assignment = first.assignment_id.unwrap();
        assert_eq!(model.get(assignment).unwrap().get_refs(0), vec![first.style_id]);
        assert_eq!(first.styles_attribute(), AttributeValue::ref_list([assignment]));

        let second = get_or_create_style(&mut model, colour).unwrap();
        assert_eq!(second.style_id, first.style_id);
        assert_eq!(second.assignment_id, Some(assignment));
    }

    #[test]
    fn out_of_range_colour_is_rejected() {
        let content = file("IFC4", "#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,$,$,$,$,$,$,$);\n");
        let mut model = IfcModel::open(&content).unwrap();
        let colour = Colour { name: "Feil", rgb: [1.5, 0.0, 0.0] };
        assert!(matches!(get_or_create_style(&mut model, &colour), Err(MarkError::Style(_))));
    }
}
