// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colour overrides on representation items

use crate::error::Result;
use crate::style::StyleHandle;
use ifc_marker_core::{AttributeValue, IfcModel};
use rustc_hash::FxHashMap;

/// IfcProduct: [6]=Representation
const PRODUCT_REPRESENTATION_INDEX: usize = 6;
/// IfcProductDefinitionShape: [2]=Representations
const SHAPE_REPRESENTATIONS_INDEX: usize = 2;
/// IfcShapeRepresentation: [3]=Items
const REPRESENTATION_ITEMS_INDEX: usize = 3;
/// IfcStyledItem: [0]=Item, [1]=Styles, [2]=Name
const STYLED_ITEM_ITEM_INDEX: usize = 0;
const STYLED_ITEM_STYLES_INDEX: usize = 1;

/// Representation item id -> `IfcStyledItem` id
#[derive(Debug, Default, Clone)]
pub struct StyledItemIndex {
    by_item: FxHashMap<u32, u32>,
}

impl StyledItemIndex {
    pub fn build(model: &mut IfcModel) -> Result<Self> {
        let mut by_item = FxHashMap::default();
        for id in model.ids_of_type("IFCSTYLEDITEM") {
            if let Some(item) = model.get(id)?.get_ref(STYLED_ITEM_ITEM_INDEX) {
                by_item.insert(item, id);
            }
        }
        tracing::debug!(styled_items = by_item.len(), "Indexed styled items");
        Ok(Self { by_item })
    }

    pub fn get(&self, item: u32) -> Option<u32> {
        self.by_item.get(&item).copied()
    }

    pub fn insert(&mut self, item: u32, styled_item: u32) {
        self.by_item.insert(item, styled_item);
    }

    pub fn len(&self) -> usize {
        self.by_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_item.is_empty()
    }
}

/// Style every item of an element's shape representations.
///
/// Returns `false` when the element has no representation or no items.
pub fn apply_colour(
    model: &mut IfcModel,
    element_id: u32,
    style: &StyleHandle,
    index: &mut StyledItemIndex,
) -> Result<bool> {
    let element = model.get(element_id)?;
    let Some(shape) = model.resolve(element.get(PRODUCT_REPRESENTATION_INDEX))? else {
        return Ok(false);
    };

    let mut applied = false;
    for rep_id in shape.get_refs(SHAPE_REPRESENTATIONS_INDEX) {
        let rep = model.get(rep_id)?;
        if !rep.is("IFCSHAPEREPRESENTATION") {
            continue;
        }

        for item in rep.get_refs(REPRESENTATION_ITEMS_INDEX) {
            match index.get(item) {
                Some(styled_item) => {
                    model.set_attribute(
                        styled_item,
                        STYLED_ITEM_STYLES_INDEX,
                        style.styles_attribute(),
                    )?;
                }
                None => {
                    let styled_item = model.add(
                        "IFCSTYLEDITEM",
                        vec![
                            AttributeValue::EntityRef(item),
                            style.styles_attribute(),
                            AttributeValue::Null,
                        ],
                    );
                    index.insert(item, styled_item);
                }
            }
            applied = true;
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Vegg',$,$,$,#2,$,$);
#2=IFCPRODUCTDEFINITIONSHAPE($,$,(#3,#6));
#3=IFCSHAPEREPRESENTATION(#9,'Body','SweptSolid',(#4,#5));
#4=IFCEXTRUDEDAREASOLID($,$,$,3.0);
#5=IFCEXTRUDEDAREASOLID($,$,$,1.0);
#6=IFCTOPOLOGYREPRESENTATION(#9,'Reference','Edge',(#4));
#7=IFCSTYLEDITEM(#4,(#8),$);
#8=IFCSURFACESTYLE('Betong',.BOTH.,());
#9=IFCGEOMETRICREPRESENTATIONCONTEXT($,'Model',3,1.E-05,$,$);
#10=IFCSLAB('1hqIFTRjfV6AWq_bMtnZwI',$,'Dekke',$,$,$,$,$,$);
#11=IFCSURFACESTYLE('NOSKI_Eksisterende_Gul',.BOTH.,());
ENDSEC;
END-ISO-10303-21;
";

    fn handle() -> StyleHandle {
        StyleHandle {
            style_id: 11,
            assignment_id: None,
            created: false,
        }
    }

    #[test]
    fn existing_styled_items_are_restyled_and_missing_ones_created() {
        let mut model = IfcModel::open(FILE).unwrap();
        let mut index = StyledItemIndex::build(&mut model).unwrap();
        assert_eq!(index.get(4), Some(7));

        assert!(apply_colour(&mut model, 1, &handle(), &mut index).unwrap());

        assert_eq!(model.get(7).unwrap().get_refs(1), vec![11]);
        let created = index.get(5).unwrap();
        let styled = model.get(created).unwrap();
        assert!(styled.is("IFCSTYLEDITEM"));
        assert_eq!(styled.get_ref(0), Some(5));
        assert_eq!(styled.get_refs(1), vec![11]);
        // Only the IfcShapeRepresentation is styled
        assert_eq!(model.added_count(), 1);
    }

    #[test]
    fn element_without_representation_is_not_coloured() {
        let mut model = IfcModel::open(FILE).unwrap();
        let mut index = StyledItemIndex::build(&mut model).unwrap();
        assert!(!apply_colour(&mut model, 10, &handle(), &mut index).unwrap());
        assert_eq!(model.added_count(), 0);
    }

    #[test]
    fn repeated_application_reuses_created_items() {
        let mut model = IfcModel::open(FILE).unwrap();
        let mut index = StyledItemIndex::build(&mut model).unwrap();
        apply_colour(&mut model, 1, &handle(), &mut index).unwrap();
        apply_colour(&mut model, 1, &handle(), &mut index).unwrap();
        assert_eq!(model.added_count(), 1);
    }
}
