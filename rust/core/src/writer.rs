// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP serialization of decoded values

use crate::attribute::{AttributeValue, DecodedEntity};
use crate::step_string;
use std::fmt::Write;

/// Format a real so that STEP readers accept it: always a decimal point,
/// upper-case exponent.
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0.".to_string();
    }

    let text = format!("{:?}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let dot = if mantissa.contains('.') { "" } else { "." };
            format!("{}{}E{}", mantissa, dot, exponent)
        }
        None if text.contains('.') => text,
        None => format!("{}.", text),
    }
}

/// Append the STEP text of a value to `out`
pub fn write_value(value: &AttributeValue, out: &mut String) {
    match value {
        AttributeValue::EntityRef(id) => {
            let _ = write!(out, "#{}", id);
        }
        AttributeValue::String(s) => {
            out.push('\'');
            out.push_str(&step_string::encode(s));
            out.push('\'');
        }
        AttributeValue::Integer(i) => {
            let _ = write!(out, "{}", i);
        }
        AttributeValue::Float(f) => out.push_str(&format_real(*f)),
        AttributeValue::Enum(e) => {
            out.push('.');
            out.push_str(e);
            out.push('.');
        }
        AttributeValue::List(items) => write_list(items, out),
        AttributeValue::Typed(type_name, args) => {
            out.push_str(type_name);
            write_list(args, out);
        }
        AttributeValue::Null => out.push('$'),
        AttributeValue::Derived => out.push('*'),
    }
}

fn write_list(items: &[AttributeValue], out: &mut String) {
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_value(item, out);
    }
    out.push(')');
}

/// Full instance line: `#id=TYPE(attr,...);`
pub fn entity_to_step(entity: &DecodedEntity) -> String {
    let mut out = String::with_capacity(32 + entity.attributes.len() * 8);
    let _ = write!(out, "#{}={}", entity.id, entity.type_name);
    write_list(&entity.attributes, &mut out);
    out.push(';');
    out
}
