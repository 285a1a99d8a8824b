// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display values of single-value properties
//!
//! The same text is used to build the index and to match elements, so a
//! value picked from the index always finds its elements.

use ifc_marker_core::AttributeValue;

/// Shown for properties without a value, and for empty, zero or false values
pub const NO_VALUE: &str = "Ingen verdi";

/// Text of a property's NominalValue.
pub fn display_value(nominal: Option<&AttributeValue>) -> String {
    nominal
        .and_then(render)
        .unwrap_or_else(|| NO_VALUE.to_string())
}

/// Render a value, or `None` when it is missing or falsy
fn render(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::Typed(_, args) => match args.as_slice() {
            [single] => render(single),
            _ => render(&AttributeValue::List(args.clone())),
        },
        AttributeValue::String(s) if s.is_empty() => None,
        AttributeValue::String(s) => Some(s.clone()),
        AttributeValue::Integer(0) => None,
        AttributeValue::Integer(i) => Some(i.to_string()),
        AttributeValue::Float(f) if *f == 0.0 => None,
        AttributeValue::Float(f) => Some(format_float(*f)),
        AttributeValue::Enum(e) => match e.as_str() {
            "T" | "TRUE" => Some("True".to_string()),
            "F" | "FALSE" => None,
            "U" | "UNKNOWN" => Some("UNKNOWN".to_string()),
            other => Some(other.to_string()),
        },
        AttributeValue::EntityRef(id) => Some(format!("#{}", id)),
        AttributeValue::List(items) if items.is_empty() => None,
        AttributeValue::List(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| render(item).unwrap_or_else(|| NO_VALUE.to_string()))
                .collect();
            Some(format!("({})", parts.join(", ")))
        }
        AttributeValue::Null | AttributeValue::Derived => None,
    }
}

/// Shortest round-trip text of a float: plain decimals with a trailing `.0`
/// inside `1e-4..1e16`, otherwise `1e-05` / `2.5e+20` style exponents.
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{:e}", f);
        if let Some((mantissa, exp)) = sci.split_once('e') {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            return format!("{}e{}{:0>2}", mantissa, sign, digits);
        }
        return sci;
    }

    let plain = f.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(name: &str, v: AttributeValue) -> AttributeValue {
        AttributeValue::typed(name, v)
    }

    #[test]
    fn wrapped_values_are_unwrapped() {
        assert_eq!(display_value(Some(&AttributeValue::label("700"))), "700");
        assert_eq!(display_value(Some(&typed("IFCINTEGER", AttributeValue::Integer(700)))), "700");
        assert_eq!(display_value(Some(&typed("IFCREAL", AttributeValue::Float(700.0)))), "700.0");
        assert_eq!(display_value(Some(&typed("IFCREAL", AttributeValue::Float(0.25)))), "0.25");
    }

    #[test]
    fn small_and_large_reals_use_exponent_form() {
        let real = |f| display_value(Some(&typed("IFCREAL", AttributeValue::Float(f))));
        assert_eq!(real(1e-5), "1e-05");
        assert_eq!(real(-1.5e-10), "-1.5e-10");
        assert_eq!(real(2.5e20), "2.5e+20");
        assert_eq!(real(1e16), "1e+16");
        assert_eq!(real(1e-4), "0.0001");
        assert_eq!(real(1e15), "1000000000000000.0");
        assert_eq!(real(-3.0), "-3.0");
    }

    #[test]
    fn booleans_and_logicals() {
        let t = typed("IFCBOOLEAN", AttributeValue::Enum("T".into()));
        let f = typed("IFCBOOLEAN", AttributeValue::Enum("F".into()));
        let u = typed("IFCLOGICAL", AttributeValue::Enum("U".into()));
        assert_eq!(display_value(Some(&t)), "True");
        assert_eq!(display_value(Some(&f)), NO_VALUE);
        assert_eq!(display_value(Some(&u)), "UNKNOWN");
    }

    #[test]
    fn missing_and_falsy_values_use_placeholder() {
        assert_eq!(display_value(None), NO_VALUE);
        assert_eq!(display_value(Some(&AttributeValue::Null)), NO_VALUE);
        assert_eq!(display_value(Some(&AttributeValue::label(""))), NO_VALUE);
        assert_eq!(display_value(Some(&typed("IFCINTEGER", AttributeValue::Integer(0)))), NO_VALUE);
        assert_eq!(display_value(Some(&typed("IFCREAL", AttributeValue::Float(0.0)))), NO_VALUE);
    }
}
