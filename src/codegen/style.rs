//! Property resolution: the fixed, closed table mapping PSL property keys
//! to style declarations, attributes, and layout decisions.

use crate::ast::{Element, Expr};

use super::script::expr_to_js_static;

/// Everything the markup renderer needs to know about one element's
/// property map.
pub(super) struct ResolvedElement {
    /// Inline style declarations, e.g. `width: 100px`.
    pub styles: Vec<String>,
    /// Plain attributes (src, placeholder, href, data-*).
    pub attrs: Vec<(String, String)>,
    /// `justify-content` value for a synthesized flex wrapper, when the
    /// element uses flow alignment rather than base positioning.
    pub wrapper: Option<&'static str>,
    /// Name under which the node registers in the runtime registry.
    pub var_name: Option<String>,
    /// The `text` property, rendered separately (reactive placeholders).
    pub text: Option<Expr>,
}

pub(super) fn resolve_element(element: &Element, page_padding: &str) -> ResolvedElement {
    let mut resolved = ResolvedElement {
        styles: Vec::new(),
        attrs: Vec::new(),
        wrapper: None,
        var_name: None,
        text: None,
    };

    match element.name.as_str() {
        "row" => {
            resolved.styles.push("display: flex".to_string());
            resolved.styles.push("flex-direction: row".to_string());
        }
        "column" => {
            resolved.styles.push("display: flex".to_string());
            resolved.styles.push("flex-direction: column".to_string());
        }
        _ => {}
    }

    // Base positioning takes the element out of flow; alignment keys then
    // become offsets instead of flex wrappers.
    let positioned = element.prop("base").is_some() || element.prop("fixed").is_some();
    let mut border_styled = false;

    for prop in &element.props {
        let value = &prop.value;
        match prop.key.as_str() {
            "size" => resolved.styles.push(format!("font-size: {}", length(value))),
            "width" | "height" | "padding" | "margin" | "gap" => resolved
                .styles
                .push(format!("{}: {}", prop.key, length(value))),
            "radius" => resolved
                .styles
                .push(format!("border-radius: {}", length(value))),
            "border" => {
                resolved
                    .styles
                    .push(format!("border-width: {}", length(value)));
                if !border_styled {
                    resolved.styles.push("border-style: solid".to_string());
                    border_styled = true;
                }
            }
            "bg" => resolved
                .styles
                .push(format!("background-color: {}", color(value))),
            "color" => resolved.styles.push(format!("color: {}", color(value))),
            "borderColor" => resolved
                .styles
                .push(format!("border-color: {}", color(value))),
            "hide" => {
                if truthy(value) {
                    resolved.styles.push("display: none".to_string());
                }
            }
            "show" => {
                if !truthy(value) {
                    resolved.styles.push("display: none".to_string());
                }
            }
            "base" => resolved.styles.push("position: absolute".to_string()),
            "fixed" => resolved.styles.push("position: fixed".to_string()),
            "center" => {
                if positioned {
                    resolved.styles.push("left: 50%".to_string());
                    resolved
                        .styles
                        .push("transform: translateX(-50%)".to_string());
                } else {
                    resolved.wrapper = Some("center");
                }
            }
            "left" | "right" => {
                if positioned {
                    resolved
                        .styles
                        .push(format!("{}: {}", prop.key, offset(value, page_padding)));
                } else {
                    resolved.wrapper = Some(if prop.key == "left" {
                        "flex-start"
                    } else {
                        "flex-end"
                    });
                }
            }
            "top" | "bottom" => {
                if positioned {
                    resolved
                        .styles
                        .push(format!("{}: {}", prop.key, offset(value, page_padding)));
                }
            }
            "var" => {
                if let Expr::Str(name) = value {
                    resolved.var_name = Some(name.clone());
                }
            }
            "text" => resolved.text = Some(value.clone()),
            "src" | "placeholder" | "alt" | "type" | "value" => resolved
                .attrs
                .push((prop.key.clone(), static_value(value))),
            "url" => resolved.attrs.push(("href".to_string(), static_value(value))),
            // Everything outside the table passes through as a data attribute.
            other => resolved
                .attrs
                .push((format!("data-{other}"), static_value(value))),
        }
    }

    resolved
}

/// Declarations for a media-query rule key, through the same table keys.
pub(super) fn css_decls(key: &str, value: &Expr) -> Vec<String> {
    match key {
        "size" => vec![format!("font-size: {}", length(value))],
        "width" | "height" | "padding" | "margin" | "gap" => {
            vec![format!("{key}: {}", length(value))]
        }
        "radius" => vec![format!("border-radius: {}", length(value))],
        "bg" => vec![format!("background-color: {}", color(value))],
        "color" => vec![format!("color: {}", color(value))],
        other => vec![format!("{other}: {}", static_value(value))],
    }
}

/// A length value: a bare number defaults to pixels, a number that already
/// carries a recognized suffix (including `%`) passes through unchanged.
pub(super) fn length(expr: &Expr) -> String {
    match expr {
        Expr::Number { value, unit: None } => format!("{}px", fmt_num(*value)),
        Expr::Number {
            value,
            unit: Some(unit),
        } => format!("{}{unit}", fmt_num(*value)),
        Expr::Str(s) => s.clone(),
        other => static_value(other),
    }
}

/// A color value passes through; a bare hex word gains its `#`.
pub(super) fn color(expr: &Expr) -> String {
    match expr {
        Expr::Str(s) => {
            let hexish = matches!(s.len(), 3 | 4 | 6 | 8)
                && s.chars().all(|c| c.is_ascii_hexdigit());
            if hexish {
                format!("#{s}")
            } else {
                s.clone()
            }
        }
        other => static_value(other),
    }
}

/// An absolute/fixed offset: the bare flag (`bottom;`) inherits the page
/// padding, an explicit value is unit-defaulted.
fn offset(expr: &Expr, page_padding: &str) -> String {
    match expr {
        Expr::Bool(true) => page_padding.to_string(),
        other => length(other),
    }
}

/// Literal truthiness for show/hide resolution at compile time; anything
/// non-literal counts as truthy.
pub(super) fn truthy(expr: &Expr) -> bool {
    match expr {
        Expr::Bool(b) => *b,
        Expr::Number { value, .. } => *value != 0.0,
        Expr::Str(s) => !s.is_empty(),
        Expr::Null => false,
        _ => true,
    }
}

/// Render an expression to a plain string for attribute and metadata
/// positions. Non-literal expressions fall back to their script form.
pub(super) fn static_value(expr: &Expr) -> String {
    match expr {
        Expr::Str(s) => s.clone(),
        Expr::Number { value, unit: None } => fmt_num(*value),
        Expr::Number {
            value,
            unit: Some(unit),
        } => format!("{}{unit}", fmt_num(*value)),
        Expr::Bool(b) => b.to_string(),
        Expr::Null => "null".to_string(),
        other => expr_to_js_static(other).render(),
    }
}

pub(super) fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Property;

    fn element_with(props: Vec<(&str, Expr)>) -> Element {
        Element {
            name: "box".to_string(),
            props: props
                .into_iter()
                .map(|(key, value)| Property {
                    key: key.to_string(),
                    value,
                })
                .collect(),
            ..Element::default()
        }
    }

    #[test]
    fn bare_number_defaults_to_px() {
        let el = element_with(vec![("width", Expr::number(100.0))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.styles, vec!["width: 100px".to_string()]);
    }

    #[test]
    fn unit_suffix_passes_through() {
        let el = element_with(vec![(
            "width",
            Expr::Number {
                value: 50.0,
                unit: Some("%".to_string()),
            },
        )]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.styles, vec!["width: 50%".to_string()]);
    }

    #[test]
    fn hex_color_gains_hash() {
        let el = element_with(vec![("bg", Expr::Str("ff0000".to_string()))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.styles, vec!["background-color: #ff0000".to_string()]);
    }

    #[test]
    fn named_color_passes_through() {
        let el = element_with(vec![("color", Expr::Str("red".to_string()))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.styles, vec!["color: red".to_string()]);
    }

    #[test]
    fn hide_flag_sets_display_none() {
        let el = element_with(vec![("hide", Expr::Bool(true))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.styles, vec!["display: none".to_string()]);

        let el = element_with(vec![("show", Expr::Bool(false))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.styles, vec!["display: none".to_string()]);

        let el = element_with(vec![("show", Expr::Bool(true))]);
        let resolved = resolve_element(&el, "20px");
        assert!(resolved.styles.is_empty());
    }

    #[test]
    fn center_without_base_requests_wrapper() {
        let el = element_with(vec![("center", Expr::Bool(true))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.wrapper, Some("center"));
        assert!(resolved.styles.is_empty());
    }

    #[test]
    fn base_positioning_uses_page_padding_for_bare_offsets() {
        let el = element_with(vec![
            ("base", Expr::Bool(true)),
            ("bottom", Expr::Bool(true)),
            ("left", Expr::number(10.0)),
        ]);
        let resolved = resolve_element(&el, "32px");
        assert!(resolved.styles.contains(&"position: absolute".to_string()));
        assert!(resolved.styles.contains(&"bottom: 32px".to_string()));
        assert!(resolved.styles.contains(&"left: 10px".to_string()));
        assert_eq!(resolved.wrapper, None);
    }

    #[test]
    fn fixed_positioning() {
        let el = element_with(vec![("fixed", Expr::Bool(true)), ("top", Expr::number(0.0))]);
        let resolved = resolve_element(&el, "20px");
        assert!(resolved.styles.contains(&"position: fixed".to_string()));
        assert!(resolved.styles.contains(&"top: 0px".to_string()));
    }

    #[test]
    fn border_gets_solid_style_once() {
        let el = element_with(vec![("border", Expr::number(2.0))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(
            resolved.styles,
            vec!["border-width: 2px".to_string(), "border-style: solid".to_string()]
        );
    }

    #[test]
    fn unknown_key_becomes_data_attribute() {
        let el = element_with(vec![("role", Expr::Str("banner".to_string()))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(
            resolved.attrs,
            vec![("data-role".to_string(), "banner".to_string())]
        );
    }

    #[test]
    fn var_property_registers_name() {
        let el = element_with(vec![("var", Expr::Str("myBox".to_string()))]);
        let resolved = resolve_element(&el, "20px");
        assert_eq!(resolved.var_name, Some("myBox".to_string()));
    }

    #[test]
    fn row_and_column_get_flex_defaults() {
        let mut el = element_with(vec![]);
        el.name = "row".to_string();
        let resolved = resolve_element(&el, "20px");
        assert_eq!(
            resolved.styles,
            vec!["display: flex".to_string(), "flex-direction: row".to_string()]
        );
    }
}
