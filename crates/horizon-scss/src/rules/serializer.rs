//! Rendering definitions to CSS text.

use super::Definition;
use crate::CompilerConfig;

/// Renders definitions as CSS, filtering debug rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Serializer {
    debug_selector: String,
    keep_debug_style: bool,
    debug_comments: bool,
}

impl Serializer {
    /// Create a serializer using the rendering options of `config`.
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            debug_selector: config.debug_selector.clone(),
            keep_debug_style: config.keep_debug_style,
            debug_comments: config.debug_comments,
        }
    }

    /// Render `definitions`.
    ///
    /// Selectors are joined with `,\n`; each declaration goes on its own
    /// tab-indented line. Rules left without selectors after debug filtering
    /// are skipped, and comments only appear when debug comments are on.
    pub fn render(&self, definitions: &[Definition]) -> String {
        let mut css = String::new();

        for definition in definitions {
            match definition {
                Definition::Comment(text) => {
                    if self.debug_comments {
                        css.push_str("/* ");
                        css.push_str(text);
                        css.push_str(" */\n");
                    }
                }
                Definition::Rule {
                    selectors,
                    properties,
                } => {
                    let selectors = self.filter_debug_selectors(selectors);
                    if selectors.is_empty() {
                        continue;
                    }
                    css.push_str(&selectors.join(",\n"));
                    css.push_str(" {\n");
                    for property in properties {
                        css.push('\t');
                        css.push_str(&property.name);
                        css.push_str(": ");
                        css.push_str(&property.value);
                        css.push_str(";\n");
                    }
                    css.push_str("}\n");
                }
            }
        }

        css
    }

    /// Drop selectors tagged with the debug marker, or strip the marker from
    /// them when debug styles are kept.
    pub fn filter_debug_selectors(&self, selectors: &[String]) -> Vec<String> {
        selectors
            .iter()
            .filter_map(|selector| {
                if !self.is_debug(selector) {
                    return Some(selector.clone());
                }
                if !self.keep_debug_style {
                    return None;
                }
                let stripped = selector.replace(&self.debug_selector, "");
                let stripped = stripped.trim();
                (!stripped.is_empty()).then(|| stripped.to_string())
            })
            .collect()
    }

    /// The marker counts when it ends the selector or is followed by
    /// whitespace, `.` or `#`, so `#debugger` is not a debug selector.
    fn is_debug(&self, selector: &str) -> bool {
        if self.debug_selector.is_empty() {
            return false;
        }
        selector
            .match_indices(&self.debug_selector)
            .any(|(start, marker)| {
                match selector[start + marker.len()..].chars().next() {
                    None => true,
                    Some(next) => next.is_whitespace() || next == '.' || next == '#',
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Property;

    fn rule(selectors: &[&str], properties: &[(&str, &str)]) -> Definition {
        Definition::Rule {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            properties: properties
                .iter()
                .map(|(n, v)| Property::new(*n, *v))
                .collect(),
        }
    }

    #[test]
    fn renders_rules() {
        let serializer = Serializer::new(&CompilerConfig::default());
        let css = serializer.render(&[
            rule(&["#data td", "#data th"], &[("padding", "2px")]),
            rule(&[".a"], &[("x", "1"), ("y", "2")]),
        ]);
        assert_eq!(
            css,
            "#data td,\n#data th {\n\tpadding: 2px;\n}\n.a {\n\tx: 1;\n\ty: 2;\n}\n"
        );
    }

    #[test]
    fn comments_need_debug_comments() {
        let definitions = [Definition::Comment("source: main.scss".into())];

        let plain = Serializer::new(&CompilerConfig::default());
        assert_eq!(plain.render(&definitions), "");

        let debug = Serializer::new(&CompilerConfig::default().debug_comments(true));
        assert_eq!(debug.render(&definitions), "/* source: main.scss */\n");
    }

    #[test]
    fn debug_selectors_are_dropped() {
        let serializer = Serializer::new(&CompilerConfig::default());
        let css = serializer.render(&[
            rule(&["#debug .a", ".b"], &[("x", "1")]),
            rule(&["#debug"], &[("y", "2")]),
            rule(&["#debugger"], &[("z", "3")]),
        ]);
        assert_eq!(css, ".b {\n\tx: 1;\n}\n#debugger {\n\tz: 3;\n}\n");
    }

    #[test]
    fn debug_marker_can_be_stripped() {
        let serializer = Serializer::new(&CompilerConfig::default().keep_debug_style(true));
        let selectors: Vec<String> = ["#debug .a", "#debug", "p#debug.x"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(serializer.filter_debug_selectors(&selectors), vec![".a", "p.x"]);
    }
}
