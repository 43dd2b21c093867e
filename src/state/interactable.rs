// Hover-target classification: whether the element under the pointer is clickable
// and which category, if any, tags it.

use crate::config::CategoryPalette;
use crate::model::Color;

pub const INTERACTIVE_TAGS: [&str; 2] = ["BUTTON", "A"];
/// `data-cursor="pointer"` opts any element into the interactive state.
pub const CURSOR_ATTR: &str = "data-cursor";
pub const CATEGORY_ATTR: &str = "data-tech";
const MAX_DEPTH: usize = 64;

/// Minimal view of a DOM-like element tree.
pub trait TargetNode: Sized {
    fn tag_name(&self) -> String;
    fn attribute(&self, name: &str) -> Option<String>;
    fn parent(&self) -> Option<Self>;
}

impl TargetNode for web_sys::Element {
    fn tag_name(&self) -> String {
        web_sys::Element::tag_name(self)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.get_attribute(name)
    }

    fn parent(&self) -> Option<Self> {
        self.parent_element()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverClass {
    pub interactive: bool,
    pub category: Option<String>,
    /// `None` for unknown categories; the renderer falls back to the default accent.
    pub category_color: Option<Color>,
}

pub fn is_interactive_tag(tag: &str) -> bool {
    INTERACTIVE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Walk from `target` up through its ancestors. The nearest category marker wins.
pub fn classify<T: TargetNode + Clone>(target: &T, palette: &CategoryPalette) -> HoverClass {
    let mut interactive = false;
    let mut category: Option<String> = None;
    let mut node = Some(target.clone());
    let mut depth = 0;
    while let Some(n) = node {
        if depth >= MAX_DEPTH {
            break;
        }
        if !interactive {
            interactive = is_interactive_tag(&n.tag_name())
                || n.attribute(CURSOR_ATTR).is_some_and(|v| v.trim() == "pointer");
        }
        if category.is_none() {
            category = n
                .attribute(CATEGORY_ATTR)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }
        if interactive && category.is_some() {
            break;
        }
        node = n.parent();
        depth += 1;
    }
    let category_color = category.as_deref().and_then(|c| palette.lookup(c));
    HoverClass { interactive, category, category_color }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::rc::Rc;

    #[derive(Clone, Debug)]
    pub(crate) struct FakeNode {
        tag: String,
        attrs: Vec<(String, String)>,
        up: Option<Rc<FakeNode>>,
    }

    impl FakeNode {
        pub(crate) fn new(tag: &str) -> Self {
            Self { tag: tag.to_string(), attrs: Vec::new(), up: None }
        }

        pub(crate) fn attr(mut self, name: &str, value: &str) -> Self {
            self.attrs.push((name.to_string(), value.to_string()));
            self
        }

        pub(crate) fn inside(mut self, parent: FakeNode) -> Self {
            self.up = Some(Rc::new(parent));
            self
        }
    }

    impl TargetNode for FakeNode {
        fn tag_name(&self) -> String {
            self.tag.clone()
        }

        fn attribute(&self, name: &str) -> Option<String> {
            self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        }

        fn parent(&self) -> Option<Self> {
            self.up.as_deref().cloned()
        }
    }

    #[test]
    fn native_tags_are_interactive() {
        let palette = CategoryPalette::default();
        assert!(classify(&FakeNode::new("BUTTON"), &palette).interactive);
        assert!(classify(&FakeNode::new("a"), &palette).interactive);
        assert!(!classify(&FakeNode::new("DIV"), &palette).interactive);
    }

    #[test]
    fn ancestor_link_makes_child_interactive() {
        let span = FakeNode::new("SPAN").inside(FakeNode::new("A").inside(FakeNode::new("NAV")));
        assert!(classify(&span, &CategoryPalette::default()).interactive);
    }

    #[test]
    fn opt_in_marker_counts() {
        let card = FakeNode::new("DIV").attr(CURSOR_ATTR, "pointer");
        assert!(classify(&card, &CategoryPalette::default()).interactive);
    }

    #[test]
    fn category_comes_from_nearest_marker() {
        let icon = FakeNode::new("SVG").inside(
            FakeNode::new("LI")
                .attr(CATEGORY_ATTR, "react")
                .inside(FakeNode::new("UL").attr(CATEGORY_ATTR, "Docker")),
        );
        let class = classify(&icon, &CategoryPalette::default());
        assert_eq!(class.category.as_deref(), Some("react"));
        assert_eq!(class.category_color, Some(Color::rgb(0x61, 0xDA, 0xFB)));
        assert!(!class.interactive);
    }

    #[test]
    fn unknown_category_has_no_color() {
        let chip = FakeNode::new("SPAN").attr(CATEGORY_ATTR, "Fortran");
        let class = classify(&chip, &CategoryPalette::default());
        assert_eq!(class.category.as_deref(), Some("Fortran"));
        assert_eq!(class.category_color, None);
    }
}
