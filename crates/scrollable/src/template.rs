#![forbid(unsafe_code)]

//! Attribute bag to virtual node tree.
//!
//! ```text
//! div.scrollable[wrapper]            delegated attributes, layout classes
//! ├── div.main#<container>[scroll_container]
//! │   └── div.window[scroll_sizer]
//! │       └── slot
//! ├── <proxy direction=vertical>.right[right_scrollbar]      if active
//! └── <proxy direction=horizontal>.bottom[bottom_scrollbar]  if active
//! ```
//!
//! The tree is a pure function of the config and state, so rendering the
//! same state twice produces equal trees and the patcher keeps every node.

use scrollable_core::VNode;

use crate::config::{Section, WidgetConfig};
use crate::state::{ScrollbarPosition, WidgetState};

/// Build the widget's shadow tree.
#[must_use]
pub fn render_tree(config: &WidgetConfig, state: &WidgetState) -> VNode {
    let key = config.section_attribute.as_str();

    let sizer = VNode::new("div")
        .attr("class", config.classes.window.as_str())
        .attr(key, config.section_id(Section::ScrollSizer))
        .child(VNode::new("slot"));
    let container = VNode::new("div")
        .attr("class", config.classes.main.as_str())
        .attr("id", state.container_id())
        .attr(key, config.section_id(Section::ScrollContainer))
        .child(sizer);

    let proxies = [ScrollbarPosition::Right, ScrollbarPosition::Bottom]
        .into_iter()
        .filter(|position| state.is_active(*position))
        .map(|position| proxy(config, state, position));

    VNode::new("div")
        .attrs(
            state
                .delegated()
                .iter()
                .filter(|(name, _)| name.as_str() != "class")
                .map(|(name, value)| (name.clone(), value.clone())),
        )
        .attr("class", wrapper_class(config, state))
        .attr(key, config.section_id(Section::Wrapper))
        .child(container)
        .children(proxies)
}

fn proxy(config: &WidgetConfig, state: &WidgetState, position: ScrollbarPosition) -> VNode {
    let (direction, class) = match position {
        ScrollbarPosition::Right => ("vertical", config.classes.right.as_str()),
        ScrollbarPosition::Bottom => ("horizontal", config.classes.bottom.as_str()),
    };
    VNode::new(config.proxy_tag.as_str())
        .attr("direction", direction)
        .attr("class", class)
        .attr("container", state.container_id())
        .attr(
            config.section_attribute.as_str(),
            config.section_id(Section::scrollbar(position)),
        )
}

/// Base class, then the delegated class, then the layout modifier.
fn wrapper_class(config: &WidgetConfig, state: &WidgetState) -> String {
    let classes = &config.classes;
    let mut names = vec![classes.scrollable.as_str()];
    if let Some(delegated) = state.delegated().get("class").and_then(|v| v.as_str()) {
        names.extend(delegated.split_whitespace());
    }
    let right = state.is_active(ScrollbarPosition::Right);
    let bottom = state.is_active(ScrollbarPosition::Bottom);
    match (right, bottom) {
        (true, true) => names.push(classes.scrollable_both.as_str()),
        (true, false) => names.push(classes.scrollable_right.as_str()),
        (false, true) => names.push(classes.scrollable_bottom.as_str()),
        (false, false) => {}
    }
    names.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scrollable_core::AttrValue;

    use ScrollbarPosition::{Bottom, Right};

    fn state(scrollbars: Vec<ScrollbarPosition>) -> WidgetState {
        WidgetState::new("container-1", scrollbars).expect("state")
    }

    fn section<'a>(tree: &'a VNode, config: &WidgetConfig, section: Section) -> Option<&'a VNode> {
        let id = config.section_id(section);
        tree.find(&|node| {
            node.attribute(&config.section_attribute)
                .and_then(AttrValue::as_str)
                == Some(id.as_str())
        })
    }

    #[test]
    fn full_tree_shape() {
        let config = WidgetConfig::default();
        let tree = render_tree(&config, &state(vec![Bottom, Right]));

        assert_eq!(tree.tag, "div");
        assert_eq!(
            tree.attribute("class").and_then(AttrValue::as_str),
            Some("scrollable scrollable-both")
        );
        let tags: Vec<&str> = tree.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec!["div", "enhanced-dom-scrollbar", "enhanced-dom-scrollbar"]
        );

        let container = section(&tree, &config, Section::ScrollContainer).expect("container");
        assert_eq!(
            container.attribute("id").and_then(AttrValue::as_str),
            Some("container-1")
        );
        let sizer = section(&tree, &config, Section::ScrollSizer).expect("sizer");
        assert_eq!(sizer.children, vec![VNode::new("slot")]);

        let right = section(&tree, &config, Section::RightScrollbar).expect("right");
        assert_eq!(
            right.attribute_strings().get("direction").map(String::as_str),
            Some("vertical")
        );
        assert_eq!(
            right.attribute_strings().get("container").map(String::as_str),
            Some("container-1")
        );
        assert_eq!(
            tree.children[1].attribute("direction").and_then(AttrValue::as_str),
            Some("vertical"),
            "right proxy renders before bottom"
        );
    }

    #[test]
    fn single_scrollbar_layouts() {
        let config = WidgetConfig::default();
        let bottom_only = render_tree(&config, &state(vec![Bottom]));
        assert!(section(&bottom_only, &config, Section::RightScrollbar).is_none());
        assert!(section(&bottom_only, &config, Section::BottomScrollbar).is_some());
        assert_eq!(
            bottom_only.attribute("class").and_then(AttrValue::as_str),
            Some("scrollable scrollable-bottom")
        );

        let right_only = render_tree(&config, &state(vec![Right]));
        assert_eq!(
            right_only.attribute("class").and_then(AttrValue::as_str),
            Some("scrollable scrollable-right")
        );

        let none = render_tree(&config, &state(vec![]));
        assert_eq!(none.children.len(), 1);
        assert_eq!(
            none.attribute("class").and_then(AttrValue::as_str),
            Some("scrollable")
        );
    }

    #[test]
    fn delegated_attributes_reach_wrapper() {
        let config = WidgetConfig::default();
        let mut state = state(vec![Right]);
        state.set_delegated("class", Some("outer  tall"));
        state.set_delegated("style", Some("height: 200px"));
        let tree = render_tree(&config, &state);

        assert_eq!(
            tree.attribute("class").and_then(AttrValue::as_str),
            Some("scrollable outer tall scrollable-right")
        );
        assert_eq!(
            tree.attribute("style").and_then(AttrValue::as_str),
            Some("height: 200px")
        );
    }

    #[test]
    fn equal_state_renders_equal_trees() {
        let config = WidgetConfig::default();
        let state = state(vec![Bottom, Right]);
        assert_eq!(render_tree(&config, &state), render_tree(&config, &state));
    }
}
