//! Form-control inventory of a rendered page, used to author selector files.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Links listed per page; pages with navigation menus have hundreds.
pub const MAX_LINKS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlInfo {
    pub tag_name: String,
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub element_id: Option<String>,
    pub class_name: Option<String>,
    pub placeholder: Option<String>,
    pub text: Option<String>,
    pub href: Option<String>,
    /// CSS locator that picks this control, for pasting into a selector file.
    pub suggested_locator: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInventory {
    pub title: Option<String>,
    pub inputs: Vec<ControlInfo>,
    pub buttons: Vec<ControlInfo>,
    pub links: Vec<ControlInfo>,
    pub forms: usize,
}

impl PageInventory {
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut inventory = PageInventory::default();

        if let Ok(selector) = Selector::parse("title") {
            inventory.title = document
                .select(&selector)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string());
        }
        if let Ok(selector) = Selector::parse("form") {
            inventory.forms = document.select(&selector).count();
        }

        inventory.inputs = collect(&document, "input, textarea, select", usize::MAX);
        inventory.buttons = collect(&document, "button, input[type='submit']", usize::MAX);
        inventory.links = collect(&document, "a", MAX_LINKS);
        inventory
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.buttons.is_empty() && self.links.is_empty()
    }
}

fn collect(document: &Html, selector_str: &str, limit: usize) -> Vec<ControlInfo> {
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .take(limit)
        .map(control_info)
        .collect()
}

fn control_info(element_ref: ElementRef<'_>) -> ControlInfo {
    let element = element_ref.value();
    let attributes: HashMap<&str, &str> = element.attrs().collect();
    let attr = |name: &str| attributes.get(name).map(|v| v.to_string());

    let text = element_ref.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    ControlInfo {
        tag_name: element.name().to_string(),
        input_type: attr("type"),
        name: attr("name"),
        element_id: attr("id"),
        class_name: attr("class"),
        placeholder: attr("placeholder"),
        text: if text.is_empty() { None } else { Some(text) },
        href: attr("href"),
        suggested_locator: suggest_locator(element.name(), &attributes),
    }
}

/// Most specific stable attribute wins: id, name, type, then classes.
pub fn suggest_locator(tag_name: &str, attributes: &HashMap<&str, &str>) -> String {
    if let Some(id) = attributes.get("id") {
        return format!("#{}", id);
    }
    if let Some(name) = attributes.get("name") {
        return format!("{}[name=\"{}\"]", tag_name, name);
    }
    if let Some(input_type) = attributes.get("type") {
        return format!("{}[type=\"{}\"]", tag_name, input_type);
    }

    let mut selector = tag_name.to_string();
    if let Some(class) = attributes.get("class") {
        let classes = class.split_whitespace().collect::<Vec<_>>();
        if !classes.is_empty() {
            selector.push_str(&format!(".{}", classes.join(".")));
        }
    }
    selector
}
