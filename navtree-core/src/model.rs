use crate::error::{MenuError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    Header,
    Footer,
    Sidebar,
}

impl MenuLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuLocation::Header => "header",
            MenuLocation::Footer => "footer",
            MenuLocation::Sidebar => "sidebar",
        }
    }
}

impl FromStr for MenuLocation {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "header" => Ok(MenuLocation::Header),
            "footer" => Ok(MenuLocation::Footer),
            "sidebar" => Ok(MenuLocation::Sidebar),
            other => Err(MenuError::validation(
                "location",
                format!("'{}' is not one of header, footer, sidebar", other),
            )),
        }
    }
}

impl fmt::Display for MenuLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub location: MenuLocation,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Page,
    Url,
    Dropdown,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Page => "page",
            LinkType::Url => "url",
            LinkType::Dropdown => "dropdown",
        }
    }
}

impl FromStr for LinkType {
    type Err = MenuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "page" => Ok(LinkType::Page),
            "url" => Ok(LinkType::Url),
            "dropdown" => Ok(LinkType::Dropdown),
            other => Err(MenuError::validation(
                "link_type",
                format!("'{}' is not one of page, url, dropdown", other),
            )),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Navigation target of an item; the variant decides what `target` means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Link {
    Page { page: String },
    Url { url: String },
    Dropdown,
}

impl Link {
    pub fn link_type(&self) -> LinkType {
        match self {
            Link::Page { .. } => LinkType::Page,
            Link::Url { .. } => LinkType::Url,
            Link::Dropdown => LinkType::Dropdown,
        }
    }

    /// The stored `target` column. Dropdowns always store an empty target.
    pub fn target(&self) -> &str {
        match self {
            Link::Page { page } => page,
            Link::Url { url } => url,
            Link::Dropdown => "",
        }
    }

    /// Rebuilds a link from its stored columns without validating the target.
    pub fn from_parts(link_type: LinkType, target: &str) -> Self {
        match link_type {
            LinkType::Page => Link::Page {
                page: target.to_string(),
            },
            LinkType::Url => Link::Url {
                url: target.to_string(),
            },
            LinkType::Dropdown => Link::Dropdown,
        }
    }

    pub fn is_navigable(&self) -> bool {
        !matches!(self, Link::Dropdown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub menu_id: i64,
    pub parent_id: Option<i64>,
    pub label: String,
    pub link: Link,
    pub open_new_tab: bool,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl MenuItem {
    pub fn link_type(&self) -> LinkType {
        self.link.link_type()
    }

    pub fn target(&self) -> &str {
        self.link.target()
    }
}

/// Fields accepted when creating an item. `target` is interpreted by `link_type`.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub menu_id: i64,
    pub label: String,
    pub link_type: LinkType,
    pub target: String,
    pub parent_id: Option<i64>,
    pub open_new_tab: bool,
    pub is_active: bool,
    pub sort_order: Option<i64>,
}

impl NewMenuItem {
    pub fn new(menu_id: i64, label: &str, link_type: LinkType, target: &str) -> Self {
        Self {
            menu_id,
            label: label.to_string(),
            link_type,
            target: target.to_string(),
            parent_id: None,
            open_new_tab: false,
            is_active: true,
            sort_order: None,
        }
    }

    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_new_tab(mut self, open_new_tab: bool) -> Self {
        self.open_new_tab = open_new_tab;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Partial edit of an item. `None` leaves a field untouched;
/// `parent_id: Some(None)` moves the item to the root.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub label: Option<String>,
    pub link_type: Option<LinkType>,
    pub target: Option<String>,
    pub parent_id: Option<Option<i64>>,
    pub open_new_tab: Option<bool>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.link_type.is_none()
            && self.target.is_none()
            && self.parent_id.is_none()
            && self.open_new_tab.is_none()
            && self.is_active.is_none()
            && self.sort_order.is_none()
    }

    pub fn touches_link(&self) -> bool {
        self.link_type.is_some() || self.target.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub slug: String,
    pub title: String,
}
