// Field rules for menu items, keyed by link type

use crate::error::{MenuError, Result};
use crate::model::{Link, LinkType};
use crate::pages::PageRegistry;
use url::Url;

pub const MAX_LABEL_LEN: usize = 255;

pub fn validate_label(label: &str) -> Result<String> {
    let label = label.trim();
    if label.is_empty() {
        return Err(MenuError::validation("label", "label is required"));
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(MenuError::validation(
            "label",
            format!("label must be at most {} characters", MAX_LABEL_LEN),
        ));
    }
    Ok(label.to_string())
}

/// Builds the typed link for `link_type`, checking `target` against its rules.
/// A dropdown discards whatever target it was given.
pub fn validate_link(
    link_type: LinkType,
    target: &str,
    pages: &dyn PageRegistry,
) -> Result<Link> {
    let target = target.trim();
    match link_type {
        LinkType::Page => {
            if target.is_empty() {
                return Err(MenuError::validation(
                    "target",
                    "a page link needs a page identifier",
                ));
            }
            if !pages.contains(target) {
                return Err(MenuError::validation(
                    "target",
                    format!("'{}' is not a known page", target),
                ));
            }
            Ok(Link::Page {
                page: target.to_string(),
            })
        }
        LinkType::Url => {
            if target.is_empty() {
                return Err(MenuError::validation("target", "a url link needs a URL"));
            }
            check_url(target)?;
            Ok(Link::Url {
                url: target.to_string(),
            })
        }
        LinkType::Dropdown => Ok(Link::Dropdown),
    }
}

fn check_url(target: &str) -> Result<()> {
    if target.chars().any(char::is_whitespace) {
        return Err(MenuError::validation("target", "URL must not contain spaces"));
    }
    // Relative paths, anchors and queries stay as typed
    if target.starts_with('/') || target.starts_with('#') || target.starts_with('?') {
        return Ok(());
    }
    if has_scheme(target) {
        return Url::parse(target).map(|_| ()).map_err(|e| {
            MenuError::validation("target", format!("'{}' is not a valid URL: {}", target, e))
        });
    }
    Ok(())
}

fn has_scheme(target: &str) -> bool {
    match target.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
