//! Combining nested selectors with their parents.

use crate::{Error, Result};

/// Combine a nested block's selectors with the enclosing block's.
///
/// Every parent is paired with every child, parents in the outer loop. A
/// child containing `&` has its first `&` replaced by the parent; any `&`
/// left after that is an error. Other children become descendants of the
/// parent. Without a parent the children are returned unchanged.
pub fn combine(parents: Option<&[String]>, children: &[String]) -> Result<Vec<String>> {
    let Some(parents) = parents else {
        return Ok(children.to_vec());
    };

    let mut combined = Vec::with_capacity(parents.len() * children.len());
    for parent in parents {
        for child in children {
            if child.contains('&') {
                let selector = child.replacen('&', parent, 1);
                if selector.contains('&') {
                    return Err(Error::InvalidAmpersandUsage { selector });
                }
                combined.push(selector);
            } else {
                combined.push(format!("{} {}", parent, child));
            }
        }
    }
    Ok(combined)
}

/// Whether a selector uses the universal selector, which matches every
/// element and tends to be slow.
pub fn is_possibly_harmful(selector: &str) -> bool {
    selector.contains('*')
}
