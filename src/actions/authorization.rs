//! Post-fetch authorization filter for listings.
//!
//! Filtering runs after the store has applied the page limit, so a full page
//! can come back short, or empty, while the continue token still says more
//! data exists. Pages are never refilled to reach the limit.

use super::Abilities;
use crate::types::Resource;

/// Drop the elements the viewer cannot read, in place, keeping the order of the rest.
pub fn filter_readable<T: Resource>(items: &mut Vec<T>, abilities: &Abilities<'_, T>) {
    items.retain(|item| abilities.can_read(item));
}
