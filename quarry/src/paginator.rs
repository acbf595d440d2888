//! Page of results with paging metadata

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// A bounded slice of results plus page metadata
///
/// Built either with a known total ([`Paginator::counted`]) or from an
/// over-fetched result set when the total is unknown
/// ([`Paginator::uncounted`]). Items are truncated to `per_page` in both
/// modes.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator<T> {
    items: Vec<T>,
    per_page: usize,
    current_page: usize,
    total_items: Option<u64>,
    has_more: bool,
}

impl<T> Paginator<T> {
    /// Page with a known total: more pages exist while
    /// `per_page * current_page < total_items`
    pub fn counted(mut items: Vec<T>, per_page: usize, current_page: usize, total_items: u64) -> Self {
        let has_more = (per_page as u64).saturating_mul(current_page as u64) < total_items;
        items.truncate(per_page);
        Self {
            items,
            per_page,
            current_page,
            total_items: Some(total_items),
            has_more,
        }
    }

    /// Page built from a result set fetched with one extra item
    pub fn uncounted(mut items: Vec<T>, per_page: usize, current_page: usize) -> Self {
        let has_more = items.len() > per_page;
        items.truncate(per_page);
        Self {
            items,
            per_page,
            current_page,
            total_items: None,
            has_more,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Total matching items, `None` for uncounted pages
    pub fn total(&self) -> Option<u64> {
        self.total_items
    }

    pub fn has_more_pages(&self) -> bool {
        self.has_more
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Paginator<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: Serialize> Serialize for Paginator<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Paginator", 5)?;
        state.serialize_field("current_page", &self.current_page)?;
        state.serialize_field("per_page", &self.per_page)?;
        state.serialize_field("data", &self.items)?;
        state.serialize_field("has_more", &self.has_more)?;
        state.serialize_field("total_items", &self.total_items)?;
        state.end()
    }
}

impl<T: Serialize> fmt::Display for Paginator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    // ===================================================================
    // Counted mode
    // ===================================================================

    #[test]
    fn test_counted_has_more() {
        let page = Paginator::counted((0..10).collect::<Vec<i32>>(), 10, 2, 25);
        assert!(page.has_more_pages());
        assert_eq!(page.total(), Some(25));
    }

    #[test]
    fn test_counted_exact_last_page() {
        let page = Paginator::counted((0..10).collect::<Vec<i32>>(), 10, 2, 20);
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_counted_truncates() {
        let page = Paginator::counted((0..15).collect::<Vec<i32>>(), 10, 1, 100);
        assert_eq!(page.len(), 10);
        assert_eq!(page.items().last(), Some(&9));
    }

    // ===================================================================
    // Uncounted mode
    // ===================================================================

    #[test]
    fn test_uncounted_over_fetch() {
        let page = Paginator::uncounted((0..11).collect::<Vec<i32>>(), 10, 1);
        assert_eq!(page.len(), 10);
        assert!(page.has_more_pages());
        assert_eq!(page.total(), None);
    }

    #[test]
    fn test_uncounted_exact() {
        let page = Paginator::uncounted((0..10).collect::<Vec<i32>>(), 10, 3);
        assert_eq!(page.len(), 10);
        assert!(!page.has_more_pages());
        assert_eq!(page.current_page(), 3);
    }

    #[test]
    fn test_uncounted_empty() {
        let page: Paginator<i32> = Paginator::uncounted(vec![], 10, 1);
        assert!(page.is_empty());
        assert!(!page.has_more_pages());
    }

    // ===================================================================
    // Serialization
    // ===================================================================

    #[test]
    fn test_serialize_shape() {
        let page = Paginator::counted(vec!["a", "b"], 2, 1, 3);
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "current_page": 1,
                "per_page": 2,
                "data": ["a", "b"],
                "has_more": true,
                "total_items": 3
            })
        );
        assert_eq!(
            page.to_string(),
            r#"{"current_page":1,"per_page":2,"data":["a","b"],"has_more":true,"total_items":3}"#
        );
    }

    #[test]
    fn test_serialize_uncounted_total_null() {
        let page = Paginator::uncounted(vec![1], 5, 1);
        assert_eq!(serde_json::to_value(&page).unwrap()["total_items"], json!(null));
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_per_page(len in 0usize..50, per_page in 1usize..20, page in 1usize..5) {
            let items: Vec<usize> = (0..len).collect();
            let counted = Paginator::counted(items.clone(), per_page, page, len as u64);
            let uncounted = Paginator::uncounted(items, per_page, page);
            prop_assert!(counted.len() <= per_page);
            prop_assert!(uncounted.len() <= per_page);
            prop_assert_eq!(uncounted.has_more_pages(), len > per_page);
        }
    }
}
