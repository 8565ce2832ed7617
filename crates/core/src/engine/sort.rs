//! Local ordering for sources the server does not sort.

use std::cmp::Ordering;

use crate::model::Item;
use crate::query::{SortField, SortOrder};

/// Compare two items on `field` in ascending order.
///
/// Titles compare case-insensitively; price and stock compare numerically.
pub fn compare(a: &Item, b: &Item, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Stock => a.stock.cmp(&b.stock),
    }
}

/// Stable sort: items that compare equal keep their incoming order.
pub fn sort_items(items: &mut [&Item], field: SortField, order: SortOrder) {
    items.sort_by(|a, b| {
        let ordering = compare(a, b, field);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_case_insensitive() {
        let a = Item::new(1, "apple", "x", 1.0, 1);
        let b = Item::new(2, "Banana", "x", 1.0, 1);
        assert_eq!(compare(&a, &b, SortField::Title), Ordering::Less);
    }

    #[test]
    fn test_descending_keeps_ties_in_server_order() {
        let items = [
            Item::new(1, "a", "x", 5.0, 3),
            Item::new(2, "b", "x", 5.0, 9),
            Item::new(3, "c", "x", 5.0, 3),
        ];
        let mut refs: Vec<&Item> = items.iter().collect();
        sort_items(&mut refs, SortField::Stock, SortOrder::Desc);
        let ids: Vec<u64> = refs.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_price_numeric() {
        let items = [Item::new(1, "a", "x", 10.5, 0), Item::new(2, "b", "x", 9.99, 0)];
        let mut refs: Vec<&Item> = items.iter().collect();
        sort_items(&mut refs, SortField::Price, SortOrder::Asc);
        assert_eq!(refs[0].id, 2);
    }
}
