//! Carousel items and the list padding that keeps short lists from leaving
//! visible holes in the ring.

use serde::Deserialize;

/// One card as supplied by the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CarouselItem {
    pub id: String,
    /// Image URL, relative to the served `dist/`.
    pub image: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// A card placed on the ring. `id` is unique across the padded list.
#[derive(Debug, Clone, PartialEq)]
pub struct RingItem {
    pub id: String,
    /// Index into the caller's original list.
    pub source_index: usize,
    /// False for the first copy of each caller item.
    pub is_repeat: bool,
    pub item: CarouselItem,
}

/// Repeat `items` (whole list, order kept) until at least `min_cards` cards
/// exist, then give every card the id `"{id}-{position}"`.
pub fn normalize_items(items: &[CarouselItem], min_cards: usize) -> Vec<RingItem> {
    if items.is_empty() {
        return Vec::new();
    }
    let repeats = min_cards.div_ceil(items.len()).max(1);
    (0..repeats)
        .flat_map(|_| items.iter().enumerate())
        .enumerate()
        .map(|(position, (source_index, item))| RingItem {
            id: format!("{}-{}", item.id, position),
            source_index,
            is_repeat: position >= items.len(),
            item: item.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn item(id: &str) -> CarouselItem {
        CarouselItem {
            id: id.to_string(),
            image: format!("assets/{id}.jpg"),
            title: id.to_uppercase(),
            year: None,
            href: None,
        }
    }

    #[test]
    fn four_items_pad_to_sixteen() {
        let items: Vec<_> = ["a", "b", "c", "d"].iter().map(|s| item(s)).collect();
        let ring = normalize_items(&items, 14);
        assert_eq!(ring.len(), 16);
        for (position, card) in ring.iter().enumerate() {
            assert_eq!(card.item, items[position % 4]);
            assert_eq!(card.source_index, position % 4);
        }
        assert_eq!(ring[0].id, "a-0");
        assert_eq!(ring[5].id, "b-5");
        let ids: HashSet<_> = ring.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 16);
    }

    #[test]
    fn length_is_smallest_multiple_reaching_min() {
        let items: Vec<_> = ["a", "b", "c"].iter().map(|s| item(s)).collect();
        for min_cards in 0..40 {
            let len = normalize_items(&items, min_cards).len();
            assert_eq!(len % 3, 0);
            assert!(len >= min_cards);
            assert!(len == 3 || len - 3 < min_cards, "min {} gave {}", min_cards, len);
        }
    }

    #[test]
    fn long_lists_are_not_truncated() {
        let items: Vec<_> = (0..20).map(|i| item(&format!("p{i}"))).collect();
        let ring = normalize_items(&items, 14);
        assert_eq!(ring.len(), 20);
        assert!(ring.iter().all(|c| !c.is_repeat));
    }

    #[test]
    fn repeats_are_flagged() {
        let items = vec![item("a"), item("b")];
        let ring = normalize_items(&items, 5);
        let flags: Vec<_> = ring.iter().map(|c| c.is_repeat).collect();
        assert_eq!(flags, vec![false, false, true, true, true, true]);
    }

    #[test]
    fn empty_list_stays_empty() {
        assert!(normalize_items(&[], 14).is_empty());
    }

    #[test]
    fn optional_fields_default_from_json() {
        let parsed: CarouselItem =
            serde_json::from_str(r#"{ "id": "x", "image": "x.jpg", "title": "X" }"#).unwrap();
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.href, None);
    }
}
