//! Diversity and fuel-preference re-ranking
//!
//! Post-processing passes over ranked candidates: a per-brand cap that keeps
//! result lists from being swamped by one manufacturer, and a stable
//! partition that moves a preferred fuel type to the front. Both operate on
//! rank order and never change relative order within a group.

/// One brand-cap pass over ranked items.
///
/// The top-ranked item is always kept. Each later item is admitted while
/// fewer than `max_per_brand` already-admitted items share its brand, or its
/// brand has not appeared yet. Returns the admitted items and the overflow,
/// both in rank order; callers pad from the overflow when a result quota is
/// not met.
pub fn brand_cap_partition<T, F>(items: &[T], brand_of: F, max_per_brand: usize) -> (Vec<T>, Vec<T>)
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let mut kept: Vec<T> = Vec::new();
    let mut overflow: Vec<T> = Vec::new();
    let mut seen_brands: Vec<String> = Vec::new();

    for (rank, item) in items.iter().enumerate() {
        let brand = brand_of(item);
        let brand_count = kept.iter().filter(|k| brand_of(k) == brand).count();

        if rank == 0 || brand_count < max_per_brand || !seen_brands.iter().any(|b| b == brand) {
            kept.push(item.clone());
            if !seen_brands.iter().any(|b| b == brand) {
                seen_brands.push(brand.to_string());
            }
        } else {
            overflow.push(item.clone());
        }
    }

    (kept, overflow)
}

/// Brand-cap a ranked list to `limit` items, padding from the overflow in
/// rank order when the capped pass comes up short.
pub fn cap_brands_with_limit<T, F>(
    items: &[T],
    brand_of: F,
    max_per_brand: usize,
    limit: usize,
) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let (mut kept, overflow) = brand_cap_partition(items, brand_of, max_per_brand);
    kept.truncate(limit);
    for item in overflow {
        if kept.len() >= limit {
            break;
        }
        kept.push(item);
    }
    kept
}

/// Stable partition moving items of the preferred fuel type to the front
pub fn prioritize_fuel<T, F>(items: &[T], fuel_of: F, preferred: &str) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let mut preferred_items: Vec<T> = Vec::new();
    let mut other_items: Vec<T> = Vec::new();

    for item in items {
        if fuel_of(item) == preferred {
            preferred_items.push(item.clone());
        } else {
            other_items.push(item.clone());
        }
    }

    preferred_items.extend(other_items);
    preferred_items
}
