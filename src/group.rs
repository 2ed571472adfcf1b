use crate::data::Listing;
use std::collections::BTreeMap;

/// Two-level partition of listings: outer label, inner label, listings in input order.
pub type Grouping<O, I> = BTreeMap<O, BTreeMap<I, Vec<Listing>>>;

fn bucket<K, F, L>(listings: L, classify: F) -> BTreeMap<K, Vec<Listing>>
where
    K: Ord,
    F: Fn(&Listing) -> K,
    L: IntoIterator<Item = Listing>,
{
    listings
        .into_iter()
        .fold(BTreeMap::new(), |mut group, listing| {
            group
                .entry(classify(&listing))
                .or_insert_with(Vec::new)
                .push(listing);
            group
        })
}

/// Groups `listings` by `outer`, then regroups each outer bucket by `inner`.
///
/// Only label pairs that actually occur get an entry.
pub fn aggregate<O, I, FO, FI>(listings: &[Listing], outer: FO, inner: FI) -> Grouping<O, I>
where
    O: Ord,
    I: Ord,
    FO: Fn(&Listing) -> O,
    FI: Fn(&Listing) -> I,
{
    bucket(listings.iter().cloned(), outer)
        .into_iter()
        .map(|(key, members)| (key, bucket(members, &inner)))
        .collect()
}

/// Number of listings across all leaves.
pub fn leaf_count<O, I>(grouping: &Grouping<O, I>) -> usize {
    grouping
        .values()
        .flat_map(BTreeMap::values)
        .map(Vec::len)
        .sum()
}
