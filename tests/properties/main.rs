//! Property tests for repository invariants.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use stored_rust::{Entity, Filter, InMemoryStore, RepositoriesExt, StoreHandle};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
struct Item {
    id: i64,
    label: String,
    qty: i32,
}

fn item() -> impl Strategy<Value = Item> {
    ("[a-z]{1,8}", -50i32..50).prop_map(|(label, qty)| Item { id: 0, label, qty })
}

proptest! {
    #[test]
    fn saved_entities_round_trip(items in prop::collection::vec(item(), 1..20)) {
        let repo = StoreHandle::new(InMemoryStore::new()).repository::<Item>();

        for original in &items {
            let saved = repo.save(original.clone()).unwrap();
            prop_assert!(saved.id > 0);

            let stored = repo.get(saved.id).unwrap().unwrap();
            prop_assert_eq!(&stored.label, &original.label);
            prop_assert_eq!(stored.qty, original.qty);
        }
        prop_assert_eq!(repo.count().unwrap(), items.len());
        prop_assert_eq!(repo.count().unwrap(), repo.get_all().unwrap().len());
    }

    #[test]
    fn find_returns_only_unique_matches(
        items in prop::collection::vec(item(), 0..20),
        threshold in -50i32..50,
    ) {
        let repo = StoreHandle::new(InMemoryStore::new()).repository::<Item>();
        repo.save_all(items.clone()).unwrap();

        let expected = items.iter().filter(|i| i.qty > threshold).count();
        let found = repo.find(move |i: &Item| i.qty > threshold).unwrap();
        prop_assert_eq!(found.is_some(), expected == 1);
        prop_assert_eq!(repo.exists(move |i: &Item| i.qty > threshold).unwrap(), expected > 0);
    }

    #[test]
    fn closures_and_filters_agree(
        items in prop::collection::vec(item(), 0..20),
        threshold in -50i32..50,
    ) {
        let repo = StoreHandle::new(InMemoryStore::new()).repository::<Item>();
        repo.save_all(items).unwrap();

        let by_closure = repo.find_all(move |i: &Item| i.qty <= threshold).unwrap();
        let by_filter = repo.find_all(Filter::lte("qty", threshold)).unwrap();
        prop_assert_eq!(by_closure, by_filter);
    }

    #[test]
    fn deletes_are_observed(items in prop::collection::vec(item(), 1..12), pick in any::<prop::sample::Index>()) {
        let repo = StoreHandle::new(InMemoryStore::new()).repository::<Item>();
        let saved = repo.save_all(items).unwrap();
        let victim = pick.get(&saved);

        repo.delete(victim).unwrap();
        prop_assert!(repo.get(victim.id).unwrap().is_none());
        prop_assert_eq!(repo.count().unwrap(), saved.len() - 1);
    }
}
