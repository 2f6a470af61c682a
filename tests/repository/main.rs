//! Integration tests for Repository over InMemoryStore.

mod entities;

use std::time::Duration;

use entities::{Customer, LedgerLine, Voucher};
use stored_rust::{
    Filter, FindPolicy, HasIdentity, InMemoryStore, RepositoriesExt, Repository,
    RepositoryConfig, Store, StoreError, StoreHandle,
};

fn handle() -> StoreHandle {
    stored_rust::telemetry::init();
    StoreHandle::new(InMemoryStore::new())
}

#[test]
fn customer_lifecycle() {
    let customers = handle().repository::<Customer>();

    let first = customers.save(Customer::new("a")).unwrap();
    assert_eq!(first.id, 1);
    assert_eq!(customers.count().unwrap(), 1);

    let second = customers.save(Customer::new("b")).unwrap();
    assert_eq!(second.id, 2);
    assert_eq!(customers.count().unwrap(), 2);

    let found = customers.find(|c: &Customer| c.name == "a").unwrap();
    assert_eq!(found, Some(first.clone()));

    customers.delete(&first).unwrap();
    assert_eq!(customers.count().unwrap(), 1);
    assert!(customers.get(1).unwrap().is_none());
    assert_eq!(customers.get(2).unwrap(), Some(second));
}

#[test]
fn get_unknown_identity_is_absent() {
    let customers = handle().repository::<Customer>();
    assert!(customers.get(99).unwrap().is_none());
    assert!(customers.get(0).unwrap().is_none());
    assert!(customers.get(-1).unwrap().is_none());
}

#[test]
fn repeated_save_keeps_identity_and_state() {
    let customers = handle().repository::<Customer>();
    let mut saved = customers.save(Customer::new("carol")).unwrap();

    saved.email = Some("carol@example.com".into());
    let once = customers.save(saved.clone()).unwrap();
    let twice = customers.save(once.clone()).unwrap();

    assert_eq!(once.id, saved.id);
    assert_eq!(twice, once);
    assert_eq!(customers.get(saved.id).unwrap(), Some(once));
    assert_eq!(customers.count().unwrap(), 1);
}

#[test]
fn repositories_share_one_store() {
    let handle = handle();
    let writer = handle.repository::<Customer>();
    let reader: Repository<Customer> = Repository::new(handle.clone());

    writer.save(Customer::new("dave")).unwrap();
    assert_eq!(reader.count().unwrap(), 1);

    // identities are per collection
    let ledger = handle.repository::<LedgerLine>();
    let line = ledger.save(LedgerLine::new("cash", 1_500)).unwrap();
    assert_eq!(line.line_no, 1);
    assert_eq!(LedgerLine::COLLECTION, "ledger");
    assert_eq!(LedgerLine::ID_FIELD, "line_no");
}

#[test]
fn ambiguous_find_collapses_unless_strict() {
    let handle = handle();
    let lines = handle.repository::<LedgerLine>();
    lines
        .save_all([LedgerLine::new("cash", 10), LedgerLine::new("cash", 20)])
        .unwrap();

    assert!(lines.find(Filter::eq("account", "cash")).unwrap().is_none());
    assert_eq!(lines.find_all(Filter::eq("account", "cash")).unwrap().len(), 2);

    let strict = StoreHandle::with_config(
        handle.store().clone(),
        RepositoryConfig::default().with_find_policy(FindPolicy::Strict),
    );
    let err = strict
        .repository::<LedgerLine>()
        .find(|l: &LedgerLine| l.account == "cash")
        .unwrap_err();
    assert!(matches!(err, StoreError::AmbiguousMatch { .. }));
}

#[test]
fn structured_filters_compose() {
    let lines = handle().repository::<LedgerLine>();
    lines
        .save_all([
            LedgerLine::new("cash", 100),
            LedgerLine::new("cash", -40),
            LedgerLine::new("bank", 900),
        ])
        .unwrap();

    let credits = Filter::eq("account", "cash").and(Filter::gt("cents", 0));
    let found = lines.find(credits).unwrap().unwrap();
    assert_eq!(found.cents, 100);

    let not_cash = Filter::eq("account", "cash").negate();
    assert_eq!(lines.find_all(not_cash).unwrap().len(), 1);

    let either = Filter::is_in("cents", [100, 900]);
    assert_eq!(lines.find_all(either).unwrap().len(), 2);
}

#[test]
fn count_matches_get_all() {
    let customers = handle().repository::<Customer>();
    customers
        .save_all((0..5).map(|i| Customer::new(&format!("c{i}"))))
        .unwrap();
    let third = customers.get(3).unwrap().unwrap();
    customers.delete(&third).unwrap();

    assert_eq!(customers.count().unwrap(), customers.get_all().unwrap().len());
    assert_eq!(customers.count().unwrap(), 4);
}

#[test]
fn failed_batch_commits_nothing() {
    let store = InMemoryStore::builder().unique("customers", "email").build();
    let customers = StoreHandle::new(store).repository::<Customer>();
    customers
        .save(Customer::new("erin").with_email("erin@example.com"))
        .unwrap();

    let err = customers
        .save_all([
            Customer::new("frank").with_email("frank@example.com"),
            Customer::new("erin again").with_email("erin@example.com"),
        ])
        .unwrap_err();

    assert!(matches!(err, StoreError::ConstraintViolation { .. }));
    assert!(err.is_commit_failure());
    assert_eq!(customers.count().unwrap(), 1);

    // the identity counter did not advance
    let next = customers.save(Customer::new("gina")).unwrap();
    assert_eq!(next.id, 2);
}

#[test]
fn save_all_rejects_persisted_entities_atomically() {
    let customers = handle().repository::<Customer>();
    let ivan = customers.save(Customer::new("ivan")).unwrap();
    let judy = Customer::new("judy");

    let err = customers.save_all([ivan.clone(), judy.clone()]).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateIdentity { id: 1, .. }));

    assert_eq!(customers.count().unwrap(), 1);
    assert!(!customers.exists(Filter::eq("name", "judy")).unwrap());
    assert_eq!(customers.get(1).unwrap(), Some(ivan));
    assert_eq!(customers.save(judy).unwrap().id, 2);
}

#[test]
fn renamed_identity_is_stamped_under_its_serde_name() {
    let handle = handle();
    let vouchers = handle.repository::<Voucher>();
    let saved = vouchers.save(Voucher::new("SPRING")).unwrap();
    assert_eq!(saved.id, 1);

    let document = handle.store().fetch("vouchers", 1).unwrap().unwrap();
    assert_eq!(document["voucherId"], 1);
    assert_eq!(document["promoCode"], "SPRING");
    assert!(document.get("id").is_none());

    let found = vouchers.find(Filter::eq("voucherId", 1)).unwrap();
    assert_eq!(found, Some(saved));
}

#[test]
fn deleted_entity_cannot_be_saved_back() {
    let customers = handle().repository::<Customer>();
    let saved = customers.save(Customer::new("hal")).unwrap();
    customers.delete(&saved).unwrap();

    let err = customers.save(saved).unwrap_err();
    assert_eq!(err, StoreError::row_missing("customers", 1));
}

#[tokio::test]
async fn async_operations_mirror_sync_ones() {
    let customers = handle().repository::<Customer>();

    let first = customers.save_async(Customer::new("a")).await.unwrap();
    let second = customers.insert_async(Customer::new("b")).await.unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    assert_eq!(customers.count_async().await.unwrap(), 2);
    assert_eq!(
        customers
            .find_async(|c: &Customer| c.name == "a")
            .await
            .unwrap(),
        customers.find(|c: &Customer| c.name == "a").unwrap()
    );

    assert_eq!(customers.delete_async(&first).await.unwrap(), 1);
    assert!(customers.get_async(1).await.unwrap().is_none());
    assert!(!customers
        .exists_async(Filter::eq("name", "a"))
        .await
        .unwrap());
}

#[tokio::test]
async fn concurrent_inserts_get_distinct_identities() {
    let customers = handle().repository::<Customer>();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let repo = customers.clone();
        tasks.push(tokio::spawn(async move {
            repo.save_async(Customer::new(&format!("c{i}"))).await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=16).collect::<Vec<_>>());
}

#[tokio::test]
async fn env_timeout_applies_to_async_calls() {
    let config = RepositoryConfig::default().with_operation_timeout(Duration::from_millis(10));
    let customers =
        StoreHandle::with_config(InMemoryStore::new(), config).repository::<Customer>();
    customers.save(Customer::new("slow")).unwrap();

    let err = customers
        .find_all_async(|_: &Customer| {
            std::thread::sleep(Duration::from_millis(150));
            true
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Timeout { .. }));
}
