//! End-to-end exercises of the lock protocol through the public API.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use fencelock::DistributedMutex;
use fencelock::InMemoryLeaseStore;
use fencelock::LeaseStore;
use fencelock::MutexFactory;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contending_tasks_never_overlap_in_the_critical_section() {
    let store = InMemoryLeaseStore::new();
    let factory = Arc::new(MutexFactory::new(store, Duration::from_secs(10)).unwrap());
    let in_section = Arc::new(AtomicBool::new(false));
    let completed = Arc::new(AtomicU32::new(0));

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let factory = factory.clone();
        let in_section = in_section.clone();
        let completed = completed.clone();

        tasks.push(tokio::spawn(async move {
            let mut mutex = factory.create("shared-resource").unwrap();
            let ran = mutex
                .synchronized(Duration::from_secs(5), || async {
                    assert!(
                        !in_section.swap(true, Ordering::SeqCst),
                        "two holders inside the critical section"
                    );
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_section.store(false, Ordering::SeqCst);
                    completed.fetch_add(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            assert!(ran.is_some(), "acquisition timed out under light contention");
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(completed.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn lock_state_is_observable_from_outside() {
    let store = InMemoryLeaseStore::new();
    let mut mutex = DistributedMutex::new(store.clone(), "observable", Duration::from_secs(10)).unwrap();

    assert!(!store.exists(mutex.key()).await.unwrap());

    assert!(mutex.acquire(Duration::ZERO).await.unwrap());
    assert!(store.exists(mutex.key()).await.unwrap());

    mutex.release().await.unwrap();
    assert!(!store.exists(mutex.key()).await.unwrap());
}

#[tokio::test]
async fn independent_names_do_not_interfere() {
    let store = InMemoryLeaseStore::new();
    let factory = MutexFactory::with_default_ttl(store);

    let mut jobs = factory.create("nightly-jobs").unwrap();
    let mut billing = factory.create("billing-run").unwrap();

    assert!(jobs.acquire(Duration::ZERO).await.unwrap());
    assert!(billing.acquire(Duration::ZERO).await.unwrap());

    jobs.release().await.unwrap();
    billing.release().await.unwrap();
}

#[tokio::test]
async fn mutex_works_through_a_trait_object_store() {
    let concrete = InMemoryLeaseStore::new();
    let store: Arc<dyn LeaseStore> = concrete.clone();

    let mut mutex = DistributedMutex::new(store, "dyn-store", Duration::from_secs(10)).unwrap();
    assert!(mutex.acquire(Duration::ZERO).await.unwrap());
    assert!(concrete.exists(mutex.key()).await.unwrap());
    mutex.release().await.unwrap();
}
