//! Incremental update behaviour: debounced change batches, deletions,
//! scoped re-matching, and the guards that keep a bad edit from wiping
//! previously indexed state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stepscope_core::test_support::MemoryFileProvider;
use stepscope_core::{
    ChangeKind, FileClass, FileEvent, FileProvider, IndexConfig, IndexCoordinator, MatchStatus,
};

const CART_FEATURE: &str = concat!(
    "Feature: Cart\n",
    "  Scenario: Add\n",
    "    Given an empty cart\n",
    "    When I add 3 items\n",
);

const CART_STEPS: &str = concat!(
    "fn register() {\n",
    "    given(\"an empty cart\", handler);\n",
    "    when(\"I add {int} items\", handler);\n",
    "}\n",
);

fn workspace() -> (Arc<MemoryFileProvider>, IndexCoordinator) {
    let provider = Arc::new(MemoryFileProvider::new());
    provider.insert("features/cart.feature", CART_FEATURE);
    provider.insert("src/cart_steps.rs", CART_STEPS);
    let coordinator = IndexCoordinator::new(
        IndexConfig::default(),
        Arc::clone(&provider) as Arc<dyn FileProvider>,
    );
    (provider, coordinator)
}

async fn reindex(coordinator: &IndexCoordinator) {
    coordinator
        .reindex()
        .await
        .unwrap_or_else(|err| panic!("reindex: {err}"));
}

async fn flush(coordinator: &IndexCoordinator) {
    coordinator
        .flush_pending()
        .await
        .unwrap_or_else(|err| panic!("flush: {err}"));
}

fn modified(path: &str, class: FileClass) -> FileEvent {
    FileEvent {
        path: PathBuf::from(path),
        class,
        kind: ChangeKind::Modified,
    }
}

fn removed(path: &str, class: FileClass) -> FileEvent {
    FileEvent {
        path: PathBuf::from(path),
        class,
        kind: ChangeKind::Removed,
    }
}

#[tokio::test]
async fn editing_a_feature_updates_only_its_results() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;

    provider.insert(
        "features/cart.feature",
        concat!(
            "Feature: Cart\n",
            "  Scenario: Add\n",
            "    Given an empty cart\n",
            "    When I add 3 items\n",
            "    Then a brand new step\n",
        ),
    );
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));
    flush(&coordinator).await;

    let undefined = coordinator.undefined_steps();
    assert_eq!(undefined.len(), 1);
    assert_eq!(undefined[0].step.text, "a brand new step");
}

#[tokio::test]
async fn editing_a_definition_rematches_the_whole_workspace() {
    let (provider, coordinator) = workspace();
    provider.insert(
        "features/other.feature",
        concat!(
            "Feature: Other\n",
            "  Scenario: Pay\n",
            "    When I pay\n",
        ),
    );
    reindex(&coordinator).await;
    assert_eq!(coordinator.undefined_steps().len(), 1);

    provider.insert(
        "src/pay_steps.rs",
        "fn register() { when(\"I pay\", handler); }\n",
    );
    coordinator.notify_change(modified("src/pay_steps.rs", FileClass::Definition));
    flush(&coordinator).await;

    assert!(coordinator.undefined_steps().is_empty());
}

#[tokio::test]
async fn a_burst_of_changes_is_applied_as_one_batch() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;
    let receiver = coordinator.subscribe();
    let before = *receiver.borrow();

    provider.insert(
        "features/cart.feature",
        concat!(
            "Feature: Cart\n",
            "  Scenario: Add\n",
            "    Given an empty cart\n",
        ),
    );
    provider.insert(
        "src/cart_steps.rs",
        "fn register() { given(\"an empty cart\", handler); }\n",
    );
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));
    coordinator.notify_change(modified("src/cart_steps.rs", FileClass::Definition));
    flush(&coordinator).await;

    assert_eq!(*receiver.borrow(), before + 1);
    assert_eq!(coordinator.stats().steps, 1);
    assert!(coordinator.undefined_steps().is_empty());
}

#[tokio::test(start_paused = true)]
async fn the_quiet_period_elapses_without_an_explicit_flush() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;
    let mut receiver = coordinator.subscribe();
    receiver.mark_unchanged();

    provider.insert(
        "features/cart.feature",
        concat!(
            "Feature: Cart\n",
            "  Scenario: Add\n",
            "    Given an empty cart\n",
        ),
    );
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));

    // The paused clock advances once the runtime is otherwise idle, so the
    // debounce timer fires without real waiting.
    receiver
        .changed()
        .await
        .unwrap_or_else(|err| panic!("generation channel closed: {err}"));
    assert_eq!(coordinator.stats().steps, 1);
}

#[tokio::test]
async fn a_later_event_for_the_same_path_supersedes_the_earlier_one() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;

    provider.remove(Path::new("features/cart.feature"));
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));
    coordinator.notify_change(removed("features/cart.feature", FileClass::Feature));
    flush(&coordinator).await;

    assert_eq!(coordinator.stats().features, 0);
}

#[tokio::test]
async fn deleting_a_feature_drops_its_steps_and_frees_definitions() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;
    assert!(coordinator.unused_definitions().is_empty());

    provider.remove(Path::new("features/cart.feature"));
    coordinator.notify_change(removed("features/cart.feature", FileClass::Feature));
    flush(&coordinator).await;

    assert_eq!(coordinator.stats().steps, 0);
    assert_eq!(coordinator.unused_definitions().len(), 2);
}

#[tokio::test]
async fn deleting_a_definition_file_undefines_its_steps() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;

    provider.remove(Path::new("src/cart_steps.rs"));
    coordinator.notify_change(removed("src/cart_steps.rs", FileClass::Definition));
    flush(&coordinator).await;

    assert_eq!(coordinator.undefined_steps().len(), 2);
    assert!(coordinator.unused_definitions().is_empty());
}

#[tokio::test]
async fn a_broken_edit_keeps_the_previous_snapshot() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;

    provider.insert("features/cart.feature", "not gherkin at all");
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));
    flush(&coordinator).await;

    let feature = coordinator
        .feature(Path::new("features/cart.feature"))
        .unwrap_or_else(|| panic!("previous snapshot should survive a broken edit"));
    assert_eq!(feature.steps().count(), 2);
    assert!(coordinator.undefined_steps().is_empty());
}

#[tokio::test]
async fn an_oversized_edit_keeps_the_previous_snapshot() {
    let provider = Arc::new(MemoryFileProvider::new());
    provider.insert("features/cart.feature", CART_FEATURE);
    provider.insert("src/cart_steps.rs", CART_STEPS);
    let coordinator = IndexCoordinator::new(
        IndexConfig::default().with_max_file_bytes(4096),
        Arc::clone(&provider) as Arc<dyn FileProvider>,
    );
    reindex(&coordinator).await;

    provider.insert("features/cart.feature", "x".repeat(8192));
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));
    flush(&coordinator).await;

    let feature = coordinator
        .feature(Path::new("features/cart.feature"))
        .unwrap_or_else(|| panic!("previous snapshot should survive an oversized edit"));
    assert_eq!(feature.steps().count(), 2);
}

#[tokio::test]
async fn a_definition_file_that_loses_its_registrations_contributes_nothing() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;

    provider.insert("src/cart_steps.rs", "fn register() {}\n");
    coordinator.notify_change(modified("src/cart_steps.rs", FileClass::Definition));
    flush(&coordinator).await;

    assert!(coordinator.unused_definitions().is_empty());
    assert_eq!(
        coordinator
            .match_results_for(Path::new("features/cart.feature"))
            .iter()
            .filter(|r| r.status() == MatchStatus::Undefined)
            .count(),
        2
    );
}

#[tokio::test]
async fn incremental_updates_converge_with_a_full_rebuild() {
    let (provider, coordinator) = workspace();
    reindex(&coordinator).await;

    let edited_feature = concat!(
        "Feature: Cart\n",
        "  Scenario: Add\n",
        "    Given an empty cart\n",
        "    When I add 5 items\n",
        "    Then the cart has 5 items\n",
    );
    let edited_steps = concat!(
        "fn register() {\n",
        "    given(\"an empty cart\", handler);\n",
        "    when(\"I add {int} items\", handler);\n",
        "    then(\"the cart has {int} items\", handler);\n",
        "}\n",
    );
    provider.insert("features/cart.feature", edited_feature);
    provider.insert("src/cart_steps.rs", edited_steps);
    coordinator.notify_change(modified("features/cart.feature", FileClass::Feature));
    coordinator.notify_change(modified("src/cart_steps.rs", FileClass::Definition));
    flush(&coordinator).await;
    let incremental_stats = coordinator.stats();
    let incremental_results = coordinator.match_results_for(Path::new("features/cart.feature"));

    let fresh = IndexCoordinator::new(
        IndexConfig::default(),
        Arc::clone(&provider) as Arc<dyn FileProvider>,
    );
    reindex(&fresh).await;

    assert_eq!(fresh.stats(), incremental_stats);
    assert_eq!(
        fresh.match_results_for(Path::new("features/cart.feature")),
        incremental_results
    );
}
