//! Parallel step writers against one manual keep positions contiguous.

use std::sync::Arc;

use guideforge::domain::ports::{FixtureImageStorage, ManualCommand, StepCommand, StepRepository};
use guideforge::domain::{
    Error, ErrorCode, ManualDraft, ManualId, ManualService, StepDraft, StepOrderUpdate, UserId,
    Visibility,
};
use guideforge::outbound::memory::InMemoryStore;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use tokio::sync::Barrier;

type MemoryManualService =
    ManualService<InMemoryStore, InMemoryStore, InMemoryStore, FixtureImageStorage>;

const SEEDED: usize = 4;
const CREATORS: i64 = 8;
const REORDERERS: usize = 8;

struct Setup {
    store: Arc<InMemoryStore>,
    service: Arc<MemoryManualService>,
}

#[fixture]
fn setup() -> Setup {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(ManualService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(FixtureImageStorage),
        Arc::new(DefaultClock),
    ));
    Setup { store, service }
}

fn owner() -> UserId {
    UserId::new(1).expect("user id")
}

async fn seeded_manual(service: &MemoryManualService) -> ManualId {
    let draft = ManualDraft {
        title: "Flat-pack wardrobe".to_owned(),
        description: None,
        category: None,
        visibility: Visibility::Private,
    };
    let manual = service
        .create_manual(owner(), draft)
        .await
        .expect("manual should be created");
    for index in 1..=SEEDED {
        service
            .create_step(owner(), manual.id, draft_titled(format!("Seed {index}"), None))
            .await
            .expect("seed step should be appended");
    }
    manual.id
}

fn draft_titled(title: String, order_number: Option<i64>) -> StepDraft {
    StepDraft {
        title,
        content: None,
        order_number,
    }
}

/// Reverse whatever order the manual currently has.
async fn reverse_steps(service: &MemoryManualService, manual_id: ManualId) -> Result<(), Error> {
    let steps = service.list_steps(Some(owner()), manual_id).await?;
    let count = i64::try_from(steps.len()).expect("step count fits i64");
    let updates = steps
        .iter()
        .zip((1..=count).rev())
        .map(|(step, order_number)| StepOrderUpdate {
            id: step.id,
            order_number,
        })
        .collect();
    service.reorder_steps(owner(), manual_id, updates).await?;
    Ok(())
}

/// Losing a race is reported as a conflict; anything else is a bug.
fn tolerate_conflict<T>(result: Result<T, Error>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) if error.code() == ErrorCode::Conflict => None,
        Err(error) => panic!("unexpected failure under contention: {error:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_creates_and_reorders_keep_positions_contiguous(setup: Setup) {
    let Setup { store, service } = setup;
    let manual_id = seeded_manual(&service).await;
    let writers = usize::try_from(CREATORS).expect("creator count") + REORDERERS;
    let barrier = Arc::new(Barrier::new(writers));

    let mut creators = Vec::new();
    for index in 1..=CREATORS {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        creators.push(tokio::spawn(async move {
            barrier.wait().await;
            // Odd writers insert at the front, even ones append.
            let position = (index % 2 == 1).then_some(1);
            let draft = draft_titled(format!("Added {index}"), position);
            tolerate_conflict(service.create_step(owner(), manual_id, draft).await)
        }));
    }

    let mut reorderers = Vec::new();
    for _ in 0..REORDERERS {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        reorderers.push(tokio::spawn(async move {
            barrier.wait().await;
            tolerate_conflict(reverse_steps(&service, manual_id).await)
        }));
    }

    let mut created = 0;
    for handle in creators {
        if handle.await.expect("creator task").is_some() {
            created += 1;
        }
    }
    for handle in reorderers {
        handle.await.expect("reorder task");
    }

    // Stored numbers, not the renumbered view handed to readers.
    let stored = store
        .load_sequence(manual_id)
        .await
        .expect("sequence should load");
    assert_eq!(stored.steps.len(), SEEDED + created);
    let positions: Vec<u32> = stored.steps.iter().map(|step| step.order_number).collect();
    let expected: Vec<u32> =
        (1..=u32::try_from(stored.steps.len()).expect("len fits u32")).collect();
    assert_eq!(positions, expected);
}
