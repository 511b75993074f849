//! Tests for the manual authoring service.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    ImageCommand, ImageStorageError, ManualCommand, ManualQuery, MockImageRepository,
    MockImageStorage, MockManualRepository, MockStepRepository, StepCommand, StepSet,
};
use crate::domain::{
    ErrorCode, ImageId, ImageUpload, ManualChanges, ManualDraft, OrderChange, Relation,
    StepChanges, StepDraft, StepOrderUpdate, Visibility,
};

struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        now()
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("timestamp")
}

fn owner() -> UserId {
    UserId::new(1).expect("id")
}

fn stranger() -> UserId {
    UserId::new(2).expect("id")
}

fn manual_id() -> ManualId {
    ManualId::new(10).expect("id")
}

fn step_id(raw: i64) -> StepId {
    StepId::new(raw).expect("id")
}

fn manual(visibility: Visibility) -> Manual {
    Manual {
        id: manual_id(),
        owner_id: owner(),
        title: "Onboarding Guide".to_owned(),
        description: None,
        category: None,
        visibility,
        created_at: now(),
        updated_at: now(),
        steps: Relation::NotLoaded,
    }
}

fn step(id: i64, order_number: u32) -> Step {
    Step {
        id: step_id(id),
        manual_id: manual_id(),
        order_number,
        title: format!("Step {id}"),
        content: None,
        created_at: now(),
        updated_at: now(),
        images: Relation::NotLoaded,
    }
}

fn image(id: i64, step: i64) -> Image {
    Image {
        id: ImageId::new(id).expect("id"),
        step_id: step_id(step),
        file_path: format!("steps/{step}/{id}.png"),
        file_name: format!("{id}.png"),
        file_size: 2048,
        mime_type: "image/png".to_owned(),
        created_at: now(),
    }
}

fn three_steps(revision: u64) -> StepSet {
    StepSet {
        revision,
        steps: vec![step(101, 1), step(102, 2), step(103, 3)],
    }
}

struct Mocks {
    manuals: MockManualRepository,
    steps: MockStepRepository,
    images: MockImageRepository,
    storage: MockImageStorage,
}

type Service =
    ManualService<MockManualRepository, MockStepRepository, MockImageRepository, MockImageStorage>;

impl Mocks {
    fn owning(mut self, visibility: Visibility) -> Self {
        self.manuals
            .expect_find_by_id()
            .returning(move |_| Ok(Some(manual(visibility))));
        self
    }

    fn without_images(mut self) -> Self {
        self.images
            .expect_list_for_steps()
            .returning(|_| Ok(Vec::new()));
        self
    }

    fn build(self) -> Service {
        ManualService::new(
            Arc::new(self.manuals),
            Arc::new(self.steps),
            Arc::new(self.images),
            Arc::new(self.storage),
            Arc::new(FixtureClock),
        )
    }
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        manuals: MockManualRepository::new(),
        steps: MockStepRepository::new(),
        images: MockImageRepository::new(),
        storage: MockImageStorage::new(),
    }
}

#[rstest]
#[tokio::test]
async fn create_manual_trims_fields_and_starts_empty(mut mocks: Mocks) {
    mocks
        .manuals
        .expect_create()
        .withf(|record| {
            record.title == "Onboarding Guide"
                && record.category.is_none()
                && record.owner_id == owner()
                && record.created_at == now()
        })
        .times(1)
        .return_once(|_| Ok(manual(Visibility::Private)));
    let draft = ManualDraft {
        title: "  Onboarding Guide ".to_owned(),
        category: Some("  ".to_owned()),
        ..ManualDraft::default()
    };

    let created = mocks
        .build()
        .create_manual(owner(), draft)
        .await
        .expect("created");
    assert_eq!(created.steps, Relation::Loaded(Vec::new()));
}

#[rstest]
#[tokio::test]
async fn invalid_manual_is_rejected_before_storage(mocks: Mocks) {
    let err = mocks
        .build()
        .create_manual(owner(), ManualDraft::default())
        .await
        .expect_err("blank title");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(
        err.field_errors()
            .is_some_and(|errors| errors.contains_key("title"))
    );
}

#[rstest]
#[tokio::test]
async fn strangers_cannot_update_manuals(mocks: Mocks) {
    let changes = ManualChanges {
        title: Some("Hijacked".to_owned()),
        ..ManualChanges::default()
    };
    let err = mocks
        .owning(Visibility::Public)
        .build()
        .update_manual(stranger(), manual_id(), changes)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn missing_manual_is_not_found(mut mocks: Mocks) {
    mocks.manuals.expect_find_by_id().returning(|_| Ok(None));
    let err = mocks
        .build()
        .get_manual(None, manual_id())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(None)]
#[case(Some(2))]
#[tokio::test]
async fn private_manuals_are_hidden_from_non_owners(mocks: Mocks, #[case] viewer: Option<i64>) {
    let viewer = viewer.map(|raw| UserId::new(raw).expect("id"));
    let err = mocks
        .owning(Visibility::Private)
        .build()
        .get_manual(viewer, manual_id())
        .await
        .expect_err("private");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn get_manual_expands_steps_and_images(mut mocks: Mocks) {
    mocks.steps.expect_load_sequence().return_once(|_| {
        Ok(StepSet {
            revision: 1,
            steps: vec![step(102, 2), step(101, 1)],
        })
    });
    mocks
        .images
        .expect_list_for_steps()
        .return_once(|_| Ok(vec![image(1, 102), image(2, 102)]));

    let loaded = mocks
        .owning(Visibility::Public)
        .build()
        .get_manual(None, manual_id())
        .await
        .expect("public manual");
    let steps = loaded.steps.into_loaded().expect("steps loaded");
    let ids: Vec<i64> = steps.iter().map(|s| s.id.get()).collect();
    assert_eq!(ids, vec![101, 102]);
    assert_eq!(steps[0].images, Relation::Loaded(Vec::new()));
    assert_eq!(steps[1].images.loaded().map(<[Image]>::len), Some(2));
}

#[rstest]
#[tokio::test]
async fn create_step_appends_without_shifts(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(5)));
    mocks
        .steps
        .expect_insert_step()
        .withf(|revision, record, shifts| {
            *revision == 5 && record.order_number == 4 && shifts.is_empty()
        })
        .times(1)
        .return_once(|_, _, _| Ok(step(104, 4)));

    let created = mocks
        .owning(Visibility::Private)
        .build()
        .create_step(owner(), manual_id(), StepDraft {
            title: "Pack up".to_owned(),
            content: None,
            order_number: Some(0),
        })
        .await
        .expect("created");
    assert_eq!(created.order_number, 4);
    assert!(created.images.is_loaded());
}

#[rstest]
#[tokio::test]
async fn create_step_at_front_shifts_everything(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(1)));
    mocks
        .steps
        .expect_insert_step()
        .withf(|_, record, shifts| {
            record.order_number == 1
                && shifts
                    == [
                        OrderChange { id: step_id(101), from: 1, to: 2 },
                        OrderChange { id: step_id(102), from: 2, to: 3 },
                        OrderChange { id: step_id(103), from: 3, to: 4 },
                    ]
        })
        .times(1)
        .return_once(|_, _, _| Ok(step(104, 1)));

    mocks
        .owning(Visibility::Private)
        .build()
        .create_step(owner(), manual_id(), StepDraft {
            title: "Unbox".to_owned(),
            content: None,
            order_number: Some(1),
        })
        .await
        .expect("created");
}

#[rstest]
#[tokio::test]
async fn create_step_beyond_end_is_out_of_range(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(1)));
    mocks.steps.expect_insert_step().times(0);

    let err = mocks
        .owning(Visibility::Private)
        .build()
        .create_step(owner(), manual_id(), StepDraft {
            title: "Late".to_owned(),
            content: None,
            order_number: Some(9),
        })
        .await
        .expect_err("out of range");
    assert_eq!(err.code(), ErrorCode::OutOfRange);
}

#[rstest]
#[tokio::test]
async fn stale_revisions_are_retried(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .times(2)
        .returning(|_| Ok(three_steps(7)));
    let mut calls = 0;
    mocks
        .steps
        .expect_insert_step()
        .times(2)
        .returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Err(StepRepositoryError::revision_mismatch(7_u64, 8_u64))
            } else {
                Ok(step(104, 4))
            }
        });

    let created = mocks
        .owning(Visibility::Private)
        .build()
        .create_step(owner(), manual_id(), StepDraft {
            title: "Retry".to_owned(),
            ..StepDraft::default()
        })
        .await
        .expect("second attempt commits");
    assert_eq!(created.id, step_id(104));
}

#[rstest]
#[tokio::test]
async fn persistent_staleness_becomes_conflict(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .times(3)
        .returning(|_| Ok(three_steps(7)));
    mocks
        .steps
        .expect_delete_step()
        .times(3)
        .returning(|_, _, _, _| Err(StepRepositoryError::revision_mismatch(7_u64, 9_u64)));
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(102, 2))));
    mocks.storage.expect_remove().times(0);

    let err = mocks
        .owning(Visibility::Private)
        .build()
        .delete_step(owner(), step_id(102))
        .await
        .expect_err("conflict");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.details().and_then(|details| details.get("attempts")),
        Some(&serde_json::json!(MAX_ATTEMPTS))
    );
}

#[rstest]
#[tokio::test]
async fn delete_step_closes_gap_and_removes_files(mut mocks: Mocks) {
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(101, 1))));
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(2)));
    mocks
        .steps
        .expect_delete_step()
        .withf(|_, revision, id, shifts| {
            *revision == 2 && *id == step_id(101) && shifts.len() == 2
        })
        .return_once(|_, _, _, _| Ok(vec![image(1, 101)]));
    mocks
        .storage
        .expect_remove()
        .withf(|path| path == "steps/101/1.png")
        .times(1)
        .return_once(|_| Ok(()));

    mocks
        .owning(Visibility::Private)
        .build()
        .delete_step(owner(), step_id(101))
        .await
        .expect("deleted");
}

#[rstest]
#[tokio::test]
async fn update_step_rejects_bad_position_before_touching_content(mut mocks: Mocks) {
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(101, 1))));
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(1)));
    mocks.steps.expect_apply_order().times(0);
    mocks.steps.expect_update_step().times(0);

    let err = mocks
        .owning(Visibility::Private)
        .build()
        .update_step(owner(), step_id(101), StepChanges {
            title: Some("Renamed".to_owned()),
            content: None,
            order_number: Some(4),
        })
        .await
        .expect_err("out of range");
    assert_eq!(err.code(), ErrorCode::OutOfRange);
}

#[rstest]
#[tokio::test]
async fn update_step_moves_and_rewrites_in_one_write(mut mocks: Mocks) {
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(101, 1))));
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(4)));
    mocks.steps.expect_apply_order().times(0);
    mocks
        .steps
        .expect_update_step()
        .withf(|manual, revision, step, shifts| {
            *manual == manual_id()
                && *revision == 4
                && step.title == "Renamed"
                && step.order_number == 3
                && step.content.is_none()
                && step.updated_at == now()
                && shifts.len() == 3
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(()));

    let updated = mocks
        .owning(Visibility::Private)
        .without_images()
        .build()
        .update_step(owner(), step_id(101), StepChanges {
            title: Some(" Renamed ".to_owned()),
            content: Some(String::new()),
            order_number: Some(3),
        })
        .await
        .expect("updated");
    assert_eq!(updated.order_number, 3);
    assert_eq!(updated.updated_at, now());
}

#[rstest]
#[tokio::test]
async fn failed_step_update_commits_no_separate_move(mut mocks: Mocks) {
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(101, 1))));
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(4)));
    mocks.steps.expect_apply_order().times(0);
    mocks
        .steps
        .expect_update_step()
        .times(1)
        .return_once(|_, _, _, _| Err(StepRepositoryError::connection("connection reset")));

    let err = mocks
        .owning(Visibility::Private)
        .build()
        .update_step(owner(), step_id(101), StepChanges {
            title: Some("Renamed".to_owned()),
            content: None,
            order_number: Some(2),
        })
        .await
        .expect_err("write failed");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn stale_step_update_reloads_and_retries(mut mocks: Mocks) {
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(101, 1))));
    let mut revisions = [4_u64, 5].into_iter();
    mocks
        .steps
        .expect_load_sequence()
        .times(2)
        .returning(move |_| Ok(three_steps(revisions.next().unwrap_or(5))));
    let mut outcomes = [
        Err(StepRepositoryError::revision_mismatch(4_u64, 5_u64)),
        Ok(()),
    ]
    .into_iter();
    mocks
        .steps
        .expect_update_step()
        .times(2)
        .returning(move |_, _, _, _| outcomes.next().unwrap_or(Ok(())));

    let updated = mocks
        .owning(Visibility::Private)
        .without_images()
        .build()
        .update_step(owner(), step_id(101), StepChanges {
            title: Some("Renamed".to_owned()),
            content: None,
            order_number: None,
        })
        .await
        .expect("updated after retry");
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.order_number, 1);
}

#[rstest]
#[tokio::test]
async fn bulk_reorder_rejects_duplicates_without_writing(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(1)));
    mocks.steps.expect_apply_order().times(0);
    let updates = [(101, 1), (102, 2), (103, 2)]
        .into_iter()
        .map(|(id, order_number)| StepOrderUpdate {
            id: step_id(id),
            order_number,
        })
        .collect();

    let err = mocks
        .owning(Visibility::Private)
        .build()
        .reorder_steps(owner(), manual_id(), updates)
        .await
        .expect_err("not a permutation");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn bulk_reorder_returns_new_sequence(mut mocks: Mocks) {
    mocks
        .steps
        .expect_load_sequence()
        .return_once(|_| Ok(three_steps(1)));
    mocks
        .steps
        .expect_apply_order()
        .times(1)
        .return_once(|_, _, _| Ok(()));
    let updates = [(101, 3), (102, 1), (103, 2)]
        .into_iter()
        .map(|(id, order_number)| StepOrderUpdate {
            id: step_id(id),
            order_number,
        })
        .collect();

    let steps = mocks
        .owning(Visibility::Private)
        .without_images()
        .build()
        .reorder_steps(owner(), manual_id(), updates)
        .await
        .expect("reordered");
    let ids: Vec<i64> = steps.iter().map(|s| s.id.get()).collect();
    assert_eq!(ids, vec![102, 103, 101]);
}

#[rstest]
#[tokio::test]
async fn delete_manual_cleans_up_every_file(mut mocks: Mocks) {
    mocks.manuals.expect_delete_cascade().return_once(|_| {
        Ok(vec![image(1, 101), image(2, 102), image(3, 103)])
    });
    let mut removed = 0;
    mocks.storage.expect_remove().times(3).returning(move |_| {
        removed += 1;
        if removed == 2 {
            Err(ImageStorageError::io("disk busy"))
        } else {
            Ok(())
        }
    });

    mocks
        .owning(Visibility::Private)
        .build()
        .delete_manual(owner(), manual_id())
        .await
        .expect("file clean-up failures do not fail the delete");
}

#[rstest]
#[tokio::test]
async fn attach_image_validates_upload(mocks: Mocks) {
    let upload = ImageUpload {
        file_path: "steps/101/a.pdf".to_owned(),
        file_name: "a.pdf".to_owned(),
        file_size: 10,
        mime_type: "application/pdf".to_owned(),
    };
    let err = mocks
        .build()
        .attach_image(owner(), step_id(101), upload)
        .await
        .expect_err("invalid mime");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn delete_image_requires_ownership(mut mocks: Mocks) {
    mocks
        .images
        .expect_find_by_id()
        .return_once(|_| Ok(Some(image(5, 101))));
    mocks.steps.expect_find_step().return_once(|_| Ok(Some(step(101, 1))));
    mocks.images.expect_delete().times(0);

    let err = mocks
        .owning(Visibility::Public)
        .build()
        .delete_image(stranger(), ImageId::new(5).expect("id"))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(StepRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(StepRepositoryError::query("deadlock"), ErrorCode::InternalError)]
#[case(StepRepositoryError::not_found("manual 10 not found"), ErrorCode::NotFound)]
#[tokio::test]
async fn step_repository_failures_map_to_codes(
    mut mocks: Mocks,
    #[case] failure: StepRepositoryError,
    #[case] expected: ErrorCode,
) {
    mocks
        .steps
        .expect_load_sequence()
        .return_once(move |_| Err(failure));
    let err = mocks
        .owning(Visibility::Public)
        .build()
        .list_steps(None, manual_id())
        .await
        .expect_err("failure");
    assert_eq!(err.code(), expected);
}
