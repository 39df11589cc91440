mod support;

use prodflow::chain::{TaskUpdate, UpdateOutcome};
use prodflow::entities::project::ProjectStatus;
use prodflow::notify::TopicKind;
use prodflow::ProductionError;
use support::{assert_chain_invariants, permission_holders, setup, RecordingPublisher};

#[tokio::test]
async fn test_tasks_created_out_of_order_are_chained_by_rank() {
    let fx = setup().await;
    let file = fx.file("frame.step").await;

    let second = fx.task(file.id, 2).await;
    let first = fx.task(file.id, 1).await;
    let third = fx.task(file.id, 3).await;

    let chain = fx.chain(file.id).await;
    let order: Vec<i32> = chain.iter().map(|task| task.id).collect();
    assert_eq!(order, vec![first.id, second.id, third.id]);
    assert_eq!(permission_holders(&chain), vec![first.id]);
    assert_chain_invariants(&chain);
}

#[tokio::test]
async fn test_first_task_of_a_file_gets_permission() {
    let fx = setup().await;
    let file = fx.file("plate.dxf").await;
    assert!(file.new);

    let task = fx.task(file.id, 2).await;

    assert!(task.permission);
    assert_eq!(task.previous_task_id, None);
    assert_eq!(task.next_task_id, None);
    // Picking a file up for production marks it seen
    assert!(!fx.service.get_file(file.id).await.unwrap().new);
}

#[tokio::test]
async fn test_earlier_department_resets_existing_progress() {
    let fx = setup().await;
    let file = fx.file("bracket.stp").await;
    let cutting = fx.task(file.id, 2).await;
    fx.task(file.id, 3).await;
    fx.service
        .update_task(fx.employee, cutting.id, TaskUpdate::start())
        .await
        .unwrap();

    let design = fx.task(file.id, 1).await;

    let chain = fx.chain(file.id).await;
    assert_eq!(chain[0].id, design.id);
    assert_eq!(permission_holders(&chain), vec![design.id]);
    for task in &chain[1..] {
        assert!(!task.permission && !task.start && !task.paused && !task.end);
    }
    assert_chain_invariants(&chain);
}

#[tokio::test]
async fn test_duplicate_department_is_rejected() {
    let fx = setup().await;
    let file = fx.file("shaft.igs").await;
    fx.task(file.id, 1).await;

    let err = fx
        .service
        .create_task(fx.admin, fx.new_task(file.id, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, ProductionError::DuplicateTask { file_id, .. } if file_id == file.id));
    assert_eq!(fx.chain(file.id).await.len(), 1);
}

#[tokio::test]
async fn test_only_admins_create_and_delete_tasks() {
    let fx = setup().await;
    let file = fx.file("cover.pdf").await;

    let err = fx
        .service
        .create_task(fx.employee, fx.new_task(file.id, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, ProductionError::Forbidden(_)));

    let task = fx.task(file.id, 1).await;
    let err = fx.service.delete_task(fx.employee, task.id).await.unwrap_err();
    assert!(matches!(err, ProductionError::Forbidden(_)));
}

#[tokio::test]
async fn test_unknown_file_is_not_found() {
    let fx = setup().await;
    let err = fx
        .service
        .create_task(fx.admin, fx.new_task(999, 1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_finishing_a_task_moves_permission_and_progress() {
    let fx = setup().await;
    let file = fx.file("housing.step").await;
    let first = fx.task(file.id, 1).await;
    let second = fx.task(file.id, 2).await;
    fx.task(file.id, 3).await;

    let outcome = fx
        .service
        .update_task(fx.employee, first.id, TaskUpdate::finish())
        .await
        .unwrap();

    assert!(matches!(outcome, UpdateOutcome::Applied(ref task) if task.end));
    let chain = fx.chain(file.id).await;
    assert_eq!(permission_holders(&chain), vec![second.id]);
    assert_chain_invariants(&chain);

    let project = fx.project().await;
    assert_eq!(project.progress, 33);
    assert_eq!(project.status, ProjectStatus::Started);
}

#[tokio::test]
async fn test_update_without_permission_is_refused_without_changes() {
    let fx = setup().await;
    let file = fx.file("lid.dxf").await;
    fx.task(file.id, 1).await;
    let second = fx.task(file.id, 2).await;
    let before = fx.chain(file.id).await;
    fx.publisher.take();

    let outcome = fx
        .service
        .update_task(fx.employee, second.id, TaskUpdate::finish())
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::PermissionDenied { task_id: second.id });
    assert_eq!(fx.chain(file.id).await, before);
    assert!(fx.publisher.take().is_empty());
}

#[tokio::test]
async fn test_deleting_head_promotes_next_task() {
    let fx = setup().await;
    let file = fx.file("gear.stl").await;
    let first = fx.task(file.id, 1).await;
    let second = fx.task(file.id, 2).await;

    fx.service.delete_task(fx.admin, first.id).await.unwrap();

    let chain = fx.chain(file.id).await;
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].id, second.id);
    assert!(chain[0].permission);
    assert_chain_invariants(&chain);
}

#[tokio::test]
async fn test_deleting_middle_task_after_finished_one_unblocks_next() {
    let fx = setup().await;
    let file = fx.file("base.step").await;
    let first = fx.task(file.id, 1).await;
    let second = fx.task(file.id, 2).await;
    let third = fx.task(file.id, 3).await;
    fx.service
        .update_task(fx.admin, first.id, TaskUpdate::finish())
        .await
        .unwrap();

    fx.service.delete_task(fx.admin, second.id).await.unwrap();

    let chain = fx.chain(file.id).await;
    let order: Vec<i32> = chain.iter().map(|task| task.id).collect();
    assert_eq!(order, vec![first.id, third.id]);
    assert_eq!(permission_holders(&chain), vec![third.id]);
    assert_chain_invariants(&chain);
    assert_eq!(fx.project().await.progress, 50);
}

#[tokio::test]
async fn test_deleting_tail_clears_link() {
    let fx = setup().await;
    let file = fx.file("pin.pdf").await;
    let first = fx.task(file.id, 1).await;
    let last = fx.task(file.id, 3).await;

    fx.service.delete_task(fx.admin, last.id).await.unwrap();

    let chain = fx.chain(file.id).await;
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].id, first.id);
    assert_eq!(chain[0].next_task_id, None);
}

#[tokio::test]
async fn test_chains_of_different_files_are_independent() {
    let fx = setup().await;
    let a = fx.file("a.pdf").await;
    let b = fx.file("b.pdf").await;
    let a1 = fx.task(a.id, 1).await;
    fx.task(a.id, 2).await;
    let b2 = fx.task(b.id, 2).await;

    fx.service
        .update_task(fx.admin, a1.id, TaskUpdate::finish())
        .await
        .unwrap();

    let chain_b = fx.chain(b.id).await;
    assert_eq!(permission_holders(&chain_b), vec![b2.id]);
    assert_chain_invariants(&fx.chain(a.id).await);
}

#[tokio::test]
async fn test_concurrent_updates_keep_a_single_holder() {
    let fx = setup().await;
    let file = fx.file("tube.step").await;
    let first = fx.task(file.id, 1).await;
    fx.task(file.id, 2).await;
    fx.task(file.id, 3).await;

    let (a, b) = tokio::join!(
        fx.service.update_task(fx.admin, first.id, TaskUpdate::finish()),
        fx.service.update_task(fx.employee, first.id, TaskUpdate::start()),
    );
    a.unwrap();
    b.unwrap();

    let chain = fx.chain(file.id).await;
    assert_eq!(permission_holders(&chain).len(), 1);
    assert_chain_invariants(&chain);
}

#[tokio::test]
async fn test_chain_changes_refresh_boards() {
    let fx = setup().await;
    let file = fx.file("panel.dxf").await;
    let task = fx.task(file.id, 2).await;
    fx.publisher.take();

    fx.service
        .update_task(fx.employee, task.id, TaskUpdate::start())
        .await
        .unwrap();

    let events = fx.publisher.take();
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::TaskProjectBoard),
        vec![fx.admin.user_id]
    );
    let mut everyone = vec![fx.admin.user_id, fx.employee.user_id, fx.outsider.user_id];
    everyone.sort();
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::TaskDepartmentBoard),
        everyone
    );

    let (_, event) = events
        .iter()
        .find(|(topic, _)| topic.kind == TopicKind::TaskProjectBoard)
        .unwrap();
    assert_eq!(event.relay, "task_modify_project");
    assert_eq!(event.message["type"], "task");
    assert_eq!(event.message["file"]["id"], file.id);
    assert_eq!(event.message["tasks"][0]["start"], true);
}
