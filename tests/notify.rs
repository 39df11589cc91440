mod support;

use std::sync::Arc;

use prodflow::entities::user::Role;
use prodflow::notify::{Hub, TopicKind, UnreadCount};
use prodflow::repositories::UserRepository;
use prodflow::storage::{LocalStorage, UploadPaths};
use prodflow::{Actor, ProductionError, ProductionService};
use support::{new_project, new_user, setup, RecordingPublisher};

#[tokio::test]
async fn test_task_appeared_reaches_admins_and_department() {
    let fx = setup().await;
    let file = fx.file("frame.step").await;
    fx.publisher.take();

    fx.task(file.id, 2).await;

    let events = fx.publisher.take();
    let mut expected = vec![fx.admin.user_id, fx.employee.user_id];
    expected.sort();
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::TaskNotifications),
        expected
    );

    let (_, event) = events
        .iter()
        .find(|(topic, _)| topic.kind == TopicKind::TaskNotifications)
        .unwrap();
    assert_eq!(event.relay, "task_noti");
    assert_eq!(
        event.message["notification"]["content"],
        "New Task (frame.step) appeared in Cutting"
    );
    assert_eq!(event.message["task"]["file_id"], file.id);
}

#[tokio::test]
async fn test_task_notifications_are_persisted_per_recipient() {
    let fx = setup().await;
    let file = fx.file("frame.step").await;
    fx.task(file.id, 2).await;

    let mine = fx.service.unread_task_notifications(fx.employee).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].user_id, fx.employee.user_id);
    assert_eq!(mine[0].file_id, file.id);
    assert!(!mine[0].read);

    assert!(fx
        .service
        .unread_task_notifications(fx.outsider)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unread_counts_and_mark_read() {
    let fx = setup().await;
    let file = fx.file("frame.step").await;
    fx.task(file.id, 1).await;
    fx.task(file.id, 2).await;

    // Admins hear about both tasks and the fixture project
    assert_eq!(
        fx.service.unread_count(fx.admin).await.unwrap(),
        UnreadCount { task: 2, project: 1 }
    );
    assert_eq!(
        fx.service.unread_count(fx.employee).await.unwrap(),
        UnreadCount { task: 1, project: 0 }
    );

    let notification = fx.service.unread_task_notifications(fx.employee).await.unwrap()[0].clone();
    let read = fx
        .service
        .mark_task_notification_read(fx.employee, notification.id)
        .await
        .unwrap();
    assert!(read.read);
    assert_eq!(fx.service.unread_count(fx.employee).await.unwrap().task, 0);
}

#[tokio::test]
async fn test_only_owner_or_admin_marks_notifications_read() {
    let fx = setup().await;
    let file = fx.file("frame.step").await;
    fx.task(file.id, 2).await;
    let notification = fx.service.unread_task_notifications(fx.employee).await.unwrap()[0].clone();

    let err = fx
        .service
        .mark_task_notification_read(fx.outsider, notification.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ProductionError::Forbidden(_)));

    fx.service
        .mark_task_notification_read(fx.admin, notification.id)
        .await
        .unwrap();

    let err = fx
        .service
        .mark_project_notification_read(fx.admin, 4242)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_project_creation_notifies_admins_only() {
    let fx = setup().await;
    let client_id = fx.project.client_id;

    fx.service
        .create_project(fx.admin, new_project(fx.admin.user_id, client_id, "P-002"))
        .await
        .unwrap();

    let events = fx.publisher.take();
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::ProjectNotifications),
        vec![fx.admin.user_id]
    );
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::ProjectBoardData),
        vec![fx.admin.user_id]
    );

    let unread = fx.service.unread_project_notifications(fx.admin).await.unwrap();
    assert_eq!(unread[0].content, "Project (P-002) has been added");
    assert!(fx
        .service
        .unread_project_notifications(fx.employee)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_comment_events_go_to_both_boards() {
    let fx = setup().await;
    let file = fx.file("frame.step").await;
    fx.publisher.take();

    let comment = fx
        .service
        .add_comment(fx.employee, file.id, "Edge radius missing")
        .await
        .unwrap();

    let events = fx.publisher.take();
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::TaskProjectBoard),
        vec![fx.admin.user_id]
    );
    assert_eq!(
        RecordingPublisher::recipients(&events, TopicKind::TaskDepartmentBoard).len(),
        3
    );
    let (_, event) = &events[0];
    assert_eq!(event.message["type"], "comment_add");
    assert_eq!(event.message["comment"]["id"], comment.id);
}

#[tokio::test]
async fn test_service_publishes_through_hub_after_commit() {
    let storage = Arc::new(LocalStorage::in_memory().await.unwrap());
    let admin = UserRepository::create(&storage.conn, new_user("boss", Role::Admin, vec![]))
        .await
        .unwrap();
    let client = prodflow::repositories::ProjectRepository::create_client(&storage.conn, "Acme", "a@acme.test", "x")
        .await
        .unwrap();
    let media = tempfile::tempdir().unwrap();
    let hub = Arc::new(Hub::new(8));
    let service = ProductionService::new(storage, UploadPaths::new(media.path()), hub.clone());

    let mut subscription = hub.subscribe(TopicKind::ProjectNotifications.for_user(admin.id));
    let actor = Actor::from(&admin);
    let project = service
        .create_project(actor, new_project(admin.id, client.id, "P-100"))
        .await
        .unwrap();

    let event = subscription.recv().await.unwrap();
    assert_eq!(event.relay, "project_notification");
    assert_eq!(event.message["project"]["id"], project.id);
    assert_eq!(
        event.to_frame(),
        serde_json::json!({ "message": event.message }).to_string()
    );
}
