#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use prodflow::entities::project::{InvoiceStatus, Priority, ProjectStatus};
use prodflow::entities::user::Role;
use prodflow::entities::{department, file_production, project, task};
use prodflow::notify::{Event, Publisher, Topic, TopicKind};
use prodflow::production::NewTask;
use prodflow::repositories::project::NewProject;
use prodflow::repositories::user::NewUser;
use prodflow::repositories::{DepartmentRepository, ProjectRepository, UserRepository};
use prodflow::storage::{LocalStorage, UploadPaths};
use prodflow::{Actor, ProductionService};

/// Publisher that keeps everything it is handed.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(Topic, Event)>>,
}

impl Publisher for RecordingPublisher {
    fn publish(&self, topic: &Topic, event: Event) {
        self.events.lock().unwrap().push((*topic, event));
    }
}

impl RecordingPublisher {
    /// Drain what was published so far.
    pub fn take(&self) -> Vec<(Topic, Event)> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    /// Users that received something on a kind of topic, sorted.
    pub fn recipients(events: &[(Topic, Event)], kind: TopicKind) -> Vec<i32> {
        let mut users: Vec<i32> = events
            .iter()
            .filter(|(topic, _)| topic.kind == kind)
            .map(|(topic, _)| topic.user_id)
            .collect();
        users.sort();
        users
    }
}

pub struct Fixture {
    pub service: ProductionService,
    pub publisher: Arc<RecordingPublisher>,
    pub admin: Actor,
    /// Employee of the second-ranked department.
    pub employee: Actor,
    /// Employee of the third-ranked department.
    pub outsider: Actor,
    /// Ranked 1, 2 and 3.
    pub departments: Vec<department::Model>,
    pub project: project::Model,
    pub media: TempDir,
}

pub async fn setup() -> Fixture {
    let storage = Arc::new(LocalStorage::in_memory().await.unwrap());
    let conn = &storage.conn;

    let mut departments = Vec::new();
    for (name, order) in [("Design", 1), ("Cutting", 2), ("Welding", 3)] {
        departments.push(DepartmentRepository::create(conn, name, order).await.unwrap());
    }

    let admin = UserRepository::create(conn, new_user("boss", Role::Admin, vec![]))
        .await
        .unwrap();
    let employee = UserRepository::create(conn, new_user("cutter", Role::Employee, vec![departments[1].id]))
        .await
        .unwrap();
    let outsider = UserRepository::create(conn, new_user("welder", Role::Employee, vec![departments[2].id]))
        .await
        .unwrap();
    let client = ProjectRepository::create_client(conn, "Acme", "orders@acme.test", "1 Main St")
        .await
        .unwrap();

    let media = tempfile::tempdir().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let service = ProductionService::new(storage.clone(), UploadPaths::new(media.path()), publisher.clone());

    let admin = Actor::from(&admin);
    let project = service
        .create_project(admin, new_project(admin.user_id, client.id, "P-001"))
        .await
        .unwrap();
    publisher.take();

    Fixture {
        service,
        publisher,
        admin,
        employee: Actor::from(&employee),
        outsider: Actor::from(&outsider),
        departments,
        project,
        media,
    }
}

pub fn new_user(username: &str, role: Role, departments: Vec<i32>) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@prodflow.test", username),
        role,
        first_name: username.to_string(),
        last_name: "Test".to_string(),
        departments,
    }
}

pub fn new_project(manager_id: i32, client_id: i32, number: &str) -> NewProject {
    NewProject {
        manager_id,
        client_id,
        name: format!("Project {}", number),
        number: number.to_string(),
        order_number: format!("ORD-{}", number),
        start: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        deadline: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        status: ProjectStatus::InDesign,
        priority: Priority::Normal,
        invoiced: InvoiceStatus::No,
        secretariat: false,
    }
}

impl Fixture {
    pub fn department(&self, rank: usize) -> &department::Model {
        &self.departments[rank - 1]
    }

    /// Upload a file into the fixture project.
    pub async fn file(&self, name: &str) -> file_production::Model {
        self.service
            .register_file(self.admin, self.project.id, name, b"drawing")
            .await
            .unwrap()
    }

    pub fn new_task(&self, file_id: i32, rank: usize) -> NewTask {
        let day = Utc.with_ymd_and_hms(2024, 2, 5, 8, 0, 0).unwrap();
        NewTask {
            file_id,
            department_id: self.department(rank).id,
            manager_id: self.admin.user_id,
            planned_start_date: day,
            planned_end_date: day + chrono::Duration::days(3),
            users: vec![],
        }
    }

    /// Create a task for a file in the department of the given rank.
    pub async fn task(&self, file_id: i32, rank: usize) -> task::Model {
        self.service
            .create_task(self.admin, self.new_task(file_id, rank))
            .await
            .unwrap()
    }

    /// Current chain of a file as stored.
    pub async fn chain(&self, file_id: i32) -> Vec<task::Model> {
        self.service.tasks_for_file(file_id).await.unwrap()
    }

    pub async fn project(&self) -> project::Model {
        self.service.get_project(self.project.id).await.unwrap()
    }
}

/// At most one permission holder and links that follow chain order.
pub fn assert_chain_invariants(tasks: &[task::Model]) {
    let holders = tasks.iter().filter(|task| task.permission).count();
    assert!(holders <= 1, "{} tasks hold permission", holders);

    for (i, task) in tasks.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| tasks[p].id);
        let next = tasks.get(i + 1).map(|n| n.id);
        assert_eq!(task.previous_task_id, prev, "previous link of task {}", task.id);
        assert_eq!(task.next_task_id, next, "next link of task {}", task.id);
    }
}

pub fn permission_holders(tasks: &[task::Model]) -> Vec<i32> {
    tasks.iter().filter(|task| task.permission).map(|task| task.id).collect()
}
