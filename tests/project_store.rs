mod support;

use support::TestEnv;
use wr::project::{NewProject, ProjectPatch, ProjectStatus};
use wr::task::{NewTask, TaskPatch};
use wr::Error;

fn project(id: &str, name: &str, order: i64) -> NewProject {
    NewProject {
        id: id.to_string(),
        name: name.to_string(),
        icon: "folder".to_string(),
        color: "#8844ee".to_string(),
        description: None,
        status: ProjectStatus::Active,
        order,
    }
}

#[tokio::test]
async fn list_sorts_by_order_and_counts_tasks() {
    let env = TestEnv::new();
    let projects = env.projects();
    let tasks = env.tasks();

    projects.create(project("beta", "Beta", 2)).await.expect("create");
    projects.create(project("alpha", "Alpha", 1)).await.expect("create");
    projects.create(project("empty", "Empty", 0)).await.expect("create");

    for _ in 0..2 {
        tasks
            .create(NewTask {
                title: "work".to_string(),
                project: Some("beta".to_string()),
                ..NewTask::default()
            })
            .await
            .expect("create task");
    }
    tasks
        .create(NewTask {
            title: "solo".to_string(),
            project: Some("alpha".to_string()),
            ..NewTask::default()
        })
        .await
        .expect("create task");

    let listed = projects.list().await;
    let summary: Vec<(String, usize)> = listed
        .iter()
        .map(|entry| (entry.project.id.clone(), entry.task_count))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("empty".to_string(), 0),
            ("alpha".to_string(), 1),
            ("beta".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn update_merges_and_clears_description() {
    let env = TestEnv::new();
    let projects = env.projects();
    projects
        .create(NewProject {
            description: Some("first pass".to_string()),
            ..project("alpha", "Alpha", 0)
        })
        .await
        .expect("create");

    let renamed = projects
        .update(
            "alpha",
            ProjectPatch {
                name: Some("Alpha 2".to_string()),
                status: Some(ProjectStatus::Paused),
                ..ProjectPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(renamed.name, "Alpha 2");
    assert_eq!(renamed.status, ProjectStatus::Paused);
    assert_eq!(renamed.description.as_deref(), Some("first pass"));

    let cleared = projects
        .update(
            "alpha",
            ProjectPatch {
                description: Some(None),
                ..ProjectPatch::default()
            },
        )
        .await
        .expect("clear");
    assert!(cleared.description.is_none());
}

#[tokio::test]
async fn delete_refuses_while_tasks_reference_the_project() {
    let env = TestEnv::new();
    let projects = env.projects();
    let tasks = env.tasks();

    projects.create(project("client-x", "Client X", 0)).await.expect("create");
    let task = tasks
        .create(NewTask {
            title: "deliverable".to_string(),
            project: Some("client-x".to_string()),
            ..NewTask::default()
        })
        .await
        .expect("create task");

    let err = projects.delete("client-x").await.expect_err("must refuse");
    assert!(matches!(err, Error::ProjectInUse(_)));
    assert_ne!(
        err.exit_code(),
        Error::ProjectNotFound("client-x".to_string()).exit_code(),
        "policy rejection is distinct from not-found"
    );

    // still listable afterwards
    assert!(projects
        .list()
        .await
        .iter()
        .any(|entry| entry.project.id == "client-x"));

    // detaching the task unblocks the delete
    tasks
        .update(
            &task.id,
            TaskPatch {
                project: Some(None),
                ..TaskPatch::default()
            },
        )
        .await
        .expect("detach");
    projects.delete("client-x").await.expect("delete");
    assert!(projects.list().await.is_empty());
}

#[tokio::test]
async fn delete_unknown_project_is_not_found() {
    let env = TestEnv::new();
    let err = env.projects().delete("ghost").await.expect_err("missing");
    assert!(matches!(err, Error::ProjectNotFound(_)));
}
