mod helpers;

use gitpal::git::Repository;
use gitpal::git::executor::CommandExecutor;
use gitpal::security::validator::ExecPolicy;
use gitpal::workflow::commit::{CommitEvent, CommitState, CommitWorkflow};
use helpers::{
    MockModel, MockReply, create_identityless_repo, create_test_repo, last_commit_subject,
    stage_file,
};

#[tokio::test]
async fn test_clean_repo_yields_nothing_to_commit() {
    let (_temp, repo_path) = create_test_repo();
    let repo = Repository::new(&repo_path);
    let model = MockModel::texts(&["should never be called"]);

    let mut workflow = CommitWorkflow::new();
    let event = workflow.start(&repo, &model).await.unwrap();

    assert_eq!(event, CommitEvent::NothingToCommit);
    assert_eq!(workflow.state(), CommitState::Idle);
    assert!(workflow.pending_suggestion().is_none());
    // The model was never asked for a suggestion
    assert_eq!(model.log().len(), 0);
}

#[tokio::test]
async fn test_unstaged_changes_alone_yield_nothing_to_commit() {
    let (_temp, repo_path) = create_test_repo();
    std::fs::write(repo_path.join("loose.txt"), "not staged").unwrap();

    let repo = Repository::new(&repo_path);
    let model = MockModel::texts(&["should never be called"]);

    let mut workflow = CommitWorkflow::new();
    let event = workflow.start(&repo, &model).await.unwrap();

    assert_eq!(event, CommitEvent::NothingToCommit);
}

#[tokio::test]
async fn test_suggest_then_confirm_commits_verbatim() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(
        &repo_path,
        "app.js",
        "function greet() {\n    console.log(\"Hello, World!\");\n}\n",
    );

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    let model = MockModel::texts(&["Add greet function"]);

    let mut workflow = CommitWorkflow::new();
    let event = workflow.start(&repo, &model).await.unwrap();

    assert_eq!(
        event,
        CommitEvent::Suggested {
            message: "Add greet function".to_string()
        }
    );
    assert!(workflow.is_awaiting_decision());

    // The staged diff was actually shown to the model
    assert!(model.log().calls()[0].contains("greet"));

    let event = workflow.confirm(&executor).await.unwrap();
    match event {
        CommitEvent::Committed { message, .. } => assert_eq!(message, "Add greet function"),
        other => panic!("expected Committed, got {other:?}"),
    }

    assert_eq!(last_commit_subject(&repo_path), "Add greet function");
    assert_eq!(workflow.state(), CommitState::Idle);
    assert!(workflow.pending_suggestion().is_none());
}

#[tokio::test]
async fn test_suggestion_is_cleaned_to_single_short_subject() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "style.css", "body { background: #f0f0f0; }\n");

    let repo = Repository::new(&repo_path);
    let model = MockModel::texts(&[
        "```\n\"Set the body background color to a very light gray shade for readability.\"\n\nExplanation follows.\n```",
    ]);

    let mut workflow = CommitWorkflow::new();
    let event = workflow.start(&repo, &model).await.unwrap();

    let CommitEvent::Suggested { message } = event else {
        panic!("expected Suggested");
    };

    assert!(message.chars().count() <= 50, "subject too long: {message}");
    assert!(!message.contains('"'));
    assert!(!message.contains('`'));
    assert!(!message.contains('\n'));
}

#[tokio::test]
async fn test_short_override_falls_back_to_suggestion() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "a.txt", "content");

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    // Only one scripted reply: the suggestion. The validator must not run.
    let model = MockModel::texts(&["Add a file"]);

    let mut workflow = CommitWorkflow::new();
    workflow.start(&repo, &model).await.unwrap();

    let event = workflow.override_message(&executor, &model, "x").await.unwrap();

    match event {
        CommitEvent::Committed { message, .. } => assert_eq!(message, "Add a file"),
        other => panic!("expected Committed, got {other:?}"),
    }
    assert_eq!(last_commit_subject(&repo_path), "Add a file");
    assert_eq!(model.log().len(), 1);
}

#[tokio::test]
async fn test_invalid_override_falls_back_to_suggestion() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "a.txt", "content");

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    let model = MockModel::texts(&["Add a file", "INVALID"]);

    let mut workflow = CommitWorkflow::new();
    workflow.start(&repo, &model).await.unwrap();

    let event = workflow
        .override_message(&executor, &model, "..")
        .await
        .unwrap();

    match event {
        CommitEvent::Committed { message, .. } => assert_eq!(message, "Add a file"),
        other => panic!("expected Committed, got {other:?}"),
    }
    assert_eq!(last_commit_subject(&repo_path), "Add a file");
}

#[tokio::test]
async fn test_valid_override_is_sanitized() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "api.rs", "pub fn call() {}");

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    let model = MockModel::texts(&["Add API call", "Fix bug in API"]);

    let mut workflow = CommitWorkflow::new();
    workflow.start(&repo, &model).await.unwrap();

    let event = workflow
        .override_message(&executor, &model, "fixed bug in api...")
        .await
        .unwrap();

    match event {
        CommitEvent::Committed { message, .. } => assert_eq!(message, "Fix bug in API"),
        other => panic!("expected Committed, got {other:?}"),
    }
    // The validator saw the raw override text
    assert!(model.log().calls()[1].contains("fixed bug in api..."));
}

#[tokio::test]
async fn test_validator_outage_commits_raw_override() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "a.txt", "content");

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    let model = MockModel::scripted(vec![
        MockReply::Text("Add a file".to_string()),
        MockReply::Unavailable,
    ]);

    let mut workflow = CommitWorkflow::new();
    workflow.start(&repo, &model).await.unwrap();

    let event = workflow
        .override_message(&executor, &model, "  my own words  ")
        .await
        .unwrap();

    match event {
        CommitEvent::Committed { message, .. } => assert_eq!(message, "my own words"),
        other => panic!("expected Committed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_identity_unknown_is_distinct_event() {
    let (_temp, repo_path) = create_identityless_repo();
    stage_file(&repo_path, "a.txt", "content");

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    let model = MockModel::texts(&["Add a file"]);

    let mut workflow = CommitWorkflow::new();
    workflow.start(&repo, &model).await.unwrap();

    let event = workflow.confirm(&executor).await.unwrap();

    assert!(
        matches!(event, CommitEvent::IdentityUnknown { .. }),
        "expected IdentityUnknown, got {event:?}"
    );
    assert_eq!(workflow.state(), CommitState::Idle);
}

#[tokio::test]
async fn test_reset_abandons_pending_suggestion() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "a.txt", "content");

    let repo = Repository::new(&repo_path);
    let executor = CommandExecutor::new(&repo_path, ExecPolicy::GitOnly);
    let model = MockModel::texts(&["Add a file"]);

    let mut workflow = CommitWorkflow::new();
    workflow.start(&repo, &model).await.unwrap();
    assert!(workflow.is_awaiting_decision());

    workflow.reset();

    assert!(workflow.pending_suggestion().is_none());
    let result = workflow.confirm(&executor).await;
    assert!(result.is_err(), "confirm after reset must not commit");
    assert_eq!(last_commit_subject(&repo_path), "");
}

#[tokio::test]
async fn test_model_outage_during_suggestion_resets_workflow() {
    let (_temp, repo_path) = create_test_repo();
    stage_file(&repo_path, "a.txt", "content");

    let repo = Repository::new(&repo_path);
    let model = MockModel::scripted(vec![MockReply::Unavailable]);

    let mut workflow = CommitWorkflow::new();
    let result = workflow.start(&repo, &model).await;

    assert!(result.is_err());
    assert_eq!(workflow.state(), CommitState::Idle);
    assert!(workflow.pending_suggestion().is_none());
}
