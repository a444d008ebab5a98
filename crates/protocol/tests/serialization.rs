use ik_protocol::*;
use serde_json::json;

#[test]
fn test_backend_status_serialization() {
    let status = BackendStatus::Generated;
    let json = serde_json::to_value(status).expect("Failed to serialize BackendStatus");

    assert_eq!(json, "generated");

    let deserialized: BackendStatus =
        serde_json::from_value(json).expect("Failed to deserialize BackendStatus");
    assert_eq!(deserialized, BackendStatus::Generated);

    // Full wire vocabulary round-trips.
    for (status, text) in [
        (BackendStatus::Created, "created"),
        (BackendStatus::Processing, "processing"),
        (BackendStatus::Generated, "generated"),
        (BackendStatus::Completed, "completed"),
        (BackendStatus::Failed, "failed"),
    ] {
        assert_eq!(serde_json::to_value(status).expect("serialize"), text);
    }
}

#[test]
fn test_prompt_state_serialization() {
    let state = PromptState::ReadyForExecution;
    let json = serde_json::to_value(state).expect("Failed to serialize PromptState");

    assert_eq!(json, "READY_FOR_EXECUTION");

    let deserialized: PromptState =
        serde_json::from_value(json).expect("Failed to deserialize PromptState");
    assert_eq!(deserialized, PromptState::ReadyForExecution);
}

#[test]
fn test_from_backend_is_total_and_phase_aware() {
    // `processing` means different things depending on the stage being
    // watched; everything else ignores the phase.
    assert_eq!(
        PromptState::from_backend(BackendStatus::Processing, ExecutionPhase::Generation),
        PromptState::Processing
    );
    assert_eq!(
        PromptState::from_backend(BackendStatus::Processing, ExecutionPhase::Execution),
        PromptState::Executing
    );
    assert_eq!(
        PromptState::from_backend(BackendStatus::Created, ExecutionPhase::Generation),
        PromptState::Processing
    );

    for phase in [ExecutionPhase::Generation, ExecutionPhase::Execution] {
        assert_eq!(
            PromptState::from_backend(BackendStatus::Generated, phase),
            PromptState::ReadyForExecution
        );
        assert_eq!(
            PromptState::from_backend(BackendStatus::Completed, phase),
            PromptState::Completed
        );
        assert_eq!(
            PromptState::from_backend(BackendStatus::Failed, phase),
            PromptState::Failed
        );
    }
}

#[test]
fn test_backend_summary_projection() {
    assert_eq!(PromptState::Idle.backend_summary(), None);
    assert_eq!(PromptState::Creating.backend_summary(), None);
    assert_eq!(
        PromptState::Processing.backend_summary(),
        Some(BackendStatus::Processing)
    );
    assert_eq!(
        PromptState::Executing.backend_summary(),
        Some(BackendStatus::Processing)
    );
    assert_eq!(
        PromptState::ReadyForExecution.backend_summary(),
        Some(BackendStatus::Generated)
    );
    assert_eq!(
        PromptState::Completed.backend_summary(),
        Some(BackendStatus::Completed)
    );
    assert_eq!(
        PromptState::Failed.backend_summary(),
        Some(BackendStatus::Failed)
    );
}

#[test]
fn test_progress_constants() {
    assert_eq!(progress::for_state(PromptState::Idle), 0);
    assert_eq!(progress::for_state(PromptState::Creating), 5);
    assert_eq!(progress::for_state(PromptState::Processing), 15);
    assert_eq!(progress::for_state(PromptState::ReadyForExecution), 40);
    assert_eq!(progress::for_state(PromptState::Executing), 60);
    assert_eq!(progress::for_state(PromptState::Completed), 100);
    // Failure resets the indicator.
    assert_eq!(progress::for_state(PromptState::Failed), 0);
    assert_eq!(progress::FETCHING_RESULTS, 85);
}

#[test]
fn test_prompt_settings_defaults() {
    let settings = PromptSettings::default();

    assert_eq!(settings.visualization_type, VisualizationStyle::Auto);
    assert!(settings.include_insights);
    assert_eq!(settings.language, "en");
    assert_eq!(settings.display_currency, "USD");
    assert_eq!(settings.fiscal_year_start, "January");

    // Partial wire payloads fill in the same defaults.
    let parsed: PromptSettings =
        serde_json::from_value(json!({ "visualizationType": "bar" }))
            .expect("Failed to deserialize partial PromptSettings");
    assert_eq!(parsed.visualization_type, VisualizationStyle::Bar);
    assert!(parsed.include_insights);
    assert_eq!(parsed.display_currency, "USD");
}

#[test]
fn test_create_prompt_request_wire_shape() {
    let request = CreatePromptRequest {
        prompt: "Show revenue by region".to_string(),
        dataset_ids: vec![DatasetId::from("ds-1"), DatasetId::from("ds-2")],
        settings: PromptSettings::default(),
    };

    let json = serde_json::to_value(&request).expect("Failed to serialize CreatePromptRequest");

    assert_eq!(json["prompt"], "Show revenue by region");
    assert_eq!(json["datasetIds"], json!(["ds-1", "ds-2"]));
    assert_eq!(json["settings"]["visualizationType"], "auto");
    assert_eq!(json["settings"]["fiscalYearStart"], "January");
}

#[test]
fn test_execute_request_wire_shape() {
    let request = ExecuteRequest::default();
    let json = serde_json::to_value(&request).expect("Failed to serialize ExecuteRequest");

    assert_eq!(json, json!({ "executionOptions": {} }));
}

#[test]
fn test_prompt_details_deserialization() {
    let payload = json!({
        "status": "failed",
        "prompt": "Show revenue",
        "error": { "message": "dataset unavailable", "code": "DATASET_GONE" },
        "created": "2025-03-01T12:00:00Z"
    });

    let details: PromptDetails =
        serde_json::from_value(payload).expect("Failed to deserialize PromptDetails");

    assert_eq!(details.status, BackendStatus::Failed);
    let error = details.error.expect("error should be present");
    assert_eq!(error.message, "dataset unavailable");
    assert_eq!(error.code.as_deref(), Some("DATASET_GONE"));

    // Minimal payloads still parse.
    let minimal: PromptDetails = serde_json::from_value(json!({ "status": "processing" }))
        .expect("Failed to deserialize minimal PromptDetails");
    assert_eq!(minimal.status, BackendStatus::Processing);
    assert!(minimal.error.is_none());
}

#[test]
fn test_execution_result_deserialization() {
    let payload = json!({
        "code": "canvas.card(\"Revenue\", \"$1.2M\")",
        "data": { "rows": [1, 2, 3] },
        "visualizations": [
            { "title": "Revenue by region", "chartType": "bar" }
        ],
        "insights": [
            { "text": "Revenue grew 12% quarter over quarter" }
        ]
    });

    let result: ExecutionResult =
        serde_json::from_value(payload).expect("Failed to deserialize ExecutionResult");

    assert!(result.is_renderable());
    assert_eq!(result.visualizations.len(), 1);
    assert_eq!(result.visualizations[0].chart_type.as_deref(), Some("bar"));
    assert_eq!(result.insights[0].text, "Revenue grew 12% quarter over quarter");

    // Data-only results are valid too.
    let data_only: ExecutionResult = serde_json::from_value(json!({ "data": {} }))
        .expect("Failed to deserialize data-only ExecutionResult");
    assert!(data_only.code.is_none());
    assert!(!data_only.is_renderable());
}

#[test]
fn test_prompt_record_wire_shape() {
    let record = PromptRecord {
        id: PromptId::from("p-7"),
        prompt: "Top customers by spend".to_string(),
        status: BackendStatus::Created,
        created: chrono::Utc::now(),
        dataset_ids: vec![DatasetId::from("ds-9")],
        settings: Some(PromptSettings::default()),
        has_results: false,
        has_error: false,
    };

    let json = serde_json::to_value(&record).expect("Failed to serialize PromptRecord");
    assert_eq!(json["id"], "p-7");
    assert_eq!(json["status"], "created");
    assert_eq!(json["datasetIds"], json!(["ds-9"]));
    assert_eq!(json["hasResults"], false);

    // List responses may omit settings and flags.
    let sparse: PromptRecord = serde_json::from_value(json!({
        "id": "p-8",
        "prompt": "Weekly active users",
        "status": "completed",
        "created": "2025-03-02T09:30:00Z"
    }))
    .expect("Failed to deserialize sparse PromptRecord");
    assert!(sparse.settings.is_none());
    assert!(sparse.dataset_ids.is_empty());
    assert!(!sparse.has_results);
}

#[test]
fn test_event_enum_serialization() {
    let event = PromptEvent::PromptStatusUpdate {
        prompt_id: Some(PromptId::from("p-1")),
        state: PromptState::Processing,
        progress: 15,
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize PromptEvent");
    assert_eq!(json["type"], "promptStatusUpdate");
    assert!(json["payload"].is_object());
    assert_eq!(json["payload"]["state"], "PROCESSING");
    assert_eq!(json["payload"]["progress"], 15);

    let completed = PromptEvent::PromptCompleted {
        prompt_id: PromptId::from("p-1"),
        result: ExecutionResult::default(),
    };
    let json = serde_json::to_value(&completed).expect("Failed to serialize PromptEvent");
    assert_eq!(json["type"], "promptCompleted");

    let reset = PromptEvent::ControllerReset;
    let json = serde_json::to_value(&reset).expect("Failed to serialize PromptEvent");
    assert_eq!(json["type"], "controllerReset");
}

#[test]
fn test_error_response_deserialization() {
    let body: ErrorResponse = serde_json::from_value(json!({
        "error": { "message": "prompt not found" }
    }))
    .expect("Failed to deserialize ErrorResponse");

    assert_eq!(body.error.message, "prompt not found");
    assert!(body.error.code.is_none());
}
