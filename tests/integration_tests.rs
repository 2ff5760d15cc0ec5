use async_trait::async_trait;
use stageflow::*;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Generator that replays a fixed script of responses, one per call.
struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn next(&self) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FlowError::Llm("script exhausted".to_string()))
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.next()
    }

    async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
        self.next()
    }

    async fn generate_streaming(
        &self,
        _prompt: &str,
        on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        let text = self.next()?;
        // Deliver in two fragments; callers must concatenate in order.
        let mid = text.len() / 2;
        let (a, b) = text.split_at(mid);
        on_token(a);
        on_token(b);
        Ok(text)
    }
}

/// Generator whose every call fails, as when Ollama is unreachable.
struct UnreachableGenerator;

#[async_trait]
impl TextGenerator for UnreachableGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(FlowError::Llm(
            "failed to reach Ollama at http://localhost:11434/api/generate".to_string(),
        ))
    }

    async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
        self.generate("").await
    }

    async fn generate_streaming(
        &self,
        _prompt: &str,
        _on_token: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        self.generate("").await
    }
}

/// Stage that classifies via a generation call and a routing vocabulary.
struct ClassifyStage;

#[async_trait]
impl StageHandler for ClassifyStage {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let reply = llm.generate("classify").await?;
        state.set("classification", reply.trim().to_lowercase());
        Ok(())
    }
}

fn visit(name: &'static str) -> FnStage<impl Fn(&mut WorkflowState) -> Result<()> + Send + Sync> {
    FnStage::new(move |state: &mut WorkflowState| {
        state.push("visited", name);
        Ok(())
    })
}

// --- Routing table fallback ---

#[tokio::test]
async fn unknown_classification_dispatches_to_default_stage() {
    let workflow = Workflow::builder()
        .stage("classify", ClassifyStage)
        .route(
            "classify",
            "classification",
            RoutingTable::new("handle_other").case("question", "handle_question"),
        )
        .stage("handle_question", visit("handle_question"))
        .stage("handle_other", visit("handle_other"))
        .build()
        .unwrap();

    let llm = ScriptedGenerator::new(&["unknown_type"]);
    let state = workflow.run(&llm, WorkflowState::new()).await.unwrap();
    assert_eq!(state.strings("visited"), vec!["handle_other"]);
}

#[tokio::test]
async fn known_classification_dispatches_to_matching_stage() {
    let workflow = Workflow::builder()
        .stage("classify", ClassifyStage)
        .route(
            "classify",
            "classification",
            RoutingTable::new("handle_other").case("question", "handle_question"),
        )
        .stage("handle_question", visit("handle_question"))
        .stage("handle_other", visit("handle_other"))
        .build()
        .unwrap();

    let llm = ScriptedGenerator::new(&["Question"]);
    let state = workflow.run(&llm, WorkflowState::new()).await.unwrap();
    assert_eq!(state.strings("visited"), vec!["handle_question"]);
}

// --- Iterative loop: plan -> [execute -> advance]* -> synthesize ---

struct PlanStage;

#[async_trait]
impl StageHandler for PlanStage {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let reply = llm.generate("plan").await?;
        for step in parse::numbered_items(&reply) {
            state.push("steps", step);
        }
        state.set("cursor", 0);
        Ok(())
    }
}

fn loop_workflow() -> Workflow {
    let predicate = |state: &WorkflowState| {
        if (state.cursor("cursor") as usize) < state.list_len("steps") {
            "continue".to_string()
        } else {
            "done".to_string()
        }
    };

    Workflow::builder()
        .stage("plan", PlanStage)
        .branch(
            "plan",
            predicate,
            RoutingTable::new("synthesize").case("continue", "execute"),
        )
        .stage(
            "execute",
            FnStage::new(|state: &mut WorkflowState| {
                let idx = state.cursor("cursor");
                state.push("executed", idx);
                Ok(())
            }),
        )
        .then(
            "advance",
            FnStage::new(|state: &mut WorkflowState| {
                state.advance("cursor");
                Ok(())
            }),
        )
        .branch(
            "advance",
            predicate,
            RoutingTable::new("synthesize").case("continue", "execute"),
        )
        .stage("synthesize", visit("synthesize"))
        .entry("plan")
        .build()
        .unwrap()
}

#[tokio::test]
async fn loop_executes_once_per_planned_step_then_exits() {
    let llm = ScriptedGenerator::new(&["1. first\n2. second\n3. third"]);
    let state = loop_workflow().run(&llm, WorkflowState::new()).await.unwrap();

    // One execution per step, cursor values strictly increasing.
    let executed: Vec<i64> = state
        .get_list("executed")
        .unwrap()
        .iter()
        .filter_map(|v| v.as_i64())
        .collect();
    assert_eq!(executed, vec![0, 1, 2]);
    assert_eq!(state.cursor("cursor"), 3);
    assert_eq!(state.strings("visited"), vec!["synthesize"]);
}

#[tokio::test]
async fn zero_step_plan_goes_straight_to_synthesis() {
    let llm = ScriptedGenerator::new(&["I could not think of any steps."]);
    let state = loop_workflow().run(&llm, WorkflowState::new()).await.unwrap();

    assert_eq!(state.list_len("steps"), 0);
    assert_eq!(state.list_len("executed"), 0);
    assert_eq!(state.strings("visited"), vec!["synthesize"]);
    assert_eq!(state.path(), ["plan", "synthesize"]);
}

// --- Score clamping through a stage ---

struct ScoreStage;

#[async_trait]
impl StageHandler for ScoreStage {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let review = llm.generate("review").await?;
        state.set("score", parse::clamped_score(&review, "SCORE", 0, 10, 7));
        state.set(
            "confidence",
            parse::clamped_score(&review, "CONFIDENCE", 1, 10, 5),
        );
        Ok(())
    }
}

#[tokio::test]
async fn parsed_scores_are_clamped_into_documented_ranges() {
    let workflow = Workflow::builder().stage("score", ScoreStage).build().unwrap();

    let llm = ScriptedGenerator::new(&["SCORE: 42\nCONFIDENCE: 0"]);
    let state = workflow.run(&llm, WorkflowState::new()).await.unwrap();
    assert_eq!(state.get_i64("score"), Some(10));
    assert_eq!(state.get_i64("confidence"), Some(1));

    let llm = ScriptedGenerator::new(&["SCORE: excellent work\nno confidence line"]);
    let state = workflow.run(&llm, WorkflowState::new()).await.unwrap();
    assert_eq!(state.get_i64("score"), Some(7));
    assert_eq!(state.get_i64("confidence"), Some(5));
}

// --- Deterministic parsing of a canned response ---

#[tokio::test]
async fn canned_response_parses_identically_on_repeated_runs() {
    let workflow = Workflow::builder().stage("score", ScoreStage).build().unwrap();
    let llm = FixedGenerator::new("SCORE: 8/10\nCONFIDENCE: 6");

    let first = workflow.run(&llm, WorkflowState::new()).await.unwrap();
    let second = workflow.run(&llm, WorkflowState::new()).await.unwrap();

    assert_eq!(first.get_i64("score"), Some(8));
    assert_eq!(first.get_i64("score"), second.get_i64("score"));
    assert_eq!(first.get_i64("confidence"), second.get_i64("confidence"));
}

// --- Error policy: per-run abort, stage name attached ---

#[tokio::test]
async fn generation_failure_aborts_run_with_stage_name() {
    let workflow = Workflow::builder()
        .stage("classify", ClassifyStage)
        .stage("after", visit("after"))
        .edge("classify", "after")
        .build()
        .unwrap();

    let err = workflow
        .run(&UnreachableGenerator, WorkflowState::new())
        .await
        .unwrap_err();
    match err {
        FlowError::StageFailed { stage, message } => {
            assert_eq!(stage, "classify");
            assert!(message.contains("failed to reach Ollama"));
        }
        other => panic!("expected StageFailed, got {other:?}"),
    }
}

// --- Conditional workflow end to end with sentiment post-processing ---

struct AnalyzeStage;

#[async_trait]
impl StageHandler for AnalyzeStage {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let analysis = llm.generate("analyze").await?;
        state.set(
            "content_type",
            parse::classification(
                &analysis,
                "Content Type",
                &["question", "complaint"],
                "other",
            ),
        );
        state.set(
            "sentiment",
            parse::classification(&analysis, "Sentiment", &["positive", "negative"], "neutral"),
        );
        Ok(())
    }
}

struct RespondStage(&'static str);

#[async_trait]
impl StageHandler for RespondStage {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let response = llm.generate(self.0).await?;
        state.set("response", response);
        Ok(())
    }
}

#[tokio::test]
async fn branching_pipeline_applies_shared_post_processing() {
    let workflow = Workflow::builder()
        .stage("analyze", AnalyzeStage)
        .route(
            "analyze",
            "content_type",
            RoutingTable::new("handle_other").case("complaint", "handle_complaint"),
        )
        .stage("handle_complaint", RespondStage("complaint"))
        .edge("handle_complaint", "apply_sentiment")
        .stage("handle_other", RespondStage("other"))
        .edge("handle_other", "apply_sentiment")
        .stage(
            "apply_sentiment",
            FnStage::new(|state: &mut WorkflowState| {
                let response = state.str_or("response", "");
                let output = if state.str_or("sentiment", "neutral") == "negative" {
                    format!("I understand this might be frustrating. {response}")
                } else {
                    response
                };
                state.set("final_output", output);
                Ok(())
            }),
        )
        .entry("analyze")
        .build()
        .unwrap();

    let llm = ScriptedGenerator::new(&[
        "Content Type: complaint\nSentiment: negative",
        "We are sorry about the delay.",
    ]);
    let state = workflow.run(&llm, WorkflowState::new()).await.unwrap();

    assert_eq!(
        state.str_or("final_output", ""),
        "I understand this might be frustrating. We are sorry about the delay."
    );
    assert_eq!(state.path(), ["analyze", "handle_complaint", "apply_sentiment"]);
}

// --- Tool scenarios ---

#[test]
fn calculator_scenario() {
    let registry = ToolRegistry::builtin();
    let result = registry.dispatch("calculator", "calculate 5+3").unwrap();
    assert!(result.contains("8"), "result was: {result}");
}

#[test]
fn reverse_scenario() {
    let registry = ToolRegistry::builtin();
    let result = registry
        .dispatch("reverse_text", "reverse this text: Hello")
        .unwrap();
    assert!(result.contains("olleH"), "result was: {result}");
}

#[test]
fn routing_scenario() {
    let table = RoutingTable::new("handle_other").case("question", "handle_question");
    assert_eq!(table.resolve("unknown_type"), "handle_other");
}

// --- Streaming fragments concatenate in arrival order ---

#[tokio::test]
async fn streaming_concatenates_fragments_in_order() {
    let llm = ScriptedGenerator::new(&["hello world"]);
    let mut seen = Vec::new();
    let full = llm
        .generate_streaming("prompt", &mut |t| seen.push(t.to_string()))
        .await
        .unwrap();
    assert_eq!(full, "hello world");
    assert_eq!(seen.concat(), "hello world");
    assert_eq!(seen.len(), 2);
}

// --- Document loading fallback ---

#[test]
fn missing_document_is_created_with_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");

    let content = document::load_or_create(&path, "fallback text").unwrap();
    assert_eq!(content, "fallback text");
    assert!(path.exists());

    let again = document::load_or_create(&path, "different").unwrap();
    assert_eq!(again, "fallback text");
}
