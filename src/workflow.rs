use crate::{
    client::TextGenerator,
    error::{FlowError, Result},
    route::RoutingTable,
    stage::StageHandler,
    state::WorkflowState,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const DEFAULT_STEP_LIMIT: usize = 256;

/// How control moves on after a stage finishes.
pub enum Transition {
    /// Unconditional edge to the named stage.
    To(String),
    /// Look up a state field in a routing table.
    Route { field: String, table: RoutingTable },
    /// Compute a routing key from the whole state, then look it up.
    Branch {
        selector: Arc<dyn Fn(&WorkflowState) -> String + Send + Sync>,
        table: RoutingTable,
    },
    /// Terminal stage; the run ends and the state is handed back.
    End,
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::To(next) => f.debug_tuple("To").field(next).finish(),
            Transition::Route { field, table } => f
                .debug_struct("Route")
                .field("field", field)
                .field("table", table)
                .finish(),
            Transition::Branch { table, .. } => f
                .debug_struct("Branch")
                .field("table", table)
                .finish_non_exhaustive(),
            Transition::End => write!(f, "End"),
        }
    }
}

/// Executor for a graph of named stages over one shared state record.
///
/// Stages run strictly sequentially: each stage completes (including its
/// text-generation call) before the next begins, and exactly one run owns
/// the state at a time. A failing stage aborts the run with
/// [`FlowError::StageFailed`] — no rollback, no retry; the partially
/// written state is dropped with the error.
pub struct Workflow {
    stages: HashMap<String, Arc<dyn StageHandler>>,
    transitions: HashMap<String, Transition>,
    entry: String,
    max_steps: usize,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .field("entry", &self.entry)
            .field("max_steps", &self.max_steps)
            .finish()
    }
}

impl Workflow {
    /// Create a new workflow builder.
    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::new()
    }

    /// Names of the registered stages.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.keys().map(|s| s.as_str()).collect()
    }

    /// Run the workflow over an initial state until a terminal stage.
    ///
    /// The generator is injected here and threaded to every stage. The
    /// returned state carries every field written along the taken path,
    /// plus the visited-stage path itself.
    pub async fn run(
        &self,
        llm: &dyn TextGenerator,
        mut state: WorkflowState,
    ) -> Result<WorkflowState> {
        let mut current = self.entry.clone();

        for _ in 0..self.max_steps {
            let handler = self
                .stages
                .get(&current)
                .ok_or_else(|| FlowError::UnknownStage(current.clone()))?;

            handler.run(llm, &mut state).await.map_err(|e| match e {
                already @ FlowError::StageFailed { .. } => already,
                other => FlowError::StageFailed {
                    stage: current.clone(),
                    message: other.to_string(),
                },
            })?;
            state.record_visit(&current);

            current = match self.transitions.get(&current) {
                Some(Transition::To(next)) => next.clone(),
                Some(Transition::Route { field, table }) => {
                    let value = state.str_or(field, "");
                    table.resolve(&value).to_string()
                }
                Some(Transition::Branch { selector, table }) => {
                    let key = selector(&state);
                    table.resolve(&key).to_string()
                }
                Some(Transition::End) | None => return Ok(state),
            };
        }

        Err(FlowError::StepLimit(self.max_steps))
    }
}

/// Builder for workflows; validates the transition graph on `build()`.
pub struct WorkflowBuilder {
    stages: HashMap<String, Arc<dyn StageHandler>>,
    transitions: HashMap<String, Transition>,
    entry: Option<String>,
    first: Option<String>,
    last_added: Option<String>,
    max_steps: usize,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
            transitions: HashMap::new(),
            entry: None,
            first: None,
            last_added: None,
            max_steps: DEFAULT_STEP_LIMIT,
        }
    }

    /// Register a stage. Stage names must be unique within a workflow.
    pub fn stage(mut self, name: impl Into<String>, handler: impl StageHandler + 'static) -> Self {
        let name = name.into();
        if self.first.is_none() {
            self.first = Some(name.clone());
        }
        self.last_added = Some(name.clone());
        self.stages.insert(name, Arc::new(handler));
        self
    }

    /// Register a stage and link it after the previously added one.
    ///
    /// This is the linear-pipeline shorthand: `.stage(a).then(b).then(c)`
    /// wires `a -> b -> c`.
    pub fn then(mut self, name: impl Into<String>, handler: impl StageHandler + 'static) -> Self {
        let name = name.into();
        if let Some(prev) = self.last_added.clone() {
            self = self.edge(prev, name.clone());
        }
        self.stage(name, handler)
    }

    /// Set the entry stage. Defaults to the first registered stage.
    pub fn entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }

    /// Unconditional edge. A later declaration for the same source stage
    /// replaces the earlier one: each stage has exactly one transition.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transitions
            .insert(from.into(), Transition::To(to.into()));
        self
    }

    /// Route on a state field written by `from` (or an earlier stage).
    pub fn route(
        mut self,
        from: impl Into<String>,
        field: impl Into<String>,
        table: RoutingTable,
    ) -> Self {
        self.transitions.insert(
            from.into(),
            Transition::Route {
                field: field.into(),
                table,
            },
        );
        self
    }

    /// Route on a key computed from the whole state — loop predicates
    /// comparing a cursor against a list length go here.
    pub fn branch(
        mut self,
        from: impl Into<String>,
        selector: impl Fn(&WorkflowState) -> String + Send + Sync + 'static,
        table: RoutingTable,
    ) -> Self {
        self.transitions.insert(
            from.into(),
            Transition::Branch {
                selector: Arc::new(selector),
                table,
            },
        );
        self
    }

    /// Mark a stage as terminal. Stages with no declared transition are
    /// terminal by default; this makes it explicit.
    pub fn end(mut self, from: impl Into<String>) -> Self {
        self.transitions.insert(from.into(), Transition::End);
        self
    }

    /// Upper bound on executed stages per run, as a guard against
    /// mis-declared routing cycles.
    pub fn max_steps(mut self, limit: usize) -> Self {
        self.max_steps = limit;
        self
    }

    /// Build the workflow, validating the transition graph.
    pub fn build(self) -> Result<Workflow> {
        if self.stages.is_empty() {
            return Err(FlowError::InvalidGraph(
                "workflow must have at least one stage".to_string(),
            ));
        }

        let entry = match self.entry.or(self.first) {
            Some(entry) => entry,
            None => unreachable!("stages is non-empty"),
        };
        if !self.stages.contains_key(&entry) {
            return Err(FlowError::InvalidGraph(format!(
                "entry stage '{}' is not registered",
                entry
            )));
        }

        for (from, transition) in &self.transitions {
            if !self.stages.contains_key(from) {
                return Err(FlowError::InvalidGraph(format!(
                    "transition declared for unregistered stage '{}'",
                    from
                )));
            }
            let check = |target: &str| -> Result<()> {
                if self.stages.contains_key(target) {
                    Ok(())
                } else {
                    Err(FlowError::InvalidGraph(format!(
                        "stage '{}' routes to unregistered stage '{}'",
                        from, target
                    )))
                }
            };
            match transition {
                Transition::To(next) => check(next)?,
                Transition::Route { table, .. } | Transition::Branch { table, .. } => {
                    for target in table.targets() {
                        check(target)?;
                    }
                }
                Transition::End => {}
            }
        }

        Ok(Workflow {
            stages: self.stages,
            transitions: self.transitions,
            entry,
            max_steps: self.max_steps,
        })
    }
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
