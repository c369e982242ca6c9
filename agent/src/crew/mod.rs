//! Sequential multi-agent orchestration.
//!
//! A [`Crew`] runs its tasks in list order. Every task is executed by a fresh
//! [`Agent`] built from the task's [`AgentConfig`], and the raw outputs of
//! earlier tasks are handed to later ones as prompt context. Nothing in the
//! types ties one task's input to another's output; the chaining lives in
//! the prompt only.

use crate::callbacks::MessageLogger;
use crate::llm::{self, Message};
use crate::sink::SharedWriter;
use crate::tools::{Builtin, FunctionalTool, ToolCall, ToolDefinition};
use crate::{Agent, AgentBuilder, StopCondition};
use crate::{Error, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::io::Write;
use std::sync::Arc;

mod delegation;
use delegation::{AskQuestion, DelegateWork};

const PERSONA_PROMPT: &str = include_str!("prompts/persona.md");
const TASK_PROMPT: &str = include_str!("prompts/task.md");
const CONTEXT_PROMPT: &str = include_str!("prompts/context.md");

const FINAL_ANSWER: &str = "final_answer";
const OUTPUT_SEPARATOR: &str = "\n\n----------\n\n";
const DEFAULT_MAX_ITERATIONS: usize = 25;

/// Something that can run a whole job and hand back its final text.
#[async_trait]
pub trait Orchestrator {
    async fn kickoff(&mut self, out: SharedWriter) -> Result<String>;
}

/// A persona the crew can put to work.
pub struct AgentConfig {
    role: String,
    goal: String,
    backstory: String,
    verbose: bool,
    allow_delegation: bool,
    tools: Vec<Builtin>,
    llm: Arc<dyn llm::LLM + Send + Sync>,
    max_iterations: usize,
}

impl AgentConfig {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        llm: Arc<dyn llm::LLM + Send + Sync>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            verbose: false,
            allow_delegation: false,
            tools: Vec::new(),
            llm,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn tools(mut self, tools: Vec<Builtin>) -> Self {
        self.tools = tools;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn allows_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(Builtin::name).collect()
    }

    fn system_prompt(&self) -> String {
        fill(
            PERSONA_PROMPT,
            &[
                ("role", &self.role),
                ("backstory", &self.backstory),
                ("goal", &self.goal),
            ],
        )
    }

    fn executor(&self, coworkers: &[Arc<AgentConfig>], out: &SharedWriter) -> Result<Agent> {
        let mut builder = AgentBuilder::new()
            .llm(self.llm.clone())
            .tools(self.tools.iter().map(Builtin::instantiate).collect())
            .tool(Box::new(FinalAnswer))
            .stop_condition(Box::new(FinalAnswerGiven))
            .max_iterations(self.max_iterations);

        if !coworkers.is_empty() {
            builder = builder
                .tool(Box::new(DelegateWork::new(coworkers.to_vec(), out.clone())))
                .tool(Box::new(AskQuestion::new(coworkers.to_vec(), out.clone())));
        }

        if self.verbose {
            builder = builder.callback(MessageLogger::new(&self.role, out.clone())?);
        }

        builder.build()
    }

    /// Runs one unit of work as this agent and returns its final answer.
    pub(crate) async fn execute(
        &self,
        description: &str,
        expected_output: &str,
        context: &str,
        coworkers: &[Arc<AgentConfig>],
        out: &SharedWriter,
    ) -> Result<String> {
        let mut executor = self.executor(coworkers, out)?;

        let history = executor
            .run(vec![
                Message::System(self.system_prompt()),
                Message::User(task_prompt(description, expected_output, context)),
            ])
            .await?;

        final_answer(&history).ok_or_else(|| {
            Error::AgentWorkflowError(format!("{} stopped without a final answer", self.role))
        })
    }
}

fn task_prompt(description: &str, expected_output: &str, context: &str) -> String {
    let context = if context.is_empty() {
        String::new()
    } else {
        fill(CONTEXT_PROMPT, &[("context", context)])
    };

    fill(
        TASK_PROMPT,
        &[
            ("description", description),
            ("expected_output", expected_output),
            ("context", &context),
        ],
    )
}

/// Expands `{name}` placeholders in one pass over `template`. Substituted
/// text is never scanned again, so values may contain braces.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let value = tail.find('}').and_then(|end| {
            values
                .iter()
                .find(|(name, _)| *name == &tail[..end])
                .map(|(_, value)| (end, *value))
        });

        match value {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// A unit of work bound to exactly one agent.
#[derive(Clone)]
pub struct TaskConfig {
    description: String,
    expected_output: String,
    agent: Arc<AgentConfig>,
}

impl TaskConfig {
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: &Arc<AgentConfig>,
    ) -> Self {
        Self {
            description: description.into(),
            expected_output: expected_output.into(),
            agent: agent.clone(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> &Arc<AgentConfig> {
        &self.agent
    }
}

pub struct Crew {
    agents: Vec<Arc<AgentConfig>>,
    tasks: Vec<TaskConfig>,
    verbose: bool,
}

impl Crew {
    /// Every task must be assigned to one of `agents`, compared by identity.
    pub fn new(agents: Vec<Arc<AgentConfig>>, tasks: Vec<TaskConfig>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(Error::MissingArg("a crew needs at least one task".to_string()));
        }

        for task in &tasks {
            if !agents.iter().any(|agent| Arc::ptr_eq(agent, &task.agent)) {
                return Err(Error::UnknownAgent(task.agent.role.clone()));
            }
        }

        Ok(Self {
            agents,
            tasks,
            verbose: false,
        })
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn agents(&self) -> &[Arc<AgentConfig>] {
        &self.agents
    }

    pub fn tasks(&self) -> &[TaskConfig] {
        &self.tasks
    }

    fn coworkers(&self, agent: &Arc<AgentConfig>) -> Vec<Arc<AgentConfig>> {
        if !agent.allow_delegation {
            return Vec::new();
        }

        self.agents
            .iter()
            .filter(|other| !Arc::ptr_eq(other, agent))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Orchestrator for Crew {
    async fn kickoff(&mut self, mut out: SharedWriter) -> Result<String> {
        let mut outputs: Vec<String> = Vec::new();

        for (index, task) in self.tasks.iter().enumerate() {
            let agent = &task.agent;
            tracing::info!(
                task = index + 1,
                total = self.tasks.len(),
                agent = %agent.role,
                "starting task"
            );

            if self.verbose {
                write!(
                    out,
                    "# Agent: {}\n## Task: {}\n\n",
                    agent.role, task.description
                )?;
                out.flush()?;
            }

            let answer = agent
                .execute(
                    &task.description,
                    &task.expected_output,
                    &outputs.join(OUTPUT_SEPARATOR),
                    &self.coworkers(agent),
                    &out,
                )
                .await?;

            if self.verbose {
                write!(
                    out,
                    "# Agent: {}\n## Final Answer:\n{}\n\n",
                    agent.role, answer
                )?;
                out.flush()?;
            }

            outputs.push(answer);
        }

        outputs
            .pop()
            .ok_or(Error::AgentWorkflowError("crew has no tasks".to_string()))
    }
}

/// The answer an agent settled on: a `final_answer` tool result after the
/// latest assistant turn, or a plain assistant reply that called no tools.
fn final_answer(history: &[Message]) -> Option<String> {
    for message in history.iter().rev() {
        match message {
            Message::Tool { name, result, .. } if name == FINAL_ANSWER => {
                return Some(result.clone());
            }
            Message::Tool { .. } => continue,
            Message::Assistant(content, tool_calls) => {
                return tool_calls.is_empty().then(|| content.clone());
            }
            _ => return None,
        }
    }
    None
}

struct FinalAnswerGiven;

impl StopCondition for FinalAnswerGiven {
    fn done(&self, history: &[Message]) -> bool {
        final_answer(history).is_some()
    }
}

#[derive(Deserialize, JsonSchema)]
struct FinalAnswerArgs {
    /// the complete content of your final answer
    answer: String,
}

struct FinalAnswer;

#[async_trait]
impl FunctionalTool for FinalAnswer {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<FinalAnswerArgs>(
            FINAL_ANSWER,
            "finish your task and return the complete final answer",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: FinalAnswerArgs = call.args()?;
        Ok(call.reply(args.answer))
    }
}
