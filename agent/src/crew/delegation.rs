use crate::Result;
use crate::crew::AgentConfig;
use crate::llm::Message;
use crate::sink::SharedWriter;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

const COWORKER_EXPECTED_OUTPUT: &str =
    "Your best answer to your coworker asking you this, accounting for the context shared.";

pub(super) struct DelegateWork {
    coworkers: Vec<Arc<AgentConfig>>,
    out: SharedWriter,
}

impl DelegateWork {
    pub(super) fn new(coworkers: Vec<Arc<AgentConfig>>, out: SharedWriter) -> Self {
        Self { coworkers, out }
    }
}

#[derive(Deserialize, JsonSchema)]
struct DelegateWorkArgs {
    /// the task to delegate
    task: String,
    /// everything the coworker needs to know to do the task
    context: String,
    /// role of the coworker to delegate to
    coworker: String,
}

#[async_trait]
impl FunctionalTool for DelegateWork {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<DelegateWorkArgs>(
            "delegate_work_to_coworker",
            &format!(
                "Delegate a specific task to one of the following coworkers: {}. \
                 Give the coworker the task and ALL the context needed to execute it; \
                 they know nothing about your task, so explain everything instead of \
                 referencing it.",
                roles(&self.coworkers)
            ),
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: DelegateWorkArgs = call.args()?;
        consult(
            &self.coworkers,
            &self.out,
            call,
            &args.coworker,
            &args.task,
            &args.context,
        )
        .await
    }
}

pub(super) struct AskQuestion {
    coworkers: Vec<Arc<AgentConfig>>,
    out: SharedWriter,
}

impl AskQuestion {
    pub(super) fn new(coworkers: Vec<Arc<AgentConfig>>, out: SharedWriter) -> Self {
        Self { coworkers, out }
    }
}

#[derive(Deserialize, JsonSchema)]
struct AskQuestionArgs {
    /// the question to ask
    question: String,
    /// everything the coworker needs to know to answer
    context: String,
    /// role of the coworker to ask
    coworker: String,
}

#[async_trait]
impl FunctionalTool for AskQuestion {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<AskQuestionArgs>(
            "ask_question_to_coworker",
            &format!(
                "Ask a specific question to one of the following coworkers: {}. \
                 Give the coworker the question and ALL the context needed to answer it; \
                 they know nothing about your task, so explain everything instead of \
                 referencing it.",
                roles(&self.coworkers)
            ),
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: AskQuestionArgs = call.args()?;
        consult(
            &self.coworkers,
            &self.out,
            call,
            &args.coworker,
            &args.question,
            &args.context,
        )
        .await
    }
}

fn roles(coworkers: &[Arc<AgentConfig>]) -> String {
    coworkers
        .iter()
        .map(|agent| agent.role())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Models often wrap the role in quotes or pad it; match loosely.
fn find_coworker<'a>(coworkers: &'a [Arc<AgentConfig>], name: &str) -> Option<&'a AgentConfig> {
    let wanted = name
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .trim()
        .to_lowercase();

    coworkers
        .iter()
        .find(|agent| agent.role().to_lowercase() == wanted)
        .map(|agent| agent.as_ref())
}

/// The coworker works alone: it gets its own tools but cannot delegate
/// further.
async fn consult(
    coworkers: &[Arc<AgentConfig>],
    out: &SharedWriter,
    call: &ToolCall,
    coworker: &str,
    request: &str,
    context: &str,
) -> Result<Message> {
    let Some(agent) = find_coworker(coworkers, coworker) else {
        tracing::warn!(coworker, "delegation to unknown coworker");
        return Ok(call.reply(format!(
            "Error executing tool. coworker mentioned not found, it must be one of the following options:\n{}",
            coworkers
                .iter()
                .map(|agent| format!("- {}", agent.role()))
                .collect::<Vec<_>>()
                .join("\n")
        )));
    };

    tracing::info!(coworker = agent.role(), "delegating to coworker");
    let answer = agent
        .execute(request, COWORKER_EXPECTED_OUTPUT, context, &[], out)
        .await?;

    Ok(call.reply(answer))
}
