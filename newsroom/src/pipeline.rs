use agent::llm::LLM;
use agent::tools::Builtin;
use agent::{AgentConfig, Crew, Result, TaskConfig};
use std::sync::Arc;

const ONLINE_RESEARCHER: &str = include_str!("prompts/agents/online_researcher.md");
const BLOG_MANAGER: &str = include_str!("prompts/agents/blog_manager.md");
const SOCIAL_MEDIA_MANAGER: &str = include_str!("prompts/agents/social_media_manager.md");
const CONTENT_MARKETING_MANAGER: &str =
    include_str!("prompts/agents/content_marketing_manager.md");
const SPANISH_TRANSLATOR: &str = include_str!("prompts/agents/spanish_translator.md");

const RESEARCH_TASK: &str = include_str!("prompts/tasks/research.md");
const BLOG_POST_TASK: &str = include_str!("prompts/tasks/blog_post.md");
const TWEET_TASK: &str = include_str!("prompts/tasks/tweet.md");
const REVIEW_TASK: &str = include_str!("prompts/tasks/review.md");
const TRANSLATION_TASK: &str = include_str!("prompts/tasks/translation.md");

/// research -> blog post -> tweet -> reviewed compilation -> Spanish translation.
///
/// Each task only sees the earlier outputs through its prompt context; the
/// order of `tasks` below is what makes the chain work.
pub fn newsroom(llm: Arc<dyn LLM + Send + Sync>, tools: Vec<Builtin>) -> Result<Crew> {
    let staff = |role: &str, goal: &str, backstory: &str| {
        Arc::new(
            AgentConfig::new(role, goal, backstory.trim_end(), llm.clone())
                .verbose(true)
                .allow_delegation(true)
                .tools(tools.clone()),
        )
    };

    let online_researcher = staff(
        "Online Researcher",
        "Conduct focused and efficient online research",
        ONLINE_RESEARCHER,
    );
    let blog_manager = staff(
        "Blog Manager",
        "Create concise, impactful blog content",
        BLOG_MANAGER,
    );
    let social_media_manager = staff(
        "Social Media Manager",
        "Create viral-worthy tweets",
        SOCIAL_MEDIA_MANAGER,
    );
    let content_marketing_manager = staff(
        "Content Marketing Manager",
        "Ensure quality and consistency across all content",
        CONTENT_MARKETING_MANAGER,
    );
    // last in line, nobody left to hand work to
    let spanish_translator = Arc::new(
        AgentConfig::new(
            "Spanish Translator",
            "Provide accurate Spanish (Spain) translations while maintaining tone and context",
            SPANISH_TRANSLATOR.trim_end(),
            llm.clone(),
        )
        .verbose(true)
        .allow_delegation(false)
        .tools(tools.clone()),
    );

    let tasks = vec![
        TaskConfig::new(
            RESEARCH_TASK.trim_end(),
            "3-point AI report with sources",
            &online_researcher,
        ),
        TaskConfig::new(
            BLOG_POST_TASK.trim_end(),
            "300-word blog post",
            &blog_manager,
        ),
        TaskConfig::new(
            TWEET_TASK.trim_end(),
            "High-impact tweet",
            &social_media_manager,
        ),
        TaskConfig::new(
            REVIEW_TASK.trim_end(),
            "Complete report with all outputs",
            &content_marketing_manager,
        ),
        TaskConfig::new(
            TRANSLATION_TASK.trim_end(),
            "Complete report in Spanish (Spain)",
            &spanish_translator,
        ),
    ];

    let agents = vec![
        online_researcher,
        blog_manager,
        social_media_manager,
        content_marketing_manager,
        spanish_translator,
    ];

    Ok(Crew::new(agents, tasks)?.verbose(true))
}

#[cfg(test)]
mod tests {
    use super::newsroom;
    use agent::llm::{CompletionRequest, CompletionResponse, LLM};
    use agent::tools::{Builtin, FetchPage, WebSearch};
    use agent::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Offline;

    #[async_trait]
    impl LLM for Offline {
        async fn completion<'a>(&self, _: CompletionRequest<'a>) -> Result<CompletionResponse> {
            Err(Error::LLMResponseError("offline".to_string()))
        }
    }

    fn tools() -> Vec<Builtin> {
        vec![
            Builtin::WebSearch(WebSearch::new(None, 1)),
            Builtin::FetchPage(FetchPage::new()),
        ]
    }

    #[test]
    fn test_five_agents_in_pipeline_order() -> Result<()> {
        let crew = newsroom(Arc::new(Offline), tools())?;

        let roles = crew
            .agents()
            .iter()
            .map(|agent| agent.role())
            .collect::<Vec<_>>();
        assert_eq!(
            roles,
            [
                "Online Researcher",
                "Blog Manager",
                "Social Media Manager",
                "Content Marketing Manager",
                "Spanish Translator",
            ]
        );

        assert_eq!(crew.agents()[2].goal(), "Create viral-worthy tweets");

        for agent in crew.agents() {
            assert!(agent.is_verbose());
            assert_eq!(
                agent.tool_names(),
                ["tavily_search_results_json", "process_search_tool"]
            );
            assert_eq!(
                agent.allows_delegation(),
                agent.role() != "Spanish Translator"
            );
            assert!(!agent.backstory().ends_with('\n'));
        }

        Ok(())
    }

    #[test]
    fn test_each_task_bound_to_its_agent() -> Result<()> {
        let crew = newsroom(Arc::new(Offline), tools())?;
        let tasks = crew.tasks();
        assert_eq!(tasks.len(), 5);

        for (task, agent) in tasks.iter().zip(crew.agents()) {
            assert!(Arc::ptr_eq(task.agent(), agent));
        }

        let expected = tasks
            .iter()
            .map(|task| task.expected_output())
            .collect::<Vec<_>>();
        assert_eq!(
            expected,
            [
                "3-point AI report with sources",
                "300-word blog post",
                "High-impact tweet",
                "Complete report with all outputs",
                "Complete report in Spanish (Spain)",
            ]
        );

        assert!(tasks[0].description().starts_with("Research 3 key AI developments"));
        assert!(tasks[3].description().contains("\"QUALITY VERIFICATION:\""));
        assert!(tasks[4].description().contains("HALLAZGOS DE LA INVESTIGACIÓN:"));

        Ok(())
    }
}
