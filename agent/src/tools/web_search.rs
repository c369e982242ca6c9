use crate::llm::Message;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
use crate::{Error, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(super) const NAME: &str = "tavily_search_results_json";

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Web search through the Tavily search API.
#[derive(Clone)]
pub struct WebSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_results: usize,
}

impl WebSearch {
    /// A missing key is only reported when the tool is actually invoked.
    pub fn new(api_key: Option<String>, max_results: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: TAVILY_ENDPOINT.to_string(),
            api_key,
            max_results,
        }
    }

    pub async fn search(&self, query: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential("TAVILY_API_KEY".to_string()))?;

        tracing::debug!(query, max_results = self.max_results, "tavily search");

        let response: SearchResponse = self
            .client
            .post(&self.endpoint)
            .json(&SearchRequest {
                api_key,
                query,
                max_results: self.max_results,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        render_results(response, self.max_results)
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize, Serialize)]
struct SearchHit {
    url: String,
    #[serde(default)]
    content: String,
}

fn render_results(response: SearchResponse, max_results: usize) -> Result<String> {
    let hits = response
        .results
        .into_iter()
        .take(max_results)
        .collect::<Vec<_>>();
    Ok(serde_json::to_string(&hits)?)
}

#[derive(Deserialize, JsonSchema)]
struct WebSearchArgs {
    /// search query to look up
    query: String,
}

#[async_trait]
impl FunctionalTool for WebSearch {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<WebSearchArgs>(
            NAME,
            "A search engine optimized for comprehensive, accurate, and trusted results. \
             Useful for when you need to answer questions about current events. \
             Input should be a search query.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: WebSearchArgs = call.args()?;
        let result = self.search(&args.query).await?;
        Ok(call.reply(result))
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchResponse, WebSearch, render_results};
    use crate::tools::testing::serve_once;
    use crate::tools::{FunctionalTool, ToolCall};
    use crate::{Error, Result};

    #[test]
    fn test_render_results_caps_hits() -> Result<()> {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "query": "ai news",
                "results": [
                    {"title": "a", "url": "https://a.example", "content": "first", "score": 0.9},
                    {"title": "b", "url": "https://b.example", "content": "second", "score": 0.5}
                ]
            }"#,
        )?;

        let rendered = render_results(response, 1)?;
        assert_eq!(
            rendered,
            r#"[{"url":"https://a.example","content":"first"}]"#
        );
        Ok(())
    }

    #[test]
    fn test_render_results_without_hits() -> Result<()> {
        let response: SearchResponse = serde_json::from_str(r#"{"query": "nothing"}"#)?;
        assert_eq!(render_results(response, 3)?, "[]");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_key_fails_on_invoke() {
        let mut tool = WebSearch::new(None, 1);
        let call = ToolCall {
            id: "call1".to_string(),
            name: "tavily_search_results_json".to_string(),
            args: r#"{"query":"ai"}"#.to_string(),
        };

        let err = tool.invoke_fn(&call).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential(key) if key == "TAVILY_API_KEY"));
    }

    #[tokio::test]
    async fn test_search_reads_tavily_results() -> Result<()> {
        let mut tool = WebSearch::new(Some("key".to_string()), 1);
        tool.endpoint = serve_once(
            "200 OK",
            r#"{"results":[{"url":"https://a.example","content":"first"},{"url":"https://b.example","content":"second"}]}"#,
        )
        .await?;

        let rendered = tool.search("ai news").await?;
        assert_eq!(
            rendered,
            r#"[{"url":"https://a.example","content":"first"}]"#
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_fails_search() -> Result<()> {
        let mut tool = WebSearch::new(Some("key".to_string()), 1);
        tool.endpoint = serve_once("500 Internal Server Error", "upstream down").await?;

        let err = tool.search("ai news").await.err();
        assert!(matches!(err, Some(Error::HttpError(e)) if e.is_status()));
        Ok(())
    }
}
