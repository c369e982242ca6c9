use crate::Result;
use crate::llm::Message;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use scraper::Html;
use serde::Deserialize;

pub(super) const NAME: &str = "process_search_tool";

const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Downloads a page and returns its visible text.
#[derive(Clone)]
pub struct FetchPage {
    client: reqwest::Client,
}

impl FetchPage {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Only transport failures are errors; a 404 page still has text worth
    /// handing back to the model.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        tracing::debug!(url, status = %response.status(), "fetched page");

        let body = response.text().await?;
        Ok(page_text(&body))
    }
}

impl Default for FetchPage {
    fn default() -> Self {
        Self::new()
    }
}

pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for node in document.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            text.push_str(chunk);
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize, JsonSchema)]
struct FetchPageArgs {
    /// address of the page to read
    url: String,
}

#[async_trait]
impl FunctionalTool for FetchPage {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<FetchPageArgs>(
            NAME,
            "Used to process content found on the internet. \
             Downloads the page at the given url and returns its text.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: FetchPageArgs = call.args()?;
        let text = self.fetch(&args.url).await?;
        Ok(call.reply(text))
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchPage, page_text};
    use crate::{Error, Result};
    use crate::tools::testing::{closed_url, serve_once};

    #[test]
    fn test_page_text_skips_scripts_and_styles() {
        let html = r#"<!DOCTYPE html>
<html>
  <head>
    <title>AI news</title>
    <style>body { color: red; }</style>
    <script>var tracking = 1;</script>
  </head>
  <body>
    <h1>Breakthrough</h1>
    <p>Models got <b>faster</b>.</p>
    <noscript>enable javascript</noscript>
  </body>
</html>"#;

        assert_eq!(page_text(html), "AI news\nBreakthrough\nModels got faster.");
    }

    #[test]
    fn test_page_text_of_plain_text() {
        assert_eq!(page_text("just words\n\n  more words  "), "just words\nmore words");
    }

    #[tokio::test]
    async fn test_error_status_still_returns_text() -> Result<()> {
        let url = serve_once(
            "404 Not Found",
            "<html><body>\n<h1>Not Found</h1>\n<p>no such story</p>\n</body></html>",
        )
        .await?;

        let text = FetchPage::new().fetch(&url).await?;
        assert_eq!(text, "Not Found\nno such story");
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() -> Result<()> {
        let url = closed_url().await?;

        let err = FetchPage::new().fetch(&url).await.err();
        assert!(matches!(err, Some(Error::HttpError(_))));
        Ok(())
    }
}
