use crate::Result;
use crate::callbacks::Callback;
use crate::llm::Message;
use async_trait::async_trait;
use std::io::Write;

/// Verbose transcript of an agent run. Each step prints only the messages
/// added since the previous step.
pub struct MessageLogger<W: Write + Send> {
    last_hashes: Vec<u64>,
    writer: W,
    step: u32,
}

impl<W: Write + Send> MessageLogger<W> {
    pub fn new(name: &str, mut writer: W) -> Result<Box<Self>> {
        write!(writer, "## {}\n\n", name)?;

        Ok(Box::new(Self {
            last_hashes: Vec::new(),
            writer,
            step: 0,
        }))
    }

    fn display_messages(&mut self, messages: &[Message]) -> Result<()> {
        write!(self.writer, "### Step {}\n\n", self.step)?;

        messages
            .iter()
            .try_for_each(|m| write!(self.writer, "{}", m))?;

        write!(self.writer, "---\n\n")?;

        Ok(())
    }

    fn display_history_cleared(&mut self) -> Result<()> {
        write!(self.writer, "## [HISTORY CLEARED]\n\n")?;
        Ok(())
    }

    fn prefix_match_len(&self, new_hashes: &[u64]) -> usize {
        new_hashes
            .iter()
            .zip(self.last_hashes.iter())
            .take_while(|&(a, b)| a == b)
            .count()
    }
}

#[async_trait]
impl<W: Write + Send> Callback for MessageLogger<W> {
    async fn call(&mut self, messages: Vec<Message>) -> Result<Vec<Message>> {
        let new_hashes = messages.iter().map(Message::get_hash).collect::<Vec<_>>();

        if self.prefix_match_len(&new_hashes) != self.last_hashes.len() {
            self.display_history_cleared()?;
            self.display_messages(&messages)?;
        } else {
            self.display_messages(&messages[self.last_hashes.len()..])?;
        }

        self.writer.flush()?;

        self.step += 1;
        self.last_hashes = new_hashes;

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::MessageLogger;
    use crate::Result;
    use crate::callbacks::Callback;
    use crate::llm::Message;
    use crate::sink::MemorySink;

    #[tokio::test]
    async fn test_logger_prints_only_new_messages() -> Result<()> {
        let out = MemorySink::new();
        let mut logger = MessageLogger::new("Blog Manager", out.clone())?;

        let mut history = vec![
            Message::System("persona".to_string()),
            Message::User("write a post".to_string()),
        ];
        history = logger.call(history).await?;

        history.push(Message::Assistant("first draft".to_string(), vec![]));
        logger.call(history).await?;

        let text = out.contents();
        assert!(text.starts_with("## Blog Manager\n\n### Step 0\n\n**System**"));
        assert!(text.contains("### Step 1\n\n**Assistant**\n\nfirst draft"));
        assert_eq!(text.matches("write a post").count(), 1);
        assert!(!text.contains("HISTORY CLEARED"));

        Ok(())
    }

    #[tokio::test]
    async fn test_logger_reprints_rewritten_history() -> Result<()> {
        let out = MemorySink::new();
        let mut logger = MessageLogger::new("Researcher", out.clone())?;

        logger
            .call(vec![
                Message::User("task".to_string()),
                Message::Assistant("long notes".to_string(), vec![]),
            ])
            .await?;
        logger
            .call(vec![
                Message::User("task".to_string()),
                Message::Assistant("summary".to_string(), vec![]),
            ])
            .await?;

        let text = out.contents();
        assert!(text.contains("## [HISTORY CLEARED]\n\n### Step 1"));
        assert_eq!(text.matches("**User**").count(), 2);

        Ok(())
    }
}
