use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use ask_domain::{Error, HistoryEntry, Message, Role, recent_messages};
use ask_markdown_stream::{StreamConfig, Theme};
use ask_provider::ChatClient;
use chrono::{DateTime, Duration, Utc};
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::cli::{Cli, TopLevelCommand};
use crate::env::Environment;
use crate::history::HistoryStore;
use crate::stream_renderer::{ResponseWriter, term_width};

const PROGRAM: &str = "ask";

pub struct App {
    cli: Cli,
    env: Environment,
}

impl App {
    pub fn init(cli: Cli) -> anyhow::Result<Self> {
        let env = Environment::from_env(cli.config_dir.clone(), cli.model.clone())?;
        std::fs::create_dir_all(env.config_dir()).with_context(|| {
            format!("Failed to create config directory {}", env.config_dir().display())
        })?;
        debug!(config_dir = %env.config_dir().display(), model = %env.model, "Resolved environment");
        Ok(Self { cli, env })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self.cli.subcommands.clone() {
            Some(TopLevelCommand::Replay { count }) => self.replay(count).await,
            Some(TopLevelCommand::Render { path, chunk_size }) => self.render(path, chunk_size).await,
            None => self.ask().await,
        }
    }

    fn render_config(&self) -> StreamConfig {
        let stdout = io::stdout();
        let ansi = stdout.is_terminal() && colored::control::SHOULD_COLORIZE.should_colorize();
        StreamConfig::default()
            .width(self.cli.width.unwrap_or_else(term_width))
            .show_markdown(!self.cli.hide_markdown)
            .ansi(ansi)
            .theme(if ansi { Theme::detect() } else { Theme::dark() })
    }

    async fn ask(&self) -> anyhow::Result<()> {
        let prompt = read_prompt(&self.cli.prompt)?;
        let api_key = load_api_key(&self.env).await?;
        let initial = load_initial_prompt(&self.env.prompt_path()).await?;
        let store = HistoryStore::new(self.env.history_path());
        let history = store.load().await?;

        let asked_at = Utc::now();
        let messages =
            build_messages(initial, &history, asked_at, self.env.history_window, &prompt);
        let client = ChatClient::new(&self.env.base_url, api_key)?;

        let mut writer = ResponseWriter::new(io::stdout(), self.render_config());
        let result = if self.cli.no_stream {
            self.complete(&client, messages, &mut writer).await
        } else {
            self.stream(&client, messages, &mut writer).await
        };
        finish_response(&mut writer, result)?;

        let (answer, _) = writer.into_parts();
        store
            .append(
                vec![
                    HistoryEntry::new(asked_at, Message::user(prompt)),
                    HistoryEntry::new(Utc::now(), Message::assistant(answer)),
                ],
                self.env.max_history,
            )
            .await
    }

    async fn stream<W: Write>(
        &self,
        client: &ChatClient,
        messages: Vec<Message>,
        writer: &mut ResponseWriter<W>,
    ) -> anyhow::Result<()> {
        let mut stream = client.stream(&self.env.model, messages).await?;
        while let Some(chunk) = stream.next().await {
            writer.write(&chunk?)?;
        }
        Ok(())
    }

    async fn complete<W: Write>(
        &self,
        client: &ChatClient,
        messages: Vec<Message>,
        writer: &mut ResponseWriter<W>,
    ) -> anyhow::Result<()> {
        let answer = client.complete(&self.env.model, messages).await?;
        writer.write(&answer)?;
        Ok(())
    }

    async fn replay(&self, count: usize) -> anyhow::Result<()> {
        let history = HistoryStore::new(self.env.history_path()).load().await?;
        let answers = last_answers(&history, count);
        debug!(count = answers.len(), "Replaying answers");

        for (index, answer) in answers.iter().enumerate() {
            if index > 0 {
                println!();
            }
            let mut writer = ResponseWriter::new(io::stdout(), self.render_config());
            writer.write(answer)?;
            writer.finish()?;
        }
        Ok(())
    }

    async fn render(&self, path: Option<PathBuf>, chunk_size: usize) -> anyhow::Result<()> {
        let content = match path {
            Some(path) => tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            None => {
                let mut content = String::new();
                io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read stdin")?;
                content
            }
        };

        let mut writer = ResponseWriter::new(io::stdout(), self.render_config());
        for chunk in chunks(&content, chunk_size) {
            writer.write(&chunk)?;
        }
        writer.finish()?;
        Ok(())
    }
}

/// Ends the rendered answer. When the answer itself failed, that error wins
/// and a failure to finish the terminal output is only logged.
fn finish_response<W: Write>(
    writer: &mut ResponseWriter<W>,
    result: anyhow::Result<()>,
) -> anyhow::Result<()> {
    let finished = writer.finish();
    if let Err(error) = result {
        if let Err(finish_error) = finished {
            warn!(error = %finish_error, "Failed to finish terminal output");
        }
        return Err(error);
    }
    finished.context("Failed to write the answer")
}

/// Joins the prompt words, falling back to piped stdin.
fn read_prompt(words: &[String]) -> anyhow::Result<String> {
    let mut prompt = words.join(" ");
    if prompt.trim().is_empty() && !io::stdin().is_terminal() {
        io::stdin()
            .read_to_string(&mut prompt)
            .context("Failed to read prompt from stdin")?;
    }
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(Error::EmptyPrompt { program: PROGRAM.to_string() }.into());
    }
    Ok(prompt.to_string())
}

async fn load_api_key(env: &Environment) -> anyhow::Result<String> {
    if let Some(key) = &env.api_key {
        return Ok(key.clone());
    }
    let path = env.api_key_path();
    let key = match tokio::fs::read_to_string(&path).await {
        Ok(key) => key.trim().to_string(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => String::new(),
        Err(error) => {
            return Err(error).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    if key.is_empty() {
        return Err(Error::MissingApiKey { path }.into());
    }
    Ok(key)
}

/// Messages sent before the conversation. A missing file means none.
async fn load_initial_prompt(path: &Path) -> anyhow::Result<Vec<Message>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse initial prompt {}", path.display())),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(error) => Err(error).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn build_messages(
    initial: Vec<Message>,
    history: &[HistoryEntry],
    now: DateTime<Utc>,
    window: Duration,
    prompt: &str,
) -> Vec<Message> {
    let mut messages = initial;
    messages.extend(recent_messages(history, now, window));
    messages.push(Message::user(prompt));
    messages
}

/// The last `count` assistant answers, oldest first.
fn last_answers(history: &[HistoryEntry], count: usize) -> Vec<String> {
    let answers: Vec<String> = history
        .iter()
        .filter(|entry| entry.message.role == Role::Assistant)
        .map(|entry| entry.message.content.clone())
        .collect();
    let skip = answers.len().saturating_sub(count);
    answers.into_iter().skip(skip).collect()
}

/// Splits `text` into pieces of `size` characters.
fn chunks(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn env(dir: &Path, api_key: Option<&str>) -> Environment {
        Environment::resolve(Some(dir.to_path_buf()), None, None, |key| match key {
            "OPENAI_API_KEY" => api_key.map(str::to_string),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_build_messages_order() {
        let history = vec![
            HistoryEntry::new(at(0), Message::user("stale")),
            HistoryEntry::new(at(50), Message::user("earlier")),
            HistoryEntry::new(at(51), Message::assistant("reply")),
        ];

        let actual = build_messages(
            vec![Message::system("Be brief.")],
            &history,
            at(55),
            Duration::minutes(15),
            "next",
        );
        let expected = vec![
            Message::system("Be brief."),
            Message::user("earlier"),
            Message::assistant("reply"),
            Message::user("next"),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_last_answers() {
        let history = vec![
            HistoryEntry::new(at(0), Message::user("q1")),
            HistoryEntry::new(at(1), Message::assistant("a1")),
            HistoryEntry::new(at(2), Message::user("q2")),
            HistoryEntry::new(at(3), Message::assistant("a2")),
            HistoryEntry::new(at(4), Message::assistant("a3")),
        ];

        assert_eq!(last_answers(&history, 2), vec!["a2", "a3"]);
        assert_eq!(last_answers(&history, 50), vec!["a1", "a2", "a3"]);
        assert!(last_answers(&history, 0).is_empty());
    }

    #[test]
    fn test_chunks_split_on_characters() {
        assert_eq!(chunks("héllo wörld", 4), vec!["héll", "o wö", "rld"]);
        assert_eq!(chunks("abc", 0), vec!["a", "b", "c"]);
        assert!(chunks("", 3).is_empty());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn closed_writer() -> ResponseWriter<ClosedPipe> {
        ResponseWriter::new(ClosedPipe, StreamConfig::default().ansi(false))
    }

    #[test]
    fn test_answer_error_wins_over_output_error() {
        let mut fixture = closed_writer();

        let actual = finish_response(&mut fixture, Err(Error::NoChoices.into())).unwrap_err();

        assert!(matches!(actual.downcast_ref::<Error>(), Some(Error::NoChoices)));
    }

    #[test]
    fn test_output_error_is_reported_after_success() {
        let mut fixture = closed_writer();

        let actual = finish_response(&mut fixture, Ok(())).unwrap_err();

        let error = actual.downcast_ref::<io::Error>().map(io::Error::kind);
        assert_eq!(error, Some(io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_prompt_words_are_joined() {
        let fixture = vec!["what".to_string(), "is".to_string(), "rust?".to_string()];

        assert_eq!(read_prompt(&fixture).unwrap(), "what is rust?");
    }

    #[tokio::test]
    async fn test_api_key_from_environment_wins() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join("apikey.txt"), "sk-file").await?;

        let actual = load_api_key(&env(dir.path(), Some("sk-env"))).await?;

        assert_eq!(actual, "sk-env");
        Ok(())
    }

    #[tokio::test]
    async fn test_api_key_from_file_is_trimmed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join("apikey.txt"), "  sk-file\n").await?;

        let actual = load_api_key(&env(dir.path(), None)).await?;

        assert_eq!(actual, "sk-file");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_api_key() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;

        let actual = load_api_key(&env(dir.path(), None)).await.unwrap_err();

        let expected = dir.path().join("apikey.txt");
        assert!(matches!(
            actual.downcast_ref::<Error>(),
            Some(Error::MissingApiKey { path }) if *path == expected
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_initial_prompt() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("prompt.json");

        assert!(load_initial_prompt(&path).await?.is_empty());

        tokio::fs::write(&path, r#"[{"role":"system","content":"Answer in markdown."}]"#).await?;
        let actual = load_initial_prompt(&path).await?;
        assert_eq!(actual, vec![Message::system("Answer in markdown.")]);

        tokio::fs::write(&path, "{").await?;
        assert!(load_initial_prompt(&path).await.is_err());
        Ok(())
    }
}
