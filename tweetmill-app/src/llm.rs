use crate::cli::LlmArgs;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use tweetmill_config::OllamaConfig;
use tweetmill_llm::ollama::OllamaClient;
use tweetmill_llm::stream::try_accumulate;
use tweetmill_llm::traits::{FragmentStream, GenerateRequest, LlmClient, response_text};

pub async fn run<W: Write>(cfg: &OllamaConfig, args: LlmArgs, out: &mut W) -> Result<()> {
    let host = args.host.as_deref().unwrap_or(&cfg.host);
    let client = OllamaClient::new(host)?;

    if args.list_models {
        let models = client.list_models().await?;
        writeln!(out, "Available models:")?;
        for model in models {
            writeln!(out, "- {}", model.name)?;
        }
        return Ok(());
    }

    let prompt = match args.prompt {
        Some(prompt) => prompt,
        None => read_prompt("Enter your prompt: ", &mut io::stdin().lock(), out)?,
    };
    let request = GenerateRequest::new(args.model.as_deref().unwrap_or(&cfg.model), prompt)
        .with_system(args.system.or_else(|| cfg.system.clone()))
        .with_temperature(args.temperature.unwrap_or(cfg.temperature))
        .with_max_tokens(args.max_tokens.unwrap_or(cfg.max_tokens));

    if args.no_stream {
        let reply = client.generate(&request).await?;
        writeln!(out, "{}", response_text(&reply))?;
        return Ok(());
    }

    let full = print_stream(client.generate_stream(&request).await?, out).await?;
    tracing::debug!(chars = full.chars().count(), "llm.stream.done");
    Ok(())
}

/// Echo fragments as they arrive, then end the line.
///
/// A failed write ends the drain; the stream is not read any further.
async fn print_stream<W: Write>(stream: FragmentStream, out: &mut W) -> Result<String> {
    let full = try_accumulate(stream, |fragment| -> Result<()> {
        out.write_all(fragment.as_bytes())?;
        out.flush()?;
        Ok(())
    })
    .await;
    let newline = writeln!(out);
    let full = full?;
    newline?;
    Ok(full)
}

fn read_prompt(label: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<String> {
    write!(output, "{label}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read prompt")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, stream};
    use tweetmill_llm::traits::LlmError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fragments(parts: &[&str]) -> FragmentStream {
        let owned: Vec<tweetmill_llm::traits::Result<String>> =
            parts.iter().map(|p| Ok(p.to_string())).collect();
        Box::pin(stream::iter(owned))
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

    #[tokio::test]
    async fn streamed_text_ends_with_one_newline() {
        let mut out = Vec::new();
        let full = print_stream(fragments(&["Hel", "lo"]), &mut out).await.unwrap();
        assert_eq!(full, "Hello");
        assert_eq!(String::from_utf8(out).unwrap(), "Hello\n");
    }

    #[tokio::test]
    async fn empty_stream_still_ends_the_line() {
        let mut out = Vec::new();
        print_stream(fragments(&[]), &mut out).await.unwrap();
        assert_eq!(out, b"\n");
    }

    #[tokio::test]
    async fn closed_stdout_stops_reading_the_stream() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = reads.clone();
        let counted: FragmentStream = Box::pin(stream::iter(["a", "b", "c"]).map(move |p| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LlmError>(p.to_string())
        }));

        let err = print_stream(counted, &mut ClosedPipe).await.unwrap_err();
        let io_err = err.downcast_ref::<io::Error>().expect("io error");
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prompt_is_read_without_line_ending() {
        let mut input = io::Cursor::new("Summarise this tweet\r\nignored\n");
        let mut shown = Vec::new();
        let prompt = read_prompt("Enter your prompt: ", &mut input, &mut shown).unwrap();
        assert_eq!(prompt, "Summarise this tweet");
        assert_eq!(shown, b"Enter your prompt: ");
    }

    #[test]
    fn closed_stdin_gives_an_empty_prompt() {
        let mut input = io::Cursor::new("");
        let prompt = read_prompt("> ", &mut input, &mut Vec::new()).unwrap();
        assert_eq!(prompt, "");
    }
}
