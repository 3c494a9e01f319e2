//! Command-line client for the Local LLM API.

use std::io::Write as _;

use clap::{CommandFactory, Parser};
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, BufReader};

use local_llm_service::{GenerationResponse, PromptRequest};

#[derive(Debug, Parser)]
#[command(name = "cli", about = "CLI for Local LLM API")]
struct Cli {
    /// The prompt to send to the API
    prompt: Option<String>,

    /// API URL
    #[arg(long, default_value = "http://localhost:8000")]
    url: String,

    /// Start interactive mode
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let client = Client::new();

    if args.interactive {
        run_interactive(&client, &args.url).await?;
    } else if let Some(prompt) = args.prompt.as_deref() {
        send_prompt(&client, prompt, &args.url).await;
    } else {
        Cli::command().print_help()?;
    }

    Ok(())
}

async fn run_interactive(client: &Client, url: &str) -> anyhow::Result<()> {
    println!("Interactive Mode (Ctrl+C to exit)\n");

    // One interrupt listener for the whole session, racing the entire loop.
    // An interrupt lands even while a request is in flight, which matters
    // because a generate call may block for a long time.
    let reader = BufReader::new(tokio::io::stdin());
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        result = read_eval_loop(client, url, reader) => result?,
    }

    println!("\nGoodbye!");
    Ok(())
}

async fn read_eval_loop<R>(client: &Client, url: &str, reader: R) -> anyhow::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        print!("Prompt> ");
        std::io::stdout().flush()?;

        match lines.next_line().await? {
            Some(input) if !input.trim().is_empty() => {
                send_prompt(client, &input, url).await;
            }
            Some(_) => {}
            None => return Ok(()),
        }
    }
}

/// Failures never escape: a refused connection gets its own message, anything
/// else is printed generically.
async fn send_prompt(client: &Client, prompt: &str, url: &str) {
    match request(client, prompt, url).await {
        Ok(text) => {
            println!("\nResponse:");
            println!("{}", render_panel("AI Response", &text));
        }
        Err(err) if err.is_connect() => {
            println!("Error: could not connect to API. Is it running?");
        }
        Err(err) => {
            println!("Error: {err}");
        }
    }
}

async fn request(client: &Client, prompt: &str, url: &str) -> Result<String, reqwest::Error> {
    let response = client
        .post(format!("{url}/generate"))
        .json(&PromptRequest {
            prompt: prompt.to_string(),
        })
        .send()
        .await?
        .error_for_status()?;

    let data: GenerationResponse = response.json().await?;
    Ok(data.response)
}

/// Draws `body` in a titled box, the terminal equivalent of a rich panel.
fn render_panel(title: &str, body: &str) -> String {
    let lines: Vec<&str> = if body.is_empty() {
        vec![""]
    } else {
        body.lines().collect()
    };
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .max(title.chars().count() + 2);

    let mut out = String::new();
    out.push_str(&format!(
        "╭─ {title} {}╮\n",
        "─".repeat(width - title.chars().count() - 1)
    ));
    for line in &lines {
        let pad = width - line.chars().count();
        out.push_str(&format!("│ {line}{} │\n", " ".repeat(pad)));
    }
    out.push_str(&format!("╰{}╯", "─".repeat(width + 2)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_means_help_path() {
        let args = Cli::try_parse_from(["cli"]).unwrap();
        assert!(args.prompt.is_none());
        assert!(!args.interactive);
        assert_eq!(args.url, "http://localhost:8000");
    }

    #[test]
    fn one_shot_prompt_and_url_override() {
        let args = Cli::try_parse_from(["cli", "Hello", "--url", "http://10.0.0.2:9000"]).unwrap();
        assert_eq!(args.prompt.as_deref(), Some("Hello"));
        assert_eq!(args.url, "http://10.0.0.2:9000");
    }

    #[test]
    fn short_interactive_flag() {
        let args = Cli::try_parse_from(["cli", "-i"]).unwrap();
        assert!(args.interactive);
    }

    #[test]
    fn panel_contains_body_verbatim() {
        let panel = render_panel("AI Response", "Hello world");
        assert!(panel.contains("Hello world"));
        assert!(panel.contains("AI Response"));
    }

    #[test]
    fn panel_lines_share_one_width() {
        let panel = render_panel("AI Response", "short\na much longer line of text");
        let widths: Vec<usize> = panel.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{widths:?}");
    }

    #[tokio::test]
    async fn send_prompt_survives_unreachable_url() {
        let client = Client::new();
        // Nothing listens on port 1; must print the connection message and
        // return instead of panicking.
        send_prompt(&client, "Hello", "http://127.0.0.1:1").await;
    }

    #[tokio::test]
    async fn request_classifies_refused_connection() {
        let client = Client::new();
        let err = request(&client, "Hello", "http://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(err.is_connect());
    }

    #[tokio::test]
    async fn request_maps_server_error_status_to_err() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\n\r\n")
                .await;
        });

        let client = Client::new();
        let err = request(&client, "Hello", &format!("http://{addr}"))
            .await
            .unwrap_err();
        assert!(err.is_status());
    }

    #[tokio::test]
    async fn read_eval_loop_skips_blank_lines_and_ends_on_eof() {
        let client = Client::new();
        // Blank lines send nothing, so the dead URL is never contacted; EOF
        // ends the loop cleanly.
        let input: &[u8] = b"\n   \n";
        read_eval_loop(&client, "http://127.0.0.1:1", input)
            .await
            .unwrap();
    }

    #[test]
    fn panel_handles_empty_body() {
        let panel = render_panel("AI Response", "");
        assert!(panel.starts_with('╭'));
        assert!(panel.ends_with('╯'));
    }
}
