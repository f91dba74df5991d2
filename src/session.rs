//! Line-oriented request session
//!
//! Stands in for a chat transport: each input line is one request, each
//! reply is written back followed by a blank line. Requests are handled
//! strictly one at a time, in arrival order.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::commands::{render_menu, Dispatcher, Reply};
use crate::error::{Error, Result};

const NOT_TEXT: &str = "Request is not valid UTF-8 text.";

/// Serve requests until the reader hits EOF. Returns the number handled.
///
/// A line that is not UTF-8 gets an error reply and the session goes on.
pub async fn run_session<R, W>(
    dispatcher: &Dispatcher,
    mut reader: R,
    mut writer: W,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    let mut handled = 0u64;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| Error::Internal(format!("Failed to read request: {}", e)))?;
        if read == 0 {
            break;
        }

        let reply = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let reply = dispatcher.handle_line(line);
                debug!(request = line, show_menu = reply.show_menu, "Request handled");
                reply
            }
            Err(e) => {
                warn!(bytes = buf.len(), error = %e, "Request rejected");
                Reply {
                    text: NOT_TEXT.to_string(),
                    show_menu: false,
                }
            }
        };
        handled += 1;

        let mut out = reply.text;
        if reply.show_menu {
            out.push('\n');
            out.push_str(&render_menu());
        }
        out.push_str("\n\n");

        write_reply(&mut writer, &out)
            .await
            .map_err(|e| Error::Internal(format!("Failed to write reply: {}", e)))?;
    }

    Ok(handled)
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, out: &str) -> std::io::Result<()> {
    writer.write_all(out.as_bytes()).await?;
    writer.flush().await
}

/// Serve stdin/stdout until EOF or Ctrl+C
pub async fn serve_stdio(dispatcher: Dispatcher) -> Result<()> {
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    info!(
        env_file = %dispatcher.store().path().display(),
        records = dispatcher.store().len(),
        "Session started"
    );
    if dispatcher.store().is_empty() {
        warn!("Access list is empty, no user is allowed yet");
    }

    tokio::select! {
        result = run_session(&dispatcher, reader, writer) => {
            let handled = result?;
            info!(handled, "Input closed, session finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AccessStore, BudgetPolicy, EnvKeys};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn dispatcher(tmp: &TempDir) -> Dispatcher {
        let path = tmp.path().join(".env");
        fs::write(&path, "MY_TELEGRAM_BOT_TOKEN=abc\n").unwrap();
        let store = AccessStore::open(&path, EnvKeys::default(), BudgetPolicy::Opaque).unwrap();
        Dispatcher::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_session_processes_lines_in_order() {
        let tmp = TempDir::new().unwrap();
        let d = dispatcher(&tmp);

        let input: &[u8] = b"/adduser 42 10\n\n/adduser 42 5\n/deleteuser 9\n";
        let mut output = Vec::new();
        let handled = run_session(&d, input, &mut output).await.unwrap();

        assert_eq!(handled, 3);
        let text = String::from_utf8(output).unwrap();
        let replies: Vec<&str> = text.split("\n\n").filter(|s| !s.is_empty()).collect();
        assert_eq!(replies.len(), 3);
        assert!(replies[0].starts_with("User added successfully.\nPlease choose:"));
        assert!(replies[1].starts_with("User already exists."));
        assert!(replies[2].starts_with("User not found."));

        assert_eq!(
            fs::read_to_string(tmp.path().join(".env")).unwrap(),
            "MY_TELEGRAM_BOT_TOKEN=abc\nALLOWED_TELEGRAM_USER_IDS=42\nUSER_BUDGETS=10\n"
        );
    }

    #[tokio::test]
    async fn test_session_usage_reply_has_no_menu() {
        let tmp = TempDir::new().unwrap();
        let d = dispatcher(&tmp);

        let input: &[u8] = b"/adduser 1\n";
        let mut output = Vec::new();
        run_session(&d, input, &mut output).await.unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Usage: /adduser <user_id> <budget>\n\n"
        );
        assert!(d.store().is_empty());
    }

    #[tokio::test]
    async fn test_session_survives_non_utf8_line() {
        let tmp = TempDir::new().unwrap();
        let d = dispatcher(&tmp);

        let input: &[u8] = b"/adduser \xff 1\n/adduser 42 10\n";
        let mut output = Vec::new();
        let handled = run_session(&d, input, &mut output).await.unwrap();

        assert_eq!(handled, 2);
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("Request is not valid UTF-8 text.\n\n"));
        assert!(text.contains("User added successfully."));

        let records = d.store().list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identity, "42");
    }

    #[tokio::test]
    async fn test_session_last_line_without_newline() {
        let tmp = TempDir::new().unwrap();
        let d = dispatcher(&tmp);

        let input: &[u8] = b"/adduser 7 3";
        let mut output = Vec::new();
        run_session(&d, input, &mut output).await.unwrap();

        assert_eq!(d.store().len(), 1);
    }
}
