//! Interactive chat loop

use crate::commands::search::Searcher;
use crate::error::Result;
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

/// Typing this (any case) ends the session
pub const EXIT_KEYWORD: &str = "sair";

const SEPARATOR_WIDTH: usize = 50;

/// Reported when input ends before the exit keyword
const END_OF_INPUT: &str = "EOF when reading a line";

/// How a chat session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatExit {
    /// The user typed the exit keyword
    Keyword,
    /// Interrupt signal
    Interrupted,
    /// Input ended or could not be read
    Failed,
}

fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Print the welcome banner
pub fn print_banner(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Bem-vindo ao Chat RAG CLI!")?;
    writeln!(
        out,
        "Digite sua pergunta ou '{}' para encerrar o chat.",
        EXIT_KEYWORD
    )?;
    writeln!(out, "{}", separator())
}

/// Run the question/answer loop until the exit keyword, an interrupt or EOF.
///
/// I/O failures end the session with a message rather than an error.
pub async fn run_chat<R, W, F>(
    searcher: &Searcher,
    input: R,
    out: &mut W,
    interrupt: F,
) -> Result<ChatExit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = ()>,
{
    print_banner(out)?;

    tokio::pin!(interrupt);
    let mut lines = input.lines();

    loop {
        write!(out, "Pergunta: ")?;
        out.flush()?;

        let line = tokio::select! {
            _ = &mut interrupt => None,
            line = lines.next_line() => Some(line),
        };

        let question = match line {
            None => {
                writeln!(out, "\nChat encerrado pelo usuário.")?;
                info!("Chat session interrupted");
                return Ok(ChatExit::Interrupted);
            }
            Some(Ok(Some(question))) => question,
            Some(Ok(None)) => {
                writeln!(out, "\nOcorreu um erro: {}", END_OF_INPUT)?;
                info!("Chat input ended");
                return Ok(ChatExit::Failed);
            }
            Some(Err(e)) => {
                writeln!(out, "\nOcorreu um erro: {}", e)?;
                return Ok(ChatExit::Failed);
            }
        };

        let question = question.trim_end_matches('\r');
        if question.to_lowercase() == EXIT_KEYWORD {
            info!("Chat session ended by user");
            return Ok(ChatExit::Keyword);
        }

        let answer = tokio::select! {
            _ = &mut interrupt => None,
            answer = searcher.search_prompt(question) => Some(answer),
        };

        let Some(answer) = answer else {
            writeln!(out, "\nChat encerrado pelo usuário.")?;
            info!("Chat session interrupted while answering");
            return Ok(ChatExit::Interrupted);
        };

        debug!("Answer has {} chars", answer.len());
        writeln!(out, "\nResposta gerada: {}", answer)?;
        writeln!(out, "{}", separator())?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::search::EMPTY_QUERY_MESSAGE;
    use crate::commands::testing::{EchoChat, FakeEmbedder, MemoryStore};
    use std::sync::Arc;
    use tokio::io::BufReader;

    fn searcher(chat: Arc<EchoChat>) -> Searcher {
        Searcher::new(
            Box::new(FakeEmbedder::new(3)),
            Box::new(MemoryStore::default()),
            Box::new(chat),
            10,
        )
    }

    async fn run(input: &'static str, chat: Arc<EchoChat>) -> (ChatExit, String) {
        let searcher = searcher(chat);
        let mut out = Vec::new();
        let exit = run_chat(
            &searcher,
            BufReader::new(input.as_bytes()),
            &mut out,
            std::future::pending::<()>(),
        )
        .await
        .unwrap();
        (exit, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_exit_keyword_is_case_insensitive() {
        let chat = Arc::new(EchoChat::replying("unused"));
        let (exit, out) = run("SaIr\n", chat.clone()).await;

        assert_eq!(exit, ChatExit::Keyword);
        assert!(out.starts_with(
            "Bem-vindo ao Chat RAG CLI!\nDigite sua pergunta ou 'sair' para encerrar o chat.\n"
        ));
        assert!(out.contains(&"-".repeat(50)));
        assert!(!out.contains("Resposta gerada"));
        assert_eq!(chat.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_answers_then_exits() {
        let chat = Arc::new(EchoChat::replying("O prazo é de 30 dias."));
        let (exit, out) = run("Qual o prazo?\nsair\n", chat.clone()).await;

        assert_eq!(exit, ChatExit::Keyword);
        assert_eq!(chat.prompt_count(), 1);
        assert!(out.contains("Pergunta: \nResposta gerada: O prazo é de 30 dias.\n"));
        assert_eq!(out.matches("Pergunta: ").count(), 2);
    }

    #[tokio::test]
    async fn test_empty_question_gets_prompt_message() {
        let chat = Arc::new(EchoChat::default());
        let (_, out) = run("\nsair\n", chat.clone()).await;

        assert!(out.contains(&format!("Resposta gerada: {}", EMPTY_QUERY_MESSAGE)));
        assert_eq!(chat.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_end_of_input_reports_error() {
        let chat = Arc::new(EchoChat::replying("ok"));
        let (exit, out) = run("pergunta\n", chat).await;

        assert_eq!(exit, ChatExit::Failed);
        assert!(out.contains("Resposta gerada: ok\n"));
        assert!(out.ends_with("Pergunta: \nOcorreu um erro: EOF when reading a line\n"));
        assert!(!out.contains("Chat encerrado"));
    }

    #[tokio::test]
    async fn test_interrupt_ends_session() {
        let searcher = searcher(Arc::new(EchoChat::default()));
        let mut out = Vec::new();
        let (_writer, reader) = tokio::io::duplex(64);

        let exit = run_chat(
            &searcher,
            BufReader::new(reader),
            &mut out,
            std::future::ready(()),
        )
        .await
        .unwrap();

        assert_eq!(exit, ChatExit::Interrupted);
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("Pergunta: \nChat encerrado pelo usuário.\n"));
    }
}
