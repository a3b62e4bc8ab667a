//! Portfolio assistant chat

use anyhow::Result;

use folio_core::Folio;

use super::{prompt_line, ready};
use crate::output::Output;

/// Answer one question, or chat until an empty line or end of input
pub async fn run(app: &Folio, question: Option<String>, output: &Output) -> Result<()> {
    let assistant = app.assistant();
    ready(app).await?;

    if let Some(question) = question {
        // Latest snapshot at call time
        let answer = assistant.ask(&question, &app.sync.snapshot()).await;
        output.text("answer", &answer);
        return Ok(());
    }

    output.message("Ask me anything about this portfolio (empty line to quit).");
    while let Some(question) = prompt_line("> ")? {
        if question.is_empty() {
            break;
        }
        let answer = assistant.ask(&question, &app.sync.snapshot()).await;
        output.text("answer", &answer);
    }
    Ok(())
}
