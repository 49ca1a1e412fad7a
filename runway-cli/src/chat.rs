use anyhow::Result;
use runway_core::filter_rows;
use runway_insight::{CachedCompletion, ChatContext, CompletionService, PromptBuilder, advise};
use std::io::{self, BufRead, Write};

use crate::session::Session;

enum Input<'a> {
    Quit,
    Help,
    /// Cached summary insight
    Insight,
    /// Drop cached responses, then re-ask for the insight
    Refresh,
    Question(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/quit" | "/exit" | "/q" => Input::Quit,
        "/help" | "/?" => Input::Help,
        "/insight" => Input::Insight,
        "/refresh" => Input::Refresh,
        q => Input::Question(q),
    }
}

const HELP: &str = "Ask anything about your transactions.\n\
  /insight   summary insight (cached)\n\
  /refresh   clear cached answers and regenerate the insight\n\
  /quit      leave";

/// Line-based chat over the filtered data. The summary insight goes through
/// the cache; questions bypass it so every answer is fresh.
pub fn run_chat<C: CompletionService>(
    session: &Session,
    builder: &PromptBuilder,
    cached: &CachedCompletion<C>,
) -> Result<()> {
    let rows = filter_rows(&session.transactions, &session.filter);
    let context = ChatContext::new(
        session.balance.amount(),
        &session.aggregate,
        session.savings_goal,
        &rows,
        session.config.insight.preview_rows,
    );

    println!("Chat with Finance AI ({})", session.describe_range());
    println!("{HELP}\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("you> ");
        io::stdout().flush().ok();
        let Some(line) = lines.next() else { break };
        let line = line?;

        let answer = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => HELP.to_string(),
            Input::Insight => advise(cached, &builder.summary_request(&session.aggregate, session.balance.amount())),
            Input::Refresh => {
                cached.invalidate();
                advise(cached, &builder.summary_request(&session.aggregate, session.balance.amount()))
            }
            Input::Question(q) => advise(cached.inner(), &builder.chat_request(&context, q)),
        };
        println!("ai> {}\n", answer);
    }

    Ok(())
}
