//! Interactive, line-driven browse loop.
//!
//! Bare lines are treated as typed search text and go through the session's
//! debouncer. Slash commands act immediately.

use std::sync::Arc;

use anyhow::Result;
use storedb_core::session::Change;
use storedb_core::{BrowseOptions, BrowseSession, Catalogue, Scope, SortField, ViewState};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

pub const HELP: &str = "\
Type text to search, or use a command:
  /search <text>   apply a search at once (no text clears it)
  /cat [slug]      toggle a category filter (no slug clears them)
  /sort <field>    sort by title, price or stock; repeat to flip the order
  /page <n>        jump to page n
  /retry           refetch after a failure
  /help            show this help
  /quit            leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Type(String),
    Search(String),
    ToggleCategory(String),
    ClearCategories,
    Sort(SortField),
    Page(usize),
    Retry,
    Help,
    Quit,
}

/// Parse one input line.
///
/// # Errors
///
/// Returns a message for unknown commands and malformed arguments.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Type(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "search" | "s" => Ok(Command::Search(arg.to_string())),
        "cat" | "c" if arg.is_empty() => Ok(Command::ClearCategories),
        "cat" | "c" => Ok(Command::ToggleCategory(arg.to_string())),
        "sort" => arg.parse::<SortField>().map(Command::Sort).map_err(|e| e.to_string()),
        "page" | "p" => match arg.parse::<usize>() {
            Ok(page) if page >= 1 => Ok(Command::Page(page)),
            _ => Err(format!("invalid page: {arg:?}")),
        },
        "retry" | "r" => Ok(Command::Retry),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: /{other} (try /help)")),
    }
}

/// Apply a filter-changing command. Returns `false` for commands the loop handles itself.
pub fn apply(session: &mut BrowseSession, command: Command) -> bool {
    match command {
        Command::Type(text) => session.input_search(&text),
        Command::Search(term) => session.set_search_now(&term),
        Command::ToggleCategory(slug) => session.toggle_category(&slug),
        Command::ClearCategories => session.set_categories(Vec::<String>::new()),
        Command::Sort(field) => session.sort_by(field),
        Command::Page(page) => session.set_page(page),
        Command::Retry | Command::Help | Command::Quit => return false,
    }
    true
}

/// Remembers the last screen so unchanged views are not printed twice.
#[derive(Default)]
pub struct Screen {
    last: Option<ViewState>,
}

impl Screen {
    /// Rendered text for the session's current view, if it differs from the last one shown.
    pub fn next(&mut self, session: &mut BrowseSession) -> Option<String> {
        let view = session.view();
        if self.last.as_ref() == Some(&view) {
            return None;
        }
        let text = render::view(&view, session.filter(), session.options().page_size);
        self.last = Some(view);
        Some(text)
    }
}

enum Event {
    Line(Option<String>),
    Changed(Change),
}

/// Run the loop on stdin until `/quit` or end of input.
pub async fn run(catalogue: Arc<Catalogue>, scope: Scope, options: BrowseOptions) -> Result<()> {
    let mut session = BrowseSession::new(catalogue, scope, options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut screen = Screen::default();

    println!("{HELP}\n");
    if let Some(text) = screen.next(&mut session) {
        print!("{text}");
    }

    loop {
        let event = tokio::select! {
            line = lines.next_line() => Event::Line(line?),
            change = session.changed() => Event::Changed(change),
        };

        match event {
            Event::Line(None) | Event::Changed(Change::Closed) => break,
            Event::Changed(_) => {}
            Event::Line(Some(line)) => match parse(&line) {
                Ok(Command::Quit) => break,
                Ok(Command::Help) => println!("{HELP}"),
                Ok(Command::Retry) => {
                    if let Err(err) = session.retry().await {
                        eprintln!("retry failed: {err}");
                    }
                }
                Ok(command) => {
                    apply(&mut session, command);
                }
                Err(message) => eprintln!("{message}"),
            },
        }

        if let Some(text) = screen.next(&mut session) {
            println!();
            print!("{text}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storedb_core::SortOrder;
    use storedb_core::fixtures::StaticCatalogue;

    fn session() -> BrowseSession {
        let catalogue = Arc::new(Catalogue::new(Arc::new(StaticCatalogue::sample())));
        BrowseSession::new(catalogue, Scope::Inventory, BrowseOptions { page_size: 5, ..Default::default() })
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("  red lip "), Ok(Command::Type("red lip".into())));
        assert_eq!(parse("/search dior"), Ok(Command::Search("dior".into())));
        assert_eq!(parse("/search"), Ok(Command::Search(String::new())));
        assert_eq!(parse("/cat beauty"), Ok(Command::ToggleCategory("beauty".into())));
        assert_eq!(parse("/cat"), Ok(Command::ClearCategories));
        assert_eq!(parse("/sort Price"), Ok(Command::Sort(SortField::Price)));
        assert_eq!(parse("/page 3"), Ok(Command::Page(3)));
        assert_eq!(parse("/q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse("/page 0").is_err());
        assert!(parse("/page two").is_err());
        assert!(parse("/sort rating").is_err());
        assert!(parse("/frobnicate").unwrap_err().contains("unknown command"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_updates_session() {
        let mut session = session();

        assert!(apply(&mut session, Command::Sort(SortField::Stock)));
        assert!(apply(&mut session, Command::Sort(SortField::Stock)));
        assert_eq!(session.filter().sort_order, SortOrder::Desc);

        apply(&mut session, Command::ToggleCategory("beauty".into()));
        apply(&mut session, Command::Page(2));
        assert_eq!(session.filter().page, 2);

        apply(&mut session, Command::ClearCategories);
        assert!(session.filter().selected_categories.is_empty());
        assert!(!apply(&mut session, Command::Retry));
    }

    #[tokio::test(start_paused = true)]
    async fn test_screen_prints_only_changes() {
        let mut session = session();
        let mut screen = Screen::default();

        let loading = screen.next(&mut session).unwrap();
        assert!(loading.contains("Loading..."));
        assert!(screen.next(&mut session).is_none());

        session.settled_view().await;
        let ready = screen.next(&mut session).unwrap();
        assert!(ready.contains("Showing 1-5 of 21 items"));
        assert!(screen.next(&mut session).is_none());
    }
}
