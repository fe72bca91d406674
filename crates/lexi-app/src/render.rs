//! Plain-text rendering of turns and citations for the terminal.

use chrono::{DateTime, Local};

use lexi_chat::{CitationDetail, Role, Turn, EXAMPLE_QUESTION};

pub const LOADING_INDICATOR: &str = "Analyzing your question...";

pub fn welcome() -> String {
    format!(
        "Welcome to Lexi Legal Assistant\n\
         Ask any legal question and get detailed answers with citations from legal documents.\n\n\
         Try this example:\n  \"{}\"\n\n\
         Type :help for commands.",
        EXAMPLE_QUESTION
    )
}

pub fn help() -> &'static str {
    "Commands:\n  \
     :cite N   show citation N of the latest answer\n  \
     :open N   open the source document of citation N\n  \
     :close    close the citation view\n  \
     :cancel   abandon the question being answered\n  \
     :export   print the transcript as JSON\n  \
     :help     show this help\n  \
     :quit     leave the session"
}

/// `hh:mm AM/PM` in local time.
pub fn format_time(at: &DateTime<Local>) -> String {
    at.format("%I:%M %p").to_string()
}

pub fn turn(turn: &Turn) -> String {
    let badge = match turn.role() {
        Role::User => "U",
        Role::Assistant => "L",
    };
    let mut out = format!("[{}] {}\n", badge, turn.content());

    if !turn.citations().is_empty() {
        out.push_str("    Citations:\n");
        for (idx, citation) in turn.citations().iter().enumerate() {
            out.push_str(&format!("    {}. \"{}\"\n", idx + 1, citation.text));
            match citation.locator() {
                Some(locator) => {
                    out.push_str(&format!("       {} ({})\n", citation.source, locator))
                }
                None => out.push_str(&format!("       {}\n", citation.source)),
            }
        }
    }

    out.push_str(&format!("    {}", format_time(&turn.created_at)));
    out
}

pub fn citation_detail(detail: &CitationDetail) -> String {
    let mut out = format!("== {} ==\n", detail.title);
    out.push_str(&format!("Source: {}\n", detail.source));
    if let Some(ref locator) = detail.locator {
        out.push_str(&format!("Citation location: {}\n", locator));
    }
    out.push_str(&format!("Key text: \"{}\"\n", detail.excerpt));
    match &detail.url {
        Ok(url) => out.push_str(&format!("Document: {}", url)),
        Err(err) => out.push_str(&format!("Document unavailable: {}", err)),
    }
    out
}
