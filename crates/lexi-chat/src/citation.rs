//! Citation resolution: selection state for the citation view and the
//! mapping from a citation to a URL a browser can open.

use lexi_core::LinkPolicy;
use url::Url;

use crate::error::LinkError;
use crate::opener::LinkOpener;
use crate::types::Citation;

/// Everything the citation detail view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationDetail {
    /// Human-readable document title derived from the source name.
    pub title: String,
    pub source: String,
    pub excerpt: String,
    pub locator: Option<String>,
    /// URL to open, or why the link is unusable.
    pub url: Result<String, LinkError>,
}

/// Tracks the active citation and resolves citation links.
#[derive(Debug, Default)]
pub struct CitationResolver {
    policy: LinkPolicy,
    selected: Option<Citation>,
    last_error: Option<LinkError>,
}

impl CitationResolver {
    pub fn new(policy: LinkPolicy) -> Self {
        Self {
            policy,
            selected: None,
            last_error: None,
        }
    }

    pub fn policy(&self) -> LinkPolicy {
        self.policy
    }

    /// Make `citation` the active one. Selecting the active citation again
    /// changes nothing.
    pub fn select(&mut self, citation: &Citation) {
        if self.selected.as_ref() == Some(citation) {
            return;
        }
        tracing::debug!(source = %citation.source, "Citation selected");
        self.selected = Some(citation.clone());
        self.last_error = None;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.last_error = None;
    }

    pub fn selected(&self) -> Option<&Citation> {
        self.selected.as_ref()
    }

    /// Failure from the most recent [`open`](Self::open), for display next
    /// to the active citation.
    pub fn last_error(&self) -> Option<&LinkError> {
        self.last_error.as_ref()
    }

    /// The URL to open for `citation`.
    ///
    /// Only http and https links are accepted. Under
    /// [`LinkPolicy::LocatorFragment`] a citation with a paragraph locator
    /// gets a `search=<locator>` fragment so PDF viewers can jump near the
    /// excerpt; without a locator the stored link is returned unchanged.
    pub fn resolve_link(&self, citation: &Citation) -> Result<String, LinkError> {
        let link = citation.link.trim();
        if link.is_empty() {
            return Err(LinkError::Empty);
        }

        let parsed = Url::parse(link).map_err(|e| LinkError::Malformed {
            link: link.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LinkError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        match (self.policy, citation.locator()) {
            (LinkPolicy::LocatorFragment, Some(locator)) => {
                let separator = match parsed.fragment() {
                    Some(fragment) if !fragment.is_empty() => "&",
                    _ if link.ends_with('#') => "",
                    _ => "#",
                };
                Ok(format!(
                    "{}{}search={}",
                    link,
                    separator,
                    urlencoding::encode(locator)
                ))
            }
            _ => Ok(citation.link.clone()),
        }
    }

    /// Select `citation` and hand its URL to `opener`.
    ///
    /// Failures are kept as [`last_error`](Self::last_error) and returned;
    /// they never affect the conversation.
    pub fn open(
        &mut self,
        citation: &Citation,
        opener: &dyn LinkOpener,
    ) -> Result<String, LinkError> {
        self.select(citation);
        let result = self
            .resolve_link(citation)
            .and_then(|url| opener.open(&url).map(|()| url));

        match &result {
            Ok(url) => {
                tracing::info!(source = %citation.source, url = %url, "Citation opened");
                self.last_error = None;
            }
            Err(err) => {
                tracing::warn!(source = %citation.source, error = %err, "Citation link unusable");
                self.last_error = Some(err.clone());
            }
        }
        result
    }

    /// Details for the citation view.
    pub fn detail(&self, citation: &Citation) -> CitationDetail {
        CitationDetail {
            title: document_title(&citation.source),
            source: citation.source.clone(),
            excerpt: citation.text.clone(),
            locator: citation.locator().map(str::to_string),
            url: self.resolve_link(citation),
        }
    }
}

/// `Dani_Devi_v_Pritam_Singh.pdf` -> `Dani Devi v. Pritam Singh`.
fn document_title(source: &str) -> String {
    let stem = match source.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(char::is_alphanumeric) =>
        {
            stem
        }
        _ => source,
    };

    stem.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| if w == "v" || w == "vs" { "v." } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}
