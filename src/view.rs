//! The five display regions (title, author, text, date, similar list) as
//! plain data. Every update overwrites whole regions; front ends only read.

use std::fmt;

use serde::Serialize;

use crate::poem::Poem;

pub const LOAD_FAILED: &str = "Error loading poem";
pub const TOO_MANY_REQUESTS: &str = "Слишком много запросов, попробуйте позже";
pub const NOTHING_FOUND: &str = "Ничего не найдено";
pub const LOADING_SIMILAR: &str = "Loading recommendations...";
pub const SIMILAR_FAILED: &str = "Could not load recommendations";
pub const NO_SIMILAR: &str = "No similar poems found";

/// One preview in the similar-poems list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub preview: Vec<String>,
}

impl SimilarEntry {
    pub fn from_poem(poem: &Poem, preview_lines: usize) -> Self {
        Self {
            id: poem.id.clone(),
            title: poem.title().to_string(),
            author: poem.author.clone(),
            preview: poem
                .preview(preview_lines)
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SimilarPane {
    #[default]
    Hidden,
    Loading,
    /// A single placeholder line (no results, throttled, failed).
    Message(String),
    Entries(Vec<SimilarEntry>),
}

impl SimilarPane {
    /// Build the pane from an API result, keeping at most `limit` entries in
    /// input order. An empty result becomes the "no similar poems" placeholder.
    pub fn from_results(poems: &[Poem], limit: usize, preview_lines: usize) -> Self {
        if poems.is_empty() {
            return Self::Message(NO_SIMILAR.to_string());
        }
        Self::Entries(
            poems
                .iter()
                .take(limit)
                .map(|p| SimilarEntry::from_poem(p, preview_lines))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[SimilarEntry] {
        match self {
            Self::Entries(entries) => entries,
            _ => &[],
        }
    }

    /// Placeholder text for non-list states.
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Self::Loading => Some(LOADING_SIMILAR),
            Self::Message(msg) => Some(msg),
            Self::Hidden | Self::Entries(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoemView {
    /// Id of the displayed poem; `None` while a status message is shown.
    pub poem_id: Option<String>,
    pub title: String,
    pub author: String,
    pub text: String,
    /// Formatted date; `None` hides the region.
    pub date: Option<String>,
    pub similar: SimilarPane,
}

impl PoemView {
    /// Overwrite every region with `poem`. The similar pane starts loading.
    pub fn show_poem(&mut self, poem: &Poem) {
        let date = poem.date_label();
        *self = Self {
            poem_id: Some(poem.id.clone()),
            title: poem.title().to_string(),
            author: poem.author.clone(),
            text: poem.text.clone(),
            date: (!date.is_empty()).then_some(date),
            similar: SimilarPane::Loading,
        };
    }

    /// Clear every region and put `message` in the title.
    pub fn show_status(&mut self, message: &str) {
        *self = Self {
            title: message.to_string(),
            ..Self::default()
        };
    }

    pub fn has_poem(&self) -> bool {
        self.poem_id.is_some()
    }

    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

impl fmt::Display for PoemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if !self.author.is_empty() {
            writeln!(f, "{}", self.author)?;
        }
        if let Some(date) = &self.date {
            writeln!(f, "{date}")?;
        }
        if !self.text.is_empty() {
            writeln!(f)?;
            for line in self.text_lines() {
                writeln!(f, "{line}")?;
            }
        }
        if let Some(msg) = self.similar.placeholder() {
            writeln!(f)?;
            writeln!(f, "-- {msg}")?;
        }
        for (i, entry) in self.similar.entries().iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "[{}] {} — {}", i + 1, entry.title, entry.author)?;
            for line in &entry.preview {
                writeln!(f, "    {line}")?;
            }
        }
        Ok(())
    }
}
