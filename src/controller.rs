//! View controller: turns user intents into network jobs and job results into
//! view and history updates.
//!
//! The controller never touches the network itself. Each operation returns
//! the [`Job`]s it needs; whoever owns the I/O (the viewer's worker thread, or
//! [`Controller::drive`] for one-shot use) executes them against a
//! [`PoemSource`] and hands the result back through [`Controller::complete`].
//!
//! Stale responses: every poem-level operation bumps a generation counter and
//! stamps it on its jobs, including the similar-poems job that follows a
//! successful load. Results carrying an older generation are dropped, so the
//! view always reflects the most recent user action.

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::api::{FetchError, PoemSource};
use crate::history::{History, NavIntent};
use crate::location::Location;
use crate::poem::Poem;
use crate::view::{self, PoemView, SimilarEntry, SimilarPane};

/// Number of results requested from `/poems/search`.
pub const SEARCH_RESULTS: usize = 1;

/// Tunables the controller needs from the resolved config.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub similar_limit: usize,
    pub preview_lines: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            similar_limit: 3,
            preview_lines: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    Random(NavIntent),
    Poem { id: String, intent: NavIntent },
    Search { query: String, limit: usize },
    Similar(String),
}

/// One pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub kind: JobKind,
    generation: u64,
}

/// Successful response body of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    One(Poem),
    Many(Vec<Poem>),
}

pub type JobResult = Result<Payload, FetchError>;

impl Job {
    /// Generation the job was issued in. Newer navigation supersedes it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run the request. Blocking.
    pub fn execute<S: PoemSource + ?Sized>(&self, source: &S) -> JobResult {
        match &self.kind {
            JobKind::Random(_) => source.random().map(Payload::One),
            JobKind::Poem { id, .. } => source.by_id(id).map(Payload::One),
            JobKind::Search { query, limit } => source.search(query, *limit).map(Payload::Many),
            JobKind::Similar(id) => source.similar(id).map(Payload::Many),
        }
    }
}

pub struct Controller {
    view: PoemView,
    history: History,
    generation: u64,
    settings: ControllerSettings,
}

impl Controller {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            view: PoemView::default(),
            history: History::new(Location::random()),
            generation: 0,
            settings,
        }
    }

    pub fn view(&self) -> &PoemView {
        &self.view
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Location of the current history entry.
    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn similar_entry(&self, index: usize) -> Option<&SimilarEntry> {
        self.view.similar.entries().get(index)
    }

    /// First load. A location naming a poem loads it without touching history;
    /// otherwise a random poem replaces the current entry once it arrives.
    pub fn start(&mut self, location: Location) -> Vec<Job> {
        info!("controller: start at {location}");
        self.history = History::new(location.clone());
        match location.poem_id() {
            Some(id) => self.load_poem_by_id(id, NavIntent::Initial),
            None => self.load_random(NavIntent::Replace),
        }
    }

    pub fn load_random(&mut self, intent: NavIntent) -> Vec<Job> {
        vec![self.issue(JobKind::Random(intent))]
    }

    pub fn load_poem_by_id(&mut self, id: &str, intent: NavIntent) -> Vec<Job> {
        vec![self.issue(JobKind::Poem {
            id: id.to_string(),
            intent,
        })]
    }

    /// Search by text. A blank query is ignored.
    pub fn search_poems_by_text(&mut self, query: &str) -> Vec<Job> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        vec![self.issue(JobKind::Search {
            query: query.to_string(),
            limit: SEARCH_RESULTS,
        })]
    }

    /// Navigate in place to the `index`-th similar poem (0-based).
    pub fn open_similar(&mut self, index: usize) -> Vec<Job> {
        match self.similar_entry(index).map(|e| e.id.clone()) {
            Some(id) => self.load_poem_by_id(&id, NavIntent::Push),
            None => Vec::new(),
        }
    }

    pub fn back(&mut self) -> Vec<Job> {
        match self.history.back().cloned() {
            Some(location) => self.restore(location),
            None => Vec::new(),
        }
    }

    pub fn forward(&mut self) -> Vec<Job> {
        match self.history.forward().cloned() {
            Some(location) => self.restore(location),
            None => Vec::new(),
        }
    }

    fn restore(&mut self, location: Location) -> Vec<Job> {
        debug!("controller: restoring {location}");
        match location.poem_id() {
            Some(id) => self.load_poem_by_id(id, NavIntent::PopStateRestore),
            None => self.load_random(NavIntent::PopStateRestore),
        }
    }

    fn issue(&mut self, kind: JobKind) -> Job {
        self.generation += 1;
        debug!("controller: issue {kind:?} (generation {})", self.generation);
        Job {
            kind,
            generation: self.generation,
        }
    }

    /// Apply a finished job. Returns follow-up jobs (the similar-poems load
    /// after a successful poem load).
    pub fn complete(&mut self, job: Job, result: JobResult) -> Vec<Job> {
        if job.generation != self.generation {
            debug!(
                "controller: dropping stale {:?} (generation {} < {})",
                job.kind, job.generation, self.generation
            );
            return Vec::new();
        }
        if let JobKind::Similar(id) = &job.kind
            && self.view.poem_id.as_deref() != Some(id.as_str())
        {
            debug!("controller: dropping similar poems for {id}, not on screen");
            return Vec::new();
        }

        match (job.kind, result) {
            (JobKind::Random(intent), Ok(Payload::One(poem)))
            | (JobKind::Poem { intent, .. }, Ok(Payload::One(poem))) => {
                self.accept(poem, intent, job.generation)
            }
            (JobKind::Random(_) | JobKind::Poem { .. }, Err(e)) => {
                warn!("controller: poem load failed: {e}");
                self.view.show_status(view::LOAD_FAILED);
                Vec::new()
            }

            (JobKind::Search { query, .. }, Ok(Payload::Many(poems))) => {
                match poems.into_iter().next() {
                    Some(first) => self.accept(first, NavIntent::Push, job.generation),
                    None => {
                        info!("controller: search {query:?} found nothing");
                        self.view.show_status(view::NOTHING_FOUND);
                        Vec::new()
                    }
                }
            }
            (JobKind::Search { .. }, Err(FetchError::RateLimited)) => {
                self.view.show_status(view::TOO_MANY_REQUESTS);
                Vec::new()
            }
            (JobKind::Search { query, .. }, Err(e)) => {
                warn!("controller: search {query:?} failed: {e}");
                self.view.show_status(view::LOAD_FAILED);
                Vec::new()
            }

            (JobKind::Similar(_), Ok(Payload::Many(poems))) => {
                debug!("controller: {} similar poem(s)", poems.len());
                self.view.similar = SimilarPane::from_results(
                    &poems,
                    self.settings.similar_limit,
                    self.settings.preview_lines,
                );
                Vec::new()
            }
            (JobKind::Similar(_), Err(FetchError::RateLimited)) => {
                self.view.similar = SimilarPane::Message(view::TOO_MANY_REQUESTS.to_string());
                Vec::new()
            }
            (JobKind::Similar(id), Err(e)) => {
                warn!("controller: similar poems for {id} failed: {e}");
                self.view.similar = SimilarPane::Message(view::SIMILAR_FAILED.to_string());
                Vec::new()
            }

            (kind, Ok(_)) => {
                warn!("controller: unexpected payload shape for {kind:?}");
                self.view.show_status(view::LOAD_FAILED);
                Vec::new()
            }
        }
    }

    fn accept(&mut self, poem: Poem, intent: NavIntent, generation: u64) -> Vec<Job> {
        info!("controller: showing poem {} ({intent:?})", poem.id);
        self.view.show_poem(&poem);
        self.history.apply(intent, Location::poem(poem.id.clone()));
        self.similar_job(poem.id, generation)
    }

    /// Reload the similar pane for `id`. Bound to the current generation, so
    /// it is dropped if another poem load starts first.
    pub fn load_similar(&mut self, id: &str) -> Vec<Job> {
        self.similar_job(id.to_string(), self.generation)
    }

    fn similar_job(&mut self, id: String, generation: u64) -> Vec<Job> {
        self.view.similar = SimilarPane::Loading;
        vec![Job {
            kind: JobKind::Similar(id),
            generation,
        }]
    }

    /// Execute `jobs` and all their follow-ups inline against `source`.
    pub fn drive<S: PoemSource + ?Sized>(&mut self, source: &S, jobs: Vec<Job>) {
        let mut queue: VecDeque<Job> = jobs.into();
        while let Some(job) = queue.pop_front() {
            let result = job.execute(source);
            queue.extend(self.complete(job, result));
        }
    }
}
