//! Interactive terminal reader.
//!
//! Threads:
//!   main          : input events, controller updates, drawing
//!   fetch worker  : executes controller jobs against the `PoemSource`
//!
//! The worker processes jobs FIFO and sends `(job, result)` back over a
//! channel. The main thread drains results before every redraw and feeds them
//! to the controller, which drops results from superseded generations. The
//! worker skips jobs that are already superseded (or queued after quit) and
//! answers them with `None`, so the in-flight count stays balanced. While
//! jobs are in flight the event poll uses a short timeout so results are
//! picked up without waiting for a keypress.

mod input;
mod mode_command;
mod mode_normal;
mod mode_search;
mod state;
mod terminal;

use crossterm::{
    event::{self, Event},
    terminal as crossterm_terminal,
};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::api::PoemSource;
use crate::config::Config;
use crate::controller::{Controller, Job, JobResult};
use crate::history::NavIntent;
use crate::location::Location;

use input::{InputAccumulator, map_key_event, map_prompt_key};
use mode_command::CommandState;
use mode_normal::NormalCtx;
use mode_search::SearchState;
use state::{Layout, ViewState};
use terminal::StatusInfo;

const BUSY_POLL: Duration = Duration::from_millis(30);
const IDLE_POLL: Duration = Duration::from_secs(86400);

enum ViewerMode {
    Normal,
    Search(SearchState),
    Command(CommandState),
}

/// User-initiated navigation, resolved against the controller.
enum Nav {
    Random,
    Poem(String),
    Search(String),
    /// 0-based index into the similar list.
    Similar(usize),
    /// Re-request the similar pane of the displayed poem.
    ReloadSimilar,
    Back,
    Forward,
}

/// Side effects requested by mode handlers, applied by the event loop.
enum Effect {
    Exit,
    ScrollTo(usize),
    Navigate(Nav),
    OpenUrl(String),
    Yank(String),
    Flash(String),
    SetMode(ViewerMode),
    MarkDirty,
    RedrawStatusBar,
}

/// Run the interactive reader until the user quits.
///
/// `start` is the initial location: a poem id, or empty for a random poem.
pub fn run<S: PoemSource + Sync>(source: &S, start: Location, config: &Config) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let (term_cols, term_rows) = crossterm_terminal::size()
        .map_err(|e| anyhow::anyhow!("failed to get terminal size: {e}"))?;

    let mut layout = self::state::compute_layout(term_cols, term_rows);
    let mut controller = Controller::new(config.controller_settings());
    let web_url = config.web_url.as_deref();
    let scroll_step = config.viewer.scroll_step as usize;

    // Highest generation dispatched so far; older queued jobs are skipped.
    let latest = AtomicU64::new(0);
    let shutdown = AtomicBool::new(false);
    let (latest, shutdown) = (&latest, &shutdown);

    thread::scope(|s| -> anyhow::Result<()> {
        // Dropped when this closure returns, i.e. before the scope joins the
        // worker: the terminal is restored and queued jobs are skipped even
        // while a request is still blocking.
        let _guard = terminal::RawGuard::enter()?;

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (res_tx, res_rx) = mpsc::channel::<(Job, Option<JobResult>)>();
        s.spawn(move || fetch_worker(source, &job_rx, &res_tx, latest, shutdown));
        let _stop = StopWorker(shutdown);

        // Jobs sent to the worker whose results have not come back yet.
        let mut in_flight: usize = 0;
        dispatch(&job_tx, latest, controller.start(start), &mut in_flight);

        let mut mode = ViewerMode::Normal;
        let mut state = ViewState::default();
        let mut acc = InputAccumulator::new();
        // Flash message (e.g. "Yanked poem"), cleared on next keypress
        let mut flash_msg: Option<String> = None;
        let mut dirty = true;

        loop {
            while let Ok((job, result)) = res_rx.try_recv() {
                in_flight = in_flight.saturating_sub(1);
                dirty = true;
                let Some(result) = result else { continue };
                let follow_up = controller.complete(job, result);
                dispatch(&job_tx, latest, follow_up, &mut in_flight);
            }

            if dirty {
                state.scroll = state.scroll.min(self::state::max_scroll(controller.view(), &layout));
                let lines = self::state::compose(controller.view(), &layout, state.scroll);
                terminal::draw_screen(&layout, &lines)?;
                draw_bottom_row(&layout, &mode, &controller, in_flight, acc.peek(), flash_msg.as_deref())?;
                dirty = false;
            }

            let timeout = if in_flight > 0 { BUSY_POLL } else { IDLE_POLL };
            if !event::poll(timeout)? {
                continue;
            }

            let ev = event::read()?;
            debug!("event: {:?}", ev);
            let key_event = match ev {
                Event::Key(key_event) => key_event,
                Event::Resize(cols, rows) => {
                    layout = self::state::compute_layout(cols, rows);
                    dirty = true;
                    continue;
                }
                _ => continue,
            };

            let had_flash = flash_msg.take().is_some();
            let effects = match &mut mode {
                ViewerMode::Normal => match map_key_event(key_event, &mut acc) {
                    Some(action) => {
                        let view = controller.view();
                        let text_rows = self::state::text_area_rows(view, &layout);
                        let ctx = NormalCtx {
                            state: &state,
                            view,
                            max_scroll: self::state::max_scroll(view, &layout),
                            scroll_step,
                            half_page: (text_rows / 2).max(1),
                            web_url,
                        };
                        mode_normal::handle(action, &ctx)
                    }
                    None if acc.is_active() || had_flash => {
                        // Unknown key: reset accumulator
                        acc.reset();
                        vec![Effect::RedrawStatusBar]
                    }
                    None => vec![],
                },
                ViewerMode::Search(ss) => match map_prompt_key(key_event) {
                    Some(action) => mode_search::handle(action, ss, &layout)?,
                    None => vec![],
                },
                ViewerMode::Command(cs) => match map_prompt_key(key_event) {
                    Some(action) => {
                        let current_url = current_page_url(&controller, web_url);
                        mode_command::handle(action, cs, &layout, current_url)?
                    }
                    None => vec![],
                },
            };

            for effect in effects {
                match effect {
                    Effect::Exit => return Ok(()),
                    Effect::ScrollTo(y) => {
                        state.scroll = y;
                        dirty = true;
                    }
                    Effect::Navigate(nav) => {
                        let idle_msg = match nav {
                            Nav::Back => "Already at the oldest poem",
                            Nav::Forward => "Already at the newest poem",
                            _ => "Nothing to load",
                        };
                        let jobs = navigate(&mut controller, nav);
                        if jobs.is_empty() {
                            flash_msg = Some(idle_msg.into());
                        } else {
                            state.scroll = 0;
                        }
                        dispatch(&job_tx, latest, jobs, &mut in_flight);
                        dirty = true;
                    }
                    Effect::OpenUrl(url) => {
                        info!("opening {url} in browser");
                        if let Err(e) = open::that(&url) {
                            warn!("failed to open {url}: {e}");
                            flash_msg = Some(format!("Failed to open browser: {e}"));
                        }
                    }
                    Effect::Yank(text) => {
                        if let Err(e) = terminal::send_osc52(&text) {
                            debug!("OSC 52 failed: {e}");
                        }
                    }
                    Effect::Flash(msg) => flash_msg = Some(msg),
                    Effect::SetMode(new_mode) => {
                        mode = new_mode;
                        match &mode {
                            ViewerMode::Search(ss) => terminal::draw_prompt_bar(&layout, '/', &ss.query)?,
                            ViewerMode::Command(cs) => terminal::draw_prompt_bar(&layout, ':', &cs.input)?,
                            ViewerMode::Normal => {}
                        }
                    }
                    Effect::MarkDirty => dirty = true,
                    Effect::RedrawStatusBar => {
                        draw_bottom_row(&layout, &mode, &controller, in_flight, acc.peek(), flash_msg.as_deref())?;
                    }
                }
            }
        }
        // _stop, job_tx, _guard dropped on return → worker skips the rest → scope joins
    })
}

/// Execute jobs FIFO until the job channel closes. Jobs older than `latest`
/// or received after `shutdown` is set are answered with `None` unexecuted.
fn fetch_worker<S: PoemSource + ?Sized>(
    source: &S,
    job_rx: &mpsc::Receiver<Job>,
    res_tx: &mpsc::Sender<(Job, Option<JobResult>)>,
    latest: &AtomicU64,
    shutdown: &AtomicBool,
) {
    debug!("fetch worker: started");
    while let Ok(job) = job_rx.recv() {
        if shutdown.load(Ordering::Relaxed) || job.generation() < latest.load(Ordering::Relaxed) {
            debug!("fetch worker: skipping superseded {:?}", job.kind);
            if res_tx.send((job, None)).is_err() {
                break;
            }
            continue;
        }
        let started = Instant::now();
        let result = job.execute(source);
        debug!(
            "fetch worker: {:?} done in {:.1}ms (ok={})",
            job.kind,
            started.elapsed().as_secs_f64() * 1000.0,
            result.is_ok()
        );
        if res_tx.send((job, Some(result))).is_err() {
            break;
        }
    }
    debug!("fetch worker: channel closed, exiting");
}

/// Tells the fetch worker to skip everything still queued.
struct StopWorker<'a>(&'a AtomicBool);

impl Drop for StopWorker<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn dispatch(tx: &mpsc::Sender<Job>, latest: &AtomicU64, jobs: Vec<Job>, in_flight: &mut usize) {
    for job in jobs {
        debug!("dispatch: {:?}", job.kind);
        latest.fetch_max(job.generation(), Ordering::Relaxed);
        if tx.send(job).is_ok() {
            *in_flight += 1;
        }
    }
}

fn navigate(controller: &mut Controller, nav: Nav) -> Vec<Job> {
    match nav {
        Nav::Random => controller.load_random(NavIntent::Push),
        Nav::Poem(id) => controller.load_poem_by_id(&id, NavIntent::Push),
        Nav::Search(query) => controller.search_poems_by_text(&query),
        Nav::Similar(idx) => controller.open_similar(idx),
        Nav::ReloadSimilar => match controller.view().poem_id.clone() {
            Some(id) => controller.load_similar(&id),
            None => Vec::new(),
        },
        Nav::Back => controller.back(),
        Nav::Forward => controller.forward(),
    }
}

/// Browser URL of the displayed poem, when a page URL is configured.
fn current_page_url(controller: &Controller, web_url: Option<&str>) -> Option<String> {
    let id = controller.view().poem_id.as_deref()?;
    Some(Location::poem(id).to_url(web_url?))
}

/// Status bar in normal mode, the open prompt otherwise.
fn draw_bottom_row(
    layout: &Layout,
    mode: &ViewerMode,
    controller: &Controller,
    in_flight: usize,
    acc_peek: Option<u32>,
    flash: Option<&str>,
) -> std::io::Result<()> {
    match mode {
        ViewerMode::Search(ss) => terminal::draw_prompt_bar(layout, '/', &ss.query),
        ViewerMode::Command(cs) => terminal::draw_prompt_bar(layout, ':', &cs.input),
        ViewerMode::Normal => {
            let history = controller.history();
            terminal::draw_status_bar(
                layout,
                &StatusInfo {
                    location: history.current(),
                    loading: in_flight > 0,
                    can_back: history.can_go_back(),
                    can_forward: history.can_go_forward(),
                    acc_peek,
                    flash,
                },
            )
        }
    }
}
