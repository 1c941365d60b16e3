pub mod event;
pub mod ui;

use chrono::{DateTime, Local};
use ratatui::widgets::ListState as RListState;
use tokio::sync::oneshot;
use tracing::{info, warn};
use url::Url;

use crate::api::AssetClient;
use crate::cache::{AssetCache, AssetSource};
use crate::clock::{Clock, Now};
use crate::colors::CourseColors;
use crate::models::Schedule;
use crate::store::{parse_schedule, ScheduleStore};
use crate::view::grid::{self, BoundaryPolicy};
use crate::view::{self, Mode, RenderModel, Selection};

// ─── Schedule picker ─────────────────────────────────────────────────────────

/// The search-and-select modal.
pub struct Picker {
    pub query: String,
    pub list_state: ListState,
}

// ─── Background sync ─────────────────────────────────────────────────────────

/// Where remote schedules come from. Absent when no URLs are configured.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub cache: AssetCache,
    pub client: AssetClient,
    pub urls: Vec<Url>,
}

pub struct SyncResult {
    pub schedules: Vec<Schedule>,
    /// URLs that were neither cached nor reachable.
    pub offline: usize,
    /// Bodies that did not parse as schedules.
    pub errors: Vec<String>,
    pub finished_at: DateTime<Local>,
}

// ─── App State ──────────────────────────────────────────────────────────────

/// The view controller. Owns the session: selection, mode and course colors.
pub struct App {
    pub running: bool,
    pub store: ScheduleStore,
    clock: Box<dyn Clock>,
    pub selection: Selection,
    pub boundary_policy: BoundaryPolicy,
    /// Shared by both modes so a course keeps its color across toggles.
    pub colors: CourseColors,

    pub picker: Option<Picker>,

    // Status
    pub status_message: String,
    pub syncing: bool,
    pub synced_at: Option<DateTime<Local>>,

    sync: Option<SyncPlan>,
    sync_rx: Option<oneshot::Receiver<SyncResult>>,

    // Incremented each frame; used to drive the sync spinner.
    pub frame_count: u64,
}

/// Tracks logical selection plus a persistent ratatui scroll offset.
pub struct ListState {
    pub inner: RListState,
    pub selected: usize,
    pub len: usize,
}

impl ListState {
    pub fn new() -> Self {
        let mut inner = RListState::default();
        inner.select(Some(0));
        Self {
            inner,
            selected: 0,
            len: 0,
        }
    }

    /// Move down, stopping at the last item.
    pub fn select_next(&mut self) {
        if self.len > 0 && self.selected + 1 < self.len {
            self.selected += 1;
        }
    }

    /// Move up, stopping at the first item.
    pub fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

impl App {
    pub fn new(
        store: ScheduleStore,
        clock: Box<dyn Clock>,
        colors: CourseColors,
        boundary_policy: BoundaryPolicy,
        default_schedule: Option<&str>,
    ) -> Self {
        for schedule in store.list() {
            log_hazards(schedule, boundary_policy);
        }

        let schedule_id = default_schedule
            .filter(|id| store.contains(id))
            .or_else(|| store.first().map(|s| s.id.as_str()))
            .map(str::to_string);

        let status_message = if store.is_empty() {
            view::NO_SCHEDULES.to_string()
        } else {
            "Press / to pick a schedule, m to switch modes.".to_string()
        };

        let mut app = Self {
            running: true,
            store,
            clock,
            selection: Selection {
                schedule_id,
                day_index: 0,
                mode: Mode::Simplified,
            },
            boundary_policy,
            colors,
            picker: None,
            status_message,
            syncing: false,
            synced_at: None,
            sync: None,
            sync_rx: None,
            frame_count: 0,
        };
        app.reset_day_to_today();
        app
    }

    pub fn with_sync(mut self, plan: SyncPlan) -> Self {
        self.sync = Some(plan);
        self
    }

    pub fn now(&self) -> Now {
        self.clock.now()
    }

    pub fn current_schedule(&self) -> Option<&Schedule> {
        let id = self.selection.schedule_id.as_deref()?;
        self.store.find_by_id(id).ok()
    }

    /// Full recompute from the store and the wall clock.
    pub fn render_model(&self) -> RenderModel {
        view::compose(&self.store, &self.selection, self.now(), self.boundary_policy)
    }

    // ── Mode & selection ─────────────────────────────────────────────

    pub fn toggle_mode(&mut self) {
        if self.store.is_empty() {
            return;
        }
        self.selection.mode = self.selection.mode.toggle();
        if self.selection.mode == Mode::Simplified {
            self.reset_day_to_today();
        }
    }

    /// Today if the schedule has it, otherwise its first day.
    pub fn reset_day_to_today(&mut self) {
        let today = self.now().day;
        self.selection.day_index = self
            .current_schedule()
            .map_or(0, |s| view::default_day_index(s, today));
    }

    pub fn select_schedule(&mut self, id: &str) {
        self.selection.schedule_id = Some(id.to_string());
        if self.selection.mode == Mode::Simplified {
            self.reset_day_to_today();
        }
        self.status_message = match self.store.find_by_id(id) {
            Ok(s) => format!("Showing {}", s.display_name),
            Err(e) => {
                warn!("{e}");
                e.to_string()
            }
        };
    }

    pub fn select_day(&mut self, index: usize) {
        let Some(len) = self.current_schedule().map(|s| s.days.len()) else {
            return;
        };
        self.selection.day_index = index.min(len.saturating_sub(1));
    }

    pub fn next_day(&mut self) {
        self.select_day(self.selection.day_index + 1);
    }

    pub fn prev_day(&mut self) {
        self.select_day(self.selection.day_index.saturating_sub(1));
    }

    // ── Picker ───────────────────────────────────────────────────────

    pub fn open_picker(&mut self) {
        if self.store.is_empty() {
            return;
        }
        let mut list_state = ListState::new();
        list_state.set_len(self.store.list().len());
        self.picker = Some(Picker {
            query: String::new(),
            list_state,
        });
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
    }

    /// Schedules matching the picker query, in listing order.
    pub fn picker_results(&self) -> Vec<&Schedule> {
        match &self.picker {
            Some(picker) => self.store.search(&picker.query),
            None => Vec::new(),
        }
    }

    pub fn picker_push(&mut self, c: char) {
        if let Some(picker) = self.picker.as_mut() {
            picker.query.push(c);
        }
        self.refilter_picker();
    }

    pub fn picker_pop(&mut self) {
        if let Some(picker) = self.picker.as_mut() {
            picker.query.pop();
        }
        self.refilter_picker();
    }

    fn refilter_picker(&mut self) {
        let count = self.picker_results().len();
        if let Some(picker) = self.picker.as_mut() {
            picker.list_state.selected = 0;
            picker.list_state.set_len(count);
        }
    }

    /// Selects the highlighted result and closes the picker. Does nothing
    /// while the filter matches no schedule.
    pub fn picker_confirm(&mut self) {
        let Some(selected) = self.picker.as_ref().map(|p| p.list_state.selected) else {
            return;
        };
        let Some(id) = self.picker_results().get(selected).map(|s| s.id.clone()) else {
            return;
        };
        self.close_picker();
        self.select_schedule(&id);
    }

    // ── Background sync ──────────────────────────────────────────────

    /// Spawn a background task that loads the configured schedule URLs
    /// through the asset cache. `refresh` re-downloads everything first.
    /// No-ops without a sync plan or while a sync is running.
    pub fn start_sync(&mut self, refresh: bool) {
        if self.sync_rx.is_some() {
            return;
        }
        let Some(plan) = self.sync.clone() else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        self.sync_rx = Some(rx);
        self.syncing = true;
        self.status_message = "Syncing schedules in background…".into();
        tokio::spawn(async move {
            let result = run_sync(plan, refresh).await;
            let _ = tx.send(result);
        });
    }

    /// Check the sync channel without blocking. Returns `true` and merges
    /// the result into the store when it has arrived.
    pub fn poll_sync_result(&mut self) -> bool {
        let result = match self.sync_rx.as_mut() {
            None => return false,
            Some(rx) => match rx.try_recv() {
                Ok(r) => r,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.sync_rx = None;
                    self.syncing = false;
                    return false;
                }
            },
        };
        self.sync_rx = None;
        self.apply_sync_result(result);
        true
    }

    fn apply_sync_result(&mut self, result: SyncResult) {
        self.syncing = false;
        self.synced_at = Some(result.finished_at);

        let merged = result.schedules.len();
        for schedule in result.schedules {
            log_hazards(&schedule, self.boundary_policy);
            self.store.upsert(schedule);
        }
        if self.selection.schedule_id.is_none() {
            if let Some(id) = self.store.first().map(|s| s.id.clone()) {
                self.select_schedule(&id);
            }
        }

        self.status_message = if let Some(err) = result.errors.first() {
            format!("Sync error: {err}")
        } else if result.offline > 0 {
            format!(
                "Offline: {} of {} schedule files unavailable.",
                result.offline,
                result.offline + merged
            )
        } else {
            format!("Synced {merged} schedule files.")
        };
        info!(merged, offline = result.offline, errors = result.errors.len(), "sync finished");
    }
}

fn log_hazards(schedule: &Schedule, policy: BoundaryPolicy) {
    for hazard in grid::hazards(schedule, policy) {
        warn!(schedule = %schedule.id, course = hazard.title(), "{}", hazard.describe());
    }
}

// ─── Background sync (runs in a spawned task) ────────────────────────────────

async fn run_sync(plan: SyncPlan, refresh: bool) -> SyncResult {
    let mut result = SyncResult {
        schedules: Vec::new(),
        offline: 0,
        errors: Vec::new(),
        finished_at: Local::now(),
    };

    match plan.cache.purge_stale() {
        Ok(removed) if !removed.is_empty() => {
            info!(?removed, "dropped stale cache generations");
        }
        Ok(_) => {}
        Err(e) => warn!(generation = plan.cache.generation(), "could not purge stale caches: {e:#}"),
    }

    if refresh {
        plan.cache.install(&plan.client, &plan.urls).await;
    }

    for url in &plan.urls {
        let asset = plan.cache.fetch(&plan.client, url).await;
        if asset.source == AssetSource::Offline {
            result.offline += 1;
            continue;
        }
        match parse_schedule(asset.url.as_str(), &asset.body) {
            Ok(schedule) => result.schedules.push(schedule),
            Err(e) => {
                warn!(%url, "ignoring remote schedule: {e}");
                result.errors.push(e.to_string());
            }
        }
    }

    result.finished_at = Local::now();
    result
}
