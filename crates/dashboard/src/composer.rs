use std::sync::Arc;

use foundation::bounds::GeoBounds;
use foundation::ids::ProfileId;
use foundation::math::LatLon;
use futures_util::stream::{FuturesUnordered, StreamExt};
use layers::chart::{DetailPanel, SeriesState, detail_panel};
use layers::markers::{MapPoint, map_points};
use layers::table::{TableView, table_view};
use runtime::event_bus::{Event, EventBus, EventKind};
use runtime::metrics::Metrics;
use scene::filter::{FilterState, ProfileQuery};
use scene::profile::{Profile, Variable};
use scene::selection::SelectionState;
use streaming::protocol::ArgoStats;
use streaming::request::FetchMode;
use streaming::source::ArgoSource;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::fetch::{Delivery, PendingFetch};
use crate::remote::RemoteData;
use crate::views::{DetailState, ListStatus, ListView};

pub const RESPONSES_DROPPED: &str = "responses_dropped";
pub const SELECTIONS_CLEARED: &str = "selections_cleared";

/// The dashboard's view composer.
///
/// Owns the filter and selection state (single writer) and the last applied
/// remote results. Inputs only mutate state; `reconcile` turns the difference
/// between current inputs and what was last requested into pending fetches,
/// and `deliver` applies their results:
///
/// - a profile list is applied only if it answers the current filter,
/// - a measurement series is applied only if it belongs to the current
///   selection,
/// - applying a list that no longer contains the selected id clears the
///   selection.
///
/// Map, table and chart projections are derived on read.
pub struct Dashboard {
    config: DashboardConfig,
    remote: RemoteData,
    filter: FilterState,
    selection: SelectionState,
    variable: Variable,
    list: ListView,
    detail: DetailState,
    stats: Option<ArgoStats>,
    requested_query: Option<ProfileQuery>,
    // Outer `None`: nothing requested yet. Inner `None`: requested "no selection".
    requested_detail: Option<Option<ProfileId>>,
    force_list: bool,
    stats_requested: bool,
    events: EventBus,
    metrics: Metrics,
}

impl Dashboard {
    pub fn new(source: Arc<dyn ArgoSource>, config: DashboardConfig) -> Self {
        Self::with_remote(RemoteData::new(source, &config), config)
    }

    /// Builds a dashboard over an existing cache, e.g. one shared with
    /// another view of the same backend.
    pub fn with_remote(remote: RemoteData, config: DashboardConfig) -> Self {
        Self {
            variable: config.variable,
            config,
            remote,
            filter: FilterState::new(),
            selection: SelectionState::new(),
            list: ListView::default(),
            detail: DetailState::Empty,
            stats: None,
            requested_query: None,
            requested_detail: None,
            force_list: false,
            stats_requested: false,
            events: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Inputs
    // ---------------------------------------------------------------------

    pub fn set_start(&mut self, value: impl Into<String>) -> bool {
        let changed = self.filter.set_start(value);
        self.log_filter(changed);
        changed
    }

    pub fn set_end(&mut self, value: impl Into<String>) -> bool {
        let changed = self.filter.set_end(value);
        self.log_filter(changed);
        changed
    }

    pub fn set_region(&mut self, value: impl Into<String>) -> bool {
        let changed = self.filter.set_region(value);
        self.log_filter(changed);
        changed
    }

    pub fn set_limit(&mut self, limit: u32) -> bool {
        let changed = self.filter.set_limit(limit);
        self.log_filter(changed);
        changed
    }

    pub fn set_bounds(&mut self, bounds: GeoBounds) -> bool {
        let changed = self.filter.set_bounds(bounds);
        self.log_filter(changed);
        changed
    }

    pub fn set_variable(&mut self, variable: Variable) {
        self.variable = variable;
    }

    /// The explicit Apply action: the next `reconcile` re-fetches the list
    /// (and stats) even if the filter did not change.
    pub fn apply(&mut self) {
        debug!("apply requested for {}", self.filter.query());
        self.force_list = true;
        self.stats_requested = false;
    }

    /// Selects the displayed profile closest to `point`.
    ///
    /// With nothing displayed the click is ignored. There is no distance
    /// cutoff: a click in an empty ocean still selects the nearest float.
    pub fn click_map(&mut self, point: LatLon) -> bool {
        let changed = self.selection.select_nearest(point, self.list.profiles());
        if changed {
            self.selection_changed("map click");
        }
        changed
    }

    pub fn click_marker(&mut self, id: ProfileId) -> bool {
        self.select_listed(id, "marker click")
    }

    pub fn click_row(&mut self, id: ProfileId) -> bool {
        self.select_listed(id, "row click")
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        if changed {
            self.selection_changed("cleared");
        }
        changed
    }

    fn select_listed(&mut self, id: ProfileId, via: &str) -> bool {
        if !self.list.contains(id) {
            debug!("{via}: profile {id} is not in the displayed list");
            return false;
        }
        let changed = self.selection.select(id);
        if changed {
            self.selection_changed(via);
        }
        changed
    }

    fn selection_changed(&mut self, via: &str) {
        let msg = match self.selection.selected() {
            Some(id) => format!("{id} ({via})"),
            None => format!("none ({via})"),
        };
        debug!("selection: {msg}");
        self.events.emit(EventKind::Selection, msg);
    }

    fn log_filter(&self, changed: bool) {
        if changed {
            debug!("filter now {}", self.filter.query());
        }
    }

    // ---------------------------------------------------------------------
    // Synchronization
    // ---------------------------------------------------------------------

    /// Compares current inputs with what was last requested and hands out the
    /// fetches needed to bring the views up to date.
    ///
    /// Also updates the placeholders shown meanwhile: a retained cached list
    /// for a new filter is displayed at once (flagged stale if past its
    /// window), otherwise the list shows as loading.
    pub fn reconcile(&mut self) -> Vec<PendingFetch> {
        let mut pending = Vec::new();

        let query = self.filter.query().clone();
        if self.force_list || self.requested_query.as_ref() != Some(&query) {
            let mode = if self.force_list {
                FetchMode::Refetch
            } else {
                FetchMode::IfStale
            };
            self.force_list = false;
            self.requested_query = Some(query.clone());
            self.show_list_placeholder(&query);

            debug!("requesting profiles for {query} ({mode:?})");
            self.events.emit(EventKind::Request, format!("profiles {query}"));
            pending.push(PendingFetch::Profiles {
                request: self.remote.list_profiles(query.clone(), mode),
                query,
            });
        }

        let selected = self.selection.selected();
        if self.requested_detail != Some(selected) {
            self.requested_detail = Some(selected);
            match selected {
                None => self.detail = DetailState::Empty,
                Some(id) => {
                    self.detail = match self.remote.cached_measurements(id) {
                        Some(cached) => DetailState::Ready(cached.value),
                        None => DetailState::Loading(id),
                    };
                    let request = self.remote.fetch_measurements(Some(id), FetchMode::IfStale);
                    if let Some(request) = request {
                        debug!("requesting measurements for profile {id}");
                        self.events.emit(EventKind::Request, format!("measurements {id}"));
                        pending.push(PendingFetch::Measurements { id, request });
                    }
                }
            }
        }

        if !self.stats_requested {
            self.stats_requested = true;
            self.events.emit(EventKind::Request, "stats");
            pending.push(PendingFetch::Stats {
                request: self.remote.stats(FetchMode::IfStale),
            });
        }

        pending
    }

    /// Applies a resolved fetch. Returns `false` if it was dropped because its
    /// tag no longer matches the current filter or selection.
    pub fn deliver(&mut self, delivery: Delivery) -> bool {
        match delivery {
            Delivery::Profiles { query, result } => {
                if &query != self.filter.query() {
                    self.drop_response(format!("profiles {query}"));
                    return false;
                }
                match result {
                    Ok(profiles) => {
                        info!("showing {} profiles for {query}", profiles.len());
                        self.events.emit(EventKind::Deliver, format!("profiles {query}"));
                        self.list = ListView {
                            query: Some(query),
                            profiles: Some(profiles),
                            status: ListStatus::Ready,
                            stale: false,
                            error: None,
                        };
                        self.validate_selection();
                    }
                    Err(err) => {
                        warn!("profile list for {query} failed: {err}");
                        self.events.emit(EventKind::Failure, format!("profiles {query}: {err}"));
                        let retained = self.remote.cached_profiles(&query).map(|c| c.value);
                        let has_data = retained.is_some();
                        self.list = ListView {
                            query: Some(query),
                            stale: has_data,
                            profiles: retained,
                            status: ListStatus::Failed,
                            error: Some(err),
                        };
                        if has_data {
                            self.validate_selection();
                        }
                    }
                }
                true
            }
            Delivery::Measurements { id, series } => {
                if !self.selection.is_selected(id) {
                    self.drop_response(format!("measurements {id}"));
                    return false;
                }
                self.events.emit(EventKind::Deliver, format!("measurements {id}"));
                self.detail = match series {
                    Some(series) => DetailState::Ready(series),
                    None => DetailState::Absent(id),
                };
                true
            }
            Delivery::Stats(result) => {
                match result {
                    Ok(stats) => {
                        self.events.emit(EventKind::Deliver, "stats");
                        self.stats = Some(stats);
                    }
                    Err(err) => {
                        warn!("stats unavailable: {err}");
                        self.events.emit(EventKind::Failure, format!("stats: {err}"));
                    }
                }
                true
            }
        }
    }

    /// Reconciles and delivers until no fetch is outstanding.
    ///
    /// Results are applied in completion order, which need not match the
    /// order the fetches were issued in.
    pub async fn settle(&mut self) {
        let mut in_flight = FuturesUnordered::new();
        loop {
            for fetch in self.reconcile() {
                in_flight.push(fetch.resolve());
            }
            match in_flight.next().await {
                Some(delivery) => {
                    self.deliver(delivery);
                }
                None => break,
            }
        }
    }

    fn show_list_placeholder(&mut self, query: &ProfileQuery) {
        if self.list.query.as_ref() == Some(query) {
            // Same filter re-requested: keep what is on screen.
            self.list.status = ListStatus::Loading;
            return;
        }
        match self.remote.cached_profiles(query) {
            Some(cached) => {
                debug!("showing retained list for {query} (fresh: {})", cached.fresh);
                self.list = ListView {
                    query: Some(query.clone()),
                    profiles: Some(cached.value),
                    status: ListStatus::Loading,
                    stale: !cached.fresh,
                    error: None,
                };
                self.validate_selection();
            }
            None => {
                self.list = ListView {
                    query: Some(query.clone()),
                    status: ListStatus::Loading,
                    ..ListView::default()
                };
            }
        }
    }

    fn validate_selection(&mut self) {
        let ids = self.list.profiles().iter().map(|p| p.id);
        if !self.selection.retain_in(ids) {
            return;
        }
        info!("selected profile is not in the new list; clearing selection");
        self.metrics.inc(SELECTIONS_CLEARED);
        self.events.emit(EventKind::Selection, "none (not in list)");
        self.detail = DetailState::Empty;
        self.requested_detail = Some(None);
    }

    fn drop_response(&mut self, what: String) {
        warn!("dropping outdated response: {what}");
        self.metrics.inc(RESPONSES_DROPPED);
        self.events.emit(EventKind::Drop, what);
    }

    // ---------------------------------------------------------------------
    // Read side
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn remote(&self) -> &RemoteData {
        &self.remote
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn query(&self) -> &ProfileQuery {
        self.filter.query()
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn list(&self) -> &ListView {
        &self.list
    }

    pub fn profiles(&self) -> &[Profile] {
        self.list.profiles()
    }

    pub fn selected(&self) -> Option<ProfileId> {
        self.selection.selected()
    }

    pub fn selected_profile(&self) -> Option<&Profile> {
        self.selection.selected().and_then(|id| self.list.get(id))
    }

    pub fn detail(&self) -> &DetailState {
        &self.detail
    }

    pub fn stats(&self) -> Option<ArgoStats> {
        self.stats
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn map_points(&self) -> Vec<MapPoint> {
        map_points(self.list.profiles(), self.selection.selected())
    }

    pub fn table(&self) -> TableView {
        table_view(self.list.profiles(), self.selection.selected(), self.config.table_limit)
    }

    pub fn detail_panel(&self) -> DetailPanel {
        self.detail_panel_for(self.variable)
    }

    pub fn detail_panel_for(&self, variable: Variable) -> DetailPanel {
        let selected = self.selected_profile();
        // A detail left over from another profile never reaches the chart.
        let series = if selected.map(|p| p.id) != self.detail.profile_id() {
            SeriesState::Pending
        } else {
            match &self.detail {
                DetailState::Ready(s) => SeriesState::Ready(s),
                DetailState::Absent(_) => SeriesState::Absent,
                DetailState::Empty | DetailState::Loading(_) => SeriesState::Pending,
            }
        };
        detail_panel(selected, series, variable)
    }
}
