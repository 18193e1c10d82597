//! Float explorer core
//!
//! One [`Session`] per application root: it owns the selection store, the
//! map search, the fetch orchestrator, the chat session and the chart
//! renderer. Views read signals from it and write only through the
//! selection setters, the search box and chat submission.

pub mod chart;
pub mod chat;
pub mod dataflow;
pub mod gateway;
pub mod measurements;
pub mod notifications;
pub mod orchestrator;
pub mod resource;
pub mod search;
pub mod selection;

#[cfg(test)]
mod testing;

pub use chart::{ChartRenderer, RenderedChart, render};
pub use chat::{ChatSession, SubmitOutcome};
pub use gateway::{Gateway, GatewayClient, GatewayError, GatewayFuture, RequestDeadline, Timer};
pub use notifications::{ErrorAlert, Notifications};
pub use orchestrator::{Consumer, FetchOrchestrator};
pub use resource::{Resource, ResourceState};
pub use search::{FlyTo, MapView, SearchFilter};
pub use selection::{Selection, SelectionEvent, SelectionStore};

use futures::task::{LocalSpawn, SpawnError};
use futures::{Stream, StreamExt, future, stream};
use futures_signals::map_ref;
use futures_signals::signal::{Signal, SignalExt};
use measurements::DepthPoint;
use shared::{AppConfig, Parameter};
use std::rc::Rc;

pub struct Session {
    pub config: AppConfig,
    pub selection: SelectionStore,
    pub search: SearchFilter,
    pub notifications: Notifications,
    pub fetch: FetchOrchestrator,
    pub chat: ChatSession,
    pub charts: ChartRenderer,
}

impl Session {
    pub fn start(
        config: AppConfig,
        gateway: Rc<dyn Gateway>,
        spawner: Rc<dyn LocalSpawn>,
        timer: Rc<dyn Timer>,
    ) -> Result<Self, SpawnError> {
        let selection = SelectionStore::from_config(&config);
        let notifications = Notifications::new();
        let deadline = RequestDeadline::new(timer, config.fetch.request_timeout_ms);
        let client = GatewayClient::new(gateway, deadline);

        let chat = ChatSession::start(&config.chat, client.clone(), spawner.as_ref())?;
        let fetch = FetchOrchestrator::start(
            &config,
            selection.clone(),
            notifications.clone(),
            client,
            spawner,
        )?;

        Ok(Self {
            charts: ChartRenderer::new(&config.chart),
            search: SearchFilter::new(),
            config,
            selection,
            notifications,
            fetch,
            chat,
        })
    }

    /// Like [`Session::start`] with a stored TOML config. An unreadable or
    /// unsupported config falls back to defaults and raises a notification.
    pub fn start_with_toml(
        config_text: &str,
        gateway: Rc<dyn Gateway>,
        spawner: Rc<dyn LocalSpawn>,
        timer: Rc<dyn Timer>,
    ) -> Result<Self, SpawnError> {
        match AppConfig::from_toml_str(config_text) {
            Ok(config) => Self::start(config, gateway, spawner, timer),
            Err(error) => {
                let session = Self::start(AppConfig::default(), gateway, spawner, timer)?;
                session.notifications.push(ErrorAlert::new_config_error(&error));
                Ok(session)
            }
        }
    }

    pub fn initial_view(&self) -> FlyTo {
        FlyTo::initial(&self.config.map)
    }

    pub fn map_view_signal(&self) -> impl Signal<Item = MapView> {
        let locations = self.fetch.locations().signal().map(|state| state.data);
        self.search.map_view_signal(locations, &self.selection)
    }

    /// Map navigation requests from two sources. The single search match is
    /// requested again on every change of the search text or the locations,
    /// even when the map is already centered on it. The selected float is
    /// requested when the selection moves to a float with a position.
    pub fn fly_to_requests(&self) -> impl Stream<Item = FlyTo> + use<> {
        let search_map = self.config.map.clone();
        let search_requests = self
            .search
            .fly_target_signal(self.fetch.locations().signal().map(|state| state.data))
            .map(move |target| target.and_then(|location| FlyTo::to_location(&location, &search_map)))
            .to_stream();

        let selection_map = self.config.map.clone();
        let selection_requests = map_ref! {
            let float_id = self.selection.selected_float_signal(),
            let locations = self.fetch.locations().signal().map(|state| state.data) =>
            search::selected_location(locations, float_id.as_ref())
        }
        .map(move |location| location.and_then(|location| FlyTo::to_location(&location, &selection_map)))
        .dedupe()
        .to_stream();

        stream::select(search_requests, selection_requests).filter_map(future::ready)
    }

    pub fn available_parameters(&self) -> Vec<Parameter> {
        measurements::available_parameters(&self.fetch.measurements().data())
    }

    /// Depth profile of the selected parameter for the selected profile.
    pub fn profile_series(&self) -> Vec<DepthPoint> {
        measurements::profile_series(
            &self.fetch.measurements().data(),
            self.selection.selected_parameter(),
        )
    }

    pub fn latest_chart(&self) -> Option<RenderedChart> {
        self.charts.render(self.chat.latest_visualization().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartBody;
    use crate::testing::{Call, ManualTimer, ScriptedGateway};
    use futures::executor::LocalPool;
    use serde_json::json;

    fn session_with(config_text: &str) -> (LocalPool, Rc<ScriptedGateway>, Session) {
        let pool = LocalPool::new();
        let gateway = Rc::new(ScriptedGateway::default());
        let session = Session::start_with_toml(
            config_text,
            gateway.clone(),
            Rc::new(pool.spawner()),
            Rc::new(ManualTimer::default()),
        )
        .unwrap();
        (pool, gateway, session)
    }

    #[test]
    fn unsupported_config_falls_back_with_a_notice() {
        let (_pool, _gateway, session) = session_with("[app]\nversion = \"9.9.9\"\n");
        assert_eq!(session.config, AppConfig::default());

        let alerts = session.notifications.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "config_error");
    }

    #[test]
    fn selected_profile_feeds_the_parameter_chart() {
        let (mut pool, gateway, session) = session_with("[selection]\ndefault_parameter = \"doxy\"\n");
        session.selection.select_float(Some("2902746".to_string()));
        session.selection.select_profile(Some(31));
        pool.run_until_stalled();

        let index = gateway.find(&Call::Measurements(31)).unwrap();
        gateway.respond(
            index,
            json!([
                {"pressure": 5.0, "temp": 28.0, "doxy": 210.0},
                {"pressure": 50.0, "temp": 24.0, "doxy": null}
            ]),
        );
        pool.run_until_stalled();

        assert_eq!(
            session.available_parameters(),
            [Parameter::Temp, Parameter::Doxy]
        );
        assert_eq!(session.profile_series().len(), 1);

        session.selection.select_parameter(Parameter::Temp);
        assert_eq!(session.profile_series().len(), 2);
        assert_eq!(session.selection.selected_float().as_deref(), Some("2902746"));
    }

    fn loaded_session() -> (LocalPool, Session) {
        let (mut pool, gateway, session) = session_with("");
        let index = gateway.find(&Call::Locations { active_only: true }).unwrap();
        gateway.respond(
            index,
            json!([
                {"id": "2902746", "latitude": 12.0, "longitude": 70.0},
                {"id": "2902750", "latitude": 15.0, "longitude": 65.0}
            ]),
        );
        pool.run_until_stalled();
        (pool, session)
    }

    #[test]
    fn fly_to_follows_search_over_loaded_locations() {
        use futures::FutureExt;

        let (_pool, session) = loaded_session();
        assert_eq!(session.initial_view().zoom, 4);

        let mut fly_to = session.fly_to_requests().boxed_local();
        assert_eq!(fly_to.next().now_or_never(), None);

        session.search.set_text("2750");
        let target = fly_to.next().now_or_never().flatten().unwrap();
        assert_eq!(target.center.latitude, 15.0);
        assert_eq!(target.zoom, 6);

        let mut views = session.map_view_signal().to_stream().boxed_local();
        let view = views.next().now_or_never().flatten().unwrap();
        assert_eq!(view.result_count(), 1);
        assert_eq!(view.markers().count(), 1);
    }

    #[test]
    fn search_for_the_centered_float_still_flies() {
        use futures::FutureExt;

        let (_pool, session) = loaded_session();
        session.selection.select_float(Some("2902750".to_string()));

        let mut fly_to = session.fly_to_requests().boxed_local();
        let selected = fly_to.next().now_or_never().flatten().unwrap();
        assert_eq!(selected.center.latitude, 15.0);
        assert_eq!(fly_to.next().now_or_never(), None);

        session.search.set_text("2750");
        assert_eq!(fly_to.next().now_or_never().flatten(), Some(selected));

        // Selecting another float while the one-match search is active.
        session.selection.select_float(Some("2902746".to_string()));
        let next = fly_to.next().now_or_never().flatten().unwrap();
        assert_eq!(next.center.latitude, 12.0);
        assert_eq!(fly_to.next().now_or_never(), None);
    }

    #[test]
    fn latest_answer_chart_is_rendered() {
        let (mut pool, gateway, session) = session_with("");
        session.chat.submit("show a table");
        pool.run_until_stalled();

        let index = gateway.calls().iter().position(|call| matches!(call, Call::Chat(_))).unwrap();
        gateway.respond(
            index,
            json!({
                "role": "ai",
                "content": "Here you go",
                "visualization": {
                    "chart_type": "table",
                    "title": "Floats",
                    "data": [{"id": 1}]
                }
            }),
        );
        pool.run_until_stalled();

        let chart = session.latest_chart().unwrap();
        assert_eq!(chart.title, "Floats");
        assert!(matches!(chart.body, ChartBody::Table(_)));
    }
}
