//! Fetch orchestration for the selection-driven consumers
//!
//! A transition hook on the [`SelectionStore`] updates the consumers inside
//! the setter call: a new float or profile marks its consumers loading with
//! empty data, an absent one clears them. Only the requests themselves run
//! on the executor. Each distinct value issues exactly one fetch per
//! consumer.

use crate::gateway::{GatewayClient, GatewayError};
use crate::notifications::{ErrorAlert, Notifications};
use crate::resource::{Completion, Resource};
use crate::selection::{Selection, SelectionStore};
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use futures::{FutureExt, TryFutureExt};
use shared::{
    AppConfig, FetchSection, FloatId, FloatLocation, FloatSummary, GeoPoint, MapSection,
    Measurement, ProfileId, ProfileSummary,
};
use std::rc::{Rc, Weak};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Consumer {
    Floats,
    Locations,
    FloatDetail,
    Profiles,
    Measurements,
    Trajectory,
}

impl Consumer {
    pub fn name(&self) -> &'static str {
        match self {
            Consumer::Floats => "floats",
            Consumer::Locations => "locations",
            Consumer::FloatDetail => "float_detail",
            Consumer::Profiles => "profiles",
            Consumer::Measurements => "measurements",
            Consumer::Trajectory => "trajectory",
        }
    }
}

struct Inner {
    client: GatewayClient,
    spawner: Rc<dyn LocalSpawn>,
    fetch: FetchSection,
    map: MapSection,
    store: SelectionStore,
    notifications: Notifications,
    floats: Resource<Vec<FloatSummary>>,
    locations: Resource<Vec<FloatLocation>>,
    float_detail: Resource<Option<FloatSummary>>,
    profiles: Resource<Vec<ProfileSummary>>,
    measurements: Resource<Vec<Measurement>>,
    trajectory: Resource<Vec<GeoPoint>>,
}

/// Owns one [`Resource`] per consumer. Clones share the resources; the
/// store stops driving them when the last clone is dropped.
#[derive(Clone)]
pub struct FetchOrchestrator {
    inner: Rc<Inner>,
}

impl FetchOrchestrator {
    /// Hooks into the selection store, catches up with its current
    /// selection and loads the float catalog and map locations.
    ///
    /// Fails only when the executor has been shut down.
    pub fn start(
        config: &AppConfig,
        store: SelectionStore,
        notifications: Notifications,
        client: GatewayClient,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Result<Self, SpawnError> {
        let inner = Rc::new(Inner {
            client,
            spawner,
            fetch: config.fetch.clone(),
            map: config.map.clone(),
            store,
            notifications,
            floats: Resource::new(Consumer::Floats.name()),
            locations: Resource::new(Consumer::Locations.name()),
            float_detail: Resource::new(Consumer::FloatDetail.name()),
            profiles: Resource::new(Consumer::Profiles.name()),
            measurements: Resource::new(Consumer::Measurements.name()),
            trajectory: Resource::new(Consumer::Trajectory.name()),
        });

        inner.spawner.status_local()?;

        let weak: Weak<Inner> = Rc::downgrade(&inner);
        inner.store.on_transition(move |previous, next| {
            if let Some(inner) = weak.upgrade() {
                inner.selection_changed(previous, next);
            }
        });

        inner.float_changed(inner.store.selected_float());
        inner.profile_changed(inner.store.selected_profile());
        inner.load_floats();
        inner.load_locations();

        Ok(Self { inner })
    }

    pub fn floats(&self) -> &Resource<Vec<FloatSummary>> {
        &self.inner.floats
    }

    pub fn locations(&self) -> &Resource<Vec<FloatLocation>> {
        &self.inner.locations
    }

    pub fn float_detail(&self) -> &Resource<Option<FloatSummary>> {
        &self.inner.float_detail
    }

    pub fn profiles(&self) -> &Resource<Vec<ProfileSummary>> {
        &self.inner.profiles
    }

    pub fn measurements(&self) -> &Resource<Vec<Measurement>> {
        &self.inner.measurements
    }

    /// Polyline positions of the selected float; points without both
    /// coordinates are dropped.
    pub fn trajectory(&self) -> &Resource<Vec<GeoPoint>> {
        &self.inner.trajectory
    }

    pub fn refresh_locations(&self) {
        self.inner.load_locations();
    }

    /// Re-issues the consumer's fetch for the current key as a new
    /// generation. Returns `false` when the consumer has no key to fetch.
    pub fn retry(&self, consumer: Consumer) -> bool {
        let inner = &self.inner;
        match consumer {
            Consumer::Floats => inner.load_floats(),
            Consumer::Locations => inner.load_locations(),
            Consumer::FloatDetail | Consumer::Profiles | Consumer::Trajectory => {
                let Some(float_id) = inner.store.selected_float() else {
                    return false;
                };
                match consumer {
                    Consumer::FloatDetail => inner.load_float_detail(&float_id),
                    Consumer::Profiles => inner.load_profiles(&float_id),
                    _ => inner.load_trajectory(&float_id),
                }
            }
            Consumer::Measurements => {
                let Some(profile_id) = inner.store.selected_profile() else {
                    return false;
                };
                inner.load_measurements(profile_id);
            }
        }
        true
    }
}

impl Inner {
    fn selection_changed(&self, previous: &Selection, next: &Selection) {
        if previous.float != next.float {
            self.float_changed(next.float.clone());
        }
        if previous.profile != next.profile {
            self.profile_changed(next.profile);
        }
    }

    fn float_changed(&self, float_id: Option<FloatId>) {
        match float_id {
            Some(float_id) => {
                log::info!("Float {float_id} selected, loading detail, profiles and trajectory");
                self.load_float_detail(&float_id);
                self.load_profiles(&float_id);
                self.load_trajectory(&float_id);
            }
            None => {
                self.float_detail.clear();
                self.profiles.clear();
                self.trajectory.clear();
            }
        }
    }

    fn profile_changed(&self, profile_id: Option<ProfileId>) {
        match profile_id {
            Some(profile_id) => {
                log::info!("Profile {profile_id} selected, loading measurements");
                self.load_measurements(profile_id);
            }
            None => self.measurements.clear(),
        }
    }

    fn load_floats(&self) {
        let request = self.client.call(|gateway| gateway.floats());
        self.spawn_load(Consumer::Floats, &self.floats, request);
    }

    fn load_locations(&self) {
        let active_only = self.map.active_only;
        let request = self.client.call(|gateway| gateway.locations(active_only));
        self.spawn_load(Consumer::Locations, &self.locations, request);
    }

    fn load_float_detail(&self, float_id: &FloatId) {
        let request = self
            .client
            .call(|gateway| gateway.float_detail(float_id))
            .map_ok(Some)
            .boxed_local();
        self.spawn_load(Consumer::FloatDetail, &self.float_detail, request);
    }

    fn load_profiles(&self, float_id: &FloatId) {
        let with_data_only = self.fetch.profiles_with_data_only;
        let request = self
            .client
            .call(|gateway| gateway.profiles(float_id, with_data_only));
        self.spawn_load(Consumer::Profiles, &self.profiles, request);
    }

    fn load_measurements(&self, profile_id: ProfileId) {
        let request = self.client.call(|gateway| gateway.measurements(profile_id));
        self.spawn_load(Consumer::Measurements, &self.measurements, request);
    }

    fn load_trajectory(&self, float_id: &FloatId) {
        let request = self
            .client
            .call(|gateway| gateway.trajectory(float_id))
            .map_ok(|points| points.iter().filter_map(|point| point.position()).collect::<Vec<_>>())
            .boxed_local();
        self.spawn_load(Consumer::Trajectory, &self.trajectory, request);
    }

    fn spawn_load<T>(
        &self,
        consumer: Consumer,
        resource: &Resource<T>,
        request: LocalBoxFuture<'static, Result<T, GatewayError>>,
    ) where
        T: Clone + Default + 'static,
    {
        let load = resource.load(request);
        let notifications = self.notifications.clone();
        let task = async move {
            if let Completion::Failed(error) = load.await {
                notifications.push(ErrorAlert::new_fetch_error(consumer.name(), &error));
            }
        };
        if let Err(error) = self.spawner.spawn_local(task) {
            log::error!("Failed to start {} request: {error}", consumer.name());
            resource.clear();
        }
    }
}
