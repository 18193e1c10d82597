//! Map search filtering and fly-to navigation
//!
//! Everything here is a pure function of the current inputs; nothing
//! remembers a previous fly target. The search match and the selected
//! float are separate navigation sources.

use crate::selection::{Selection, SelectionStore};
use futures_signals::map_ref;
use futures_signals::signal::{Mutable, Signal};
use shared::{FloatId, FloatLocation, GeoPoint, MapSection};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapView {
    /// Matching locations in source order, valid or not.
    pub visible: Vec<FloatLocation>,
    /// The only match, when exactly one location matches and it has a position.
    pub fly_target: Option<FloatLocation>,
    /// Location of the selected float, when it has a position.
    pub selected: Option<FloatLocation>,
}

impl MapView {
    /// Shown as "N found"; counts records without coordinates too.
    pub fn result_count(&self) -> usize {
        self.visible.len()
    }

    /// Locations that can be drawn as markers.
    pub fn markers(&self) -> impl Iterator<Item = &FloatLocation> {
        self.visible.iter().filter(|location| location.is_valid())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlyTo {
    pub center: GeoPoint,
    pub zoom: u8,
}

impl FlyTo {
    pub fn to_location(location: &FloatLocation, map: &MapSection) -> Option<FlyTo> {
        location.position().map(|center| FlyTo {
            center,
            zoom: map.fly_to_zoom,
        })
    }

    pub fn initial(map: &MapSection) -> FlyTo {
        FlyTo {
            center: GeoPoint {
                latitude: map.center_latitude,
                longitude: map.center_longitude,
            },
            zoom: map.initial_zoom,
        }
    }
}

/// Subsequence of `locations` whose id contains `search` (case-sensitive).
/// Blank searches match everything.
pub fn filter_locations(locations: &[FloatLocation], search: &str) -> Vec<FloatLocation> {
    if search.trim().is_empty() {
        return locations.to_vec();
    }
    locations
        .iter()
        .filter(|location| location.id.contains(search))
        .cloned()
        .collect()
}

/// The only visible location, when it has a position.
pub fn fly_target(visible: &[FloatLocation]) -> Option<FloatLocation> {
    match visible {
        [only] if only.is_valid() => Some(only.clone()),
        _ => None,
    }
}

pub fn selected_location(locations: &[FloatLocation], float_id: Option<&FloatId>) -> Option<FloatLocation> {
    let float_id = float_id?;
    locations
        .iter()
        .find(|location| &location.id == float_id && location.is_valid())
        .cloned()
}

pub fn derive_map_view(locations: &[FloatLocation], search: &str, selection: &Selection) -> MapView {
    let visible = filter_locations(locations, search);
    MapView {
        fly_target: fly_target(&visible),
        selected: selected_location(locations, selection.float.as_ref()),
        visible,
    }
}

/// Search box state for the map header.
#[derive(Clone, Debug, Default)]
pub struct SearchFilter {
    text: Mutable<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.text.set_neq(text.into());
    }

    pub fn text(&self) -> String {
        self.text.get_cloned()
    }

    /// Recomputed whenever the search text, the location list or the
    /// selection changes.
    pub fn map_view_signal(
        &self,
        locations_signal: impl Signal<Item = Vec<FloatLocation>>,
        store: &SelectionStore,
    ) -> impl Signal<Item = MapView> {
        map_ref! {
            let search = self.text.signal_cloned(),
            let locations = locations_signal,
            let selection = store.signal() =>
            derive_map_view(locations, search, selection)
        }
    }

    /// Single search match. Emits on every change of the search text or the
    /// location list, also when the match is where the map already is.
    pub fn fly_target_signal<L>(&self, locations_signal: L) -> impl Signal<Item = Option<FloatLocation>> + use<L>
    where
        L: Signal<Item = Vec<FloatLocation>>,
    {
        map_ref! {
            let search = self.text.signal_cloned(),
            let locations = locations_signal =>
            fly_target(&filter_locations(locations, search))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str) -> FloatLocation {
        FloatLocation {
            id: id.to_string(),
            latitude: Some(10.0),
            longitude: Some(70.0),
            last_report_date: Some("2024-01-01".to_string()),
            project_name: "ARGO INDIA".to_string(),
        }
    }

    fn ids(locations: &[FloatLocation]) -> Vec<&str> {
        locations.iter().map(|location| location.id.as_str()).collect()
    }

    fn sample() -> Vec<FloatLocation> {
        ["12", "120", "7", "812"].into_iter().map(location).collect()
    }

    #[test]
    fn substring_matches_keep_source_order() {
        let view = derive_map_view(&sample(), "12", &Selection::default());
        assert_eq!(ids(&view.visible), ["12", "120", "812"]);
        assert_eq!(view.fly_target, None);
        assert_eq!(view.result_count(), 3);
    }

    #[test]
    fn single_match_becomes_fly_target() {
        let view = derive_map_view(&sample(), "7", &Selection::default());
        assert_eq!(ids(&view.visible), ["7"]);
        assert_eq!(view.fly_target, Some(location("7")));
    }

    #[test]
    fn blank_search_shows_everything() {
        for search in ["", "   ", "\t"] {
            let view = derive_map_view(&sample(), search, &Selection::default());
            assert_eq!(view.visible, sample());
            assert_eq!(view.fly_target, None);
        }
    }

    #[test]
    fn no_match_is_an_empty_view() {
        let view = derive_map_view(&sample(), "999", &Selection::default());
        assert!(view.visible.is_empty());
        assert_eq!(view.result_count(), 0);
        assert_eq!(view.fly_target, None);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let locations = vec![location("ab1"), location("AB2")];
        assert_eq!(ids(&filter_locations(&locations, "ab")), ["ab1"]);
    }

    #[test]
    fn invalid_records_count_but_never_fly() {
        let mut adrift = location("4501");
        adrift.longitude = None;
        let locations = vec![adrift, location("12")];

        let view = derive_map_view(&locations, "4501", &Selection::default());
        assert_eq!(view.result_count(), 1);
        assert_eq!(view.fly_target, None);
        assert_eq!(view.markers().count(), 0);

        let everything = derive_map_view(&locations, "", &Selection::default());
        assert_eq!(everything.result_count(), 2);
        assert_eq!(ids(&everything.markers().cloned().collect::<Vec<_>>()), ["12"]);
    }

    #[test]
    fn repeated_derivation_is_idempotent() {
        let selection = Selection {
            float: Some("7".to_string()),
            ..Selection::default()
        };
        let first = derive_map_view(&sample(), "7", &selection);
        let second = derive_map_view(&sample(), "7", &selection);
        assert_eq!(first, second);
        assert_eq!(first.fly_target, Some(location("7")));
        assert_eq!(first.selected, Some(location("7")));
    }

    #[test]
    fn search_match_and_selection_are_kept_apart() {
        let mut selected = location("12");
        selected.latitude = Some(-5.0);
        let locations = vec![selected.clone(), location("7")];
        let selection = Selection {
            float: Some("12".to_string()),
            ..Selection::default()
        };

        let searching = derive_map_view(&locations, "7", &selection);
        assert_eq!(searching.fly_target, Some(location("7")));
        assert_eq!(searching.selected, Some(selected));

        let browsing = derive_map_view(&locations, "", &selection);
        assert_eq!(browsing.fly_target, None);
        assert_eq!(selected_location(&locations, None), None);
        assert_eq!(selected_location(&locations, Some(&"99".to_string())), None);
    }

    #[test]
    fn fly_to_uses_configured_zoom() {
        let map = MapSection::default();
        let fly = FlyTo::to_location(&location("7"), &map).unwrap();
        assert_eq!(fly.zoom, 6);
        assert_eq!(fly.center.latitude, 10.0);
        assert_eq!(FlyTo::initial(&map).zoom, 4);
    }

    #[tokio::test]
    async fn map_view_signal_follows_search_text() {
        use futures::StreamExt;
        use futures_signals::signal::{SignalExt, always};

        let search = SearchFilter::new();
        let store = SelectionStore::default();
        let mut views = search
            .map_view_signal(always(sample()), &store)
            .to_stream()
            .boxed_local();

        assert_eq!(views.next().await.unwrap().result_count(), 4);

        search.set_text("81");
        let view = views.next().await.unwrap();
        assert_eq!(view.fly_target, Some(location("812")));
    }

    #[test]
    fn fly_target_signal_repeats_an_unchanged_match() {
        use futures::{FutureExt, StreamExt};
        use futures_signals::signal::SignalExt;

        let search = SearchFilter::new();
        let locations = Mutable::new(sample());
        let mut targets = search
            .fly_target_signal(locations.signal_cloned())
            .to_stream()
            .boxed_local();
        assert_eq!(targets.next().now_or_never(), Some(Some(None)));

        search.set_text("7");
        assert_eq!(targets.next().now_or_never(), Some(Some(Some(location("7")))));

        // Same match again after the location list reloads.
        locations.set(sample());
        assert_eq!(targets.next().now_or_never(), Some(Some(Some(location("7")))));
        assert_eq!(targets.next().now_or_never(), None);
    }
}
