use std::collections::HashSet;

use swap_core::repository::StationApi;
use swap_core::{CoreError, Coordinates, ListQuery, Station};
use tracing::{debug, warn};

/// A station together with its distance from the user, in kilometers.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyStation<'a> {
    pub station: &'a Station,
    pub distance_km: f64,
}

/// Holds the fetched station list and the user's current pick.
pub struct StationSelector {
    stations: Vec<Station>,
    selected: Option<i64>,
}

impl StationSelector {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            stations,
            selected: None,
        }
    }

    /// Fetch every page of stations matching `query`. The page count is fixed
    /// by the first response's total, and stations repeated across pages are
    /// kept once.
    pub async fn load(api: &dyn StationApi, query: ListQuery) -> Result<Self, SelectorError> {
        let mut query = query;
        let first = api.list_stations(&query).await?;
        let last_page = first.total_pages();
        let mut stations = first.items;

        while u64::from(query.page) < last_page {
            query = query.next_page();
            let page = api.list_stations(&query).await?;
            if page.items.is_empty() {
                break;
            }
            stations.extend(page.items);
        }

        let mut seen = HashSet::new();
        let fetched = stations.len();
        stations.retain(|s| seen.insert(s.id));
        if stations.len() < fetched {
            warn!("Dropped {} duplicate stations while paging", fetched - stations.len());
        }

        debug!("Loaded {} stations", stations.len());
        Ok(Self::new(stations))
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn get(&self, station_id: i64) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == station_id)
    }

    /// Case-insensitive match on name or address.
    pub fn search(&self, text: &str) -> Vec<&Station> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.stations.iter().collect();
        }
        self.stations
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.address.as_deref().is_some_and(|a| a.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Stations ordered nearest first.
    pub fn by_distance(&self, from: Coordinates) -> Vec<NearbyStation<'_>> {
        let mut nearby: Vec<NearbyStation<'_>> = self
            .stations
            .iter()
            .map(|station| NearbyStation {
                station,
                distance_km: from.distance_km(&station.location()),
            })
            .collect();
        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        nearby
    }

    pub fn nearest(&self, from: Coordinates) -> Option<NearbyStation<'_>> {
        self.by_distance(from).into_iter().next()
    }

    pub fn select(&mut self, station_id: i64) -> Result<&Station, SelectorError> {
        let idx = self
            .stations
            .iter()
            .position(|s| s.id == station_id)
            .ok_or(SelectorError::UnknownStation(station_id))?;
        self.selected = Some(station_id);
        Ok(&self.stations[idx])
    }

    pub fn selected(&self) -> Option<&Station> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("Station not in list: {0}")]
    UnknownStation(i64),

    #[error(transparent)]
    Api(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: i64, name: &str, lat: f64, lng: f64) -> Station {
        Station {
            id,
            name: name.to_string(),
            address: Some(format!("{} street", name)),
            latitude: lat,
            longitude: lng,
            status: Some("ACTIVE".to_string()),
            battery_type_ids: vec![3],
        }
    }

    fn selector() -> StationSelector {
        StationSelector::new(vec![
            station(1, "Thủ Đức", 10.8494, 106.7537),
            station(2, "Quận 1", 10.7769, 106.7009),
            station(3, "Bình Thạnh", 10.8106, 106.7091),
        ])
    }

    #[test]
    fn test_search_by_name() {
        let selector = selector();
        let hits = selector.search("quận");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
        assert_eq!(selector.search("  ").len(), 3);
    }

    #[test]
    fn test_nearest_first() {
        let selector = selector();
        let user = Coordinates::new(10.7800, 106.7000);

        let ordered: Vec<i64> = selector.by_distance(user).iter().map(|n| n.station.id).collect();
        assert_eq!(ordered, vec![2, 3, 1]);
        assert_eq!(selector.nearest(user).unwrap().station.id, 2);
    }

    #[test]
    fn test_select_unknown_station() {
        let mut selector = selector();
        assert!(matches!(selector.select(99), Err(SelectorError::UnknownStation(99))));
        assert!(selector.selected().is_none());

        selector.select(3).unwrap();
        assert_eq!(selector.selected().unwrap().name, "Bình Thạnh");

        selector.clear();
        assert!(selector.selected().is_none());
    }

    #[tokio::test]
    async fn test_load_walks_all_pages() {
        let stations: Vec<Station> = (1..=25)
            .map(|i| station(i, &format!("Trạm {}", i), 10.7 + i as f64 / 100.0, 106.7))
            .collect();
        let api = swap_core::mock::MockBookingApi::new().with_stations(stations);

        let selector = StationSelector::load(&api, ListQuery::new(1, 10)).await.unwrap();
        assert_eq!(selector.stations().len(), 25);
        assert_eq!(api.total_calls(), 3);
    }

    /// Answers page 1 whatever page was asked for.
    struct FirstPageOnly {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl StationApi for FirstPageOnly {
        async fn list_stations(&self, _query: &ListQuery) -> swap_core::CoreResult<swap_core::Page<Station>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(swap_core::Page {
                items: (1..=10).map(|i| station(i, &format!("Trạm {}", i), 10.7, 106.7)).collect(),
                total: 25,
                page: 1,
                limit: 10,
            })
        }

        async fn get_station_by_id(&self, station_id: i64) -> swap_core::CoreResult<Station> {
            Err(CoreError::NotFound(format!("station {}", station_id)))
        }

        async fn get_cabinets_by_station_and_battery_type(
            &self,
            _station_id: i64,
            _battery_type_id: i64,
        ) -> swap_core::CoreResult<Vec<swap_core::Cabinet>> {
            Ok(Vec::new())
        }

        async fn get_cabinet_by_id(&self, cabinet_id: i64) -> swap_core::CoreResult<swap_core::Cabinet> {
            Err(CoreError::NotFound(format!("cabinet {}", cabinet_id)))
        }
    }

    #[tokio::test]
    async fn test_load_stops_when_backend_ignores_page() {
        let api = FirstPageOnly { calls: std::sync::atomic::AtomicUsize::new(0) };

        let selector = StationSelector::load(&api, ListQuery::new(1, 10)).await.unwrap();

        assert_eq!(api.calls.load(std::sync::atomic::Ordering::SeqCst), 3);
        assert_eq!(selector.stations().len(), 10);
    }
}
