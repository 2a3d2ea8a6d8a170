//! Ranking of discovery candidates for the nearby / recent tabs.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smting_types::models::{Gender, Profile, Tendency};

use crate::clock::Clock;
use crate::config::DiscoveryDefaults;
use crate::error::CoreError;
use crate::geo;
use crate::matching;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Closest first, limited to a radius around the viewer.
    Proximity,
    /// Most recently active first, limited to a recent activity window.
    Recency,
}

/// The four discovery tabs of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryTab {
    NearbyFemale,
    NearbyMale,
    RecentFemale,
    RecentMale,
}

impl DiscoveryTab {
    pub fn gender(self) -> Gender {
        match self {
            Self::NearbyFemale | Self::RecentFemale => Gender::Female,
            Self::NearbyMale | Self::RecentMale => Gender::Male,
        }
    }

    pub fn mode(self) -> DiscoveryMode {
        match self {
            Self::NearbyFemale | Self::NearbyMale => DiscoveryMode::Proximity,
            Self::RecentFemale | Self::RecentMale => DiscoveryMode::Recency,
        }
    }
}

impl FromStr for DiscoveryTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nearby_female" => Ok(Self::NearbyFemale),
            "nearby_male" => Ok(Self::NearbyMale),
            "recent_female" => Ok(Self::RecentFemale),
            "recent_male" => Ok(Self::RecentMale),
            other => Err(format!("unknown discovery tab {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryContext {
    pub gender: Gender,
    pub mode: DiscoveryMode,
    /// `None` means any tendency.
    pub tendency: Option<Tendency>,
    pub max_distance_km: Option<f64>,
}

impl DiscoveryContext {
    pub fn for_tab(tab: DiscoveryTab) -> Self {
        Self {
            gender: tab.gender(),
            mode: tab.mode(),
            tendency: None,
            max_distance_km: None,
        }
    }

    pub fn with_tendency(mut self, tendency: Option<Tendency>) -> Self {
        self.tendency = tendency;
        self
    }

    pub fn with_max_distance(mut self, km: Option<f64>) -> Self {
        self.max_distance_km = km;
        self
    }
}

/// A candidate that survived filtering, with its score against the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedProfile {
    pub profile: Profile,
    pub match_rate: u8,
    pub distance_km: Option<f64>,
}

/// Filter and order `candidates` for `viewer`.
///
/// Without a viewer no distance or recency filter applies and every match
/// rate is 0; gender and tendency filters still do. Ties keep input order.
pub fn rank(
    candidates: Vec<Profile>,
    viewer: Option<&Profile>,
    ctx: &DiscoveryContext,
    defaults: &DiscoveryDefaults,
    now: DateTime<Utc>,
) -> Vec<RankedProfile> {
    let viewer_location = viewer.and_then(|v| v.location);
    let active_since = now - defaults.recent_window;

    let mut ranked: Vec<RankedProfile> = candidates
        .into_iter()
        .filter(|c| viewer.is_none_or(|v| v.id != c.id))
        .filter(|c| c.gender == ctx.gender)
        .filter(|c| ctx.tendency.is_none_or(|t| c.tendency == t))
        .filter_map(|c| {
            let distance_km = viewer_location
                .zip(c.location)
                .map(|(a, b)| geo::distance_between(&a, &b));

            if viewer.is_some() {
                if ctx.mode == DiscoveryMode::Recency
                    && !c.last_active_at.is_some_and(|at| at >= active_since)
                {
                    return None;
                }

                let radius = match ctx.mode {
                    DiscoveryMode::Proximity => {
                        Some(ctx.max_distance_km.unwrap_or(defaults.nearby_radius_km))
                    }
                    DiscoveryMode::Recency => ctx.max_distance_km,
                };
                if let Some(radius) = radius {
                    // A viewer without coordinates cannot filter by distance.
                    if viewer_location.is_some() && !distance_km.is_some_and(|d| d <= radius) {
                        return None;
                    }
                }
            }

            let match_rate = viewer.map_or(0, |v| matching::profile_match_rate(v, &c));
            Some(RankedProfile {
                profile: c,
                match_rate,
                distance_km,
            })
        })
        .collect();

    match ctx.mode {
        DiscoveryMode::Proximity => ranked.sort_by(|a, b| {
            none_last(a.distance_km, b.distance_km, |x, y| x.total_cmp(y))
        }),
        DiscoveryMode::Recency => ranked.sort_by(|a, b| {
            none_last(a.profile.last_active_at, b.profile.last_active_at, |x, y| y.cmp(x))
        }),
    }

    ranked
}

/// Load candidates for `viewer_id` and rank them. A viewer who has not
/// registered a profile yet still gets results, unscored and unfiltered by
/// distance or recency.
pub fn discover(
    store: &dyn ProfileStore,
    clock: &dyn Clock,
    defaults: &DiscoveryDefaults,
    viewer_id: &str,
    ctx: &DiscoveryContext,
) -> Result<Vec<RankedProfile>, CoreError> {
    let viewer = store.get_profile(viewer_id)?;
    let candidates = store.list_profiles(viewer_id)?;
    Ok(rank(candidates, viewer.as_ref(), ctx, defaults, clock.now()))
}

fn none_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::profile;
    use chrono::Duration;
    use smting_types::models::Location;

    const GANGNAM: Location = Location {
        latitude: 37.4979,
        longitude: 127.0276,
    };

    fn at(lat_offset: f64) -> Option<Location> {
        Some(Location {
            latitude: GANGNAM.latitude + lat_offset,
            longitude: GANGNAM.longitude,
        })
    }

    fn viewer() -> Profile {
        let mut v = profile("viewer", Gender::Male, Tendency::Submissive, &["A", "B", "C"]);
        v.location = Some(GANGNAM);
        v
    }

    fn ids(ranked: &[RankedProfile]) -> Vec<&str> {
        ranked.iter().map(|r| r.profile.id.as_str()).collect()
    }

    #[test]
    fn proximity_orders_by_distance_and_drops_far_or_unknown() {
        let now = Utc::now();
        let mut far = profile("far", Gender::Female, Tendency::Dominant, &[]);
        far.location = at(0.5); // ~55 km
        let mut mid = profile("mid", Gender::Female, Tendency::Dominant, &[]);
        mid.location = at(0.1);
        let mut near = profile("near", Gender::Female, Tendency::Dominant, &[]);
        near.location = at(0.01);
        let unknown = profile("unknown", Gender::Female, Tendency::Dominant, &[]);
        let mut male = profile("male", Gender::Male, Tendency::Dominant, &[]);
        male.location = at(0.0);

        let ctx = DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale);
        let v = viewer();
        let ranked = rank(
            vec![far, mid, unknown, near, male],
            Some(&v),
            &ctx,
            &DiscoveryDefaults::default(),
            now,
        );

        assert_eq!(ids(&ranked), vec!["near", "mid"]);
        assert!(ranked[0].distance_km.unwrap() <= ranked[1].distance_km.unwrap());
    }

    #[test]
    fn max_distance_overrides_default_radius() {
        let mut far = profile("far", Gender::Female, Tendency::Dominant, &[]);
        far.location = at(0.5);
        let mut near = profile("near", Gender::Female, Tendency::Dominant, &[]);
        near.location = at(0.01);

        let v = viewer();
        let wide =
            DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale).with_max_distance(Some(100.0));
        let ranked = rank(
            vec![far.clone(), near.clone()],
            Some(&v),
            &wide,
            &DiscoveryDefaults::default(),
            Utc::now(),
        );
        assert_eq!(ids(&ranked), vec!["near", "far"]);

        let tight =
            DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale).with_max_distance(Some(0.5));
        let ranked = rank(
            vec![far, near],
            Some(&v),
            &tight,
            &DiscoveryDefaults::default(),
            Utc::now(),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn recency_keeps_last_ten_hours_newest_first() {
        let now = Utc::now();
        let mut old = profile("old", Gender::Male, Tendency::Dominant, &[]);
        old.last_active_at = Some(now - Duration::hours(11));
        let mut hour = profile("hour", Gender::Male, Tendency::Dominant, &[]);
        hour.last_active_at = Some(now - Duration::hours(1));
        let mut minute = profile("minute", Gender::Male, Tendency::Dominant, &[]);
        minute.last_active_at = Some(now - Duration::minutes(1));
        let never = profile("never", Gender::Male, Tendency::Dominant, &[]);

        let ctx = DiscoveryContext::for_tab(DiscoveryTab::RecentMale);
        let v = viewer();
        let ranked = rank(
            vec![old, hour, never, minute],
            Some(&v),
            &ctx,
            &DiscoveryDefaults::default(),
            now,
        );
        assert_eq!(ids(&ranked), vec!["minute", "hour"]);
    }

    #[test]
    fn tendency_filter_is_exact() {
        let now = Utc::now();
        let mut dom = profile("dom", Gender::Female, Tendency::Dominant, &[]);
        dom.last_active_at = Some(now);
        let mut sw = profile("sw", Gender::Female, Tendency::Switch, &[]);
        sw.last_active_at = Some(now);

        let ctx = DiscoveryContext::for_tab(DiscoveryTab::RecentFemale)
            .with_tendency(Some(Tendency::Switch));
        let v = viewer();
        let ranked = rank(vec![dom, sw], Some(&v), &ctx, &DiscoveryDefaults::default(), now);
        assert_eq!(ids(&ranked), vec!["sw"]);
    }

    #[test]
    fn scores_against_viewer() {
        let mut candidate = profile("c", Gender::Female, Tendency::Dominant, &["A", "B", "D"]);
        candidate.location = at(0.0);
        let v = viewer();
        let ctx = DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale);
        let ranked = rank(
            vec![candidate],
            Some(&v),
            &ctx,
            &DiscoveryDefaults::default(),
            Utc::now(),
        );
        assert_eq!(ranked[0].match_rate, 80);
        assert_eq!(ranked[0].distance_km, Some(0.0));
    }

    #[test]
    fn missing_viewer_degrades_to_unfiltered() {
        let mut located = profile("located", Gender::Female, Tendency::Dominant, &["A"]);
        located.location = at(3.0);
        let unknown = profile("unknown", Gender::Female, Tendency::Dominant, &["A"]);
        let other = profile("other", Gender::Male, Tendency::Dominant, &["A"]);

        let ctx = DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale);
        let ranked = rank(
            vec![unknown, located, other],
            None,
            &ctx,
            &DiscoveryDefaults::default(),
            Utc::now(),
        );
        assert_eq!(ids(&ranked), vec!["unknown", "located"]);
        assert!(ranked.iter().all(|r| r.match_rate == 0 && r.distance_km.is_none()));
    }

    #[test]
    fn viewer_without_location_keeps_everyone_unknown_last() {
        let mut v = viewer();
        v.location = None;
        let a = profile("a", Gender::Female, Tendency::Dominant, &[]);
        let mut b = profile("b", Gender::Female, Tendency::Dominant, &[]);
        b.location = at(1.0);

        let ctx = DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale);
        let ranked = rank(vec![a, b], Some(&v), &ctx, &DiscoveryDefaults::default(), Utc::now());
        assert_eq!(ids(&ranked), vec!["a", "b"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let now = Utc::now();
        let mut first = profile("first", Gender::Female, Tendency::Dominant, &[]);
        first.location = at(0.02);
        let mut second = profile("second", Gender::Female, Tendency::Dominant, &[]);
        second.location = at(0.02);
        let v = viewer();
        let ctx = DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale);
        let ranked = rank(vec![first, second], Some(&v), &ctx, &DiscoveryDefaults::default(), now);
        assert_eq!(ids(&ranked), vec!["first", "second"]);
    }

    #[test]
    fn viewer_is_never_a_candidate() {
        let v = viewer();
        let mut me = v.clone();
        me.gender = Gender::Female;
        let ctx = DiscoveryContext::for_tab(DiscoveryTab::NearbyFemale);
        let ranked = rank(vec![me], Some(&v), &ctx, &DiscoveryDefaults::default(), Utc::now());
        assert!(ranked.is_empty());
    }

    #[test]
    fn discover_loads_viewer_and_candidates() {
        use crate::clock::FixedClock;
        use crate::test_support::MemoryStore;

        let now = Utc::now();
        let store = MemoryStore::default();
        let mut v = viewer();
        v.last_active_at = Some(now);
        store.put(v);
        let mut her = profile("her", Gender::Female, Tendency::Dominant, &["A", "B", "D"]);
        her.last_active_at = Some(now - Duration::hours(2));
        store.put(her);

        let clock = FixedClock::new(now);
        let ctx = DiscoveryContext::for_tab(DiscoveryTab::RecentFemale);
        let ranked =
            discover(&store, &clock, &DiscoveryDefaults::default(), "viewer", &ctx).unwrap();
        assert_eq!(ids(&ranked), vec!["her"]);
        assert_eq!(ranked[0].match_rate, 80);
    }

    #[test]
    fn tab_parsing() {
        assert_eq!("recent_male".parse(), Ok(DiscoveryTab::RecentMale));
        assert_eq!(DiscoveryTab::NearbyFemale.mode(), DiscoveryMode::Proximity);
        assert!("elsewhere".parse::<DiscoveryTab>().is_err());
    }
}
