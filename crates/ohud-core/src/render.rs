// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Read-only views handed to the map renderer and the routing service.

use crate::catalog::Catalog;
use crate::chain::{Chain, NodeRef};
use crate::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerRole {
    Primary,
    Chain,
    DeeperTier,
    AllRevealed,
}

impl MarkerRole {
    fn for_tier(tier: usize) -> Self {
        match tier {
            0 => MarkerRole::Primary,
            1 => MarkerRole::Chain,
            _ => MarkerRole::DeeperTier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub position: GeoPoint,
    pub tag: String,
    pub description: String,
    pub role: MarkerRole,
    /// Chain position; `None` for revealed non-chain targets.
    pub node: Option<NodeRef>,
    pub focused: bool,
}

/// Chain members in tier order, followed by every other catalog target when
/// `reveal_all` is set.
pub fn markers(
    chain: &Chain,
    catalog: &Catalog,
    focus: Option<NodeRef>,
    reveal_all: bool,
) -> Vec<Marker> {
    let mut out: Vec<Marker> = chain
        .node_refs()
        .filter_map(|node| chain.get(node).map(|n| (node, n)))
        .map(|(node, n)| Marker {
            name: n.target.name.clone(),
            position: n.target.position,
            tag: n.target.tag.clone(),
            description: n.target.description.clone(),
            role: MarkerRole::for_tier(node.tier),
            node: Some(node),
            focused: focus == Some(node),
        })
        .collect();

    if reveal_all {
        let members = chain.member_names();
        out.extend(
            catalog
                .iter()
                .filter(|t| !members.contains(t.name.as_str()))
                .map(|t| Marker {
                    name: t.name.clone(),
                    position: t.position,
                    tag: t.tag.clone(),
                    description: t.description.clone(),
                    role: MarkerRole::AllRevealed,
                    node: None,
                    focused: false,
                }),
        );
    }
    out
}

/// `[user, primary, ..., focused]` along the chain's parent links. Without a
/// focus the path stops at the primary; without a chain it is just the user.
pub fn waypoints(user: GeoPoint, chain: &Chain, focus: Option<NodeRef>) -> Vec<GeoPoint> {
    let mut points = vec![user];
    let leaf = focus
        .filter(|f| chain.get(*f).is_some())
        .or_else(|| chain.primary().map(|_| NodeRef::PRIMARY));
    if let Some(leaf) = leaf {
        if let Ok(path) = chain.path_to(leaf) {
            points.extend(
                path.into_iter()
                    .filter_map(|node| chain.get(node))
                    .map(|n| n.target.position),
            );
        }
    }
    points
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Chain generation the waypoints were taken from.
    pub generation: u64,
    pub waypoints: Vec<GeoPoint>,
    pub issued_at: DateTime<Utc>,
}

/// Receives waypoint lists for path drawing. Fire-and-forget: nothing a sink
/// does flows back into the session.
pub trait RouteSink {
    fn submit(&self, request: RouteRequest);
}

/// Sink that only logs the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRouteSink;

impl RouteSink for LogRouteSink {
    fn submit(&self, request: RouteRequest) {
        log::info!(
            "Route requested — generation={} waypoints={}",
            request.generation,
            request.waypoints.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TargetRecord;
    use crate::chain::ChainSelector;
    use crate::geo::destination_point;
    use std::collections::BTreeSet;

    const ORIGIN: GeoPoint = GeoPoint { lat: 0.0, lon: 0.0 };

    fn record(name: &str, bearing: f64, distance: f64) -> TargetRecord {
        let p = destination_point(ORIGIN, bearing, distance);
        TargetRecord::new(name, p.lat, p.lon, "poi")
    }

    fn setup() -> (Catalog, Chain) {
        let mut d = record("D", 130.0, 300.0);
        d.description = "Second stop past B.".to_string();
        let catalog = Catalog::load(vec![
            record("A", 10.0, 100.0),
            record("B", 130.0, 150.0),
            record("C", 250.0, 200.0),
            d,
            record("Z", 60.0, 900.0),
        ])
        .unwrap();
        let selector = ChainSelector::default();
        let candidates = catalog.filter_by_tags(&BTreeSet::new());
        let mut chain = selector.rebuild(ORIGIN, &candidates).unwrap();
        selector
            .extend(&mut chain, NodeRef::new(1, 0), &candidates)
            .unwrap();
        (catalog, chain)
    }

    #[test]
    fn test_marker_roles_by_tier() {
        let (catalog, chain) = setup();
        let markers = markers(&chain, &catalog, Some(NodeRef::new(2, 0)), false);
        let roles: Vec<(&str, MarkerRole, bool)> = markers
            .iter()
            .map(|m| (m.name.as_str(), m.role, m.focused))
            .collect();
        assert_eq!(
            roles,
            vec![
                ("A", MarkerRole::Primary, false),
                ("B", MarkerRole::Chain, false),
                ("C", MarkerRole::Chain, false),
                ("D", MarkerRole::DeeperTier, true),
                ("Z", MarkerRole::DeeperTier, false),
            ]
        );
        assert_eq!(markers[3].description, "Second stop past B.");
    }

    #[test]
    fn test_reveal_all_adds_remaining_targets() {
        let mut far = record("far", 60.0, 900.0);
        far.description = "Out past the river.".to_string();
        let catalog = Catalog::load(vec![record("A", 10.0, 100.0), far]).unwrap();
        let candidates = catalog.filter_by_tags(&BTreeSet::new());
        let chain = ChainSelector::default().rebuild(ORIGIN, &candidates).unwrap();

        let hidden = markers(&chain, &catalog, None, false);
        assert_eq!(hidden.len(), 1);

        let shown = markers(&chain, &catalog, None, true);
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[1].name, "far");
        assert_eq!(shown[1].role, MarkerRole::AllRevealed);
        assert_eq!(shown[1].node, None);
        assert_eq!(shown[1].description, "Out past the river.");
    }

    #[test]
    fn test_waypoints_follow_focus_path() {
        let (_, chain) = setup();
        let user = ORIGIN;

        let to_primary = waypoints(user, &chain, None);
        assert_eq!(to_primary.len(), 2);

        let deep = waypoints(user, &chain, Some(NodeRef::new(2, 0)));
        let expect: Vec<GeoPoint> = vec![
            user,
            chain.get(NodeRef::new(0, 0)).unwrap().target.position,
            chain.get(NodeRef::new(1, 0)).unwrap().target.position,
            chain.get(NodeRef::new(2, 0)).unwrap().target.position,
        ];
        assert_eq!(deep, expect);

        let empty = Chain::empty(user);
        assert_eq!(waypoints(user, &empty, None), vec![user]);
    }

    #[test]
    fn test_role_serializes_kebab_case() {
        let json = serde_json::to_string(&MarkerRole::AllRevealed).unwrap();
        assert_eq!(json, "\"all-revealed\"");
    }
}
