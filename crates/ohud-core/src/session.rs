// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::catalog::{Catalog, Target};
use crate::chain::{Chain, ChainSelector, ChainState, NodeRef};
use crate::config::HudConfig;
use crate::focus::FocusController;
use crate::geo::{self, GeoPoint};
use crate::render::{self, Marker, RouteRequest, RouteSink};
use crate::HudError;
use rand::Rng;
use std::collections::BTreeSet;
use std::sync::Arc;

/// An expansion requested against a specific chain generation.
///
/// Applying it after a rebuild has replaced the chain fails with
/// [`HudError::StaleExpansion`] instead of grafting onto the new chain. If a
/// later tap replaced the pivot's tier, the ticket fails with
/// [`HudError::NodeNotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionTicket {
    pub generation: u64,
    pub pivot: NodeRef,
    /// Target that sat at `pivot` when the ticket was taken.
    pub pivot_name: String,
}

/// One user's exploration state: the chain, where it is anchored, and what is focused.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    config: HudConfig,
    selector: ChainSelector,
    reference: GeoPoint,
    tag_filter: BTreeSet<String>,
    chain: Chain,
    pivot: Option<NodeRef>,
    focus: FocusController,
    reveal_all: bool,
    generation: u64,
}

impl Session {
    /// Creates an unbuilt session. Call [`Session::rebuild`] to select the first chain.
    pub fn new(
        catalog: Arc<Catalog>,
        config: HudConfig,
        reference: GeoPoint,
    ) -> Result<Self, HudError> {
        config.validate()?;
        check_reference(reference)?;
        Ok(Self {
            selector: ChainSelector::from(&config),
            focus: FocusController::from(&config),
            catalog,
            config,
            reference,
            tag_filter: BTreeSet::new(),
            chain: Chain::empty(reference),
            pivot: None,
            reveal_all: false,
            generation: 0,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &HudConfig {
        &self.config
    }

    pub fn reference(&self) -> GeoPoint {
        self.reference
    }

    pub fn tag_filter(&self) -> &BTreeSet<String> {
        &self.tag_filter
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn state(&self) -> ChainState {
        self.chain.state()
    }

    pub fn pivot(&self) -> Option<NodeRef> {
        self.pivot
    }

    pub fn focus(&self) -> Option<NodeRef> {
        self.focus.focus()
    }

    pub fn focus_controller(&self) -> &FocusController {
        &self.focus
    }

    pub fn reveal_all(&self) -> bool {
        self.reveal_all
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the chain from the current reference and tag filter, and
    /// resets focus to the primary. Any outstanding expansion ticket goes stale.
    ///
    /// With no candidates the chain is left empty and the error returned.
    pub fn rebuild(&mut self) -> Result<(), HudError> {
        self.generation += 1;
        self.pivot = None;

        let catalog = Arc::clone(&self.catalog);
        let candidates = catalog.filter_by_tags(&self.tag_filter);
        match self.selector.rebuild(self.reference, &candidates) {
            Ok(chain) => {
                self.chain = chain;
                self.focus.set_focus_explicit(NodeRef::PRIMARY);
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "Nothing nearby — filter={:?} catalog={}",
                    self.tag_filter,
                    catalog.len()
                );
                self.chain = Chain::empty(self.reference);
                self.focus.clear_focus();
                Err(e)
            }
        }
    }

    pub fn set_reference(&mut self, reference: GeoPoint) -> Result<(), HudError> {
        check_reference(reference)?;
        self.reference = reference;
        self.rebuild()
    }

    /// Moves the reference to a random point within `max_distance_m` and rebuilds.
    pub fn relocate_randomly<R: Rng + ?Sized>(
        &mut self,
        max_distance_m: f64,
        rng: &mut R,
    ) -> Result<GeoPoint, HudError> {
        let moved = geo::random_offset(self.reference, max_distance_m, rng);
        log::info!(
            "Relocated — lat={:.6} lon={:.6} offset_m={:.0}",
            moved.lat,
            moved.lon,
            geo::distance(self.reference, moved)
        );
        self.set_reference(moved)?;
        Ok(moved)
    }

    pub fn set_tag_filter(&mut self, tags: BTreeSet<String>) -> Result<(), HudError> {
        self.tag_filter = tags;
        self.rebuild()
    }

    /// Flips one tag in the filter and rebuilds. Returns whether the tag is now selected.
    pub fn toggle_tag(&mut self, tag: &str) -> Result<bool, HudError> {
        let selected = if self.tag_filter.remove(tag) {
            false
        } else {
            self.tag_filter.insert(tag.to_string());
            true
        };
        self.rebuild().map(|_| selected)
    }

    /// Captures the current generation for a later [`Session::apply_expansion`].
    pub fn begin_expansion(&self, pivot: NodeRef) -> Result<ExpansionTicket, HudError> {
        let node = self.chain.get(pivot).ok_or(HudError::NodeNotFound(pivot))?;
        Ok(ExpansionTicket {
            generation: self.generation,
            pivot,
            pivot_name: node.target.name.clone(),
        })
    }

    /// Truncates the chain after the pivot's tier, appends the pivot's
    /// expansion and focuses the pivot. Returns how many nodes were appended.
    pub fn apply_expansion(&mut self, ticket: ExpansionTicket) -> Result<usize, HudError> {
        if ticket.generation != self.generation {
            log::warn!(
                "Dropping stale expansion — pivot={} ticket={} current={}",
                ticket.pivot,
                ticket.generation,
                self.generation
            );
            return Err(HudError::StaleExpansion {
                ticket: ticket.generation,
                current: self.generation,
            });
        }
        let still_there = self
            .chain
            .get(ticket.pivot)
            .is_some_and(|n| n.target.name == ticket.pivot_name);
        if !still_there {
            log::warn!(
                "Dropping expansion for replaced node — pivot={} target={}",
                ticket.pivot,
                ticket.pivot_name
            );
            return Err(HudError::NodeNotFound(ticket.pivot));
        }

        let catalog = Arc::clone(&self.catalog);
        let candidates: Vec<&Target> = catalog.filter_by_tags(&self.tag_filter);
        let added = self
            .selector
            .extend(&mut self.chain, ticket.pivot, &candidates)?;
        self.pivot = Some(ticket.pivot);
        self.focus.set_focus_explicit(ticket.pivot);
        Ok(added)
    }

    /// A tap on a chain node: truncate, expand, focus.
    pub fn select_node(&mut self, node: NodeRef) -> Result<usize, HudError> {
        let ticket = self.begin_expansion(node)?;
        self.apply_expansion(ticket)
    }

    /// Focuses a node without expanding it.
    pub fn set_focus_explicit(&mut self, node: NodeRef) -> Result<(), HudError> {
        if self.chain.get(node).is_none() {
            return Err(HudError::NodeNotFound(node));
        }
        self.focus.set_focus_explicit(node);
        Ok(())
    }

    /// Pins the heading calibration reference ahead of the first sample.
    pub fn calibrate(&mut self, raw_heading: f64) -> f64 {
        self.focus.calibrate(raw_heading)
    }

    /// Feeds one heading sample. Returns the new focus when it moved.
    pub fn on_heading_sample(&mut self, raw_heading: Option<f64>) -> Option<NodeRef> {
        self.focus
            .on_heading_sample(raw_heading, &self.chain, self.pivot)
    }

    pub fn set_reveal_all(&mut self, reveal_all: bool) {
        self.reveal_all = reveal_all;
    }

    pub fn markers(&self) -> Vec<Marker> {
        render::markers(&self.chain, &self.catalog, self.focus(), self.reveal_all)
    }

    pub fn waypoints(&self) -> Vec<GeoPoint> {
        render::waypoints(self.reference, &self.chain, self.focus())
    }

    pub fn route_request(&self) -> RouteRequest {
        RouteRequest {
            generation: self.generation,
            waypoints: self.waypoints(),
            issued_at: chrono::Utc::now(),
        }
    }

    pub fn emit_route(&self, sink: &dyn RouteSink) {
        sink.submit(self.route_request());
    }
}

fn check_reference(reference: GeoPoint) -> Result<(), HudError> {
    if reference.is_valid() {
        Ok(())
    } else {
        Err(HudError::MalformedCoordinate {
            name: "reference".to_string(),
            lat: reference.lat,
            lon: reference.lon,
        })
    }
}
