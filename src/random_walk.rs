//! Random walk generation.
//!
//! A walk moves `Ready(start) -> Stepping -> Done(visited)`. Each step asks the
//! configured [`TransitionPolicy`] for `(candidates, weights)`, draws the next node
//! with [`sample_weighted`], records it, and then applies the [`Reinforcement`] rule to
//! the traversed edge, so step `k` always sees every reinforcement of steps `< k`.
//!
//! Any error aborts the walk and discards the partial trace.

use crate::graph::{Graph, WeightedGraph, WeightedGraphMut};
use crate::policy::TransitionPolicy;
use crate::reinforce::Reinforcement;
use crate::sampler::sample_weighted;
use crate::weights::{EdgeKey, EdgeWeights, WeightStore};
use crate::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WalkConfig {
    /// Number of steps (sampled nodes) per walk.
    pub length: usize,
    /// Walks per start node for the batch helpers.
    pub walks_per_node: usize,
    pub policy: TransitionPolicy,
    pub reinforcement: Reinforcement,
    /// Record the start node as the first element of the trace.
    pub include_start: bool,
    /// Seed for the walk RNG; `None` draws a fresh seed from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            length: 80,
            walks_per_node: 10,
            policy: TransitionPolicy::Uniform,
            reinforcement: Reinforcement::None,
            include_start: false,
            seed: None,
        }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> Result<()> {
        self.reinforcement.validate()
    }

    /// RNG for one walk (or one batch) under this config.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    fn validate_batch(&self) -> Result<()> {
        self.validate()?;
        if self.walks_per_node == 0 {
            return Err(Error::InvalidParameter("walks_per_node must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// A finished walk.
#[derive(Debug, Clone, PartialEq)]
pub struct Walk<N> {
    pub visited: Vec<N>,
    /// Final weight table; present only for reinforcing walks.
    pub weights: Option<BTreeMap<EdgeKey<N>, f64>>,
}

/// Walks from a batch run; each walk ran against its own fresh weight store.
#[derive(Debug, Clone, PartialEq)]
pub struct Walks<N> {
    pub walks: Vec<Vec<N>>,
    /// Final weight table of each walk, index-aligned with `walks`; present only for
    /// reinforcing batches.
    pub weights: Option<Vec<BTreeMap<EdgeKey<N>, f64>>>,
}

/// Runs walks over one graph under one configuration.
///
/// The graph is only read; weights live in the store passed to each call, so several
/// walkers may share a graph while each owns (or deliberately shares) its store.
#[derive(Debug)]
pub struct Walker<'g, G> {
    graph: &'g G,
    config: WalkConfig,
}

struct WalkState<'v, N> {
    current: N,
    steps_taken: usize,
    visited: &'v mut Vec<N>,
}

struct Scratch<N> {
    candidates: Vec<N>,
    weights: Vec<f64>,
}

impl<N> Scratch<N> {
    fn new() -> Self {
        Self { candidates: Vec::new(), weights: Vec::new() }
    }
}

impl<'g, G: Graph> Walker<'g, G> {
    pub fn new(graph: &'g G, config: WalkConfig) -> Result<Self> {
        config.validate()?;
        if !config.reinforcement.is_none() && !config.policy.reads_weights() {
            debug!(
                policy = %config.policy,
                reinforcement = %config.reinforcement,
                "policy ignores edge weights; reinforcement is recorded but never steers the walk"
            );
        }
        Ok(Self { graph, config })
    }

    /// One walk from `start`, reading and reinforcing `store`.
    pub fn walk<S, R>(&self, start: G::Node, store: &mut S, rng: &mut R) -> Result<Vec<G::Node>>
    where
        S: WeightStore<G::Node> + ?Sized,
        R: Rng,
    {
        self.walk_until(start, store, rng, |_| false)
    }

    /// Like [`Self::walk`], checking `stop(steps_taken)` before every step.
    ///
    /// A stop aborts with [`Error::Cancelled`]; no partial trace is returned.
    pub fn walk_until<S, R, F>(&self, start: G::Node, store: &mut S, rng: &mut R, stop: F) -> Result<Vec<G::Node>>
    where
        S: WeightStore<G::Node> + ?Sized,
        R: Rng,
        F: FnMut(usize) -> bool,
    {
        let mut visited = Vec::new();
        self.drive(start, store, rng, stop, &mut visited, &mut Scratch::new())?;
        Ok(visited)
    }

    fn drive<S, R, F>(
        &self,
        start: G::Node,
        store: &mut S,
        rng: &mut R,
        mut stop: F,
        visited: &mut Vec<G::Node>,
        scratch: &mut Scratch<G::Node>,
    ) -> Result<()>
    where
        S: WeightStore<G::Node> + ?Sized,
        R: Rng,
        F: FnMut(usize) -> bool,
    {
        if !self.graph.contains_node(start) {
            return Err(Error::InvalidStart(format!("node {start:?} is not in the graph")));
        }

        visited.clear();
        if self.config.include_start {
            visited.push(start);
        }
        let mut state = WalkState { current: start, steps_taken: 0, visited };

        while state.steps_taken < self.config.length {
            if stop(state.steps_taken) {
                debug!(?start, steps = state.steps_taken, "walk cancelled");
                return Err(Error::Cancelled(state.steps_taken));
            }
            if let Err(e) = self.step(&mut state, store, rng, scratch) {
                debug!(?start, steps = state.steps_taken, error = %e, "walk aborted");
                return Err(e);
            }
        }
        Ok(())
    }

    fn step<S, R>(
        &self,
        state: &mut WalkState<'_, G::Node>,
        store: &mut S,
        rng: &mut R,
        scratch: &mut Scratch<G::Node>,
    ) -> Result<()>
    where
        S: WeightStore<G::Node> + ?Sized,
        R: Rng,
    {
        let from = state.current;
        self.config.policy.fill(self.graph, from, &*store, &mut scratch.candidates, &mut scratch.weights)?;
        let next = sample_weighted(&scratch.candidates, &scratch.weights, rng)?;
        state.visited.push(next);
        self.config.reinforcement.apply(self.graph, store, from, next)?;
        trace!(?from, ?next, step = state.steps_taken, "step");
        state.current = next;
        state.steps_taken += 1;
        Ok(())
    }
}

fn finished_weights<N, S>(config: &WalkConfig, store: &S) -> Option<BTreeMap<EdgeKey<N>, f64>>
where
    S: WeightStore<N> + ?Sized,
{
    (!config.reinforcement.is_none()).then(|| store.snapshot())
}

/// One walk with a fresh store where every edge weighs 1.
pub fn random_walk<G: Graph>(graph: &G, start: G::Node, config: WalkConfig) -> Result<Walk<G::Node>> {
    run_single(graph, start, config, EdgeWeights::new())
}

/// One walk with a store seeded from the graph's own edge weights.
pub fn random_walk_weighted<G: WeightedGraph>(
    graph: &G,
    start: G::Node,
    config: WalkConfig,
) -> Result<Walk<G::Node>> {
    run_single(graph, start, config, EdgeWeights::from_graph(graph)?)
}

fn run_single<G: Graph>(
    graph: &G,
    start: G::Node,
    config: WalkConfig,
    mut store: EdgeWeights<G::Node>,
) -> Result<Walk<G::Node>> {
    let walker = Walker::new(graph, config)?;
    let mut rng = config.rng();
    debug!(
        ?start,
        length = config.length,
        policy = %config.policy,
        reinforcement = %config.reinforcement,
        "starting walk"
    );
    let visited = walker.walk(start, &mut store, &mut rng)?;
    Ok(Walk { visited, weights: finished_weights(&config, &store) })
}

/// Walk on `graph`, then write the reinforced weights back onto it.
///
/// The graph is only updated if the walk succeeds.
pub fn reinforce_in_place<G: WeightedGraphMut>(graph: &mut G, start: G::Node, config: WalkConfig) -> Result<Vec<G::Node>> {
    let mut store = EdgeWeights::from_graph(&*graph)?;
    let visited = {
        let walker = Walker::new(&*graph, config)?;
        walker.walk(start, &mut store, &mut config.rng())?
    };
    store.write_back(graph);
    Ok(visited)
}

/// `walks_per_node` walks from every node of the graph.
pub fn generate_walks<G: Graph>(graph: &G, config: WalkConfig) -> Result<Walks<G::Node>> {
    let start_nodes = graph.nodes();
    generate_walks_from_nodes(graph, &start_nodes, config)
}

/// `walks_per_node` walks from each of `start_nodes`.
///
/// Each epoch shuffles the start nodes with the config RNG. Every walk starts from a
/// fresh weight store, so reinforcement never leaks between walks of the batch. The
/// first failing walk aborts the batch.
pub fn generate_walks_from_nodes<G: Graph>(
    graph: &G,
    start_nodes: &[G::Node],
    config: WalkConfig,
) -> Result<Walks<G::Node>> {
    let reinforcing = !config.reinforcement.is_none();
    let mut store: EdgeWeights<G::Node> = EdgeWeights::new();
    let mut walks = Vec::new();
    let mut tables = Vec::new();
    run_batch(graph, start_nodes, config, &mut store, EdgeWeights::clear, |w, store| {
        walks.push(w.to_vec());
        if reinforcing {
            tables.push(store.snapshot());
        }
    })?;
    Ok(Walks { walks, weights: reinforcing.then_some(tables) })
}

/// Streaming form of [`generate_walks_from_nodes`].
///
/// One trace buffer and one store (cleared between walks) are reused for the whole
/// batch and each walk is handed to `on_walk`; the walk sequence matches the
/// collecting API for the same config.
pub fn generate_walks_streaming_from_nodes<G, F>(
    graph: &G,
    start_nodes: &[G::Node],
    config: WalkConfig,
    mut on_walk: F,
) -> Result<()>
where
    G: Graph,
    F: FnMut(&[G::Node]),
{
    let mut store: EdgeWeights<G::Node> = EdgeWeights::new();
    run_batch(graph, start_nodes, config, &mut store, EdgeWeights::clear, |w, _| on_walk(w))
}

/// Batch walks that all read and reinforce the caller's `store`.
///
/// Walks run in epoch order against the same table, so every walk sees the
/// reinforcement of the walks before it.
pub fn generate_walks_with_store_from_nodes<G, S, F>(
    graph: &G,
    start_nodes: &[G::Node],
    config: WalkConfig,
    store: &mut S,
    mut on_walk: F,
) -> Result<()>
where
    G: Graph,
    S: WeightStore<G::Node> + ?Sized,
    F: FnMut(&[G::Node]),
{
    run_batch(graph, start_nodes, config, store, |_| {}, |w, _| on_walk(w))
}

fn run_batch<G, S, B, F>(
    graph: &G,
    start_nodes: &[G::Node],
    config: WalkConfig,
    store: &mut S,
    mut before_walk: B,
    mut on_walk: F,
) -> Result<()>
where
    G: Graph,
    S: WeightStore<G::Node> + ?Sized,
    B: FnMut(&mut S),
    F: FnMut(&[G::Node], &S),
{
    config.validate_batch()?;
    let walker = Walker::new(graph, config)?;
    let mut rng = config.rng();
    let mut epoch_nodes: Vec<G::Node> = start_nodes.to_vec();
    let mut buf: Vec<G::Node> = Vec::new();
    let mut scratch = Scratch::new();

    debug!(
        starts = start_nodes.len(),
        walks_per_node = config.walks_per_node,
        length = config.length,
        policy = %config.policy,
        reinforcement = %config.reinforcement,
        "generating walks"
    );
    for _ in 0..config.walks_per_node {
        epoch_nodes.shuffle(&mut rng);
        for &node in &epoch_nodes {
            before_walk(&mut *store);
            walker.drive(node, &mut *store, &mut rng, |_| false, &mut buf, &mut scratch)?;
            on_walk(&buf, &*store);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_graphs::LyingDegrees;
    use crate::graph::AdjacencyList;
    use std::cell::RefCell;

    fn cycle4() -> AdjacencyList {
        AdjacencyList::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)])
    }

    fn seeded(seed: u64) -> WalkConfig {
        WalkConfig { seed: Some(seed), ..WalkConfig::default() }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Event {
        Read,
        Increment,
    }

    /// Store that logs every read and increment, to check step ordering.
    struct Recording {
        inner: EdgeWeights<usize>,
        log: RefCell<Vec<Event>>,
    }

    impl WeightStore<usize> for Recording {
        fn weight(&self, a: usize, b: usize) -> f64 {
            self.log.borrow_mut().push(Event::Read);
            self.inner.weight(a, b)
        }
        fn increment(&mut self, a: usize, b: usize, delta: f64) -> Result<()> {
            self.log.borrow_mut().push(Event::Increment);
            self.inner.increment(a, b, delta)
        }
        fn snapshot(&self) -> BTreeMap<EdgeKey<usize>, f64> {
            self.inner.snapshot()
        }
    }

    #[test]
    fn zero_length_is_empty_or_start() {
        let g = cycle4();
        for policy in [
            TransitionPolicy::Uniform,
            TransitionPolicy::Degree,
            TransitionPolicy::InverseDegree,
            TransitionPolicy::EdgeWeight,
        ] {
            let cfg = WalkConfig { length: 0, policy, ..seeded(1) };
            assert!(random_walk(&g, 2, cfg).unwrap().visited.is_empty());
            let cfg = WalkConfig { include_start: true, ..cfg };
            assert_eq!(random_walk(&g, 2, cfg).unwrap().visited, vec![2]);
        }
    }

    #[test]
    fn include_start_prefixes_trace() {
        let g = cycle4();
        let a = random_walk(&g, 0, WalkConfig { length: 5, ..seeded(3) }).unwrap().visited;
        let b = random_walk(&g, 0, WalkConfig { length: 5, include_start: true, ..seeded(3) })
            .unwrap()
            .visited;
        assert_eq!(b.len(), 6);
        assert_eq!(b[0], 0);
        assert_eq!(&b[1..], a.as_slice());
    }

    #[test]
    fn invalid_start_fails_before_stepping() {
        let g = cycle4();
        let err = random_walk(&g, 9, WalkConfig { length: 0, ..seeded(0) }).unwrap_err();
        assert!(matches!(err, Error::InvalidStart(_)));
    }

    #[test]
    fn dead_end_aborts_without_partial_trace() {
        // 0 - 1, 2 isolated
        let g = AdjacencyList::from_edges(3, &[(0, 1)]);
        let err = random_walk(&g, 2, WalkConfig { length: 3, ..seeded(0) }).unwrap_err();
        assert!(matches!(err, Error::EmptyDomain(_)));
    }

    /// Path `0 - 1 - 2` whose node 2 reports degree 0: under inverse-degree the first
    /// hop `0 -> 1` succeeds and the second one fails.
    fn fails_on_second_step() -> LyingDegrees {
        LyingDegrees { inner: AdjacencyList::from_weighted_edges(3, &[(0, 1, 2.0), (1, 2, 2.0)]), zero: 2 }
    }

    #[test]
    fn failure_after_progress_returns_no_trace() {
        let g = fails_on_second_step();
        let cfg = WalkConfig {
            length: 3,
            policy: TransitionPolicy::InverseDegree,
            reinforcement: Reinforcement::Fixed(0.5),
            ..seeded(0)
        };
        let walker = Walker::new(&g, cfg).unwrap();
        let mut store = EdgeWeights::new();
        let err = walker.walk(0, &mut store, &mut cfg.rng()).unwrap_err();
        assert!(matches!(err, Error::DivisionByZero(_)), "{err:?}");
        // The first step's increment landed in the caller's store before the abort.
        assert_eq!(store.weight(0, 1), 1.5);

        assert!(matches!(random_walk(&g, 0, cfg).unwrap_err(), Error::DivisionByZero(_)));
    }

    #[test]
    fn reinforce_in_place_discards_increments_of_a_failed_walk() {
        let mut g = fails_on_second_step();
        let cfg = WalkConfig {
            length: 3,
            policy: TransitionPolicy::InverseDegree,
            reinforcement: Reinforcement::Fixed(0.5),
            ..seeded(0)
        };
        assert!(matches!(reinforce_in_place(&mut g, 0, cfg).unwrap_err(), Error::DivisionByZero(_)));
        assert_eq!(g.edge_weight(0, 1), Some(2.0));
        assert_eq!(g.edge_weight(1, 2), Some(2.0));
    }

    #[test]
    fn huge_lengths_do_not_overflow() {
        let g = cycle4();
        let cfg = WalkConfig { length: usize::MAX, include_start: true, ..seeded(4) };
        let walker = Walker::new(&g, cfg).unwrap();
        let err = walker
            .walk_until(0, &mut EdgeWeights::new(), &mut cfg.rng(), |steps| steps == 2)
            .unwrap_err();
        assert_eq!(err, Error::Cancelled(2));

        // Validation runs before anything is sized from the config.
        let bad = WalkConfig {
            length: usize::MAX,
            walks_per_node: usize::MAX,
            reinforcement: Reinforcement::Fixed(-1.0),
            ..seeded(4)
        };
        assert!(matches!(generate_walks(&g, bad).unwrap_err(), Error::InvalidParameter(_)));
    }

    #[test]
    fn reinforcement_is_applied_after_each_draw() {
        let g = AdjacencyList::from_edges(3, &[(0, 1), (1, 2)]);
        let cfg = WalkConfig {
            length: 4,
            policy: TransitionPolicy::EdgeWeight,
            reinforcement: Reinforcement::Fixed(1.0),
            ..seeded(5)
        };
        let walker = Walker::new(&g, cfg).unwrap();
        let mut store = Recording { inner: EdgeWeights::new(), log: RefCell::new(Vec::new()) };
        let visited = walker.walk(0, &mut store, &mut cfg.rng()).unwrap();
        assert_eq!(visited.len(), 4);

        // Each step reads one weight per neighbor of the current node, then increments once.
        let mut expected = Vec::new();
        let mut cur = 0usize;
        for &next in &visited {
            expected.extend(std::iter::repeat(Event::Read).take(g.degree(cur)));
            expected.push(Event::Increment);
            cur = next;
        }
        assert_eq!(*store.log.borrow(), expected);
    }

    #[test]
    fn cancellation_stops_between_steps() {
        let g = cycle4();
        let walker = Walker::new(&g, WalkConfig { length: 10, ..seeded(1) }).unwrap();
        let mut store = EdgeWeights::new();
        let err = walker
            .walk_until(0, &mut store, &mut ChaCha8Rng::seed_from_u64(1), |steps| steps == 3)
            .unwrap_err();
        assert_eq!(err, Error::Cancelled(3));
    }

    #[test]
    fn weight_blind_policy_still_records_reinforcement() {
        let g = cycle4();
        let cfg = WalkConfig { length: 4, reinforcement: Reinforcement::Fixed(1.0), ..seeded(6) };
        assert!(!cfg.policy.reads_weights());
        let reinforced = random_walk(&g, 0, cfg).unwrap();
        let plain = random_walk(&g, 0, WalkConfig { reinforcement: Reinforcement::None, ..cfg }).unwrap();
        // Uniform never reads the store, so reinforcement cannot change the trace.
        assert_eq!(reinforced.visited, plain.visited);
        let added: f64 = reinforced.weights.unwrap().values().map(|w| w - 1.0).sum();
        assert_eq!(added, 4.0);
    }

    #[test]
    fn walker_rejects_bad_reinforcement() {
        let g = cycle4();
        let cfg = WalkConfig { reinforcement: Reinforcement::Fixed(-1.0), ..seeded(0) };
        assert!(matches!(Walker::new(&g, cfg).unwrap_err(), Error::InvalidParameter(_)));
    }

    #[test]
    fn weights_snapshot_only_for_reinforcing_walks() {
        let g = cycle4();
        let plain = random_walk(&g, 0, WalkConfig { length: 3, ..seeded(2) }).unwrap();
        assert!(plain.weights.is_none());

        let cfg = WalkConfig { length: 3, reinforcement: Reinforcement::Fixed(2.0), ..seeded(2) };
        let reinforced = random_walk(&g, 0, cfg).unwrap();
        let total: f64 = reinforced.weights.unwrap().values().map(|w| w - 1.0).sum();
        assert_eq!(total, 6.0);
    }

    #[test]
    fn weighted_walk_seeds_from_graph() {
        // 0 -- 1 is effectively unreachable next to 0 -- 2.
        let g = AdjacencyList::from_weighted_edges(3, &[(0, 1, 1e-9), (0, 2, 1.0)]);
        let cfg = WalkConfig { length: 1, policy: TransitionPolicy::EdgeWeight, ..seeded(11) };
        for seed in 0..50 {
            let w = random_walk_weighted(&g, 0, WalkConfig { seed: Some(seed), ..cfg }).unwrap();
            assert_eq!(w.visited, vec![2]);
        }
    }

    #[test]
    fn reinforce_in_place_writes_back() {
        let mut g = AdjacencyList::from_weighted_edges(2, &[(0, 1, 2.0)]);
        let cfg = WalkConfig { length: 3, reinforcement: Reinforcement::Fixed(0.5), ..seeded(0) };
        let visited = reinforce_in_place(&mut g, 0, cfg).unwrap();
        assert_eq!(visited, vec![1, 0, 1]);
        assert_eq!(g.edge_weight(0, 1), Some(3.5));
    }

    #[test]
    fn reinforce_in_place_leaves_graph_alone_on_failure() {
        // 0 - 1, 2 isolated: walking from 2 fails.
        let mut g = AdjacencyList::from_weighted_edges(3, &[(0, 1, 2.0)]);
        let cfg = WalkConfig { length: 3, reinforcement: Reinforcement::Fixed(0.5), ..seeded(0) };
        assert!(reinforce_in_place(&mut g, 2, cfg).is_err());
        assert_eq!(g.edge_weight(0, 1), Some(2.0));
    }

    #[test]
    fn batch_matches_streaming() {
        let g = cycle4();
        let cfg = WalkConfig {
            length: 6,
            walks_per_node: 3,
            policy: TransitionPolicy::EdgeWeight,
            reinforcement: Reinforcement::Fixed(2.0),
            ..seeded(42)
        };
        let collected = generate_walks(&g, cfg).unwrap();
        assert_eq!(collected.walks.len(), 12);

        let mut streamed = Vec::new();
        let starts = g.nodes();
        generate_walks_streaming_from_nodes(&g, &starts, cfg, |w| streamed.push(w.to_vec())).unwrap();
        assert_eq!(collected.walks, streamed);
    }

    #[test]
    fn batch_keeps_one_weight_table_per_walk() {
        let g = cycle4();
        let cfg = WalkConfig { length: 5, walks_per_node: 2, reinforcement: Reinforcement::Fixed(1.0), ..seeded(1) };
        let out = generate_walks(&g, cfg).unwrap();
        let tables = out.weights.unwrap();
        assert_eq!(tables.len(), out.walks.len());
        for table in &tables {
            let added: f64 = table.values().map(|w| w - 1.0).sum();
            assert_eq!(added, 5.0);
        }

        let plain = generate_walks(&g, WalkConfig { reinforcement: Reinforcement::None, ..cfg }).unwrap();
        assert!(plain.weights.is_none());
    }

    #[test]
    fn batch_rejects_zero_walks_per_node() {
        let g = cycle4();
        let cfg = WalkConfig { walks_per_node: 0, ..seeded(0) };
        assert!(matches!(generate_walks(&g, cfg).unwrap_err(), Error::InvalidParameter(_)));
    }
}
