use crate::board::{Coord, GameOutcome, GameState};
use crate::config::SearchConfig;
use crate::error::{MctsError, Result};
use crate::mcts_node::MctsNode;
use crate::random::{RandomGenerator, SeededRandomGenerator, StandardRandomGenerator};
use ego_tree::{NodeId, NodeMut, NodeRef, Tree};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Initial node capacity of the search tree.
pub const DEFAULT_NODE_CAPACITY: usize = 1024;

const DETACHED_NODE: &str = "node ids are issued by this tree and nodes are never removed";

/// Lifecycle of a search.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SearchStatus {
    /// Built, no iteration has been run by [`MonteCarloTreeSearch::run`] yet.
    Idle,
    /// Inside [`MonteCarloTreeSearch::run`].
    Running,
    /// The budget ran out and a recommendation was produced.
    Done,
}

/// The main struct for running the Monte Carlo Tree Search algorithm.
///
/// It owns the search tree, the random number generator and the configuration for one search.
/// The tree is dropped together with the search; nothing is reused between calls.
pub struct MonteCarloTreeSearch<K: RandomGenerator> {
    tree: Tree<MctsNode>,
    root_id: NodeId,
    random: K,
    config: SearchConfig,
    status: SearchStatus,
    iterations: u32,
    next_action: MctsAction,
}

/// A builder for creating instances of `MonteCarloTreeSearch`.
pub struct MonteCarloTreeSearchBuilder<K: RandomGenerator> {
    board: GameState,
    random_generator: K,
    config: SearchConfig,
    node_capacity: usize,
}

impl<K: RandomGenerator> MonteCarloTreeSearchBuilder<K> {
    /// Creates a new builder for searching from `board`.
    pub fn new(board: GameState) -> Self {
        Self {
            board,
            random_generator: K::default(),
            config: SearchConfig::default(),
            node_capacity: DEFAULT_NODE_CAPACITY,
        }
    }

    /// Sets the random number generator for the MCTS search.
    pub fn with_random_generator(mut self, rg: K) -> Self {
        self.random_generator = rg;
        self
    }

    /// Sets the budgets and the exploration constant.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Pre-allocates room for `capacity` tree nodes.
    pub fn with_node_capacity(mut self, capacity: usize) -> Self {
        self.node_capacity = capacity;
        self
    }

    /// Validates the configuration and the root position, then builds the search.
    ///
    /// Fails with [`MctsError::NoLegalMoves`] carrying the existing outcome if the game is
    /// already over.
    pub fn build(self) -> Result<MonteCarloTreeSearch<K>> {
        self.config.validate()?;

        let outcome = self.board.outcome();
        if outcome.is_over() {
            return Err(MctsError::NoLegalMoves(outcome));
        }

        Ok(MonteCarloTreeSearch::new(
            self.board,
            self.random_generator,
            self.config,
            self.node_capacity,
        ))
    }
}

impl<K: RandomGenerator> MonteCarloTreeSearch<K> {
    /// Returns a new builder for `MonteCarloTreeSearch`.
    pub fn builder(board: GameState) -> MonteCarloTreeSearchBuilder<K> {
        MonteCarloTreeSearchBuilder::new(board)
    }

    fn new(board: GameState, rg: K, config: SearchConfig, node_capacity: usize) -> Self {
        let tree = Tree::with_capacity(MctsNode::root(board), node_capacity);
        let root_id = tree.root().id();

        Self {
            tree,
            root_id,
            random: rg,
            config,
            status: SearchStatus::Idle,
            iterations: 0,
            next_action: MctsAction::Selection {
                root: root_id,
                last_path: vec![],
            },
        }
    }

    /// Returns an immutable reference to the underlying search tree.
    pub fn get_tree(&self) -> &Tree<MctsNode> {
        &self.tree
    }

    pub fn get_config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Number of completed iterations, i.e. rollouts propagated back to the root.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns the next MCTS action to be performed. Useful for debugging and visualization.
    pub fn get_next_mcts_action(&self) -> &MctsAction {
        &self.next_action
    }

    /// Executes a single step of the MCTS algorithm (Selection, Expansion, Simulation, or Backpropagation).
    pub fn execute_action(&mut self) -> Result<()> {
        match self.next_action.clone() {
            MctsAction::Selection { root, .. } => {
                let leaf = self.select_next_node(root);
                self.next_action = MctsAction::Expansion { leaf };
            }
            MctsAction::Expansion { leaf } => {
                let (children, child) = self.expand_node(leaf)?;
                self.next_action = MctsAction::Simulation { child, children };
            }
            MctsAction::Simulation { child, .. } => {
                let result = self.simulate(child);
                self.next_action = MctsAction::Backpropagation { child, result };
            }
            MctsAction::Backpropagation { child, result } => {
                let path = self.backpropagate(child, result);
                self.iterations += 1;
                trace!(
                    iteration = self.iterations,
                    depth = path.len() - 1,
                    ?result,
                    "MCTS iteration complete"
                );
                self.next_action = MctsAction::Selection {
                    root: self.root_id,
                    last_path: path,
                };
            }
        }
        Ok(())
    }

    /// Performs one full iteration of the MCTS algorithm (Selection, Expansion, Simulation, Backpropagation).
    /// Returns the path of nodes that were updated during backpropagation, simulated node first.
    pub fn do_iteration(&mut self) -> Result<Vec<NodeId>> {
        loop {
            self.execute_action()?;
            if let MctsAction::Selection { last_path, .. } = &self.next_action {
                return Ok(last_path.clone());
            }
        }
    }

    /// Runs the MCTS search for a specified number of iterations, ignoring the configured budgets.
    pub fn iterate_n_times(&mut self, n: u32) -> Result<()> {
        for _ in 0..n {
            self.do_iteration()?;
        }
        Ok(())
    }

    /// Iterates until the configured iteration cap or deadline is reached and reports the
    /// recommended move.
    ///
    /// Budgets are checked at the top of every iteration, so the search always stops between
    /// iterations and always produces a legal move, even when the budget is exhausted at once.
    pub fn run(&mut self) -> Result<SearchReport> {
        self.status = SearchStatus::Running;
        let started = Instant::now();
        let deadline = self
            .config
            .time_budget
            .and_then(|budget| started.checked_add(budget));
        let first_iteration = self.iterations;
        debug!(
            iteration_budget = ?self.config.iteration_budget,
            time_budget = ?self.config.time_budget,
            exploration_constant = self.config.exploration_constant,
            "MCTS search started"
        );

        loop {
            let completed = self.iterations - first_iteration;
            if self
                .config
                .iteration_budget
                .is_some_and(|budget| completed >= budget)
            {
                break;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }
            self.do_iteration()?;
        }

        self.status = SearchStatus::Done;
        let report = self.report(self.iterations - first_iteration, started.elapsed())?;
        debug!(
            iterations = report.iterations,
            elapsed = ?report.elapsed,
            best_move = %report.best_move,
            "MCTS search finished"
        );
        Ok(report)
    }

    /// Returns a reference to the root node of the search tree.
    pub fn get_root(&self) -> NodeRef<'_, MctsNode> {
        self.node(self.root_id)
    }

    /// Returns the child of the root with the most visits. Ties go to the higher win rate, then
    /// to the smaller coordinate. `None` until the root has been expanded.
    pub fn get_most_perspective_move(&self) -> Option<NodeRef<'_, MctsNode>> {
        let mut best: Option<NodeRef<'_, MctsNode>> = None;
        for child in self.get_root().children() {
            let is_better = match best {
                None => true,
                Some(current) => ranks_above(child.value(), current.value()),
            };
            if is_better {
                best = Some(child);
            }
        }
        best
    }

    /// The recommended move. Falls back to the first legal move while the root is unexpanded.
    pub fn best_move(&self) -> Result<Coord> {
        if let Some(coord) = self
            .get_most_perspective_move()
            .and_then(|node| node.value().prev_move)
        {
            return Ok(coord);
        }

        let root = self.get_root().value();
        root.board
            .legal_moves()
            .first()
            .copied()
            .ok_or(MctsError::NoLegalMoves(root.outcome))
    }

    /// Statistics of every root child in row-major move order.
    pub fn move_stats(&self) -> Vec<MoveStats> {
        self.get_root()
            .children()
            .filter_map(|child| {
                let node = child.value();
                node.prev_move.map(|coord| MoveStats {
                    coord,
                    visits: node.visits,
                    wins: node.wins,
                })
            })
            .collect()
    }

    fn report(&self, iterations: u32, elapsed: Duration) -> Result<SearchReport> {
        Ok(SearchReport {
            best_move: self.best_move()?,
            iterations,
            elapsed,
            root_visits: self.get_root().value().visits,
            moves: self.move_stats(),
        })
    }

    /// Descends from `root_id` to a frontier node, picking the child with the highest UCT score.
    ///
    /// Children are visited in row-major order and only a strictly higher score replaces the
    /// current choice, so exact ties go to the smallest coordinate.
    fn select_next_node(&self, root_id: NodeId) -> NodeId {
        let exploration = self.config.exploration_constant;
        let mut current = self.node(root_id);

        loop {
            let node = current.value();
            if node.is_terminal() {
                return current.id();
            }

            let mut children = current.children();
            let Some(mut best_child) = children.next() else {
                return current.id();
            };
            let mut max_uct = best_child.value().uct_value(node.visits, exploration);
            for child in children {
                let uct = child.value().uct_value(node.visits, exploration);
                if uct > max_uct {
                    max_uct = uct;
                    best_child = child;
                }
            }
            current = best_child;
        }
    }

    /// Expands a frontier node with one child per legal move and picks one of them at random
    /// for the rollout. A terminal node is not expanded; it is returned as the rollout start.
    fn expand_node(&mut self, node_id: NodeId) -> Result<(Vec<NodeId>, NodeId)> {
        let new_nodes = {
            let node_ref = self.node(node_id);
            debug_assert!(
                !node_ref.has_children(),
                "BUG: expanding already expanded node"
            );
            let node = node_ref.value();
            if node.is_terminal() {
                return Ok((vec![], node_id));
            }

            let player = node.board.to_move();
            let height = node.height + 1;
            node.board
                .legal_moves()
                .into_iter()
                .map(|coord| {
                    let board = node.board.apply_move(coord, player)?;
                    Ok(MctsNode::new(board, Some(coord), player, height))
                })
                .collect::<Result<Vec<_>>>()?
        };

        let mut parent = self.node_mut(node_id);
        let mut new_node_ids = Vec::with_capacity(new_nodes.len());
        for mcts_node in new_nodes {
            new_node_ids.push(parent.append(mcts_node).id());
        }

        let selected_child = self.random.choose(&new_node_ids).copied().unwrap_or(node_id);
        Ok((new_node_ids, selected_child))
    }

    /// Plays a random game from the node's position. The tree is left untouched.
    fn simulate(&mut self, node_id: NodeId) -> GameOutcome {
        let board = self.node(node_id).value().board.clone();
        Rollout::new(board, &mut self.random)
            .last()
            .map_or(GameOutcome::InProgress, |end| end.outcome())
    }

    /// Credits `outcome` to the simulated node and all of its ancestors.
    fn backpropagate(&mut self, node_id: NodeId, outcome: GameOutcome) -> Vec<NodeId> {
        let branch: Vec<NodeId> = {
            let node = self.node(node_id);
            std::iter::once(node_id)
                .chain(node.ancestors().map(|ancestor| ancestor.id()))
                .collect()
        };

        for &id in &branch {
            self.node_mut(id).value().record(outcome);
        }

        branch
    }

    fn node(&self, id: NodeId) -> NodeRef<'_, MctsNode> {
        self.tree.get(id).expect(DETACHED_NODE)
    }

    fn node_mut(&mut self, id: NodeId) -> NodeMut<'_, MctsNode> {
        self.tree.get_mut(id).expect(DETACHED_NODE)
    }
}

fn ranks_above(candidate: &MctsNode, incumbent: &MctsNode) -> bool {
    candidate.visits > incumbent.visits
        || (candidate.visits == incumbent.visits && candidate.wins_rate() > incumbent.wins_rate())
}

/// A uniformly random playout, yielding the start position and every position after it up to
/// and including the terminal one.
pub struct Rollout<'r, K: RandomGenerator> {
    current: Option<GameState>,
    random: &'r mut K,
}

impl<'r, K: RandomGenerator> Rollout<'r, K> {
    pub fn new(start: GameState, random: &'r mut K) -> Self {
        Self {
            current: Some(start),
            random,
        }
    }
}

impl<K: RandomGenerator> Iterator for Rollout<'_, K> {
    type Item = GameState;

    fn next(&mut self) -> Option<GameState> {
        let current = self.current.take()?;
        let moves = current.legal_moves();
        if let Some(&coord) = self.random.choose(&moves) {
            // `coord` comes from `legal_moves`, so the move is always accepted.
            self.current = current.play(coord).ok();
        }
        Some(current)
    }
}

/// Visit statistics of one root move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStats {
    pub coord: Coord,
    pub visits: u32,
    /// Credit earned by the player to move at the root.
    pub wins: f64,
}

impl MoveStats {
    pub fn wins_rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.wins / f64::from(self.visits)
        }
    }
}

/// Result of [`MonteCarloTreeSearch::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub best_move: Coord,
    /// Iterations completed by this run.
    pub iterations: u32,
    pub elapsed: Duration,
    pub root_visits: u32,
    pub moves: Vec<MoveStats>,
}

/// What the engine tells its caller to do with a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Play this move.
    Move(Coord),
    /// The game is already over.
    GameOver(GameOutcome),
}

/// Searches `board` with the given configuration.
///
/// Uses a [`SeededRandomGenerator`] when `config.random_seed` is set and the thread RNG otherwise.
pub fn choose_move(board: &GameState, config: &SearchConfig) -> Result<SearchReport> {
    match config.random_seed {
        Some(seed) => search_with(board, config, SeededRandomGenerator::new(seed)),
        None => search_with(board, config, StandardRandomGenerator),
    }
}

/// Like [`choose_move`], but reports a finished game as [`Decision::GameOver`] instead of an error.
pub fn decide(board: &GameState, config: &SearchConfig) -> Result<Decision> {
    match choose_move(board, config) {
        Ok(report) => Ok(Decision::Move(report.best_move)),
        Err(MctsError::NoLegalMoves(outcome)) => Ok(Decision::GameOver(outcome)),
        Err(err) => Err(err),
    }
}

fn search_with<K: RandomGenerator>(
    board: &GameState,
    config: &SearchConfig,
    random: K,
) -> Result<SearchReport> {
    MonteCarloTreeSearch::builder(board.clone())
        .with_config(config.clone())
        .with_random_generator(random)
        .build()?
        .run()
}

/// Represents the four main stages of the MCTS algorithm.
///
/// This enum is used to manage the state of the search process.
#[derive(Debug, PartialEq, Clone)]
pub enum MctsAction {
    /// **Selection**: Start from `root` and descend through children until a frontier node is reached.
    Selection {
        /// The root of the current selection phase.
        root: NodeId,
        /// The path of nodes updated during the last backpropagation phase.
        last_path: Vec<NodeId>,
    },
    /// **Expansion**: Create a child for every legal move of the frontier node `leaf`.
    Expansion {
        /// The frontier node to be expanded.
        leaf: NodeId,
    },
    /// **Simulation**: Run a random playout from `child`.
    Simulation {
        /// The node from which the simulation will start.
        child: NodeId,
        /// All children created during the expansion phase; empty for a terminal frontier node.
        children: Vec<NodeId>,
    },
    /// **Backpropagation**: Update the statistics of the nodes on the path from `child` to the root.
    Backpropagation {
        /// The node from which the simulation was run.
        child: NodeId,
        /// The result of the simulation.
        result: GameOutcome,
    },
}

impl MctsAction {
    /// Returns the name of the current MCTS action.
    pub fn get_name(&self) -> &'static str {
        match self {
            MctsAction::Selection { .. } => "Selection",
            MctsAction::Expansion { .. } => "Expansion",
            MctsAction::Simulation { .. } => "Simulation",
            MctsAction::Backpropagation { .. } => "Backpropagation",
        }
    }
}
