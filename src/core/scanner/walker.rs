//! Breadth-first traversal shared by the album and containment walks.
//!
//! The driver owns the FIFO queue. A [`Visitor`] decides what happens at each
//! node: which children to enqueue and whether to stop early.

use std::collections::VecDeque;
use std::ops::ControlFlow;

/// Pending nodes of a breadth-first walk
#[derive(Debug)]
pub struct Frontier<T> {
    queue: VecDeque<T>,
}

impl<T> Frontier<T> {
    fn new(root: T) -> Self {
        Self {
            queue: VecDeque::from([root]),
        }
    }

    /// Enqueue a node behind everything already pending
    pub fn push(&mut self, node: T) {
        self.queue.push_back(node);
    }
}

/// Per-node policy of a breadth-first walk
pub trait Visitor<T> {
    /// Value returned when the walk stops early
    type Break;

    /// Visit one node, pushing any children onto `frontier`
    fn visit(&mut self, node: T, frontier: &mut Frontier<T>) -> ControlFlow<Self::Break>;
}

/// Walk breadth-first from `root` until the frontier is empty or the
/// visitor breaks.
pub fn walk_breadth_first<T, V>(root: T, visitor: &mut V) -> ControlFlow<V::Break>
where
    V: Visitor<T>,
{
    let mut frontier = Frontier::new(root);

    while let Some(node) = frontier.queue.pop_front() {
        visitor.visit(node, &mut frontier)?;
    }

    ControlFlow::Continue(())
}
