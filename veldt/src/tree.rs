//! The R-tree facade and its structural algorithms.

use log::debug;

use crate::bounding_box::BoundingBox;
use crate::hilbert;
use crate::node::{ChildRef, Node};
use crate::query::{Everything, Iter, Nearest, Query, SpatialPredicate};
use crate::strategy::{RStar, Strategy};
use crate::translator::{DefaultTranslator, Translator};

/// A dynamic, balanced R-tree over values keyed by bounding boxes.
///
/// The tree stores opaque values of type `V`, locates them through a
/// [`Translator`] and maintains its structure with a [`Strategy`]; both are
/// chosen at construction time. `D` is the number of dimensions.
///
/// Values that implement [`Located`](crate::Located) and `PartialEq` work
/// out of the box:
///
/// ```rust
/// use veldt::{BoundingBox, Intersects, RTree};
///
/// let mut tree: RTree<BoundingBox<2>, 2> = RTree::new();
/// tree.insert(BoundingBox::new([0.0, 0.0], [1.0, 1.0]));
/// tree.insert(BoundingBox::new([4.0, 4.0], [5.0, 5.0]));
///
/// let query = Intersects(BoundingBox::new([0.5, 0.5], [2.0, 2.0]));
/// assert_eq!(tree.query(query).count(), 1);
/// ```
///
/// A single tree must not be mutated from multiple threads; wrap it in a
/// lock if shared. Cloning produces a fully independent copy sharing no
/// nodes with the original.
#[derive(Debug, Clone)]
pub struct RTree<V, const D: usize, T = DefaultTranslator, S = RStar> {
    root: Option<Node<V, D>>,
    translator: T,
    strategy: S,
    len: usize,
    height: usize,
}

/// An entry on its way into the tree: either a fresh value bound for a
/// leaf, or a whole subtree (from forced reinsertion or underflow repair)
/// bound for its original level.
enum InsertEntry<V, const D: usize> {
    Value(V),
    Subtree { child: ChildRef<V, D>, level: usize },
}

enum InsertResult<V, const D: usize> {
    Ok,
    /// The node split; the new sibling is handed to the parent.
    Split(ChildRef<V, D>),
    /// Forced reinsertion evicted these entries; they re-enter from the
    /// root once the current descent unwinds.
    Reinsert(Vec<InsertEntry<V, D>>),
}

/// Levels that already ran forced reinsertion during one top-level insert.
#[derive(Default)]
struct ReinsertTracker {
    levels: Vec<bool>,
}

impl ReinsertTracker {
    fn reinserted(&self, level: usize) -> bool {
        self.levels.get(level).copied().unwrap_or(false)
    }

    fn mark(&mut self, level: usize) {
        if self.levels.len() <= level {
            self.levels.resize(level + 1, false);
        }
        self.levels[level] = true;
    }
}

/// Entries stranded by underflow repair, waiting for reinsertion.
struct Orphans<V, const D: usize> {
    values: Vec<V>,
    subtrees: Vec<(usize, ChildRef<V, D>)>,
}

impl<V, const D: usize> Orphans<V, D> {
    fn new() -> Orphans<V, D> {
        Orphans {
            values: Vec::new(),
            subtrees: Vec::new(),
        }
    }
}

impl<V, const D: usize, T: Default, S: Default> Default for RTree<V, D, T, S> {
    fn default() -> RTree<V, D, T, S> {
        RTree {
            root: None,
            translator: T::default(),
            strategy: S::default(),
            len: 0,
            height: 0,
        }
    }
}

impl<V, const D: usize> RTree<V, D> {
    /// Creates an empty tree with the default translator and the default
    /// [`RStar`] strategy.
    pub fn new() -> RTree<V, D> {
        RTree::default()
    }
}

impl<V, const D: usize, T, S> RTree<V, D, T, S> {
    /// Creates an empty tree with the given strategy and the default
    /// translator.
    pub fn with_strategy(strategy: S) -> RTree<V, D, T, S>
    where
        T: Default,
    {
        RTree::with_translator_and_strategy(T::default(), strategy)
    }

    /// Creates an empty tree with the given translator and strategy.
    pub fn with_translator_and_strategy(translator: T, strategy: S) -> RTree<V, D, T, S> {
        RTree {
            root: None,
            translator,
            strategy,
            len: 0,
            height: 0,
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks if the tree holds no values.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the tree: 0 when empty, 1 when the root is a leaf.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The configured strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The configured translator.
    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// Drops every stored value.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
        self.height = 0;
    }
}

impl<V, const D: usize, T, S> RTree<V, D, T, S>
where
    T: Translator<V, D>,
    S: Strategy,
{
    /// Inserts a value.
    pub fn insert(&mut self, value: V) {
        self.push_entry(InsertEntry::Value(value));
        self.len += 1;
    }

    /// Removes and returns the first stored value equal to `value` under
    /// the translator's equality. Returns `None`, leaving the tree
    /// untouched, when no stored value matches.
    pub fn remove(&mut self, value: &V) -> Option<V> {
        let key = self.translator.bounds(value);
        let min_elements = self.strategy.min_elements();
        let height = self.height;

        let mut orphans = Orphans::new();
        let removed = match self.root.as_mut() {
            Some(root) => remove_at(
                root,
                height,
                &key,
                value,
                min_elements,
                &self.translator,
                &mut orphans,
            )?,
            None => return None,
        };
        self.len -= 1;
        self.shrink_root();

        // Reinsert whatever underflow repair stranded: subtrees go back to
        // their original level, values to the leaves.
        let Orphans { values, subtrees } = orphans;
        for (level, child) in subtrees {
            self.push_entry(InsertEntry::Subtree { child, level });
        }
        for value in values {
            self.push_entry(InsertEntry::Value(value));
        }
        Some(removed)
    }

    /// Bounding box of everything stored, `None` for an empty tree.
    pub fn bounds(&self) -> Option<BoundingBox<D>> {
        self.root.as_ref().map(|root| root.bounds(&self.translator))
    }

    /// Runs a range query: a lazy iterator over the values accepted by
    /// `predicate`, visiting only subtrees whose bounding box passes it.
    pub fn query<P: SpatialPredicate<D>>(&self, predicate: P) -> Query<'_, V, T, P, D> {
        Query::new(self.root.as_ref(), &self.translator, predicate)
    }

    /// Iterates over every stored value in arbitrary order.
    pub fn iter(&self) -> Iter<'_, V, T, D> {
        Query::new(self.root.as_ref(), &self.translator, Everything)
    }

    /// Returns up to `k` stored values in non-decreasing distance from
    /// `point`. `k = 0` yields nothing without touching the tree.
    pub fn nearest(&self, point: [f64; D], k: usize) -> Nearest<'_, V, T, D> {
        Nearest::new(self.root.as_ref(), &self.translator, point, k)
    }

    /// Builds a tree from a batch of values with the default translator and
    /// strategy.
    ///
    /// The batch is sorted by Hilbert-curve index of the key centers before
    /// insertion, which clusters nearby values into the same leaves.
    pub fn bulk_load(values: Vec<V>) -> RTree<V, D, T, S>
    where
        T: Default,
        S: Default,
    {
        RTree::bulk_load_with(T::default(), S::default(), values)
    }

    /// Builds a tree from a batch of values with the given translator and
    /// strategy.
    pub fn bulk_load_with(translator: T, strategy: S, values: Vec<V>) -> RTree<V, D, T, S> {
        let entries = values
            .into_iter()
            .map(|value| (translator.bounds(&value), value))
            .collect();
        RTree::bulk_load_entries(translator, strategy, entries)
    }

    /// Builds a tree from `(bounding box hint, value)` pairs. The hints
    /// order the batch; the translator stays the source of truth for the
    /// stored keys.
    pub fn bulk_load_hinted(
        translator: T,
        strategy: S,
        entries: Vec<(BoundingBox<D>, V)>,
    ) -> RTree<V, D, T, S> {
        RTree::bulk_load_entries(translator, strategy, entries)
    }

    fn bulk_load_entries(
        translator: T,
        strategy: S,
        mut entries: Vec<(BoundingBox<D>, V)>,
    ) -> RTree<V, D, T, S> {
        let mut bounds = BoundingBox::empty();
        for (bbox, _) in &entries {
            bounds.expand(bbox);
        }

        if entries.len() > 1 {
            if D > 1 {
                let x_span = (bounds.min[0], bounds.max[0]);
                let y_span = (bounds.min[1], bounds.max[1]);
                entries.sort_by_key(|(bbox, _)| {
                    let center = bbox.center();
                    hilbert::hilbert_index_bounded(center[0], center[1], x_span, y_span, 16)
                });
            } else if D == 1 {
                // No curve to follow in one dimension; center order is it.
                entries.sort_by(|(a, _), (b, _)| a.center()[0].total_cmp(&b.center()[0]));
            }
        }

        let mut tree = RTree::with_translator_and_strategy(translator, strategy);
        for (_, value) in entries {
            tree.insert(value);
        }
        debug!("bulk loaded {} values, tree height {}", tree.len, tree.height);
        tree
    }

    /// Routes an entry into the tree, growing the root on splits and
    /// pumping forced-reinsertion evictions until everything has landed.
    fn push_entry(&mut self, entry: InsertEntry<V, D>) {
        let mut pending = vec![entry];
        let mut tracker = ReinsertTracker::default();

        while let Some(entry) = pending.pop() {
            // A subtree that no longer fits under the current root (the
            // tree shrank beneath it) is broken up into its parts.
            let entry = match entry {
                InsertEntry::Subtree { child, level } if level >= self.height => {
                    explode(child.node, level, &mut pending);
                    continue;
                }
                entry => entry,
            };

            if self.root.is_none() {
                match entry {
                    InsertEntry::Value(value) => {
                        self.root = Some(Node::Leaf {
                            values: vec![value],
                        });
                        self.height = 1;
                    }
                    // Subtrees were exploded above; nothing else reaches an
                    // empty tree.
                    InsertEntry::Subtree { .. } => debug_assert!(false),
                }
                continue;
            }

            let key = match &entry {
                InsertEntry::Value(value) => self.translator.bounds(value),
                InsertEntry::Subtree { child, .. } => child.bbox,
            };

            let height = self.height;
            let result = match self.root.as_mut() {
                Some(root) => insert_at(
                    root,
                    height,
                    entry,
                    key,
                    true,
                    &mut tracker,
                    &self.strategy,
                    &self.translator,
                ),
                None => continue,
            };

            match result {
                InsertResult::Ok => {}
                InsertResult::Split(sibling) => self.grow_root(sibling),
                InsertResult::Reinsert(entries) => pending.extend(entries),
            }
        }
    }

    fn grow_root(&mut self, sibling: ChildRef<V, D>) {
        if let Some(old_root) = self.root.take() {
            let bbox = old_root.bounds(&self.translator);
            self.root = Some(Node::Internal {
                children: vec![
                    ChildRef {
                        bbox,
                        node: old_root,
                    },
                    sibling,
                ],
            });
            self.height += 1;
            debug!("root split, tree height now {}", self.height);
        }
    }

    fn shrink_root(&mut self) {
        loop {
            match self.root.take() {
                Some(Node::Internal { mut children }) if children.len() == 1 => {
                    if let Some(child) = children.pop() {
                        self.root = Some(child.node);
                    }
                    self.height -= 1;
                    debug!("root collapsed, tree height now {}", self.height);
                }
                Some(Node::Internal { children }) if children.is_empty() => {
                    self.height = 0;
                    return;
                }
                Some(Node::Leaf { values }) if values.is_empty() => {
                    self.height = 0;
                    return;
                }
                other => {
                    self.root = other;
                    return;
                }
            }
        }
    }
}

/// Breaks a node into reinsertable parts one level down.
fn explode<V, const D: usize>(
    node: Node<V, D>,
    level: usize,
    pending: &mut Vec<InsertEntry<V, D>>,
) {
    match node {
        Node::Leaf { values } => pending.extend(values.into_iter().map(InsertEntry::Value)),
        Node::Internal { children } => pending.extend(
            children
                .into_iter()
                .map(|child| InsertEntry::Subtree { child, level: level - 1 }),
        ),
    }
}

/// Recursive insertion: descends to the entry's target level, pushes it in
/// and resolves overflow on the way back up.
#[allow(clippy::too_many_arguments)]
fn insert_at<V, T, S, const D: usize>(
    node: &mut Node<V, D>,
    level: usize,
    entry: InsertEntry<V, D>,
    key: BoundingBox<D>,
    is_root: bool,
    tracker: &mut ReinsertTracker,
    strategy: &S,
    translator: &T,
) -> InsertResult<V, D>
where
    T: Translator<V, D>,
    S: Strategy,
{
    let target_level = match &entry {
        InsertEntry::Value(_) => 1,
        InsertEntry::Subtree { level, .. } => level + 1,
    };

    if level == target_level {
        match (&mut *node, entry) {
            (Node::Leaf { values }, InsertEntry::Value(value)) => values.push(value),
            (Node::Internal { children }, InsertEntry::Subtree { child, .. }) => {
                children.push(child);
            }
            _ => debug_assert!(false, "entry kind does not match its target node"),
        }
        return resolve_overflow(node, level, is_root, tracker, strategy, translator);
    }

    let Node::Internal { children } = &mut *node else {
        debug_assert!(false, "descent reached a leaf above the target level");
        return InsertResult::Ok;
    };

    let index = strategy.choose_subtree(children, &key);
    match insert_at(
        &mut children[index].node,
        level - 1,
        entry,
        key,
        false,
        tracker,
        strategy,
        translator,
    ) {
        InsertResult::Ok => {
            children[index].bbox.expand(&key);
            InsertResult::Ok
        }
        InsertResult::Split(sibling) => {
            children[index].bbox = children[index].node.bounds(translator);
            children.push(sibling);
            resolve_overflow(node, level, is_root, tracker, strategy, translator)
        }
        InsertResult::Reinsert(entries) => {
            // Eviction below may have shrunk the subtree.
            children[index].bbox = children[index].node.bounds(translator);
            InsertResult::Reinsert(entries)
        }
    }
}

fn resolve_overflow<V, T, S, const D: usize>(
    node: &mut Node<V, D>,
    level: usize,
    is_root: bool,
    tracker: &mut ReinsertTracker,
    strategy: &S,
    translator: &T,
) -> InsertResult<V, D>
where
    T: Translator<V, D>,
    S: Strategy,
{
    if node.len() <= strategy.max_elements() {
        return InsertResult::Ok;
    }

    // First overflow of a level within one insert reinserts instead of
    // splitting; the root always splits.
    if !is_root && strategy.reinsert_count() > 0 && !tracker.reinserted(level) {
        tracker.mark(level);
        let evicted = evict_farthest(node, level, strategy.reinsert_count(), translator);
        debug!(
            "forced reinsertion of {} entries at level {}",
            evicted.len(),
            level
        );
        return InsertResult::Reinsert(evicted);
    }

    InsertResult::Split(split_node(node, strategy, translator))
}

/// Removes the `count` entries whose centers lie farthest from the node's
/// own center, returning them as reinsertable entries.
fn evict_farthest<V, T, const D: usize>(
    node: &mut Node<V, D>,
    level: usize,
    count: usize,
    translator: &T,
) -> Vec<InsertEntry<V, D>>
where
    T: Translator<V, D>,
{
    let center = node.bounds(translator).center();

    match node {
        Node::Leaf { values } => {
            let mut scored: Vec<(f64, V)> = values
                .drain(..)
                .map(|value| {
                    let dist = center_dist_sq(&translator.bounds(&value), &center);
                    (dist, value)
                })
                .collect();
            sort_by_score(&mut scored);
            let far = scored.split_off(scored.len() - count);
            *values = scored.into_iter().map(|(_, value)| value).collect();
            far.into_iter()
                .map(|(_, value)| InsertEntry::Value(value))
                .collect()
        }
        Node::Internal { children } => {
            let mut scored: Vec<(f64, ChildRef<V, D>)> = children
                .drain(..)
                .map(|child| (center_dist_sq(&child.bbox, &center), child))
                .collect();
            sort_by_score(&mut scored);
            let far = scored.split_off(scored.len() - count);
            *children = scored.into_iter().map(|(_, child)| child).collect();
            far.into_iter()
                .map(|(_, child)| InsertEntry::Subtree {
                    child,
                    level: level - 1,
                })
                .collect()
        }
    }
}

fn sort_by_score<E>(scored: &mut [(f64, E)]) {
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
}

fn center_dist_sq<const D: usize>(bbox: &BoundingBox<D>, center: &[f64; D]) -> f64 {
    let c = bbox.center();
    (0..D).map(|i| (c[i] - center[i]) * (c[i] - center[i])).sum()
}

/// Splits an overflowing node in place; returns the split-off sibling.
fn split_node<V, T, S, const D: usize>(
    node: &mut Node<V, D>,
    strategy: &S,
    translator: &T,
) -> ChildRef<V, D>
where
    T: Translator<V, D>,
    S: Strategy,
{
    match node {
        Node::Leaf { values } => {
            let pairs: Vec<(BoundingBox<D>, V)> = values
                .drain(..)
                .map(|value| (translator.bounds(&value), value))
                .collect();
            let (first, second) = strategy.split(pairs);
            *values = first.entries.into_iter().map(|(_, value)| value).collect();
            ChildRef {
                bbox: second.bbox,
                node: Node::Leaf {
                    values: second.entries.into_iter().map(|(_, value)| value).collect(),
                },
            }
        }
        Node::Internal { children } => {
            let entries: Vec<ChildRef<V, D>> = children.drain(..).collect();
            let (first, second) = strategy.split(entries);
            *children = first.entries;
            ChildRef {
                bbox: second.bbox,
                node: Node::Internal {
                    children: second.entries,
                },
            }
        }
    }
}

/// Recursive removal: descends only into children whose box contains the
/// key, removes the first match and repairs underflow on the way back up by
/// detaching starved nodes into `orphans`.
fn remove_at<V, T, const D: usize>(
    node: &mut Node<V, D>,
    level: usize,
    key: &BoundingBox<D>,
    value: &V,
    min_elements: usize,
    translator: &T,
    orphans: &mut Orphans<V, D>,
) -> Option<V>
where
    T: Translator<V, D>,
{
    match node {
        Node::Leaf { values } => {
            let index = values
                .iter()
                .position(|stored| translator.equals(stored, value))?;
            Some(values.remove(index))
        }
        Node::Internal { children } => {
            for i in 0..children.len() {
                if !children[i].bbox.contains(key) {
                    continue;
                }
                let Some(removed) = remove_at(
                    &mut children[i].node,
                    level - 1,
                    key,
                    value,
                    min_elements,
                    translator,
                    orphans,
                ) else {
                    continue;
                };

                if children[i].node.len() < min_elements {
                    let child = children.remove(i);
                    collect_orphans(child.node, level - 1, orphans);
                } else {
                    children[i].bbox = children[i].node.bounds(translator);
                }
                return Some(removed);
            }
            None
        }
    }
}

/// Hands a detached node's entries to the orphan set: values directly,
/// child subtrees tagged with their level.
fn collect_orphans<V, const D: usize>(
    node: Node<V, D>,
    level: usize,
    orphans: &mut Orphans<V, D>,
) {
    match node {
        Node::Leaf { values } => orphans.values.extend(values),
        Node::Internal { children } => orphans.subtrees.extend(
            children
                .into_iter()
                .map(|child| (level - 1, child)),
        ),
    }
}
