//! Bulk-loaded, read-only priority R-tree.
//!
//! ## Packing
//!
//! Each level is packed with the pseudo-PR-tree recursion: from the current block
//! of items, the `B` items with the smallest `xmin`, the `B` with the smallest
//! `ymin`, the `B` with the largest `xmax` and the `B` with the largest `ymax`
//! are split off as four priority groups. The remainder is halved at the median
//! center along the axis of greatest extent and each half is packed the same
//! way. Every group becomes one node. The next level packs those nodes by their
//! MBRs until a single root remains.
//!
//! ## Traversal
//!
//! Every node records up to four priority children (the children holding the
//! node's extreme `xmin`, `ymin`, `xmax` and `ymax`). Queries descend into those
//! first and then into the remaining children in packed order. The order changes
//! when hits are reported, never which hits are reported.
//!
//! The tree is immutable once [`PackedPrTree::load`] returns and is `Sync`
//! whenever its items are.

use super::leaf::MbrConverter;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Lower bound on the branching factor.
pub const MIN_BRANCH_FACTOR: usize = 4;

/// Branching factor for a tree over `n` leaves: `max(4, floor(cbrt(sqrt(n))))`.
///
/// The floating-point estimate is corrected with integer powers so the result
/// is the exact floor of `n^(1/6)` for every `n`.
///
/// ```
/// use georewrite::index::prtree::branch_factor;
///
/// assert_eq!(branch_factor(10_000), 4);
/// assert_eq!(branch_factor(1_000_000), 10);
/// assert_eq!(branch_factor(1_000_000_000_000), 100);
/// ```
pub fn branch_factor(n: usize) -> usize {
    let target = n as u128;
    let mut b = (n as f64).sqrt().cbrt().floor() as u128;
    while b > 0 && b.pow(6) > target {
        b -= 1;
    }
    while (b + 1).pow(6) <= target {
        b += 1;
    }
    (b as usize).max(MIN_BRANCH_FACTOR)
}

/// Two-dimensional minimum bounding rectangle with closed bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mbr {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Mbr {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: [min_x, min_y],
            max: [max_x, max_y],
        }
    }

    fn of<T, C: MbrConverter<T>>(converter: &C, item: &T) -> Self {
        Self {
            min: [converter.min(0, item), converter.min(1, item)],
            max: [converter.max(0, item), converter.max(1, item)],
        }
    }

    pub fn union(&self, other: &Mbr) -> Mbr {
        Mbr {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn intersects(&self, other: &Mbr) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }

    fn center(&self, axis: usize) -> f64 {
        self.min[axis] * 0.5 + self.max[axis] * 0.5
    }

    fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}

/// The four extremes a priority group or priority child is chosen by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    MinX,
    MinY,
    MaxX,
    MaxY,
}

impl Extreme {
    const ALL: [Extreme; 4] = [Extreme::MinX, Extreme::MinY, Extreme::MaxX, Extreme::MaxY];

    /// `Less` when `a` is more extreme than `b`.
    fn compare(self, a: &Mbr, b: &Mbr) -> Ordering {
        match self {
            Extreme::MinX => a.min[0].total_cmp(&b.min[0]),
            Extreme::MinY => a.min[1].total_cmp(&b.min[1]),
            Extreme::MaxX => b.max[0].total_cmp(&a.max[0]),
            Extreme::MaxY => b.max[1].total_cmp(&a.max[1]),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    mbr: Mbr,
    /// Index of the first child in the level below (or in the leaf array).
    first: usize,
    len: usize,
    /// Child positions in `0..len`, distinct, visited before the others.
    priority: SmallVec<[usize; 4]>,
}

impl Node {
    fn visit_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.priority
            .iter()
            .copied()
            .chain((0..self.len).filter(move |pos| !self.priority.contains(pos)))
    }
}

/// A packed priority R-tree over items of type `L`.
#[derive(Debug, Clone)]
pub struct PackedPrTree<L> {
    branch_factor: usize,
    leaves: Vec<L>,
    leaf_mbrs: Vec<Mbr>,
    /// `levels[0]` nodes point into `leaves`, `levels[k]` into `levels[k - 1]`.
    /// The last level holds exactly one node, the root.
    levels: Vec<Vec<Node>>,
}

impl<L> PackedPrTree<L> {
    /// Bulk-loads `items` into a new tree.
    ///
    /// Item bounds are read through `converter`, which must describe
    /// two-dimensional items with finite coordinates.
    pub fn load<C: MbrConverter<L>>(converter: &C, branch_factor: usize, items: Vec<L>) -> Self {
        debug_assert_eq!(converter.dimensions(), 2);
        let b = branch_factor.max(2);

        if items.is_empty() {
            return Self {
                branch_factor: b,
                leaves: Vec::new(),
                leaf_mbrs: Vec::new(),
                levels: Vec::new(),
            };
        }

        let mbrs: Vec<Mbr> = items.iter().map(|item| Mbr::of(converter, item)).collect();
        let groups = pack(&mbrs, b);
        let order: Vec<usize> = groups.iter().flatten().copied().collect();
        let leaves = permute(items, &order);
        let leaf_mbrs = permute(mbrs, &order);

        let mut levels = Vec::new();
        let mut nodes = nodes_from_groups(&groups, &leaf_mbrs);
        while nodes.len() > 1 {
            let mbrs: Vec<Mbr> = nodes.iter().map(|n| n.mbr).collect();
            let groups = pack(&mbrs, b);
            let order: Vec<usize> = groups.iter().flatten().copied().collect();
            let packed = permute(nodes, &order);
            let packed_mbrs = permute(mbrs, &order);
            nodes = nodes_from_groups(&groups, &packed_mbrs);
            levels.push(packed);
        }
        levels.push(nodes);

        Self {
            branch_factor: b,
            leaves,
            leaf_mbrs,
            levels,
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn branch_factor(&self) -> usize {
        self.branch_factor
    }

    /// Number of node levels above the leaves; 0 for an empty tree.
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// MBR of the root, `None` for an empty tree.
    pub fn bounds(&self) -> Option<Mbr> {
        self.root().map(|root| root.mbr)
    }

    /// Calls `visitor` once for every item whose MBR intersects `query`.
    ///
    /// Stops at the first visitor error and returns it.
    pub fn find<'a, E, V>(&'a self, query: &Mbr, visitor: &mut V) -> Result<(), E>
    where
        V: FnMut(&'a L) -> Result<(), E>,
    {
        match self.root() {
            Some(root) => self.visit(self.levels.len() - 1, root, query, visitor),
            None => Ok(()),
        }
    }

    fn root(&self) -> Option<&Node> {
        self.levels.last().and_then(|top| top.first())
    }

    fn visit<'a, E, V>(
        &'a self,
        level: usize,
        node: &'a Node,
        query: &Mbr,
        visitor: &mut V,
    ) -> Result<(), E>
    where
        V: FnMut(&'a L) -> Result<(), E>,
    {
        if !node.mbr.intersects(query) {
            return Ok(());
        }
        for pos in node.visit_order() {
            let child = node.first + pos;
            if level == 0 {
                if self.leaf_mbrs[child].intersects(query) {
                    visitor(&self.leaves[child])?;
                }
            } else {
                self.visit(level - 1, &self.levels[level - 1][child], query, visitor)?;
            }
        }
        Ok(())
    }
}

/// Groups item indices into nodes of at most `b` entries.
fn pack(mbrs: &[Mbr], b: usize) -> Vec<Vec<usize>> {
    let mut groups = Vec::with_capacity(mbrs.len().div_ceil(b));
    pack_block(mbrs, (0..mbrs.len()).collect(), b, &mut groups);
    groups
}

fn pack_block(mbrs: &[Mbr], mut items: Vec<usize>, b: usize, groups: &mut Vec<Vec<usize>>) {
    for extreme in Extreme::ALL {
        if items.len() <= b {
            if !items.is_empty() {
                groups.push(items);
            }
            return;
        }
        // Ties fall back to input position so packing is deterministic.
        let cmp = |x: &usize, y: &usize| extreme.compare(&mbrs[*x], &mbrs[*y]).then(x.cmp(y));
        items.select_nth_unstable_by(b - 1, cmp);
        let rest = items.split_off(b);
        items.sort_unstable_by(cmp);
        groups.push(std::mem::replace(&mut items, rest));
    }

    if items.len() <= b {
        if !items.is_empty() {
            groups.push(items);
        }
        return;
    }

    let axis = widest_axis(mbrs, &items);
    items.sort_unstable_by(|x, y| {
        mbrs[*x]
            .center(axis)
            .total_cmp(&mbrs[*y].center(axis))
            .then(x.cmp(y))
    });
    let upper = items.split_off(items.len() / 2);
    pack_block(mbrs, items, b, groups);
    pack_block(mbrs, upper, b, groups);
}

fn widest_axis(mbrs: &[Mbr], items: &[usize]) -> usize {
    let bounds = items
        .iter()
        .map(|&i| mbrs[i])
        .reduce(|acc, m| acc.union(&m));
    match bounds {
        Some(bounds) if bounds.extent(1) > bounds.extent(0) => 1,
        _ => 0,
    }
}

/// Builds one node per group; `child_mbrs` is already in packed order.
fn nodes_from_groups(groups: &[Vec<usize>], child_mbrs: &[Mbr]) -> Vec<Node> {
    let mut offset = 0;
    groups
        .iter()
        .map(|group| {
            let children = &child_mbrs[offset..offset + group.len()];
            let node = Node {
                mbr: children
                    .iter()
                    .skip(1)
                    .fold(children[0], |acc, m| acc.union(m)),
                first: offset,
                len: children.len(),
                priority: priority_children(children),
            };
            offset += group.len();
            node
        })
        .collect()
}

fn priority_children(children: &[Mbr]) -> SmallVec<[usize; 4]> {
    let mut picks = SmallVec::new();
    for extreme in Extreme::ALL {
        let best = (0..children.len())
            .min_by(|&a, &b| extreme.compare(&children[a], &children[b]).then(a.cmp(&b)));
        if let Some(pos) = best
            && !picks.contains(&pos)
        {
            picks.push(pos);
        }
    }
    picks
}

/// Reorders `items` so that `result[k] == items[order[k]]`.
fn permute<X>(items: Vec<X>, order: &[usize]) -> Vec<X> {
    let mut rank = vec![0; order.len()];
    for (pos, &idx) in order.iter().enumerate() {
        rank[idx] = pos;
    }
    let mut keyed: Vec<(usize, X)> = items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| (rank[idx], item))
        .collect();
    keyed.sort_unstable_by_key(|(pos, _)| *pos);
    keyed.into_iter().map(|(_, item)| item).collect()
}
