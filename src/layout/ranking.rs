//! Generational placement of a family graph: person cards on even rows,
//! union points between them, children below their parents' union.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use super::types::{NodeKind, TreeLink, TreeNode};
use crate::config::TreeConfig;
use crate::ir::Tree;

const ORDER_PASSES: usize = 4;
const PLACEMENT_PASSES: usize = 4;

/// Person and union nodes with directed edges parent -> union -> child.
#[derive(Debug, Clone, Default)]
pub struct FamilyGraph {
    pub node_ids: Vec<String>,
    pub kinds: HashMap<String, NodeKind>,
    pub edges: Vec<(String, String)>,
}

impl FamilyGraph {
    fn kind(&self, id: &str) -> NodeKind {
        self.kinds.get(id).copied().unwrap_or(NodeKind::Person)
    }
}

/// One union per distinct parent set. Relationships naming unknown people
/// are dropped.
pub fn build_family_graph(tree: &Tree) -> FamilyGraph {
    let mut graph = FamilyGraph::default();
    let known: HashSet<&str> = tree.people.iter().map(|p| p.id.as_str()).collect();
    for person in &tree.people {
        if graph.kinds.insert(person.id.clone(), NodeKind::Person).is_none() {
            graph.node_ids.push(person.id.clone());
        }
    }

    let mut parents_of: Vec<(String, Vec<String>)> = Vec::new();
    for rel in &tree.relationships {
        if !known.contains(rel.parent_id.as_str()) || !known.contains(rel.child_id.as_str()) {
            tracing::debug!(parent = %rel.parent_id, child = %rel.child_id, "relationship names an unknown person");
            continue;
        }
        if rel.parent_id == rel.child_id {
            continue;
        }
        match parents_of.iter_mut().find(|(child, _)| *child == rel.child_id) {
            Some((_, parents)) => {
                if !parents.contains(&rel.parent_id) {
                    parents.push(rel.parent_id.clone());
                }
            }
            None => parents_of.push((rel.child_id.clone(), vec![rel.parent_id.clone()])),
        }
    }

    let mut seen_unions: HashSet<String> = HashSet::new();
    for (child, parents) in &parents_of {
        let mut key = parents.clone();
        key.sort();
        let union_id = format!("u:{}", key.join("+"));
        if seen_unions.insert(union_id.clone()) {
            graph.kinds.insert(union_id.clone(), NodeKind::Union);
            graph.node_ids.push(union_id.clone());
            for parent in parents {
                graph.edges.push((parent.clone(), union_id.clone()));
            }
        }
        graph.edges.push((union_id, child.clone()));
    }
    graph
}

/// Topological longest-path ranks. Cycles are broken at the remaining node
/// earliest in declaration order; its incoming edges become back-edges.
/// Also returns each node's position in the topological order.
pub(super) fn compute_ranks(
    node_ids: &[String],
    edges: &[(String, String)],
) -> (HashMap<String, usize>, HashMap<String, usize>) {
    let set: HashSet<&String> = node_ids.iter().collect();
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut indeg: HashMap<&str, usize> = node_ids.iter().map(|id| (id.as_str(), 0)).collect();
    for (from, to) in edges {
        if set.contains(from) && set.contains(to) {
            adj.entry(from.as_str()).or_default().push(to.as_str());
            *indeg.entry(to.as_str()).or_default() += 1;
        }
    }
    let order_key: HashMap<&str, usize> = node_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    let mut ready: BinaryHeap<Reverse<(usize, &str)>> = BinaryHeap::new();
    for id in node_ids {
        if indeg[id.as_str()] == 0 {
            ready.push(Reverse((order_key[id.as_str()], id.as_str())));
        }
    }

    let mut order: Vec<&str> = Vec::with_capacity(node_ids.len());
    let mut processed: HashSet<&str> = HashSet::new();
    loop {
        while let Some(Reverse((_key, id))) = ready.pop() {
            if !processed.insert(id) {
                continue;
            }
            order.push(id);
            for next in adj.get(id).map(Vec::as_slice).unwrap_or_default() {
                if processed.contains(next) {
                    continue;
                }
                if let Some(deg) = indeg.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.push(Reverse((order_key[next], *next)));
                    }
                }
            }
        }

        if processed.len() >= node_ids.len() {
            break;
        }
        let best = node_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !processed.contains(id))
            .min_by_key(|id| order_key[id]);
        match best {
            Some(id) => ready.push(Reverse((order_key[id], id))),
            None => break,
        }
    }

    let order_index: HashMap<String, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.to_string(), idx))
        .collect();

    let mut ranks: HashMap<String, usize> = HashMap::new();
    for node in &order {
        let rank = *ranks.entry(node.to_string()).or_insert(0);
        let from_idx = order_index[*node];
        for next in adj.get(node).map(Vec::as_slice).unwrap_or_default() {
            if order_index[*next] <= from_idx {
                continue;
            }
            let entry = ranks.entry(next.to_string()).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }

    (ranks, order_index)
}

/// Raises partners to a common generation and pushes descendants down to
/// keep every forward edge one rank long at least.
fn align_partners(graph: &FamilyGraph, ranks: &mut HashMap<String, usize>, order_index: &HashMap<String, usize>) {
    let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in &graph.edges {
        if graph.kind(to) == NodeKind::Union {
            parents.entry(to.as_str()).or_default().push(from.as_str());
        }
    }
    let forward = |from: &str, to: &str| {
        let a = order_index.get(from).copied().unwrap_or(0);
        let b = order_index.get(to).copied().unwrap_or(0);
        b > a
    };

    for _ in 0..=graph.node_ids.len() {
        let mut changed = false;
        for ps in parents.values() {
            let top = ps.iter().map(|p| ranks.get(*p).copied().unwrap_or(0)).max().unwrap_or(0);
            for p in ps {
                let r = ranks.entry(p.to_string()).or_insert(0);
                if *r < top {
                    *r = top;
                    changed = true;
                }
            }
        }
        for (from, to) in &graph.edges {
            if !forward(from, to) {
                continue;
            }
            let need = ranks.get(from).copied().unwrap_or(0) + 1;
            let r = ranks.entry(to.clone()).or_insert(0);
            if *r < need {
                *r = need;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

pub(super) fn order_rank_nodes(rank_nodes: &mut [Vec<String>], edges: &[(String, String)], passes: usize) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
    for (from, to) in edges {
        outgoing.entry(from.clone()).or_default().push(to.clone());
        incoming.entry(to.clone()).or_default().push(from.clone());
    }

    let node_order: HashMap<String, usize> = rank_nodes
        .iter()
        .flatten()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect();

    let mut positions: HashMap<String, usize> = HashMap::new();
    let update_positions = |rank_nodes: &mut [Vec<String>], positions: &mut HashMap<String, usize>| {
        positions.clear();
        for bucket in rank_nodes.iter() {
            for (idx, node_id) in bucket.iter().enumerate() {
                positions.insert(node_id.clone(), idx);
            }
        }
    };
    update_positions(rank_nodes, &mut positions);

    let sort_bucket = |bucket: &mut Vec<String>,
                       neighbors: &HashMap<String, Vec<String>>,
                       positions: &HashMap<String, usize>| {
        let current: HashMap<String, usize> = bucket
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        bucket.sort_by(|a, b| {
            let a_score = median_position(a, neighbors, positions, &current);
            let b_score = median_position(b, neighbors, positions, &current);
            a_score
                .total_cmp(&b_score)
                .then_with(|| current[a].cmp(&current[b]))
                .then_with(|| node_order[a].cmp(&node_order[b]))
        });
    };

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
            update_positions(rank_nodes, &mut positions);
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            if rank_nodes[rank].len() <= 1 {
                continue;
            }
            sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
            update_positions(rank_nodes, &mut positions);
        }
    }
}

pub(super) fn median_position(
    node_id: &str,
    neighbors: &HashMap<String, Vec<String>>,
    positions: &HashMap<String, usize>,
    current_positions: &HashMap<String, usize>,
) -> f32 {
    let fallback = *current_positions.get(node_id).unwrap_or(&0) as f32;
    let Some(list) = neighbors.get(node_id) else {
        return fallback;
    };
    let mut values: Vec<f32> = list
        .iter()
        .filter_map(|n| positions.get(n).map(|p| *p as f32))
        .collect();
    if values.is_empty() {
        return fallback;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

/// Moves each person's partners right next to them so couple bars do not
/// cross other cards.
fn keep_partners_adjacent(bucket: &mut Vec<String>, partners: &HashMap<String, Vec<String>>) {
    let members: HashSet<String> = bucket.iter().cloned().collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::with_capacity(bucket.len());
    for id in bucket.iter() {
        if !placed.insert(id.clone()) {
            continue;
        }
        out.push(id.clone());
        for partner in partners.get(id).map(Vec::as_slice).unwrap_or_default() {
            if members.contains(partner) && placed.insert(partner.clone()) {
                out.push(partner.clone());
            }
        }
    }
    *bucket = out;
}

/// Places rows left to right honouring `desired` as closely as the minimum
/// separation allows. Averages a left-anchored and a right-anchored packing,
/// both of which satisfy the separation.
fn pack_row(desired: &[f32], widths: &[f32], sep: f32) -> Vec<f32> {
    let n = desired.len();
    if n == 0 {
        return Vec::new();
    }
    let gap = |i: usize| (widths[i] + widths[i + 1]) / 2.0 + sep;
    let mut left = desired.to_vec();
    for i in 1..n {
        left[i] = left[i].max(left[i - 1] + gap(i - 1));
    }
    let mut right = desired.to_vec();
    for i in (0..n - 1).rev() {
        right[i] = right[i].min(right[i + 1] - gap(i));
    }
    left.iter().zip(&right).map(|(l, r)| (l + r) / 2.0).collect()
}

fn mean_of(ids: Option<&Vec<String>>, xs: &HashMap<String, f32>) -> Option<f32> {
    let values: Vec<f32> = ids?.iter().filter_map(|id| xs.get(id).copied()).collect();
    (!values.is_empty()).then(|| values.iter().sum::<f32>() / values.len() as f32)
}

/// Center coordinates for every person and union of `tree`.
pub fn layout_family(tree: &Tree, config: &TreeConfig) -> (Vec<TreeNode>, Vec<TreeLink>) {
    let graph = build_family_graph(tree);
    if graph.node_ids.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let (mut ranks, order_index) = compute_ranks(&graph.node_ids, &graph.edges);
    align_partners(&graph, &mut ranks, &order_index);

    let mut levels: Vec<usize> = ranks.values().copied().collect();
    levels.sort_unstable();
    levels.dedup();
    let row_of: HashMap<usize, usize> = levels.iter().enumerate().map(|(row, r)| (*r, row)).collect();
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); levels.len()];
    for id in &graph.node_ids {
        let rank = ranks.get(id).copied().unwrap_or(0);
        rows[row_of[&rank]].push(id.clone());
    }

    order_rank_nodes(&mut rows, &graph.edges, ORDER_PASSES);

    let mut incoming: HashMap<String, Vec<String>> = HashMap::new();
    let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
    for (from, to) in &graph.edges {
        outgoing.entry(from.clone()).or_default().push(to.clone());
        incoming.entry(to.clone()).or_default().push(from.clone());
    }
    let mut partners: HashMap<String, Vec<String>> = HashMap::new();
    for (union_id, parents) in &incoming {
        if graph.kind(union_id) != NodeKind::Union {
            continue;
        }
        for p in parents {
            let entry = partners.entry(p.clone()).or_default();
            entry.extend(parents.iter().filter(|q| *q != p).cloned());
        }
    }
    for row in rows.iter_mut() {
        keep_partners_adjacent(row, &partners);
    }

    let size = |id: &str| match graph.kind(id) {
        NodeKind::Person => (config.card_width, config.card_height),
        NodeKind::Union => (0.0, 0.0),
    };

    // Every gap borders a union row, and elbows drop one stem before they
    // turn, so a gap shorter than the stem would make them double back.
    let row_gap = config.rank_sep.max(config.stem_len());
    let mut y = config.margin_y;
    let mut row_y = Vec::with_capacity(rows.len());
    for row in &rows {
        let height = row.iter().map(|id| size(id).1).fold(0.0_f32, f32::max);
        row_y.push(y + height / 2.0);
        y += height + row_gap;
    }

    let mut xs: HashMap<String, f32> = HashMap::new();
    for row in &rows {
        let widths: Vec<f32> = row.iter().map(|id| size(id).0).collect();
        let packed = pack_row(&vec![0.0; row.len()], &widths, config.node_sep);
        for (id, x) in row.iter().zip(packed) {
            xs.insert(id.clone(), x);
        }
    }

    let place_row = |row: &Vec<String>, xs: &mut HashMap<String, f32>, neighbors: &HashMap<String, Vec<String>>| {
        let widths: Vec<f32> = row.iter().map(|id| size(id).0).collect();
        let desired: Vec<f32> = row
            .iter()
            .map(|id| mean_of(neighbors.get(id), xs).unwrap_or(xs[id]))
            .collect();
        for (id, x) in row.iter().zip(pack_row(&desired, &widths, config.node_sep)) {
            xs.insert(id.clone(), x);
        }
    };
    for _ in 0..PLACEMENT_PASSES {
        for row in rows.iter().rev() {
            place_row(row, &mut xs, &outgoing);
        }
        for row in &rows {
            place_row(row, &mut xs, &incoming);
        }
    }

    let left = graph
        .node_ids
        .iter()
        .map(|id| xs[id] - size(id).0 / 2.0)
        .fold(f32::INFINITY, f32::min);
    let shift = config.margin_x - left;

    let people: HashMap<&str, &crate::ir::Person> = tree.people.iter().map(|p| (p.id.as_str(), p)).collect();
    let mut nodes = Vec::with_capacity(graph.node_ids.len());
    for (row_idx, row) in rows.iter().enumerate() {
        for id in row {
            let kind = graph.kind(id);
            let person = people.get(id.as_str());
            nodes.push(TreeNode {
                id: id.clone(),
                kind,
                x: xs[id] + shift,
                y: row_y[row_idx],
                label: person.map(|p| p.name.clone()).unwrap_or_default(),
                meta: person.map(|p| p.card_meta.clone()).unwrap_or_default(),
                photo: person.map(|p| p.photo.clone()).unwrap_or_default(),
            });
        }
    }
    let links = graph
        .edges
        .iter()
        .map(|(source, target)| TreeLink {
            source: source.clone(),
            target: target.clone(),
        })
        .collect();
    (nodes, links)
}
