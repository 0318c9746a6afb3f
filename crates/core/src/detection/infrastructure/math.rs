//! Union-find helpers used to cluster raw detections.

/// Find root of element `i` with path halving for amortized near-O(1).
pub fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Merge the sets containing `a` and `b`.
pub fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

/// Label each element with a dense cluster index, numbered in order of
/// first appearance. Returns `(labels, cluster_count)`.
pub fn cluster_labels(parent: &mut [usize]) -> (Vec<usize>, usize) {
    let mut root_label: std::collections::HashMap<usize, usize> =
        std::collections::HashMap::new();
    let mut labels = Vec::with_capacity(parent.len());
    for i in 0..parent.len() {
        let root = find(parent, i);
        let next = root_label.len();
        labels.push(*root_label.entry(root).or_insert(next));
    }
    (labels, root_label.len())
}
