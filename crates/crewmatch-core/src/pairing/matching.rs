//! Maximum-cardinality bipartite matching between PICs and SICs.
//!
//! # Algorithm
//!
//! Hopcroft-Karp: each phase runs a BFS from every free PIC to layer the
//! alternating-path graph, then a DFS per free PIC that augments along
//! vertex-disjoint shortest paths. Stops when the BFS reaches no free SIC.
//!
//! # Complexity
//! O(E * sqrt(V))
//!
//! # Reference
//! Hopcroft, J. E. & Karp, R. M. (1973). "An n^5/2 algorithm for maximum
//! matchings in bipartite graphs". SIAM Journal on Computing 2(4).

use crate::model::{Pairing, PilotCode};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const NIL: usize = usize::MAX;
const INF: usize = usize::MAX;

/// Compute a maximum matching over the allowed edges.
///
/// Edges whose endpoints are not in `pics`/`sics` are ignored, as are
/// duplicate codes. The result is sorted by PIC and deterministic for a
/// given input. Empty sides give an empty result.
pub fn max_bipartite_pairings(
    pics: &[PilotCode],
    sics: &[PilotCode],
    edges: &[(PilotCode, PilotCode)],
) -> Vec<Pairing> {
    let pics: Vec<&PilotCode> = pics.iter().collect::<BTreeSet<_>>().into_iter().collect();
    let sics: Vec<&PilotCode> = sics.iter().collect::<BTreeSet<_>>().into_iter().collect();
    if pics.is_empty() || sics.is_empty() {
        return Vec::new();
    }

    let pic_index: BTreeMap<&PilotCode, usize> = pics.iter().enumerate().map(|(i, p)| (*p, i)).collect();
    let sic_index: BTreeMap<&PilotCode, usize> = sics.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut adj = vec![Vec::new(); pics.len()];
    for (pic, sic) in edges {
        if let (Some(&u), Some(&v)) = (pic_index.get(pic), sic_index.get(sic)) {
            adj[u].push(v);
        }
    }
    for list in &mut adj {
        list.sort_unstable();
        list.dedup();
    }

    let mut graph = HopcroftKarp::new(adj, sics.len());
    let size = graph.run();
    tracing::debug!(pics = pics.len(), sics = sics.len(), edges = edges.len(), size, "matching computed");

    graph
        .pair_u
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v != NIL)
        .map(|(u, &v)| Pairing {
            pic: pics[u].clone(),
            sic: sics[v].clone(),
        })
        .collect()
}

struct HopcroftKarp {
    adj: Vec<Vec<usize>>,
    pair_u: Vec<usize>,
    pair_v: Vec<usize>,
    dist: Vec<usize>,
}

impl HopcroftKarp {
    fn new(adj: Vec<Vec<usize>>, right: usize) -> Self {
        let left = adj.len();
        Self {
            adj,
            pair_u: vec![NIL; left],
            pair_v: vec![NIL; right],
            dist: vec![INF; left],
        }
    }

    fn run(&mut self) -> usize {
        let mut size = 0;
        while self.bfs() {
            for u in 0..self.adj.len() {
                if self.pair_u[u] == NIL && self.dfs(u) {
                    size += 1;
                }
            }
        }
        size
    }

    /// Layer the free PICs at distance 0. True if some free SIC is reachable.
    fn bfs(&mut self) -> bool {
        let mut queue = VecDeque::new();
        for u in 0..self.adj.len() {
            if self.pair_u[u] == NIL {
                self.dist[u] = 0;
                queue.push_back(u);
            } else {
                self.dist[u] = INF;
            }
        }

        let mut found = false;
        while let Some(u) = queue.pop_front() {
            for &v in &self.adj[u] {
                match self.pair_v[v] {
                    NIL => found = true,
                    w if self.dist[w] == INF => {
                        self.dist[w] = self.dist[u] + 1;
                        queue.push_back(w);
                    }
                    _ => {}
                }
            }
        }
        found
    }

    fn dfs(&mut self, u: usize) -> bool {
        for i in 0..self.adj[u].len() {
            let v = self.adj[u][i];
            let w = self.pair_v[v];
            if w == NIL || (self.dist[w] == self.dist[u] + 1 && self.dfs(w)) {
                self.pair_u[u] = v;
                self.pair_v[v] = u;
                return true;
            }
        }
        // dead end for the rest of this phase
        self.dist[u] = INF;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn code(s: &str) -> PilotCode {
        PilotCode::parse(s).unwrap()
    }

    fn codes(list: &[&str]) -> Vec<PilotCode> {
        list.iter().map(|s| code(s)).collect()
    }

    fn pair(pic: &str, sic: &str) -> Pairing {
        Pairing {
            pic: code(pic),
            sic: code(sic),
        }
    }

    #[test]
    fn test_single_allowed_edge() {
        let result = max_bipartite_pairings(
            &codes(&["KVB"]),
            &codes(&["HEB", "YAD"]),
            &[(code("KVB"), code("YAD"))],
        );
        assert_eq!(result, vec![pair("KVB", "YAD")]);
    }

    #[test]
    fn test_perfect_matching_found() {
        let pics = codes(&["AA", "BB"]);
        let sics = codes(&["CC", "DD"]);
        let edges: Vec<_> = pics
            .iter()
            .flat_map(|p| sics.iter().map(move |s| (p.clone(), s.clone())))
            .collect();
        let result = max_bipartite_pairings(&pics, &sics, &edges);
        assert_eq!(result.len(), 2);
        assert_eq!(result.iter().map(|p| p.pic.clone()).collect::<Vec<_>>(), pics);
    }

    #[test]
    fn test_greedy_trap_needs_augmenting_path() {
        // AAA takes XXA greedily; BBB can only fly with XXA.
        let edges = vec![
            (code("AAA"), code("XXA")),
            (code("AAA"), code("XXB")),
            (code("BBB"), code("XXA")),
        ];
        let result = max_bipartite_pairings(&codes(&["AAA", "BBB"]), &codes(&["XXA", "XXB"]), &edges);
        assert_eq!(result, vec![pair("AAA", "XXB"), pair("BBB", "XXA")]);
    }

    #[test]
    fn test_empty_sides() {
        assert!(max_bipartite_pairings(&[], &[], &[]).is_empty());
        assert!(max_bipartite_pairings(&codes(&["KVB"]), &[], &[]).is_empty());
        assert!(max_bipartite_pairings(&[], &codes(&["HEB"]), &[]).is_empty());
    }

    #[test]
    fn test_foreign_edges_ignored() {
        let result = max_bipartite_pairings(
            &codes(&["KVB"]),
            &codes(&["HEB"]),
            &[(code("ZZZ"), code("HEB")), (code("KVB"), code("QQQ"))],
        );
        assert!(result.is_empty());
    }

    /// Exhaustive maximum matching size for small graphs.
    fn brute_force(adj: &[Vec<usize>], u: usize, used: &mut [bool]) -> usize {
        if u == adj.len() {
            return 0;
        }
        let mut best = brute_force(adj, u + 1, used);
        for &v in &adj[u] {
            if !used[v] {
                used[v] = true;
                best = best.max(1 + brute_force(adj, u + 1, used));
                used[v] = false;
            }
        }
        best
    }

    fn graph_strategy() -> impl Strategy<Value = (usize, usize, Vec<(usize, usize)>)> {
        (0usize..7, 0usize..7).prop_flat_map(|(n, m)| {
            let edges = if n == 0 || m == 0 {
                Just(Vec::new()).boxed()
            } else {
                prop::collection::vec((0..n, 0..m), 0..20).boxed()
            };
            (Just(n), Just(m), edges)
        })
    }

    fn label(prefix: char, i: usize) -> PilotCode {
        let letter = (b'A' + i as u8) as char;
        PilotCode::parse(&format!("{prefix}{letter}")).unwrap()
    }

    proptest! {
        #[test]
        fn prop_matching_is_valid_and_maximum((n, m, raw) in graph_strategy()) {
            let pics: Vec<PilotCode> = (0..n).map(|i| label('P', i)).collect();
            let sics: Vec<PilotCode> = (0..m).map(|i| label('S', i)).collect();
            let edges: Vec<(PilotCode, PilotCode)> =
                raw.iter().map(|&(u, v)| (pics[u].clone(), sics[v].clone())).collect();

            let result = max_bipartite_pairings(&pics, &sics, &edges);

            let pic_set: BTreeSet<_> = result.iter().map(|p| &p.pic).collect();
            let sic_set: BTreeSet<_> = result.iter().map(|p| &p.sic).collect();
            prop_assert_eq!(pic_set.len(), result.len());
            prop_assert_eq!(sic_set.len(), result.len());
            prop_assert!(result.len() <= n.min(m));
            for p in &result {
                prop_assert!(edges.contains(&(p.pic.clone(), p.sic.clone())));
            }

            let mut adj = vec![Vec::new(); n];
            for &(u, v) in &raw {
                adj[u].push(v);
            }
            let expected = brute_force(&adj, 0, &mut vec![false; m]);
            prop_assert_eq!(result.len(), expected);
        }

        #[test]
        fn prop_matching_is_deterministic((n, m, raw) in graph_strategy()) {
            let pics: Vec<PilotCode> = (0..n).map(|i| label('P', i)).collect();
            let sics: Vec<PilotCode> = (0..m).map(|i| label('S', i)).collect();
            let edges: Vec<(PilotCode, PilotCode)> =
                raw.iter().map(|&(u, v)| (pics[u].clone(), sics[v].clone())).collect();

            let a = max_bipartite_pairings(&pics, &sics, &edges);
            let b = max_bipartite_pairings(&pics, &sics, &edges);
            prop_assert_eq!(a, b);
        }
    }
}
