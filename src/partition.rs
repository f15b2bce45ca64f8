//! Clusters, partitions and partition signatures.
//!
//! The search engine works on plain assignment vectors (`actor → position`)
//! while exploring; a [`Partition`] is the named, cluster-list form handed to
//! the evaluator and frozen into results.

use core::fmt;

use crate::error::BlockError;
use crate::network::Actorset;

// ─── Cluster ────────────────────────────────────────────────────────────────

/// Named, duplicate-free set of actor indices, kept sorted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cluster {
    name: String,
    members: Vec<usize>,
}

impl Cluster {
    /// Empty cluster.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), members: Vec::new() }
    }

    /// Cluster holding `members` (duplicates dropped).
    pub fn with_members(name: impl Into<String>, members: &[usize]) -> Self {
        let mut cluster = Self::new(name);
        for &m in members {
            cluster.insert(m);
        }
        cluster
    }

    /// Cluster name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the cluster.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Sorted member indices.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Add an actor; returns false if it was already a member.
    pub fn insert(&mut self, actor: usize) -> bool {
        match self.members.binary_search(&actor) {
            Ok(_) => false,
            Err(pos) => {
                self.members.insert(pos, actor);
                true
            }
        }
    }

    /// Remove an actor; returns false if it was not a member.
    pub fn remove(&mut self, actor: usize) -> bool {
        match self.members.binary_search(&actor) {
            Ok(pos) => {
                self.members.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Membership test.
    pub fn contains(&self, actor: usize) -> bool {
        self.members.binary_search(&actor).is_ok()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ─── Partition ──────────────────────────────────────────────────────────────

/// Ordered list of clusters, one per image position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    clusters: Vec<Cluster>,
}

impl Partition {
    /// Partition from explicit clusters.
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    /// Partition from an assignment vector (`assignment[actor] = position`),
    /// naming clusters after `names`.
    pub fn from_assignment<S: AsRef<str>>(assignment: &[usize], names: &[S]) -> Result<Self, BlockError> {
        let mut clusters: Vec<Cluster> = names.iter().map(|n| Cluster::new(n.as_ref())).collect();
        for (actor, &pos) in assignment.iter().enumerate() {
            let cluster = clusters.get_mut(pos).ok_or_else(|| BlockError::InvalidPartition {
                message: format!("actor {} assigned to position {} of {}", actor, pos, names.len()),
            })?;
            cluster.insert(actor);
        }
        Ok(Self { clusters })
    }

    /// Clusters in position order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True when there are no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Total number of assigned actors.
    pub fn actor_count(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    /// Cluster index holding `actor`.
    pub fn position_of(&self, actor: usize) -> Option<usize> {
        self.clusters.iter().position(|c| c.contains(actor))
    }

    /// Move `actor` into cluster `to`.
    pub fn move_actor(&mut self, actor: usize, to: usize) -> Result<(), BlockError> {
        if to >= self.clusters.len() {
            return Err(BlockError::InvalidPartition {
                message: format!("no cluster {}", to),
            });
        }
        for cluster in &mut self.clusters {
            cluster.remove(actor);
        }
        self.clusters[to].insert(actor);
        Ok(())
    }

    /// Assignment vector over `actor_count` actors.
    ///
    /// Fails unless every actor belongs to exactly one cluster.
    pub fn assignment(&self, actor_count: usize) -> Result<Vec<usize>, BlockError> {
        let mut assignment = vec![usize::MAX; actor_count];
        for (pos, cluster) in self.clusters.iter().enumerate() {
            for &actor in cluster.members() {
                let slot = assignment.get_mut(actor).ok_or_else(|| BlockError::InvalidPartition {
                    message: format!("actor {} outside actor set of {}", actor, actor_count),
                })?;
                if *slot != usize::MAX {
                    return Err(BlockError::InvalidPartition {
                        message: format!("actor {} appears in more than one cluster", actor),
                    });
                }
                *slot = pos;
            }
        }
        if let Some(actor) = assignment.iter().position(|&p| p == usize::MAX) {
            return Err(BlockError::InvalidPartition {
                message: format!("actor {} is not assigned", actor),
            });
        }
        Ok(assignment)
    }

    /// Check the partition against an actor count and position count.
    pub fn validate(&self, actor_count: usize, positions: usize) -> Result<(), BlockError> {
        if self.clusters.len() != positions {
            return Err(BlockError::InvalidPartition {
                message: format!("{} clusters for {} positions", self.clusters.len(), positions),
            });
        }
        self.assignment(actor_count).map(|_| ())
    }

    /// Actor indices in cluster order; the row order of a permuted matrix.
    pub fn actor_order(&self) -> Vec<usize> {
        self.clusters.iter().flat_map(|c| c.members().iter().copied()).collect()
    }

    /// Human-readable listing with actor labels.
    pub fn describe(&self, actors: &Actorset) -> String {
        let mut out = String::new();
        for cluster in &self.clusters {
            let labels: Vec<&str> = cluster.members().iter().map(|&a| actors.label(a)).collect();
            out.push_str(&format!("{}: {}\n", cluster.name(), labels.join(", ")));
        }
        out
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .clusters
            .iter()
            .map(|c| {
                let m: Vec<String> = c.members().iter().map(|a| a.to_string()).collect();
                format!("{}={{{}}}", c.name(), m.join(","))
            })
            .collect();
        f.write_str(&parts.join(" "))
    }
}

// ─── Signature ──────────────────────────────────────────────────────────────

/// Canonical signature of an assignment: FNV-1a over the position of each actor.
///
/// Structurally identical assignments hash identically. Relabelling positions
/// changes the signature; interchangeable positions are not collapsed.
pub fn signature(assignment: &[usize]) -> u64 {
    let mut h: u64 = 14_695_981_039_346_656_037;
    for &pos in assignment {
        for byte in (pos as u32).to_le_bytes() {
            h ^= byte as u64;
            h = h.wrapping_mul(1_099_511_628_211);
        }
    }
    h
}

/// Cluster sizes of an assignment over `positions` positions.
pub fn cluster_sizes(assignment: &[usize], positions: usize) -> Vec<usize> {
    let mut sizes = vec![0; positions];
    for &p in assignment {
        if let Some(s) = sizes.get_mut(p) {
            *s += 1;
        }
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_is_duplicate_free_and_sorted() {
        let mut c = Cluster::with_members("A", &[3, 1, 3, 2]);
        assert_eq!(c.members(), &[1, 2, 3]);
        assert!(!c.insert(2));
        assert!(c.remove(1));
        assert!(!c.remove(1));
        assert!(c.contains(3));
    }

    #[test]
    fn assignment_round_trip() {
        let p = Partition::from_assignment(&[1, 0, 1, 0], &["A", "B"]).unwrap();
        assert_eq!(p.clusters()[0].members(), &[1, 3]);
        assert_eq!(p.assignment(4).unwrap(), vec![1, 0, 1, 0]);
        assert!(p.validate(4, 2).is_ok());
        assert!(p.validate(4, 3).is_err());
        assert!(p.validate(5, 2).is_err());
    }

    #[test]
    fn overlapping_clusters_rejected() {
        let p = Partition::new(vec![
            Cluster::with_members("A", &[0, 1]),
            Cluster::with_members("B", &[1, 2]),
        ]);
        assert!(p.assignment(3).is_err());
    }

    #[test]
    fn move_actor_keeps_single_membership() {
        let mut p = Partition::from_assignment(&[0, 0, 1], &["A", "B"]).unwrap();
        p.move_actor(0, 1).unwrap();
        assert_eq!(p.assignment(3).unwrap(), vec![1, 0, 1]);
        assert!(p.move_actor(0, 5).is_err());
    }

    #[test]
    fn signature_distinguishes_relabelled_positions() {
        assert_eq!(signature(&[0, 1, 1]), signature(&[0, 1, 1]));
        assert_ne!(signature(&[0, 1, 1]), signature(&[1, 0, 0]));
    }

    #[test]
    fn sizes_counted() {
        assert_eq!(cluster_sizes(&[0, 2, 2, 0, 2], 3), vec![2, 0, 3]);
    }
}
