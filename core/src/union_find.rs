/// Weighted union-find over piece cell indices. Cluster membership only
/// ever merges; the puzzle is solved when a single root remains.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl UnionFind {
    pub fn new(count: usize) -> Self {
        assert!(count >= 1, "union-find needs at least one element");
        Self {
            parent: (0..count as u32).collect(),
            size: vec![1; count],
        }
    }

    /// Rebuilds from a persisted parent array. Out-of-range entries are
    /// replaced with self-loops so corrupt snapshots degrade to
    /// singletons instead of failing the restore.
    pub fn from_parents(parents: &[u32]) -> Self {
        let count = parents.len();
        let mut uf = UnionFind::new(count);
        for (index, &value) in parents.iter().enumerate() {
            uf.parent[index] = if (value as usize) < count {
                value
            } else {
                index as u32
            };
        }
        uf.size = vec![1; count];
        for index in 0..count {
            let root = uf.find(index);
            if root != index {
                uf.size[root] += 1;
            }
        }
        uf
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] as usize != root {
            root = self.parent[root] as usize;
        }

        let mut current = index;
        while self.parent[current] as usize != current {
            let next = self.parent[current] as usize;
            self.parent[current] = root as u32;
            current = next;
        }

        root
    }

    pub fn union(&mut self, a: usize, b: usize) -> usize {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return root_a;
        }

        if self.size[root_a] < self.size[root_b] {
            self.parent[root_a] = root_b as u32;
            self.size[root_b] += self.size[root_a];
            root_b
        } else {
            self.parent[root_b] = root_a as u32;
            self.size[root_a] += self.size[root_b];
            root_a
        }
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    pub fn size_of(&mut self, index: usize) -> usize {
        let root = self.find(index);
        self.size[root] as usize
    }

    /// Raw parent array for persistence.
    pub fn snapshot(&self) -> Vec<u32> {
        self.parent.clone()
    }
}
