use bit_revwalk::artifacts::objects::blob::Blob;
use bit_revwalk::artifacts::objects::commit::{Author, Commit};
use bit_revwalk::artifacts::objects::entry_mode::{EntryMode, FileMode};
use bit_revwalk::artifacts::objects::tree::Tree;
use bit_revwalk::{MemoryStore, ObjectId, RevCommit, RevWalk};
use rstest::fixture;
use std::collections::{BTreeMap, HashMap};

/// Commit graph built over an in-memory store, addressed by commit name
#[derive(Debug, Default)]
pub struct Graph {
    pub store: MemoryStore,
    commits: HashMap<String, ObjectId>,
    names: HashMap<ObjectId, String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `name` with an empty tree
    pub fn commit(&mut self, name: &str, parents: &[&str], time: i64) -> ObjectId {
        self.commit_with_files(name, parents, time, &[])
    }

    /// Commit `name` whose tree holds exactly `files` (path, content)
    pub fn commit_with_files(
        &mut self,
        name: &str,
        parents: &[&str],
        time: i64,
        files: &[(&str, &str)],
    ) -> ObjectId {
        let tree = self.write_tree(files);
        self.commit_tree(name, parents, time, tree)
    }

    /// Commit `name` pointing at an already written tree
    pub fn commit_tree(&mut self, name: &str, parents: &[&str], time: i64, tree: ObjectId) -> ObjectId {
        let parents = parents.iter().map(|parent| self.id(parent)).collect();
        let author = Author::at_epoch_seconds("A U Thor", "author@example.com", time).unwrap();
        let oid = self
            .store
            .insert(&Commit::new(parents, tree, author, name.to_string()))
            .unwrap();

        self.commits.insert(name.to_string(), oid);
        self.names.insert(oid, name.to_string());
        oid
    }

    pub fn write_tree(&mut self, files: &[(&str, &str)]) -> ObjectId {
        let mut tree = Tree::new();
        let mut directories: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();

        for &(path, content) in files {
            match path.split_once('/') {
                Some((directory, rest)) => directories.entry(directory).or_default().push((rest, content)),
                None => {
                    let blob = self.store.insert(&Blob::from(content)).unwrap();
                    tree.insert(path, blob, EntryMode::File(FileMode::Regular));
                }
            }
        }
        for (directory, children) in directories {
            let subtree = self.write_tree(&children);
            tree.insert(directory, subtree, EntryMode::Directory);
        }

        self.store.insert(&tree).unwrap()
    }

    pub fn id(&self, name: &str) -> ObjectId {
        self.commits[name]
    }

    pub fn name(&self, oid: &ObjectId) -> &str {
        &self.names[oid]
    }

    /// Names of `commits` in order
    pub fn names(&self, walk: &RevWalk<'_>, commits: &[RevCommit]) -> Vec<&str> {
        commits.iter().map(|commit| self.name(&walk.id(*commit))).collect()
    }
}

/// Drain `walk`, returning the produced commit names
pub fn drain<'g>(graph: &'g Graph, walk: &mut RevWalk<'_>) -> Vec<&'g str> {
    let mut names = Vec::new();
    while let Some(commit) = walk.next().unwrap() {
        names.push(graph.name(&walk.id(commit)));
    }
    names
}

/// A → B → C
#[fixture]
pub fn chain() -> Graph {
    let mut graph = Graph::new();
    graph.commit("A", &[], 100);
    graph.commit("B", &["A"], 200);
    graph.commit("C", &["B"], 300);
    graph
}

/// A ← B, A ← C, D merges B and C
#[fixture]
pub fn diamond() -> Graph {
    let mut graph = Graph::new();
    graph.commit("A", &[], 100);
    graph.commit("B", &["A"], 200);
    graph.commit("C", &["A"], 300);
    graph.commit("D", &["B", "C"], 400);
    graph
}
