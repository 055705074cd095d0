use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Set of repository paths a history query is restricted to
///
/// Paths are `/`-separated and relative to the root tree. A path selects
/// itself, everything below it, and every directory leading to it.
#[derive(Debug, Clone)]
pub struct PathFilter {
    path_trie: Trie<String>,
}

impl PathFilter {
    /// Filter that selects every path
    pub fn all() -> Self {
        Self {
            path_trie: Trie::with_matching(true),
        }
    }

    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut trie = Trie::new();
        for path in paths {
            let components = path
                .as_ref()
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>();
            trie.insert(&components);
        }

        Self { path_trie: trie }
    }

    pub fn scope(&self) -> PathScope<'_> {
        PathScope::at(&self.path_trie)
    }

    /// Whether a full path is selected, directly or through a parent
    pub fn matches(&self, path: &str) -> bool {
        let mut scope = self.scope();
        for part in path.split('/').filter(|part| !part.is_empty()) {
            if !scope.includes(part) {
                return false;
            }
            scope = scope.descend(part);
        }
        scope.is_matched()
    }
}

/// Position of a tree walk relative to a [`PathFilter`]
#[derive(Debug, Clone, Copy)]
pub enum PathScope<'f> {
    /// Inside a selected path; everything below is selected
    Matched,
    /// Above the selected paths
    Within(&'f Trie<String>),
    /// Outside every selected path
    Excluded,
}

impl<'f> PathScope<'f> {
    fn at(node: &'f Trie<String>) -> Self {
        if node.is_matching {
            PathScope::Matched
        } else {
            PathScope::Within(node)
        }
    }

    /// Whether an entry of the current directory is selected or leads to a
    /// selected path
    pub fn includes(&self, name: &str) -> bool {
        match self {
            PathScope::Matched => true,
            PathScope::Within(node) => node.contains_single(name),
            PathScope::Excluded => false,
        }
    }

    pub fn descend(&self, name: &str) -> PathScope<'f> {
        match self {
            PathScope::Matched => PathScope::Matched,
            PathScope::Within(node) => node.child(name).map_or(PathScope::Excluded, PathScope::at),
            PathScope::Excluded => PathScope::Excluded,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, PathScope::Matched)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trie<T: Hash + Eq + Clone> {
    is_matching: bool,
    children: HashMap<T, Trie<T>>,
}

impl<T: Hash + Eq + Clone> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> Trie<T> {
    pub fn new() -> Self {
        Trie {
            is_matching: false,
            children: HashMap::new(),
        }
    }

    pub fn with_matching(is_matching: bool) -> Self {
        Trie {
            is_matching,
            children: HashMap::new(),
        }
    }

    pub fn insert(&mut self, path: &[T]) {
        let mut node = self;
        for part in path {
            node = node.children.entry(part.clone()).or_insert_with(Trie::new);
        }
        node.is_matching = true;
    }

    pub fn contains(&self, path: &[T]) -> bool {
        let mut node = self;
        for part in path {
            match node.children.get(part) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.is_matching
    }

    pub fn contains_single<Q>(&self, path_part: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_matching {
            return true;
        }

        self.children.contains_key(path_part)
    }

    fn child<Q>(&self, path_part: &Q) -> Option<&Trie<T>>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.children.get(path_part)
    }
}

/// Which part of each tree a history query looks at
#[derive(Debug, Clone, Default)]
pub enum TreeFilter {
    /// Every path; no tree comparison is performed
    #[default]
    All,
    /// Only the given paths; `recursive` expands selected directories into
    /// their individual files when comparing
    Paths { filter: PathFilter, recursive: bool },
}

impl TreeFilter {
    pub fn paths<I, P>(paths: I, recursive: bool) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        TreeFilter::Paths {
            filter: PathFilter::new(paths),
            recursive,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, TreeFilter::All)
    }
}
