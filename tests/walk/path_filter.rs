use crate::common::graph::{Graph, drain};
use crate::common::init_tracing;
use bit_revwalk::artifacts::objects::blob::Blob;
use bit_revwalk::{ObjectType, RevSort, RevWalk, TreeFilter};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

/// Four commits where `docs/guide.md` only appears in C
#[fixture]
fn project() -> Graph {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("README", "hello")]);
    graph.commit_with_files("B", &["A"], 200, &[("README", "hello"), ("src/main.rs", "fn main() {}")]);
    graph.commit_with_files(
        "C",
        &["B"],
        300,
        &[("README", "hello"), ("src/main.rs", "fn main() {}"), ("docs/guide.md", "# Guide")],
    );
    graph.commit_with_files(
        "D",
        &["C"],
        400,
        &[("README", "hello again"), ("src/main.rs", "fn main() {}"), ("docs/guide.md", "# Guide")],
    );
    graph
}

/// `b.txt` is added in B and edited in D
#[fixture]
fn edits() -> Graph {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("a.txt", "1")]);
    graph.commit_with_files("B", &["A"], 200, &[("a.txt", "1"), ("b.txt", "1")]);
    graph.commit_with_files("C", &["B"], 300, &[("a.txt", "2"), ("b.txt", "1")]);
    graph.commit_with_files("D", &["C"], 400, &[("a.txt", "2"), ("b.txt", "2")]);
    graph
}

fn walk_paths<'g>(graph: &'g Graph, tip: &str, paths: &[&str], recursive: bool) -> Vec<&'g str> {
    let mut walk = RevWalk::new(&graph.store);
    walk.set_tree_filter(TreeFilter::paths(paths, recursive)).unwrap();
    let tip = walk.lookup_commit(graph.id(tip)).unwrap();
    walk.mark_start(tip).unwrap();
    drain(graph, &mut walk)
}

#[rstest]
#[case::directory(&["docs"], false)]
#[case::directory_recursive(&["docs"], true)]
#[case::file(&["docs/guide.md"], false)]
fn only_the_commit_adding_a_path_is_listed(
    project: Graph,
    #[case] paths: &[&str],
    #[case] recursive: bool,
) {
    init_tracing();

    assert_eq!(walk_paths(&project, "D", paths, recursive), vec!["C"]);
}

#[rstest]
fn filtered_walks_are_repeatable(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let first = walk_paths(&project, "D", &["docs"], false);
    let second = walk_paths(&project, "D", &["docs"], false);
    assert_eq!(first, second);

    let mut walk = RevWalk::new(&project.store);
    walk.set_tree_filter(TreeFilter::paths(["docs"], false))?;
    let tip = walk.lookup_commit(project.id("D"))?;
    walk.mark_start(tip)?;
    assert_eq!(drain(&project, &mut walk), vec!["C"]);

    walk.reset();
    walk.mark_start(tip)?;
    assert_eq!(drain(&project, &mut walk), vec!["C"]);

    Ok(())
}

#[rstest]
fn unmatched_paths_list_nothing(project: Graph) {
    assert_eq!(walk_paths(&project, "D", &["missing"], true), Vec::<&str>::new());
}

#[rstest]
fn root_commit_is_listed_when_it_has_the_path(project: Graph) {
    assert_eq!(walk_paths(&project, "D", &["README"], false), vec!["D", "A"]);
}

#[rstest]
fn parents_skip_commits_that_do_not_touch_the_path(edits: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&edits.store);
    walk.set_tree_filter(TreeFilter::paths(["b.txt"], false))?;
    let tip = walk.lookup_commit(edits.id("D"))?;
    walk.mark_start(tip)?;

    assert_eq!(drain(&edits, &mut walk), vec!["D", "B"]);
    assert_eq!(edits.names(&walk, &walk.parents(tip)), vec!["B"]);

    walk.reset();
    assert_eq!(edits.names(&walk, &walk.parents(tip)), vec!["C"]);

    Ok(())
}

#[rstest]
fn commits_touching_any_listed_path_are_kept(edits: Graph) {
    // B only adds b.txt, which cuts the history above A but keeps A itself
    assert_eq!(walk_paths(&edits, "D", &["a.txt", "b.txt"], false), vec!["D", "C", "B", "A"]);
}

#[test]
fn parent_of_an_adding_commit_is_still_a_boundary() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("x", "1")]);
    graph.commit_with_files("B", &["A"], 200, &[("x", "1"), ("f", "1")]);
    graph.commit_with_files("C", &["B"], 300, &[("x", "1"), ("f", "2")]);

    let mut walk = RevWalk::new(&graph.store);
    walk.set_sort(RevSort::BOUNDARY)?;
    walk.set_tree_filter(TreeFilter::paths(["f"], false))?;
    let tip = walk.lookup_commit(graph.id("C"))?;
    let base = walk.lookup_commit(graph.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(base)?;

    assert_eq!(drain(&graph, &mut walk), vec!["C", "B", "A"]);
    let added = walk.lookup_commit(graph.id("B"))?;
    assert_eq!(graph.names(&walk, &walk.parents(added)), vec!["A"]);

    Ok(())
}

#[test]
fn merge_identical_to_one_parent_follows_only_that_parent() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("f", "1")]);
    graph.commit_with_files("B", &["A"], 200, &[("f", "1"), ("x", "1")]);
    graph.commit_with_files("C", &["A"], 300, &[("f", "2")]);
    graph.commit_with_files("M", &["B", "C"], 400, &[("f", "2"), ("x", "1")]);

    let mut walk = RevWalk::new(&graph.store);
    walk.set_tree_filter(TreeFilter::paths(["f"], false))?;
    let merge = walk.lookup_commit(graph.id("M"))?;
    walk.mark_start(merge)?;

    assert_eq!(drain(&graph, &mut walk), vec!["C", "A"]);
    assert_eq!(graph.names(&walk, &walk.parents(merge)), vec!["C"]);

    walk.reset();
    assert_eq!(graph.names(&walk, &walk.parents(merge)), vec!["B", "C"]);

    Ok(())
}

#[test]
fn merge_matching_only_an_uninteresting_parent_is_dropped() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("f", "1")]);
    graph.commit_with_files("U", &["A"], 200, &[("f", "2")]);
    graph.commit_with_files("I", &["A"], 300, &[("f", "1"), ("y", "1")]);
    graph.commit_with_files("M", &["I", "U"], 400, &[("f", "2"), ("y", "1")]);

    let mut walk = RevWalk::new(&graph.store);
    walk.set_tree_filter(TreeFilter::paths(["f"], false))?;
    let merge = walk.lookup_commit(graph.id("M"))?;
    let excluded = walk.lookup_commit(graph.id("U"))?;
    walk.mark_start(merge)?;
    walk.mark_uninteresting(excluded)?;

    assert_eq!(drain(&graph, &mut walk), Vec::<&str>::new());
    // never handed over to the interesting side
    assert_eq!(graph.names(&walk, &walk.parents(merge)), vec!["I", "U"]);

    walk.reset();
    walk.mark_start(merge)?;
    assert_eq!(drain(&graph, &mut walk), vec!["U", "A"]);
    assert_eq!(graph.names(&walk, &walk.parents(merge)), vec!["U"]);

    Ok(())
}

#[test]
fn merge_adding_a_path_cuts_history_above_that_parent() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("f", "1"), ("g", "1")]);
    graph.commit_with_files("B", &["A"], 200, &[("g", "1")]);
    graph.commit_with_files("C", &["A"], 300, &[("f", "2"), ("g", "1")]);
    graph.commit_with_files("M", &["B", "C"], 400, &[("f", "3"), ("g", "1")]);

    let mut walk = RevWalk::new(&graph.store);
    walk.set_tree_filter(TreeFilter::paths(["f"], false))?;
    let merge = walk.lookup_commit(graph.id("M"))?;
    let deleted = walk.lookup_commit(graph.id("B"))?;
    walk.mark_start(merge)?;

    assert_eq!(drain(&graph, &mut walk), vec!["M", "C", "A"]);
    assert_eq!(walk.parent_count(deleted), 0);
    assert_eq!(graph.names(&walk, &walk.parents(merge)), vec!["C"]);

    walk.reset();
    assert_eq!(graph.names(&walk, &walk.parents(deleted)), vec!["A"]);
    assert_eq!(graph.names(&walk, &walk.parents(merge)), vec!["B", "C"]);

    Ok(())
}

#[rstest]
fn path_filter_combines_with_topo_order(edits: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&edits.store);
    walk.set_sort(RevSort::TOPO | RevSort::REVERSE)?;
    walk.set_tree_filter(TreeFilter::paths(["b.txt"], false))?;
    let tip = walk.lookup_commit(edits.id("D"))?;
    walk.mark_start(tip)?;

    assert_eq!(drain(&edits, &mut walk), vec!["B", "D"]);

    Ok(())
}

#[test]
fn escaped_names_can_be_filtered() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("README", "hello")]);
    let blob = graph.store.insert(&Blob::from("latin-1"))?;
    let readme = graph.store.insert(&Blob::from("hello"))?;
    let mut body = b"100644 README\0".to_vec();
    body.extend_from_slice(readme.as_bytes());
    body.extend_from_slice(b"100644 caf\xe9\0");
    body.extend_from_slice(blob.as_bytes());
    let tree = graph.store.insert_raw(ObjectType::Tree, body);
    graph.commit_tree("B", &["A"], 200, tree);

    assert_eq!(walk_paths(&graph, "B", &["caf\\xe9"], false), vec!["B"]);

    Ok(())
}
