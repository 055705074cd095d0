use crate::common::graph::{Graph, chain, diamond, drain};
use crate::common::init_tracing;
use bit_revwalk::{RevSort, RevWalk};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn history_of_an_uninteresting_commit_is_excluded(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut walk = RevWalk::new(&chain.store);
    let tip = walk.lookup_commit(chain.id("C"))?;
    let root = walk.lookup_commit(chain.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(root)?;

    assert_eq!(drain(&chain, &mut walk), vec!["C", "B"]);
    assert!(walk.is_uninteresting(root));
    assert!(!walk.is_uninteresting(tip));

    Ok(())
}

#[rstest]
fn uninteresting_tip_hides_everything(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let tip = walk.lookup_commit(chain.id("C"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(tip)?;

    assert_eq!(drain(&chain, &mut walk), Vec::<&str>::new());

    Ok(())
}

#[test]
fn walk_stops_before_parsing_deep_uninteresting_history() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    graph.commit("Y", &[], 10);
    graph.commit("Z", &["Y"], 50);
    graph.commit("A", &["Z"], 100);
    graph.commit("B", &["A"], 200);
    graph.commit("C", &["B"], 300);

    let mut walk = RevWalk::new(&graph.store);
    let tip = walk.lookup_commit(graph.id("C"))?;
    let excluded = walk.lookup_commit(graph.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(excluded)?;

    assert_eq!(drain(&graph, &mut walk), vec!["C", "B"]);
    let deep = walk.lookup_commit(graph.id("Y"))?;
    assert!(!walk.is_parsed(deep));

    Ok(())
}

#[test]
fn late_uninteresting_marks_are_applied_to_buffered_commits() -> Result<(), Box<dyn std::error::Error>> {
    // S is dated after V, so it is produced before the mark reaches it
    let mut graph = Graph::new();
    graph.commit("R", &[], 50);
    graph.commit("S", &["R"], 300);
    graph.commit("T", &["S"], 400);
    graph.commit("V", &["S"], 120);
    graph.commit("U", &["V"], 150);

    let mut walk = RevWalk::new(&graph.store);
    let tip = walk.lookup_commit(graph.id("T"))?;
    let excluded = walk.lookup_commit(graph.id("U"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(excluded)?;

    assert_eq!(drain(&graph, &mut walk), vec!["T"]);
    let shared = walk.lookup_commit(graph.id("S"))?;
    assert!(walk.is_uninteresting(shared));

    Ok(())
}

#[rstest]
fn boundary_appends_uninteresting_parents(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    walk.set_sort(RevSort::BOUNDARY)?;
    let tip = walk.lookup_commit(chain.id("C"))?;
    let root = walk.lookup_commit(chain.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(root)?;

    assert_eq!(drain(&chain, &mut walk), vec!["C", "B", "A"]);
    assert!(walk.is_uninteresting(root));

    Ok(())
}

#[rstest]
fn boundary_commits_are_reported_once(diamond: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&diamond.store);
    walk.set_sort(RevSort::BOUNDARY)?;
    let tip = walk.lookup_commit(diamond.id("D"))?;
    let root = walk.lookup_commit(diamond.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(root)?;

    assert_eq!(drain(&diamond, &mut walk), vec!["D", "C", "B", "A"]);

    Ok(())
}

#[rstest]
fn uninteresting_side_branch_keeps_the_other_side(diamond: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&diamond.store);
    let tip = walk.lookup_commit(diamond.id("D"))?;
    let side = walk.lookup_commit(diamond.id("B"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(side)?;

    assert_eq!(drain(&diamond, &mut walk), vec!["D", "C"]);

    Ok(())
}
