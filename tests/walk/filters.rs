use crate::common::graph::{Graph, chain, diamond, drain};
use bit_revwalk::{RevFilter, RevWalk, WalkConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn walk_with<'g>(graph: &'g Graph, tip: &str, filter: RevFilter) -> Vec<&'g str> {
    let mut walk = RevWalk::new(&graph.store);
    walk.set_rev_filter(filter).unwrap();
    let tip = walk.lookup_commit(graph.id(tip)).unwrap();
    walk.mark_start(tip).unwrap();
    drain(graph, &mut walk)
}

#[rstest]
#[case::max_count(RevFilter::max_count(2), vec!["C", "B"])]
#[case::max_count_zero(RevFilter::max_count(0), vec![])]
#[case::after(RevFilter::CommitTimeAfter(200), vec!["C", "B"])]
#[case::before(RevFilter::CommitTimeBefore(200), vec!["B", "A"])]
#[case::between(
    RevFilter::CommitTimeAfter(150).and(RevFilter::CommitTimeBefore(250)),
    vec!["B"]
)]
#[case::negated(RevFilter::CommitTimeBefore(100).negate(), vec!["C", "B"])]
fn filters_on_a_chain(chain: Graph, #[case] filter: RevFilter, #[case] expected: Vec<&str>) {
    assert_eq!(walk_with(&chain, "C", filter), expected);
}

#[rstest]
#[case::no_merges(RevFilter::NoMerges, vec!["C", "B", "A"])]
#[case::only_merges(RevFilter::OnlyMerges, vec!["D"])]
#[case::either(RevFilter::OnlyMerges.or(RevFilter::CommitTimeBefore(100)), vec!["D", "A"])]
fn filters_on_a_diamond(diamond: Graph, #[case] filter: RevFilter, #[case] expected: Vec<&str>) {
    assert_eq!(walk_with(&diamond, "D", filter), expected);
}

#[rstest]
fn max_count_restarts_after_reset(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    walk.set_rev_filter(RevFilter::max_count(1))?;
    let tip = walk.lookup_commit(chain.id("C"))?;

    walk.mark_start(tip)?;
    assert_eq!(drain(&chain, &mut walk), vec!["C"]);

    walk.reset();
    walk.mark_start(tip)?;
    assert_eq!(drain(&chain, &mut walk), vec!["C"]);

    Ok(())
}

#[rstest]
fn custom_filters_see_the_commit_body(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::with_config(&chain.store, WalkConfig::default().with_retain_body(false));
    walk.set_rev_filter(RevFilter::custom(|commit| {
        commit.body.is_some_and(|body| body.ends_with(b"\n\nB"))
    }))?;
    let tip = walk.lookup_commit(chain.id("C"))?;
    walk.mark_start(tip)?;

    assert_eq!(drain(&chain, &mut walk), vec!["B"]);

    let body = walk.raw_body(tip)?;
    assert!(body.starts_with(b"tree "));

    Ok(())
}
