use crate::common::graph::{Graph, chain, diamond, drain};
use bit_revwalk::{RevFilter, RevFlagSet, RevSort, RevWalk, WalkError};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn twenty_six_flags_can_be_allocated(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);

    let flags = (0..26)
        .map(|index| walk.allocate_flag(format!("flag-{index}")))
        .collect::<Result<Vec<_>, _>>()?;
    let overflow = walk.allocate_flag("one-too-many");

    assert!(
        matches!(&overflow, Err(WalkError::FlagsExhausted { name }) if name == "one-too-many"),
        "{overflow:?}"
    );

    let last = flags.into_iter().last().ok_or("no flags")?;
    walk.free_flag(last);
    assert!(walk.allocate_flag("reused").is_ok());

    Ok(())
}

#[rstest]
fn flags_freed_mid_walk_return_on_reset(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let mut flags = Vec::new();
    while let Ok(flag) = walk.allocate_flag("filler") {
        flags.push(flag);
    }
    let tip = walk.lookup_commit(chain.id("C"))?;
    walk.mark_start(tip)?;
    walk.next()?;

    walk.free_flag(flags.remove(0));
    assert!(walk.allocate_flag("too-early").is_err());

    walk.reset();
    assert!(walk.allocate_flag("after-reset").is_ok());

    Ok(())
}

#[rstest]
fn lookups_are_identity_preserving(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let mut other = RevWalk::new(&chain.store);

    let first = walk.lookup_commit(chain.id("B"))?;
    let second = walk.lookup_commit(chain.id("B"))?;
    let parsed = walk.parse_commit(chain.id("B"))?;
    let foreign = other.lookup_commit(chain.id("B"))?;

    assert_eq!(first, second);
    assert_eq!(first, parsed);
    assert_ne!(first, foreign);
    assert_eq!(walk.id(first), other.id(foreign));

    Ok(())
}

#[rstest]
fn reset_clears_walk_state_but_keeps_parsed_commits(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let tip = walk.lookup_commit(chain.id("C"))?;
    let root = walk.lookup_commit(chain.id("A"))?;
    let marked = walk.allocate_flag("marked")?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(root)?;
    drain(&chain, &mut walk);
    walk.add_flag(tip, &marked);

    walk.reset();

    assert!(!walk.is_uninteresting(root));
    assert!(!walk.has_flag(tip, &marked));
    assert!(walk.is_parsed(tip));

    walk.mark_start(tip)?;
    assert_eq!(drain(&chain, &mut walk), vec!["C", "B", "A"]);

    Ok(())
}

#[rstest]
fn retained_flags_survive_reset(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let tip = walk.lookup_commit(chain.id("C"))?;
    let kept = walk.allocate_flag("kept")?;
    let passed = walk.allocate_flag("passed")?;
    let dropped = walk.allocate_flag("dropped")?;
    walk.retain_on_reset(&kept);
    for flag in [&kept, &passed, &dropped] {
        walk.add_flag(tip, flag);
    }

    walk.reset_retain(&RevFlagSet::from_iter([passed.clone()]));

    assert!(walk.has_flag(tip, &kept));
    assert!(walk.has_flag(tip, &passed));
    assert!(!walk.has_flag(tip, &dropped));

    walk.reset();

    assert!(walk.has_flag(tip, &kept));
    assert!(!walk.has_flag(tip, &passed));

    Ok(())
}

#[rstest]
fn carried_flags_reach_the_whole_history(diamond: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&diamond.store);
    let reachable = walk.allocate_flag("reachable")?;
    walk.carry(&reachable);
    let tip = walk.lookup_commit(diamond.id("D"))?;
    walk.add_flag(tip, &reachable);
    walk.mark_start(tip)?;

    let commits = walk.iter().collect::<Result<Vec<_>, _>>()?;

    assert_eq!(commits.len(), 4);
    assert!(commits.iter().all(|&commit| walk.has_flag(commit, &reachable)));

    Ok(())
}

#[rstest]
fn apply_flag_marks_matching_commits(diamond: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&diamond.store);
    let merge = walk.allocate_flag("merge")?;
    let tip = walk.lookup_commit(diamond.id("D"))?;
    walk.mark_start(tip)?;

    let flagged = walk.apply_flag(RevFilter::OnlyMerges, &merge)?;

    assert_eq!(flagged, 1);
    assert!(walk.has_flag(tip, &merge));
    let root = walk.lookup_commit(diamond.id("A"))?;
    assert!(!walk.has_flag(root, &merge));

    let mut set = RevFlagSet::new();
    set.add(merge.clone());
    assert!(walk.has_all(tip, &set));
    assert!(!walk.has_any(root, &set));

    Ok(())
}

#[rstest]
fn configuration_is_frozen_once_the_walk_runs(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let tip = walk.lookup_commit(chain.id("C"))?;
    let root = walk.lookup_commit(chain.id("A"))?;
    walk.mark_start(tip)?;
    walk.next()?;

    assert!(matches!(walk.mark_start(root), Err(WalkError::WalkStarted)));
    assert!(matches!(walk.mark_uninteresting(root), Err(WalkError::WalkStarted)));
    assert!(matches!(walk.set_sort(RevSort::TOPO), Err(WalkError::WalkStarted)));
    assert!(matches!(walk.set_rev_filter(RevFilter::NoMerges), Err(WalkError::WalkStarted)));

    walk.reset();
    walk.set_sort(RevSort::TOPO)?;
    walk.mark_start(root)?;
    assert_eq!(drain(&chain, &mut walk), vec!["A"]);

    Ok(())
}

#[rstest]
fn dispose_forgets_every_object(chain: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(&chain.store);
    let before = walk.lookup_commit(chain.id("C"))?;

    walk.dispose();
    let after = walk.lookup_commit(chain.id("C"))?;

    assert_ne!(before, after);
    assert!(!walk.is_parsed(after));

    Ok(())
}

#[rstest]
#[should_panic(expected = "did not create it")]
fn handles_from_another_walk_are_rejected(chain: Graph) {
    let mut walk = RevWalk::new(&chain.store);
    let mut other = RevWalk::new(&chain.store);
    let foreign = other.lookup_commit(chain.id("C")).unwrap();

    let _ = walk.mark_start(foreign);
}

#[rstest]
#[should_panic(expected = "allocated by another walk")]
fn flags_from_another_walk_are_rejected(chain: Graph) {
    let mut walk = RevWalk::new(&chain.store);
    let mut other = RevWalk::new(&chain.store);
    let flag = other.allocate_flag("foreign").unwrap();
    let tip = walk.lookup_commit(chain.id("C")).unwrap();

    walk.add_flag(tip, &flag);
}
