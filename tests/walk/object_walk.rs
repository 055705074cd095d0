use crate::common::graph::Graph;
use crate::common::init_tracing;
use bit_revwalk::artifacts::objects::blob::Blob;
use bit_revwalk::artifacts::objects::commit::Author;
use bit_revwalk::artifacts::objects::entry_mode::{EntryMode, FileMode};
use bit_revwalk::artifacts::objects::object::Object;
use bit_revwalk::artifacts::objects::tag::Tag;
use bit_revwalk::artifacts::objects::tree::Tree;
use bit_revwalk::{ObjectId, ObjectType, ObjectWalk, RevSort, WalkError};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

/// B edits `src/main.rs`; README is shared by both commits
#[fixture]
fn project() -> Graph {
    let mut graph = Graph::new();
    graph.commit_with_files("A", &[], 100, &[("README", "readme"), ("src/main.rs", "v1")]);
    graph.commit_with_files("B", &["A"], 200, &[("README", "readme"), ("src/main.rs", "v2")]);
    graph
}

/// Every object after the commits, as (type, path)
fn objects(walk: &mut ObjectWalk<'_>) -> Result<Vec<(ObjectType, Option<String>)>, WalkError> {
    let mut objects = Vec::new();
    while let Some(object) = walk.next_object()? {
        let path = walk.path_of_current().map(str::to_string);
        objects.push((walk.walk().object_type(object), path));
    }
    Ok(objects)
}

fn commits<'g>(graph: &'g Graph, walk: &mut ObjectWalk<'_>) -> Result<Vec<&'g str>, WalkError> {
    let mut names = Vec::new();
    while let Some(commit) = walk.next()? {
        names.push(graph.name(&walk.walk().id(commit)));
    }
    Ok(names)
}

#[rstest]
fn every_reachable_object_is_listed_once(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut walk = ObjectWalk::new(&project.store);
    let tip = walk.walk_mut().lookup_commit(project.id("B"))?;
    walk.mark_start(tip)?;

    assert_eq!(commits(&project, &mut walk)?, vec!["B", "A"]);
    assert_eq!(
        objects(&mut walk)?,
        vec![
            (ObjectType::Tree, None),
            (ObjectType::Blob, Some("README".to_string())),
            (ObjectType::Tree, Some("src".to_string())),
            (ObjectType::Blob, Some("src/main.rs".to_string())),
            (ObjectType::Tree, None),
            (ObjectType::Tree, Some("src".to_string())),
            (ObjectType::Blob, Some("src/main.rs".to_string())),
        ]
    );

    Ok(())
}

#[rstest]
fn objects_of_uninteresting_commits_are_skipped(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = ObjectWalk::new(&project.store);
    let tip = walk.walk_mut().lookup_commit(project.id("B"))?;
    let base = walk.walk_mut().lookup_commit(project.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(base)?;

    assert_eq!(commits(&project, &mut walk)?, vec!["B"]);
    assert_eq!(
        objects(&mut walk)?,
        vec![
            (ObjectType::Tree, None),
            (ObjectType::Tree, Some("src".to_string())),
            (ObjectType::Blob, Some("src/main.rs".to_string())),
        ]
    );

    Ok(())
}

#[rstest]
fn boundary_commits_are_reported_when_asked(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = ObjectWalk::new(&project.store);
    walk.walk_mut().set_sort(RevSort::BOUNDARY)?;
    let tip = walk.walk_mut().lookup_commit(project.id("B"))?;
    let base = walk.walk_mut().lookup_commit(project.id("A"))?;
    walk.mark_start(tip)?;
    walk.mark_uninteresting(base)?;

    assert_eq!(commits(&project, &mut walk)?, vec!["B", "A"]);
    assert_eq!(objects(&mut walk)?.len(), 3);

    Ok(())
}

#[rstest]
fn connectivity_check_passes_on_a_complete_store(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = ObjectWalk::new(&project.store);
    let tip = walk.walk_mut().lookup_commit(project.id("B"))?;
    walk.mark_start(tip)?;

    walk.check_connectivity()?;

    Ok(())
}

#[rstest]
fn connectivity_check_reports_a_missing_blob(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let lost = Blob::from("v1").object_id()?;
    let mut store = project.store.clone();
    store.remove(&lost);

    let mut walk = ObjectWalk::new(&store);
    let tip = walk.walk_mut().lookup_commit(project.id("B"))?;
    walk.mark_start(tip)?;

    let result = walk.check_connectivity();

    assert!(
        matches!(
            &result,
            Err(WalkError::MissingObject { oid, expected: Some(ObjectType::Blob) }) if *oid == lost
        ),
        "{result:?}"
    );

    Ok(())
}

#[test]
fn gitlinks_are_not_followed() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    let readme = graph.store.insert(&Blob::from("readme"))?;
    let tree = Tree::new()
        .with_entry("README", readme, EntryMode::File(FileMode::Regular))
        .with_entry("vendor", ObjectId::from_raw([7; 20]), EntryMode::Gitlink);
    let tree = graph.store.insert(&tree)?;
    graph.commit_tree("A", &[], 100, tree);

    let mut walk = ObjectWalk::new(&graph.store);
    let tip = walk.walk_mut().lookup_commit(graph.id("A"))?;
    walk.mark_start(tip)?;
    walk.check_connectivity()?;

    walk.reset();
    walk.mark_start(tip)?;
    commits(&graph, &mut walk)?;
    assert_eq!(
        objects(&mut walk)?,
        vec![
            (ObjectType::Tree, None),
            (ObjectType::Blob, Some("README".to_string())),
        ]
    );

    Ok(())
}

#[rstest]
fn annotated_tags_are_listed_and_followed(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = project;
    let tagger = Author::at_epoch_seconds("A U Thor", "author@example.com", 300)?;
    let tag = Tag::new(graph.id("A"), ObjectType::Commit, "v1.0".to_string(), Some(tagger), "release".to_string());
    let tag = graph.store.insert(&tag)?;

    let mut walk = ObjectWalk::new(&graph.store);
    let tag = walk.walk_mut().parse_tag(tag)?;
    walk.mark_start(tag)?;

    assert_eq!(walk.walk().tag_name(tag), Some("v1.0"));
    assert_eq!(commits(&graph, &mut walk)?, vec!["A"]);
    let first = walk.next_object()?.ok_or("no objects")?;
    assert_eq!(first, tag.as_object());
    assert_eq!(objects(&mut walk)?.len(), 4);

    Ok(())
}

#[rstest]
fn uninteresting_trees_hide_their_contents(project: Graph) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = ObjectWalk::new(&project.store);
    let tip = walk.walk_mut().lookup_commit(project.id("B"))?;
    let base = walk.walk_mut().parse_commit(project.id("A"))?;
    let base_tree = walk.walk().tree(base).ok_or("commit without tree")?;
    walk.mark_start(tip)?;
    walk.mark_tree_uninteresting(base_tree)?;

    assert_eq!(commits(&project, &mut walk)?, vec!["B", "A"]);
    let listed = objects(&mut walk)?;

    assert_eq!(listed.len(), 3);
    assert!(!listed.contains(&(ObjectType::Blob, Some("README".to_string()))));

    Ok(())
}

#[test]
fn entry_names_outside_utf8_are_walked() -> Result<(), Box<dyn std::error::Error>> {
    let mut graph = Graph::new();
    let blob = graph.store.insert(&Blob::from("latin-1"))?;
    let mut body = b"100644 caf\xe9\0".to_vec();
    body.extend_from_slice(blob.as_bytes());
    let tree = graph.store.insert_raw(ObjectType::Tree, body);
    graph.commit_tree("A", &[], 100, tree);

    let mut walk = ObjectWalk::new(&graph.store);
    let tip = walk.walk_mut().lookup_commit(graph.id("A"))?;
    walk.mark_start(tip)?;
    walk.check_connectivity()?;

    walk.reset();
    walk.mark_start(tip)?;
    commits(&graph, &mut walk)?;
    assert_eq!(
        objects(&mut walk)?,
        vec![
            (ObjectType::Tree, None),
            (ObjectType::Blob, Some("caf\\xe9".to_string())),
        ]
    );

    Ok(())
}
