use crate::artifacts::diff::path_filter::TreeFilter;
use crate::artifacts::walk::config::WalkConfig;
use crate::artifacts::walk::error::WalkError;
use crate::artifacts::walk::filter::RevFilter;
use crate::artifacts::walk::flags::UNINTERESTING;
use crate::artifacts::walk::generator::boundary::BoundaryGenerator;
use crate::artifacts::walk::generator::delay::DelayGenerator;
use crate::artifacts::walk::generator::merge_base::MergeBaseGenerator;
use crate::artifacts::walk::generator::pending::PendingGenerator;
use crate::artifacts::walk::generator::rewrite::{RewriteGenerator, RewriteTreeFilter};
use crate::artifacts::walk::generator::topo::TopoGenerator;
use crate::artifacts::walk::generator::Generator;
use crate::artifacts::walk::pool::ObjectPool;
use crate::artifacts::walk::queue::block::SharedArena;
use crate::artifacts::walk::queue::date::DateQueue;
use crate::artifacts::walk::queue::fifo::FifoQueue;
use crate::artifacts::walk::queue::lifo::LifoQueue;
use crate::artifacts::walk::queue::SlotQueue;
use crate::artifacts::walk::rev_walk::RevSort;

/// Everything the walk was configured with when its first commit is asked for
#[derive(Debug)]
pub(crate) struct Pipeline<'a> {
    pub(crate) sort: RevSort,
    pub(crate) rev_filter: &'a RevFilter,
    pub(crate) tree_filter: &'a TreeFilter,
    pub(crate) config: WalkConfig,
    /// The caller streams objects after commits and needs boundary commits
    pub(crate) objects: bool,
}

/// Build the stage chain for a walk whose start commits sit in `queue`
///
/// The queue is taken over by the innermost stage once the filters are
/// known to be valid.
///
/// Stages that need the complete upstream output (buffering for rewrites,
/// topological sorting, reversal) consume it here.
pub(crate) fn compose(
    pool: &mut ObjectPool<'_>,
    queue: &mut DateQueue,
    arena: &SharedArena,
    pipeline: Pipeline<'_>,
) -> Result<Generator, WalkError> {
    if let RevFilter::MergeBase = pipeline.rev_filter {
        if !pipeline.tree_filter.is_all() {
            return Err(WalkError::UnsupportedFilter(
                "merge base cannot be combined with a tree filter".to_string(),
            ));
        }
        tracing::debug!(stages = ?["merge-base"], "walk pipeline composed");
        let starts = std::mem::take(queue);
        return Ok(Generator::MergeBase(MergeBaseGenerator::new(pool, starts)?));
    }
    if pipeline.rev_filter.contains_merge_base() {
        return Err(WalkError::UnsupportedFilter(
            "merge base cannot be nested in another filter".to_string(),
        ));
    }

    let sort = pipeline.sort;
    let uninteresting = queue.anybody_has_flag(pool, UNINTERESTING);
    let boundary = (sort.contains(RevSort::BOUNDARY) || pipeline.objects) && uninteresting;
    let rewrite = match pipeline.tree_filter {
        TreeFilter::All => None,
        TreeFilter::Paths { filter, recursive } => Some(RewriteTreeFilter::new(filter.clone(), *recursive)),
    };
    let drained = rewrite.is_some() || sort.intersects(RevSort::TOPO | RevSort::REVERSE);

    let mut generator = Generator::Pending(PendingGenerator::new(
        std::mem::take(queue),
        pipeline.rev_filter.clone(),
        rewrite.clone(),
        &pipeline.config,
        !boundary,
    ));
    let mut stages = vec![generator.name()];

    if rewrite.is_some() {
        let buffered = Generator::Buffered(drain_into_fifo(generator, pool, arena)?);
        stages.push(buffered.name());
        generator = Generator::Rewrite(RewriteGenerator::new(buffered));
        stages.push(generator.name());
    }

    if sort.contains(RevSort::TOPO) {
        generator = Generator::Topo(TopoGenerator::new(generator, pool, arena.clone())?);
        stages.push(generator.name());
    }

    if sort.contains(RevSort::REVERSE) {
        generator = Generator::Reversed(drain_into_lifo(generator, pool, arena)?);
        stages.push(generator.name());
    }

    if boundary {
        let duplicate = pool.allocator.allocate("DUPLICATE")?;
        pool.allocator.free_on_reset(duplicate);
        generator = Generator::Boundary(BoundaryGenerator::new(generator, arena.clone(), duplicate));
        stages.push(generator.name());
    } else if uninteresting {
        if !drained {
            generator = Generator::Delay(DelayGenerator::new(
                generator,
                arena.clone(),
                pipeline.config.delay_window,
            ));
            stages.push(generator.name());
        }
        generator = Generator::FixUninteresting(Box::new(generator));
        stages.push(generator.name());
    }

    tracing::debug!(?stages, "walk pipeline composed");
    Ok(generator)
}

fn drain_into_fifo(
    mut source: Generator,
    pool: &mut ObjectPool<'_>,
    arena: &SharedArena,
) -> Result<FifoQueue, WalkError> {
    let mut queue = FifoQueue::new(arena.clone());
    while let Some(commit) = source.next(pool)? {
        queue.add(commit);
    }
    Ok(queue)
}

fn drain_into_lifo(
    mut source: Generator,
    pool: &mut ObjectPool<'_>,
    arena: &SharedArena,
) -> Result<LifoQueue, WalkError> {
    let mut queue = LifoQueue::new(arena.clone());
    while let Some(commit) = source.next(pool)? {
        queue.add(commit);
    }
    Ok(queue)
}
