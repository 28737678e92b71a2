//! Node tasks: deferred handles to document nodes.
//!
//! A [`NodeTask`] resolves to a node once that node exists and is attached
//! where it belongs. Tasks are lazy and shared: nothing happens until the
//! first awaiter polls, every awaiter sees the same result, and a task that
//! nobody awaits never touches the tree.

use core::future::Future;

use cssplus_dom::NodeId;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::error::EngineError;

/// A shared, lazily driven handle resolving to a node.
pub type NodeTask = Shared<LocalBoxFuture<'static, Result<NodeId, EngineError>>>;

/// A branch of work that produces no node.
pub type Step = LocalBoxFuture<'static, Result<(), EngineError>>;

/// A task that is already resolved.
#[must_use]
pub fn resolved(node: NodeId) -> NodeTask {
    async move { Ok(node) }.boxed_local().shared()
}

/// Wrap a future as a shared node task.
pub fn from_future<F>(future: F) -> NodeTask
where
    F: Future<Output = Result<NodeId, EngineError>> + 'static,
{
    future.boxed_local().shared()
}

/// Run `f` on the node once `task` resolves, yielding the node `f` returns.
/// Errors from `task` propagate without calling `f`.
pub fn then<F>(task: NodeTask, f: F) -> NodeTask
where
    F: FnOnce(NodeId) -> Result<NodeId, EngineError> + 'static,
{
    from_future(async move {
        let node = task.await?;
        let result = f(node);
        if let Ok(node) = result {
            log::trace!("node task resolved to {node:?}");
        }
        result
    })
}

/// Resolve once every task in `tasks` has, reporting the first failure.
/// All tasks are driven to completion even if one fails.
pub async fn join_tasks(tasks: Vec<NodeTask>) -> Result<(), EngineError> {
    first_error(futures::future::join_all(tasks).await)
}

/// Resolve once every step has, reporting the first failure.
pub async fn join_steps(steps: Vec<Step>) -> Result<(), EngineError> {
    first_error(futures::future::join_all(steps).await)
}

fn first_error<T>(results: Vec<Result<T, EngineError>>) -> Result<(), EngineError> {
    results.into_iter().find_map(Result::err).map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;

    #[test]
    fn test_then_is_lazy_and_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let task = then(resolved(NodeId(3)), move |node| {
            counter.set(counter.get() + 1);
            Ok(NodeId(node.0 + 1))
        });
        assert_eq!(calls.get(), 0);

        let second = task.clone();
        assert_eq!(block_on(task), Ok(NodeId(4)));
        assert_eq!(block_on(second), Ok(NodeId(4)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failure_skips_dependents_but_not_siblings() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let failing = then(resolved(NodeId(1)), |_| Err(EngineError::bug("boom")));
        let dependent = then(failing, Ok);
        let sibling = then(resolved(NodeId(2)), move |node| {
            flag.set(true);
            Ok(node)
        });

        let result = block_on(join_tasks(vec![dependent, sibling]));
        assert_eq!(result, Err(EngineError::bug("boom")));
        assert!(ran.get());
    }
}
