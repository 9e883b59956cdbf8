//! Reply thread composition.
//!
//! # Responsibility
//! - Assemble the full reply forest of one question for display layers.
//!
//! # Invariants
//! - Every reply appears at most once in the forest.
//! - Roots are top-level replies and replies whose parent is not part of
//!   the same question.
//! - Siblings keep ascending reply id order.
//! - Replies caught in a parent cycle cannot be reached from a root and are
//!   left out, counted in `ReplyThread::dropped`.
//! - Building, sizing, walking and dropping never recurse, so thread depth
//!   is bounded by memory only.

use crate::model::question::Question;
use crate::model::reply::{Reply, ReplyId};
use crate::repo::reply_repo::ReplyRepository;
use crate::repo::RepoResult;
use log::warn;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};

/// One reply with its nested answers.
pub struct ReplyNode {
    pub reply: Reply,
    pub children: Vec<ReplyNode>,
}

impl ReplyNode {
    /// Number of replies in this subtree, including this one.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl Debug for ReplyNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyNode")
            .field("reply", &self.reply)
            .field("subtree_size", &self.size())
            .finish_non_exhaustive()
    }
}

impl Drop for ReplyNode {
    fn drop(&mut self) {
        // Flatten the subtree so each node is dropped with no children left.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Reply forest of one question.
#[derive(Debug, Default)]
pub struct ReplyThread {
    pub roots: Vec<ReplyNode>,
    /// Replies left out because no root reaches them.
    pub dropped: usize,
}

impl ReplyThread {
    /// Number of replies placed in the forest.
    pub fn len(&self) -> usize {
        self.roots.iter().map(ReplyNode::size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Use-case service that builds reply threads on top of a reply repository.
pub struct ThreadService<R: ReplyRepository> {
    repo: R,
}

impl<R: ReplyRepository> ThreadService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads every reply of `question` and nests them by `parent_id`.
    ///
    /// An unsaved question has no thread and yields an empty forest.
    pub fn thread_for_question(&self, question: &Question) -> RepoResult<ReplyThread> {
        let Some(question_id) = question.id else {
            return Ok(ReplyThread::default());
        };

        let replies = self.repo.find_by_question_id(question_id)?;
        let thread = build_thread(replies);
        if thread.dropped > 0 {
            warn!(
                "event=thread_build module=service status=partial question_id={question_id} dropped_replies={}",
                thread.dropped
            );
        }

        Ok(thread)
    }
}

/// Walks a forest depth-first, pairing each reply with its nesting depth.
pub fn depth_first(forest: &[ReplyNode]) -> Vec<(usize, &Reply)> {
    let mut ordered = Vec::new();
    let mut stack: Vec<(usize, &ReplyNode)> = forest.iter().rev().map(|node| (0, node)).collect();

    while let Some((depth, node)) = stack.pop() {
        ordered.push((depth, &node.reply));
        stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
    }

    ordered
}

fn build_thread(replies: Vec<Reply>) -> ReplyThread {
    let total = replies.len();
    let known: HashSet<ReplyId> = replies.iter().filter_map(|reply| reply.id).collect();
    let mut children_of: HashMap<ReplyId, Vec<Reply>> = HashMap::new();
    let mut root_replies = Vec::new();

    for reply in replies {
        match reply.parent_id {
            Some(parent_id) if known.contains(&parent_id) => {
                children_of.entry(parent_id).or_default().push(reply);
            }
            _ => root_replies.push(reply),
        }
    }

    let mut placed = 0;
    let roots = root_replies
        .into_iter()
        .map(|root| build_tree(root, &mut children_of, &mut placed))
        .collect();

    ReplyThread {
        roots,
        dropped: total - placed,
    }
}

/// Partially built node: children still to visit and children already built.
struct Frame {
    reply: Reply,
    pending: std::vec::IntoIter<Reply>,
    built: Vec<ReplyNode>,
}

impl Frame {
    fn open(reply: Reply, children_of: &mut HashMap<ReplyId, Vec<Reply>>) -> Self {
        // Removing the bucket guarantees each child list is consumed once.
        let pending = reply
            .id
            .and_then(|id| children_of.remove(&id))
            .unwrap_or_default()
            .into_iter();
        Self {
            reply,
            pending,
            built: Vec::new(),
        }
    }

    fn close(self) -> ReplyNode {
        ReplyNode {
            reply: self.reply,
            children: self.built,
        }
    }
}

fn build_tree(
    root: Reply,
    children_of: &mut HashMap<ReplyId, Vec<Reply>>,
    placed: &mut usize,
) -> ReplyNode {
    let mut ancestors: Vec<Frame> = Vec::new();
    let mut current = Frame::open(root, children_of);

    loop {
        if let Some(child) = current.pending.next() {
            let child_frame = Frame::open(child, children_of);
            ancestors.push(std::mem::replace(&mut current, child_frame));
            continue;
        }

        *placed += 1;
        let node = current.close();
        match ancestors.pop() {
            Some(mut parent) => {
                parent.built.push(node);
                current = parent;
            }
            None => return node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_thread, depth_first};
    use crate::model::reply::Reply;

    fn reply(id: i64, parent_id: Option<i64>) -> Reply {
        Reply {
            id: Some(id),
            question_id: 1,
            parent_id,
            replier_id: 1,
            body: format!("reply {id}"),
        }
    }

    #[test]
    fn nests_children_under_parents() {
        let thread = build_thread(vec![
            reply(1, None),
            reply(2, Some(1)),
            reply(3, Some(1)),
            reply(4, Some(2)),
        ]);

        assert_eq!(thread.roots.len(), 1);
        assert_eq!(thread.roots[0].size(), 4);
        assert_eq!(thread.dropped, 0);
        let ids: Vec<(usize, Option<i64>)> = depth_first(&thread.roots)
            .into_iter()
            .map(|(depth, reply)| (depth, reply.id))
            .collect();
        assert_eq!(
            ids,
            vec![(0, Some(1)), (1, Some(2)), (2, Some(4)), (1, Some(3))]
        );
    }

    #[test]
    fn dangling_parent_becomes_root() {
        let thread = build_thread(vec![reply(5, Some(99)), reply(6, None)]);
        let roots: Vec<Option<i64>> = thread.roots.iter().map(|node| node.reply.id).collect();
        assert_eq!(roots, vec![Some(5), Some(6)]);
        assert_eq!(thread.dropped, 0);
    }

    #[test]
    fn cyclic_replies_are_dropped_and_counted() {
        let thread = build_thread(vec![
            reply(1, None),
            reply(2, Some(3)),
            reply(3, Some(2)),
            reply(4, Some(4)),
        ]);

        assert_eq!(thread.roots.len(), 1);
        assert_eq!(thread.roots[0].size(), 1);
        assert_eq!(thread.dropped, 3);
    }

    #[test]
    fn deep_reply_chain_builds_walks_and_drops() {
        const DEPTH: i64 = 100_000;
        let chain: Vec<Reply> = (1..=DEPTH)
            .map(|id| reply(id, (id > 1).then(|| id - 1)))
            .collect();

        let thread = build_thread(chain);

        assert_eq!(thread.roots.len(), 1);
        assert_eq!(thread.dropped, 0);
        assert_eq!(thread.len(), DEPTH as usize);
        let walk = depth_first(&thread.roots);
        assert_eq!(walk.len(), DEPTH as usize);
        assert_eq!(walk.last().map(|(depth, _)| *depth), Some(DEPTH as usize - 1));
        drop(walk);
        drop(thread);
    }
}
