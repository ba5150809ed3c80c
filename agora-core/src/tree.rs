use std::collections::HashMap;

use crate::{
    api::{self, CommentId, Error, Page},
    Comment,
};

/// The reply tree of a post.
///
/// Comments live in an arena, in insertion order, and refer to their replies
/// by arena slot. `index` maps every comment id to its slot. Nothing is ever
/// removed, so slots are stable. No structure here nests, so neither walking
/// nor dropping a tree depends on how deep a thread goes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentTree {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    index: HashMap<CommentId, usize>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Node {
    comment: Comment,

    /// Slots of the replies, in insertion order
    replies: Vec<usize>,
}

impl CommentTree {
    pub fn new() -> CommentTree {
        CommentTree::default()
    }

    /// Total number of comments, at any depth
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level comments, in insertion order
    pub fn roots(&self) -> impl Iterator<Item = &Comment> {
        self.roots.iter().map(|&i| &self.nodes[i].comment)
    }

    pub fn contains(&self, id: &CommentId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        Some(&self.nodes[*self.index.get(id)?].comment)
    }

    pub fn get_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        Some(&mut self.nodes[*self.index.get(id)?].comment)
    }

    /// Direct replies to comment `id`, in insertion order
    pub fn replies(&self, id: &CommentId) -> Result<impl Iterator<Item = &Comment>, Error> {
        let slot = *self.index.get(id).ok_or(Error::CommentNotFound(id.0))?;
        Ok(self.nodes[slot]
            .replies
            .iter()
            .map(|&i| &self.nodes[i].comment))
    }

    /// Returns the parent of comment `id`, which is None for top-level
    /// comments
    pub fn parent_of(&self, id: &CommentId) -> Result<Option<&Comment>, Error> {
        let c = self.get(id).ok_or(Error::CommentNotFound(id.0))?;
        Ok(c.parent_id.and_then(|p| self.get(&p)))
    }

    /// Appends `comment` after the existing top-level comments
    pub fn push_root(&mut self, mut comment: Comment) -> Result<CommentId, Error> {
        self.check_insertable(&comment)?;
        comment.parent_id = None;
        let slot = self.insert(comment);
        self.roots.push(slot);
        Ok(self.nodes[slot].comment.id)
    }

    /// Appends `comment` after the existing replies of `parent`, which may be
    /// at any depth. Leaves the tree untouched if `parent` is not in it.
    pub fn push_reply(
        &mut self,
        parent: &CommentId,
        mut comment: Comment,
    ) -> Result<CommentId, Error> {
        self.check_insertable(&comment)?;
        let parent_slot = *self
            .index
            .get(parent)
            .ok_or(Error::CommentNotFound(parent.0))?;
        comment.parent_id = Some(*parent);
        let slot = self.insert(comment);
        self.nodes[parent_slot].replies.push(slot);
        Ok(self.nodes[slot].comment.id)
    }

    fn check_insertable(&self, comment: &Comment) -> Result<(), Error> {
        if self.index.contains_key(&comment.id) {
            return Err(Error::UuidAlreadyUsed(comment.id.0));
        }
        Ok(())
    }

    fn insert(&mut self, comment: Comment) -> usize {
        let slot = self.nodes.len();
        self.index.insert(comment.id, slot);
        self.nodes.push(Node {
            comment,
            replies: Vec::new(),
        });
        slot
    }

    /// Pre-order traversal, yielding each comment with its depth (0 for
    /// top-level comments)
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst::new(self, &self.roots)
    }

    /// The whole thread, in pre-order
    pub fn to_api(&self) -> Vec<api::Comment> {
        self.thread(&self.roots)
    }

    /// Selects a page of top-level comments, each followed by its whole reply
    /// subtree, in pre-order
    pub fn page(&self, page: &Page, default_limit: usize, max_limit: usize) -> Vec<api::Comment> {
        let (offset, limit) = page.bounds(default_limit, max_limit);
        let start = offset.min(self.roots.len());
        let end = start.saturating_add(limit).min(self.roots.len());
        self.thread(&self.roots[start..end])
    }

    fn thread(&self, starts: &[usize]) -> Vec<api::Comment> {
        let mut walk = DepthFirst::new(self, starts);
        let mut res = Vec::new();
        while let Some((depth, node)) = walk.next_node() {
            res.push(node.comment.to_api(depth, node.replies.len()));
        }
        res
    }
}

pub struct DepthFirst<'a> {
    tree: &'a CommentTree,

    /// (depth, slot) of the nodes left to visit, next one last
    stack: Vec<(usize, usize)>,
}

impl<'a> DepthFirst<'a> {
    fn new(tree: &'a CommentTree, starts: &[usize]) -> DepthFirst<'a> {
        DepthFirst {
            tree,
            stack: starts.iter().rev().map(|&s| (0, s)).collect(),
        }
    }

    fn next_node(&mut self) -> Option<(usize, &'a Node)> {
        let (depth, slot) = self.stack.pop()?;
        let node = &self.tree.nodes[slot];
        self.stack
            .extend(node.replies.iter().rev().map(|&r| (depth + 1, r)));
        Some((depth, node))
    }
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = (usize, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_node().map(|(depth, node)| (depth, &node.comment))
    }
}
