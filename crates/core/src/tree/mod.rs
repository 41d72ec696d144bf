use std::collections::{btree_map::Entry, BTreeMap};

use crate::{Pool, PoolError, Result, Value};

/// Children of a branch, ordered byte-wise by segment.
pub type Children<'a> = BTreeMap<&'a str, Node<'a>>;

/// A position in the key hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Branch(Children<'a>),
    Series(&'a [Value]),
    Single(&'a Value),
}

/// Hierarchy derived from a pool's flat dotted keys. Built fresh for every
/// export and borrowed from the pool it was built from.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct KeyTree<'a> {
    roots: Children<'a>,
}

impl<'a> KeyTree<'a> {
    pub fn build(pool: &'a Pool) -> Result<Self> {
        let mut tree = Self::default();
        for (key, values) in pool.series() {
            tree.insert(key, Node::Series(values))?;
        }
        for (key, value) in pool.singles() {
            tree.insert(key, Node::Single(value))?;
        }
        Ok(tree)
    }

    /// Top-level nodes in ascending segment order.
    pub fn roots(&self) -> &Children<'a> {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Attaches `leaf` at the path spelled by `key`, creating branches on the
    /// way. Fails if a node would have to be both a leaf and a branch.
    pub fn insert(&mut self, key: &'a str, leaf: Node<'a>) -> Result<()> {
        let conflict = |end: usize| PoolError::KeyConflict {
            key: key.to_string(),
            existing: key[..end].to_string(),
        };

        let mut level = &mut self.roots;
        let mut segments = key.split('.').enumerate().peekable();
        let mut end = 0;

        while let Some((depth, segment)) = segments.next() {
            end += segment.len() + usize::from(depth > 0);

            if segments.peek().is_none() {
                return match level.entry(segment) {
                    Entry::Vacant(slot) => {
                        slot.insert(leaf);
                        Ok(())
                    }
                    Entry::Occupied(_) => Err(conflict(end)),
                };
            }

            let node = level
                .entry(segment)
                .or_insert_with(|| Node::Branch(BTreeMap::new()));
            level = match node {
                Node::Branch(children) => children,
                _ => return Err(conflict(end)),
            };
        }

        Err(PoolError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments<'a>(children: &Children<'a>) -> Vec<&'a str> {
        children.keys().copied().collect()
    }

    #[test]
    fn orders_siblings_regardless_of_insertion() {
        let mut pool = Pool::new();
        pool.add("foo", 1).unwrap();
        pool.add("bar", 1).unwrap();
        pool.add("Zed", 1).unwrap();

        let tree = KeyTree::build(&pool).unwrap();
        assert_eq!(segments(tree.roots()), vec!["Zed", "bar", "foo"]);
    }

    #[test]
    fn nests_dotted_keys_at_every_depth() {
        let mut pool = Pool::new();
        pool.add("really.long.something.else", 2009).unwrap();
        pool.add("really.long.key.name", 2008).unwrap();
        pool.add("reals.vec", vec![3.0_f32, 4.0]).unwrap();
        pool.add("reals.matrix", 1).unwrap();

        let tree = KeyTree::build(&pool).unwrap();
        // "really" sorts before "reals": `l` < `s`
        assert_eq!(segments(tree.roots()), vec!["really", "reals"]);

        let Node::Branch(reals) = &tree.roots()["reals"] else {
            panic!("reals should be a branch");
        };
        assert_eq!(segments(reals), vec!["matrix", "vec"]);

        let Node::Branch(really) = &tree.roots()["really"] else {
            panic!("really should be a branch");
        };
        let Node::Branch(long) = &really["long"] else {
            panic!("long should be a branch");
        };
        assert_eq!(segments(long), vec!["key", "something"]);
    }

    #[test]
    fn leaves_carry_values_in_order() {
        let mut pool = Pool::new();
        pool.add("a.b", 1).unwrap();
        pool.add("a.b", 2).unwrap();
        pool.set("a.c", "x").unwrap();

        let tree = KeyTree::build(&pool).unwrap();
        let Node::Branch(a) = &tree.roots()["a"] else {
            panic!("a should be a branch");
        };
        assert_eq!(a["b"], Node::Series(&[Value::Real(1.0), Value::Real(2.0)]));
        assert_eq!(a["c"], Node::Single(&Value::String("x".to_string())));
    }

    #[test]
    fn insert_rejects_leaf_under_leaf() {
        let value = Value::Real(1.0);
        let mut tree = KeyTree::default();
        tree.insert("foo", Node::Single(&value)).unwrap();

        let err = tree.insert("foo.bar", Node::Single(&value)).unwrap_err();
        assert!(matches!(err, PoolError::KeyConflict { ref existing, .. } if existing == "foo"));

        let err = tree.insert("foo", Node::Single(&value)).unwrap_err();
        assert!(matches!(err, PoolError::KeyConflict { .. }));
    }

    #[test]
    fn insert_rejects_leaf_over_branch() {
        let value = Value::Real(1.0);
        let mut tree = KeyTree::default();
        tree.insert("foo.bar", Node::Single(&value)).unwrap();

        assert!(tree.insert("foo", Node::Single(&value)).is_err());
    }

    #[test]
    fn empty_pool_builds_empty_tree() {
        let pool = Pool::new();
        assert!(KeyTree::build(&pool).unwrap().is_empty());
    }
}
