use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;
use thiserror::Error;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::table::Table;
use crate::utils::{pairing3, MyHash};

/// The node table has no free cells left.
///
/// Every allocating operation reports this instead of panicking, so a caller
/// can rebuild the manager with a bigger table and retry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("BDD node table is full (capacity {capacity})")]
pub struct StorageFull {
    pub capacity: usize,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(
            self.variable as u64,
            self.low.unsigned() as u64,
            self.high.unsigned() as u64,
        )
    }
}

type Storage = Table<Node>;

impl Storage {
    fn variable(&self, index: usize) -> u32 {
        self.value(index).variable
    }
    fn low(&self, index: usize) -> Ref {
        self.value(index).low
    }
    fn high(&self, index: usize) -> Ref {
        self.value(index).high
    }
}

/// A manager-centric BDD engine with complement edges.
///
/// All operations go through the manager, which hash-conses nodes and caches
/// ITE results. [`Ref`] handles are plain `Copy` values and stay valid for
/// the lifetime of the manager; garbage collection happens only via an
/// explicit [`collect_garbage`][Bdd::collect_garbage] call.
///
/// Variables are 1-indexed; index 0 is reserved for the terminal.
/// High edges are never negated, which keeps the representation canonical:
/// two functions are equal iff their `Ref`s are equal.
///
/// Allocating operations return `Result`: running out of node-table cells
/// surfaces as [`StorageFull`] rather than a panic.
pub struct Bdd {
    storage: RefCell<Storage>,
    ite_cache: RefCell<Cache<(Ref, Ref, Ref), Ref>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn new(storage_bits: usize) -> Self {
        assert!(
            (1..=31).contains(&storage_bits),
            "Storage bits should be in the range 1..=31"
        );

        let cache_bits = storage_bits.min(16);

        let mut storage = Storage::new(storage_bits);

        // Allocate the terminal node at index 1.
        let one = storage.alloc().expect("no room for the terminal");
        assert_eq!(one, 1);
        let one = Ref::positive(one as u32);
        let zero = -one;

        Self {
            storage: RefCell::new(storage),
            ite_cache: RefCell::new(Cache::new(cache_bits)),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(20)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &storage.capacity())
            .field("num_nodes", &storage.real_size())
            .finish()
    }
}

impl Bdd {
    pub fn variable(&self, index: u32) -> u32 {
        self.storage.borrow().variable(index as usize)
    }
    pub fn low(&self, index: u32) -> Ref {
        self.storage.borrow().low(index as usize)
    }
    pub fn high(&self, index: u32) -> Ref {
        self.storage.borrow().high(index as usize)
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    /// Number of occupied node-table cells.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }
    /// Total node-table capacity.
    pub fn capacity(&self) -> usize {
        self.storage.borrow().capacity()
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Result<Ref, StorageFull> {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Canonicity: the high edge is never negated.
        if high.is_negated() {
            return Ok(-self.mk_node(v, -low, -high)?);
        }

        // Redundant node.
        if low == high {
            return Ok(low);
        }

        let index = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        match index {
            Some(i) => Ok(Ref::positive(i as u32)),
            None => Err(StorageFull {
                capacity: self.capacity(),
            }),
        }
    }

    pub fn mk_var(&self, v: u32) -> Result<Ref, StorageFull> {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero, self.one)
    }

    /// Conjunction of literals, given in DIMACS convention (negative for a
    /// negated variable).
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Result<Ref, StorageFull> {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| v.abs());
        literals.reverse();
        let mut current = self.one;
        for lit in literals {
            assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(-lit as u32, current, self.zero)?
            } else {
                self.mk_node(lit as u32, self.zero, current)?
            };
        }
        Ok(current)
    }

    /// Both cofactors of `node` with respect to `v`, where `v` is at or above
    /// the root of `node`.
    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        if node.is_negated() {
            (-self.low(i), -self.high(i))
        } else {
            (self.low(i), self.high(i))
        }
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Result<Ref, StorageFull> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if self.is_one(f) {
            return Ok(g);
        }
        if self.is_zero(f) {
            return Ok(h);
        }

        // From now on, F is known not to be a constant.
        assert!(!self.is_terminal(f));

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => F
        if g == h {
            return Ok(g);
        }
        if self.is_one(g) && self.is_zero(h) {
            return Ok(f);
        }
        if self.is_zero(g) && self.is_one(h) {
            return Ok(-f);
        }
        if self.is_one(g) && h == -f {
            return Ok(self.one);
        }
        if g == f && self.is_one(h) {
            return Ok(self.one);
        }
        if g == -f && self.is_zero(h) {
            return Ok(self.zero);
        }
        if self.is_zero(g) && h == f {
            return Ok(f);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        assert_ne!(i, 0);

        // Equivalent pairs:
        //   ite(F,1,H) == ite(H,1,F)
        //   ite(F,G,0) == ite(G,F,0)
        //   ite(F,G,1) == ite(~G,~F,1)
        //   ite(F,0,H) == ite(~H,0,~F)
        //   ite(F,G,~G) == ite(G,F,~F)
        // (choose the one with the lowest top variable)
        if self.is_one(g) && k < i {
            return self.apply_ite(h, self.one, f);
        }
        if self.is_zero(h) && j < i {
            return self.apply_ite(g, f, self.zero);
        }
        if self.is_one(h) && j < i {
            return self.apply_ite(-g, -f, self.one);
        }
        if self.is_zero(g) && k < i {
            return self.apply_ite(-h, self.zero, -f);
        }
        if g == -h && j < i {
            return self.apply_ite(g, f, -f);
        }

        // Normalize so that f and g are regular (not negated).
        let (mut f, mut g, mut h) = (f, g, h);

        // ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // ite(F,~G,H) => ~ite(F,G,~H)
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        let (f, g, h) = (f, g, h);

        let key = (f, g, h);
        if let Some(&res) = self.ite_cache.borrow().get(&key) {
            return Ok(if n { -res } else { res });
        }

        // Top variable of the triple.
        let mut m = i;
        if j != 0 {
            m = m.min(j);
        }
        if k != 0 {
            m = m.min(k);
        }
        assert_ne!(m, 0);

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.apply_ite(f0, g0, h0)?;
        let t = self.apply_ite(f1, g1, h1)?;

        let res = self.mk_node(m, e, t)?;
        self.ite_cache.borrow_mut().insert(key, res);

        Ok(if n { -res } else { res })
    }

    fn maybe_constant(&self, node: Ref) -> Option<bool> {
        if self.is_zero(node) {
            Some(false)
        } else if self.is_one(node) {
            Some(true)
        } else {
            None
        }
    }

    /// Determine whether `ITE(f, g, h)` is a constant, without building the
    /// result. Allocates nothing.
    pub fn ite_constant(&self, f: Ref, g: Ref, h: Ref) -> Option<bool> {
        if self.is_one(f) {
            return self.maybe_constant(g);
        }
        if self.is_zero(f) {
            return self.maybe_constant(h);
        }

        assert!(!self.is_terminal(f));

        if g == h {
            return self.maybe_constant(g);
        }
        if (self.is_one(g) && self.is_zero(h)) || (self.is_zero(g) && self.is_one(h)) {
            // The result is f or ~f, not a constant.
            return None;
        }
        if self.is_one(g) && h == -f {
            return Some(true);
        }
        if g == f && self.is_one(h) {
            return Some(true);
        }
        if g == -f && self.is_zero(h) {
            return Some(false);
        }
        if self.is_zero(g) && h == f {
            return None;
        }

        let key = (f, g, h);
        if let Some(&res) = self.ite_cache.borrow().get(&key) {
            return self.maybe_constant(res);
        }

        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        assert_ne!(i, 0);

        let mut m = i;
        if j != 0 {
            m = m.min(j);
        }
        if k != 0 {
            m = m.min(k);
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let t = self.ite_constant(f1, g1, h1)?;
        let e = self.ite_constant(f0, g0, h0)?;
        if t == e {
            Some(t)
        } else {
            None
        }
    }

    /// `f -> g` is a tautology, i.e. the set `f` is a subset of the set `g`.
    pub fn is_implies(&self, f: Ref, g: Ref) -> bool {
        self.ite_constant(f, g, self.one) == Some(true)
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Result<Ref, StorageFull> {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Result<Ref, StorageFull> {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Result<Ref, StorageFull> {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Result<Ref, StorageFull> {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref, StorageFull> {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node)?;
        }
        Ok(res)
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Result<Ref, StorageFull> {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node)?;
        }
        Ok(res)
    }

    /// Restriction `f|v<-b`.
    pub fn substitute(&self, f: Ref, v: u32, b: bool) -> Result<Ref, StorageFull> {
        let mut cache = HashMap::new();
        self.substitute_(f, v, b, &mut cache)
    }

    fn substitute_(
        &self,
        f: Ref,
        v: u32,
        b: bool,
        cache: &mut HashMap<Ref, Ref>,
    ) -> Result<Ref, StorageFull> {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(f) {
            return Ok(f);
        }

        let i = self.variable(f.index());

        if v < i {
            // `f` does not depend on `v`.
            return Ok(f);
        }

        if v == i {
            return Ok(if b {
                self.high_node(f)
            } else {
                self.low_node(f)
            });
        }

        if let Some(&res) = cache.get(&f) {
            return Ok(res);
        }

        let low = self.substitute_(self.low_node(f), v, b, cache)?;
        let high = self.substitute_(self.high_node(f), v, b, cache)?;
        let res = self.mk_node(i, low, high)?;
        cache.insert(f, res);
        Ok(res)
    }

    /// Composition `f|v<-g`.
    pub fn compose(&self, f: Ref, v: u32, g: Ref) -> Result<Ref, StorageFull> {
        let mut cache = Cache::new(16);
        self.compose_(f, v, g, &mut cache)
    }

    fn compose_(
        &self,
        f: Ref,
        v: u32,
        g: Ref,
        cache: &mut Cache<(Ref, Ref), Ref>,
    ) -> Result<Ref, StorageFull> {
        if self.is_terminal(f) {
            return Ok(f);
        }

        let i = self.variable(f.index());
        assert_ne!(i, 0);
        if v < i {
            // `f` does not depend on `v`.
            return Ok(f);
        }

        let key = (f, g);
        if let Some(&res) = cache.get(&key) {
            return Ok(res);
        }

        let res = if v == i {
            let index = f.index();
            let res = self.apply_ite(g, self.high(index), self.low(index))?;
            if f.is_negated() {
                -res
            } else {
                res
            }
        } else {
            let m = if self.is_terminal(g) {
                i
            } else {
                i.min(self.variable(g.index()))
            };
            assert_ne!(m, 0);

            let (f0, f1) = self.top_cofactors(f, m);
            let (g0, g1) = self.top_cofactors(g, m);
            let h0 = self.compose_(f0, v, g0, cache)?;
            let h1 = self.compose_(f1, v, g1, cache)?;

            self.mk_node(m, h0, h1)?
        };
        cache.insert(key, res);
        Ok(res)
    }

    /// Existential quantification `∃ vars. f`.
    pub fn exists(&self, f: Ref, vars: &[u32]) -> Result<Ref, StorageFull> {
        let mut sorted = vars.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut cache = HashMap::new();
        self.exists_(f, &sorted, &mut cache)
    }

    fn exists_(
        &self,
        f: Ref,
        vars: &[u32],
        cache: &mut HashMap<(Ref, usize), Ref>,
    ) -> Result<Ref, StorageFull> {
        if self.is_terminal(f) || vars.is_empty() {
            return Ok(f);
        }

        let v = self.variable(f.index());

        // Variables above the root cannot occur in `f`.
        let skip = vars.iter().take_while(|&&x| x < v).count();
        let vars = &vars[skip..];
        if vars.is_empty() {
            return Ok(f);
        }

        // `vars` is always a suffix of the original sorted list, so its
        // length identifies it.
        let key = (f, vars.len());
        if let Some(&res) = cache.get(&key) {
            return Ok(res);
        }

        let low = self.low_node(f);
        let high = self.high_node(f);

        let res = match vars[0].cmp(&v) {
            Ordering::Equal => {
                let low = self.exists_(low, &vars[1..], cache)?;
                let high = self.exists_(high, &vars[1..], cache)?;
                self.apply_or(low, high)?
            }
            Ordering::Greater => {
                let low = self.exists_(low, vars, cache)?;
                let high = self.exists_(high, vars, cache)?;
                self.mk_node(v, low, high)?
            }
            Ordering::Less => unreachable!(),
        };
        cache.insert(key, res);
        Ok(res)
    }

    /// Variable-to-variable renaming, applied as a sequence of compositions.
    ///
    /// Sound only when no target variable is also a source; the caller is
    /// responsible for keeping the two sets disjoint.
    pub fn rename(&self, f: Ref, map: &[(u32, u32)]) -> Result<Ref, StorageFull> {
        let mut res = f;
        for &(from, to) in map {
            if from == to {
                continue;
            }
            let g = self.mk_var(to)?;
            res = self.compose(res, from, g)?;
        }
        Ok(res)
    }

    /// Table indices of all nodes reachable from `nodes`.
    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes in the diagram rooted at `f`, terminal included.
    pub fn size(&self, f: Ref) -> u64 {
        self.descendants([f]).len() as u64
    }

    /// Drop every node not reachable from `roots` and clear the operation
    /// cache. Handles obtained before the call remain valid only if their
    /// nodes are reachable from `roots`.
    pub fn collect_garbage(&self, roots: &[Ref]) {
        debug!("collect_garbage(roots = {:?})", roots);

        self.ite_cache.borrow_mut().clear();

        let alive = self.descendants(roots.iter().copied());

        let n = self.storage.borrow().num_buckets();
        for i in 0..n {
            let mut index = self.storage.borrow().bucket(i);
            if index == 0 {
                continue;
            }

            // Unlink dead nodes from the head of the chain.
            while index != 0 && !alive.contains(&(index as u32)) {
                let next = self.storage.borrow().next(index);
                self.storage.borrow_mut().drop(index);
                index = next;
            }
            self.storage.borrow_mut().set_bucket(i, index);

            // Then from the middle.
            let mut prev = index;
            while prev != 0 {
                let mut cur = self.storage.borrow().next(prev);
                while cur != 0 && !alive.contains(&(cur as u32)) {
                    let next = self.storage.borrow().next(cur);
                    self.storage.borrow_mut().drop(cur);
                    cur = next;
                }
                if self.storage.borrow().next(prev) != cur {
                    self.storage.borrow_mut().set_next(prev, cur);
                }
                prev = cur;
            }
        }
    }

    pub fn to_bracket_string(&self, node: Ref) -> String {
        if self.is_zero(node) {
            return "(0)".to_string();
        } else if self.is_one(node) {
            return "(1)".to_string();
        }

        let v = self.variable(node.index());
        let low = self.low_node(node);
        let high = self.high_node(node);

        format!(
            "{}:(x{}, {}, {})",
            node,
            v,
            self.to_bracket_string(high),
            self.to_bracket_string(low)
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_var() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1).unwrap();

        assert_eq!(bdd.variable(x.index()), 1);
        assert_eq!(bdd.high_node(x), bdd.one);
        assert_eq!(bdd.low_node(x), bdd.zero);

        let not_x = -x;
        assert_eq!(bdd.high_node(not_x), bdd.zero);
        assert_eq!(bdd.low_node(not_x), bdd.one);
    }

    #[test]
    fn test_terminal() {
        let bdd = Bdd::default();

        assert!(bdd.is_terminal(bdd.zero));
        assert!(bdd.is_zero(bdd.zero));
        assert!(!bdd.is_one(bdd.zero));

        assert!(bdd.is_terminal(bdd.one));
        assert!(!bdd.is_zero(bdd.one));
        assert!(bdd.is_one(bdd.one));

        assert_eq!(bdd.variable(bdd.one.index()), 0);
    }

    #[test]
    fn test_cube() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();

        let f = bdd.apply_and(bdd.apply_and(x1, x2).unwrap(), x3).unwrap();
        assert_eq!(f, bdd.cube([1, 2, 3]).unwrap());

        let f = bdd.apply_and(bdd.apply_and(x1, -x2).unwrap(), -x3).unwrap();
        assert_eq!(f, bdd.cube([1, -2, -3]).unwrap());
    }

    #[test]
    fn test_de_morgan() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();

        assert_eq!(-bdd.apply_and(x, y).unwrap(), bdd.apply_or(-x, -y).unwrap());
        assert_eq!(-bdd.apply_or(x, y).unwrap(), bdd.apply_and(-x, -y).unwrap());
    }

    #[test]
    fn test_xor() {
        let bdd = Bdd::default();

        let x = bdd.mk_var(1).unwrap();
        let y = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and(x, y).unwrap();

        assert_eq!(bdd.apply_xor(f, f).unwrap(), bdd.zero);
        assert_eq!(bdd.apply_xor(f, -f).unwrap(), bdd.one);
        assert_eq!(bdd.apply_xor(x, y).unwrap(), -bdd.apply_eq(x, y).unwrap());
    }

    #[test]
    fn test_apply_ite() {
        let bdd = Bdd::default();

        let g = bdd.mk_var(2).unwrap();
        let h = bdd.mk_var(3).unwrap();
        assert_eq!(bdd.apply_ite(bdd.one, g, h).unwrap(), g);
        assert_eq!(bdd.apply_ite(bdd.zero, g, h).unwrap(), h);

        let f = bdd.mk_node(2, bdd.one, h).unwrap();
        assert_eq!(bdd.apply_ite(f, f, h).unwrap(), bdd.apply_or(f, h).unwrap());
        assert_eq!(bdd.apply_ite(f, g, f).unwrap(), bdd.apply_and(f, g).unwrap());
        assert_eq!(
            bdd.apply_ite(f, -g, bdd.one).unwrap(),
            -bdd.apply_and(f, g).unwrap()
        );
        assert_eq!(
            bdd.apply_ite(f, bdd.zero, -h).unwrap(),
            -bdd.apply_or(f, h).unwrap()
        );

        let f = bdd.mk_var(5).unwrap();
        assert_eq!(bdd.apply_ite(f, g, g).unwrap(), g);
        assert_eq!(bdd.apply_ite(f, bdd.one, bdd.zero).unwrap(), f);
        assert_eq!(bdd.apply_ite(f, bdd.zero, bdd.one).unwrap(), -f);
    }

    #[test]
    fn test_substitute() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();

        let f = bdd.apply_or(bdd.apply_eq(x1, x2).unwrap(), x3).unwrap();
        let f_x2_zero = bdd.substitute(f, 2, false).unwrap();
        assert_eq!(f_x2_zero, bdd.apply_or(-x1, x3).unwrap());
    }

    #[test]
    fn test_compose() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();

        let f = bdd.apply_and(bdd.apply_eq(x1, x2).unwrap(), x3).unwrap();
        let g = -bdd.apply_eq(x1, x2).unwrap();

        let h = bdd.compose(f, 3, g).unwrap();
        assert!(bdd.is_zero(h));
    }

    #[test]
    fn test_exists() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();

        // ∃x2. (x1 ∧ x2) = x1
        let f = bdd.apply_and(x1, x2).unwrap();
        assert_eq!(bdd.exists(f, &[2]).unwrap(), x1);

        // ∃x1 x2. (x1 ∧ x2) = 1
        assert_eq!(bdd.exists(f, &[1, 2]).unwrap(), bdd.one);

        // ∃x2. (x1 ∧ x2) ∨ (-x1 ∧ x3) = x1 ∨ x3
        let g = bdd.apply_or(f, bdd.apply_and(-x1, x3).unwrap()).unwrap();
        assert_eq!(bdd.exists(g, &[2]).unwrap(), bdd.apply_or(x1, x3).unwrap());

        // Quantifying a variable not in the support is a no-op.
        assert_eq!(bdd.exists(f, &[5]).unwrap(), f);
        assert_eq!(bdd.exists(f, &[]).unwrap(), f);
    }

    #[test]
    fn test_exists_negated_root() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();

        // ∃x2. ~(x1 ∧ x2) = 1, ∃x1. ~(x1 ∨ x2) = ~x2
        let f = -bdd.apply_and(x1, x2).unwrap();
        assert_eq!(bdd.exists(f, &[2]).unwrap(), bdd.one);
        let g = -bdd.apply_or(x1, x2).unwrap();
        assert_eq!(bdd.exists(g, &[1]).unwrap(), -x2);
    }

    #[test]
    fn test_rename() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let x3 = bdd.mk_var(3).unwrap();
        let x4 = bdd.mk_var(4).unwrap();

        // (x1 ∧ x3)[1 -> 2, 3 -> 4] = x2 ∧ x4
        let f = bdd.apply_and(x1, x3).unwrap();
        let renamed = bdd.rename(f, &[(1, 2), (3, 4)]).unwrap();
        assert_eq!(renamed, bdd.apply_and(x2, x4).unwrap());
    }

    #[test]
    fn test_is_implies() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and(x1, x2).unwrap();

        assert!(bdd.is_implies(f, x1));
        assert!(bdd.is_implies(f, x2));
        assert!(!bdd.is_implies(f, -x1));
        assert!(!bdd.is_implies(x1, f));
        assert!(bdd.is_implies(x1, bdd.one));
        assert!(bdd.is_implies(bdd.zero, x1));
        assert!(bdd.is_implies(x1, bdd.apply_or(x1, x2).unwrap()));
    }

    #[test]
    fn test_storage_full_is_an_error() {
        // Capacity 4: cell 0 is reserved and cell 1 holds the terminal,
        // so two variables fit and a third does not.
        let bdd = Bdd::new(2);

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();

        assert_eq!(bdd.mk_var(3), Err(StorageFull { capacity: 4 }));
        // Hash-consed lookups of existing nodes still succeed.
        assert_eq!(bdd.mk_var(1), Ok(x1));
        // A failing apply reports the error instead of panicking.
        assert!(bdd.apply_and(x1, x2).is_err());
    }

    #[test]
    fn test_collect_garbage() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1).unwrap();
        let x2 = bdd.mk_var(2).unwrap();
        let f = bdd.apply_and(x1, x2).unwrap();
        let g = bdd.apply_or(x1, x2).unwrap();

        let before = bdd.num_nodes();
        bdd.collect_garbage(&[f]);
        assert!(bdd.num_nodes() < before);

        // `f` and its cone survive; rebuilding it hits the same nodes.
        assert_eq!(bdd.variable(f.index()), 1);
        let f2 = bdd
            .apply_and(bdd.mk_var(1).unwrap(), bdd.mk_var(2).unwrap())
            .unwrap();
        assert_eq!(f2, f);

        // `g` was dropped; rebuilding it yields an equivalent diagram.
        let g2 = bdd
            .apply_or(bdd.mk_var(1).unwrap(), bdd.mk_var(2).unwrap())
            .unwrap();
        assert_eq!(bdd.size(g2), bdd.size(g));
    }
}
