//! Hierarchy Model and Suite Builder
//!
//! A suite is a tree of named groups with measure/evaluate leaves at the
//! bottom. The builder is a thin recorder: it erases the caller's concrete
//! datum types behind `Arc<dyn Any>`, pairs each leaf with its generator,
//! and validates structural invariants at registration time. The engine
//! only ever reads the finished tree.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Type-erased synthetic datum handed to target functions.
pub type Datum = Arc<dyn Any + Send + Sync>;

/// Boxed future returned by erased asynchronous targets.
pub type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Registration-time validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A group or leaf was registered with an empty title.
    #[error("empty title under '{parent}'")]
    EmptyTitle {
        /// Slash-joined path of the enclosing group.
        parent: String,
    },

    /// Two siblings share a title.
    #[error("duplicate title '{title}' under '{parent}'")]
    DuplicateTitle {
        /// The repeated title.
        title: String,
        /// Slash-joined path of the enclosing group.
        parent: String,
    },

    /// A group mixes measure and evaluate leaves among its direct children.
    #[error("group '{group}' mixes measure and evaluate leaves")]
    MixedLeafKinds {
        /// Slash-joined path of the offending group.
        group: String,
    },
}

// ─── Generators ──────────────────────────────────────────────────────────────

/// Identity of a data generator, stable across clones.
///
/// Two leaves share synthetic data only when their generators carry the same
/// id — identity, not output equality, is what the plan builder compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeneratorId(u64);

static NEXT_GENERATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased data generator: `size -> datum`.
#[derive(Clone)]
pub struct DataGenerator {
    id: GeneratorId,
    make: Arc<dyn Fn(u64) -> Datum + Send + Sync>,
}

impl DataGenerator {
    /// Wrap a typed generator function. Each call creates a new identity;
    /// clone the handle to share one generator across leaves.
    pub fn new<T, F>(f: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(u64) -> T + Send + Sync + 'static,
    {
        Self {
            id: GeneratorId(NEXT_GENERATOR_ID.fetch_add(1, Ordering::Relaxed)),
            make: Arc::new(move |size| Arc::new(f(size)) as Datum),
        }
    }

    /// Stable identity of this generator.
    pub fn id(&self) -> GeneratorId {
        self.id
    }

    /// Produce one synthetic datum for the given data size.
    pub fn generate(&self, size: u64) -> Datum {
        (self.make)(size)
    }
}

impl fmt::Debug for DataGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataGenerator(#{})", self.id.0)
    }
}

/// Typed generator handle used with the suite builder.
///
/// Clones share identity, so registering two leaves with clones of one `Gen`
/// marks them as candidates for shared-data generation.
pub struct Gen<T> {
    inner: DataGenerator,
    _marker: PhantomData<fn(u64) -> T>,
}

impl<T: Send + Sync + 'static> Gen<T> {
    /// Wrap a typed `size -> T` function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(u64) -> T + Send + Sync + 'static,
    {
        Self {
            inner: DataGenerator::new(f),
            _marker: PhantomData,
        }
    }

    /// The erased generator carried by leaves.
    pub fn erased(&self) -> DataGenerator {
        self.inner.clone()
    }
}

impl<T> Clone for Gen<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Gen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen(#{})", self.inner.id.0)
    }
}

// ─── Targets ─────────────────────────────────────────────────────────────────

/// Erased measure target. The variant doubles as the asynchronous marker:
/// async targets are awaited to completion one invocation at a time.
#[derive(Clone)]
pub enum MeasureTarget {
    /// Plain function of one datum.
    Sync(Arc<dyn Fn(&Datum) + Send + Sync>),
    /// Future-returning function of one datum.
    Async(Arc<dyn Fn(Datum) -> BoxedFuture + Send + Sync>),
}

impl MeasureTarget {
    /// Whether invocations must be awaited.
    pub fn is_async(&self) -> bool {
        matches!(self, MeasureTarget::Async(_))
    }
}

impl fmt::Debug for MeasureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureTarget::Sync(_) => f.write_str("MeasureTarget::Sync"),
            MeasureTarget::Async(_) => f.write_str("MeasureTarget::Async"),
        }
    }
}

/// Erased evaluate target: one datum in, one number out.
#[derive(Clone)]
pub struct EvalTarget(Arc<dyn Fn(&Datum) -> f64 + Send + Sync>);

impl EvalTarget {
    /// Invoke the target on one datum.
    pub fn call(&self, datum: &Datum) -> f64 {
        (self.0)(datum)
    }
}

impl fmt::Debug for EvalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EvalTarget")
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────────

/// One node of the registration tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// Named container of further nodes.
    Group(GroupNode),
    /// Timed unit.
    Measure(MeasureLeaf),
    /// Numeric-evaluation unit.
    Evaluate(EvalLeaf),
}

impl Node {
    /// Display title of this node.
    pub fn title(&self) -> &str {
        match self {
            Node::Group(g) => &g.title,
            Node::Measure(l) => &l.title,
            Node::Evaluate(l) => &l.title,
        }
    }

    /// Path from the synthetic root down to this node (root excluded).
    pub fn path(&self) -> &[String] {
        match self {
            Node::Group(g) => &g.path,
            Node::Measure(l) => &l.path,
            Node::Evaluate(l) => &l.path,
        }
    }
}

/// Named container node. Children stay in declaration order.
#[derive(Debug, Clone)]
pub struct GroupNode {
    /// Display title, unique among siblings.
    pub title: String,
    /// Path from the root, inclusive of this group.
    pub path: Vec<String>,
    /// Child nodes in declaration order.
    pub children: Vec<Node>,
}

/// A timed unit: target function plus data generator.
#[derive(Debug, Clone)]
pub struct MeasureLeaf {
    /// Display title, unique among siblings.
    pub title: String,
    /// Full path; a leaf's identity across the whole tree.
    pub path: Vec<String>,
    /// The function under measurement.
    pub target: MeasureTarget,
    /// Generator producing this leaf's synthetic data.
    pub generator: DataGenerator,
}

/// A numeric-evaluation unit: returns one number per datum instead of being
/// timed, feeding an externally defined chart.
#[derive(Debug, Clone)]
pub struct EvalLeaf {
    /// Display title, unique among siblings.
    pub title: String,
    /// Full path; a leaf's identity across the whole tree.
    pub path: Vec<String>,
    /// The function under evaluation.
    pub target: EvalTarget,
    /// Generator producing this leaf's synthetic data.
    pub generator: DataGenerator,
    /// Identifier of the chart this leaf's values feed.
    pub chart: String,
}

/// Kind of a leaf, used for homogeneity validation and the flat legacy view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    /// Timed unit.
    Measure,
    /// Numeric-evaluation unit.
    Evaluate,
}

// ─── Suite ───────────────────────────────────────────────────────────────────

/// A finished, validated registration tree. Read-only once built.
#[derive(Debug, Clone)]
pub struct Suite {
    root: GroupNode,
}

/// Flat legacy view of one registered leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredLeaf {
    /// First path segment, when the leaf is nested.
    pub group: Option<String>,
    /// Middle path segments joined with '/', when present.
    pub subgroup: Option<String>,
    /// The leaf's own title.
    pub title: String,
    /// Measure or evaluate.
    pub kind: LeafKind,
}

impl Suite {
    /// Start recording a new suite.
    pub fn builder() -> SuiteBuilder {
        SuiteBuilder {
            root: GroupScope {
                path: Vec::new(),
                children: Vec::new(),
                errors: Vec::new(),
            },
        }
    }

    /// The synthetic root group. Its title and path are empty.
    pub fn root(&self) -> &GroupNode {
        &self.root
    }

    /// Flat snapshot of every leaf with legacy group/subgroup/title fields.
    pub fn registered_leaves(&self) -> Vec<RegisteredLeaf> {
        fn collect(node: &Node, out: &mut Vec<RegisteredLeaf>) {
            match node {
                Node::Group(g) => {
                    for child in &g.children {
                        collect(child, out);
                    }
                }
                Node::Measure(leaf) => out.push(flatten(&leaf.path, LeafKind::Measure)),
                Node::Evaluate(leaf) => out.push(flatten(&leaf.path, LeafKind::Evaluate)),
            }
        }

        fn flatten(path: &[String], kind: LeafKind) -> RegisteredLeaf {
            let title = path.last().cloned().unwrap_or_default();
            let group = if path.len() > 1 {
                Some(path[0].clone())
            } else {
                None
            };
            let subgroup = if path.len() > 2 {
                Some(path[1..path.len() - 1].join("/"))
            } else {
                None
            };
            RegisteredLeaf {
                group,
                subgroup,
                title,
                kind,
            }
        }

        let mut out = Vec::new();
        for child in &self.root.children {
            collect(child, &mut out);
        }
        out
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Records a suite. Validation failures are collected as they happen and the
/// first one surfaces from [`SuiteBuilder::build`].
#[derive(Debug)]
pub struct SuiteBuilder {
    root: GroupScope,
}

impl SuiteBuilder {
    /// Open a nested group at the top level.
    pub fn group(&mut self, title: impl Into<String>, f: impl FnOnce(&mut GroupScope)) -> &mut Self {
        self.root.group(title, f);
        self
    }

    /// Register a top-level synchronous measure leaf.
    pub fn measure<T, F>(&mut self, title: impl Into<String>, generator: &Gen<T>, target: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.root.measure(title, generator, target);
        self
    }

    /// Register a top-level asynchronous measure leaf.
    pub fn measure_async<T, F, Fut>(
        &mut self,
        title: impl Into<String>,
        generator: &Gen<T>,
        target: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.root.measure_async(title, generator, target);
        self
    }

    /// Register a top-level evaluate leaf feeding the named chart.
    pub fn evaluate<T, F>(
        &mut self,
        title: impl Into<String>,
        generator: &Gen<T>,
        chart: impl Into<String>,
        target: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        self.root.evaluate(title, generator, chart, target);
        self
    }

    /// Finish recording. Returns the first validation failure, if any.
    pub fn build(self) -> Result<Suite, RegistryError> {
        let GroupScope {
            path,
            children,
            mut errors,
        } = self.root;
        if let Some(err) = errors.drain(..).next() {
            return Err(err);
        }
        Ok(Suite {
            root: GroupNode {
                title: String::new(),
                path,
                children,
            },
        })
    }
}

/// Recording scope for one group; handed to `group(...)` closures.
#[derive(Debug)]
pub struct GroupScope {
    path: Vec<String>,
    children: Vec<Node>,
    errors: Vec<RegistryError>,
}

impl GroupScope {
    fn parent_desc(&self) -> String {
        self.path.join("/")
    }

    fn child_path(&self, title: &str) -> Vec<String> {
        let mut path = self.path.clone();
        path.push(title.to_string());
        path
    }

    /// Check title validity against the children recorded so far.
    fn admit_title(&mut self, title: &str) -> bool {
        if title.is_empty() {
            self.errors.push(RegistryError::EmptyTitle {
                parent: self.parent_desc(),
            });
            return false;
        }
        if self.children.iter().any(|c| c.title() == title) {
            self.errors.push(RegistryError::DuplicateTitle {
                title: title.to_string(),
                parent: self.parent_desc(),
            });
            return false;
        }
        true
    }

    /// Direct leaf children must be uniformly measure or uniformly evaluate.
    fn admit_leaf_kind(&mut self, kind: LeafKind) -> bool {
        let mixed = self.children.iter().any(|c| match c {
            Node::Measure(_) => kind != LeafKind::Measure,
            Node::Evaluate(_) => kind != LeafKind::Evaluate,
            Node::Group(_) => false,
        });
        if mixed {
            self.errors.push(RegistryError::MixedLeafKinds {
                group: self.parent_desc(),
            });
            return false;
        }
        true
    }

    /// Open a nested group.
    pub fn group(&mut self, title: impl Into<String>, f: impl FnOnce(&mut GroupScope)) -> &mut Self {
        let title = title.into();
        if !self.admit_title(&title) {
            return self;
        }
        let mut scope = GroupScope {
            path: self.child_path(&title),
            children: Vec::new(),
            errors: Vec::new(),
        };
        f(&mut scope);
        let GroupScope {
            path,
            children,
            errors,
        } = scope;
        self.errors.extend(errors);
        self.children.push(Node::Group(GroupNode {
            title,
            path,
            children,
        }));
        self
    }

    /// Register a synchronous measure leaf.
    pub fn measure<T, F>(&mut self, title: impl Into<String>, generator: &Gen<T>, target: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let title = title.into();
        if !self.admit_title(&title) || !self.admit_leaf_kind(LeafKind::Measure) {
            return self;
        }
        let erased: Arc<dyn Fn(&Datum) + Send + Sync> = Arc::new(move |datum: &Datum| {
            if let Some(value) = datum.downcast_ref::<T>() {
                target(value);
            }
        });
        let path = self.child_path(&title);
        self.children.push(Node::Measure(MeasureLeaf {
            title,
            path,
            target: MeasureTarget::Sync(erased),
            generator: generator.erased(),
        }));
        self
    }

    /// Register an asynchronous measure leaf. Invocations are awaited one at
    /// a time; the future receives shared ownership of its datum.
    pub fn measure_async<T, F, Fut>(
        &mut self,
        title: impl Into<String>,
        generator: &Gen<T>,
        target: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let title = title.into();
        if !self.admit_title(&title) || !self.admit_leaf_kind(LeafKind::Measure) {
            return self;
        }
        let erased: Arc<dyn Fn(Datum) -> BoxedFuture + Send + Sync> =
            Arc::new(move |datum: Datum| match datum.downcast::<T>() {
                Ok(value) => Box::pin(target(value)) as BoxedFuture,
                Err(_) => Box::pin(std::future::ready(())) as BoxedFuture,
            });
        let path = self.child_path(&title);
        self.children.push(Node::Measure(MeasureLeaf {
            title,
            path,
            target: MeasureTarget::Async(erased),
            generator: generator.erased(),
        }));
        self
    }

    /// Register an evaluate leaf feeding the named chart.
    pub fn evaluate<T, F>(
        &mut self,
        title: impl Into<String>,
        generator: &Gen<T>,
        chart: impl Into<String>,
        target: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        let title = title.into();
        if !self.admit_title(&title) || !self.admit_leaf_kind(LeafKind::Evaluate) {
            return self;
        }
        let erased: Arc<dyn Fn(&Datum) -> f64 + Send + Sync> = Arc::new(move |datum: &Datum| {
            match datum.downcast_ref::<T>() {
                Some(value) => target(value),
                None => 0.0,
            }
        });
        let path = self.child_path(&title);
        self.children.push(Node::Evaluate(EvalLeaf {
            title,
            path,
            target: EvalTarget(erased),
            generator: generator.erased(),
            chart: chart.into(),
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_nested_paths() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("Encoding", |g| {
            g.group("JSON", |g| {
                g.measure("serialize", &gen, |_: &u64| {});
            });
        });
        let suite = builder.build().unwrap();

        let encoding = match &suite.root().children[0] {
            Node::Group(g) => g,
            other => panic!("expected group, got {:?}", other.title()),
        };
        assert_eq!(encoding.path, vec!["Encoding"]);
        let json = match &encoding.children[0] {
            Node::Group(g) => g,
            _ => panic!("expected group"),
        };
        let leaf = match &json.children[0] {
            Node::Measure(l) => l,
            _ => panic!("expected measure leaf"),
        };
        assert_eq!(leaf.path, vec!["Encoding", "JSON", "serialize"]);
    }

    #[test]
    fn test_duplicate_sibling_title_rejected() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("a", &gen, |_: &u64| {});
            g.measure("a", &gen, |_: &u64| {});
        });
        let err = builder.build().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTitle { .. }));
    }

    #[test]
    fn test_same_title_in_different_groups_allowed() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("a", |g| {
            g.measure("x", &gen, |_: &u64| {});
        });
        builder.group("b", |g| {
            g.measure("x", &gen, |_: &u64| {});
        });
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_empty_title_rejected() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.measure("", &gen, |_: &u64| {});
        let err = builder.build().unwrap_err();
        assert!(matches!(err, RegistryError::EmptyTitle { .. }));
    }

    #[test]
    fn test_mixed_leaf_kinds_rejected() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("timed", &gen, |_: &u64| {});
            g.evaluate("counted", &gen, "chart-1", |v: &u64| *v as f64);
        });
        let err = builder.build().unwrap_err();
        assert!(matches!(err, RegistryError::MixedLeafKinds { .. }));
    }

    #[test]
    fn test_groups_next_to_leaves_are_fine() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.group("g", |g| {
            g.measure("timed", &gen, |_: &u64| {});
            g.group("nested", |g| {
                g.evaluate("counted", &gen, "chart-1", |v: &u64| *v as f64);
            });
        });
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_generator_identity_shared_across_clones() {
        let gen = Gen::new(|size| vec![0u8; size as usize]);
        let clone = gen.clone();
        assert_eq!(gen.erased().id(), clone.erased().id());

        let other = Gen::new(|size| vec![0u8; size as usize]);
        assert_ne!(gen.erased().id(), other.erased().id());
    }

    #[test]
    fn test_generate_produces_typed_datum() {
        let gen = Gen::new(|size| vec![7u8; size as usize]);
        let datum = gen.erased().generate(3);
        let bytes = datum.downcast_ref::<Vec<u8>>().unwrap();
        assert_eq!(bytes, &vec![7u8, 7, 7]);
    }

    #[test]
    fn test_registered_leaves_flat_view() {
        let gen = Gen::new(|size| size);
        let mut builder = Suite::builder();
        builder.measure("top", &gen, |_: &u64| {});
        builder.group("Encoding", |g| {
            g.group("Binary", |g| {
                g.measure("pack", &gen, |_: &u64| {});
            });
        });
        let suite = builder.build().unwrap();

        let leaves = suite.registered_leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].title, "top");
        assert_eq!(leaves[0].group, None);
        assert_eq!(leaves[1].group.as_deref(), Some("Encoding"));
        assert_eq!(leaves[1].subgroup.as_deref(), Some("Binary"));
        assert_eq!(leaves[1].title, "pack");
        assert_eq!(leaves[1].kind, LeafKind::Measure);
    }
}
