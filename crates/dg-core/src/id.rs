use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for ids.
///
/// This is only a string table. Which ids are *in use* is tracked by an
/// explicit [`GuidRegistry`] owned by the session.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for nodes and edges.
/// Internally a 4-byte `Spur` index, so copies and comparisons are cheap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(Spur);

impl Guid {
    /// Intern a string as a Guid, or return the existing one.
    ///
    /// Interning does not register the id anywhere; use
    /// [`GuidRegistry::generate`] to obtain a fresh id.
    pub fn intern(s: &str) -> Self {
        Guid(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self.as_str())
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Guid::intern(&s))
    }
}

// ─── Registry ────────────────────────────────────────────────────────────

/// What an id names. Used as the prefix of generated ids and for
/// per-kind statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdKind {
    Node,
    Edge,
}

impl IdKind {
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Node => "node",
            IdKind::Edge => "edge",
        }
    }
}

/// How fresh ids are minted before collision checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidStrategy {
    /// `node_3f2a9c01d4e7`: 12 hex digits of a v4 uuid.
    #[default]
    Random,
    /// `node_1`, `node_2`, …; deterministic, used by tests and fixtures.
    Sequential,
}

/// Counts reported by [`GuidRegistry::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuidStats {
    pub total: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Issues and tracks unique ids for nodes and edges.
///
/// Every id handed out since the last [`clear`](Self::clear) stays marked,
/// including ids of deleted nodes, so nothing is ever reissued within a
/// diagram session.
#[derive(Debug, Default)]
pub struct GuidRegistry {
    used: HashSet<Guid>,
    nodes: HashSet<Guid>,
    edges: HashSet<Guid>,
    /// Collision counters per base id, for `_N` suffixes.
    counters: HashMap<Guid, u64>,
    strategy: GuidStrategy,
    sequence: u64,
}

impl GuidRegistry {
    pub fn new(strategy: GuidStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn strategy(&self) -> GuidStrategy {
        self.strategy
    }

    /// Mint a new id of the given kind, guaranteed not to collide with any
    /// id registered since the last `clear`.
    pub fn generate(&mut self, kind: IdKind) -> Guid {
        loop {
            let base = self.mint(kind);
            if !self.used.contains(&base) {
                self.register(base, Some(kind));
                return base;
            }
            if let Some(id) = self.suffixed(base) {
                self.register(id, Some(kind));
                return id;
            }
        }
    }

    /// Mark every id in `ids` as present. Used when loading a diagram so
    /// later `generate` calls never collide with loaded ids.
    pub fn initialize_from_existing<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = (Guid, IdKind)>,
    {
        for (id, kind) in ids {
            self.register(id, Some(kind));
        }
        log::debug!("guid registry seeded: {:?}", self.stats());
    }

    /// Register one existing id. Returns `false` (and leaves the registry
    /// unchanged) when the id is already in use.
    pub fn register_existing(&mut self, id: Guid, kind: IdKind) -> bool {
        if self.used.contains(&id) {
            log::warn!("id collision for existing id {id}");
            return false;
        }
        self.register(id, Some(kind));
        true
    }

    /// Return `proposed` if it is free, otherwise the first free
    /// `proposed_N`. The returned id is registered.
    pub fn ensure_unique(&mut self, proposed: &str, kind: IdKind) -> Guid {
        let id = Guid::intern(proposed);
        if !self.used.contains(&id) {
            self.register(id, Some(kind));
            return id;
        }
        let mut n = 1u64;
        loop {
            let candidate = Guid::intern(&format!("{proposed}_{n}"));
            if !self.used.contains(&candidate) {
                self.register(candidate, Some(kind));
                return candidate;
            }
            n += 1;
        }
    }

    pub fn is_used(&self, id: Guid) -> bool {
        self.used.contains(&id)
    }

    /// All registered ids of one kind, or of every kind with `None`.
    pub fn ids(&self, kind: Option<IdKind>) -> Vec<Guid> {
        let set = match kind {
            Some(IdKind::Node) => &self.nodes,
            Some(IdKind::Edge) => &self.edges,
            None => &self.used,
        };
        set.iter().copied().collect()
    }

    pub fn stats(&self) -> GuidStats {
        GuidStats {
            total: self.used.len(),
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }

    /// Forget every id (new-diagram reset). The strategy is kept.
    pub fn clear(&mut self) {
        self.used.clear();
        self.nodes.clear();
        self.edges.clear();
        self.counters.clear();
        self.sequence = 0;
    }

    fn register(&mut self, id: Guid, kind: Option<IdKind>) {
        self.used.insert(id);
        match kind {
            Some(IdKind::Node) => {
                self.nodes.insert(id);
            }
            Some(IdKind::Edge) => {
                self.edges.insert(id);
            }
            None => {}
        }
    }

    fn mint(&mut self, kind: IdKind) -> Guid {
        match self.strategy {
            GuidStrategy::Random => {
                let hex = uuid::Uuid::new_v4().simple().to_string();
                Guid::intern(&format!("{}_{}", kind.prefix(), &hex[..12]))
            }
            GuidStrategy::Sequential => {
                self.sequence += 1;
                Guid::intern(&format!("{}_{}", kind.prefix(), self.sequence))
            }
        }
    }

    /// Next `base_N` for a colliding base, or `None` if that one is taken too.
    fn suffixed(&mut self, base: Guid) -> Option<Guid> {
        let counter = self.counters.entry(base).or_insert(0);
        *counter += 1;
        let candidate = Guid::intern(&format!("{}_{}", base.as_str(), counter));
        (!self.used.contains(&candidate)).then_some(candidate)
    }
}

/// Basic shape check for ids coming from outside: at least three
/// characters, only `[A-Za-z0-9_-]`.
pub fn validate_guid(s: &str) -> bool {
    s.len() >= 3
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
