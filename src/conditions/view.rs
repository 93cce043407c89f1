//! Read-side view of the battle graph and the evaluation context.

use rustc_hash::FxHashMap;

use crate::core::{BattleRng, Id, Scalar};
use crate::error::ResolutionError;
use crate::schema::Source;

/// Lookups the evaluators need from live game state.
///
/// Implemented by [`BattleState`](crate::store::BattleState); tests and
/// runtimes may supply their own.
pub trait GameView {
    /// Whether the entity exists.
    fn contains(&self, entity: &Id) -> bool;

    /// The entity's owner, if any.
    fn owner_of(&self, entity: &Id) -> Option<Id>;

    /// Attribute `key` owned by `entity`.
    fn attribute(&self, entity: &Id, key: &str) -> Option<Scalar>;

    /// The entity's stats bundle.
    fn stats_bundle_of(&self, entity: &Id) -> Option<Id>;

    /// Stat `key` held by `bundle`, inline or through a listed attribute.
    fn bundle_stat(&self, bundle: &Id, key: &str) -> Option<Scalar>;

    fn has_status(&self, entity: &Id, status: &str) -> bool;

    fn has_tag(&self, entity: &Id, tag: &str) -> bool;
}

/// Entity role a condition or regulator is resolved through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    SelfEntity,
    Owner,
    Target,
}

impl Role {
    /// Role behind a source, ignoring whether it reads stats.
    #[must_use]
    pub const fn of(source: Source) -> Self {
        match source {
            Source::SelfEntity | Source::SelfStats => Role::SelfEntity,
            Source::Owner | Source::OwnerStats => Role::Owner,
            Source::Target | Source::TargetStats => Role::Target,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Role::SelfEntity => "SELF",
            Role::Owner => "OWNER",
            Role::Target => "TARGET",
        }
    }
}

/// Name of the maximum paired with `key`: `hp` -> `maxHp`.
#[must_use]
pub fn max_counterpart(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => format!("max{}{}", first.to_uppercase(), chars.as_str()),
        None => "max".to_string(),
    }
}

/// Everything a condition or regulator is evaluated against.
///
/// ## Example
///
/// ```
/// use battle_lab::conditions::{EvalContext, Role};
/// use battle_lab::store::BattleState;
///
/// let state = BattleState::default();
/// let mut ctx = EvalContext::new(&state).with_self("char-001");
/// ctx.set_variable("char-001", "combo", 3);
///
/// assert_eq!(ctx.entity_for(Role::SelfEntity).unwrap().as_str(), Some("char-001"));
/// assert!(ctx.variable(&"char-001".into(), "combo").is_some());
/// ```
pub struct EvalContext<'a> {
    view: &'a dyn GameView,
    self_entity: Option<Id>,
    owner: Option<Id>,
    target: Option<Id>,
    variables: FxHashMap<Id, FxHashMap<String, Scalar>>,
    rng: Option<BattleRng>,
}

impl<'a> EvalContext<'a> {
    /// Create a context with no roles bound.
    pub fn new(view: &'a dyn GameView) -> Self {
        Self {
            view,
            self_entity: None,
            owner: None,
            target: None,
            variables: FxHashMap::default(),
            rng: None,
        }
    }

    #[must_use]
    pub fn with_self(mut self, entity: impl Into<Id>) -> Self {
        self.self_entity = Some(entity.into());
        self
    }

    /// Bind `OWNER` explicitly. Unbound, it falls back to the owner of `SELF`.
    #[must_use]
    pub fn with_owner(mut self, entity: impl Into<Id>) -> Self {
        self.owner = Some(entity.into());
        self
    }

    #[must_use]
    pub fn with_target(mut self, entity: impl Into<Id>) -> Self {
        self.target = Some(entity.into());
        self
    }

    /// Random source for `CHANCE` conditions.
    #[must_use]
    pub fn with_rng(mut self, rng: BattleRng) -> Self {
        self.rng = Some(rng);
        self
    }

    #[must_use]
    pub fn view(&self) -> &'a dyn GameView {
        self.view
    }

    pub fn rng_mut(&mut self) -> Option<&mut BattleRng> {
        self.rng.as_mut()
    }

    /// Set a runtime variable (kill count, combo, last damage dealt, ...).
    pub fn set_variable(&mut self, entity: impl Into<Id>, name: impl Into<String>, value: impl Into<Scalar>) {
        self.variables
            .entry(entity.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    #[must_use]
    pub fn variable(&self, entity: &Id, name: &str) -> Option<&Scalar> {
        self.variables.get(entity)?.get(name)
    }

    /// Resolve a role to an existing entity.
    pub fn entity_for(&self, role: Role) -> Result<Id, ResolutionError> {
        let bound = match role {
            Role::SelfEntity => self.self_entity.clone(),
            Role::Target => self.target.clone(),
            Role::Owner => self
                .owner
                .clone()
                .or_else(|| self.self_entity.as_ref().and_then(|s| self.view.owner_of(s))),
        };
        let entity = bound.ok_or(ResolutionError::UnboundRole(role.name()))?;
        if !self.view.contains(&entity) {
            return Err(ResolutionError::UnknownEntity(entity));
        }
        Ok(entity)
    }

    /// Stat on an entity: its own attribute first, then its stats bundle.
    #[must_use]
    pub fn entity_stat(&self, entity: &Id, key: &str) -> Option<Scalar> {
        self.view.attribute(entity, key).or_else(|| {
            let bundle = self.view.stats_bundle_of(entity)?;
            self.view.bundle_stat(&bundle, key)
        })
    }

    /// Stat read strictly from the entity's stats bundle.
    pub fn bundle_stat(&self, entity: &Id, key: &str) -> Result<Option<Scalar>, ResolutionError> {
        let bundle = self
            .view
            .stats_bundle_of(entity)
            .ok_or_else(|| ResolutionError::NoStatsBundle { entity: entity.clone() })?;
        Ok(self.view.bundle_stat(&bundle, key))
    }

    /// Stat through a source: bundle-only for `*_STATS`, entity-first otherwise.
    pub fn source_stat(&self, source: Source, key: &str) -> Result<(Id, Option<Scalar>), ResolutionError> {
        let entity = self.entity_for(Role::of(source))?;
        let value = if source.is_stats() {
            self.bundle_stat(&entity, key)?
        } else {
            self.entity_stat(&entity, key)
        };
        Ok((entity, value))
    }
}
