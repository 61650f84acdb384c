//! Built-in rule table
//!
//! Maps rule names to their metadata and constructors. Configuration is
//! validated against this table before any rule is built.

use crate::config::ConfigError;
use crate::rule::{Rule, RuleMeta};
use crate::rules::*;
use once_cell::sync::Lazy;
use serde_json::Value as Json;
use std::collections::HashMap;

/// Builds a rule from its options
pub type RuleFactory = fn(&Json) -> Result<Box<dyn Rule>, ConfigError>;

/// One built-in rule
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    pub meta: &'static RuleMeta,
    pub create: RuleFactory,
}

fn create<R: Configurable>(options: &Json) -> Result<Box<dyn Rule>, ConfigError> {
    Ok(Box::new(R::from_options(options)?))
}

const fn entry<R: Configurable>() -> RegistryEntry {
    RegistryEntry {
        meta: R::META,
        create: create::<R>,
    }
}

/// Every built-in rule, sorted by name
static RULES: &[RegistryEntry] = &[
    entry::<ban_observables::BanObservables>(),
    entry::<ban_operators::BanOperators>(),
    entry::<finnish::Finnish>(),
    entry::<just::Just>(),
    entry::<babel_macro::Macro>(),
    entry::<no_async_subscribe::NoAsyncSubscribe>(),
    entry::<no_compat::NoCompat>(),
    entry::<no_connectable::NoConnectable>(),
    entry::<no_create::NoCreate>(),
    entry::<no_cyclic_action::NoCyclicAction>(),
    entry::<no_explicit_generics::NoExplicitGenerics>(),
    entry::<no_exposed_subjects::NoExposedSubjects>(),
    entry::<no_finnish::NoFinnish>(),
    entry::<no_ignored_error::NoIgnoredError>(),
    entry::<no_ignored_notifier::NoIgnoredNotifier>(),
    entry::<no_ignored_observable::NoIgnoredObservable>(),
    entry::<no_ignored_replay_buffer::NoIgnoredReplayBuffer>(),
    entry::<no_ignored_subscribe::NoIgnoredSubscribe>(),
    entry::<no_ignored_subscription::NoIgnoredSubscription>(),
    entry::<no_ignored_takewhile_value::NoIgnoredTakewhileValue>(),
    entry::<no_implicit_any_catch::NoImplicitAnyCatch>(),
    entry::<no_index::NoIndex>(),
    entry::<no_internal::NoInternal>(),
    entry::<no_nested_subscribe::NoNestedSubscribe>(),
    entry::<no_redundant_notify::NoRedundantNotify>(),
    entry::<no_sharereplay::NoSharereplay>(),
    entry::<no_subclass::NoSubclass>(),
    entry::<no_subject_unsubscribe::NoSubjectUnsubscribe>(),
    entry::<no_subject_value::NoSubjectValue>(),
    entry::<no_subscribe_handlers::NoSubscribeHandlers>(),
    entry::<no_topromise::NoTopromise>(),
    entry::<no_unbound_methods::NoUnboundMethods>(),
    entry::<no_unsafe_catch::NoUnsafeCatch>(),
    entry::<no_unsafe_first::NoUnsafeFirst>(),
    entry::<no_unsafe_subject_next::NoUnsafeSubjectNext>(),
    entry::<no_unsafe_switchmap::NoUnsafeSwitchmap>(),
    entry::<no_unsafe_takeuntil::NoUnsafeTakeuntil>(),
    entry::<prefer_observer::PreferObserver>(),
    entry::<suffix_subjects::SuffixSubjects>(),
    entry::<throw_error::ThrowError>(),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static RegistryEntry>> =
    Lazy::new(|| RULES.iter().map(|e| (e.meta.name, e)).collect());

/// Entry of a built-in rule
pub fn get(name: &str) -> Option<&'static RegistryEntry> {
    BY_NAME.get(name).copied()
}

/// Metadata of a built-in rule
pub fn meta(name: &str) -> Option<&'static RuleMeta> {
    get(name).map(|e| e.meta)
}

/// Metadata of every built-in rule
pub fn all_metas() -> impl Iterator<Item = &'static RuleMeta> {
    RULES.iter().map(|e| e.meta)
}

pub fn rule_names() -> Vec<&'static str> {
    RULES.iter().map(|e| e.meta.name).collect()
}

/// Build a rule by name from its options
pub fn create_rule(name: &str, options: &Json) -> Result<Box<dyn Rule>, ConfigError> {
    let entry = get(name).ok_or_else(|| ConfigError::UnknownRule(name.to_string()))?;
    log::debug!("Creating rule '{}'", name);
    (entry.create)(options)
}
