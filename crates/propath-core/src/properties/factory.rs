//! Cached property model lookup over an ordered taster chain

use std::sync::Arc;
use std::time::Duration;

use propath_types::Type;
use tracing::{debug, warn, Level};

use super::cache::{Clock, ExpiringCache, SystemClock, DEFAULT_IDLE};
use super::{PropertyModel, Taster};
use crate::error::{Error, Result};

/// Property model source shared by argument finders and mappers
pub struct PropertiesFactory {
    tasters: Vec<Arc<dyn Taster>>,
    cache: ExpiringCache<Type, Arc<PropertyModel>>,
    warn_ambiguous: bool,
}

impl PropertiesFactory {
    /// Factory over `tasters`, tried in order, with the default idle window
    pub fn new(tasters: Vec<Arc<dyn Taster>>) -> Self {
        Self::with_clock(tasters, DEFAULT_IDLE, Arc::new(SystemClock))
    }

    /// Factory with an explicit idle window and time source
    pub fn with_clock(tasters: Vec<Arc<dyn Taster>>, idle: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasters,
            cache: ExpiringCache::with_clock(idle, clock),
            warn_ambiguous: true,
        }
    }

    /// Enable or disable the ambiguous-match warning
    pub fn warn_ambiguous(mut self, enabled: bool) -> Self {
        self.warn_ambiguous = enabled;
        self
    }

    /// Copy sharing the tasters, with an empty cache
    pub fn create_copy(&self) -> Self {
        Self {
            tasters: self.tasters.clone(),
            cache: ExpiringCache::with_clock(self.cache.idle(), self.cache.clock().clone()),
            warn_ambiguous: self.warn_ambiguous,
        }
    }

    /// Time source of the cache
    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.cache.clock()
    }

    /// Strategy names in priority order
    pub fn strategies(&self) -> Vec<&'static str> {
        self.tasters.iter().map(|t| t.name()).collect()
    }

    /// Number of cached models
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Property model of `ty`
    ///
    /// Repeated lookups within the idle window return the same `Arc`. A type
    /// no strategy accepts is an error and is retried on the next lookup.
    pub fn properties_of(&self, ty: &Type) -> Result<Arc<PropertyModel>> {
        self.cache.get_or_try_insert_with(ty, || {
            debug!(ty = %ty, "property model cache miss");
            self.taste(ty).map(Arc::new)
        })
    }

    fn taste(&self, ty: &Type) -> Result<PropertyModel> {
        let mut tasters = self.tasters.iter();
        let mut chosen = None;
        for taster in tasters.by_ref() {
            if let Some(model) = taster.taste(ty)? {
                chosen = Some(model);
                break;
            }
        }
        let model = chosen.ok_or_else(|| Error::NoProperties { ty: ty.clone() })?;
        debug!(ty = %ty, strategy = model.strategy(), "property model selected");

        // the check only runs when someone would see the warning
        if self.warn_ambiguous && tracing::enabled!(Level::WARN) {
            for other in tasters {
                match other.applies(ty) {
                    Ok(true) => {
                        warn!(
                            ty = %ty,
                            chosen = model.strategy(),
                            also = other.name(),
                            "type matches more than one introspection strategy"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        debug!(ty = %ty, strategy = other.name(), error = %err, "lower priority strategy failed");
                    }
                }
            }
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::cache::ManualClock;
    use crate::properties::Recipe;
    use parking_lot::Mutex;
    use propath_types::ClassRef;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    struct Counting {
        name: &'static str,
        accepts: bool,
        calls: AtomicUsize,
    }

    impl Counting {
        fn new(name: &'static str, accepts: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                accepts,
                calls: AtomicUsize::new(0),
            })
        }
    }

    fn chain(tasters: &[&Arc<Counting>]) -> Vec<Arc<dyn Taster>> {
        tasters
            .iter()
            .map(|t| Arc::clone(t) as Arc<dyn Taster>)
            .collect()
    }

    impl Taster for Counting {
        fn name(&self) -> &'static str {
            self.name
        }

        fn taste(&self, ty: &Type) -> Result<Option<PropertyModel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.accepts {
                return Ok(None);
            }
            Ok(Some(PropertyModel::new(
                ty.clone(),
                self.name,
                Vec::new(),
                Recipe::Constructor {
                    class: ClassRef::new("X"),
                    constructor: None,
                },
            )))
        }
    }

    #[test]
    fn test_first_match_wins() {
        let first = Counting::new("first", false);
        let second = Counting::new("second", true);
        let third = Counting::new("third", true);
        let factory = PropertiesFactory::new(chain(&[&first, &second, &third]));

        let model = factory.properties_of(&Type::Class(ClassRef::new("X"))).unwrap();
        assert_eq!(model.strategy(), "second");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        // nobody listens for the warning, so lower strategies stay untouched
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[derive(Clone, Default)]
    struct Warnings(Arc<Mutex<Vec<String>>>);

    struct MessageVisitor<'a>(&'a mut String);

    impl Visit for MessageVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Warnings {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() != Level::WARN {
                return;
            }
            let mut message = String::new();
            event.record(&mut MessageVisitor(&mut message));
            self.0.lock().push(message);
        }
    }

    #[test]
    fn test_ambiguous_match_warns() {
        let first = Counting::new("first", true);
        let second = Counting::new("second", true);
        let factory = PropertiesFactory::new(chain(&[&first, &second]));
        let warnings = Warnings::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());

        let model = tracing::subscriber::with_default(subscriber, || {
            factory.properties_of(&Type::Class(ClassRef::new("X"))).unwrap()
        });
        assert_eq!(model.strategy(), "first");
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *warnings.0.lock(),
            vec!["type matches more than one introspection strategy".to_string()]
        );

        // cached: neither the strategies nor the check run again
        tracing::subscriber::with_default(tracing_subscriber::registry().with(warnings.clone()), || {
            factory.properties_of(&Type::Class(ClassRef::new("X"))).unwrap()
        });
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(warnings.0.lock().len(), 1);
    }

    #[test]
    fn test_ambiguity_warning_disabled() {
        let first = Counting::new("first", true);
        let second = Counting::new("second", true);
        let factory = PropertiesFactory::new(chain(&[&first, &second])).warn_ambiguous(false);
        let warnings = Warnings::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());

        tracing::subscriber::with_default(subscriber, || {
            factory.properties_of(&Type::Class(ClassRef::new("X"))).unwrap()
        });
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
        assert!(warnings.0.lock().is_empty());
    }

    #[test]
    fn test_cached_model_identical() {
        let taster = Counting::new("only", true);
        let factory = PropertiesFactory::new(chain(&[&taster])).warn_ambiguous(false);
        let ty = Type::Class(ClassRef::new("X"));

        let a = factory.properties_of(&ty).unwrap();
        let b = factory.properties_of(&ty).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(taster.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_match_not_cached() {
        let taster = Counting::new("never", false);
        let factory = PropertiesFactory::new(chain(&[&taster]));
        let ty = Type::long();

        let err = factory.properties_of(&ty).unwrap_err();
        assert_eq!(err.to_string(), "Couldn't find properties for long");
        assert!(factory.properties_of(&ty).is_err());
        assert_eq!(taster.calls.load(Ordering::SeqCst), 2);
        assert_eq!(factory.cached(), 0);
    }

    #[test]
    fn test_expiry_recomputes() {
        let clock = Arc::new(ManualClock::new());
        let taster = Counting::new("only", true);
        let factory =
            PropertiesFactory::with_clock(chain(&[&taster]), Duration::from_secs(60), clock.clone());
        let ty = Type::Class(ClassRef::new("X"));

        let a = factory.properties_of(&ty).unwrap();
        clock.advance(Duration::from_secs(61));
        let b = factory.properties_of(&ty).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(taster.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_copy_has_fresh_cache() {
        let taster = Counting::new("only", true);
        let factory = PropertiesFactory::new(chain(&[&taster]));
        let ty = Type::Class(ClassRef::new("X"));
        factory.properties_of(&ty).unwrap();

        let copy = factory.create_copy();
        assert_eq!(copy.cached(), 0);
        assert_eq!(copy.strategies(), vec!["only"]);
    }
}
