//! Configuration
//!
//! [`Settings`] is the TOML-loadable part; [`ConfigRegistry`] is the
//! per-handle container every resolution and mapping call receives, holding
//! the class registry, the property model cache and the factory registries.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use propath_types::{ClassRef, Type};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::argument::Arguments;
use crate::error::{Error, Result};
use crate::mapper::{ColumnMappers, MapEntryMapperFactory, MapEntryMappers, PojoMapperFactory, RowMappers};
use crate::properties::{
    BeanTaster, Clock, ImmutablesTaster, PropertiesFactory, PropertyModel, SystemClock, Taster,
};
use crate::reflect::ClassRegistry;

static GLOBAL: Lazy<Arc<ConfigRegistry>> =
    Lazy::new(|| Arc::new(ConfigRegistry::with_defaults(ClassRegistry::global())));

// ============================================================================
// Settings
// ============================================================================

/// Loadable settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Property introspection
    #[serde(default)]
    pub properties: PropertiesSettings,

    /// Entry mapping
    #[serde(default)]
    pub map_entry: MapEntrySettings,
}

/// `[properties]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertiesSettings {
    /// Sliding idle window of the model cache, in seconds
    #[serde(default = "default_idle_expiry_secs")]
    pub idle_expiry_secs: u64,

    /// Try to load the builder-based strategy
    #[serde(default = "default_true")]
    pub immutables: bool,

    /// Log types matched by more than one strategy
    #[serde(default = "default_true")]
    pub warn_ambiguous: bool,
}

fn default_idle_expiry_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for PropertiesSettings {
    fn default() -> Self {
        Self {
            idle_expiry_secs: default_idle_expiry_secs(),
            immutables: true,
            warn_ambiguous: true,
        }
    }
}

/// `[map_entry]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapEntrySettings {
    /// Column holding entry keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,

    /// Column holding entry values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_column: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.properties.idle_expiry_secs == 0 {
            return Err(Error::Config(
                "properties.idle_expiry_secs must be greater than zero".to_string(),
            ));
        }
        for (key, column) in [
            ("map_entry.key_column", &self.map_entry.key_column),
            ("map_entry.value_column", &self.map_entry.value_column),
        ] {
            if column.as_deref().is_some_and(|c| c.trim().is_empty()) {
                return Err(Error::Config(format!("{} cannot be blank", key)));
            }
        }
        Ok(())
    }

    /// Idle window of the model cache
    pub fn idle_expiry(&self) -> Duration {
        Duration::from_secs(self.properties.idle_expiry_secs)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Configuration container passed to every resolution and mapping call
pub struct ConfigRegistry {
    settings: Settings,
    classes: Arc<ClassRegistry>,
    immutables: Option<Arc<ImmutablesTaster>>,
    properties: PropertiesFactory,
    arguments: Arguments,
    column_mappers: ColumnMappers,
    row_mappers: RowMappers,
    map_entry: MapEntryMappers,
    implementations: RwLock<FxHashMap<ClassRef, ClassRef>>,
}

impl ConfigRegistry {
    /// Registry over a fresh class registry
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_classes(Arc::new(ClassRegistry::new()), settings)
    }

    /// Registry over an existing class registry
    pub fn with_classes(classes: Arc<ClassRegistry>, settings: Settings) -> Result<Self> {
        Self::with_clock(classes, settings, Arc::new(SystemClock))
    }

    /// Registry whose model cache runs on `clock`
    pub fn with_clock(
        classes: Arc<ClassRegistry>,
        settings: Settings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self::assemble(classes, settings, clock))
    }

    /// Registry with default settings
    pub fn with_defaults(classes: Arc<ClassRegistry>) -> Self {
        Self::assemble(classes, Settings::default(), Arc::new(SystemClock))
    }

    /// Process-wide registry over [`ClassRegistry::global`]
    pub fn global() -> Arc<ConfigRegistry> {
        GLOBAL.clone()
    }

    fn assemble(classes: Arc<ClassRegistry>, settings: Settings, clock: Arc<dyn Clock>) -> Self {
        let immutables = if settings.properties.immutables {
            match ImmutablesTaster::load(classes.clone()) {
                Ok(taster) => Some(Arc::new(taster)),
                Err(err) => {
                    trace!(error = %err, "Not loading Immutables support");
                    None
                }
            }
        } else {
            None
        };

        let properties = PropertiesFactory::with_clock(
            Self::chain(&classes, immutables.as_ref()),
            settings.idle_expiry(),
            clock,
        )
        .warn_ambiguous(settings.properties.warn_ambiguous);

        let row_mappers = RowMappers::new();
        row_mappers.register(Arc::new(MapEntryMapperFactory));

        let map_entry = MapEntryMappers::new();
        map_entry.set_key_column(settings.map_entry.key_column.clone());
        map_entry.set_value_column(settings.map_entry.value_column.clone());

        Self {
            settings,
            classes,
            immutables,
            properties,
            arguments: Arguments::new(),
            column_mappers: ColumnMappers::new(),
            row_mappers,
            map_entry,
            implementations: RwLock::new(FxHashMap::default()),
        }
    }

    /// Builder strategy first, accessor strategy last
    fn chain(
        classes: &Arc<ClassRegistry>,
        immutables: Option<&Arc<ImmutablesTaster>>,
    ) -> Vec<Arc<dyn Taster>> {
        let mut tasters: Vec<Arc<dyn Taster>> = Vec::with_capacity(2);
        if let Some(taster) = immutables {
            tasters.push(taster.clone());
        }
        tasters.push(Arc::new(BeanTaster::new(classes.clone())));
        tasters
    }

    /// Independent copy: registrations made on either side stay there
    pub fn create_copy(&self) -> Self {
        let immutables = self
            .immutables
            .as_ref()
            .map(|taster| Arc::new(taster.create_copy()));
        let properties = PropertiesFactory::with_clock(
            Self::chain(&self.classes, immutables.as_ref()),
            self.settings.idle_expiry(),
            self.properties.clock().clone(),
        )
        .warn_ambiguous(self.settings.properties.warn_ambiguous);

        Self {
            settings: self.settings.clone(),
            classes: self.classes.clone(),
            immutables,
            properties,
            arguments: self.arguments.create_copy(),
            column_mappers: self.column_mappers.create_copy(),
            row_mappers: self.row_mappers.create_copy(),
            map_entry: self.map_entry.create_copy(),
            implementations: RwLock::new(self.implementations.read().clone()),
        }
    }

    /// Settings the registry was built from
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Host class registry
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// Builder strategy, when loaded
    pub fn immutables(&self) -> Option<&Arc<ImmutablesTaster>> {
        self.immutables.as_ref()
    }

    /// Property model cache
    pub fn properties(&self) -> &PropertiesFactory {
        &self.properties
    }

    /// Argument factories
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Column mapper factories
    pub fn column_mappers(&self) -> &ColumnMappers {
        &self.column_mappers
    }

    /// Row mapper factories
    pub fn row_mappers(&self) -> &RowMappers {
        &self.row_mappers
    }

    /// Entry slot columns
    pub fn map_entry(&self) -> &MapEntryMappers {
        &self.map_entry
    }

    /// Register a builder-produced implementation class
    ///
    /// Its first declared contract becomes builder-mapped, and both the
    /// contract and the implementation map rows through the implementation's
    /// property model.
    pub fn register_immutable(&self, implementation: &ClassRef) -> Result<()> {
        let info = self.classes.get(implementation).ok_or_else(|| {
            Error::Config(format!("class {} is not registered", implementation))
        })?;
        if info.is_contract() {
            return Err(Error::Config(
                "Register the implemented immutable type, not the specifying contract".to_string(),
            ));
        }
        let contract = info
            .interfaces
            .first()
            .and_then(Type::erased)
            .ok_or_else(|| Error::Config(format!("{} implements no contract", implementation)))?;
        let taster = self.immutables.as_ref().ok_or_else(|| Error::StrategyUnavailable {
            strategy: "Immutables",
            reason: "not loaded for this registry".to_string(),
        })?;

        taster.register(contract.clone(), implementation.clone());
        self.implementations
            .write()
            .insert(contract.clone(), implementation.clone());
        self.row_mappers.register(Arc::new(PojoMapperFactory::new(
            Type::Class(implementation.clone()),
            vec![contract.clone(), implementation.clone()],
        )));
        debug!(contract = %contract, implementation = %implementation, "immutable registered");
        Ok(())
    }

    /// Implementation registered for a contract
    pub fn implementation_for(&self, contract: &ClassRef) -> Option<ClassRef> {
        self.implementations.read().get(contract).cloned()
    }
}

/// Property model of `ty` from the process-wide registry
pub fn properties_of(ty: &Type) -> Result<Arc<PropertyModel>> {
    ConfigRegistry::global().properties().properties_of(ty)
}
