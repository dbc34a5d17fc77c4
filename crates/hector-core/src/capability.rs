use crate::errors::{HectorError, HectorResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a datum that components exchange through the core.
///
/// Standard identifiers are `const` values built with [`DataId::from_static`];
/// identifiers that only exist at runtime (one per halocarbon gas, say) are
/// built with [`DataId::new`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DataId(Cow<'static, str>);

impl DataId {
    pub const fn from_static(name: &'static str) -> Self {
        DataId(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        DataId(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataId {
    fn from(name: &str) -> Self {
        DataId::new(name)
    }
}

impl From<String> for DataId {
    fn from(name: String) -> Self {
        DataId::new(name)
    }
}

/// Which component provides each datum.
///
/// Each identifier can be registered once. The registry is filled while
/// components initialise and is read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct CapabilityRegistry {
    providers: BTreeMap<DataId, String>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `component` provides `datum`.
    pub fn register(&mut self, datum: DataId, component: &str) -> HectorResult<()> {
        if let Some(existing) = self.providers.get(&datum) {
            return Err(HectorError::DuplicateCapability {
                datum: datum.to_string(),
                existing: existing.clone(),
                requested: component.to_string(),
            });
        }
        tracing::trace!(datum = %datum, component, "registered capability");
        self.providers.insert(datum, component.to_string());
        Ok(())
    }

    /// Name of the component providing `datum`.
    pub fn provider(&self, datum: &DataId) -> HectorResult<&str> {
        self.providers
            .get(datum)
            .map(String::as_str)
            .ok_or_else(|| HectorError::UnknownVariable(datum.to_string()))
    }

    pub fn contains(&self, datum: &DataId) -> bool {
        self.providers.contains_key(datum)
    }

    /// Every datum provided by `component`.
    pub fn provided_by<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a DataId> {
        self.providers
            .iter()
            .filter(move |(_, provider)| provider.as_str() == component)
            .map(|(datum, _)| datum)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataId, &str)> {
        self.providers.iter().map(|(d, c)| (d, c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const D_X: DataId = DataId::from_static("x");

    #[test]
    fn static_and_runtime_ids_compare_equal() {
        assert_eq!(D_X, DataId::new("x".to_string()));
        assert_eq!(DataId::from("x"), D_X);
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = CapabilityRegistry::new();
        registry.register(D_X, "source").unwrap();
        assert_eq!(registry.provider(&D_X).unwrap(), "source");
        assert!(matches!(
            registry.provider(&DataId::from("y")),
            Err(HectorError::UnknownVariable(_))
        ));
        assert_eq!(registry.provided_by("source").collect::<Vec<_>>(), vec![&D_X]);
    }

    proptest! {
        #[test]
        fn duplicate_registration_is_rejected(
            name in "[a-z_]{1,12}",
            first in "[A-Za-z]{1,8}",
            second in "[A-Za-z]{1,8}",
        ) {
            let mut registry = CapabilityRegistry::new();
            registry.register(DataId::new(name.clone()), &first).unwrap();
            let err = registry.register(DataId::new(name.clone()), &second).unwrap_err();
            let is_duplicate = matches!(err, HectorError::DuplicateCapability { .. });
            prop_assert!(is_duplicate);
            prop_assert_eq!(registry.provider(&DataId::new(name)).unwrap(), first.as_str());
        }
    }
}
