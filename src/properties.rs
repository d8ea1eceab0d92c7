/*! Parameter store backing factories and recognizers.

The store is a plain key/value map. It does no cross-key validation:
setting `AuthorizationToken` leaves `SubscriptionKey` as it was, and which
one wins is decided when a recognizer is created.
*/

use crate::{error::*, Result};
use rustc_hash::FxHashMap as Table;
use std::{fmt, sync::Mutex};

/// Well-known parameter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    SubscriptionKey,
    AuthorizationToken,
    Region,
    Endpoint,
    RecoLanguage,
    TranslationFromLanguage,
    TranslationToLanguages,
    TranslationVoice,
    EffectiveEndpoint,
}

impl PropertyId {
    pub fn name(self) -> &'static str {
        match self {
            PropertyId::SubscriptionKey => "SPEECH-SubscriptionKey",
            PropertyId::AuthorizationToken => "SPEECH-AuthToken",
            PropertyId::Region => "SPEECH-Region",
            PropertyId::Endpoint => "SPEECH-Endpoint",
            PropertyId::RecoLanguage => "SPEECH-RecoLanguage",
            PropertyId::TranslationFromLanguage => "TRANSLATION-FromLanguage",
            PropertyId::TranslationToLanguages => "TRANSLATION-ToLanguages",
            PropertyId::TranslationVoice => "TRANSLATION-Voice",
            PropertyId::EffectiveEndpoint => "SPEECH-EffectiveEndpoint",
        }
    }
}

pub trait PropertyBag {
    fn get_by_id(&self, _id: PropertyId) -> Result<String> {
        Err(Unimplemented)
    }

    fn get_by_name(&self, _name: &str) -> Result<String> {
        Err(Unimplemented)
    }

    fn put_by_id(&self, _id: PropertyId, _value: &str) -> Result<()> {
        Err(Unimplemented)
    }

    fn put_by_name(&self, _name: &str, _value: &str) -> Result<()> {
        Err(Unimplemented)
    }
}

/// Key/value parameters owned by exactly one factory or recognizer.
pub struct ConfigurationStore {
    owner: &'static str,
    table: Mutex<Option<Table<String, String>>>,
}

impl ConfigurationStore {
    pub fn new(owner: &'static str) -> Self {
        ConfigurationStore {
            owner,
            table: Mutex::new(Some(Table::default())),
        }
    }

    /// Detach the store. Closing twice is a no-op.
    pub fn close(&self) -> Result {
        let mut table = self.table.lock()?;
        if table.take().is_some() {
            log::trace!("Properties of {} are closed", self.owner);
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        match self.table.lock() {
            Ok(table) => table.is_none(),
            Err(_) => true,
        }
    }

    /// Snapshot of all entries ordered by name.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut entries = self.with_table(|table| {
            table
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Vec<_>>()
        })?;
        entries.sort();
        Ok(entries)
    }

    fn with_table<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Table<String, String>) -> R,
    {
        let mut guard = self.table.lock()?;
        let table = guard.as_mut().ok_or(UseAfterDispose(self.owner))?;
        Ok(f(table))
    }
}

impl PropertyBag for ConfigurationStore {
    fn get_by_id(&self, id: PropertyId) -> Result<String> {
        self.get_by_name(id.name())
    }

    /// Unset keys read as the empty string.
    fn get_by_name(&self, name: &str) -> Result<String> {
        self.with_table(|table| table.get(name).cloned().unwrap_or_default())
    }

    fn put_by_id(&self, id: PropertyId, value: &str) -> Result<()> {
        self.put_by_name(id.name(), value)
    }

    fn put_by_name(&self, name: &str, value: &str) -> Result<()> {
        self.with_table(|table| {
            table.insert(name.to_string(), value.to_string());
        })
    }
}

impl fmt::Debug for ConfigurationStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "ConfigurationStore {{owner: {}, closed: {}, ...}}.",
            self.owner,
            self.is_closed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_does_not_clear_key() {
        let store = ConfigurationStore::new("test");
        store.put_by_id(PropertyId::SubscriptionKey, "k1").unwrap();
        store.put_by_id(PropertyId::Region, "westus").unwrap();
        store.put_by_id(PropertyId::AuthorizationToken, "tok").unwrap();

        assert_eq!(store.get_by_id(PropertyId::AuthorizationToken).unwrap(), "tok");
        assert_eq!(store.get_by_id(PropertyId::SubscriptionKey).unwrap(), "k1");
        assert_eq!(store.get_by_id(PropertyId::Region).unwrap(), "westus");
    }

    #[test]
    fn unset_key_reads_empty() {
        let store = ConfigurationStore::new("test");
        assert_eq!(store.get_by_id(PropertyId::Endpoint).unwrap(), "");
        assert_eq!(store.get_by_name("custom").unwrap(), "");
    }

    #[test]
    fn by_name_and_by_id_share_keys() {
        let store = ConfigurationStore::new("test");
        store.put_by_name("SPEECH-Region", "eastasia").unwrap();
        assert_eq!(store.get_by_id(PropertyId::Region).unwrap(), "eastasia");
    }

    #[test]
    fn entries_are_ordered_by_name() {
        let store = ConfigurationStore::new("test");
        store.put_by_name("b", "2").unwrap();
        store.put_by_name("a", "1").unwrap();
        store.put_by_name("c", "3").unwrap();
        let names: Vec<_> =
            store.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn closed_store_rejects_access() {
        let store = ConfigurationStore::new("test");
        store.put_by_id(PropertyId::Region, "westus").unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert!(store.is_closed());

        match store.get_by_id(PropertyId::Region) {
            Err(UseAfterDispose(owner)) => assert_eq!(owner, "test"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(store.put_by_id(PropertyId::Region, "x").is_err());
        assert!(store.entries().is_err());
    }
}
