//! A key/value telemetry table shared between robot code and the operator
//! dashboard, plus a chooser the operator selects from.

use std::{cell::RefCell, collections::BTreeMap};

use hashbrown::HashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    String(String),
    StringArray(Vec<String>),
}

thread_local! {
    static TABLE: RefCell<HashMap<String, Value>> = RefCell::new(HashMap::new());
}

pub fn put(key: impl Into<String>, value: Value) {
    TABLE.with(|table| {
        table.borrow_mut().insert(key.into(), value);
    });
}

pub fn get(key: &str) -> Option<Value> {
    TABLE.with(|table| table.borrow().get(key).cloned())
}

pub fn put_number(key: impl Into<String>, value: f64) {
    put(key, Value::Number(value));
}

pub fn put_boolean(key: impl Into<String>, value: bool) {
    put(key, Value::Boolean(value));
}

pub fn put_string(key: impl Into<String>, value: impl Into<String>) {
    put(key, Value::String(value.into()));
}

pub fn put_string_array(key: impl Into<String>, value: Vec<String>) {
    put(key, Value::StringArray(value));
}

pub fn get_number(key: &str, default: f64) -> f64 {
    match get(key) {
        Some(Value::Number(value)) => value,
        _ => default,
    }
}

pub fn get_boolean(key: &str, default: bool) -> bool {
    match get(key) {
        Some(Value::Boolean(value)) => value,
        _ => default,
    }
}

pub fn get_string(key: &str, default: &str) -> String {
    match get(key) {
        Some(Value::String(value)) => value,
        _ => default.to_owned(),
    }
}

pub fn get_string_array(key: &str) -> Vec<String> {
    match get(key) {
        Some(Value::StringArray(value)) => value,
        _ => Vec::new(),
    }
}

/// Every entry, ordered by key.
pub fn snapshot() -> BTreeMap<String, Value> {
    TABLE.with(|table| {
        table
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    })
}

/// A set of named options published to the dashboard; the operator's
/// selection is read back from `<key>/selected`.
pub struct SendableChooser<T> {
    options: Vec<(String, T)>,
    default: Option<String>,
    key: Option<String>,
}

impl<T> Default for SendableChooser<T> {
    fn default() -> Self {
        Self {
            options: Vec::new(),
            default: None,
            key: None,
        }
    }
}

impl<T: Clone> SendableChooser<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option, replacing any option with the same name.
    pub fn add_option(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.options.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.options.push((name, value)),
        }
        self.refresh();
    }

    pub fn set_default_option(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        self.default = Some(name.clone());
        self.add_option(name, value);
    }

    pub fn option_names(&self) -> Vec<String> {
        self.options.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Publishes the chooser under `key`.
    pub fn publish(&mut self, key: impl Into<String>) {
        self.key = Some(key.into());
        self.refresh();
    }

    /// Name of the option in effect: the operator's selection if it names an
    /// option, otherwise the default.
    pub fn selected_name(&self) -> Option<String> {
        let selected = self
            .key
            .as_ref()
            .and_then(|key| match get(&format!("{key}/selected")) {
                Some(Value::String(name)) => Some(name),
                _ => None,
            })
            .filter(|name| self.options.iter().any(|(n, _)| n == name));
        let active = selected.or_else(|| self.default.clone());
        if let (Some(key), Some(active)) = (&self.key, &active) {
            put_string(format!("{key}/active"), active.clone());
        }
        active
    }

    pub fn selected(&self) -> Option<T> {
        let name = self.selected_name()?;
        self.options
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value.clone())
    }

    fn refresh(&self) {
        let Some(key) = &self.key else {
            return;
        };
        put_string_array(format!("{key}/options"), self.option_names());
        if let Some(default) = &self.default {
            put_string(format!("{key}/default"), default.clone());
        }
    }
}
