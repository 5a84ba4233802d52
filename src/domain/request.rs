use crate::domain::cart::SessionCart;
use crate::domain::model::User;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Per-browser key/value session data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    data: Map<String, Value>,
    modified: bool,
}

impl Session {
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            modified: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
        self.modified = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }
}

/// What a session store persists for one session id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub cart: SessionCart,
}

/// Everything the checkout needs to know about the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session: Session,
    pub cart: SessionCart,
    pub user: Option<User>,
    pub cookies: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(record: SessionRecord) -> Self {
        Self {
            session: Session::new(record.data),
            cart: record.cart,
            user: None,
            cookies: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            data: self.session.data().clone(),
            cart: self.cart.clone(),
        }
    }
}
