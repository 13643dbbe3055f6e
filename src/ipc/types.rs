use std::path::PathBuf;
use std::rc::Rc;

use rusqlite::Connection;
use serde::Deserialize;

use crate::school::School;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Rc<Connection>>,
    pub school: Option<School>,
}

impl AppState {
    /// Drops the school before the connection so no repository keeps the
    /// database file open.
    pub fn close_workspace(&mut self) {
        self.school = None;
        self.db = None;
    }
}
